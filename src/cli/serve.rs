//! `serve` command: the asset server.

use std::sync::Arc;

use anyhow::Result;

use crate::config::SiteConfig;
use crate::core::{self, SiteContext};
use crate::{debug, log};

/// Index the content tree, bind and serve until Ctrl+C.
pub fn serve_site(config: SiteConfig) -> Result<()> {
    let ctx = Arc::new(SiteContext::load(config)?);
    debug!(
        "serve";
        "{} pages under {}",
        ctx.index.pages().len(),
        ctx.config.root_relative(ctx.index.root()).display()
    );
    if ctx.cache.is_enabled() {
        debug!("serve"; "asset cache enabled");
    }

    let server = crate::serve::bind(&ctx.config.serve)?;
    core::register_server(server.shutdown_handle());

    log!("serve"; "http://{}", server.addr());
    if ctx.config.serve.preview {
        log!("serve"; "previews at http://{}/preview/{{family}}/docs/...", server.addr());
    }

    server.run(ctx)
}
