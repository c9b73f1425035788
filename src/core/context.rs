//! Explicit site context passed to every request and command.
//!
//! Built once at startup from the loaded configuration. There is no global
//! index: whoever needs pages receives a `&SiteContext`.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::{
    asset::AssetCache,
    config::SiteConfig,
    content::ContentIndex,
    render::{Browser, ChromeBrowser, Viewers},
};

/// Everything a request handler needs, shared read-only across workers.
pub struct SiteContext {
    pub config: Arc<SiteConfig>,
    pub index: ContentIndex,
    pub cache: AssetCache,
    /// Browser used by the preview endpoint.
    pub browser: Arc<dyn Browser>,
}

impl SiteContext {
    /// Scan the content directory and wire up the default browser.
    pub fn load(config: SiteConfig) -> Result<Self> {
        let index = ContentIndex::scan(&config.content.dir, &config.content.normalized_base_url())
            .with_context(|| {
                format!(
                    "failed to scan content directory `{}`",
                    config.content.dir.display()
                )
            })?;
        let browser = Arc::new(ChromeBrowser::from_config(&config.render));
        Ok(Self::new(config, index, browser))
    }

    pub fn new(config: SiteConfig, index: ContentIndex, browser: Arc<dyn Browser>) -> Self {
        let cache = AssetCache::new(config.serve.cache);
        Self {
            config: Arc::new(config),
            index,
            cache,
            browser,
        }
    }

    /// Viewer scripts for in-page rendering.
    pub fn viewers(&self) -> Viewers {
        Viewers::new(self.config.render.viewer.clone())
    }
}
