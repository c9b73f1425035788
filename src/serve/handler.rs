//! Request dispatch, independent of the socket.

use std::io;
use std::sync::Arc;

use anyhow::Context;
use thiserror::Error;
use tiny_http::Method;

use super::route::{AssetRoute, Route};
use crate::asset::find_asset;
use crate::content::NotFound;
use crate::core::SiteContext;
use crate::render::{self, OutputFormat, RenderError};
use crate::utils::{mime, path::url_segments};
use crate::{debug, log};

/// Response produced for one request.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Arc<[u8]>,
}

impl Reply {
    fn ok(content_type: &'static str, body: impl Into<Arc<[u8]>>) -> Self {
        Self {
            status: 200,
            content_type,
            body: body.into(),
        }
    }

    fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: mime::types::PLAIN,
            body: Arc::from(Vec::new()),
        }
    }

    fn text(status: u16, message: String) -> Self {
        Self {
            status,
            content_type: mime::types::PLAIN,
            body: message.into_bytes().into(),
        }
    }
}

#[derive(Debug, Error)]
enum ServeError {
    #[error(transparent)]
    NotFound(#[from] NotFound),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Answer `method url` from the site context.
///
/// Unresolvable routes, pages and assets are all 404 with an empty body.
/// `HEAD` gets the same status and content type without a body.
pub fn handle(ctx: &SiteContext, method: &Method, url: &str) -> Reply {
    let head = match method {
        Method::Get => false,
        Method::Head => true,
        _ => return Reply::empty(405),
    };

    let reply = match dispatch(ctx, url) {
        Ok(reply) => reply,
        Err(ServeError::NotFound(reason)) => {
            debug!("serve"; "404 {url}: {reason}");
            Reply::empty(404)
        }
        Err(ServeError::Render(e)) => {
            log!("error"; "{url}: {e}");
            Reply::text(500, e.to_string())
        }
        Err(ServeError::Internal(e)) => {
            log!("error"; "{url}: {e:#}");
            Reply::empty(500)
        }
    };

    if head {
        Reply {
            body: Arc::from(Vec::new()),
            ..reply
        }
    } else {
        reply
    }
}

fn dispatch(ctx: &SiteContext, url: &str) -> Result<Reply, ServeError> {
    let segments = url_segments(url).ok_or(NotFound::Route)?;
    match Route::parse(&segments).ok_or(NotFound::Route)? {
        Route::Asset(asset) => serve_asset(ctx, &asset),
        Route::Preview(asset) => serve_preview(ctx, &asset),
        Route::LlmText(slug) => serve_llm_text(ctx, &slug),
    }
}

fn serve_asset(ctx: &SiteContext, asset: &AssetRoute) -> Result<Reply, ServeError> {
    let path = find_asset(&ctx.index, &asset.doc_slug, &asset.basename, asset.family)?;
    let bytes = match ctx.cache.read(&path) {
        Ok(bytes) => bytes,
        // removed between the existence check and the read
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(NotFound::Asset(path).into()),
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("failed to read `{}`", path.display()))
                .into());
        }
    };
    Ok(Reply::ok(asset.family.content_type(), bytes))
}

fn serve_preview(ctx: &SiteContext, asset: &AssetRoute) -> Result<Reply, ServeError> {
    if !ctx.config.serve.preview {
        return Err(NotFound::Route.into());
    }
    let path = find_asset(&ctx.index, &asset.doc_slug, &asset.basename, asset.family)?;

    debug!("serve"; "rendering preview of {}", path.display());
    let png = render::preview_png(
        ctx.browser.as_ref(),
        &path,
        &ctx.config.render.options(),
        &ctx.viewers(),
    )?;
    Ok(Reply::ok(OutputFormat::Png.content_type(), png))
}

fn serve_llm_text(ctx: &SiteContext, slug: &[String]) -> Result<Reply, ServeError> {
    let page = ctx.index.resolve(slug)?;
    let text = ctx
        .index
        .llm_text(page)
        .with_context(|| format!("failed to render `/{}` as text", page.slug_str()))?;
    Ok(Reply::ok(mime::types::MARKDOWN, text.into_bytes()))
}
