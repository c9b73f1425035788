//! Request path -> route classification.
//!
//! ```text
//! /{family}/docs/{...slug}/{asset}             asset (wildcard)
//! /{family}/docs/{doc}/{asset}                 asset (explicit, same resolution)
//! /docs/{...slug}/assets/{asset}.{ext}         asset (alias of the wildcard form)
//! /preview/{family}/docs/{...slug}/{asset}     rasterized PNG
//! /llms.mdx/docs/{...slug}                     page as markdown
//! /docs/{...slug}.mdx                          page as markdown
//! ```

use crate::asset::{ASSETS_DIR, AssetFamily};

const DOCS: &str = "docs";
const PREVIEW: &str = "preview";
const LLMS: &str = "llms.mdx";
const MDX_SUFFIX: &str = ".mdx";

/// Asset of one page: the last URL segment is the asset basename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRoute {
    pub family: AssetFamily,
    pub doc_slug: Vec<String>,
    pub basename: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Asset(AssetRoute),
    Preview(AssetRoute),
    LlmText(Vec<String>),
}

impl Route {
    /// Classify decoded path segments, `None` when nothing matches.
    pub fn parse(segments: &[String]) -> Option<Self> {
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
        match segments.as_slice() {
            [PREVIEW, family, DOCS, rest @ ..] => asset_route(family, rest).map(Self::Preview),
            [LLMS, DOCS, slug @ ..] => Some(Self::LlmText(owned(slug))),
            [DOCS, rest @ ..] => docs_alias(rest),
            [family, DOCS, rest @ ..] => asset_route(family, rest).map(Self::Asset),
            _ => None,
        }
    }
}

fn asset_route(family: &str, rest: &[&str]) -> Option<AssetRoute> {
    let family = AssetFamily::from_prefix(family)?;
    let (basename, doc_slug) = rest.split_last()?;
    Some(AssetRoute {
        family,
        doc_slug: owned(doc_slug),
        basename: (*basename).to_string(),
    })
}

/// Routes under the page base URL itself.
fn docs_alias(rest: &[&str]) -> Option<Route> {
    match rest {
        [doc_slug @ .., ASSETS_DIR, file] => {
            let (basename, ext) = file.rsplit_once('.')?;
            let family = AssetFamily::ALL
                .into_iter()
                .find(|f| f.extension()[1..] == *ext)?;
            (!basename.is_empty()).then(|| {
                Route::Asset(AssetRoute {
                    family,
                    doc_slug: owned(doc_slug),
                    basename: basename.to_string(),
                })
            })
        }
        [parent @ .., last] => {
            let last = last.strip_suffix(MDX_SUFFIX)?;
            let mut slug = owned(parent);
            slug.push(last.to_string());
            Some(Route::LlmText(slug))
        }
        [] => None,
    }
}

fn owned(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|s| (*s).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::path::url_segments;

    fn parse(url: &str) -> Option<Route> {
        Route::parse(&url_segments(url)?)
    }

    fn asset(family: AssetFamily, doc_slug: &[&str], basename: &str) -> AssetRoute {
        AssetRoute {
            family,
            doc_slug: owned(doc_slug),
            basename: basename.to_string(),
        }
    }

    #[test]
    fn test_wildcard_route() {
        assert_eq!(
            parse("/bpmn/docs/guide/setup/flow"),
            Some(Route::Asset(asset(AssetFamily::Bpmn, &["guide", "setup"], "flow")))
        );
        assert_eq!(
            parse("/excalidraw/docs/sketch"),
            Some(Route::Asset(asset(AssetFamily::Excalidraw, &[], "sketch")))
        );
    }

    #[test]
    fn test_explicit_shape_resolves_like_wildcard() {
        assert_eq!(
            parse("/bpmn/docs/setup/flow"),
            Some(Route::Asset(asset(AssetFamily::Bpmn, &["setup"], "flow")))
        );
    }

    #[test]
    fn test_alias_route() {
        assert_eq!(
            parse("/docs/guide/setup/assets/flow.bpmn"),
            Some(Route::Asset(asset(AssetFamily::Bpmn, &["guide", "setup"], "flow")))
        );
        assert_eq!(
            parse("/docs/assets/sketch.excalidraw"),
            Some(Route::Asset(asset(AssetFamily::Excalidraw, &[], "sketch")))
        );
        assert_eq!(parse("/docs/guide/assets/flow.png"), None);
        assert_eq!(parse("/docs/guide/assets/.bpmn"), None);
    }

    #[test]
    fn test_llm_text_routes() {
        let expected = Some(Route::LlmText(owned(&["guide", "setup"])));
        assert_eq!(parse("/llms.mdx/docs/guide/setup"), expected);
        assert_eq!(parse("/docs/guide/setup.mdx"), expected);
        assert_eq!(parse("/llms.mdx/docs"), Some(Route::LlmText(Vec::new())));
    }

    #[test]
    fn test_preview_route() {
        assert_eq!(
            parse("/preview/bpmn/docs/guide/flow"),
            Some(Route::Preview(asset(AssetFamily::Bpmn, &["guide"], "flow")))
        );
    }

    #[test]
    fn test_unmatched_routes() {
        assert_eq!(parse("/"), None);
        assert_eq!(parse("/bpmn/docs"), None);
        assert_eq!(parse("/png/docs/guide/flow"), None);
        assert_eq!(parse("/docs/guide/setup"), None);
        assert_eq!(parse("/preview/pdf/docs/a/b"), None);
    }
}
