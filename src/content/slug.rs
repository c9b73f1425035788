//! Slug derivation for documents.
//!
//! `(main)/guide/setup.mdx` -> `["guide", "setup"]`, `guide/index.mdx` -> `["guide"]`.

use std::path::{Component, Path};

/// Document extensions registered as pages.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["md", "mdx"];

/// Name of the per-folder index document (without extension).
pub const INDEX_STEM: &str = "index";

/// Whether `path` is a markdown document.
pub fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext))
}

/// Route groups such as `(main)` organize files without adding a URL segment.
pub fn is_route_group(segment: &str) -> bool {
    segment.len() > 2 && segment.starts_with('(') && segment.ends_with(')')
}

/// Derive `(slug, is_index)` from a path relative to the content root.
///
/// Returns `None` for non-documents and for non-UTF-8 paths.
pub fn derive(relative: &Path) -> Option<(Vec<String>, bool)> {
    if !is_document(relative) {
        return None;
    }

    let stem_path = relative.with_extension("");
    let mut segments = stem_path
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_str().map(str::to_string)),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    segments.retain(|s| !is_route_group(s));

    let is_index = segments.last().is_some_and(|s| s == INDEX_STEM);
    if is_index {
        segments.pop();
    }
    Some((segments, is_index))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slug(path: &str) -> Option<(Vec<String>, bool)> {
        derive(Path::new(path))
    }

    #[test]
    fn test_plain_document() {
        assert_eq!(
            slug("guide/setup.mdx"),
            Some((vec!["guide".into(), "setup".into()], false))
        );
    }

    #[test]
    fn test_route_group_dropped() {
        assert_eq!(
            slug("(main)/guide/setup.md"),
            Some((vec!["guide".into(), "setup".into()], false))
        );
    }

    #[test]
    fn test_index_documents() {
        assert_eq!(slug("guide/index.mdx"), Some((vec!["guide".into()], true)));
        assert_eq!(slug("index.mdx"), Some((vec![], true)));
        assert_eq!(slug("(main)/index.md"), Some((vec![], true)));
    }

    #[test]
    fn test_non_documents_ignored() {
        assert_eq!(slug("guide/assets/flow.bpmn"), None);
        assert_eq!(slug("guide/meta.json"), None);
    }

    #[test]
    fn test_dotted_stem_kept() {
        assert_eq!(slug("v1.2.mdx"), Some((vec!["v1.2".into()], false)));
    }
}
