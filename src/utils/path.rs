//! Path helpers shared by config loading and URL routing.

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Normalize path to absolute form, resolving symlinks when the path exists.
///
/// # Example
/// ```ignore
/// let abs = normalize_path(Path::new("./content/docs"));
/// ```
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Split a request URL into decoded path segments.
///
/// The query string and fragment are dropped, empty segments are skipped and
/// each segment is percent-decoded on its own, so an encoded `%2F` never
/// introduces a new segment. Returns `None` for segments that could escape
/// the directory they name (`.`, `..`, anything containing a separator) and
/// for invalid UTF-8.
pub fn url_segments(url: &str) -> Option<Vec<String>> {
    let path = url.split(['?', '#']).next().unwrap_or_default();

    let mut segments = Vec::new();
    for raw in path.split('/').filter(|s| !s.is_empty()) {
        let decoded = percent_decode_str(raw).decode_utf8().ok()?;
        if !is_safe_segment(&decoded) {
            return None;
        }
        segments.push(decoded.into_owned());
    }
    Some(segments)
}

/// A segment is safe when it cannot traverse or nest directories.
fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_segments_basic() {
        assert_eq!(
            url_segments("/bpmn/docs/guide/setup/flow"),
            Some(vec![
                "bpmn".to_string(),
                "docs".to_string(),
                "guide".to_string(),
                "setup".to_string(),
                "flow".to_string()
            ])
        );
    }

    #[test]
    fn test_url_segments_strips_query_and_slashes() {
        assert_eq!(
            url_segments("//docs//a/?v=1#top"),
            Some(vec!["docs".to_string(), "a".to_string()])
        );
    }

    #[test]
    fn test_url_segments_decodes_each_segment() {
        assert_eq!(
            url_segments("/docs/hello%20world"),
            Some(vec!["docs".to_string(), "hello world".to_string()])
        );
        // encoded slash must not become a separator
        assert_eq!(url_segments("/docs/a%2Fb"), None);
    }

    #[test]
    fn test_url_segments_rejects_traversal() {
        assert_eq!(url_segments("/bpmn/docs/../secret"), None);
        assert_eq!(url_segments("/bpmn/docs/%2E%2E/secret"), None);
        assert_eq!(url_segments("/bpmn/docs/a%5Cb"), None);
    }

    #[test]
    fn test_normalize_path_absolute_passthrough() {
        let path = Path::new("/definitely/not/existing/sidecar");
        assert_eq!(normalize_path(path), path.to_path_buf());
    }
}
