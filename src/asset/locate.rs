//! Asset Locator: where a page's sidecar assets live.
//!
//! ```text
//! content/docs/guide/setup.mdx         <- page ["guide", "setup"]
//! content/docs/guide/assets/flow.bpmn  <- asset "flow" of that page
//! ```

use std::path::PathBuf;

use super::AssetFamily;
use crate::content::{ContentIndex, NotFound, Page};

/// Name of the sidecar directory next to each document.
pub const ASSETS_DIR: &str = "assets";

/// Sidecar directory of a page, `None` for pages without a document.
pub fn assets_dir(page: &Page) -> Option<PathBuf> {
    page.path()?.parent().map(|dir| dir.join(ASSETS_DIR))
}

/// Expected path of asset `basename` + `ext` for `page`.
///
/// Pure path construction; existence is the caller's concern.
pub fn locate(page: &Page, basename: &str, ext: &str) -> Option<PathBuf> {
    assets_dir(page).map(|dir| dir.join(format!("{basename}{ext}")))
}

/// Resolve `doc_slug` and return the existing asset file of `family`.
pub fn find_asset(
    index: &ContentIndex,
    doc_slug: &[String],
    basename: &str,
    family: AssetFamily,
) -> Result<PathBuf, NotFound> {
    let page = index.resolve(doc_slug)?;
    let path = locate(page, basename, family.extension())
        .ok_or_else(|| NotFound::Virtual(page.slug_str()))?;
    if !path.is_file() {
        return Err(NotFound::Asset(path));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn slug(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_locate_is_pure() {
        let page = Page::new(slug(&["guide", "setup"]), "/docs/guide/setup.mdx");

        // nothing exists on disk, the path is still computed
        assert_eq!(
            locate(&page, "foo", ".bpmn"),
            Some(PathBuf::from("/docs/guide/assets/foo.bpmn"))
        );
        assert_eq!(
            locate(&page, "sketch", ".excalidraw"),
            Some(PathBuf::from("/docs/guide/assets/sketch.excalidraw"))
        );
        assert_eq!(
            assets_dir(&page).as_deref(),
            Some(Path::new("/docs/guide/assets"))
        );
    }

    #[test]
    fn test_locate_virtual_page() {
        let page = Page::virtual_page(slug(&["external"]));
        assert_eq!(locate(&page, "foo", ".bpmn"), None);
    }

    #[test]
    fn test_find_asset() {
        let dir = TempDir::new().unwrap();
        let doc = dir.path().join("guide/setup.mdx");
        fs::create_dir_all(dir.path().join("guide/assets")).unwrap();
        fs::write(&doc, "").unwrap();
        fs::write(dir.path().join("guide/assets/flow.bpmn"), "<xml/>").unwrap();

        let index = ContentIndex::from_pages(
            dir.path(),
            "/docs",
            vec![Page::new(slug(&["guide", "setup"]), &doc)],
        );
        let setup = slug(&["guide", "setup"]);

        assert_eq!(
            find_asset(&index, &setup, "flow", AssetFamily::Bpmn),
            Ok(dir.path().join("guide/assets/flow.bpmn"))
        );
        assert_eq!(
            find_asset(&index, &setup, "missing", AssetFamily::Bpmn),
            Err(NotFound::Asset(dir.path().join("guide/assets/missing.bpmn")))
        );
        assert!(matches!(
            find_asset(&index, &slug(&["nope"]), "flow", AssetFamily::Bpmn),
            Err(NotFound::Page(_))
        ));
    }
}
