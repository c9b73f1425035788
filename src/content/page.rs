//! Documentation page registered in the content index.

use std::path::{Path, PathBuf};

use super::PageMeta;

/// A documentation page addressed by its slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Ordered URL segments, empty for the root index.
    pub slug: Vec<String>,
    /// Absolute path of the backing document; `None` for virtual pages.
    pub path: Option<PathBuf>,
    pub meta: PageMeta,
    /// Page came from an `index.md(x)` document.
    pub is_index: bool,
}

impl Page {
    /// Page backed by a document on disk.
    pub fn new(slug: Vec<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            slug,
            path: Some(path.into()),
            meta: PageMeta::default(),
            is_index: false,
        }
    }

    /// Page without a physical location.
    pub fn virtual_page(slug: Vec<String>) -> Self {
        Self {
            slug,
            path: None,
            meta: PageMeta::default(),
            is_index: false,
        }
    }

    pub fn with_meta(mut self, meta: PageMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Frontmatter title, else the file stem, else the last slug segment.
    pub fn title(&self) -> String {
        if let Some(title) = self.meta.title.as_deref().filter(|t| !t.is_empty()) {
            return title.to_string();
        }

        let stem = self
            .path()
            .filter(|_| !self.is_index)
            .and_then(Path::file_stem)
            .and_then(|s| s.to_str());
        stem.or_else(|| self.slug.last().map(String::as_str))
            .unwrap_or("Index")
            .to_string()
    }

    /// Slug joined with `/` (for logs and diagnostics).
    pub fn slug_str(&self) -> String {
        self.slug.join("/")
    }
}
