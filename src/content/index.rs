//! Content index: slug -> page lookup over the content directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use jwalk::WalkDir;
use rustc_hash::FxHashMap;

use super::{NotFound, Page, meta, slug};
use crate::{debug, log};

/// All pages under one content root, in registration order.
#[derive(Debug, Clone)]
pub struct ContentIndex {
    root: PathBuf,
    base_url: String,
    pages: Vec<Page>,
    by_slug: FxHashMap<Vec<String>, usize>,
}

impl ContentIndex {
    /// Walk `root` (sorted, recursive) and register every document.
    pub fn scan(root: &Path, base_url: &str) -> Result<Self> {
        if !root.is_dir() {
            bail!("`{}` is not a directory", root.display());
        }

        let mut index = Self::empty(root, base_url);
        for entry in WalkDir::new(root).sort(true).into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            let Some((slug, is_index)) = slug::derive(relative) else {
                continue;
            };

            let page_meta = match fs::read_to_string(&path) {
                Ok(content) => match meta::extract(&content) {
                    Ok((page_meta, _)) => page_meta,
                    Err(e) => {
                        log!("warning"; "{}: {e}", relative.display());
                        Default::default()
                    }
                },
                Err(e) => {
                    log!("warning"; "failed to read {}: {e}", relative.display());
                    Default::default()
                }
            };

            let mut page = Page::new(slug, path).with_meta(page_meta);
            page.is_index = is_index;
            index.insert(page);
        }

        debug!("content"; "indexed {} pages under {}", index.pages.len(), root.display());
        Ok(index)
    }

    /// Build an index from explicit pages (virtual pages, tests).
    pub fn from_pages(root: impl Into<PathBuf>, base_url: &str, pages: Vec<Page>) -> Self {
        let mut index = Self::empty(root, base_url);
        for page in pages {
            index.insert(page);
        }
        index
    }

    fn empty(root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            pages: Vec::new(),
            by_slug: FxHashMap::default(),
        }
    }

    /// Register a page; the first page claiming a slug wins.
    fn insert(&mut self, page: Page) {
        if let Some(&existing) = self.by_slug.get(&page.slug) {
            log!(
                "warning";
                "slug conflict at `/{}`: {} shadowed by {}",
                page.slug_str(),
                display_location(&page),
                display_location(&self.pages[existing])
            );
            return;
        }
        self.by_slug.insert(page.slug.clone(), self.pages.len());
        self.pages.push(page);
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Look up a page by slug.
    pub fn get_page(&self, slug: &[String]) -> Option<&Page> {
        self.by_slug.get(slug).map(|&i| &self.pages[i])
    }

    /// Resolve a slug to a page backed by a document on disk.
    pub fn resolve(&self, slug: &[String]) -> Result<&Page, NotFound> {
        let page = self
            .get_page(slug)
            .ok_or_else(|| NotFound::Page(slug.join("/")))?;
        if page.path.is_none() {
            return Err(NotFound::Virtual(page.slug_str()));
        }
        Ok(page)
    }

    /// Pages in registration order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Public URL of a page: base URL followed by its slug.
    pub fn page_url(&self, page: &Page) -> String {
        if page.slug.is_empty() {
            return if self.base_url.is_empty() {
                "/".to_string()
            } else {
                self.base_url.clone()
            };
        }
        format!("{}/{}", self.base_url, page.slug.join("/"))
    }

    /// Plain-text rendition for LLM consumers: `# {title}` followed by the body.
    pub fn llm_text(&self, page: &Page) -> Result<String> {
        let Some(path) = page.path() else {
            bail!("page `/{}` has no document", page.slug_str());
        };
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let body = meta::strip_frontmatter(&content);
        Ok(format!("# {}\n\n{}", page.title(), body))
    }
}

fn display_location(page: &Page) -> String {
    page.path()
        .map_or_else(|| "<virtual>".to_string(), |p| p.display().to_string())
}
