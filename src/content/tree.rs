//! Navigation page tree.
//!
//! Folders mirror content directories. Route-group directories such as
//! `(main)` are inlined into their parent. A `meta.json` next to the
//! documents customizes a folder:
//!
//! ```json
//! {
//!   "title": "Guide",
//!   "icon": "Book",
//!   "defaultOpen": true,
//!   "pages": ["index", "setup", "---Advanced---", "...", "[GitHub](https://github.com)"]
//! }
//! ```
//!
//! `"..."` expands to every remaining entry (alphabetical), `"!name"` hides an
//! entry from `"..."`, `"---Label---"` inserts a separator and `"[Text](url)"`
//! a link.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use super::{ContentIndex, Page, slug::is_route_group};
use crate::{debug, log};

/// Per-directory metadata file.
pub const META_FILE: &str = "meta.json";

static RE_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^---(.*)---$").unwrap());
static RE_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[(.+)\]\((.+)\)$").unwrap());

// ============================================================================
// Tree types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Root {
    #[serde(rename = "$id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub children: Vec<Node>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Box<Root>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Page(Item),
    Folder(Folder),
    Separator(Separator),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Item {
    #[serde(rename = "$id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    #[serde(rename = "$id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<Item>,
    pub children: Vec<Node>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_open: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Separator {
    #[serde(rename = "$id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

// ============================================================================
// Empty folder conversion
// ============================================================================

/// Rewrite every folder without children into a plain page entry.
///
/// The page links to the folder's index document (or `#` without one) and
/// keeps the folder's `$id`, description and icon. The fallback tree is
/// rewritten the same way.
pub fn convert_empty_folders(root: &Root) -> Root {
    Root {
        id: root.id.clone(),
        name: root.name.clone(),
        children: root.children.iter().map(convert_node).collect(),
        fallback: root
            .fallback
            .as_deref()
            .map(|fallback| Box::new(convert_empty_folders(fallback))),
    }
}

fn convert_node(node: &Node) -> Node {
    let Node::Folder(folder) = node else {
        return node.clone();
    };

    if folder.children.is_empty() {
        let index = folder.index.as_ref();
        return Node::Page(Item {
            id: folder.id.clone(),
            name: folder.name.clone(),
            url: index.map_or_else(|| "#".to_string(), |i| i.url.clone()),
            description: folder.description.clone(),
            icon: folder.icon.clone(),
            external: index.and_then(|i| i.external).filter(|&e| e),
        });
    }

    Node::Folder(Folder {
        id: folder.id.clone(),
        name: folder.name.clone(),
        description: folder.description.clone(),
        icon: folder.icon.clone(),
        index: folder.index.clone(),
        children: folder.children.iter().map(convert_node).collect(),
        default_open: folder.default_open,
        root: folder.root,
    })
}

// ============================================================================
// Tree building
// ============================================================================

/// Contents of `meta.json`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DirMeta {
    title: Option<String>,
    description: Option<String>,
    icon: Option<String>,
    default_open: Option<bool>,
    root: Option<bool>,
    pages: Option<Vec<String>>,
}

impl DirMeta {
    fn load(dir: &Path) -> Self {
        let path = dir.join(META_FILE);
        if !path.is_file() {
            return Self::default();
        }
        let parsed = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))
            .and_then(|s| {
                serde_json::from_str(&s).with_context(|| format!("invalid {}", path.display()))
            });
        parsed.unwrap_or_else(|e| {
            log!("warning"; "{e:#}");
            Self::default()
        })
    }
}

/// A child waiting to be ordered, keyed by its file or directory name.
struct Entry {
    key: String,
    node: Node,
}

struct DirContent {
    meta: DirMeta,
    index: Option<Item>,
    entries: Vec<Entry>,
}

/// Build the page tree for every page of `index`.
pub fn build(index: &ContentIndex) -> Result<Root> {
    let builder = TreeBuilder::new(index);
    let content = builder.scan_dir(index.root())?;

    let mut entries = content.entries;
    if let Some(item) = content.index {
        entries.insert(
            0,
            Entry {
                key: super::slug::INDEX_STEM.to_string(),
                node: Node::Page(item),
            },
        );
    }

    Ok(Root {
        id: None,
        name: content.meta.title.unwrap_or_else(|| "Docs".to_string()),
        children: order(entries, content.meta.pages.as_deref()),
        fallback: None,
    })
}

struct TreeBuilder<'a> {
    index: &'a ContentIndex,
    by_path: FxHashMap<&'a Path, &'a Page>,
}

impl<'a> TreeBuilder<'a> {
    fn new(index: &'a ContentIndex) -> Self {
        let by_path = index
            .pages()
            .iter()
            .filter_map(|page| page.path().map(|path| (path, page)))
            .collect();
        Self { index, by_path }
    }

    fn scan_dir(&self, dir: &Path) -> Result<DirContent> {
        let meta = DirMeta::load(dir);
        let mut index = None;
        let mut entries = Vec::new();

        for path in sorted_children(dir)? {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            if path.is_dir() {
                if is_route_group(name) {
                    let group = self.scan_dir(&path)?;
                    entries.extend(group.entries);
                    index = index.or(group.index);
                } else if let Some(folder) = self.folder(&path, name)? {
                    entries.push(Entry {
                        key: name.to_string(),
                        node: Node::Folder(folder),
                    });
                }
                continue;
            }

            let Some(page) = self.by_path.get(path.as_path()) else {
                continue;
            };
            let item = self.item(page);
            if page.is_index {
                index = index.or(Some(item));
            } else {
                let key = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or(name)
                    .to_string();
                entries.push(Entry {
                    key,
                    node: Node::Page(item),
                });
            }
        }

        Ok(DirContent {
            meta,
            index,
            entries,
        })
    }

    /// Folder for a directory, `None` when it holds no documents at all.
    fn folder(&self, dir: &Path, dir_name: &str) -> Result<Option<Folder>> {
        let content = self.scan_dir(dir)?;
        if content.entries.is_empty() && content.index.is_none() {
            return Ok(None);
        }

        let meta = content.meta;
        let name = meta
            .title
            .or_else(|| content.index.as_ref().map(|i| i.name.clone()))
            .unwrap_or_else(|| dir_name.to_string());

        Ok(Some(Folder {
            id: Some(self.relative_id(dir)),
            name,
            description: meta.description,
            icon: meta.icon,
            index: content.index,
            children: order(content.entries, meta.pages.as_deref()),
            default_open: meta.default_open,
            root: meta.root,
        }))
    }

    fn item(&self, page: &Page) -> Item {
        Item {
            id: page.path().map(|p| self.relative_id(p)),
            name: page.title(),
            url: self.index.page_url(page),
            description: page.meta.description.clone(),
            icon: page.meta.icon.clone(),
            external: None,
        }
    }

    fn relative_id(&self, path: &Path) -> String {
        path.strip_prefix(self.index.root())
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

fn sorted_children(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut children = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect::<Vec<_>>();
    children.sort();
    Ok(children)
}

/// Order entries by `meta.json` `pages`, or alphabetically (index first).
fn order(mut entries: Vec<Entry>, pages: Option<&[String]>) -> Vec<Node> {
    entries.sort_by(|a, b| {
        let rank = |e: &Entry| (e.key != super::slug::INDEX_STEM, e.key.clone());
        rank(a).cmp(&rank(b))
    });

    let Some(pages) = pages else {
        return entries.into_iter().map(|e| e.node).collect();
    };

    let listed: FxHashSet<&str> = pages
        .iter()
        .map(|p| p.strip_prefix('!').unwrap_or(p))
        .collect();

    let mut nodes = Vec::with_capacity(entries.len());
    for item in pages {
        if item == "..." {
            nodes.extend(
                entries
                    .iter()
                    .filter(|e| !listed.contains(e.key.as_str()))
                    .map(|e| e.node.clone()),
            );
        } else if item.starts_with('!') {
            continue;
        } else if let Some(caps) = RE_SEPARATOR.captures(item) {
            let label = caps[1].trim();
            nodes.push(Node::Separator(Separator {
                id: None,
                name: (!label.is_empty()).then(|| label.to_string()),
            }));
        } else if let Some(caps) = RE_LINK.captures(item) {
            let url = caps[2].to_string();
            let external = url.starts_with("http://") || url.starts_with("https://");
            nodes.push(Node::Page(Item {
                name: caps[1].to_string(),
                url,
                external: external.then_some(true),
                ..Item::default()
            }));
        } else if let Some(entry) = entries.iter().find(|e| e.key == *item) {
            nodes.push(entry.node.clone());
        } else {
            debug!("tree"; "meta.json lists unknown page `{}`", item);
        }
    }
    nodes
}
