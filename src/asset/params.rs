//! Static Param Enumerator: every existing `(page, asset)` route.

use std::fs;

use serde::Serialize;

use super::locate::assets_dir;
use crate::content::ContentIndex;

/// One concrete asset route: the page slug followed by the asset basename.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StaticParam {
    pub slug: Vec<String>,
}

/// List every asset with extension `ext` (e.g. `.bpmn`) next to every page.
///
/// Pages without a document or without an `assets` directory are skipped.
/// Order follows the index, then directory listing order, which consumers
/// must treat as unordered.
pub fn enumerate(index: &ContentIndex, ext: &str) -> Vec<StaticParam> {
    let mut params = Vec::new();

    for page in index.pages() {
        let Some(dir) = assets_dir(page) else {
            continue;
        };
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };

        for entry in entries.filter_map(Result::ok) {
            // follows symlinks; directories named `x.bpmn` are not assets
            if !entry.path().is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(basename) = name.to_str().and_then(|n| n.strip_suffix(ext)) else {
                continue;
            };
            if basename.is_empty() {
                continue;
            }

            let mut slug = page.slug.clone();
            slug.push(basename.to_string());
            params.push(StaticParam { slug });
        }
    }

    params
}
