//! `tree` command: the navigation page tree as JSON.

use anyhow::Result;

use super::{emit_json, load_index};
use crate::config::SiteConfig;
use crate::content::tree;

pub fn run_tree(raw: bool, pretty: bool, config: &SiteConfig) -> Result<()> {
    let index = load_index(config)?;
    let root = tree::build(&index)?;
    let root = if raw {
        root
    } else {
        tree::convert_empty_folders(&root)
    };
    emit_json("tree", &root, pretty, None)
}
