//! Content index over the documentation directory.
//!
//! # Module Structure
//!
//! - `slug` - document path -> slug segments
//! - `meta` - frontmatter (`title`, `description`, `icon`)
//! - `page` - `Page`
//! - `index` - `ContentIndex` (slug lookup, page resolver)
//! - `tree` - navigation tree and empty-folder conversion

mod index;
pub mod meta;
mod page;
pub mod slug;
pub mod tree;

use std::path::PathBuf;

use thiserror::Error;

pub use index::ContentIndex;
pub use meta::PageMeta;
pub use page::Page;

/// Why a page or asset could not be resolved.
///
/// This is an expected, client-facing condition rather than a failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFound {
    #[error("no page at `/{0}`")]
    Page(String),

    #[error("page `/{0}` has no document on disk")]
    Virtual(String),

    #[error("asset `{}` does not exist", .0.display())]
    Asset(PathBuf),

    #[error("no route matches")]
    Route,
}
