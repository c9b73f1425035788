//! Sidecar assets: families, the locator, route enumeration and caching.
//!
//! Every asset lives in the `assets` directory next to the document of the
//! page that owns it.

mod cache;
mod kind;
mod locate;
mod params;

pub use cache::AssetCache;
pub use kind::AssetFamily;
pub use locate::{ASSETS_DIR, assets_dir, find_asset, locate};
pub use params::{StaticParam, enumerate};
