//! Configuration section definitions.
//!
//! Each module corresponds to a section in `sidecar.toml`:
//!
//! | Module    | TOML Section  | Purpose                               |
//! |-----------|---------------|---------------------------------------|
//! | `content` | `[content]`   | Content directory and base URL        |
//! | `serve`   | `[serve]`     | Asset server                          |
//! | `render`  | `[render]`    | Headless browser and diagram defaults |

mod content;
mod render;
mod serve;

pub use content::ContentConfig;
pub use render::{RenderConfig, ViewerConfig, is_remote};
pub use serve::ServeConfig;
