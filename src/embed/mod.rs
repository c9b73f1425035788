//! Embedded static resources.
//!
//! # Module Structure
//!
//! - `template` - Template types for typed variable injection
//! - `viewer` - Bootstrap page and viewer adapters for the headless renderer
//!
//! # Usage
//!
//! ```ignore
//! use embed::viewer::{SKELETON_HTML, SkeletonVars, BPMN_ADAPTER_JS};
//!
//! let html = SKELETON_HTML.render(&SkeletonVars { adapter: BPMN_ADAPTER_JS });
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod viewer {
    use super::{Template, TemplateVars};

    /// Variables for skeleton.html.
    pub struct SkeletonVars {
        /// Script defining the `Adapter` object for one diagram family.
        pub adapter: &'static str,
    }

    impl TemplateVars for SkeletonVars {
        fn apply(&self, content: &str) -> String {
            content.replace("__ADAPTER__", self.adapter)
        }
    }

    /// Bootstrap page defining `loadScript`, `openDiagram`, `resize` and `toSVG`.
    pub const SKELETON_HTML: Template<SkeletonVars> =
        Template::new(include_str!("viewer/skeleton.html"));

    /// Adapter over the `BpmnJS` viewer global.
    pub const BPMN_ADAPTER_JS: &str = include_str!("viewer/bpmn.js");

    /// Adapter over the `ExcalidrawUtils` global.
    pub const EXCALIDRAW_ADAPTER_JS: &str = include_str!("viewer/excalidraw.js");
}
