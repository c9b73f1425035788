//! Viewer scripts and the bootstrap document per diagram family.

use std::fs;
use std::path::Path;

use serde_json::Value;

use super::RenderError;
use crate::asset::AssetFamily;
use crate::config::ViewerConfig;
use crate::config::section::is_remote;
use crate::embed::viewer::{BPMN_ADAPTER_JS, EXCALIDRAW_ADAPTER_JS, SKELETON_HTML, SkeletonVars};

/// Resolves where each family's viewer library comes from.
#[derive(Debug, Clone, Default)]
pub struct Viewers {
    config: ViewerConfig,
}

impl Viewers {
    pub fn new(config: ViewerConfig) -> Self {
        Self { config }
    }

    pub fn location(&self, family: AssetFamily) -> &str {
        match family {
            AssetFamily::Bpmn => &self.config.bpmn,
            AssetFamily::Excalidraw => &self.config.excalidraw,
        }
    }

    /// Script that makes the viewer library available in the page.
    ///
    /// Remote locations are fetched by the page through `loadScript`, local
    /// files are inlined.
    pub fn injection(&self, family: AssetFamily) -> Result<String, RenderError> {
        let location = self.location(family);
        if is_remote(location) {
            return Ok(format!("loadScript({})", js_string(location)));
        }
        fs::read_to_string(location).map_err(|e| RenderError::io(Path::new(location), e))
    }
}

/// Bootstrap document for `family`.
pub fn skeleton(family: AssetFamily) -> String {
    let adapter = match family {
        AssetFamily::Bpmn => BPMN_ADAPTER_JS,
        AssetFamily::Excalidraw => EXCALIDRAW_ADAPTER_JS,
    };
    SKELETON_HTML.render(&SkeletonVars { adapter })
}

/// Quote `s` as a JavaScript string literal.
pub fn js_string(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}
