//! `[render]` section configuration.
//!
//! Controls the headless browser used by `sidecar render` and the
//! `/preview/...` endpoint.
//!
//! # Example
//!
//! ```toml
//! [render]
//! browser = "~/bin/chromium"       # Default: discovered on PATH
//! args = ["--no-sandbox"]          # Extra browser flags
//! timeout = 30                     # Seconds per launch / protocol call
//! launch_retries = 1               # Extra launch attempts
//! device_scale_factor = 2.0
//! title = true                     # false | true | "Custom title"
//! footer = false                   # false | true | "Footer text"
//!
//! [render.min_dimensions]
//! width = 800
//! height = 600
//!
//! [render.viewer]
//! bpmn = "vendor/bpmn-viewer.production.min.js"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::render::{Footer, MinDimensions, RenderOptions, TitleOption};

/// Headless rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Browser executable. `None` searches PATH for Chrome/Chromium.
    pub browser: Option<PathBuf>,

    /// Additional command-line flags passed to the browser.
    pub args: Vec<String>,

    /// Timeout in seconds for launch and every protocol call.
    pub timeout: u64,

    /// Extra launch attempts after the first one fails.
    pub launch_retries: u32,

    /// Pixel density multiplier for raster outputs.
    pub device_scale_factor: Option<f64>,

    pub title: TitleOption,
    pub footer: Footer,
    pub min_dimensions: MinDimensions,

    /// Viewer script locations per diagram family.
    pub viewer: ViewerConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            browser: None,
            args: vec!["--no-sandbox".to_string()],
            timeout: 30,
            launch_retries: 1,
            device_scale_factor: None,
            title: TitleOption::default(),
            footer: Footer::default(),
            min_dimensions: MinDimensions::default(),
            viewer: ViewerConfig::default(),
        }
    }
}

/// Where the in-page viewer scripts come from.
///
/// An `http(s)` URL is loaded by the page itself, anything else is treated
/// as a local file and inlined.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub bpmn: String,
    pub excalidraw: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            bpmn: "https://unpkg.com/bpmn-js@17.11.1/dist/bpmn-viewer.production.min.js"
                .to_string(),
            excalidraw: "https://unpkg.com/@excalidraw/utils@0.1.2/dist/excalidraw-utils.min.js"
                .to_string(),
        }
    }
}

impl ViewerConfig {
    /// Resolve file-based viewer locations against the project root.
    pub fn normalize(&mut self, root: &Path) {
        for location in [&mut self.bpmn, &mut self.excalidraw] {
            if !is_remote(location) {
                let expanded = shellexpand::tilde(location.as_str()).into_owned();
                let path = root.join(expanded);
                *location = crate::utils::path::normalize_path(&path)
                    .to_string_lossy()
                    .into_owned();
            }
        }
    }
}

/// Whether a viewer location is fetched by the browser rather than read from disk.
pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

impl RenderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Shared options applied to every job of a batch.
    pub fn options(&self) -> RenderOptions {
        RenderOptions {
            min_dimensions: self.min_dimensions,
            footer: self.footer.clone(),
            title: self.title.clone(),
            device_scale_factor: self.device_scale_factor,
        }
    }

    /// Expand `~` in the browser path and resolve relative paths against `root`.
    pub fn normalize(&mut self, root: &Path) {
        if let Some(browser) = self.browser.take() {
            let expanded = shellexpand::tilde(browser.to_str().unwrap_or_default()).into_owned();
            let path = PathBuf::from(expanded);
            // bare names such as "chromium" stay PATH lookups
            self.browser = Some(if path.components().count() > 1 {
                crate::utils::path::normalize_path(&root.join(path))
            } else {
                path
            });
        }
        self.viewer.normalize(root);
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.timeout == 0 {
            diag.error(FieldPath::new("render.timeout"), "must be at least 1 second");
        }
        if let Some(scale) = self.device_scale_factor
            && !(scale > 0.0 && scale.is_finite())
        {
            diag.error(
                FieldPath::new("render.device_scale_factor"),
                format!("must be a positive number, got {scale}"),
            );
        }
        for (field, location) in [
            ("render.viewer.bpmn", &self.viewer.bpmn),
            ("render.viewer.excalidraw", &self.viewer.excalidraw),
        ] {
            if !is_remote(location) && !Path::new(location).is_file() {
                diag.warn(
                    FieldPath::new(field),
                    format!("viewer script `{location}` not found"),
                );
            }
        }
    }
}
