//! Conversion jobs and shared render options.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::RenderError;
use crate::utils::mime;

/// One input diagram and the files to produce from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub input: PathBuf,
    /// Output encodings are chosen by extension.
    pub outputs: Vec<PathBuf>,
}

impl ConversionJob {
    pub fn new(input: impl Into<PathBuf>, outputs: Vec<PathBuf>) -> Self {
        Self {
            input: input.into(),
            outputs,
        }
    }
}

/// Title above the diagram.
///
/// `false` hides it, non-empty text is shown as-is, `true` and `""` fall back
/// to the input file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TitleOption {
    Flag(bool),
    Text(String),
}

impl Default for TitleOption {
    fn default() -> Self {
        Self::Flag(true)
    }
}

/// Footer below the diagram. `true` shows a default caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Footer {
    Flag(bool),
    Text(String),
}

impl Default for Footer {
    fn default() -> Self {
        Self::Flag(false)
    }
}

impl Footer {
    fn to_json(&self) -> Value {
        match self {
            Self::Flag(flag) => Value::Bool(*flag),
            Self::Text(text) if text.is_empty() => Value::Bool(false),
            Self::Text(text) => Value::String(text.clone()),
        }
    }
}

/// Lower bounds for the rendered diagram, in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinDimensions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Options shared by every job of a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderOptions {
    pub min_dimensions: MinDimensions,
    pub footer: Footer,
    pub title: TitleOption,
    /// Pixel density multiplier, 1.0 when unset.
    pub device_scale_factor: Option<f64>,
}

impl RenderOptions {
    /// Options object passed to the in-page `openDiagram`.
    pub fn open_options(&self, input: &Path) -> Value {
        json!({
            "minDimensions": self.min_dimensions,
            "title": effective_title(input, &self.title).map_or(Value::Bool(false), Value::String),
            "footer": self.footer.to_json(),
        })
    }

    pub fn scale(&self) -> f64 {
        self.device_scale_factor.unwrap_or(1.0)
    }
}

/// Title actually rendered for `input`, `None` when disabled.
pub fn effective_title(input: &Path, title: &TitleOption) -> Option<String> {
    match title {
        TitleOption::Flag(false) => None,
        TitleOption::Text(text) if !text.is_empty() => Some(text.clone()),
        TitleOption::Flag(true) | TitleOption::Text(_) => Some(
            input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        ),
    }
}

/// Output encoding selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pdf,
    Png,
    Jpeg,
    Webp,
    Svg,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self, RenderError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("pdf") => Ok(Self::Pdf),
            Some("png") => Ok(Self::Png),
            Some("jpg" | "jpeg") => Ok(Self::Jpeg),
            Some("webp") => Ok(Self::Webp),
            Some("svg") => Ok(Self::Svg),
            _ => Err(RenderError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Pdf => mime::types::PDF,
            Self::Png => mime::types::PNG,
            Self::Jpeg => mime::types::JPEG,
            Self::Webp => mime::types::WEBP,
            Self::Svg => mime::types::SVG,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_title_defaults_to_file_stem() {
        let input = Path::new("/diagrams/order-flow.bpmn");

        assert_eq!(
            effective_title(input, &TitleOption::default()),
            Some("order-flow".to_string())
        );
        assert_eq!(
            effective_title(input, &TitleOption::Flag(true)),
            Some("order-flow".to_string())
        );
        assert_eq!(
            effective_title(input, &TitleOption::Text(String::new())),
            Some("order-flow".to_string())
        );
    }

    #[test]
    fn test_effective_title_disabled_and_explicit() {
        let input = Path::new("order-flow.bpmn");
        assert_eq!(effective_title(input, &TitleOption::Flag(false)), None);
        assert_eq!(
            effective_title(input, &TitleOption::Text("Orders".into())),
            Some("Orders".to_string())
        );
    }

    #[test]
    fn test_output_format_from_path() {
        assert_eq!(
            OutputFormat::from_path(Path::new("a.PNG")).unwrap(),
            OutputFormat::Png
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("a.jpeg")).unwrap(),
            OutputFormat::Jpeg
        );
        assert!(matches!(
            OutputFormat::from_path(Path::new("a.tiff")),
            Err(RenderError::UnsupportedFormat(p)) if p == Path::new("a.tiff")
        ));
        assert!(OutputFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_open_options_json() {
        let options = RenderOptions {
            min_dimensions: MinDimensions {
                width: Some(800),
                height: None,
            },
            footer: Footer::Text("ACME".into()),
            title: TitleOption::Flag(false),
            device_scale_factor: None,
        };

        let json = options.open_options(Path::new("flow.bpmn"));
        assert_eq!(json["title"], false);
        assert_eq!(json["footer"], "ACME");
        assert_eq!(json["minDimensions"]["width"], 800);
        assert!(json["minDimensions"].get("height").is_none());

        let json = RenderOptions::default().open_options(Path::new("flow.bpmn"));
        assert_eq!(json["title"], "flow");
        assert_eq!(json["footer"], false);
    }
}
