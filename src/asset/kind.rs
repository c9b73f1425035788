//! Asset family definitions.

use std::fmt;
use std::path::Path;

use crate::utils::mime;

/// Diagram format stored as a sidecar asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetFamily {
    /// BPMN process diagram (XML).
    Bpmn,
    /// Excalidraw sketch (JSON).
    Excalidraw,
}

impl AssetFamily {
    pub const ALL: [Self; 2] = [Self::Bpmn, Self::Excalidraw];

    /// File extension including the leading dot.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Bpmn => ".bpmn",
            Self::Excalidraw => ".excalidraw",
        }
    }

    /// Content type the raw source is served with.
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Bpmn => mime::types::XML,
            Self::Excalidraw => mime::types::JSON,
        }
    }

    /// First URL segment of the family's asset routes.
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Bpmn => "bpmn",
            Self::Excalidraw => "excalidraw",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.prefix() == prefix)
    }

    /// Family of a file name ending in `.bpmn` or `.excalidraw`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        Self::ALL
            .into_iter()
            .find(|f| f.extension()[1..].eq_ignore_ascii_case(ext))
    }
}

impl fmt::Display for AssetFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_lookup() {
        assert_eq!(AssetFamily::from_prefix("bpmn"), Some(AssetFamily::Bpmn));
        assert_eq!(
            AssetFamily::from_prefix("excalidraw"),
            Some(AssetFamily::Excalidraw)
        );
        assert_eq!(AssetFamily::from_prefix("docs"), None);

        assert_eq!(
            AssetFamily::from_path(Path::new("a/flow.BPMN")),
            Some(AssetFamily::Bpmn)
        );
        assert_eq!(AssetFamily::from_path(Path::new("a/flow.png")), None);
    }

    #[test]
    fn test_family_content_types() {
        assert_eq!(AssetFamily::Bpmn.content_type(), "application/xml");
        assert_eq!(AssetFamily::Excalidraw.content_type(), "application/json");
    }
}
