//! `[content]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [content]
//! dir = "content/docs"   # Documents (.md / .mdx), relative to the project root
//! base_url = "/docs"     # URL prefix of every page
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Content source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Content directory (normalized to an absolute path after loading).
    pub dir: PathBuf,

    /// URL prefix for pages.
    pub base_url: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("content/docs"),
            base_url: "/docs".to_string(),
        }
    }
}

impl ContentConfig {
    /// Base URL with a leading slash and no trailing slash (`""` for root).
    pub fn normalized_base_url(&self) -> String {
        let trimmed = self.base_url.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.dir.is_dir() {
            diag.error_with_hint(
                FieldPath::new("content.dir"),
                format!("content directory `{}` does not exist", self.dir.display()),
                "create it or pass --content <DIR>",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_content_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.content.dir.to_str(), Some("content/docs"));
        assert_eq!(config.content.base_url, "/docs");
    }

    #[test]
    fn test_normalized_base_url() {
        let config = test_parse_config("[content]\nbase_url = \"docs/\"");
        assert_eq!(config.content.normalized_base_url(), "/docs");

        let config = test_parse_config("[content]\nbase_url = \"/\"");
        assert_eq!(config.content.normalized_base_url(), "");
    }
}
