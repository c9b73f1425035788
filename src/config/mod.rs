//! Site configuration management for `sidecar.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── content    # [content]
//! │   ├── serve      # [serve]
//! │   └── render     # [render] and sub-sections
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   └── field      # FieldPath
//! └── mod.rs         # SiteConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section                   | Purpose                                   |
//! |---------------------------|-------------------------------------------|
//! | `[content]`               | Content directory and page base URL       |
//! | `[serve]`                 | Asset server (interface, port, cache)     |
//! | `[render]`                | Browser, timeouts, title/footer defaults  |
//! | `[render.min_dimensions]` | Minimum diagram viewport                  |
//! | `[render.viewer]`         | Viewer script per diagram family          |

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{ContentConfig, RenderConfig, ServeConfig, ViewerConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::{
    cli::{Cli, Commands, RenderArgs},
    log,
    render::{Footer, TitleOption},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing sidecar.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file, or cwd (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Content source settings
    #[serde(default)]
    pub content: ContentConfig,

    /// Asset server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Headless rendering settings
    #[serde(default)]
    pub render: RenderConfig,
}

impl SiteConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. Without one, defaults
    /// are used and the project root is the cwd.
    pub fn load(cli: &Cli) -> Result<Self> {
        crate::logger::set_verbose(cli.verbose);
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = path;
                config
            }
            None => {
                crate::debug!("config"; "no {} found, using defaults", cli.config.display());
                Self::default()
            }
        };

        config.finalize(cli, &cwd);
        config.validate(cli)?;

        Ok(config)
    }

    /// Finalize configuration after loading.
    fn finalize(&mut self, cli: &Cli, cwd: &Path) {
        let root = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.to_path_buf());

        self.apply_command_options(cli);
        self.normalize_paths(&root, cli);
    }

    /// Parse configuration from TOML string
    #[cfg(test)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::from)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {} are ignored:", display_path);
        for field in fields {
            eprintln!("- {field}");
        }
    }

    /// Get path relative to the project root
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Serve {
                interface,
                port,
                cache,
                preview,
            } => {
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
                Self::update_option(&mut self.serve.cache, cache.as_ref());
                Self::update_option(&mut self.serve.preview, preview.as_ref());
            }
            Commands::Render { args } => self.apply_render_args(args),
            Commands::Params { .. } | Commands::Tree { .. } => {}
        }
    }

    /// Apply render arguments from CLI.
    fn apply_render_args(&mut self, args: &RenderArgs) {
        if args.no_title {
            self.render.title = TitleOption::Flag(false);
        } else if let Some(title) = &args.title {
            self.render.title = TitleOption::Text(title.clone());
        }
        if let Some(footer) = &args.footer {
            self.render.footer = Footer::Text(footer.clone());
        }

        let dims = &mut self.render.min_dimensions;
        if args.min_width.is_some() {
            dims.width = args.min_width;
        }
        if args.min_height.is_some() {
            dims.height = args.min_height;
        }
        if args.scale.is_some() {
            self.render.device_scale_factor = args.scale;
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    /// Normalize all paths relative to root directory.
    fn normalize_paths(&mut self, root: &Path, cli: &Cli) {
        // CLI path override first
        Self::update_option(&mut self.content.dir, cli.content.as_ref());

        let root = crate::utils::path::normalize_path(root);
        if !self.config_path.as_os_str().is_empty() {
            self.config_path = crate::utils::path::normalize_path(&self.config_path);
        }

        self.content.dir = crate::utils::path::normalize_path(&root.join(&self.content.dir));
        self.render.normalize(&root);
        self.root = root;
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration for the current command.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self, cli: &Cli) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.serve.validate(&mut diag);
        self.render.validate(&mut diag);

        // Rendering standalone files does not need a content tree
        if !matches!(cli.command, Commands::Render { .. }) {
            self.content.validate(&mut diag);
        }

        diag.print_warnings();

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config from a TOML snippet.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SiteConfig {
    let (parsed, ignored) = SiteConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("sidecar").chain(args.iter().copied()))
    }

    #[test]
    fn test_from_str_invalid_toml() {
        let result = SiteConfig::from_str("[content\ndir = \"docs\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_site_config_default() {
        let config = SiteConfig::default();

        assert_eq!(config.config_path, PathBuf::new());
        assert_eq!(config.content.base_url, "/docs");
        assert_eq!(config.serve.port, 5280);
        assert_eq!(config.render.timeout, 30);
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[content]\nbase_url = \"/d\"\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = SiteConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.content.base_url, "/d");
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_no_unknown_fields() {
        let content = "[serve]\nport = 1\n[render.viewer]\nbpmn = \"a.js\"";
        let (_, ignored) = SiteConfig::parse_with_ignored(content).unwrap();
        assert!(ignored.is_empty());
    }

    #[test]
    fn test_serve_cli_overrides() {
        let mut config = test_parse_config("[serve]\nport = 1000\ncache = false");
        config.apply_command_options(&cli(&["serve", "--port", "2000", "--cache"]));

        assert_eq!(config.serve.port, 2000);
        assert!(config.serve.cache);
        assert!(!config.serve.preview);
    }

    #[test]
    fn test_render_cli_overrides() {
        let mut config = test_parse_config("[render]\ntitle = \"From file\"");
        config.apply_command_options(&cli(&[
            "render",
            "flow.bpmn",
            "--no-title",
            "--footer",
            "ACME",
            "--min-width",
            "400",
        ]));

        assert_eq!(config.render.title, TitleOption::Flag(false));
        assert_eq!(config.render.footer, Footer::Text("ACME".into()));
        assert_eq!(config.render.min_dimensions.width, Some(400));
    }

    #[test]
    fn test_normalize_paths_joins_root() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("content/docs")).unwrap();

        let mut config = SiteConfig::default();
        config.normalize_paths(dir.path(), &cli(&["tree"]));

        assert!(config.content.dir.is_absolute());
        assert!(config.content.dir.ends_with("content/docs"));
        assert!(config.root_relative(&config.content.dir).ends_with("content/docs"));
    }

    #[test]
    fn test_validate_missing_content_dir() {
        let mut config = SiteConfig::default();
        config.content.dir = PathBuf::from("/definitely/not/here");
        assert!(config.validate(&cli(&["tree"])).is_err());
        // render does not need content
        assert!(config.validate(&cli(&["render", "a.bpmn"])).is_ok());
    }
}
