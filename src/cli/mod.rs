//! Command-line interface module.

mod args;
pub mod params;
pub mod render;
pub mod serve;
pub mod tree;

pub use args::{Cli, Commands, FamilyArg, ParamsArgs, RenderArgs};

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::SiteConfig;
use crate::content::ContentIndex;
use crate::log;

/// Scan the configured content directory.
fn load_index(config: &SiteConfig) -> Result<ContentIndex> {
    ContentIndex::scan(&config.content.dir, &config.content.normalized_base_url()).with_context(
        || {
            format!(
                "failed to scan content directory `{}`",
                config.content.dir.display()
            )
        },
    )
}

/// Print `value` as JSON to stdout, or write it to `output`.
fn emit_json<T: Serialize>(
    module: &str,
    value: &T,
    pretty: bool,
    output: Option<&Path>,
) -> Result<()> {
    let formatted = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };

    if let Some(output_path) = output {
        let mut file = fs::File::create(output_path)
            .with_context(|| format!("failed to create {}", output_path.display()))?;
        writeln!(file, "{formatted}")?;
        log!(module; "wrote output to {}", output_path.display());
    } else {
        println!("{formatted}");
    }
    Ok(())
}
