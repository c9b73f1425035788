//! Page metadata from `---` (YAML-like) or `+++` (TOML) frontmatter.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Navigation metadata of a document.
///
/// Only the fields the page tree needs are read; everything else in the
/// frontmatter is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

/// Split a document into `(metadata, body)`.
///
/// Documents without frontmatter yield default metadata and the whole
/// content as body. Malformed TOML frontmatter is an error.
pub fn extract(content: &str) -> Result<(PageMeta, &str)> {
    match detect_frontmatter(content) {
        Some((fm, body, true)) => Ok((parse_toml(fm)?, body)),
        Some((fm, body, false)) => Ok((parse_yaml_like(fm), body)),
        None => Ok((PageMeta::default(), content)),
    }
}

/// Document body with any frontmatter removed.
pub fn strip_frontmatter(content: &str) -> &str {
    detect_frontmatter(content).map_or(content, |(_, body, _)| body)
}

/// Detect and extract frontmatter.
/// Returns `(frontmatter, body, is_toml)` if found.
fn detect_frontmatter(content: &str) -> Option<(&str, &str, bool)> {
    let trimmed = content.trim_start();

    for (fence, is_toml) in [("---", false), ("+++", true)] {
        if let Some(rest) = trimmed.strip_prefix(fence)
            && let Some(end) = rest.find(&format!("\n{fence}"))
        {
            let fm = rest[..end].trim();
            let body = rest[end + 4..].trim_start_matches(['\r', '\n']);
            return Some((fm, body, is_toml));
        }
    }

    None
}

/// Parse simple YAML-like frontmatter (`key: value` lines).
///
/// Only top-level scalars are read. Nested mappings and block scalars
/// (`key: |`, `key: >-`) are skipped, so such a field stays unset.
fn parse_yaml_like(content: &str) -> PageMeta {
    let mut meta = PageMeta::default();

    for line in content.lines() {
        if line.starts_with([' ', '\t']) {
            continue;
        }
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if value.starts_with(['|', '>']) {
            continue;
        }
        let value = unquote(value);
        if value.is_empty() {
            continue;
        }

        match key.trim().to_lowercase().as_str() {
            "title" => meta.title = Some(value.to_string()),
            "description" => meta.description = Some(value.to_string()),
            "icon" => meta.icon = Some(value.to_string()),
            _ => {}
        }
    }

    meta
}

/// Strip one pair of matching surrounding quotes.
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

fn parse_toml(content: &str) -> Result<PageMeta> {
    toml::from_str(content).map_err(|e| anyhow::anyhow!("Invalid TOML frontmatter: {}", e))
}
