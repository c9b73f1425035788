//! `[serve]` section configuration.
//!
//! Contains asset server settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 5280                 # HTTP port number
//! threads = 4                 # Request worker threads
//! cache = false               # Keep asset bytes in memory (revalidated by mtime)
//! preview = false             # Enable /preview/{family}/docs/... PNG rendering
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Asset server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// Worker threads handling requests.
    pub threads: usize,

    /// Cache asset bytes in memory.
    pub cache: bool,

    /// Rasterize diagrams on `/preview/...` requests.
    pub preview: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 5280,
            threads: 4,
            cache: false,
            preview: false,
        }
    }
}

impl ServeConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.threads == 0 {
            diag.error(FieldPath::new("serve.threads"), "must be at least 1");
        }
    }
}
