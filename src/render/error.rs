//! Rasterizer error types.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    /// Output extension with no known encoding. Affects that output only.
    #[error("unsupported output format `{}`", .0.display())]
    UnsupportedFormat(PathBuf),

    /// Diagram failed to load or render inside the page.
    #[error("render failed: {0}")]
    Render(String),

    #[error("I/O error on `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Browser failed to launch or the connection to it was lost.
    #[error("browser process error: {0}")]
    Process(String),

    #[error("timed out after {}s during {action}", .after.as_secs())]
    Timeout { action: String, after: Duration },

    /// Unexpected DevTools protocol response.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl RenderError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error ends the whole batch rather than one job.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Process(_))
    }
}
