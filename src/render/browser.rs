//! Headless browser seam.
//!
//! `Browser` launches a `Session` (one per batch), a session opens `Page`s
//! (one per job). `ScopedSession` owns a session and closes it exactly once,
//! on `finish()` or on drop.

use serde_json::Value;

use super::{OutputFormat, RenderError};
use crate::debug;

/// Viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f64,
}

/// Screenshot region in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clip {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

pub trait Browser: Send + Sync {
    /// Start a browser session.
    fn launch(&self) -> Result<Box<dyn Session>, RenderError>;
}

pub trait Session {
    fn new_page(&mut self) -> Result<Box<dyn Page>, RenderError>;

    /// Tear the session down. Called once by `ScopedSession`.
    fn close(&mut self) -> Result<(), RenderError>;
}

pub trait Page {
    /// Replace the document with `html` and run its inline scripts.
    fn set_content(&mut self, html: &str) -> Result<(), RenderError>;

    /// Evaluate a script expression, awaiting promises, and return its value.
    fn evaluate(&mut self, expression: &str) -> Result<Value, RenderError>;

    fn set_viewport(&mut self, viewport: Viewport) -> Result<(), RenderError>;

    /// Encoded image of `clip` (`format` is a raster format).
    fn screenshot(&mut self, format: OutputFormat, clip: Clip) -> Result<Vec<u8>, RenderError>;

    /// Single-page PDF with the given page size in CSS pixels.
    fn pdf(&mut self, width: f64, height: f64) -> Result<Vec<u8>, RenderError>;

    fn close(&mut self) -> Result<(), RenderError>;
}

/// Session that is closed on every exit path.
pub struct ScopedSession {
    session: Option<Box<dyn Session>>,
}

impl ScopedSession {
    pub fn acquire(browser: &dyn Browser) -> Result<Self, RenderError> {
        Ok(Self {
            session: Some(browser.launch()?),
        })
    }

    pub fn new_page(&mut self) -> Result<Box<dyn Page>, RenderError> {
        match self.session.as_mut() {
            Some(session) => session.new_page(),
            None => Err(RenderError::Process("session already closed".into())),
        }
    }

    /// Run `f` on a fresh page and close the page afterwards.
    pub fn with_page<T>(
        &mut self,
        f: impl FnOnce(&mut dyn Page) -> Result<T, RenderError>,
    ) -> Result<T, RenderError> {
        let mut page = self.new_page()?;
        let result = f(page.as_mut());
        if let Err(e) = page.close() {
            debug!("render"; "failed to close page: {e}");
        }
        result
    }

    /// Close the session now and report the outcome.
    pub fn finish(mut self) -> Result<(), RenderError> {
        match self.session.take() {
            Some(mut session) => session.close(),
            None => Ok(()),
        }
    }
}

impl Drop for ScopedSession {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.take()
            && let Err(e) = session.close()
        {
            debug!("render"; "failed to close browser session: {e}");
        }
    }
}
