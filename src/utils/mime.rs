//! MIME type constants.
//!
//! Provides consistent Content-Type values across the codebase.

/// Common MIME type constants.
pub mod types {
    // Text
    pub const PLAIN: &str = "text/plain; charset=utf-8";
    pub const JSON: &str = "application/json";
    pub const XML: &str = "application/xml";
    pub const MARKDOWN: &str = "text/markdown; charset=utf-8";

    // Documents
    pub const PDF: &str = "application/pdf";

    // Images
    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const WEBP: &str = "image/webp";
    pub const SVG: &str = "image/svg+xml";
}
