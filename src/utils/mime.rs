//! MIME type detection utilities.
//!
//! Fallback table used when the configuration does not name a content type
//! for an extension.

/// Common MIME type constants.
pub mod types {
    // Text
    pub const HTML: &str = "text/html";
    pub const PLAIN: &str = "text/plain";
    pub const CSS: &str = "text/css";
    pub const JAVASCRIPT: &str = "application/javascript";
    pub const JSON: &str = "application/json";
    pub const XML: &str = "application/xml";

    // Images
    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const GIF: &str = "image/gif";
    pub const WEBP: &str = "image/webp";
    pub const SVG: &str = "image/svg+xml";
    pub const ICO: &str = "image/x-icon";

    // Fonts
    pub const WOFF: &str = "font/woff";
    pub const WOFF2: &str = "font/woff2";
    pub const TTF: &str = "font/ttf";

    // Binary
    pub const OCTET_STREAM: &str = "application/octet-stream";
    pub const GZIP: &str = "application/gzip";
}

/// Guess MIME type from file extension string.
pub fn from_extension(ext: Option<&str>) -> &'static str {
    let lower = ext.map(str::to_ascii_lowercase);
    match lower.as_deref() {
        Some("html" | "htm") => types::HTML,
        Some("css") => types::CSS,
        Some("js" | "mjs" | "cjs") => types::JAVASCRIPT,
        Some("json") => types::JSON,
        Some("xml") => types::XML,
        Some("txt") => types::PLAIN,

        Some("png") => types::PNG,
        Some("jpg" | "jpeg") => types::JPEG,
        Some("gif") => types::GIF,
        Some("webp") => types::WEBP,
        Some("svg") => types::SVG,
        Some("ico") => types::ICO,

        Some("woff") => types::WOFF,
        Some("woff2") => types::WOFF2,
        Some("ttf") => types::TTF,

        Some("gz" | "gzip") => types::GZIP,

        _ => types::OCTET_STREAM,
    }
}
