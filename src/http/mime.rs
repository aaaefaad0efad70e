//! MIME type detection module
//!
//! Returns the corresponding Content-Type based on file extension.

use std::path::Path;

/// Fallback for unknown or missing extensions
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Lower-cased extension to MIME type
static CONTENT_TYPES: &[(&str, &str)] = &[
    // Images
    ("png", "image/png"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
    ("ico", "image/x-ico"),
    // Documents
    ("json", "application/json"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("xml", "application/xml"),
    // Text
    ("html", "text/html"),
    ("svg", "text/html"),
    ("js", "text/javascript"),
    ("css", "text/css"),
    ("txt", "text/plain"),
    ("md", "text/plain"),
];

/// Get MIME Content-Type for an extension, with or without the leading dot
///
/// # Examples
/// ```
/// use acl_ingress::http::mime::content_type_for_extension;
/// assert_eq!(content_type_for_extension("PNG"), "image/png");
/// assert_eq!(content_type_for_extension(".md"), "text/plain");
/// assert_eq!(content_type_for_extension("mp4"), "application/octet-stream");
/// ```
pub fn content_type_for_extension(extension: &str) -> &'static str {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    CONTENT_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map_or(OCTET_STREAM, |&(_, mime)| mime)
}

/// Get MIME Content-Type for a file path
pub fn content_type_for_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(OCTET_STREAM, content_type_for_extension)
}
