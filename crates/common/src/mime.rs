//! Serve-time content type inference.

use crate::content::DEFAULT_MIME_TYPE;

/// Extensions whose content type overrides whatever was stored at ingestion.
const KNOWN_EXTENSIONS: &[(&str, &str)] = &[
    (".html", "text/html"),
    (".css", "text/css"),
    (".js", "application/javascript"),
    (".json", "application/json"),
    (".png", "image/png"),
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".svg", "image/svg+xml"),
];

/// Content type implied by the path's extension, if it is one we know.
pub fn known_content_type(path: &str) -> Option<&'static str> {
    KNOWN_EXTENSIONS
        .iter()
        .find(|(ext, _)| path.ends_with(ext))
        .map(|(_, mime)| *mime)
}

/// Content type to serve `path` with.
///
/// Known extensions win; otherwise the stored MIME type is used, or the
/// generic default when nothing was stored.
pub fn content_type_for<'a>(path: &str, stored: &'a str) -> &'a str {
    match known_content_type(path) {
        Some(mime) => mime,
        None if stored.is_empty() => DEFAULT_MIME_TYPE,
        None => stored,
    }
}
