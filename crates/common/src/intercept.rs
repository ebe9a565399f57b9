//! Resolution of request paths under the virtual view namespace.
//!
//! Lookups only ever read the active in-memory generation. They never touch
//! the durable store and never wait on queued persistence.

use bytes::Bytes;
use tracing::warn;

use crate::cache::FileCache;
use crate::mime::content_type_for;

/// Literal segment marking the start of the virtual namespace in a URL path.
pub const VIEW_MARKER: &str = "/__view__/";

/// Outcome of resolving a request inside the view namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewResponse {
    Found {
        path: String,
        content_type: String,
        bytes: Bytes,
    },
    NotFound {
        path: String,
    },
}

/// Extract the logical path from a raw (still percent-encoded) URL path.
///
/// Returns `None` when the path is outside the view namespace. The logical
/// path is everything after the first marker, percent-decoded; if decoding
/// does not produce valid UTF-8 the raw text is used as the key.
pub fn logical_path(uri_path: &str) -> Option<String> {
    let (_, rest) = uri_path.split_once(VIEW_MARKER)?;
    let path = match urlencoding::decode(rest) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => rest.to_string(),
    };
    Some(path)
}

impl FileCache {
    /// Answer a request for `uri_path`, or `None` if it is not ours to answer.
    pub fn intercept(&self, uri_path: &str) -> Option<ViewResponse> {
        let path = logical_path(uri_path)?;
        Some(self.resolve(path))
    }

    /// Look up a logical path in the active generation.
    pub fn resolve(&self, path: String) -> ViewResponse {
        match self.get(&path) {
            Some(entry) => ViewResponse::Found {
                content_type: content_type_for(&path, entry.mime_type()).to_string(),
                bytes: entry.bytes().clone(),
                path,
            },
            None => {
                warn!(path = %path, "file not found in cache");
                ViewResponse::NotFound { path }
            }
        }
    }
}
