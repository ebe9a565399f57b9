//! Control commands and normalization of the file payloads producers send.
//!
//! Producers serialize the file mapping in whatever shape their transport
//! allows. Everything is funnelled through [`normalize_files`] into a
//! [`CacheState`] before the rest of the system sees it.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::cache::FileCache;
use crate::content::{CacheState, ContentEntry};

/// Inbound control message.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ControlCommand {
    /// Replace the whole cache with the supplied files
    #[serde(alias = "FILE_LIST")]
    Replace {
        #[serde(default)]
        files: Value,
    },
    /// Drop every cached and persisted file
    #[serde(alias = "CLEAR_PERSISTENCE")]
    Clear,
}

impl FileCache {
    /// Apply a control command. The in-memory effect is immediate; durable
    /// store work is queued and its outcome only shows up in logs and stats.
    pub fn handle(&self, command: ControlCommand) {
        match command {
            ControlCommand::Replace { files } => {
                let state = normalize_files(&files);
                self.replace(state);
            }
            ControlCommand::Clear => self.clear(),
        }
    }
}

/// Normalize a file payload into a fresh [`CacheState`].
///
/// Accepted shapes:
/// - an array of `[path, entry]` pairs
/// - an object mapping path to entry
///
/// Anything else yields an empty state. Pairs and entries of the wrong shape
/// are skipped. When a path appears twice the later entry wins.
pub fn normalize_files(payload: &Value) -> CacheState {
    let state: CacheState = match payload {
        Value::Array(pairs) => pairs.iter().filter_map(pair_entry).collect(),
        Value::Object(map) => map
            .iter()
            .filter_map(|(path, raw)| decode_entry(raw).map(|entry| (path.clone(), entry)))
            .collect(),
        _ => CacheState::new(),
    };

    debug!(files = state.len(), "normalized file payload");
    state
}

fn pair_entry(pair: &Value) -> Option<(String, ContentEntry)> {
    let items = pair.as_array()?;
    if items.len() < 2 {
        return None;
    }
    let path = items[0].as_str()?;
    let entry = decode_entry(&items[1])?;
    Some((path.to_string(), entry))
}

/// `{ "bytes" | "data": <base64 string | [u8]>, "mimeType" | "type": string? }`
fn decode_entry(raw: &Value) -> Option<ContentEntry> {
    let fields = raw.as_object()?;
    let bytes = field(fields, &["bytes", "data"]).and_then(decode_bytes)?;
    let mime_type = field(fields, &["mimeType", "type"])
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(ContentEntry::new(bytes, mime_type))
}

fn field<'a>(fields: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| fields.get(*name))
}

fn decode_bytes(raw: &Value) -> Option<Vec<u8>> {
    match raw {
        Value::String(encoded) => STANDARD.decode(encoded).ok(),
        Value::Array(items) => items
            .iter()
            .map(|b| b.as_u64().and_then(|n| u8::try_from(n).ok()))
            .collect(),
        _ => None,
    }
}
