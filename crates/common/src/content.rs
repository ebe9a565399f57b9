//! Content model shared by the cache, the durable store and the HTTP layer.

use std::collections::hash_map;
use std::collections::HashMap;

use bytes::Bytes;

/// MIME type recorded when the producer did not supply one.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// A cached file: immutable bytes plus the MIME type recorded at ingestion.
///
/// Entries are never edited in place. Replacing content under a path always
/// means building a new entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEntry {
    bytes: Bytes,
    mime_type: String,
}

impl ContentEntry {
    /// Create an entry, falling back to [`DEFAULT_MIME_TYPE`] when the MIME
    /// type is missing or blank.
    pub fn new(bytes: impl Into<Bytes>, mime_type: Option<String>) -> Self {
        let mime_type = mime_type
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());

        Self {
            bytes: bytes.into(),
            mime_type,
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Durable counterpart of a [`ContentEntry`], keyed by its logical path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: String,
    pub bytes: Bytes,
    pub mime_type: String,
}

impl FileRecord {
    pub fn from_entry(path: &str, entry: &ContentEntry) -> Self {
        Self {
            path: path.to_string(),
            bytes: entry.bytes.clone(),
            mime_type: entry.mime_type.clone(),
        }
    }

    pub fn into_entry(self) -> (String, ContentEntry) {
        let entry = ContentEntry::new(self.bytes, Some(self.mime_type));
        (self.path, entry)
    }
}

/// One generation of cached content: logical path to entry.
///
/// A state is assembled privately and only then published to the cache.
/// Once published it is shared behind an `Arc` and never mutated again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheState {
    files: HashMap<String, ContentEntry>,
}

impl CacheState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning whatever was previously stored at `path`.
    pub fn insert(&mut self, path: impl Into<String>, entry: ContentEntry) -> Option<ContentEntry> {
        self.files.insert(path.into(), entry)
    }

    pub fn get(&self, path: &str) -> Option<&ContentEntry> {
        self.files.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate entries in the map's enumeration order (unspecified).
    pub fn iter(&self) -> hash_map::Iter<'_, String, ContentEntry> {
        self.files.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Sum of the byte lengths of all entries.
    pub fn total_bytes(&self) -> u64 {
        self.files.values().map(|e| e.len() as u64).sum()
    }

    /// Rebuild a state from durable records. Later records win on duplicate paths.
    pub fn from_records(records: impl IntoIterator<Item = FileRecord>) -> Self {
        records.into_iter().map(FileRecord::into_entry).collect()
    }
}

impl FromIterator<(String, ContentEntry)> for CacheState {
    fn from_iter<I: IntoIterator<Item = (String, ContentEntry)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a CacheState {
    type Item = (&'a String, &'a ContentEntry);
    type IntoIter = hash_map::Iter<'a, String, ContentEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_defaults_mime_type() {
        let entry = ContentEntry::new(b"abc".to_vec(), None);
        assert_eq!(entry.mime_type(), DEFAULT_MIME_TYPE);

        let entry = ContentEntry::new(b"abc".to_vec(), Some("  ".to_string()));
        assert_eq!(entry.mime_type(), DEFAULT_MIME_TYPE);

        let entry = ContentEntry::new(b"abc".to_vec(), Some("text/plain".to_string()));
        assert_eq!(entry.mime_type(), "text/plain");
        assert_eq!(entry.len(), 3);
    }

    #[test]
    fn test_later_insert_replaces_entry() {
        let mut state = CacheState::new();
        state.insert("a.txt", ContentEntry::new(b"one".to_vec(), None));
        let previous = state.insert("a.txt", ContentEntry::new(b"two".to_vec(), None));

        assert_eq!(previous.unwrap().bytes().as_ref(), b"one");
        assert_eq!(state.len(), 1);
        assert_eq!(state.get("a.txt").unwrap().bytes().as_ref(), b"two");
    }

    #[test]
    fn test_paths_are_case_sensitive() {
        let mut state = CacheState::new();
        state.insert("Index.html", ContentEntry::new(b"x".to_vec(), None));

        assert!(state.contains("Index.html"));
        assert!(!state.contains("index.html"));
    }

    #[test]
    fn test_from_records() {
        let records = vec![
            FileRecord {
                path: "a.css".to_string(),
                bytes: Bytes::from_static(b"body{}"),
                mime_type: "text/css".to_string(),
            },
            FileRecord {
                path: "b.bin".to_string(),
                bytes: Bytes::from_static(&[0, 1, 2]),
                mime_type: DEFAULT_MIME_TYPE.to_string(),
            },
        ];

        let state = CacheState::from_records(records);
        assert_eq!(state.len(), 2);
        assert_eq!(state.total_bytes(), 9);
        assert_eq!(state.get("a.css").unwrap().mime_type(), "text/css");
    }
}
