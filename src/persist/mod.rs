//! Cache Persistence Module
//!
//! Two interchangeable backends share one logical contract: load the cache
//! document if it exists, save it back when the store has changes. The
//! local backend keeps a JSON file under the working root; the gist
//! backend keeps the same document as a named file inside a remote gist
//! container.

pub mod gist;
pub mod local;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::cache::{CacheEntry, StoredEntry};
use crate::error::Result;

pub use gist::GistBackend;
pub use local::LocalFileBackend;

/// The persisted form of the cache: a mapping from cache key to entry.
pub type CacheDocument = HashMap<String, CacheEntry>;

// == Cache Backend Trait ==
/// Storage backend for the metadata cache.
///
/// Implementations must be safe to call from async context and must not
/// panic on any I/O outcome; callers treat every error as a soft failure.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short backend name for log lines.
    fn name(&self) -> &'static str;

    /// Loads the cache document.
    ///
    /// `Ok(None)` means no document exists yet (or the backend is not
    /// configured) — a normal first-run condition, not an error.
    async fn load(&self) -> Result<Option<CacheDocument>>;

    /// Saves the cache document.
    ///
    /// Returns `Ok(false)` when the backend is not configured and the save
    /// was skipped; `Ok(true)` when a write happened.
    async fn save(&self, entries: &CacheDocument) -> Result<bool>;
}

// == Document Parsing ==
/// Parses a persisted cache document, migrating legacy bare-string values
/// to the current entry shape.
pub(crate) fn parse_document(json: &str) -> Result<CacheDocument> {
    let raw: HashMap<String, StoredEntry> = serde_json::from_str(json)?;
    Ok(raw
        .into_iter()
        .map(|(key, stored)| (key, CacheEntry::from(stored)))
        .collect())
}

/// Serializes the cache document in the pretty-printed object form.
pub(crate) fn render_document(entries: &CacheDocument) -> Result<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document_mixed_forms() {
        let doc = parse_document(
            r#"{
                "https://host/old.jpg": "data:image/png;base64,legacy",
                "https://host/new.jpg": {"dataURL": "data:image/png;base64,new", "width": 4, "height": 3}
            }"#,
        )
        .unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(
            doc["https://host/old.jpg"].data_url.as_deref(),
            Some("data:image/png;base64,legacy")
        );
        assert_eq!(doc["https://host/new.jpg"].width, Some(4));
    }

    #[test]
    fn test_parse_document_rejects_garbage() {
        assert!(parse_document("not json").is_err());
        assert!(parse_document(r#"{"k": 42}"#).is_err());
    }

    #[test]
    fn test_render_parse_round_trip() {
        let mut entries = CacheDocument::new();
        entries.insert(
            "https://host/a.jpg".to_string(),
            CacheEntry {
                data_url: Some("data:x".to_string()),
                width: Some(10),
                height: Some(20),
            },
        );
        let rendered = render_document(&entries).unwrap();
        let reparsed = parse_document(&rendered).unwrap();
        assert_eq!(reparsed, entries);
    }
}
