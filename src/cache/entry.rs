//! Cache Entry Module
//!
//! Defines the structure of individual cache entries. The placeholder and
//! dimension fields are populated independently by their respective fetch
//! paths, so partial entries are the normal case, not an anomaly.

use serde::{Deserialize, Serialize};

use crate::models::Dimensions;

// == Cache Entry ==
/// A single cached image record.
///
/// Entries are only ever created or field-updated; the cache never removes
/// an entry during a process lifetime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Embeddable placeholder preview
    #[serde(rename = "dataURL", skip_serializing_if = "Option::is_none")]
    pub data_url: Option<String>,
    /// Pixel width of the source image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Pixel height of the source image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl CacheEntry {
    /// Returns dimensions when both axes are present.
    pub fn dimensions(&self) -> Option<Dimensions> {
        Some(Dimensions {
            width: self.width?,
            height: self.height?,
        })
    }
}

// == Stored Entry ==
/// Wire form of one cache value, as read from a persisted document.
///
/// Early cache files stored the placeholder data URL as a bare string;
/// current files store the object form. Readers accept both and migrate
/// on load; writers only ever emit [`CacheEntry`].
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StoredEntry {
    Entry(CacheEntry),
    Legacy(String),
}

impl From<StoredEntry> for CacheEntry {
    fn from(stored: StoredEntry) -> Self {
        match stored {
            StoredEntry::Entry(entry) => entry,
            StoredEntry::Legacy(data_url) => CacheEntry {
                data_url: Some(data_url),
                ..CacheEntry::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_dimensions_require_both_axes() {
        let entry = CacheEntry {
            width: Some(800),
            ..CacheEntry::default()
        };
        assert!(entry.dimensions().is_none());

        let entry = CacheEntry {
            width: Some(800),
            height: Some(600),
            ..CacheEntry::default()
        };
        let dims = entry.dimensions().unwrap();
        assert_eq!(dims.width, 800);
        assert_eq!(dims.height, 600);
    }

    #[test]
    fn test_stored_entry_reads_object_form() {
        let stored: StoredEntry =
            serde_json::from_str(r#"{"dataURL": "data:image/png;base64,xyz", "width": 4}"#)
                .unwrap();
        let entry = CacheEntry::from(stored);
        assert_eq!(entry.data_url.as_deref(), Some("data:image/png;base64,xyz"));
        assert_eq!(entry.width, Some(4));
        assert_eq!(entry.height, None);
    }

    #[test]
    fn test_stored_entry_migrates_legacy_string() {
        let stored: StoredEntry =
            serde_json::from_str(r#""data:image/png;base64,legacy""#).unwrap();
        let entry = CacheEntry::from(stored);
        assert_eq!(entry.data_url.as_deref(), Some("data:image/png;base64,legacy"));
        assert_eq!(entry.width, None);
        assert_eq!(entry.height, None);
    }

    #[test]
    fn test_entry_serializes_object_form_only() {
        let entry = CacheEntry {
            data_url: Some("data:x".to_string()),
            width: Some(1),
            height: None,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"dataURL":"data:x","width":1}"#);
    }
}
