//! Local File Backend
//!
//! Persists the cache document as a pretty-printed JSON file under the
//! configured working root.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::persist::{parse_document, render_document, CacheBackend, CacheDocument};

// == Local File Backend ==
/// Filesystem-backed cache persistence.
#[derive(Debug, Clone)]
pub struct LocalFileBackend {
    path: PathBuf,
}

impl LocalFileBackend {
    /// Creates a backend rooted at `root`, storing `file_name` inside it.
    pub fn new(root: &Path, file_name: &str) -> Self {
        Self {
            path: root.join(file_name),
        }
    }

    /// Full path of the cache document.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CacheBackend for LocalFileBackend {
    fn name(&self) -> &'static str {
        "local file"
    }

    async fn load(&self) -> Result<Option<CacheDocument>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("cache file {} not found", self.path.display());
                return Ok(None);
            }
            Err(err) => {
                return Err(PipelineError::io(
                    format!("reading cache file {}", self.path.display()),
                    err,
                ))
            }
        };
        // Tolerate a file that exists but was never written to
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(parse_document(&content)?))
    }

    async fn save(&self, entries: &CacheDocument) -> Result<bool> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(|err| {
                PipelineError::io(format!("creating cache directory {}", parent.display()), err)
            })?;
        }
        let content = render_document(entries)?;
        fs::write(&self.path, content).await.map_err(|err| {
            PipelineError::io(format!("writing cache file {}", self.path.display()), err)
        })?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheEntry;

    fn sample_entries() -> CacheDocument {
        let mut entries = CacheDocument::new();
        entries.insert(
            "https://host/a.jpg".to_string(),
            CacheEntry {
                data_url: Some("data:image/png;base64,aaa".to_string()),
                width: Some(800),
                height: Some(600),
            },
        );
        entries.insert(
            "https://host/b.jpg".to_string(),
            CacheEntry {
                data_url: Some("data:image/png;base64,bbb".to_string()),
                ..CacheEntry::default()
            },
        );
        entries
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalFileBackend::new(dir.path(), "thumbcache.json");
        assert!(backend.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalFileBackend::new(dir.path(), "thumbcache.json");
        let entries = sample_entries();

        assert!(backend.save(&entries).await.unwrap());
        let loaded = backend.load().await.unwrap().unwrap();
        assert_eq!(loaded, entries);
    }

    #[tokio::test]
    async fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalFileBackend::new(&dir.path().join("nested/deeper"), "cache.json");
        assert!(backend.save(&sample_entries()).await.unwrap());
        assert!(backend.path().exists());
    }

    #[tokio::test]
    async fn test_load_malformed_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalFileBackend::new(dir.path(), "thumbcache.json");
        tokio::fs::write(backend.path(), "{ nope").await.unwrap();
        assert!(backend.load().await.is_err());
    }

    #[tokio::test]
    async fn test_load_accepts_legacy_values() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalFileBackend::new(dir.path(), "thumbcache.json");
        tokio::fs::write(
            backend.path(),
            r#"{"https://host/old.jpg": "data:image/png;base64,legacy"}"#,
        )
        .await
        .unwrap();
        let loaded = backend.load().await.unwrap().unwrap();
        assert_eq!(
            loaded["https://host/old.jpg"].data_url.as_deref(),
            Some("data:image/png;base64,legacy")
        );
    }

    #[tokio::test]
    async fn test_load_empty_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalFileBackend::new(dir.path(), "thumbcache.json");
        tokio::fs::write(backend.path(), "").await.unwrap();
        assert!(backend.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_written_file_uses_object_form() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalFileBackend::new(dir.path(), "thumbcache.json");
        backend.save(&sample_entries()).await.unwrap();
        let raw = tokio::fs::read_to_string(backend.path()).await.unwrap();
        assert!(raw.contains("\"dataURL\""));
    }
}
