//! Integration Tests for Cache Persistence
//!
//! Exercises the store-plus-backend pairing the way a build uses it:
//! load before fetch activity, mutate in memory, save at the end.

use thumbfetch::models::Dimensions;
use thumbfetch::{GistBackend, KeyMode, LocalFileBackend, MetadataCache};

fn local_backend(dir: &tempfile::TempDir) -> LocalFileBackend {
    LocalFileBackend::new(dir.path(), "thumbcache.json")
}

// == Round Trip ==

#[tokio::test]
async fn test_save_then_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let backend = local_backend(&dir);

    let mut store = MetadataCache::new(KeyMode::ImgSrc);
    store.set_data_url("https://host/a.jpg", "data:image/png;base64,aaa");
    store.set_dimensions(
        "https://host/a.jpg",
        Dimensions {
            width: 800,
            height: 600,
        },
    );
    store.set_data_url("https://host/b.jpg", "data:image/png;base64,bbb");

    assert!(store.save_to(&backend).await);
    assert!(!store.is_dirty(), "dirty clears after a successful save");

    let mut fresh = MetadataCache::new(KeyMode::ImgSrc);
    fresh.load_from(&backend).await;
    assert_eq!(fresh.entries(), store.entries());
    assert_eq!(
        fresh.dimensions("https://host/a.jpg"),
        Some(Dimensions {
            width: 800,
            height: 600
        })
    );
}

// == Dirty Suppression ==

#[tokio::test]
async fn test_clean_store_skips_save() {
    let dir = tempfile::tempdir().unwrap();
    let backend = local_backend(&dir);

    let mut store = MetadataCache::new(KeyMode::ImgSrc);
    assert!(!store.save_to(&backend).await);
    assert!(!backend.path().exists(), "skipped save must not write");
}

#[tokio::test]
async fn test_reloaded_then_rewritten_identical_values_skip_save() {
    let dir = tempfile::tempdir().unwrap();
    let backend = local_backend(&dir);

    let mut store = MetadataCache::new(KeyMode::ImgSrc);
    store.set_data_url("https://host/a.jpg", "data:x");
    assert!(store.save_to(&backend).await);

    let mut second = MetadataCache::new(KeyMode::ImgSrc);
    second.load_from(&backend).await;
    second.set_data_url("https://host/a.jpg", "data:x");
    assert!(!second.is_dirty());
    assert!(!second.save_to(&backend).await);
}

// == Degraded Loads ==

#[tokio::test]
async fn test_missing_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let backend = local_backend(&dir);

    let mut store = MetadataCache::new(KeyMode::ImgSrc);
    store.load_from(&backend).await;
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_malformed_file_degrades_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    let backend = local_backend(&dir);
    std::fs::write(backend.path(), "{ this is not json").unwrap();

    let mut store = MetadataCache::new(KeyMode::ImgSrc);
    store.load_from(&backend).await;
    assert!(store.is_empty());
    assert!(!store.is_dirty());
}

// == Backward Compatibility ==

#[tokio::test]
async fn test_legacy_bare_string_values_are_readable() {
    let dir = tempfile::tempdir().unwrap();
    let backend = local_backend(&dir);
    std::fs::write(
        backend.path(),
        r#"{
            "https://host/old.jpg": "data:image/png;base64,legacy",
            "https://host/new.jpg": {"dataURL": "data:image/png;base64,new", "width": 10, "height": 20}
        }"#,
    )
    .unwrap();

    let mut store = MetadataCache::new(KeyMode::ImgSrc);
    store.load_from(&backend).await;

    assert_eq!(
        store.data_url("https://host/old.jpg").as_deref(),
        Some("data:image/png;base64,legacy")
    );
    assert!(store.dimensions("https://host/old.jpg").is_none());
    assert_eq!(
        store.dimensions("https://host/new.jpg"),
        Some(Dimensions {
            width: 10,
            height: 20
        })
    );
}

#[tokio::test]
async fn test_rewritten_legacy_file_upgrades_to_object_form() {
    let dir = tempfile::tempdir().unwrap();
    let backend = local_backend(&dir);
    std::fs::write(backend.path(), r#"{"https://host/old.jpg": "data:legacy"}"#).unwrap();

    let mut store = MetadataCache::new(KeyMode::ImgSrc);
    store.load_from(&backend).await;
    store.set_dimensions(
        "https://host/old.jpg",
        Dimensions {
            width: 4,
            height: 3,
        },
    );
    assert!(store.save_to(&backend).await);

    let raw = std::fs::read_to_string(backend.path()).unwrap();
    assert!(raw.contains("\"dataURL\": \"data:legacy\""));
    assert!(!raw.contains(r#""https://host/old.jpg": "data:legacy""#));
}

// == Unconfigured Gist Backend ==

#[tokio::test]
async fn test_unconfigured_gist_backend_is_a_noop() {
    let backend = GistBackend::new(None, None, "thumbcache.json");

    let mut store = MetadataCache::new(KeyMode::ImgSrc);
    store.load_from(&backend).await;
    assert!(store.is_empty());

    store.set_data_url("https://host/a.jpg", "data:x");
    assert!(!store.save_to(&backend).await);
    assert!(store.is_dirty(), "a skipped save leaves the dirty flag set");
}
