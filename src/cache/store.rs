//! Cache Store Module
//!
//! Durable key-value store mapping image locators to their fetched
//! metadata, with dirty tracking and hit/miss accounting. The store is
//! created once per build, loaded from a persistence backend before any
//! fetch activity, mutated in memory, and written back at the end of the
//! run if anything changed.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::{info, warn};

use crate::cache::{CacheEntry, CacheReport, CacheStats};
use crate::locator;
use crate::models::Dimensions;
use crate::persist::CacheBackend;

// == Key Mode ==
/// Cache key derivation strategy.
///
/// `ImgSrc` keys by the full locator string, query string included: two
/// locators differing only in query parameters occupy two entries even
/// though they fetch from the same canonical target. That inefficiency is
/// the price of never conflating distinct renditions.
///
/// `ImgFilename` keys by the final path segment of the canonical locator,
/// sharing cached metadata across differently-hosted copies of one file.
/// Opt-in only: two distinct images sharing a filename will collide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    #[default]
    ImgSrc,
    ImgFilename,
}

// == Metadata Cache ==
/// In-memory image metadata cache with pluggable persistence.
#[derive(Debug, Default)]
pub struct MetadataCache {
    /// Key-value storage; entries are created or updated, never removed
    entries: HashMap<String, CacheEntry>,
    /// Key derivation strategy
    key_mode: KeyMode,
    /// Set on every effective mutation, cleared after a successful save
    dirty: bool,
    /// Lookup accounting
    stats: CacheStats,
}

impl MetadataCache {
    // == Constructor ==
    /// Creates an empty cache with the given key mode.
    pub fn new(key_mode: KeyMode) -> Self {
        Self {
            key_mode,
            ..Self::default()
        }
    }

    fn key(&self, image_url: &str) -> String {
        match self.key_mode {
            KeyMode::ImgSrc => image_url.to_string(),
            KeyMode::ImgFilename => locator::file_name(image_url).to_string(),
        }
    }

    // == Get Data URL ==
    /// Returns the cached placeholder for a locator.
    ///
    /// Only a present field counts as a hit: an entry that exists but holds
    /// no placeholder is a miss for this lookup, since a remote request is
    /// still needed.
    pub fn data_url(&mut self, image_url: &str) -> Option<String> {
        let key = self.key(image_url);
        match self.entries.get(&key).and_then(|e| e.data_url.clone()) {
            Some(data_url) => {
                self.stats.record_hit();
                Some(data_url)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Get Dimensions ==
    /// Returns the cached dimensions for a locator, counting a hit only
    /// when both axes are present.
    pub fn dimensions(&mut self, image_url: &str) -> Option<Dimensions> {
        let key = self.key(image_url);
        match self.entries.get(&key).and_then(|e| e.dimensions()) {
            Some(dims) => {
                self.stats.record_hit();
                Some(dims)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Set Data URL ==
    /// Stores a placeholder for a locator.
    ///
    /// Writes only when the value differs from what is stored, so repeated
    /// identical writes never re-dirty the store. Empty values are ignored:
    /// a present field is never replaced by an absent one.
    pub fn set_data_url(&mut self, image_url: &str, data_url: &str) {
        if data_url.is_empty() {
            return;
        }
        let key = self.key(image_url);
        let entry = self.entries.entry(key).or_default();
        if entry.data_url.as_deref() != Some(data_url) {
            entry.data_url = Some(data_url.to_string());
            self.dirty = true;
        }
    }

    // == Set Dimensions ==
    /// Stores dimensions for a locator, with the same no-op-write
    /// suppression as [`set_data_url`](Self::set_data_url).
    pub fn set_dimensions(&mut self, image_url: &str, dims: Dimensions) {
        let key = self.key(image_url);
        let entry = self.entries.entry(key).or_default();
        if entry.width != Some(dims.width) || entry.height != Some(dims.height) {
            entry.width = Some(dims.width);
            entry.height = Some(dims.height);
            self.dirty = true;
        }
    }

    // == Stats ==
    /// Zeroes the lookup counters. Called once per build, before any fetch
    /// activity.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Returns a snapshot of the cache state and lookup accounting.
    pub fn report(&self) -> CacheReport {
        CacheReport {
            total_items: self.entries.len(),
            is_dirty: self.dirty,
            api_requests: self.stats.api_requests,
            cache_hits: self.stats.cache_hits,
            total_requests: self.stats.api_requests + self.stats.cache_hits,
            cache_hit_rate: self.stats.hit_rate(),
        }
    }

    // == Introspection ==
    /// Returns true when unpersisted changes exist.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read access to the underlying entries, for persistence.
    pub fn entries(&self) -> &HashMap<String, CacheEntry> {
        &self.entries
    }

    /// Replaces the entries wholesale with freshly loaded state. The store
    /// is clean afterwards: loaded state matches the backend by definition.
    pub fn replace_entries(&mut self, entries: HashMap<String, CacheEntry>) {
        self.entries = entries;
        self.dirty = false;
    }

    // == Load ==
    /// Populates the cache from a persistence backend.
    ///
    /// Every failure path degrades to an empty cache with a warning; a
    /// build without historical cache pays full refetch cost but never
    /// aborts.
    pub async fn load_from(&mut self, backend: &dyn CacheBackend) {
        match backend.load().await {
            Ok(Some(entries)) => {
                info!(
                    "cache loaded from {} backend, {} items",
                    backend.name(),
                    entries.len()
                );
                self.replace_entries(entries);
            }
            Ok(None) => {
                info!(
                    "no cache document in {} backend, starting with empty cache",
                    backend.name()
                );
            }
            Err(err) => {
                warn!(
                    "failed to load cache from {} backend: {err}",
                    backend.name()
                );
            }
        }
    }

    // == Save ==
    /// Persists the cache through a backend if anything changed.
    ///
    /// Returns true only when a write actually happened. The dirty flag is
    /// cleared immediately after a successful save; a failed or skipped
    /// save leaves it set, and the in-memory gains are simply lost when
    /// the process exits.
    pub async fn save_to(&mut self, backend: &dyn CacheBackend) -> bool {
        if !self.dirty {
            info!("cache unchanged, skipping save");
            return false;
        }
        match backend.save(&self.entries).await {
            Ok(true) => {
                self.dirty = false;
                info!(
                    "cache saved to {} backend, {} items",
                    backend.name(),
                    self.entries.len()
                );
                true
            }
            Ok(false) => false,
            Err(err) => {
                warn!("failed to save cache to {} backend: {err}", backend.name());
                false
            }
        }
    }
}
