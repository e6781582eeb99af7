//! Dedup Scheduler
//!
//! Fans metadata lookups out over the unique eligible locators of one
//! document and joins the results back onto every original occurrence.
//! Each unique locator is fetched at most once per pass; duplicates reuse
//! the single result. The join waits for every lookup to settle — soft
//! failures arrive as `None` fields, so no single image can short-circuit
//! the pass.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::MetadataCache;
use crate::fetch::MetadataSource;
use crate::locator;
use crate::models::{Dimensions, FetchResult};

// == Dedup Scheduler ==
/// Per-document metadata resolution with cross-document cache sharing.
///
/// The cache and the fetch source are passed in explicitly; the scheduler
/// owns no state of its own beyond those handles, so one instance serves a
/// whole build.
pub struct DedupScheduler {
    cache: Arc<RwLock<MetadataCache>>,
    source: Arc<dyn MetadataSource>,
}

impl DedupScheduler {
    /// Creates a scheduler over a shared cache and fetch source.
    pub fn new(cache: Arc<RwLock<MetadataCache>>, source: Arc<dyn MetadataSource>) -> Self {
        Self { cache, source }
    }

    /// Handle to the shared cache.
    pub fn cache(&self) -> &Arc<RwLock<MetadataCache>> {
        &self.cache
    }

    // == Resolve ==
    /// Resolves metadata for an ordered sequence of locators.
    ///
    /// The output is aligned 1:1 with the input: `None` for locators the
    /// predicate rejects, and a shared [`FetchResult`] for every occurrence
    /// of an eligible locator. Output order is the input order; completion
    /// order of the concurrent lookups has no effect, because results are
    /// joined by locator identity.
    pub async fn resolve<F>(&self, locators: &[String], eligible: F) -> Vec<Option<FetchResult>>
    where
        F: Fn(&str) -> bool,
    {
        // Unique eligible locators, in first-occurrence order
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for loc in locators {
            if eligible(loc) && seen.insert(loc.as_str()) {
                unique.push(loc.as_str());
            }
        }

        let resolved = join_all(unique.iter().copied().map(|loc| self.resolve_one(loc))).await;
        let by_locator: HashMap<&str, FetchResult> =
            unique.into_iter().zip(resolved).collect();

        locators
            .iter()
            .map(|loc| by_locator.get(loc.as_str()).cloned())
            .collect()
    }

    /// Resolves both metadata fields for one locator concurrently.
    async fn resolve_one(&self, image_url: &str) -> FetchResult {
        let (data_url, dimensions) = tokio::join!(
            self.resolve_data_url(image_url),
            self.resolve_dimensions(image_url),
        );
        FetchResult {
            data_url,
            dimensions,
        }
    }

    /// Cache-checked placeholder lookup: consult the cache, fetch on miss,
    /// fill the cache with whatever came back.
    async fn resolve_data_url(&self, image_url: &str) -> Option<String> {
        let cached = self.cache.write().await.data_url(image_url);
        if cached.is_some() {
            return cached;
        }
        debug!("{} placeholder cache miss", locator::file_name(image_url));

        let fetched = self.source.fetch_data_url(image_url).await?;
        self.cache.write().await.set_data_url(image_url, &fetched);
        Some(fetched)
    }

    /// Cache-checked dimension lookup, same shape as the placeholder path.
    async fn resolve_dimensions(&self, image_url: &str) -> Option<Dimensions> {
        let cached = self.cache.write().await.dimensions(image_url);
        if cached.is_some() {
            return cached;
        }
        debug!("{} dimension cache miss", locator::file_name(image_url));

        let fetched = self.source.fetch_dimensions(image_url).await?;
        self.cache.write().await.set_dimensions(image_url, fetched);
        Some(fetched)
    }
}
