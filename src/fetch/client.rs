//! Metadata Fetcher
//!
//! Performs the two per-image remote lookups: true pixel dimensions
//! (`?fmt=info`) and the encoded placeholder (`?fmt=thumbhash`). Both are
//! pure functions of the locator and safe to run concurrently; the only
//! shared state is the reqwest client's connection pool.
//!
//! Failures never cross this boundary. Network errors, bad statuses and
//! decode failures are logged and collapsed to `None` — the worst case for
//! a broken image is a tag rewritten without placeholder or dimensions.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::warn;

use crate::error::{PipelineError, Result};
use crate::locator;
use crate::models::{Dimensions, InfoResponse};
use crate::thumbhash;

/// Query value selecting the dimension lookup.
const FMT_INFO: &str = "info";
/// Query value selecting the encoded placeholder lookup.
const FMT_THUMBHASH: &str = "thumbhash";

// == Metadata Source Trait ==
/// Source of per-image metadata.
///
/// The scheduler only sees this trait, which keeps the fetch side
/// swappable in tests (a counting fake) and at the seam where another
/// image service could be plugged in.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetches true pixel dimensions, `None` when unavailable.
    async fn fetch_dimensions(&self, image_url: &str) -> Option<Dimensions>;

    /// Fetches the placeholder as an embeddable data URL, `None` when
    /// unavailable.
    async fn fetch_data_url(&self, image_url: &str) -> Option<String>;
}

// == Metadata Fetcher ==
/// Production [`MetadataSource`] backed by the remote image service.
#[derive(Debug, Clone, Default)]
pub struct MetadataFetcher {
    client: reqwest::Client,
}

impl MetadataFetcher {
    /// Creates a fetcher with its own connection pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fetcher reusing an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Builds the request target: canonical locator plus the format query.
    fn format_url(image_url: &str, format: &str) -> String {
        format!("{}?fmt={format}", locator::canonical(image_url))
    }

    async fn get_success(&self, url: &str) -> Result<reqwest::Response> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(PipelineError::UnexpectedStatus {
                url: url.to_string(),
                status: response.status(),
            });
        }
        Ok(response)
    }

    async fn try_dimensions(&self, image_url: &str) -> Result<Option<Dimensions>> {
        let url = Self::format_url(image_url, FMT_INFO);
        let info: InfoResponse = self.get_success(&url).await?.json().await?;
        Ok(info.dimensions())
    }

    async fn try_data_url(&self, image_url: &str) -> Result<String> {
        let url = Self::format_url(image_url, FMT_THUMBHASH);
        let body = self.get_success(&url).await?.text().await?;
        let bytes = BASE64.decode(body.trim())?;
        thumbhash::data_url(&bytes)
    }
}

#[async_trait]
impl MetadataSource for MetadataFetcher {
    async fn fetch_dimensions(&self, image_url: &str) -> Option<Dimensions> {
        match self.try_dimensions(image_url).await {
            Ok(dims) => dims,
            Err(err) => {
                warn!("dimension lookup failed for {image_url}: {err}");
                None
            }
        }
    }

    async fn fetch_data_url(&self, image_url: &str) -> Option<String> {
        match self.try_data_url(image_url).await {
            Ok(data_url) => Some(data_url),
            Err(err) => {
                warn!("thumbhash lookup failed for {image_url}: {err}");
                None
            }
        }
    }
}
