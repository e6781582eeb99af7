//! Gist Backend
//!
//! Persists the cache document as one named file inside a gist container,
//! so CI runs on ephemeral machines can share history. Reads use the "get
//! container" endpoint, writes PATCH the container with fresh content.
//! Both require an opaque container id and a bearer token; when either is
//! missing the backend degrades to an informational no-op.

use async_trait::async_trait;
use reqwest::header;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::models::GistResponse;
use crate::persist::{parse_document, render_document, CacheBackend, CacheDocument};

const GITHUB_API: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("thumbfetch/", env!("CARGO_PKG_VERSION"));

// == Gist Backend ==
/// Remote versioned-blob cache persistence.
pub struct GistBackend {
    client: reqwest::Client,
    gist_id: Option<String>,
    token: Option<String>,
    file_name: String,
}

impl GistBackend {
    /// Creates a backend for `file_name` inside the given container.
    ///
    /// Either credential half may be absent; the backend then skips all
    /// remote traffic instead of failing.
    pub fn new(gist_id: Option<String>, token: Option<String>, file_name: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            gist_id,
            token,
            file_name: file_name.into(),
        }
    }

    fn credentials(&self) -> Option<(&str, &str)> {
        Some((self.gist_id.as_deref()?, self.token.as_deref()?))
    }

    fn gist_url(&self, gist_id: &str) -> String {
        format!("{GITHUB_API}/gists/{gist_id}")
    }
}

#[async_trait]
impl CacheBackend for GistBackend {
    fn name(&self) -> &'static str {
        "gist"
    }

    async fn load(&self) -> Result<Option<CacheDocument>> {
        let Some((gist_id, token)) = self.credentials() else {
            info!("gist id or token not configured, skipping remote cache download");
            return Ok(None);
        };

        let url = self.gist_url(gist_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!("gist {gist_id} not found, starting with empty cache");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(PipelineError::UnexpectedStatus {
                url,
                status: response.status(),
            });
        }

        let gist: GistResponse = response.json().await?;
        match gist.file_content(&self.file_name) {
            Some(content) => Ok(Some(parse_document(content)?)),
            None => {
                debug!("gist {gist_id} holds no file named {}", self.file_name);
                Ok(None)
            }
        }
    }

    async fn save(&self, entries: &CacheDocument) -> Result<bool> {
        let Some((gist_id, token)) = self.credentials() else {
            info!("gist id or token not configured, skipping remote cache upload");
            return Ok(false);
        };

        let url = self.gist_url(gist_id);
        let body = json!({
            "files": {
                &self.file_name: { "content": render_document(entries)? }
            }
        });
        let response = self
            .client
            .patch(&url)
            .bearer_auth(token)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, "application/vnd.github+json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PipelineError::UnexpectedStatus {
                url,
                status: response.status(),
            });
        }
        Ok(true)
    }
}
