//! Configuration Module
//!
//! Pipeline configuration with an explicit default for every recognized
//! field. Values come from an optional TOML file merged field-by-field over
//! the defaults, followed by explicit environment overrides for secrets.

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::cache::KeyMode;
use crate::error::{PipelineError, Result};

/// Environment variable consulted for the gist credential override.
pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";

/// Environment variable consulted for the gist container id override.
pub const GIST_ID_VAR: &str = "THUMBFETCH_GIST_ID";

/// Pipeline configuration.
///
/// Unknown keys in the configuration file are rejected rather than silently
/// accepted; every recognized option has an explicit default below.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Master switch for the whole pipeline
    pub enable: bool,
    /// Name of the environment variable that must equal `true` for the
    /// pipeline to run (CI gating, so local previews skip remote traffic)
    pub env_name: String,
    /// Cache document file name
    pub cache_file: String,
    /// Working root the cache file path is resolved against
    pub root: PathBuf,
    /// Cache key derivation mode
    pub cache_key_type: KeyMode,
    /// Gist container id for the remote cache backend
    pub gist_id: Option<String>,
    /// Bearer token for the remote cache backend
    pub github_token: Option<String>,
    /// Widths used to build the responsive `srcset` attribute
    pub srcset_widths: Vec<u32>,
    /// Emit a `sizes` attribute on rewritten tags
    pub add_max_width: bool,
    /// Value of the `sizes` attribute when enabled
    pub max_widths: String,
    /// Mark images beyond the first few as lazily loaded
    pub enable_lazy_loading: bool,
    /// Number of leading eligible images that skip lazy loading
    pub lazy_skip_first: usize,
    /// A locator is eligible only if it contains one of these domains
    pub supported_domains: Vec<String>,
    /// Extensions that are never rewritten
    pub exclude_formats: Vec<String>,
    /// Write the progressive-image stylesheet next to the output
    pub inject_css: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable: false,
            env_name: "CI".to_string(),
            cache_file: "thumbcache.json".to_string(),
            root: PathBuf::from("."),
            cache_key_type: KeyMode::ImgSrc,
            gist_id: None,
            github_token: None,
            srcset_widths: vec![200, 400, 600, 800, 1200, 2000, 3000],
            add_max_width: false,
            max_widths: "(max-width: 600px) 100vw, (max-width: 1200px) 50vw, 800px".to_string(),
            enable_lazy_loading: true,
            lazy_skip_first: 2,
            supported_domains: vec![
                "assets.vluv.space".to_string(),
                "s3.bitiful.net".to_string(),
                "bitiful.com".to_string(),
            ],
            exclude_formats: vec!["svg".to_string(), "gif".to_string()],
            inject_css: false,
        }
    }
}

impl Config {
    /// Loads configuration from an optional TOML file, then applies
    /// environment overrides.
    ///
    /// A missing `path` yields the defaults; a present but unreadable or
    /// unparsable file is a hard error, since a misconfigured pipeline
    /// should fail loudly before any fetch activity starts.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    PipelineError::io(format!("reading config from {}", path.display()), e)
                })?;
                toml::from_str(&content).map_err(|e| PipelineError::ConfigInvalid {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?
            }
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Applies environment overrides for the secret-bearing fields.
    ///
    /// `GITHUB_TOKEN` takes precedence over a token in the file, so the
    /// credential can stay out of committed configuration.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = env::var(GITHUB_TOKEN_VAR) {
            if !token.is_empty() {
                debug!("using gist credential from {}", GITHUB_TOKEN_VAR);
                self.github_token = Some(token);
            }
        }
        if let Ok(gist_id) = env::var(GIST_ID_VAR) {
            if !gist_id.is_empty() {
                self.gist_id = Some(gist_id);
            }
        }
    }

    /// Returns true when the pipeline should run: the master switch is on
    /// and the gating environment variable equals `true`.
    pub fn is_active(&self) -> bool {
        self.enable
            && env::var(&self.env_name)
                .map(|v| v == "true")
                .unwrap_or(false)
    }

    /// Full path of the local cache document.
    pub fn cache_file_path(&self) -> PathBuf {
        self.root.join(&self.cache_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert!(!config.enable);
        assert_eq!(config.env_name, "CI");
        assert_eq!(config.cache_file, "thumbcache.json");
        assert_eq!(config.cache_key_type, KeyMode::ImgSrc);
        assert_eq!(config.lazy_skip_first, 2);
        assert_eq!(config.srcset_widths.len(), 7);
        assert!(config.exclude_formats.contains(&"svg".to_string()));
    }

    #[test]
    fn test_config_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            enable = true
            cache_key_type = "img_filename"
            supported_domains = ["cdn.example.com"]
            "#,
        )
        .unwrap();
        assert!(config.enable);
        assert_eq!(config.cache_key_type, KeyMode::ImgFilename);
        assert_eq!(config.supported_domains, vec!["cdn.example.com"]);
        // untouched fields fall back to defaults
        assert_eq!(config.cache_file, "thumbcache.json");
        assert!(config.enable_lazy_loading);
    }

    #[test]
    fn test_config_rejects_unknown_keys() {
        let result: std::result::Result<Config, _> = toml::from_str("bogus_option = 1\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_cache_file_path_joins_root() {
        let config = Config {
            root: PathBuf::from("/tmp/site"),
            ..Config::default()
        };
        assert_eq!(
            config.cache_file_path(),
            PathBuf::from("/tmp/site/thumbcache.json")
        );
    }

    #[test]
    fn test_inactive_without_enable() {
        let config = Config::default();
        assert!(!config.is_active());
    }
}
