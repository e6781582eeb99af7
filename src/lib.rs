//! Thumbfetch - build-time image placeholder pipeline
//!
//! Scans rendered HTML for image tags, resolves a compact visual
//! placeholder and true pixel dimensions for each qualifying image from a
//! remote image-processing endpoint, and rewrites the tags into
//! placeholder-plus-responsive-image markup. A persistent, dirty-tracked
//! cache avoids re-fetching unchanged images across builds.

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod locator;
pub mod models;
pub mod persist;
pub mod pipeline;
pub mod thumbhash;

pub use cache::{KeyMode, MetadataCache};
pub use config::Config;
pub use error::{PipelineError, Result};
pub use fetch::{MetadataFetcher, MetadataSource};
pub use persist::{CacheBackend, GistBackend, LocalFileBackend};
pub use pipeline::{transform_html, DedupScheduler};
