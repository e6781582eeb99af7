//! Fetch Module
//!
//! Remote metadata lookups against the image-processing endpoint.

mod client;

pub use client::{MetadataFetcher, MetadataSource};
