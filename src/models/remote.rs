//! Remote service wire shapes
//!
//! Bodies exchanged with the image-processing endpoint and the gist API.

use std::collections::HashMap;

use serde::Deserialize;

use crate::models::Dimensions;

// == Info Response ==
/// Body of a `?fmt=info` lookup.
///
/// The service reports dimensions as numeric `ImageWidth` / `ImageHeight`
/// fields. Anything else in the body is ignored, and a missing or
/// non-numeric field degrades the whole lookup to "unavailable" rather
/// than an error.
#[derive(Debug, Default, Deserialize)]
pub struct InfoResponse {
    #[serde(rename = "ImageWidth", default)]
    pub image_width: serde_json::Value,
    #[serde(rename = "ImageHeight", default)]
    pub image_height: serde_json::Value,
}

impl InfoResponse {
    /// Extracts dimensions when both fields are present and numeric.
    pub fn dimensions(&self) -> Option<Dimensions> {
        let width = self.image_width.as_f64()?;
        let height = self.image_height.as_f64()?;
        if !width.is_finite() || !height.is_finite() || width < 0.0 || height < 0.0 {
            return None;
        }
        Some(Dimensions {
            width: width as u32,
            height: height as u32,
        })
    }
}

// == Gist Container ==
/// Body of a "get container" request against the gist API.
///
/// Only the file table matters here; the rest of the payload is dropped.
#[derive(Debug, Deserialize)]
pub struct GistResponse {
    pub files: HashMap<String, GistFile>,
}

/// One named file inside a gist container.
#[derive(Debug, Deserialize)]
pub struct GistFile {
    #[serde(default)]
    pub content: Option<String>,
}

impl GistResponse {
    /// Returns the content of the named file, if the container holds it.
    pub fn file_content(&self, name: &str) -> Option<&str> {
        self.files.get(name)?.content.as_deref()
    }
}
