//! Pipeline result types
//!
//! Per-image metadata as handed from the scheduler to the tag rewriter.
//! Both fields are independently optional: a fetch failure on one path
//! never invalidates the other.

// == Dimensions ==
/// True pixel dimensions of a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

// == Fetch Result ==
/// Metadata resolved for one image locator.
///
/// `None` fields mean "unavailable", not an error: the rewriter simply
/// omits the corresponding markup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchResult {
    /// Embeddable placeholder preview (a data URL)
    pub data_url: Option<String>,
    /// True pixel dimensions
    pub dimensions: Option<Dimensions>,
}
