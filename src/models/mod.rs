//! Data Transfer Models
//!
//! Wire shapes exchanged with the remote services and the result types the
//! pipeline hands back to the rewriter.

pub mod remote;
pub mod result;

pub use remote::{GistFile, GistResponse, InfoResponse};
pub use result::{Dimensions, FetchResult};
