//! Error taxonomy for document loading, navigation, and extraction

use std::time::Duration;

/// Errors surfaced by the viewer engine.
///
/// Loading and navigation failures are caught at the `ViewerSession`
/// boundary and degrade to "no state change"; they never propagate as
/// panics into the host event loop.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    /// Unreadable or corrupt document. Aborts the open, leaving any
    /// previously active document untouched.
    #[error("unreadable document: {detail}")]
    Format { detail: String },

    /// Page index outside `1..=page_count`
    #[error("page {page} out of range (1-{count})")]
    OutOfRange { page: u32, count: u32 },

    /// Selection rectangle outside the page bounds
    #[error("selection rectangle outside page bounds")]
    Bounds,

    /// The rasterizer worker did not produce a page in time
    #[error("page rasterization timed out after {0:?}")]
    RasterTimeout(Duration),

    /// The external recognition engine returned no result
    #[error("recognition failed: {0}")]
    Recognition(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ViewerError {
    pub fn format(detail: impl Into<String>) -> Self {
        Self::Format {
            detail: detail.into(),
        }
    }
}

impl From<image::ImageError> for ViewerError {
    fn from(e: image::ImageError) -> Self {
        Self::format(e.to_string())
    }
}

impl From<tiff::TiffError> for ViewerError {
    fn from(e: tiff::TiffError) -> Self {
        Self::format(e.to_string())
    }
}

#[cfg(feature = "pdf")]
impl From<mupdf::error::Error> for ViewerError {
    fn from(e: mupdf::error::Error) -> Self {
        Self::format(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ViewerError>;
