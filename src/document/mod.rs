//! Document backends: single images, multi-page TIFF, and paginated PDF
//!
//! All backends produce pages as flat RGB images. Formats with alpha are
//! flattened onto a white background at load time, matching how pages are
//! ultimately printed and recognized.

use std::path::Path;

use image::{Rgb, RgbImage, RgbaImage};

use crate::error::{Result, ViewerError};
use crate::settings::Settings;

pub mod raster;
pub mod tiff;

#[cfg(feature = "pdf")]
pub mod pdf;

/// Document format, decided by file extension
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentKind {
    /// PNG, JPEG, GIF: always a single page
    Image,
    /// TIFF: one page per IFD
    Tiff,
    /// PDF: pages rasterized on demand by a worker thread
    Pdf,
}

impl DocumentKind {
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "gif" => Some(Self::Image),
            "tif" | "tiff" => Some(Self::Tiff),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// An open document: a page count and random access to decoded pages.
///
/// Page numbers are 1-based everywhere in the public API.
pub enum DocumentSource {
    SingleImage(raster::ImageDocument),
    RasterMultiPage(tiff::TiffDocument),
    #[cfg(feature = "pdf")]
    PaginatedMultiPage(pdf::PdfDocument),
}

impl DocumentSource {
    /// Open a document file, picking the backend by extension
    pub fn open(path: &Path, settings: &Settings) -> Result<Self> {
        let kind = DocumentKind::from_path(path)
            .ok_or_else(|| ViewerError::format(format!("unsupported file: {}", path.display())))?;

        match kind {
            DocumentKind::Image => Ok(Self::SingleImage(raster::ImageDocument::open(path)?)),
            DocumentKind::Tiff => Ok(Self::RasterMultiPage(tiff::TiffDocument::open(path)?)),
            #[cfg(feature = "pdf")]
            DocumentKind::Pdf => {
                if !settings.pdf_enabled {
                    return Err(ViewerError::format("pdf support is disabled"));
                }
                Ok(Self::PaginatedMultiPage(pdf::PdfDocument::open(
                    path,
                    settings.raster_timeout(),
                )?))
            }
            #[cfg(not(feature = "pdf"))]
            DocumentKind::Pdf => Err(ViewerError::format("pdf support not compiled in")),
        }
    }

    /// Wrap an already-decoded image as a one-page document. Used for
    /// derived documents: an extracted region promoted to a full document.
    #[must_use]
    pub fn from_image(image: RgbImage) -> Self {
        Self::SingleImage(raster::ImageDocument::from_image(image))
    }

    #[must_use]
    pub fn page_count(&self) -> u32 {
        match self {
            Self::SingleImage(doc) => doc.page_count(),
            Self::RasterMultiPage(doc) => doc.page_count(),
            #[cfg(feature = "pdf")]
            Self::PaginatedMultiPage(doc) => doc.page_count(),
        }
    }

    /// Decode page `number` (1-based) at native resolution
    pub fn get_page(&self, number: u32) -> Result<RgbImage> {
        let count = self.page_count();
        if number == 0 || number > count {
            return Err(ViewerError::OutOfRange {
                page: number,
                count,
            });
        }

        match self {
            Self::SingleImage(doc) => doc.get_page(),
            Self::RasterMultiPage(doc) => doc.get_page(number),
            #[cfg(feature = "pdf")]
            Self::PaginatedMultiPage(doc) => doc.get_page(number),
        }
    }
}

/// Composite an RGBA image onto an opaque white background
pub(crate) fn flatten_onto_white(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let px = image.get_pixel(x, y);
        let alpha = u16::from(px[3]);
        let blend = |c: u8| (((u16::from(c) * alpha) + (255 - alpha) * 255) / 255) as u8;
        Rgb([blend(px[0]), blend(px[1]), blend(px[2])])
    })
}
