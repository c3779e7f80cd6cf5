//! Single-image documents (PNG, JPEG, GIF)

use std::path::Path;

use image::{DynamicImage, ImageReader, RgbImage};

use crate::error::Result;

use super::flatten_onto_white;

/// A one-page document backed by a decoded raster image.
///
/// The image is decoded eagerly at open time so a corrupt file fails the
/// open instead of the first paint.
pub struct ImageDocument {
    image: RgbImage,
}

impl ImageDocument {
    pub fn open(path: &Path) -> Result<Self> {
        let decoded = ImageReader::open(path)?.with_guessed_format()?.decode()?;
        Ok(Self::from_image(flatten(decoded)))
    }

    #[must_use]
    pub fn from_image(image: RgbImage) -> Self {
        Self { image }
    }

    #[must_use]
    pub fn page_count(&self) -> u32 {
        1
    }

    pub fn get_page(&self) -> Result<RgbImage> {
        Ok(self.image.clone())
    }
}

fn flatten(decoded: DynamicImage) -> RgbImage {
    match decoded {
        DynamicImage::ImageRgb8(rgb) => rgb,
        DynamicImage::ImageRgba8(rgba) => flatten_onto_white(&rgba),
        other if other.color().has_alpha() => flatten_onto_white(&other.to_rgba8()),
        other => other.to_rgb8(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba, RgbaImage};
    use std::io::Write;

    #[test]
    fn open_decodes_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        RgbImage::from_pixel(8, 6, Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();

        let doc = ImageDocument::open(&path).unwrap();
        assert_eq!(doc.page_count(), 1);
        let page = doc.get_page().unwrap();
        assert_eq!((page.width(), page.height()), (8, 6));
        assert_eq!(page.get_pixel(0, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn transparent_png_is_flattened_onto_white() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alpha.png");
        RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]))
            .save(&path)
            .unwrap();

        let page = ImageDocument::open(&path).unwrap().get_page().unwrap();
        assert_eq!(page.get_pixel(2, 2), &Rgb([255, 255, 255]));
    }

    #[test]
    fn garbage_file_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"not a png at all").unwrap();

        assert!(ImageDocument::open(&path).is_err());
    }
}
