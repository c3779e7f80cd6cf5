//! Page surface: one renderable page at a given scale
//!
//! Owns the unscaled source pixels and the currently materialized scaled
//! image. Rescaling is memoized: repeated `set_scale` calls within a small
//! epsilon of the current scale are no-ops, since rescaling is the most
//! expensive interactive operation in the viewer.

use image::RgbImage;
use image::imageops::{self, FilterType};

use crate::error::{Result, ViewerError};
use crate::geometry::{Point, Rect, Size};
use crate::settings::DEFAULT_SCALE_EPSILON;

/// A single document page, paintable at the current scale and
/// sub-rectangle-extractable.
pub struct PageSurface {
    /// Source pixels at native resolution. Immutable once built.
    unscaled: RgbImage,
    /// Materialized pixels at `current_scale`. Replaced wholesale on a
    /// genuine scale change, never mutated in place.
    scaled: RgbImage,
    /// `None` until the first `set_scale` call
    current_scale: Option<f32>,
    /// Rebuild threshold for scale memoization
    epsilon: f32,
}

impl PageSurface {
    #[must_use]
    pub fn new(unscaled: RgbImage) -> Self {
        Self::with_epsilon(unscaled, DEFAULT_SCALE_EPSILON)
    }

    #[must_use]
    pub fn with_epsilon(unscaled: RgbImage, epsilon: f32) -> Self {
        let scaled = unscaled.clone();
        Self {
            unscaled,
            scaled,
            current_scale: None,
            epsilon,
        }
    }

    /// Native pixel dimensions of the source page
    #[must_use]
    pub fn unscaled_size(&self) -> Size {
        Size::new(self.unscaled.width(), self.unscaled.height())
    }

    /// Dimensions of the currently materialized image
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.scaled.width(), self.scaled.height())
    }

    /// The scale the surface was last materialized at
    #[must_use]
    pub fn scale(&self) -> Option<f32> {
        self.current_scale
    }

    /// Materialize the page at `scale`.
    ///
    /// No-op when `scale` is within epsilon of the last materialized value.
    /// Rescaling uses nearest-neighbour resampling: scale changes are
    /// interactive, so speed wins over quality here.
    pub fn set_scale(&mut self, scale: f32) {
        debug_assert!(scale > 0.0, "scale must be positive");
        if let Some(current) = self.current_scale {
            if (current - scale).abs() <= self.epsilon {
                return;
            }
        }

        let width = ((self.unscaled.width() as f32 * scale) as u32).max(1);
        let height = ((self.unscaled.height() as f32 * scale) as u32).max(1);
        self.scaled = imageops::resize(&self.unscaled, width, height, FilterType::Nearest);
        self.current_scale = Some(scale);
    }

    /// Blit the materialized page into `target` at `offset`
    pub fn paint(&self, target: &mut RgbImage, offset: Point) {
        imageops::replace(target, &self.scaled, i64::from(offset.x), i64::from(offset.y));
    }

    /// Extract a sub-image of the materialized page.
    ///
    /// `rect` is in current-scale pixel space. One pixel is added to the
    /// requested width and height before clamping: the drag end-point is
    /// inclusive, and without the compensation boundary selections come
    /// back clipped by one pixel.
    pub fn extract_region(&self, rect: Rect) -> Result<RgbImage> {
        crop_inclusive(&self.scaled, rect)
    }

    /// Like [`Self::extract_region`] but against the unscaled source
    /// pixels, for extraction at scales below 100% where the materialized
    /// image has already lost detail.
    pub fn extract_region_unscaled(&self, rect: Rect) -> Result<RgbImage> {
        crop_inclusive(&self.unscaled, rect)
    }

    /// The materialized image at the current scale
    #[must_use]
    pub fn image(&self) -> &RgbImage {
        &self.scaled
    }
}

fn crop_inclusive(image: &RgbImage, rect: Rect) -> Result<RgbImage> {
    let (width, height) = (image.width(), image.height());

    if rect.x < 0 || rect.y < 0 {
        return Err(ViewerError::Bounds);
    }
    let (x, y) = (rect.x as u32, rect.y as u32);
    if x >= width || y >= height {
        return Err(ViewerError::Bounds);
    }

    let w = (rect.width + 1).min(width - x);
    let h = (rect.height + 1).min(height - y);

    Ok(imageops::crop_imm(image, x, y, w, h).to_image())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 0])
        })
    }

    #[test]
    fn scaled_size_tracks_scale() {
        let mut page = PageSurface::new(gradient(200, 100));
        page.set_scale(0.5);
        assert_eq!(page.size(), Size::new(100, 50));
        assert_eq!(page.unscaled_size(), Size::new(200, 100));

        page.set_scale(2.0);
        assert_eq!(page.size(), Size::new(400, 200));
    }

    #[test]
    fn set_scale_within_epsilon_is_memoized() {
        let mut page = PageSurface::new(gradient(100, 100));
        page.set_scale(0.5);
        let before = page.image().as_raw().as_ptr();

        page.set_scale(0.5005);
        let after = page.image().as_raw().as_ptr();
        assert_eq!(before, after, "buffer must not be rebuilt within epsilon");

        page.set_scale(0.75);
        assert_eq!(page.size(), Size::new(75, 75));
    }

    #[test]
    fn extract_region_adds_inclusive_pixel() {
        let mut page = PageSurface::new(gradient(300, 300));
        page.set_scale(1.0);

        let sub = page.extract_region(Rect::new(40, 40, 200, 200)).unwrap();
        assert_eq!((sub.width(), sub.height()), (201, 201));
    }

    #[test]
    fn unscaled_extraction_ignores_current_scale() {
        let mut page = PageSurface::new(gradient(300, 300));
        page.set_scale(0.5);

        let sub = page.extract_region_unscaled(Rect::new(40, 40, 200, 200)).unwrap();
        assert_eq!((sub.width(), sub.height()), (201, 201));
        // Source-space pixels, not the downscaled ones.
        assert_eq!(sub.get_pixel(0, 0), &Rgb([40, 40, 0]));
    }

    #[test]
    fn extract_region_clamps_to_page() {
        let mut page = PageSurface::new(gradient(100, 100));
        page.set_scale(1.0);

        let sub = page.extract_region(Rect::new(90, 95, 50, 50)).unwrap();
        assert_eq!((sub.width(), sub.height()), (10, 5));
    }

    #[test]
    fn extract_region_outside_page_is_bounds_error() {
        let mut page = PageSurface::new(gradient(100, 100));
        page.set_scale(1.0);

        assert!(matches!(
            page.extract_region(Rect::new(100, 0, 5, 5)),
            Err(ViewerError::Bounds)
        ));
        assert!(matches!(
            page.extract_region(Rect::new(-3, 0, 5, 5)),
            Err(ViewerError::Bounds)
        ));
    }

    #[test]
    fn paint_copies_pixels_at_offset() {
        let mut page = PageSurface::new(RgbImage::from_pixel(4, 4, Rgb([9, 9, 9])));
        page.set_scale(1.0);

        let mut target = RgbImage::new(10, 10);
        page.paint(&mut target, Point::new(3, 2));
        assert_eq!(target.get_pixel(3, 2), &Rgb([9, 9, 9]));
        assert_eq!(target.get_pixel(6, 5), &Rgb([9, 9, 9]));
        assert_eq!(target.get_pixel(0, 0), &Rgb([0, 0, 0]));
    }
}
