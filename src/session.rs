//! Viewer session: one open document, its page, zoom, and selection
//!
//! `ViewerSession` is the engine's top-level type. It owns the document
//! backend, the current page surface, the zoom controller, and the
//! rubber-band selection, and enforces the ordering rules between them:
//! page changes re-apply the current scale, scale changes drop the
//! selection, and extraction promotes the selected region to a derived
//! one-page document that can later be backed out of.

use std::path::Path;

use image::RgbImage;

use crate::document::DocumentSource;
use crate::error::{Result, ViewerError};
use crate::geometry::{Point, Rect, Size};
use crate::page::PageSurface;
use crate::settings::Settings;
use crate::viewport::{self, DragEnd, ViewportState};
use crate::zoom::ZoomController;

/// A document the session can fall back to after extraction
struct SavedDocument {
    source: DocumentSource,
    page: u32,
}

pub struct ViewerSession {
    settings: Settings,
    source: DocumentSource,
    /// 1-based
    page: u32,
    surface: PageSurface,
    zoom: ZoomController,
    viewport: Size,
    /// Width the host reserves for a vertical scrollbar in fit math
    scrollbar_reserve: u32,
    state: ViewportState,
    /// Scale to restore when recovering the saved document
    saved_scale: Option<f32>,
    /// Present while viewing a derived document
    previous: Option<SavedDocument>,
}

impl ViewerSession {
    /// Open a document file and show its first page, auto-fitted to the
    /// viewport: portrait pages fit by height, landscape by width. A zero
    /// viewport skips fitting and shows the page at 100%.
    pub fn open(path: &Path, viewport: Size, settings: Settings) -> Result<Self> {
        let source = DocumentSource::open(path, &settings)?;
        log::info!(
            "opened {} ({} pages)",
            path.display(),
            source.page_count()
        );
        Self::from_source(source, viewport, settings)
    }

    pub fn from_source(
        source: DocumentSource,
        viewport: Size,
        settings: Settings,
    ) -> Result<Self> {
        let first = source.get_page(1)?;
        let mut surface = PageSurface::with_epsilon(first, settings.scale_epsilon);
        let mut zoom = ZoomController::new();

        let scale = auto_fit(&mut zoom, surface.unscaled_size(), viewport, 0);
        surface.set_scale(scale);

        Ok(Self {
            settings,
            source,
            page: 1,
            surface,
            zoom,
            viewport,
            scrollbar_reserve: 0,
            state: ViewportState::new(),
            saved_scale: None,
            previous: None,
        })
    }

    /// Replace the open document with `path`. Page, zoom, selection, and
    /// any recovery state are reset; a failed open leaves the session
    /// unchanged.
    pub fn open_document(&mut self, path: &Path) -> Result<()> {
        let source = DocumentSource::open(path, &self.settings)?;
        let first = source.get_page(1)?;
        log::info!("opened {} ({} pages)", path.display(), source.page_count());

        self.source = source;
        self.surface = PageSurface::with_epsilon(first, self.settings.scale_epsilon);
        self.page = 1;
        self.previous = None;
        self.saved_scale = None;
        self.state.clear();

        let scale = auto_fit(
            &mut self.zoom,
            self.surface.unscaled_size(),
            self.viewport,
            self.scrollbar_reserve,
        );
        self.surface.set_scale(scale);
        Ok(())
    }

    #[must_use]
    pub fn page_number(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub fn page_count(&self) -> u32 {
        self.source.page_count()
    }

    #[must_use]
    pub fn current_scale(&self) -> f32 {
        self.zoom.current_scale()
    }

    #[must_use]
    pub fn surface(&self) -> &PageSurface {
        &self.surface
    }

    #[must_use]
    pub fn selection(&self) -> Rect {
        self.state.selection()
    }

    #[must_use]
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    pub fn set_scrollbar_reserve(&mut self, reserve: u32) {
        self.scrollbar_reserve = reserve;
    }

    /// Offset at which the current page is painted inside the viewport
    #[must_use]
    pub fn page_offset(&self) -> Point {
        viewport::centering_offset(self.viewport, self.surface.size())
    }

    /// Blit the current page into `target` at its centering offset
    pub fn paint(&self, target: &mut RgbImage) {
        self.surface.paint(target, self.page_offset());
    }

    // ---- page navigation ----

    /// Jump to page `number` (1-based). Re-applies the current scale and
    /// drops any selection. Jumping to the current page or to a page
    /// outside the document is a no-op.
    pub fn go_to_page(&mut self, number: u32) -> Result<()> {
        if number == self.page {
            return Ok(());
        }
        let count = self.page_count();
        if number == 0 || number > count {
            log::warn!("page {number} out of range (1-{count}), ignoring");
            return Ok(());
        }

        let pixels = self.source.get_page(number)?;
        self.surface = PageSurface::with_epsilon(pixels, self.settings.scale_epsilon);
        self.surface.set_scale(self.zoom.current_scale());
        self.page = number;
        self.state.clear();
        log::debug!("showing page {number}/{count}");
        Ok(())
    }

    /// Advance one page; false when already on the last page
    pub fn next_page(&mut self) -> Result<bool> {
        if self.page >= self.page_count() {
            return Ok(false);
        }
        self.go_to_page(self.page + 1)?;
        Ok(true)
    }

    /// Go back one page; false when already on the first page
    pub fn prev_page(&mut self) -> Result<bool> {
        if self.page <= 1 {
            return Ok(false);
        }
        self.go_to_page(self.page - 1)?;
        Ok(true)
    }

    pub fn first_page(&mut self) -> Result<()> {
        self.go_to_page(1)
    }

    pub fn last_page(&mut self) -> Result<()> {
        self.go_to_page(self.page_count())
    }

    // ---- zoom ----

    /// Step up the zoom ladder; false at the top
    pub fn zoom_in(&mut self) -> bool {
        match self.zoom.increase() {
            Some(scale) => {
                self.apply_scale(scale);
                true
            }
            None => false,
        }
    }

    /// Step down the zoom ladder; false at the bottom
    pub fn zoom_out(&mut self) -> bool {
        match self.zoom.decrease() {
            Some(scale) => {
                self.apply_scale(scale);
                true
            }
            None => false,
        }
    }

    pub fn actual_size(&mut self) {
        let scale = self.zoom.actual_size();
        self.apply_scale(scale);
    }

    pub fn fit_width(&mut self) {
        let scale = self.zoom.fit_width(
            self.surface.unscaled_size(),
            self.viewport.width,
            self.scrollbar_reserve,
        );
        self.apply_scale(scale);
    }

    pub fn fit_height(&mut self) {
        let scale = self.zoom.fit_height(
            self.surface.unscaled_size(),
            self.viewport.height,
            self.scrollbar_reserve,
        );
        self.apply_scale(scale);
    }

    /// Selection coordinates go stale across a rescale, so it is dropped
    fn apply_scale(&mut self, scale: f32) {
        self.surface.set_scale(scale);
        self.state.clear();
    }

    // ---- selection ----

    /// Start a rubber-band drag at a viewport point
    pub fn press(&mut self, p: Point) -> bool {
        self.state.begin_drag(p, self.viewport, self.surface.size())
    }

    /// Extend the drag; returns the viewport region to repaint
    pub fn drag(&mut self, p: Point) -> Option<Rect> {
        self.state.drag_to(p, self.viewport, self.surface.size())
    }

    pub fn release(&mut self) -> DragEnd {
        self.state.release()
    }

    pub fn clear_selection(&mut self) {
        self.state.clear();
    }

    // ---- extraction and recovery ----

    /// Extract the committed selection and promote it to a derived
    /// one-page document shown at 100%. Without a selection the whole
    /// page is taken at 100%.
    ///
    /// At scales below 100% the selection is mapped back into source
    /// space and extracted from the unscaled page, so the result keeps
    /// full detail. Returns `None` when the selection turned out to lie
    /// outside the page (the selection is cleared and a warning logged).
    pub fn extract_selection(&mut self) -> Result<Option<RgbImage>> {
        if !self.state.has_selection() {
            let size = self.surface.unscaled_size();
            let region = self
                .surface
                .extract_region_unscaled(Rect::new(0, 0, size.width - 1, size.height - 1))?;
            self.promote_to_derived(region.clone())?;
            return Ok(Some(region));
        }

        let rect = self
            .state
            .selection_in_page_space(self.viewport, self.surface.size());
        let scale = self.zoom.current_scale();

        let extracted = if scale < 1.0 {
            self.surface.extract_region_unscaled(rect.div_scale(scale))
        } else {
            self.surface.extract_region(rect)
        };

        let region = match extracted {
            Ok(image) => image,
            Err(ViewerError::Bounds) => {
                log::warn!("selection {rect:?} fell outside the page, dropping it");
                self.state.clear();
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        self.promote_to_derived(region.clone())?;
        Ok(Some(region))
    }

    /// Replace the view with the extracted region. The original document
    /// is saved on the first derivation only, so deriving from a derived
    /// document still recovers back to the source document.
    fn promote_to_derived(&mut self, region: RgbImage) -> Result<()> {
        self.saved_scale = Some(self.zoom.current_scale());

        let derived = DocumentSource::from_image(region);
        let old = std::mem::replace(&mut self.source, derived);
        if self.previous.is_none() {
            self.previous = Some(SavedDocument {
                source: old,
                page: self.page,
            });
        }

        let pixels = self.source.get_page(1)?;
        self.surface = PageSurface::with_epsilon(pixels, self.settings.scale_epsilon);
        self.page = 1;
        let scale = self.zoom.actual_size();
        self.surface.set_scale(scale);
        self.state.clear();
        Ok(())
    }

    /// True while viewing a derived document
    #[must_use]
    pub fn can_recover(&self) -> bool {
        self.previous.is_some()
    }

    /// Return to the document that was showing before extraction,
    /// restoring its page and scale. No-op when not viewing a derived
    /// document; false in that case.
    pub fn recover_previous_document(&mut self) -> Result<bool> {
        let Some(saved) = self.previous.take() else {
            return Ok(false);
        };

        self.source = saved.source;
        let pixels = self.source.get_page(saved.page)?;
        self.surface = PageSurface::with_epsilon(pixels, self.settings.scale_epsilon);
        self.page = saved.page;

        let scale = self
            .saved_scale
            .take()
            .map_or(1.0, |s| self.zoom.set_free_scale(s));
        self.surface.set_scale(scale);
        self.state.clear();
        Ok(true)
    }
}

/// Portrait pages (strictly taller than wide) fit by height, everything
/// else by width. Zero viewport or zero page dimensions mean fitting is
/// meaningless; show at 100%.
fn auto_fit(zoom: &mut ZoomController, page: Size, viewport: Size, reserved: u32) -> f32 {
    if viewport.is_empty() || page.is_empty() {
        return zoom.set_free_scale(1.0);
    }
    if page.height > page.width {
        zoom.fit_height(page, viewport.height, reserved)
    } else {
        zoom.fit_width(page, viewport.width, reserved)
    }
}
