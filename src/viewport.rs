//! Viewport layout and rubber-band selection state
//!
//! The page is centered inside the viewport when smaller than it, and
//! anchored at the viewport origin when larger (scrolling is the host's
//! concern). Selection is a press-drag-release rubber band clamped to the
//! page box; the drag end-point is inclusive.

use crate::geometry::{Point, Rect, Size};

/// Offset at which the page is painted inside the viewport: centered per
/// axis when it fits, pinned to the origin when it overflows.
#[must_use]
pub fn centering_offset(viewport: Size, page: Size) -> Point {
    let x = (viewport.width as i32 - page.width as i32) / 2;
    let y = (viewport.height as i32 - page.height as i32) / 2;
    Point::new(x.max(0), y.max(0))
}

/// The rectangle the page occupies in viewport coordinates
#[must_use]
pub fn page_box(viewport: Size, page: Size) -> Rect {
    let offset = centering_offset(viewport, page);
    Rect::new(offset.x, offset.y, page.width, page.height)
}

/// Outcome of releasing the mouse at the end of a drag
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragEnd {
    /// A non-empty selection survives the release
    Committed(Rect),
    /// The drag collapsed to a point; selection is cleared
    Cancelled,
}

/// Rubber-band selection over the page box.
///
/// All coordinates are viewport-space. [`Self::selection_in_page_space`]
/// translates the committed rectangle into page coordinates for
/// extraction.
#[derive(Debug, Default)]
pub struct ViewportState {
    selection: Rect,
    /// Anchor corner of an in-progress drag
    begin: Option<Point>,
}

impl ViewportState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current selection in viewport coordinates. Zero-sized means
    /// "no selection".
    #[must_use]
    pub fn selection(&self) -> Rect {
        self.selection
    }

    #[must_use]
    pub fn has_selection(&self) -> bool {
        !self.selection.is_empty()
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.begin.is_some()
    }

    /// Drop any selection and in-progress drag
    pub fn clear(&mut self) {
        self.selection = Rect::default();
        self.begin = None;
    }

    /// Start a drag at `p`. Presses outside the page box are ignored and
    /// return false; presses inside zero the selection at the press point.
    pub fn begin_drag(&mut self, p: Point, viewport: Size, page: Size) -> bool {
        if page_box(viewport, page).contains(p) {
            self.selection = Rect::new(p.x, p.y, 0, 0);
            self.begin = Some(p);
            true
        } else {
            self.begin = None;
            false
        }
    }

    /// Extend the drag to `p`, clamped to the page box. Returns the dirty
    /// region to repaint, covering both the old and new selection, or
    /// `None` when no drag is active.
    pub fn drag_to(&mut self, p: Point, viewport: Size, page: Size) -> Option<Rect> {
        let begin = self.begin?;
        let bounds = page_box(viewport, page);

        let end = Point::new(
            p.x.clamp(bounds.x, bounds.right() - 1),
            p.y.clamp(bounds.y, bounds.bottom() - 1),
        );

        let old = self.selection;
        self.selection = Rect::from_corners(begin, end);
        Some(old.union(self.selection).grown(1))
    }

    /// Finish the drag. A zero-sized selection (a click without movement)
    /// cancels; anything else commits and the selection stays visible.
    pub fn release(&mut self) -> DragEnd {
        if self.begin.take().is_some() && !self.selection.is_empty() {
            DragEnd::Committed(self.selection)
        } else {
            self.selection = Rect::default();
            DragEnd::Cancelled
        }
    }

    /// The selection translated from viewport space into page space
    #[must_use]
    pub fn selection_in_page_space(&self, viewport: Size, page: Size) -> Rect {
        let offset = centering_offset(viewport, page);
        self.selection.translated(-offset.x, -offset.y)
    }
}
