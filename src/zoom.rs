//! Discrete zoom ladder and auto-fit scale selection
//!
//! The viewer offers two zoom modes that users alternate between freely:
//! discrete stepping along a fixed ladder of preset factors, and continuous
//! "fit width / fit height" scales computed from the viewport. Stepping
//! from a free-form scale re-enters the ladder at the closest entry.

use crate::geometry::Size;

/// The canonical scale ladder, sorted ascending. Fixed at 12 entries.
pub const SCALE_LADDER: [f32; 12] = [
    0.125, 0.25, 0.333, 0.5, 0.666, 0.75, 1.0, 1.25, 1.5, 2.0, 3.0, 4.0,
];

/// Index of 1.0 within [`SCALE_LADDER`]
const ACTUAL_SIZE_INDEX: usize = 6;

/// Search direction for [`ZoomController::find_closest_scale`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScaleDirection {
    Up,
    Down,
}

/// Zoom state: the current scale plus the discrete ladder index, when the
/// scale came from a discrete pick rather than a fit operation.
#[derive(Debug)]
pub struct ZoomController {
    current: f32,
    /// `None` while the scale is free-form (fit width/height)
    selected: Option<usize>,
}

impl Default for ZoomController {
    fn default() -> Self {
        Self {
            current: 1.0,
            selected: None,
        }
    }
}

impl ZoomController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The active scale factor (1.0 = 100%)
    #[must_use]
    pub fn current_scale(&self) -> f32 {
        self.current
    }

    /// The discrete ladder index, if the current scale is a discrete pick
    #[must_use]
    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// Find the ladder entry closest to `value` in the given direction:
    /// smallest positive difference above it (`Up`), smallest-magnitude
    /// negative difference below it (`Down`). `None` when no candidate
    /// exists, i.e. `value` is already beyond the ladder's extreme.
    #[must_use]
    pub fn find_closest_scale(value: f32, direction: ScaleDirection) -> Option<usize> {
        let mut index = None;
        match direction {
            ScaleDirection::Up => {
                let mut best = f32::MAX;
                for (i, &scale) in SCALE_LADDER.iter().enumerate() {
                    let diff = scale - value;
                    if diff > 0.0 && diff < best {
                        best = diff;
                        index = Some(i);
                    }
                }
            }
            ScaleDirection::Down => {
                let mut best = f32::MIN;
                for (i, &scale) in SCALE_LADDER.iter().enumerate() {
                    let diff = scale - value;
                    if diff < 0.0 && diff > best {
                        best = diff;
                        index = Some(i);
                    }
                }
            }
        }
        index
    }

    /// Step to the next ladder entry. From a free-form scale, re-enter the
    /// ladder at the closest entry above. Returns the new scale, or `None`
    /// when already at the top (no wrap, no error).
    pub fn increase(&mut self) -> Option<f32> {
        let next = match self.selected {
            Some(i) if i + 1 < SCALE_LADDER.len() => i + 1,
            Some(_) => return None,
            None => Self::find_closest_scale(self.current, ScaleDirection::Up)?,
        };
        self.selected = Some(next);
        self.current = SCALE_LADDER[next];
        Some(self.current)
    }

    /// Step to the previous ladder entry; mirror of [`Self::increase`]
    pub fn decrease(&mut self) -> Option<f32> {
        let prev = match self.selected {
            Some(i) if i > 0 => i - 1,
            Some(_) => return None,
            None => Self::find_closest_scale(self.current, ScaleDirection::Down)?,
        };
        self.selected = Some(prev);
        self.current = SCALE_LADDER[prev];
        Some(self.current)
    }

    /// Scale such that the page exactly fills the available width, minus
    /// any width reserved for a vertical scrollbar.
    pub fn fit_width(&mut self, unscaled: Size, available_width: u32, reserved: u32) -> f32 {
        let usable = available_width.saturating_sub(reserved);
        self.set_free_scale(usable as f32 / unscaled.width as f32)
    }

    /// Scale such that the page exactly fills the available height
    pub fn fit_height(&mut self, unscaled: Size, available_height: u32, reserved: u32) -> f32 {
        let usable = available_height.saturating_sub(reserved);
        self.set_free_scale(usable as f32 / unscaled.height as f32)
    }

    /// 100%, selecting the ladder's 1.0 entry
    pub fn actual_size(&mut self) -> f32 {
        self.current = 1.0;
        self.selected = Some(ACTUAL_SIZE_INDEX);
        self.current
    }

    /// Install a free-form scale (fit results, restored session scales).
    /// Clears the discrete selection so the next step re-enters the ladder.
    pub fn set_free_scale(&mut self, scale: f32) -> f32 {
        debug_assert!(scale > 0.0, "scale must be positive");
        self.current = scale;
        self.selected = None;
        self.current
    }
}
