//! Hand-off to an external structure recognition engine
//!
//! Recognition is slow (seconds), so it always runs on its own thread.
//! The engine receives a grayscale snapshot of the extracted region and
//! reports back a molfile plus any intermediate images it produced, which
//! hosts may persist for debugging.

use std::sync::Arc;
use std::thread::JoinHandle;

use image::{GrayImage, RgbImage, imageops};

use crate::error::{Result, ViewerError};

/// Grayscale copy of an extracted region, decoupled from the session so
/// the viewer stays interactive while recognition runs.
#[derive(Clone)]
pub struct RegionSnapshot {
    pub width: u32,
    pub height: u32,
    pub luma: Vec<u8>,
}

impl RegionSnapshot {
    #[must_use]
    pub fn from_image(image: &RgbImage) -> Self {
        let gray = imageops::grayscale(image);
        Self {
            width: gray.width(),
            height: gray.height(),
            luma: gray.into_raw(),
        }
    }

    #[must_use]
    pub fn to_gray_image(&self) -> Option<GrayImage> {
        GrayImage::from_raw(self.width, self.height, self.luma.clone())
    }
}

/// An intermediate image the engine emitted while recognizing, as
/// encoded bytes the host may persist for debugging
pub struct LogArtifact {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Successful recognition result
pub struct Recognized {
    /// MDL molfile text for the recognized structure
    pub molecule: String,
    pub logs: Vec<LogArtifact>,
}

/// A structure recognition backend. Implementations wrap the actual
/// engine binding; the viewer only needs this seam.
pub trait RecognitionEngine: Send + Sync {
    /// Recognize a region. `keep_logs` asks the engine to retain its
    /// intermediate images in the result.
    fn recognize(&self, region: &RegionSnapshot, keep_logs: bool) -> Result<Recognized>;
}

/// A recognition run in flight on its own thread
pub struct RecognitionJob {
    handle: JoinHandle<Result<Recognized>>,
}

impl RecognitionJob {
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the run completes
    pub fn wait(self) -> Result<Recognized> {
        self.handle
            .join()
            .map_err(|_| ViewerError::Recognition("recognition worker panicked".into()))?
    }
}

/// Start recognizing `region` on a background thread
pub fn recognize_in_background(
    engine: Arc<dyn RecognitionEngine>,
    region: RegionSnapshot,
    keep_logs: bool,
) -> RecognitionJob {
    let handle = std::thread::spawn(move || {
        log::info!(
            "recognizing {}x{} region",
            region.width,
            region.height
        );
        engine.recognize(&region, keep_logs)
    });
    RecognitionJob { handle }
}
