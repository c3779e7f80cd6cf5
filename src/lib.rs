//! egoview: a document viewing and region-selection engine
//!
//! Opens single images, multi-page TIFFs, and PDFs, presents them as
//! scaled pages centered in a host viewport, and lets the host carve out
//! rectangular regions for hand-off to an external structure recognition
//! engine. The host owns the actual windowing and input; this crate owns
//! the document, page, zoom, selection, and extraction semantics.

pub mod document;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod page;
pub mod recognition;
pub mod session;
pub mod settings;
pub mod viewport;
pub mod zoom;

pub use document::{DocumentKind, DocumentSource};
pub use error::{Result, ViewerError};
pub use geometry::{Point, Rect, Size};
pub use page::PageSurface;
pub use recognition::{
    LogArtifact, RecognitionEngine, RecognitionJob, Recognized, RegionSnapshot,
};
pub use session::ViewerSession;
pub use settings::Settings;
pub use viewport::{DragEnd, ViewportState};
pub use zoom::{SCALE_LADDER, ScaleDirection, ZoomController};
