//! PDF documents rasterized by a dedicated worker thread
//!
//! `mupdf::Document` is not `Sync`, so the document lives on its own
//! thread and pages cross back as decoded RGB images. Requests are
//! serialized: the caller blocks on the response channel with a bounded
//! timeout instead of polling.

#![cfg(feature = "pdf")]

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use flume::{Receiver, RecvTimeoutError, Sender};
use image::RgbImage;
use mupdf::{Colorspace, Document, Matrix, Pixmap};

use crate::error::{Result, ViewerError};

enum RasterRequest {
    /// Render a 0-based page at 100% scale
    Render { id: u64, page: i32 },
    Shutdown,
}

enum RasterResponse {
    Info { pages: u32 },
    Page { id: u64, image: RgbImage },
    Fault { id: u64, detail: String },
}

/// A PDF file, with pages rasterized on demand at scale 1.0.
///
/// Scaling to the viewer's current zoom happens downstream on the decoded
/// image, so zoom changes never hit the rasterizer.
///
/// Every request carries an id that the worker echoes back. After a
/// timeout the worker's late response is still queued, so the receive
/// loop discards anything whose id does not match the request in flight;
/// otherwise a later `get_page` would be handed the previous page's
/// pixels.
pub struct PdfDocument {
    requests: Sender<RasterRequest>,
    responses: Receiver<RasterResponse>,
    pages: u32,
    timeout: Duration,
    next_request: AtomicU64,
}

impl PdfDocument {
    /// Open `path` and wait for the worker to report the page count
    pub fn open(path: &Path, timeout: Duration) -> Result<Self> {
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();

        let worker_path = path.to_path_buf();
        std::thread::spawn(move || {
            raster_worker(&worker_path, request_rx, response_tx);
        });

        let pages = match response_rx.recv_timeout(timeout) {
            Ok(RasterResponse::Info { pages }) => pages,
            Ok(RasterResponse::Fault { detail, .. }) => return Err(ViewerError::format(detail)),
            Ok(RasterResponse::Page { .. }) => {
                return Err(ViewerError::format("rasterizer answered out of order"));
            }
            Err(_) => {
                return Err(ViewerError::format(format!(
                    "rasterizer did not open {} in time",
                    path.display()
                )));
            }
        };

        Ok(Self {
            requests: request_tx,
            responses: response_rx,
            pages,
            timeout,
            next_request: AtomicU64::new(1),
        })
    }

    #[must_use]
    pub fn page_count(&self) -> u32 {
        self.pages
    }

    /// Rasterize page `number` (1-based, validated by the caller)
    pub fn get_page(&self, number: u32) -> Result<RgbImage> {
        let id = self.next_request.fetch_add(1, Ordering::Relaxed);
        self.requests
            .send(RasterRequest::Render {
                id,
                page: (number - 1) as i32,
            })
            .map_err(|_| ViewerError::format("rasterizer worker is gone"))?;

        await_page(&self.responses, id, self.timeout)
    }
}

/// Wait for the response matching `id`, dropping responses left over
/// from requests that already timed out.
fn await_page(responses: &Receiver<RasterResponse>, id: u64, timeout: Duration) -> Result<RgbImage> {
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match responses.recv_timeout(remaining) {
            Ok(RasterResponse::Page { id: got, image }) if got == id => return Ok(image),
            Ok(RasterResponse::Fault { id: got, detail }) if got == id => {
                return Err(ViewerError::format(detail));
            }
            Ok(stale) => {
                match stale {
                    RasterResponse::Page { id: got, .. }
                    | RasterResponse::Fault { id: got, .. } => {
                        log::debug!("dropping stale rasterizer response {got}");
                    }
                    RasterResponse::Info { .. } => {}
                }
            }
            Err(RecvTimeoutError::Timeout) => return Err(ViewerError::RasterTimeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(ViewerError::format("rasterizer worker is gone"));
            }
        }
    }
}

impl Drop for PdfDocument {
    fn drop(&mut self) {
        let _ = self.requests.send(RasterRequest::Shutdown);
    }
}

fn raster_worker(
    path: &Path,
    requests: Receiver<RasterRequest>,
    responses: Sender<RasterResponse>,
) {
    let doc = match Document::open(path.to_string_lossy().as_ref()) {
        Ok(d) => d,
        Err(e) => {
            let _ = responses.send(RasterResponse::Fault {
                id: 0,
                detail: e.to_string(),
            });
            return;
        }
    };

    let pages = match doc.page_count() {
        Ok(n) if n > 0 => n as u32,
        Ok(_) => {
            let _ = responses.send(RasterResponse::Fault {
                id: 0,
                detail: "document has no pages".into(),
            });
            return;
        }
        Err(e) => {
            let _ = responses.send(RasterResponse::Fault {
                id: 0,
                detail: e.to_string(),
            });
            return;
        }
    };
    let _ = responses.send(RasterResponse::Info { pages });

    for request in requests {
        match request {
            RasterRequest::Render { id, page } => {
                let response = match render_page(&doc, page) {
                    Ok(image) => RasterResponse::Page { id, image },
                    Err(detail) => RasterResponse::Fault { id, detail },
                };
                if responses.send(response).is_err() {
                    break;
                }
            }
            RasterRequest::Shutdown => break,
        }
    }
}

fn render_page(doc: &Document, page: i32) -> std::result::Result<RgbImage, String> {
    let page = doc.load_page(page).map_err(|e| e.to_string())?;
    let pixmap = page
        .to_pixmap(
            &Matrix::new_scale(1.0, 1.0),
            &Colorspace::device_rgb(),
            false,
            false,
        )
        .map_err(|e| e.to_string())?;
    pixmap_to_rgb(&pixmap)
}

fn pixmap_to_rgb(pixmap: &Pixmap) -> std::result::Result<RgbImage, String> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(format!("unsupported pixmap format: {n} channels"));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    if samples.len() < stride.saturating_mul(height) || row_bytes > stride {
        return Err("pixmap buffer size mismatch".into());
    }

    let mut out = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        let row = &samples[y * stride..y * stride + row_bytes];
        if n == 3 {
            out.extend_from_slice(row);
        } else {
            for px in row.chunks_exact(n) {
                out.extend_from_slice(&px[..3]);
            }
        }
    }

    RgbImage::from_raw(width as u32, height as u32, out)
        .ok_or_else(|| "pixmap buffer size mismatch".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn late_response_from_a_timed_out_request_is_discarded() {
        let (tx, rx) = flume::unbounded();
        tx.send(RasterResponse::Page {
            id: 1,
            image: RgbImage::from_pixel(2, 2, Rgb([1, 1, 1])),
        })
        .unwrap();
        tx.send(RasterResponse::Page {
            id: 2,
            image: RgbImage::from_pixel(3, 3, Rgb([2, 2, 2])),
        })
        .unwrap();

        let page = await_page(&rx, 2, Duration::from_secs(1)).unwrap();
        assert_eq!((page.width(), page.height()), (3, 3));
        assert!(rx.is_empty(), "stale response must be consumed, not left queued");
    }

    #[test]
    fn fault_only_matches_its_own_request() {
        let (tx, rx) = flume::unbounded();
        tx.send(RasterResponse::Fault {
            id: 5,
            detail: "old failure".into(),
        })
        .unwrap();
        tx.send(RasterResponse::Page {
            id: 6,
            image: RgbImage::new(1, 1),
        })
        .unwrap();

        assert!(await_page(&rx, 6, Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn missing_response_is_a_raster_timeout() {
        let (tx, rx) = flume::unbounded();
        tx.send(RasterResponse::Page {
            id: 7,
            image: RgbImage::new(1, 1),
        })
        .unwrap();

        assert!(matches!(
            await_page(&rx, 8, Duration::from_millis(20)),
            Err(ViewerError::RasterTimeout(_))
        ));
    }
}
