//! End-to-end flows against real files on disk

use std::path::Path;
use std::sync::Arc;

use image::{Rgb, RgbImage, Rgba, RgbaImage};

use egoview::recognition::{self, RecognitionEngine, Recognized, RegionSnapshot};
use egoview::{DragEnd, Point, Settings, Size, ViewerError, ViewerSession};

const VIEWPORT: Size = Size::new(400, 300);

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 0])
    })
}

fn write_two_page_tiff(path: &Path) {
    use tiff::encoder::{TiffEncoder, colortype};

    let file = std::fs::File::create(path).unwrap();
    let mut encoder = TiffEncoder::new(file).unwrap();

    let first: Vec<u8> = gradient(600, 600).into_raw();
    encoder
        .write_image::<colortype::RGB8>(600, 600, &first)
        .unwrap();

    let second: Vec<u8> = RgbImage::from_pixel(200, 100, Rgb([0, 200, 0])).into_raw();
    encoder
        .write_image::<colortype::RGB8>(200, 100, &second)
        .unwrap();
}

#[test]
fn open_png_and_extract_a_region() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.png");
    gradient(800, 600).save(&path).unwrap();

    let mut session = ViewerSession::open(&path, VIEWPORT, Settings::default()).unwrap();
    assert_eq!(session.page_count(), 1);
    // Landscape, fit by width: 400/800.
    assert_eq!(session.current_scale(), 0.5);

    // Scaled page is 400x300, pinned at the viewport origin.
    assert!(session.press(Point::new(40, 40)));
    session.drag(Point::new(140, 140));
    assert!(matches!(session.release(), DragEnd::Committed(_)));

    let region = session.extract_selection().unwrap().unwrap();
    assert_eq!((region.width(), region.height()), (201, 201));
    assert_eq!(region.get_pixel(0, 0), &Rgb([80, 80, 0]));

    // The extraction replaced the view with a derived document at 100%.
    assert_eq!(session.current_scale(), 1.0);
    assert!(session.can_recover());

    assert!(session.recover_previous_document().unwrap());
    assert_eq!(session.current_scale(), 0.5);
    assert_eq!(session.surface().unscaled_size(), Size::new(800, 600));
}

#[test]
fn transparent_png_pages_are_opaque_white() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("alpha.png");
    RgbaImage::from_pixel(50, 50, Rgba([0, 0, 0, 0]))
        .save(&path)
        .unwrap();

    let session = ViewerSession::open(&path, Size::new(0, 0), Settings::default()).unwrap();
    assert_eq!(session.surface().image().get_pixel(25, 25), &Rgb([255, 255, 255]));
}

#[test]
fn tiff_paging_reapplies_scale_and_drops_selection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pages.tif");
    write_two_page_tiff(&path);

    let mut session = ViewerSession::open(&path, VIEWPORT, Settings::default()).unwrap();
    assert_eq!(session.page_count(), 2);
    assert_eq!(session.page_number(), 1);
    let scale = session.current_scale();

    session.press(Point::new(70, 20));
    session.drag(Point::new(120, 80));
    session.release();

    assert!(session.next_page().unwrap());
    assert_eq!(session.page_number(), 2);
    assert_eq!(session.current_scale(), scale);
    assert!(session.selection().is_empty());
    assert_eq!(session.surface().unscaled_size(), Size::new(200, 100));

    assert!(!session.next_page().unwrap());
    assert!(session.prev_page().unwrap());
    session.last_page().unwrap();
    assert_eq!(session.page_number(), 2);
    session.first_page().unwrap();
    assert_eq!(session.page_number(), 1);
}

#[test]
fn unknown_extension_fails_the_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "plain text").unwrap();

    let result = ViewerSession::open(&path, VIEWPORT, Settings::default());
    assert!(matches!(result, Err(ViewerError::Format { .. })));
}

struct EchoEngine;

impl RecognitionEngine for EchoEngine {
    fn recognize(&self, region: &RegionSnapshot, _keep_logs: bool) -> egoview::Result<Recognized> {
        Ok(Recognized {
            molecule: format!("{}x{}", region.width, region.height),
            logs: Vec::new(),
        })
    }
}

#[test]
fn extracted_region_flows_into_recognition() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.png");
    gradient(800, 600).save(&path).unwrap();

    let mut session = ViewerSession::open(&path, VIEWPORT, Settings::default()).unwrap();
    session.press(Point::new(40, 40));
    session.drag(Point::new(140, 140));
    session.release();

    let region = session.extract_selection().unwrap().unwrap();
    let snapshot = RegionSnapshot::from_image(&region);

    let job = recognition::recognize_in_background(Arc::new(EchoEngine), snapshot, false);
    let result = job.wait().unwrap();
    assert_eq!(result.molecule, "201x201");
}
