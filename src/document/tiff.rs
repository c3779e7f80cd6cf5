//! Multi-page TIFF documents, one page per IFD

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};

use crate::error::{Result, ViewerError};

use super::flatten_onto_white;

/// A TIFF file with one or more pages.
///
/// Pages are decoded on demand. The file is walked once at open time to
/// count IFDs and validate that every directory is reachable, then
/// re-opened per `get_page`, so only one page's pixels are resident at a
/// time.
pub struct TiffDocument {
    path: PathBuf,
    pages: u32,
}

impl TiffDocument {
    pub fn open(path: &Path) -> Result<Self> {
        let mut decoder = open_decoder(path)?;

        let mut pages = 1u32;
        while decoder.more_images() {
            decoder.next_image()?;
            pages += 1;
        }

        Ok(Self {
            path: path.to_path_buf(),
            pages,
        })
    }

    #[must_use]
    pub fn page_count(&self) -> u32 {
        self.pages
    }

    /// Decode page `number` (1-based, validated by the caller)
    pub fn get_page(&self, number: u32) -> Result<RgbImage> {
        let mut decoder = open_decoder(&self.path)?;
        for _ in 1..number {
            decoder.next_image()?;
        }
        decode_current(&mut decoder)
    }
}

fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>> {
    let file = File::open(path)?;
    Ok(Decoder::new(BufReader::new(file))?)
}

fn decode_current(decoder: &mut Decoder<BufReader<File>>) -> Result<RgbImage> {
    let (width, height) = decoder.dimensions()?;
    let color = decoder.colortype()?;
    let result = decoder.read_image()?;

    let bytes = match result {
        DecodingResult::U8(data) => data,
        // 16-bit samples are narrowed; the viewer only paints 8-bit RGB.
        DecodingResult::U16(data) => data.iter().map(|&v| (v >> 8) as u8).collect(),
        _ => {
            return Err(ViewerError::format("unsupported tiff sample format"));
        }
    };

    build_rgb(width, height, color, bytes)
}

fn build_rgb(width: u32, height: u32, color: ColorType, bytes: Vec<u8>) -> Result<RgbImage> {
    let pixels = (width as usize) * (height as usize);
    let image = match color {
        ColorType::Gray(8) | ColorType::Gray(16) => {
            if bytes.len() < pixels {
                return Err(ViewerError::format("tiff page shorter than its header"));
            }
            RgbImage::from_fn(width, height, |x, y| {
                let v = bytes[(y * width + x) as usize];
                Rgb([v, v, v])
            })
        }
        ColorType::RGB(8) | ColorType::RGB(16) => {
            image::RgbImage::from_raw(width, height, bytes)
                .ok_or_else(|| ViewerError::format("tiff page shorter than its header"))?
        }
        ColorType::RGBA(8) | ColorType::RGBA(16) => {
            let rgba = image::RgbaImage::from_raw(width, height, bytes)
                .ok_or_else(|| ViewerError::format("tiff page shorter than its header"))?;
            flatten_onto_white(&rgba)
        }
        other => {
            return Err(ViewerError::format(format!(
                "unsupported tiff color type: {other:?}"
            )));
        }
    };
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiff::encoder::{TiffEncoder, colortype};

    fn write_two_page_tiff(path: &Path) {
        let file = File::create(path).unwrap();
        let mut encoder = TiffEncoder::new(file).unwrap();

        let first: Vec<u8> = std::iter::repeat([200u8, 0, 0])
            .take(6 * 4)
            .flatten()
            .collect();
        encoder
            .write_image::<colortype::RGB8>(6, 4, &first)
            .unwrap();

        let second: Vec<u8> = std::iter::repeat([0u8, 0, 200])
            .take(3 * 2)
            .flatten()
            .collect();
        encoder
            .write_image::<colortype::RGB8>(3, 2, &second)
            .unwrap();
    }

    #[test]
    fn open_counts_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.tif");
        write_two_page_tiff(&path);

        let doc = TiffDocument::open(&path).unwrap();
        assert_eq!(doc.page_count(), 2);
    }

    #[test]
    fn pages_decode_independently() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.tif");
        write_two_page_tiff(&path);

        let doc = TiffDocument::open(&path).unwrap();
        let first = doc.get_page(1).unwrap();
        let second = doc.get_page(2).unwrap();

        assert_eq!((first.width(), first.height()), (6, 4));
        assert_eq!(first.get_pixel(0, 0), &Rgb([200, 0, 0]));
        assert_eq!((second.width(), second.height()), (3, 2));
        assert_eq!(second.get_pixel(0, 0), &Rgb([0, 0, 200]));

        // Random access must not depend on decode order.
        let first_again = doc.get_page(1).unwrap();
        assert_eq!(first_again.get_pixel(5, 3), &Rgb([200, 0, 0]));
    }

    #[test]
    fn grayscale_pages_expand_to_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.tif");
        let file = File::create(&path).unwrap();
        let mut encoder = TiffEncoder::new(file).unwrap();
        encoder
            .write_image::<colortype::Gray8>(2, 2, &[0, 85, 170, 255])
            .unwrap();

        let doc = TiffDocument::open(&path).unwrap();
        let page = doc.get_page(1).unwrap();
        assert_eq!(page.get_pixel(1, 0), &Rgb([85, 85, 85]));
        assert_eq!(page.get_pixel(1, 1), &Rgb([255, 255, 255]));
    }
}
