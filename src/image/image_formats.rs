//! In-memory representations for comic page images.
//!
//! This module provides lightweight `Pixel`, `Pixmap` and `ImageMask` types
//! for the segmentation pipeline. `Pixmap` holds the decoded RGB page;
//! `ImageMask` is the bilevel background/foreground mask derived from it.

use bytemuck::{Pod, Zeroable};

// --- Pixel Type Definitions ---

/// A single RGB pixel with 8-bit components.
/// Doubles as the color type for detected page backgrounds.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

unsafe impl Pod for Pixel {}
unsafe impl Zeroable for Pixel {}

impl Pixel {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Pixel { r, g, b }
    }

    pub fn black() -> Self {
        Pixel { r: 0, g: 0, b: 0 }
    }

    pub fn white() -> Self {
        Pixel {
            r: 255,
            g: 255,
            b: 255,
        }
    }

    /// Integer ITU-R 601 luminance, `(299·R + 587·G + 114·B) / 1000`.
    pub fn luminance(&self) -> u8 {
        ((299 * u32::from(self.r) + 587 * u32::from(self.g) + 114 * u32::from(self.b)) / 1000)
            as u8
    }
}

impl From<[u8; 3]> for Pixel {
    fn from(arr: [u8; 3]) -> Self {
        Pixel {
            r: arr[0],
            g: arr[1],
            b: arr[2],
        }
    }
}

impl From<Pixel> for [u8; 3] {
    fn from(p: Pixel) -> Self {
        [p.r, p.g, p.b]
    }
}

// --- Pixmap Type (Color Image Buffer) ---

/// A 2D buffer of color pixels in row-major order.
#[derive(Clone, Debug)]
pub struct Pixmap {
    width: u32,
    height: u32,
    data: Vec<Pixel>,
}

impl Pixmap {
    /// Creates a pixmap filled with a single pixel value.
    pub fn from_pixel(width: u32, height: u32, pixel: Pixel) -> Self {
        Pixmap {
            width,
            height,
            data: vec![pixel; (width * height) as usize],
        }
    }

    /// Creates a pixmap from a raw RGB byte buffer in row-major order.
    ///
    /// The buffer length must be exactly `width * height * 3`.
    pub fn from_raw(width: u32, height: u32, rgb: &[u8]) -> Self {
        assert_eq!(rgb.len(), (width * height * 3) as usize);
        Pixmap {
            width,
            height,
            data: bytemuck::cast_slice(rgb).to_vec(),
        }
    }

    /// Creates a pixmap by calling a function for each pixel.
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> Pixel,
    {
        let mut data = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Pixmap {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn get(&self, x: u32, y: u32) -> Pixel {
        self.data[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, pixel: Pixel) {
        self.data[(y * self.width + x) as usize] = pixel;
    }

    /// All pixels of one row.
    pub fn row(&self, y: u32) -> &[Pixel] {
        let start = (y * self.width) as usize;
        &self.data[start..start + self.width as usize]
    }

    pub fn pixels(&self) -> impl Iterator<Item = &Pixel> {
        self.data.iter()
    }
}

// --- ImageMask (Bilevel Background Mask) ---

/// Luminance half-window around the background color that still counts as
/// background.
const LUMINANCE_THRESHOLD: i32 = 16;

/// A bilevel `w × h` mask: 0 = background, 255 = foreground.
///
/// Created once per page from the decoded pixmap and the detected background
/// color; the panel finder scans it and it is dropped when segmentation ends.
#[derive(Clone, Debug)]
pub struct ImageMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ImageMask {
    /// Binarizes `image` against the background color `bg`.
    ///
    /// A pixel is background iff its luminance is within
    /// [`LUMINANCE_THRESHOLD`] of the background's luminance. Classification
    /// goes through a 256-entry lookup table, one luminance pass per pixel.
    pub fn binarize(image: &Pixmap, bg: Pixel) -> Self {
        let bg_luminance = i32::from(bg.luminance());
        let mut table = [0u8; 256];
        for (n, entry) in table.iter_mut().enumerate() {
            let n = n as i32;
            if n < bg_luminance - LUMINANCE_THRESHOLD || n > bg_luminance + LUMINANCE_THRESHOLD {
                *entry = 255;
            }
        }
        let data = image
            .pixels()
            .map(|p| table[p.luminance() as usize])
            .collect();
        ImageMask {
            width: image.width(),
            height: image.height(),
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The raw mask bytes in row-major order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luminance_weights() {
        assert_eq!(Pixel::white().luminance(), 255);
        assert_eq!(Pixel::black().luminance(), 0);
        assert_eq!(Pixel::new(255, 0, 0).luminance(), 76);
        assert_eq!(Pixel::new(0, 255, 0).luminance(), 149);
        assert_eq!(Pixel::new(0, 0, 255).luminance(), 29);
    }

    #[test]
    fn test_from_raw_reinterprets_rgb_bytes() {
        let raw = [1u8, 2, 3, 4, 5, 6];
        let pm = Pixmap::from_raw(2, 1, &raw);
        assert_eq!(pm.get(0, 0), Pixel::new(1, 2, 3));
        assert_eq!(pm.get(1, 0), Pixel::new(4, 5, 6));
    }

    #[test]
    fn test_binarize_threshold_window() {
        // Background luminance 255; anything at least 17 gray levels darker
        // is foreground.
        let mut pm = Pixmap::from_pixel(3, 1, Pixel::white());
        pm.set(1, 0, Pixel::new(239, 239, 239)); // within the window
        pm.set(2, 0, Pixel::new(238, 238, 238)); // outside
        let mask = ImageMask::binarize(&pm, Pixel::white());
        assert_eq!(mask.as_bytes(), &[0, 0, 255]);
    }

    #[test]
    fn test_binarize_dark_background() {
        let mut pm = Pixmap::from_pixel(2, 1, Pixel::black());
        pm.set(1, 0, Pixel::white());
        let mask = ImageMask::binarize(&pm, Pixel::black());
        assert_eq!(mask.as_bytes(), &[0, 255]);
    }
}
