//! A Rust library for smart comic-page viewing.
//!
//! This crate segments a scanned comic page into its panels and guides a
//! reader through them one viewport-sized "row" at a time. The detected
//! layout can be persisted to an ACV archive (zip + `acv.xml`) so viewers can
//! skip detection.
//!
//! # Quick Start
//!
//! ```ignore
//! use comic_scroller::{SmartScroller, most_common_edge_color, DEFAULT_EDGE_WIDTH};
//!
//! let page = load_page_pixmap()?;
//! let bg = most_common_edge_color(&page, DEFAULT_EDGE_WIDTH)?;
//!
//! let mut scroller = SmartScroller::new();
//! scroller.setup_image(&page, bg)?;
//! scroller.setup_view(1280, 1024);
//!
//! // Walk the reading rows until the page is exhausted.
//! while let Some(bbox) = scroller.scroll(None, false)? {
//!     display.blit(bbox);
//! }
//! ```
//!
//! # Pipeline
//!
//! - **Background estimation**: dominant color of the page's edge strips.
//! - **Segmentation**: the page is binarized against the background and
//!   recursively cut on blank gutters into ordered panel rectangles.
//! - **Tiling**: panels larger than the viewport split into tiles.
//! - **Scrolling**: rows of consecutive frames that fit the viewport,
//!   forward and backward.

// Core modules
pub mod acv;
pub mod book;
pub mod image;
pub mod scroller;
pub mod segment;
pub mod utils;

// Public API
pub use scroller::{Frame, SmartScroller};
pub use segment::bgcolor::{DEFAULT_EDGE_WIDTH, most_common_edge_color};

// Image and geometry types
pub use self::image::{ImageMask, Pixel, Pixmap, Rect};

// Persistence
pub use acv::{AcvArchiveWriter, AcvManifest, Screen};
pub use book::{ComicBook, DirComicBook, ImageSource, open_comic};

// Error types
pub use utils::error::{ComicError, Result};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_single_panel_page() {
        let page = Pixmap::from_fn(200, 200, |x, y| {
            if (40..160).contains(&x) && (40..160).contains(&y) {
                Pixel::black()
            } else {
                Pixel::white()
            }
        });
        let bg = most_common_edge_color(&page, DEFAULT_EDGE_WIDTH).unwrap();
        assert_eq!(bg, Pixel::white());

        let mut scroller = SmartScroller::new();
        scroller.setup_image(&page, bg).unwrap();
        assert_eq!(scroller.frames().len(), 1);
        assert_eq!(scroller.frames()[0].rect, Rect::new(40, 40, 120, 120));
    }

    #[test]
    fn test_empty_image_is_invalid_input() {
        let page = Pixmap::from_pixel(0, 0, Pixel::white());
        let mut scroller = SmartScroller::new();
        assert!(matches!(
            scroller.setup_image(&page, Pixel::white()),
            Err(ComicError::InvalidInput(_))
        ));
    }
}
