pub mod geom;
pub mod image_formats;

// Re-export the types the rest of the crate works in terms of
pub use geom::Rect;
pub use image_formats::{ImageMask, Pixel, Pixmap};
