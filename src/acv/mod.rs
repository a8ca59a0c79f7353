//! ACV persistence: the page-segmentation manifest and its zip container.
//!
//! An ACV archive is a zip holding `acv.xml` plus the page images with
//! junked paths. The manifest records, per page, an optional background
//! color and the detected frames in page-relative `[0, 1]` coordinates, so
//! viewers can skip detection entirely.

pub mod archive;
pub mod manifest;

pub use archive::AcvArchiveWriter;
pub use manifest::{AcvManifest, Screen};
