//! Crate-wide error type.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComicError {
    #[error("invalid input image: {0}")]
    InvalidInput(String),

    #[error("frame number out of range: {index}/{len}")]
    IndexOutOfRange { index: i32, len: usize },

    #[error("malformed manifest: {0}")]
    MalformedManifest(String),

    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("image decode error: {0}")]
    Decode(#[from] image::ImageError),
}

/// A specialized `Result` type for comic operations.
pub type Result<T> = std::result::Result<T, ComicError>;
