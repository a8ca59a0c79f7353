//! Comic book sources: ordered page images plus an optional manifest.
//!
//! A source hands out raw page bytes and decoded RGB pixmaps; a zip-backed
//! source also surfaces a bundled `acv.xml` so viewers can reuse persisted
//! background colors and frames instead of re-detecting them.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{error, info};
use zip::ZipArchive;

use crate::acv::manifest::AcvManifest;
use crate::image::{Pixel, Pixmap, Rect};
use crate::utils::error::{ComicError, Result};
use crate::utils::sort::alphanumeric_sort;

const IMG_EXTENSIONS: [&str; 4] = ["jpeg", "jpg", "gif", "png"];

fn is_image_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMG_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// An ordered list of comic pages.
pub trait ImageSource {
    fn page_count(&self) -> usize;

    /// Display name of one page.
    fn filename(&self, page: usize) -> &str;

    /// The raw (encoded) bytes of one page.
    fn read_raw(&mut self, page: usize) -> Result<Vec<u8>>;

    /// One page decoded to RGB.
    fn read_rgb(&mut self, page: usize) -> Result<Pixmap> {
        let data = self.read_raw(page)?;
        let decoded = image::load_from_memory(&data)?.to_rgb8();
        let (width, height) = decoded.dimensions();
        Ok(Pixmap::from_raw(width, height, decoded.as_raw()))
    }

    /// Persisted background color for one page, if any.
    fn bgcolor(&self, _page: usize) -> Option<Pixel> {
        None
    }

    /// Persisted frames for one page scaled to the given page size.
    ///
    /// `None` means the page has no persisted entry at all and detection
    /// should run; a page recorded with zero frames comes back as an empty
    /// list and is taken literally.
    fn frames(&self, _page: usize, _page_width: u32, _page_height: u32) -> Option<Vec<Rect>> {
        None
    }
}

fn check_page(page: usize, len: usize) -> Result<()> {
    if page >= len {
        return Err(ComicError::IndexOutOfRange {
            index: page as i32,
            len,
        });
    }
    Ok(())
}

/// A zip (.cbz/.acv) comic archive.
pub struct ComicBook {
    archive: ZipArchive<File>,
    filenames: Vec<String>,
    manifest: Option<AcvManifest>,
}

impl ComicBook {
    /// Opens a zip archive, collecting its image entries in natural order.
    ///
    /// An `acv.xml` entry is parsed into the manifest; a malformed one is
    /// logged and ignored so the comic still opens and detection can run.
    pub fn open(path: &Path) -> Result<Self> {
        let mut archive = ZipArchive::new(File::open(path)?)?;
        let mut filenames = Vec::new();
        let mut acv_xml = None;
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let name = entry.name().to_string();
            if name == "acv.xml" {
                info!("parsing ACV manifest from {}", path.display());
                let mut xml = String::new();
                entry.read_to_string(&mut xml)?;
                acv_xml = Some(xml);
                continue;
            }
            if is_image_name(&name) {
                filenames.push(name);
            }
        }
        alphanumeric_sort(&mut filenames);
        let manifest = acv_xml.and_then(|xml| match AcvManifest::parse(&xml) {
            Ok(manifest) => Some(manifest),
            Err(err) => {
                error!("ignoring acv.xml of {}: {}", path.display(), err);
                None
            }
        });
        Ok(ComicBook {
            archive,
            filenames,
            manifest,
        })
    }

    pub fn manifest(&self) -> Option<&AcvManifest> {
        self.manifest.as_ref()
    }
}

impl ImageSource for ComicBook {
    fn page_count(&self) -> usize {
        self.filenames.len()
    }

    fn filename(&self, page: usize) -> &str {
        &self.filenames[page]
    }

    fn read_raw(&mut self, page: usize) -> Result<Vec<u8>> {
        check_page(page, self.filenames.len())?;
        let mut entry = self.archive.by_name(&self.filenames[page])?;
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        Ok(data)
    }

    fn bgcolor(&self, page: usize) -> Option<Pixel> {
        self.manifest.as_ref()?.bgcolor(page as u32)
    }

    fn frames(&self, page: usize, page_width: u32, page_height: u32) -> Option<Vec<Rect>> {
        let screen = self.manifest.as_ref()?.screens.get(&(page as u32))?;
        Some(screen.absolute_frames(page_width, page_height))
    }
}

/// A directory of loose page images.
pub struct DirComicBook {
    dir: PathBuf,
    filenames: Vec<String>,
}

impl DirComicBook {
    pub fn open(path: &Path) -> Result<Self> {
        let mut filenames = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if entry.file_type()?.is_file() && is_image_name(name) {
                    filenames.push(name.to_string());
                }
            }
        }
        alphanumeric_sort(&mut filenames);
        Ok(DirComicBook {
            dir: path.to_path_buf(),
            filenames,
        })
    }
}

impl ImageSource for DirComicBook {
    fn page_count(&self) -> usize {
        self.filenames.len()
    }

    fn filename(&self, page: usize) -> &str {
        &self.filenames[page]
    }

    fn read_raw(&mut self, page: usize) -> Result<Vec<u8>> {
        check_page(page, self.filenames.len())?;
        Ok(std::fs::read(self.dir.join(&self.filenames[page]))?)
    }
}

/// Opens `path` as a comic: a directory of images or a zip archive.
pub fn open_comic(path: &Path) -> Result<Box<dyn ImageSource>> {
    if path.is_dir() {
        Ok(Box::new(DirComicBook::open(path)?))
    } else if path.is_file() {
        Ok(Box::new(ComicBook::open(path)?))
    } else {
        Err(ComicError::UnsupportedFileType(
            path.display().to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_name_matching() {
        assert!(is_image_name("page01.JPG"));
        assert!(is_image_name("a/b/page01.png"));
        assert!(is_image_name("cover.jpeg"));
        assert!(is_image_name("anim.gif"));
        assert!(!is_image_name("acv.xml"));
        assert!(!is_image_name("notes.txt"));
        assert!(!is_image_name("noext"));
    }
}
