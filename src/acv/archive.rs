//! Writing ACV zip archives.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use log::info;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::FileOptions;

use crate::acv::manifest::AcvManifest;
use crate::utils::error::Result;

/// Writes an ACV archive: the page images plus an `acv.xml` manifest,
/// deflate-compressed, with directory components junked from entry names.
pub struct AcvArchiveWriter {
    zip: ZipWriter<File>,
}

impl AcvArchiveWriter {
    pub fn create(path: &Path) -> Result<Self> {
        info!("creating ACV archive: {}", path.display());
        Ok(AcvArchiveWriter {
            zip: ZipWriter::new(File::create(path)?),
        })
    }

    fn options() -> FileOptions {
        FileOptions::default().compression_method(CompressionMethod::Deflated)
    }

    /// Adds one page image under the final component of `name`.
    pub fn add_page(&mut self, name: &str, data: &[u8]) -> Result<()> {
        let junked = Path::new(name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());
        self.zip.start_file(junked, Self::options())?;
        self.zip.write_all(data)?;
        Ok(())
    }

    /// Adds the serialized manifest as `acv.xml`.
    pub fn add_manifest(&mut self, manifest: &AcvManifest) -> Result<()> {
        self.zip.start_file("acv.xml", Self::options())?;
        self.zip.write_all(&manifest.to_xml()?)?;
        Ok(())
    }

    /// Finalizes the archive.
    pub fn finish(mut self) -> Result<()> {
        self.zip.finish()?;
        Ok(())
    }
}
