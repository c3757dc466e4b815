//! ZIP archive decoding and encoding.
//!
//! ## Architecture
//!
//! - [`structures`]: the ZIP records (EOCD, central and local headers)
//! - [`parser`]: locating the EOCD and reading the Central Directory
//! - [`extractor`]: loading and decompressing each entry's data
//! - [`writer`]: producing a new archive from a set of files
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! Decoding reads the EOCD first, then the Central Directory, and only then
//! the local headers it points at.
//!
//! ## Supported Features
//!
//! - STORED (no compression) method
//! - DEFLATE compression method
//! - Archives with bytes prepended before the first entry
//!
//! ## Limitations
//!
//! - No ZIP64
//! - No encryption support; encrypted entries are skipped
//! - No multi-disk archive support

mod extractor;
mod parser;
mod structures;
mod writer;

use async_trait::async_trait;
use log::debug;

use crate::archive::{Archive, ArchiveFormat};
use crate::buffer::ByteCursor;
use crate::error::Result;

pub use extractor::{Extracted, SkipReason, ZipExtractor};
pub use parser::{CentralDirectory, ZipParser};
pub use structures::*;
pub use writer::{EXTRACT_VERSION, write_archive};

/// A decoded ZIP archive.
#[derive(Debug, Clone, Default)]
pub struct ZipArchive {
    files: Archive,
    skipped_entries: usize,
}

impl ZipArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries that were listed in the Central Directory but could
    /// not be recovered when this archive was parsed.
    pub fn skipped_entries(&self) -> usize {
        self.skipped_entries
    }
}

#[async_trait]
impl ArchiveFormat for ZipArchive {
    const LABEL: &'static str = "Vanilla Resource Pack";

    fn from_files(files: Archive) -> Self {
        Self {
            files,
            skipped_entries: 0,
        }
    }

    fn files(&self) -> &Archive {
        &self.files
    }

    fn files_mut(&mut self) -> &mut Archive {
        &mut self.files
    }

    async fn parse(buffer: ByteCursor) -> Result<Self> {
        let mut parser = ZipParser::new(buffer);
        let directory = parser.read_central_directory()?;
        let Extracted { files, skipped } =
            ZipExtractor::new(parser.buffer_mut(), &directory)
                .extract_all()
                .await?;
        debug!("Recovered {} files, skipped {skipped}", files.len());
        Ok(Self {
            files,
            skipped_entries: skipped,
        })
    }

    async fn compress(&self) -> Result<ByteCursor> {
        write_archive(&self.files).await
    }
}
