use std::fmt;

use log::{debug, warn};

use crate::archive::{Archive, FileEntry};
use crate::buffer::{ByteCursor, Method};
use crate::error::Result;

use super::parser::CentralDirectory;
use super::structures::{CentralDirectoryHeader, LocalFileHeader};

/// Why a single entry was left out of the decoded archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The corrected local header offset is past the end of the archive.
    HeaderOutOfBounds(i64),
    /// No valid local file header at the recorded offset.
    InvalidLocalHeader(usize),
    /// The entry's data runs past the end of the archive.
    DataOutOfBounds { offset: usize, size: u32 },
    Encrypted,
    UnsupportedMethod(u16),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::HeaderOutOfBounds(offset) => {
                write!(f, "local header offset {offset} is outside the archive")
            }
            SkipReason::InvalidLocalHeader(offset) => {
                write!(f, "no valid local header at offset {offset}")
            }
            SkipReason::DataOutOfBounds { offset, size } => {
                write!(f, "{size} bytes of data at offset {offset} run past the archive")
            }
            SkipReason::Encrypted => f.write_str("entry is encrypted"),
            SkipReason::UnsupportedMethod(method) => {
                write!(f, "unsupported compression method {method}")
            }
        }
    }
}

/// Entries recovered from an archive, plus how many were dropped.
#[derive(Debug, Default)]
pub struct Extracted {
    pub files: Archive,
    pub skipped: usize,
}

/// Loads entry data for the records of a [`CentralDirectory`].
///
/// An entry that cannot be located or decoded is logged, counted in
/// [`Extracted::skipped`] and left out. Only a corrupt compressed stream
/// fails the whole extraction.
pub struct ZipExtractor<'a> {
    buffer: &'a mut ByteCursor,
    directory: &'a CentralDirectory,
}

impl<'a> ZipExtractor<'a> {
    pub fn new(buffer: &'a mut ByteCursor, directory: &'a CentralDirectory) -> Self {
        Self { buffer, directory }
    }

    /// Copy out the stored bytes of one entry and the method to decode them
    /// with. Returns `Ok(None)` for empty directory placeholders.
    pub fn stored_data(
        &mut self,
        record: &CentralDirectoryHeader,
    ) -> std::result::Result<Option<(ByteCursor, Method)>, SkipReason> {
        if record.compressed_size == 0 && record.file_name.ends_with('/') {
            return Ok(None);
        }

        if record.flags.encrypted() {
            return Err(SkipReason::Encrypted);
        }
        let Some(method) = record.compression_method.method() else {
            return Err(SkipReason::UnsupportedMethod(
                record.compression_method.as_u16(),
            ));
        };

        let Some(lfh_offset) = self.directory.local_header_offset(record, self.buffer.len())
        else {
            return Err(SkipReason::HeaderOutOfBounds(
                record.lfh_offset as i64 + self.directory.offset_correction,
            ));
        };
        let data = self.read_data(record, lfh_offset)?;
        Ok(Some((data, method)))
    }

    fn read_data(
        &mut self,
        record: &CentralDirectoryHeader,
        lfh_offset: usize,
    ) -> std::result::Result<ByteCursor, SkipReason> {
        self.buffer
            .seek(lfh_offset)
            .map_err(|_| SkipReason::InvalidLocalHeader(lfh_offset))?;
        LocalFileHeader::parse(&mut *self.buffer)
            .map_err(|_| SkipReason::InvalidLocalHeader(lfh_offset))?;
        let data_offset = self.buffer.position();
        self.buffer
            .sub_buffer(record.compressed_size as usize)
            .map_err(|_| SkipReason::DataOutOfBounds {
                offset: data_offset,
                size: record.compressed_size,
            })
    }

    /// Load and decompress every entry in Central Directory order.
    ///
    /// Decompression runs concurrently; entries are added to the archive in
    /// order once all of them are done.
    pub async fn extract_all(mut self) -> Result<Extracted> {
        let directory = self.directory;
        let mut jobs = Vec::with_capacity(directory.records.len());
        let mut skipped = 0;
        for record in &directory.records {
            match self.stored_data(record) {
                Ok(Some((stored, method))) => {
                    let job = tokio::spawn(async move { stored.decompress(method).await });
                    jobs.push((record.file_name.clone(), job));
                }
                Ok(None) => debug!("Skipping directory entry '{}'", record.file_name),
                Err(reason) => {
                    warn!("Skipping '{}': {reason}", record.file_name);
                    skipped += 1;
                }
            }
        }

        let mut files = Archive::new();
        for (name, job) in jobs {
            let contents = job.await??;
            files.add_file(FileEntry::new(name, contents.into_inner()));
        }
        Ok(Extracted { files, skipped })
    }
}
