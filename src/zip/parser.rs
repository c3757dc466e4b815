//! Low-level ZIP archive parser.
//!
//! This module locates the End of Central Directory record and reads the
//! Central Directory of an archive held in memory.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Scan backwards for the End of Central Directory (EOCD) signature
//! 2. Derive where the Central Directory really starts from the EOCD's
//!    own position, and how far that is from where the EOCD claims it is
//! 3. Read every Central Directory File Header up to the EOCD
//!
//! The distance found in step 2 is the archive's offset correction. It is
//! non-zero when bytes were prepended to the archive (a self-extractor stub,
//! for example) and is applied to every local header offset afterwards.

use std::collections::HashMap;

use log::debug;

use crate::buffer::{ByteCursor, Endianness};
use crate::error::{Error, Result};

use super::structures::*;

/// The parsed Central Directory of an archive.
#[derive(Debug, Clone)]
pub struct CentralDirectory {
    /// One record per distinct file name, in first-seen order.
    pub records: Vec<CentralDirectoryHeader>,
    /// Added to each record's `lfh_offset` to get its position in the buffer.
    pub offset_correction: i64,
}

impl CentralDirectory {
    /// Absolute position of `record`'s local header, if it can be in the buffer.
    pub fn local_header_offset(&self, record: &CentralDirectoryHeader, len: usize) -> Option<usize> {
        let offset = record.lfh_offset as i64 + self.offset_correction;
        usize::try_from(offset).ok().filter(|&offset| offset < len)
    }
}

/// Low-level ZIP parser over an in-memory archive.
///
/// Typically used through [`ZipArchive::parse`](super::ZipArchive) rather
/// than directly.
pub struct ZipParser {
    /// The whole archive, read little-endian
    buffer: ByteCursor,
}

impl ZipParser {
    pub fn new(mut buffer: ByteCursor) -> Self {
        buffer.set_endianness(Endianness::Little);
        Self { buffer }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Every offset from `len - 22` down to `0` holding the EOCD signature
    /// is a candidate. A candidate is rejected if its comment runs past the
    /// end of the buffer or its Central Directory would start before the
    /// buffer does. The first accepted candidate whose comment ends exactly
    /// at the end of the buffer wins; failing that, the accepted candidate
    /// nearest the end is used, which tolerates junk appended after the
    /// archive.
    ///
    /// # Returns
    ///
    /// A tuple of (EOCD record, offset of EOCD in the buffer).
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingEndOfCentralDirectory`] if no candidate is
    /// accepted, indicating the buffer is not a ZIP archive.
    pub fn find_eocd(&mut self) -> Result<(EndOfCentralDirectory, usize)> {
        let len = self.buffer.len();
        if len < EndOfCentralDirectory::SIZE {
            return Err(Error::MissingEndOfCentralDirectory);
        }

        let mut fallback = None;
        for offset in (0..=len - EndOfCentralDirectory::SIZE).rev() {
            self.buffer.seek(offset)?;
            if self.buffer.read::<u32>()? != EndOfCentralDirectory::SIGNATURE {
                continue;
            }
            let Ok(eocd) = EndOfCentralDirectory::parse(&mut self.buffer) else {
                continue;
            };
            if eocd.cd_size as usize > offset {
                continue;
            }
            if self.buffer.remaining() == 0 {
                return Ok((eocd, offset));
            }
            if fallback.is_none() {
                fallback = Some((eocd, offset));
            }
        }

        match fallback {
            Some((eocd, offset)) => {
                debug!(
                    "No EOCD reaches the end of the archive, using the one at {offset} ({} trailing bytes)",
                    len - offset - EndOfCentralDirectory::SIZE - eocd.comment.len()
                );
                Ok((eocd, offset))
            }
            None => Err(Error::MissingEndOfCentralDirectory),
        }
    }

    /// Read the Central Directory.
    ///
    /// Records are read back to back from the computed start of the
    /// Central Directory until the EOCD is reached. When two records share a
    /// file name the later one replaces the earlier only if the earlier one
    /// looks like a directory.
    ///
    /// # Errors
    ///
    /// Fails if there is no EOCD or a record is malformed; both make the
    /// whole archive unreadable.
    pub fn read_central_directory(&mut self) -> Result<CentralDirectory> {
        let (eocd, eocd_offset) = self.find_eocd()?;

        let cd_start = eocd_offset - eocd.cd_size as usize;
        let offset_correction = cd_start as i64 - eocd.cd_offset as i64;
        debug!(
            "EOCD at {eocd_offset}, Central Directory at {cd_start}, offset correction {offset_correction}"
        );

        self.buffer.seek(cd_start)?;
        let mut records: Vec<CentralDirectoryHeader> =
            Vec::with_capacity(eocd.total_entries as usize);
        let mut by_name: HashMap<String, usize> = HashMap::new();
        while self.buffer.position() < eocd_offset {
            let record = CentralDirectoryHeader::parse(&mut self.buffer)?;
            match by_name.get(&record.file_name) {
                Some(&slot) => {
                    if records[slot].looks_like_directory {
                        records[slot] = record;
                    }
                }
                None => {
                    by_name.insert(record.file_name.clone(), records.len());
                    records.push(record);
                }
            }
        }
        debug!("Central Directory lists {} distinct names", records.len());

        Ok(CentralDirectory {
            records,
            offset_correction,
        })
    }

    pub fn buffer_mut(&mut self) -> &mut ByteCursor {
        &mut self.buffer
    }
}
