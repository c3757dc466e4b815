//! ZIP archive encoder.
//!
//! Output layout, in order:
//! 1. For each entry: Local File Header followed by its data
//! 2. One Central Directory File Header per entry
//! 3. End of Central Directory record
//!
//! Every entry is deflated unless that does not make it smaller, in which
//! case it is stored.

use log::debug;

use crate::archive::{Archive, FileEntry};
use crate::buffer::{ByteCursor, Method};
use crate::error::{Error, Result};

use super::structures::*;

/// Version needed to extract: 2.0, deflate.
pub const EXTRACT_VERSION: u16 = 20;

// Entries carry fixed DOS timestamps rather than real ones.
const LOCAL_TIME: u16 = 25965;
const LOCAL_DATE: u16 = 30575;
const CENTRAL_TIME: u16 = 24899;
const CENTRAL_DATE: u16 = 25963;

/// An entry's data as it will be written.
struct PackedEntry {
    data: ByteCursor,
    method: CompressionMethod,
    crc32: u32,
    uncompressed_size: usize,
}

async fn pack_entry(original: ByteCursor) -> Result<PackedEntry> {
    let crc32 = original.crc32();
    let uncompressed_size = original.len();
    let deflated = original.compress(Method::Deflate).await?;
    let (data, method) = if original.is_empty() || deflated.len() >= original.len() {
        (original, CompressionMethod::Stored)
    } else {
        (deflated, CompressionMethod::Deflate)
    };
    Ok(PackedEntry {
        data,
        method,
        crc32,
        uncompressed_size,
    })
}

fn to_u32(field: &'static str, entry: &FileEntry, value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::overflow(field, &entry.name, value))
}

/// Encode `files` as a complete ZIP archive.
///
/// Entries are compressed concurrently; headers, offsets and the final
/// concatenation follow the archive's order so the output is reproducible.
pub async fn write_archive(files: &Archive) -> Result<ByteCursor> {
    let entry_count = u16::try_from(files.len())
        .map_err(|_| Error::overflow("entry count", "archive", files.len()))?;

    let jobs: Vec<_> = files
        .iter()
        .map(|entry| tokio::spawn(pack_entry(ByteCursor::from(entry.contents.as_slice()))))
        .collect();

    let flags = GeneralPurposeFlags::utf8();
    let mut parts = Vec::with_capacity(files.len() * 3 + 1);
    let mut central_headers = Vec::with_capacity(files.len());
    let mut offset = 0usize;

    for (entry, job) in files.iter().zip(jobs) {
        let packed = job.await??;
        let compressed_size = to_u32("compressed size", entry, packed.data.len())?;
        let uncompressed_size = to_u32("size", entry, packed.uncompressed_size)?;
        let lfh_offset = to_u32("offset", entry, offset)?;

        let local = LocalFileHeader {
            version_needed: EXTRACT_VERSION,
            flags,
            compression_method: packed.method,
            last_mod_time: LOCAL_TIME,
            last_mod_date: LOCAL_DATE,
            crc32: packed.crc32,
            compressed_size,
            uncompressed_size,
            file_name: entry.name.clone(),
            extra_field: Vec::new(),
        }
        .write()?;
        offset += local.len() + packed.data.len();
        parts.push(local);
        parts.push(packed.data);

        central_headers.push(
            CentralDirectoryHeader {
                version_made_by: EXTRACT_VERSION,
                version_needed: EXTRACT_VERSION,
                flags,
                compression_method: packed.method,
                last_mod_time: CENTRAL_TIME,
                last_mod_date: CENTRAL_DATE,
                crc32: packed.crc32,
                compressed_size,
                uncompressed_size,
                disk_number_start: 0,
                internal_attrs: 0,
                external_attrs: 0,
                lfh_offset,
                file_name: entry.name.clone(),
                extra_field: Vec::new(),
                comment: Vec::new(),
                looks_like_directory: false,
            }
            .write()?,
        );
    }

    let cd_start = offset;
    let cd_size: usize = central_headers.iter().map(ByteCursor::len).sum();
    parts.extend(central_headers);

    let eocd = EndOfCentralDirectory {
        disk_number: 0,
        disk_with_cd: 0,
        disk_entries: entry_count,
        total_entries: entry_count,
        cd_size: u32::try_from(cd_size)
            .map_err(|_| Error::overflow("central directory size", "archive", cd_size))?,
        cd_offset: u32::try_from(cd_start)
            .map_err(|_| Error::overflow("central directory offset", "archive", cd_start))?,
        comment: Vec::new(),
    };
    parts.push(eocd.write()?);
    debug!(
        "Wrote {entry_count} entries, Central Directory at {cd_start} ({cd_size} bytes)"
    );

    Ok(ByteCursor::concat(&parts))
}
