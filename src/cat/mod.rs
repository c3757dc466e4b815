//! The CATS resource pack container.
//!
//! ## Layout
//!
//! All integers are big-endian.
//!
//! 1. `u32` magic `"CATS"` and `u8` version `1`
//! 2. The directory tree (see [`tree`])
//! 3. The data block: every file's stored bytes, back to back
//!
//! File offsets in the tree are relative to the start of the data block.
//! Each file is stored gzip-compressed unless that does not make it
//! smaller, in which case it is stored as is.

pub mod tree;

use async_trait::async_trait;
use log::{debug, warn};

use crate::archive::{Archive, ArchiveFormat, FileEntry};
use crate::buffer::{ByteCursor, Endianness, Method};
use crate::error::{Error, Result};

pub use tree::{CatDirectory, CatEntry, CatFile, CatNode, Compression};

/// A decoded CATS archive.
#[derive(Debug, Clone, Default)]
pub struct CatArchive {
    files: Archive,
}

impl CatArchive {
    pub const MAGIC: u32 = 0x43415453;
    pub const VERSION: u8 = 1;
    const HEADER_LEN: usize = 5;

    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArchiveFormat for CatArchive {
    const LABEL: &'static str = "Catharsis Resource Pack";

    fn from_files(files: Archive) -> Self {
        Self { files }
    }

    fn files(&self) -> &Archive {
        &self.files
    }

    fn files_mut(&mut self) -> &mut Archive {
        &mut self.files
    }

    async fn parse(mut buffer: ByteCursor) -> Result<Self> {
        buffer.set_endianness(Endianness::Big);

        let magic = buffer.read::<u32>()?;
        if magic != Self::MAGIC {
            return Err(Error::WrongMagic {
                expected: Self::MAGIC,
                found: magic,
            });
        }
        let version = buffer.read::<u8>()?;
        if version != Self::VERSION {
            return Err(Error::UnsupportedVersion(version));
        }

        let root = CatDirectory::parse(&mut buffer)?;
        let mut data = buffer.sub_buffer(buffer.remaining())?;
        let folded = root.fold();
        debug!(
            "CATS tree holds {} files, data block is {} bytes",
            folded.len(),
            data.len()
        );

        let mut jobs = Vec::with_capacity(folded.len());
        for (path, file) in folded {
            let stored = file.slice(&mut data)?;
            let method = file.compression.method();
            jobs.push((
                path,
                tokio::spawn(async move { stored.decompress(method).await }),
            ));
        }

        let mut files = Archive::new();
        for (path, job) in jobs {
            let contents = job.await??;
            if files.has_file(&path) {
                warn!("Duplicate path '{path}' in CATS tree, keeping the last one");
            }
            files.add_file(FileEntry::new(path, contents.into_inner()));
        }
        Ok(Self { files })
    }

    async fn compress(&self) -> Result<ByteCursor> {
        let jobs: Vec<_> = self
            .files
            .iter()
            .map(|entry| {
                let original = ByteCursor::from(entry.contents.as_slice());
                tokio::spawn(pack_entry(original))
            })
            .collect();

        let mut root = CatDirectory::default();
        let mut pieces = Vec::with_capacity(jobs.len() + 1);
        let mut data_len = 0usize;
        for (entry, job) in self.files.iter().zip(jobs) {
            let (stored, compression) = job.await??;
            let offset = i32::try_from(data_len)
                .map_err(|_| Error::overflow("offset", &entry.name, data_len))?;
            let size = i32::try_from(stored.len())
                .map_err(|_| Error::overflow("size", &entry.name, stored.len()))?;
            root.insert(
                &entry.name,
                CatFile {
                    offset,
                    size,
                    compression,
                },
            )?;
            data_len += stored.len();
            pieces.push(stored);
        }

        let mut header = ByteCursor::allocate_with(
            Self::HEADER_LEN + root.encoded_len(),
            Endianness::Big,
        );
        header.write(Self::MAGIC)?;
        header.write(Self::VERSION)?;
        root.write(&mut header)?;
        pieces.insert(0, header);

        Ok(ByteCursor::concat(&pieces))
    }
}

/// Gzip `original`, falling back to storing it when that does not shrink it.
async fn pack_entry(original: ByteCursor) -> Result<(ByteCursor, Compression)> {
    let packed = original.compress(Method::Gzip).await?;
    if !original.is_empty() && packed.len() < original.len() {
        Ok((packed, Compression::Gzip))
    } else {
        Ok((original, Compression::None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn header_fields() {
        let mut files = Archive::new();
        files.add_file(FileEntry::new("a", b"x".to_vec()));
        let bytes = CatArchive::from_files(files).compress().await.unwrap();
        assert_eq!(&bytes.as_bytes()[..5], b"CATS\x01");
    }

    #[tokio::test]
    async fn empty_archive() {
        let bytes = CatArchive::new().compress().await.unwrap();
        assert_eq!(bytes.as_bytes(), b"CATS\x01\x00\x00");
        let parsed = CatArchive::parse(bytes).await.unwrap();
        assert!(parsed.files().is_empty());
    }

    #[tokio::test]
    async fn rejects_wrong_magic_and_version() {
        let wrong_magic = ByteCursor::from(&b"CATZ\x01\x00\x00"[..]);
        assert!(matches!(
            CatArchive::parse(wrong_magic).await,
            Err(Error::WrongMagic { found: 0x4341545a, .. })
        ));

        let wrong_version = ByteCursor::from(&b"CATS\x02\x00\x00"[..]);
        assert!(matches!(
            CatArchive::parse(wrong_version).await,
            Err(Error::UnsupportedVersion(2))
        ));
    }

    #[tokio::test]
    async fn incompressible_files_are_stored() {
        // A single byte always grows under gzip.
        let mut files = Archive::new();
        files.add_file(FileEntry::new("tiny.txt", b"z".to_vec()));
        files.add_file(FileEntry::new("big.txt", b"abc".repeat(500)));
        let mut bytes = CatArchive::from_files(files).compress().await.unwrap();

        bytes.seek(CatArchive::HEADER_LEN).unwrap();
        let tree = CatDirectory::parse(&mut bytes).unwrap();
        let folded = tree.fold();
        assert_eq!(folded[0].0, "tiny.txt");
        assert_eq!(folded[0].1.compression, Compression::None);
        assert_eq!(folded[0].1.size, 1);
        assert_eq!(folded[1].1.compression, Compression::Gzip);
        assert_eq!(folded[1].1.offset, 1);
        assert!(folded[1].1.size < 1500);
    }

    #[tokio::test]
    async fn reads_offsets_into_data_block() {
        // Two files sharing the data block in reverse order.
        let mut root = CatDirectory::default();
        let stored = |offset, size| CatFile {
            offset,
            size,
            compression: Compression::None,
        };
        root.insert("dir/first", stored(3, 2)).unwrap();
        root.insert("second", stored(0, 3)).unwrap();
        let mut header = ByteCursor::allocate(5 + root.encoded_len());
        header.write(CatArchive::MAGIC).unwrap();
        header.write(CatArchive::VERSION).unwrap();
        root.write(&mut header).unwrap();
        let bytes = ByteCursor::concat(&[header, ByteCursor::from(&b"abcde"[..])]);

        let archive = CatArchive::parse(bytes).await.unwrap();
        assert_eq!(archive.files().list_files(), ["dir/first", "second"]);
        assert_eq!(archive.files().get_file("dir/first"), Some(&b"de"[..]));
        assert_eq!(archive.files().get_file("second"), Some(&b"abc"[..]));
    }

    #[tokio::test]
    async fn data_outside_block_is_fatal() {
        let mut root = CatDirectory::default();
        root.insert(
            "f",
            CatFile {
                offset: 2,
                size: 10,
                compression: Compression::None,
            },
        )
        .unwrap();
        let mut header = ByteCursor::allocate(5 + root.encoded_len());
        header.write(CatArchive::MAGIC).unwrap();
        header.write(CatArchive::VERSION).unwrap();
        root.write(&mut header).unwrap();
        let bytes = ByteCursor::concat(&[header, ByteCursor::from(&b"abc"[..])]);
        assert!(matches!(
            CatArchive::parse(bytes).await,
            Err(Error::OutOfBounds { .. })
        ));
    }
}
