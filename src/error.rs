//! Error types for archive decoding and encoding.
//!
//! Every variant here is fatal for the conversion it occurs in. Problems
//! that only affect a single ZIP entry (a local header outside the buffer,
//! an unsupported compression method) are not errors; the ZIP reader drops
//! the entry, logs it and counts it instead.

use thiserror::Error;

/// Errors produced by the archive codecs.
#[derive(Debug, Error)]
pub enum Error {
    /// A read or write would leave the bounds of a [`ByteCursor`](crate::ByteCursor).
    #[error("access of {len} bytes at offset {offset} is outside a buffer of {size} bytes")]
    OutOfBounds {
        offset: usize,
        len: usize,
        size: usize,
    },

    #[error("wrong magic: expected {expected:#010x}, found {found:#010x}")]
    WrongMagic { expected: u32, found: u32 },

    #[error("unsupported version {0}")]
    UnsupportedVersion(u8),

    #[error("invalid entry type {tag} for '{name}'")]
    InvalidEntryType { name: String, tag: u8 },

    #[error("invalid compression tag {tag:#04x} for '{name}'")]
    InvalidCompression { name: String, tag: u8 },

    /// Directories nest deeper than [`CatDirectory::MAX_DEPTH`](crate::cat::CatDirectory::MAX_DEPTH).
    #[error("directory tree nests deeper than {limit} levels at '{path}'")]
    TreeTooDeep { path: String, limit: usize },

    #[error("unable to locate the End of Central Directory record")]
    MissingEndOfCentralDirectory,

    #[error("invalid {record} signature at offset {offset}")]
    InvalidSignature { record: &'static str, offset: usize },

    #[error("{method} stream failed: {source}")]
    Codec {
        method: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A value does not fit the fixed-width field the format stores it in.
    #[error("{field} of '{name}' does not fit the archive format ({value})")]
    FieldOverflow {
        field: &'static str,
        name: String,
        value: usize,
    },

    #[error("unsupported file format: '{0}'")]
    UnsupportedFormat(String),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    pub(crate) fn overflow(field: &'static str, name: &str, value: usize) -> Self {
        Error::FieldOverflow {
            field,
            name: name.to_string(),
            value,
        }
    }

    /// Returns true if the error means the input is not a well-formed archive.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Error::OutOfBounds { .. }
                | Error::WrongMagic { .. }
                | Error::UnsupportedVersion(_)
                | Error::InvalidEntryType { .. }
                | Error::InvalidCompression { .. }
                | Error::TreeTooDeep { .. }
                | Error::MissingEndOfCentralDirectory
                | Error::InvalidSignature { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
