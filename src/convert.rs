//! Converting a named pack between the CATS and ZIP containers.
//!
//! The input format is chosen from the file name alone:
//!
//! | Suffix      | Decoded as                   | Output      |
//! |-------------|------------------------------|-------------|
//! | `.cats.zip` | ZIP wrapping a `pack.cats`   | `.zip`      |
//! | `.cats`     | CATS                         | `.zip`      |
//! | `.zip`      | ZIP                          | `.cats`     |

use log::{debug, info};

use crate::archive::{Archive, ArchiveFormat};
use crate::buffer::ByteCursor;
use crate::cat::CatArchive;
use crate::error::{Error, Result};
use crate::zip::ZipArchive;

/// Name of the CATS pack inside a `.cats.zip` wrapper.
pub const INNER_PACK: &str = "pack.cats";

/// Input format, detected from a file name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackFormat {
    /// A ZIP that may hold a CATS pack named [`INNER_PACK`].
    WrappedCats,
    Cats,
    Zip,
}

impl PackFormat {
    /// Detect the format of `file_name`. Checked longest suffix first, so
    /// `x.cats.zip` is a wrapped pack rather than a plain ZIP.
    pub fn detect(file_name: &str) -> Result<Self> {
        if file_name.ends_with(".cats.zip") {
            Ok(PackFormat::WrappedCats)
        } else if file_name.ends_with(".cats") {
            Ok(PackFormat::Cats)
        } else if file_name.ends_with(".zip") {
            Ok(PackFormat::Zip)
        } else {
            Err(Error::UnsupportedFormat(file_name.to_string()))
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            PackFormat::WrappedCats => ".cats.zip",
            PackFormat::Cats => ".cats",
            PackFormat::Zip => ".zip",
        }
    }

    /// Suffix of the converted file.
    pub fn target_suffix(&self) -> &'static str {
        match self {
            PackFormat::WrappedCats | PackFormat::Cats => ".zip",
            PackFormat::Zip => ".cats",
        }
    }

    pub fn source_label(&self) -> &'static str {
        match self {
            PackFormat::WrappedCats | PackFormat::Cats => CatArchive::LABEL,
            PackFormat::Zip => ZipArchive::LABEL,
        }
    }

    pub fn target_label(&self) -> &'static str {
        match self {
            PackFormat::WrappedCats | PackFormat::Cats => ZipArchive::LABEL,
            PackFormat::Zip => CatArchive::LABEL,
        }
    }

    /// `file_name` with its suffix swapped for the converted one.
    pub fn output_name(&self, file_name: &str) -> String {
        let stem = file_name
            .strip_suffix(self.suffix())
            .unwrap_or(file_name);
        format!("{stem}{}", self.target_suffix())
    }
}

/// The outcome of converting one pack.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub output: Vec<u8>,
    pub output_file_name: String,
    /// Label of the input format.
    pub pack_type: &'static str,
    /// Label of the output format.
    pub converted_type: &'static str,
    /// ZIP entries that were listed but could not be recovered.
    pub skipped_entries: usize,
}

/// Convert the pack `bytes`, named `file_name`, to the other container.
///
/// A `.cats.zip` without a [`INNER_PACK`] entry is returned unchanged.
pub async fn convert(file_name: &str, bytes: Vec<u8>) -> Result<Conversion> {
    let format = PackFormat::detect(file_name)?;
    debug!("Converting '{file_name}' as {format:?}");

    let (output, skipped_entries) = match format {
        PackFormat::WrappedCats => {
            let outer = ZipArchive::parse(ByteCursor::new(bytes.clone())).await?;
            match outer.files().get_file(INNER_PACK) {
                Some(inner) => {
                    let pack = CatArchive::parse(ByteCursor::from(inner)).await?;
                    let output = ZipArchive::convert_from(&pack).compress().await?;
                    (output.into_inner(), outer.skipped_entries())
                }
                None => {
                    info!("'{file_name}' holds no {INNER_PACK}, passing it through");
                    (bytes, outer.skipped_entries())
                }
            }
        }
        PackFormat::Cats => {
            let pack = CatArchive::parse(ByteCursor::new(bytes)).await?;
            let output = ZipArchive::convert_from(&pack).compress().await?;
            (output.into_inner(), 0)
        }
        PackFormat::Zip => {
            let pack = ZipArchive::parse(ByteCursor::new(bytes)).await?;
            let output = CatArchive::convert_from(&pack).compress().await?;
            (output.into_inner(), pack.skipped_entries())
        }
    };

    Ok(Conversion {
        output,
        output_file_name: format.output_name(file_name),
        pack_type: format.source_label(),
        converted_type: format.target_label(),
        skipped_entries,
    })
}

/// The decoded contents of a pack, for listing.
#[derive(Debug, Clone)]
pub struct Listing {
    pub pack_type: &'static str,
    pub files: Archive,
    pub skipped_entries: usize,
}

/// Decode `bytes` without converting them. A `.cats.zip` lists its inner
/// pack when it has one.
pub async fn inspect(file_name: &str, bytes: Vec<u8>) -> Result<Listing> {
    let format = PackFormat::detect(file_name)?;
    let listing = match format {
        PackFormat::Cats => Listing {
            pack_type: CatArchive::LABEL,
            files: CatArchive::parse(ByteCursor::new(bytes)).await?.files().clone(),
            skipped_entries: 0,
        },
        PackFormat::Zip | PackFormat::WrappedCats => {
            let outer = ZipArchive::parse(ByteCursor::new(bytes)).await?;
            let inner = match format {
                PackFormat::WrappedCats => outer.files().get_file(INNER_PACK),
                _ => None,
            };
            match inner {
                Some(inner) => Listing {
                    pack_type: CatArchive::LABEL,
                    files: CatArchive::parse(ByteCursor::from(inner)).await?.files().clone(),
                    skipped_entries: outer.skipped_entries(),
                },
                None => Listing {
                    pack_type: ZipArchive::LABEL,
                    skipped_entries: outer.skipped_entries(),
                    files: outer.files().clone(),
                },
            }
        }
    };
    Ok(listing)
}
