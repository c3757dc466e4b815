//! # catpack
//!
//! Converts resource packs between standard ZIP archives and the compact
//! CATS container, preserving every file path and byte of content.
//!
//! ## Features
//!
//! - Decode and encode CATS packs (nested directory tree, gzip or stored data)
//! - Decode and encode ZIP archives (STORED and DEFLATE), tolerating
//!   prepended stub bytes and appended junk
//! - Unreadable ZIP entries are skipped and counted instead of failing the pack
//! - Load packs from the local filesystem or HTTP/HTTPS URLs
//!
//! ## Example
//!
//! ```no_run
//! use catpack::{ArchiveFormat, ByteCursor, CatArchive, ZipArchive};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let bytes = tokio::fs::read("pack.zip").await?;
//!     let zip = ZipArchive::parse(ByteCursor::new(bytes)).await?;
//!     for name in zip.files().list_files() {
//!         println!("{name}");
//!     }
//!
//!     let cats = CatArchive::convert_from(&zip).compress().await?;
//!     tokio::fs::write("pack.cats", cats.as_bytes()).await?;
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod buffer;
pub mod cat;
pub mod cli;
pub mod convert;
pub mod error;
pub mod io;
pub mod zip;

pub use archive::{Archive, ArchiveFormat, FileEntry};
pub use buffer::{ByteCursor, Endianness, Method, Scalar};
pub use cat::CatArchive;
pub use cli::Cli;
pub use convert::{Conversion, Listing, PackFormat, convert, inspect};
pub use error::{Error, Result};
pub use io::{HttpSource, LocalSource, PackSource};
pub use zip::ZipArchive;
