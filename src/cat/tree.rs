//! The CATS directory tree.
//!
//! On disk a directory is a big-endian `u16` entry count followed by the
//! entries. Every entry starts with a type byte, a one-byte name length and
//! the name. Files continue with `i32 offset, i32 size, u8 compression`;
//! directories continue with a nested directory.

use crate::buffer::{ByteCursor, Method};
use crate::error::{Error, Result};

const TYPE_FILE: u8 = 0;
const TYPE_DIRECTORY: u8 = 1;

/// Per-file compression tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    None,
}

impl Compression {
    pub fn tag(self) -> u8 {
        match self {
            Compression::Gzip => 0xFE,
            Compression::None => 0xFF,
        }
    }

    pub fn from_tag(tag: u8, name: &str) -> Result<Self> {
        match tag {
            0xFE => Ok(Compression::Gzip),
            0xFF => Ok(Compression::None),
            tag => Err(Error::InvalidCompression {
                name: name.to_string(),
                tag,
            }),
        }
    }

    pub fn method(self) -> Method {
        match self {
            Compression::Gzip => Method::Gzip,
            Compression::None => Method::Store,
        }
    }
}

/// Location of a file's bytes inside the data block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatFile {
    pub offset: i32,
    pub size: i32,
    pub compression: Compression,
}

impl CatFile {
    const ENCODED_LEN: usize = 4 + 4 + 1;

    fn parse(buffer: &mut ByteCursor, name: &str) -> Result<Self> {
        let offset = buffer.read::<i32>()?;
        let size = buffer.read::<i32>()?;
        let compression = Compression::from_tag(buffer.read::<u8>()?, name)?;
        Ok(Self {
            offset,
            size,
            compression,
        })
    }

    fn write(&self, buffer: &mut ByteCursor) -> Result<()> {
        buffer.write(self.offset)?;
        buffer.write(self.size)?;
        buffer.write(self.compression.tag())
    }

    /// Copy this file's stored (possibly compressed) bytes out of `data`.
    pub fn slice(&self, data: &mut ByteCursor) -> Result<ByteCursor> {
        let (offset, size) = match (usize::try_from(self.offset), usize::try_from(self.size)) {
            (Ok(offset), Ok(size)) => (offset, size),
            _ => {
                return Err(Error::OutOfBounds {
                    offset: self.offset as usize,
                    len: self.size as usize,
                    size: data.len(),
                });
            }
        };
        let old = data.seek(offset)?;
        let bytes = data.sub_buffer(size);
        data.seek(old)?;
        bytes
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatNode {
    File(CatFile),
    Directory(CatDirectory),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatEntry {
    pub name: String,
    pub node: CatNode,
}

impl CatEntry {
    fn parse(buffer: &mut ByteCursor, parent: Option<&str>, depth: usize) -> Result<Self> {
        let kind = buffer.read::<u8>()?;
        let name_len = buffer.read::<u8>()? as usize;
        let name = buffer.read_string(name_len)?;
        let path = join(parent, &name);
        let node = match kind {
            TYPE_FILE => CatNode::File(CatFile::parse(buffer, &path)?),
            TYPE_DIRECTORY => {
                CatNode::Directory(CatDirectory::parse_at(buffer, Some(&path), depth + 1)?)
            }
            tag => return Err(Error::InvalidEntryType { name: path, tag }),
        };
        Ok(Self { name, node })
    }

    fn encoded_len(&self) -> usize {
        2 + self.name.len()
            + match &self.node {
                CatNode::File(_) => CatFile::ENCODED_LEN,
                CatNode::Directory(directory) => directory.encoded_len(),
            }
    }

    fn write(&self, buffer: &mut ByteCursor, parent: Option<&str>) -> Result<()> {
        let path = join(parent, &self.name);
        let name_len = u8::try_from(self.name.len())
            .map_err(|_| Error::overflow("name", &path, self.name.len()))?;
        match &self.node {
            CatNode::File(file) => {
                buffer.write(TYPE_FILE)?;
                buffer.write(name_len)?;
                buffer.write_string(&self.name)?;
                file.write(buffer)
            }
            CatNode::Directory(directory) => {
                buffer.write(TYPE_DIRECTORY)?;
                buffer.write(name_len)?;
                buffer.write_string(&self.name)?;
                directory.write_at(buffer, Some(&path))
            }
        }
    }
}

/// An ordered list of entries. The archive root is an unnamed directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatDirectory {
    pub entries: Vec<CatEntry>,
}

impl CatDirectory {
    /// Deepest directory nesting accepted below the root.
    pub const MAX_DEPTH: usize = 255;

    pub fn parse(buffer: &mut ByteCursor) -> Result<Self> {
        Self::parse_at(buffer, None, 0)
    }

    fn parse_at(buffer: &mut ByteCursor, path: Option<&str>, depth: usize) -> Result<Self> {
        if depth > Self::MAX_DEPTH {
            return Err(Error::TreeTooDeep {
                path: path.unwrap_or_default().to_string(),
                limit: Self::MAX_DEPTH,
            });
        }
        let count = buffer.read::<u16>()?;
        let entries = (0..count)
            .map(|_| CatEntry::parse(buffer, path, depth))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    pub fn encoded_len(&self) -> usize {
        2 + self.entries.iter().map(CatEntry::encoded_len).sum::<usize>()
    }

    pub fn write(&self, buffer: &mut ByteCursor) -> Result<()> {
        self.write_at(buffer, None)
    }

    fn write_at(&self, buffer: &mut ByteCursor, path: Option<&str>) -> Result<()> {
        let count = u16::try_from(self.entries.len()).map_err(|_| {
            Error::overflow("entry count", path.unwrap_or_default(), self.entries.len())
        })?;
        buffer.write(count)?;
        for entry in &self.entries {
            entry.write(buffer, path)?;
        }
        Ok(())
    }

    /// Flatten the tree depth-first into `(path, file)` pairs. Only entries
    /// of the root go without a `/`, even when a directory's name is empty.
    pub fn fold(&self) -> Vec<(String, CatFile)> {
        let mut files = Vec::new();
        self.fold_into(None, &mut files);
        files
    }

    fn fold_into(&self, prefix: Option<&str>, files: &mut Vec<(String, CatFile)>) {
        for entry in &self.entries {
            let path = join(prefix, &entry.name);
            match &entry.node {
                CatNode::File(file) => files.push((path, *file)),
                CatNode::Directory(directory) => directory.fold_into(Some(&path), files),
            }
        }
    }

    /// Add `file` under the `/`-separated `path`, creating or reusing the
    /// intermediate directories.
    pub fn insert(&mut self, path: &str, file: CatFile) -> Result<()> {
        let parts: Vec<&str> = path.split('/').collect();
        let Some((name, folders)) = parts.split_last() else {
            return Ok(());
        };
        if folders.len() > Self::MAX_DEPTH {
            return Err(Error::TreeTooDeep {
                path: path.to_string(),
                limit: Self::MAX_DEPTH,
            });
        }
        let mut parent = self;
        for folder in folders {
            parent = parent.subdirectory(folder);
        }
        parent.entries.push(CatEntry {
            name: name.to_string(),
            node: CatNode::File(file),
        });
        Ok(())
    }

    /// The first child directory called `name`, created if missing.
    fn subdirectory(&mut self, name: &str) -> &mut CatDirectory {
        let slot = self
            .entries
            .iter()
            .position(|entry| entry.name == name && matches!(entry.node, CatNode::Directory(_)));
        let slot = slot.unwrap_or_else(|| {
            self.entries.push(CatEntry {
                name: name.to_string(),
                node: CatNode::Directory(CatDirectory::default()),
            });
            self.entries.len() - 1
        });
        match &mut self.entries[slot].node {
            CatNode::Directory(directory) => directory,
            CatNode::File(_) => unreachable!("slot always refers to a directory"),
        }
    }
}

fn join(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(parent) => format!("{parent}/{name}"),
        None => name.to_string(),
    }
}
