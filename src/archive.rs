//! Format-agnostic archive model.
//!
//! An [`Archive`] is an insertion-ordered map from `/`-separated relative
//! paths to file contents. The CATS and ZIP codecs both decode into one
//! and encode from one, which is what makes conversion a plain
//! [`Archive::transfer_to`] between two formats.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::buffer::ByteCursor;
use crate::error::Result;

/// A single file stored in an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub contents: Vec<u8>,
}

impl FileEntry {
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// Insertion-ordered collection of [`FileEntry`] values keyed by name.
///
/// Adding a file under an existing name replaces it in place. Renaming
/// removes the entry and adds it again under the new name, so it moves to
/// the end unless the new name is already taken.
#[derive(Debug, Clone, Default)]
pub struct Archive {
    entries: Vec<FileEntry>,
    index: HashMap<String, usize>,
}

impl Archive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn list_files(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn has_file(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get_file(&self, name: &str) -> Option<&[u8]> {
        self.index
            .get(name)
            .map(|&slot| self.entries[slot].contents.as_slice())
    }

    pub fn add_file(&mut self, file: FileEntry) {
        match self.index.get(&file.name) {
            Some(&slot) => self.entries[slot] = file,
            None => {
                self.index.insert(file.name.clone(), self.entries.len());
                self.entries.push(file);
            }
        }
    }

    pub fn remove_file(&mut self, name: &str) -> Option<FileEntry> {
        let slot = self.index.remove(name)?;
        let removed = self.entries.remove(slot);
        for position in self.index.values_mut() {
            if *position > slot {
                *position -= 1;
            }
        }
        Some(removed)
    }

    /// Move `old_name` to `new_name`. Does nothing if `old_name` is absent.
    pub fn rename_file(&mut self, old_name: &str, new_name: &str) {
        if let Some(mut entry) = self.remove_file(old_name) {
            entry.name = new_name.to_string();
            self.add_file(entry);
        }
    }

    /// Copy every entry into `target`, keeping this archive's order.
    pub fn transfer_to(&self, target: &mut Archive) {
        for entry in &self.entries {
            target.add_file(entry.clone());
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Archive {
    type Item = &'a FileEntry;
    type IntoIter = std::slice::Iter<'a, FileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<FileEntry> for Archive {
    fn from_iter<T: IntoIterator<Item = FileEntry>>(iter: T) -> Self {
        let mut archive = Archive::new();
        for entry in iter {
            archive.add_file(entry);
        }
        archive
    }
}

/// A concrete container format layered over an [`Archive`].
#[async_trait]
pub trait ArchiveFormat: Sized + Send + Sync {
    /// Human readable name of the pack type this format carries.
    const LABEL: &'static str;

    fn from_files(files: Archive) -> Self;

    fn files(&self) -> &Archive;

    fn files_mut(&mut self) -> &mut Archive;

    /// Decode a complete container.
    async fn parse(buffer: ByteCursor) -> Result<Self>;

    /// Encode the entries into a complete container.
    async fn compress(&self) -> Result<ByteCursor>;

    /// Build an instance of this format holding a copy of `source`'s entries.
    fn convert_from<F: ArchiveFormat>(source: &F) -> Self {
        let mut files = Archive::new();
        source.files().transfer_to(&mut files);
        Self::from_files(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Archive {
        [
            FileEntry::new("pack.mcmeta", b"{}".to_vec()),
            FileEntry::new("assets/minecraft/a.png", vec![1, 2, 3]),
            FileEntry::new("assets/minecraft/b.png", vec![4]),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn lookup_and_order() {
        let archive = sample();
        assert_eq!(archive.len(), 3);
        assert!(archive.has_file("pack.mcmeta"));
        assert!(!archive.has_file("assets"));
        assert_eq!(archive.get_file("assets/minecraft/b.png"), Some(&[4u8][..]));
        assert_eq!(archive.get_file("missing"), None);
        assert_eq!(
            archive.list_files(),
            ["pack.mcmeta", "assets/minecraft/a.png", "assets/minecraft/b.png"]
        );
    }

    #[test]
    fn add_replaces_in_place() {
        let mut archive = sample();
        archive.add_file(FileEntry::new("pack.mcmeta", b"new".to_vec()));
        assert_eq!(archive.len(), 3);
        assert_eq!(archive.list_files()[0], "pack.mcmeta");
        assert_eq!(archive.get_file("pack.mcmeta"), Some(&b"new"[..]));
    }

    #[test]
    fn rename_moves_to_end() {
        let mut archive = sample();
        archive.rename_file("pack.mcmeta", "meta.json");
        assert_eq!(
            archive.list_files(),
            ["assets/minecraft/a.png", "assets/minecraft/b.png", "meta.json"]
        );
        assert_eq!(archive.get_file("meta.json"), Some(&b"{}"[..]));
        assert!(!archive.has_file("pack.mcmeta"));

        archive.rename_file("nothing", "else");
        assert_eq!(archive.len(), 3);
    }

    #[test]
    fn remove_keeps_index_consistent() {
        let mut archive = sample();
        let removed = archive.remove_file("assets/minecraft/a.png").unwrap();
        assert_eq!(removed.contents, vec![1, 2, 3]);
        assert_eq!(archive.get_file("assets/minecraft/b.png"), Some(&[4u8][..]));
        assert!(archive.remove_file("assets/minecraft/a.png").is_none());
    }

    #[test]
    fn transfer_copies_without_touching_source() {
        let source = sample();
        let mut target = Archive::new();
        target.add_file(FileEntry::new("extra", Vec::new()));
        source.transfer_to(&mut target);
        assert_eq!(source.len(), 3);
        assert_eq!(target.len(), 4);
        assert_eq!(target.get_file("assets/minecraft/a.png"), Some(&[1u8, 2, 3][..]));
    }
}
