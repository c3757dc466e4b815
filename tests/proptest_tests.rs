//! Property tests: arbitrary file sets survive every encode/decode path.

use catpack::{Archive, ArchiveFormat, CatArchive, FileEntry, ZipArchive};
use proptest::collection::{btree_map, vec};
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .build()
        .unwrap()
}

/// Relative paths of one to three short segments. Segments never collide
/// with file names at another depth, so every path set folds cleanly.
fn path() -> impl Strategy<Value = String> {
    vec("[a-z0-9_]{1,8}", 1..=3).prop_map(|segments| {
        let (file, dirs) = segments.split_last().unwrap();
        dirs.iter()
            .map(|dir| format!("{dir}.d/"))
            .chain(std::iter::once(format!("{file}.f")))
            .collect()
    })
}

fn contents() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        vec(any::<u8>(), 0..512),
        (any::<u8>(), 0usize..4096).prop_map(|(byte, len)| vec![byte; len]),
    ]
}

fn archive() -> impl Strategy<Value = Archive> {
    btree_map(path(), contents(), 0..16).prop_map(|files| {
        files
            .into_iter()
            .map(|(name, contents)| FileEntry::new(name, contents))
            .collect()
    })
}

fn same_files(left: &Archive, right: &Archive) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .all(|entry| right.get_file(&entry.name) == Some(&entry.contents[..]))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn cats_round_trip(files in archive()) {
        let decoded = runtime().block_on(async {
            let bytes = CatArchive::from_files(files.clone()).compress().await.unwrap();
            CatArchive::parse(bytes).await.unwrap()
        });
        prop_assert!(same_files(&files, decoded.files()));
    }

    #[test]
    fn zip_round_trip(files in archive()) {
        let decoded = runtime().block_on(async {
            let bytes = ZipArchive::from_files(files.clone()).compress().await.unwrap();
            ZipArchive::parse(bytes).await.unwrap()
        });
        prop_assert_eq!(decoded.skipped_entries(), 0);
        prop_assert_eq!(decoded.files().list_files(), files.list_files());
        prop_assert!(same_files(&files, decoded.files()));
    }

    #[test]
    fn cross_format_round_trip(files in archive()) {
        let decoded = runtime().block_on(async {
            let cats = CatArchive::from_files(files.clone()).compress().await.unwrap();
            let from_cats = CatArchive::parse(cats).await.unwrap();
            let zip = ZipArchive::convert_from(&from_cats).compress().await.unwrap();
            ZipArchive::parse(zip).await.unwrap()
        });
        prop_assert!(same_files(&files, decoded.files()));
    }
}
