//! Encode/decode round trips across both containers.

use catpack::{Archive, ArchiveFormat, ByteCursor, CatArchive, FileEntry, ZipArchive};

fn sample_pack() -> Archive {
    [
        FileEntry::new("pack.mcmeta", br#"{"pack":{"pack_format":15,"description":"test"}}"#.to_vec()),
        FileEntry::new("pack.png", (0..=255u8).cycle().take(2048).collect::<Vec<_>>()),
        FileEntry::new("assets/minecraft/lang/en_us.json", br#"{"a":"b"}"#.repeat(200)),
        FileEntry::new("assets/minecraft/textures/block/stone.png", vec![0x42; 1]),
        FileEntry::new("assets/minecraft/textures/item/stick.png", Vec::new()),
        FileEntry::new("assets/custom/ünïcödé.txt", "héllo".as_bytes().to_vec()),
    ]
    .into_iter()
    .collect()
}

fn assert_same_files(left: &Archive, right: &Archive) {
    assert_eq!(left.list_files(), right.list_files());
    for entry in left {
        assert_eq!(
            right.get_file(&entry.name),
            Some(&entry.contents[..]),
            "content of {}",
            entry.name
        );
    }
}

#[tokio::test]
async fn cats_round_trip() {
    let files = sample_pack();
    let bytes = CatArchive::from_files(files.clone()).compress().await.unwrap();
    assert_eq!(&bytes.as_bytes()[..4], b"CATS");

    let decoded = CatArchive::parse(bytes).await.unwrap();
    assert_same_files(&files, decoded.files());
}

#[tokio::test]
async fn zip_round_trip() {
    let files = sample_pack();
    let bytes = ZipArchive::from_files(files.clone()).compress().await.unwrap();
    assert_eq!(&bytes.as_bytes()[..4], b"PK\x03\x04");

    let decoded = ZipArchive::parse(bytes).await.unwrap();
    assert_eq!(decoded.skipped_entries(), 0);
    assert_same_files(&files, decoded.files());
}

#[tokio::test]
async fn cats_to_zip_to_cats() {
    let files = sample_pack();
    let cats = CatArchive::from_files(files.clone()).compress().await.unwrap();

    let from_cats = CatArchive::parse(cats).await.unwrap();
    let zip = ZipArchive::convert_from(&from_cats).compress().await.unwrap();
    let from_zip = ZipArchive::parse(zip).await.unwrap();
    let cats = CatArchive::convert_from(&from_zip).compress().await.unwrap();

    let decoded = CatArchive::parse(cats).await.unwrap();
    assert_same_files(&files, decoded.files());
}

#[tokio::test]
async fn zip_to_cats_to_zip() {
    let files = sample_pack();
    let zip = ZipArchive::from_files(files.clone()).compress().await.unwrap();

    let from_zip = ZipArchive::parse(zip).await.unwrap();
    let cats = CatArchive::convert_from(&from_zip).compress().await.unwrap();
    let from_cats = CatArchive::parse(cats).await.unwrap();
    let zip = ZipArchive::convert_from(&from_cats).compress().await.unwrap();

    let decoded = ZipArchive::parse(zip).await.unwrap();
    assert_same_files(&files, decoded.files());
}

#[tokio::test]
async fn encoding_is_deterministic() {
    let files = sample_pack();
    let first = CatArchive::from_files(files.clone()).compress().await.unwrap();
    let second = CatArchive::from_files(files.clone()).compress().await.unwrap();
    assert_eq!(first.as_bytes(), second.as_bytes());

    let first = ZipArchive::from_files(files.clone()).compress().await.unwrap();
    let second = ZipArchive::from_files(files).compress().await.unwrap();
    assert_eq!(first.as_bytes(), second.as_bytes());
}

#[tokio::test]
async fn cats_tree_groups_shared_directories() {
    let files = sample_pack();
    let mut bytes = CatArchive::from_files(files).compress().await.unwrap();
    bytes.seek(5).unwrap();
    let tree = catpack::cat::CatDirectory::parse(&mut bytes).unwrap();

    // pack.mcmeta, pack.png, assets/
    assert_eq!(tree.entries.len(), 3);
    let assets = tree.entries.iter().filter(|e| e.name == "assets").count();
    assert_eq!(assets, 1);
}

#[tokio::test]
async fn parse_accepts_buffers_built_from_bytes() {
    let bytes = ZipArchive::from_files(sample_pack()).compress().await.unwrap();
    let copied = ByteCursor::from(bytes.as_bytes());
    assert!(ZipArchive::parse(copied).await.is_ok());
}

#[tokio::test]
async fn cats_keeps_leading_slashes() {
    let files: Archive = [
        FileEntry::new("/root.txt", b"at the root".to_vec()),
        FileEntry::new("/", b"unnamed".to_vec()),
        FileEntry::new("plain.txt", b"plain".to_vec()),
    ]
    .into_iter()
    .collect();
    let bytes = CatArchive::from_files(files.clone()).compress().await.unwrap();
    let decoded = CatArchive::parse(bytes).await.unwrap();
    assert_same_files(&files, decoded.files());
}
