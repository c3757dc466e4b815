//! Converting named packs end to end.

use catpack::{
    Archive, ArchiveFormat, ByteCursor, CatArchive, Error, FileEntry, LocalSource, PackSource,
    ZipArchive, convert, inspect,
};

fn pack() -> Archive {
    [
        FileEntry::new("pack.mcmeta", br#"{"pack":{"pack_format":15}}"#.to_vec()),
        FileEntry::new("assets/minecraft/sounds.json", b"{}".repeat(300)),
    ]
    .into_iter()
    .collect()
}

async fn cats_bytes() -> Vec<u8> {
    CatArchive::from_files(pack()).compress().await.unwrap().into_inner()
}

async fn zip_bytes(files: Archive) -> Vec<u8> {
    ZipArchive::from_files(files).compress().await.unwrap().into_inner()
}

#[tokio::test]
async fn zip_becomes_cats() {
    let conversion = convert("Faithful 32x.zip", zip_bytes(pack()).await).await.unwrap();
    assert_eq!(conversion.output_file_name, "Faithful 32x.cats");
    assert_eq!(conversion.pack_type, "Vanilla Resource Pack");
    assert_eq!(conversion.converted_type, "Catharsis Resource Pack");
    assert_eq!(conversion.skipped_entries, 0);

    let decoded = CatArchive::parse(ByteCursor::new(conversion.output)).await.unwrap();
    assert_eq!(decoded.files().list_files(), pack().list_files());
}

#[tokio::test]
async fn cats_becomes_zip() {
    let conversion = convert("pack.cats", cats_bytes().await).await.unwrap();
    assert_eq!(conversion.output_file_name, "pack.zip");
    assert_eq!(conversion.pack_type, "Catharsis Resource Pack");
    assert_eq!(conversion.converted_type, "Vanilla Resource Pack");

    let decoded = ZipArchive::parse(ByteCursor::new(conversion.output)).await.unwrap();
    assert_eq!(
        decoded.files().get_file("pack.mcmeta"),
        pack().get_file("pack.mcmeta")
    );
}

#[tokio::test]
async fn wrapped_cats_is_unwrapped() {
    let mut outer = Archive::new();
    outer.add_file(FileEntry::new("readme.txt", b"inside".to_vec()));
    outer.add_file(FileEntry::new("pack.cats", cats_bytes().await));

    let conversion = convert("pack.cats.zip", zip_bytes(outer).await).await.unwrap();
    assert_eq!(conversion.output_file_name, "pack.zip");
    assert_eq!(conversion.pack_type, "Catharsis Resource Pack");

    let decoded = ZipArchive::parse(ByteCursor::new(conversion.output)).await.unwrap();
    assert!(!decoded.files().has_file("readme.txt"));
    assert_eq!(decoded.files().list_files(), pack().list_files());
}

#[tokio::test]
async fn wrapper_without_inner_pack_passes_through() {
    let input = zip_bytes(pack()).await;
    let conversion = convert("other.cats.zip", input.clone()).await.unwrap();
    assert_eq!(conversion.output, input);
    assert_eq!(conversion.output_file_name, "other.zip");
}

#[tokio::test]
async fn unknown_suffix_is_rejected() {
    let err = convert("pack.7z", Vec::new()).await.unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat(_)));
}

#[tokio::test]
async fn wrong_container_for_suffix_is_fatal() {
    let zip = zip_bytes(pack()).await;
    assert!(matches!(
        convert("mislabelled.cats", zip).await,
        Err(Error::WrongMagic { .. })
    ));
}

#[tokio::test]
async fn inspect_lists_inner_pack() {
    let mut outer = Archive::new();
    outer.add_file(FileEntry::new("pack.cats", cats_bytes().await));
    let listing = inspect("x.cats.zip", zip_bytes(outer).await).await.unwrap();
    assert_eq!(listing.pack_type, "Catharsis Resource Pack");
    assert_eq!(listing.files.list_files(), pack().list_files());

    let listing = inspect("x.zip", zip_bytes(pack()).await).await.unwrap();
    assert_eq!(listing.pack_type, "Vanilla Resource Pack");
    assert_eq!(listing.files.len(), 2);
}

#[tokio::test]
async fn converts_a_pack_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("disk pack.zip");
    tokio::fs::write(&path, zip_bytes(pack()).await).await.unwrap();

    let source = LocalSource::new(&path).unwrap();
    let bytes = source.load().await.unwrap();
    let conversion = convert(source.name(), bytes).await.unwrap();
    assert_eq!(conversion.output_file_name, "disk pack.cats");
    assert_eq!(&conversion.output[..4], b"CATS");
}
