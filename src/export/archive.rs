//! Zip assembly for `.apkg` files.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::deck::{MediaRegistry, Result};

/// Archive entry holding the collection database.
pub const COLLECTION_ENTRY: &str = "collection.anki2";

/// Archive entry holding the media manifest.
pub const MEDIA_MANIFEST_ENTRY: &str = "media";

/// Pack the database bytes and media into an `.apkg` archive.
pub fn build_archive(collection: &[u8], media: &MediaRegistry) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(COLLECTION_ENTRY, options)?;
    zip.write_all(collection)?;

    let manifest = serde_json::to_vec(&media.manifest())?;
    zip.start_file(MEDIA_MANIFEST_ENTRY, options)?;
    zip.write_all(&manifest)?;

    for (index, item) in media.entries().iter().enumerate() {
        zip.start_file(index.to_string(), options)?;
        zip.write_all(&item.data)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::io::Read;

    use zip::ZipArchive;

    use super::*;

    #[test]
    fn test_archive_layout() {
        let mut media = MediaRegistry::new();
        media.push("a.mp3", b"sound".to_vec());
        media.push("b.png", b"image".to_vec());

        let bytes = build_archive(b"db", &media).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 4);

        let mut manifest = String::new();
        archive
            .by_name(MEDIA_MANIFEST_ENTRY)
            .unwrap()
            .read_to_string(&mut manifest)
            .unwrap();
        let manifest: BTreeMap<String, String> = serde_json::from_str(&manifest).unwrap();
        assert_eq!(manifest["0"], "a.mp3");
        assert_eq!(manifest["1"], "b.png");

        let mut data = Vec::new();
        archive.by_name("1").unwrap().read_to_end(&mut data).unwrap();
        assert_eq!(data, b"image");
    }

    #[test]
    fn test_archive_without_media_has_empty_manifest() {
        let bytes = build_archive(b"db", &MediaRegistry::new()).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut manifest = String::new();
        archive
            .by_name(MEDIA_MANIFEST_ENTRY)
            .unwrap()
            .read_to_string(&mut manifest)
            .unwrap();
        assert_eq!(manifest, "{}");
    }
}
