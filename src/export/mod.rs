//! `.apkg` export
//!
//! A save snapshots the in-memory collection to a temporary SQLite file and
//! zips it together with the media manifest and payloads.

pub mod archive;
pub mod snapshot;

use std::fs;
use std::path::Path;

use crate::deck::{Deck, Result};

pub use archive::{build_archive, COLLECTION_ENTRY, MEDIA_MANIFEST_ENTRY};
pub use snapshot::snapshot_database;

impl Deck {
    /// Serialize the deck into `.apkg` archive bytes.
    pub fn save(&self) -> Result<Vec<u8>> {
        let collection = snapshot_database(&self.conn)?;
        let bytes = build_archive(&collection, &self.media)?;
        log::info!(
            "Exported deck '{}' ({} media files, {} bytes)",
            self.name,
            self.media.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    /// Write the `.apkg` archive to `path`.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.save()?;
        fs::write(path.as_ref(), bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::io::{Cursor, Read};

    use rusqlite::Connection;
    use tempfile::{tempdir, NamedTempFile};
    use zip::ZipArchive;

    use super::*;

    fn read_entry(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> Vec<u8> {
        let mut data = Vec::new();
        archive.by_name(name).unwrap().read_to_end(&mut data).unwrap();
        data
    }

    #[test]
    fn test_save_round_trip() {
        let mut deck = Deck::new("Round Trip").unwrap();
        deck.add_media("test.mp3", b"fake audio".to_vec());
        deck.add_card("Hello", "Hola [sound:test.mp3]").unwrap();

        let bytes = deck.save().unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 3);

        let manifest: BTreeMap<String, String> =
            serde_json::from_slice(&read_entry(&mut archive, MEDIA_MANIFEST_ENTRY)).unwrap();
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest["0"], "test.mp3");
        assert_eq!(read_entry(&mut archive, "0"), b"fake audio");

        let db = NamedTempFile::new().unwrap();
        fs::write(db.path(), read_entry(&mut archive, COLLECTION_ENTRY)).unwrap();
        let conn = Connection::open(db.path()).unwrap();

        let flds: String = conn
            .query_row("SELECT flds FROM notes", [], |row| row.get(0))
            .unwrap();
        assert_eq!(flds, "Hello\u{1f}Hola [sound:test.mp3]");
        let did: i64 = conn
            .query_row("SELECT did FROM cards", [], |row| row.get(0))
            .unwrap();
        assert_eq!(did, deck.top_deck_id());

        let decks: String = conn
            .query_row("SELECT decks FROM col", [], |row| row.get(0))
            .unwrap();
        assert!(decks.contains("\"Default\""));
        assert!(decks.contains("\"Round Trip\""));
    }

    #[test]
    fn test_save_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deck.apkg");

        let mut deck = Deck::new("File Deck").unwrap();
        deck.add_card("Q", "A").unwrap();
        deck.save_to_file(&path).unwrap();

        let bytes = fs::read(&path).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);
    }

    #[test]
    fn test_save_empty_deck() {
        let deck = Deck::new("Empty").unwrap();
        let bytes = deck.save().unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();

        let db = NamedTempFile::new().unwrap();
        fs::write(db.path(), read_entry(&mut archive, COLLECTION_ENTRY)).unwrap();
        let conn = Connection::open(db.path()).unwrap();
        let notes: i64 = conn
            .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))
            .unwrap();
        assert_eq!(notes, 0);
        let col: i64 = conn
            .query_row("SELECT COUNT(*) FROM col", [], |row| row.get(0))
            .unwrap();
        assert_eq!(col, 1);
    }
}
