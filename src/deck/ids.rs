//! Identifier assignment and content hashing.
//!
//! Ids are epoch milliseconds. A fresh id checks its column for anything at
//! or above the timestamp and takes one past the maximum, so ids stay unique
//! and increasing even when many rows are created within one millisecond.

use rusqlite::{params, Connection, OptionalExtension};
use sha1::{Digest, Sha1};

use super::models::FIELD_SEPARATOR;

/// Integer columns that are assigned with [`next_id`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdColumn {
    NoteId,
    NoteModel,
    NoteModified,
    CardId,
    CardDeck,
    CardModified,
}

impl IdColumn {
    fn table(self) -> &'static str {
        match self {
            Self::NoteId | Self::NoteModel | Self::NoteModified => "notes",
            Self::CardId | Self::CardDeck | Self::CardModified => "cards",
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::NoteId | Self::CardId => "id",
            Self::NoteModel => "mid",
            Self::CardDeck => "did",
            Self::NoteModified | Self::CardModified => "mod",
        }
    }
}

/// Smallest id `>= ts` that is greater than every stored value `>= ts`.
pub fn next_id(conn: &Connection, column: IdColumn, ts: i64) -> rusqlite::Result<i64> {
    let sql = format!(
        "SELECT {col} FROM {table} WHERE {col} >= ?1 ORDER BY {col} DESC LIMIT 1",
        col = column.column(),
        table = column.table(),
    );
    let max: Option<i64> = conn
        .query_row(&sql, params![ts], |row| row.get(0))
        .optional()?;
    Ok(max.map_or(ts, |id| id + 1))
}

/// Id of the note with this guid, or a fresh one.
pub fn note_id_for_guid(conn: &Connection, guid: &str, ts: i64) -> rusqlite::Result<i64> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM notes WHERE guid = ?1 ORDER BY id DESC LIMIT 1",
            params![guid],
            |row| row.get(0),
        )
        .optional()?;
    match existing {
        Some(id) => Ok(id),
        None => next_id(conn, IdColumn::NoteId, ts),
    }
}

/// Id of the card that belongs to `note_id`, or a fresh one.
pub fn card_id_for_note(conn: &Connection, note_id: i64, ts: i64) -> rusqlite::Result<i64> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM cards WHERE nid = ?1 ORDER BY id DESC LIMIT 1",
            params![note_id],
            |row| row.get(0),
        )
        .optional()?;
    match existing {
        Some(id) => Ok(id),
        None => next_id(conn, IdColumn::CardId, ts),
    }
}

/// Content identity of a note: hex SHA-1 of deck id, front and back.
pub fn note_guid(deck_id: i64, front: &str, back: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(deck_id.to_string().as_bytes());
    hasher.update(front.as_bytes());
    hasher.update(back.as_bytes());
    hex::encode(hasher.finalize())
}

/// First 32 bits of the SHA-1 of `text`.
pub fn checksum(text: &str) -> i64 {
    let digest = Sha1::digest(text.as_bytes());
    i64::from(u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]))
}

/// Join front and back into the `flds` column value.
pub fn join_fields(front: &str, back: &str) -> String {
    let mut fields = String::with_capacity(front.len() + back.len() + 1);
    fields.push_str(front);
    fields.push(FIELD_SEPARATOR);
    fields.push_str(back);
    fields
}

/// Tag column value: `" a b_c "`, or empty when there are no tags.
///
/// Inner whitespace runs become one `_`; blank tags are dropped.
pub fn format_tags<S: AsRef<str>>(tags: &[S]) -> String {
    let words: Vec<String> = tags
        .iter()
        .map(|tag| tag.as_ref().split_whitespace().collect::<Vec<_>>().join("_"))
        .filter(|word| !word.is_empty())
        .collect();
    if words.is_empty() {
        return String::new();
    }
    format!(" {} ", words.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notes_and_cards() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE notes (id integer primary key, guid text, mid integer, mod integer);
             CREATE TABLE cards (id integer primary key, nid integer, did integer, mod integer);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_next_id_empty_table_uses_timestamp() {
        let conn = notes_and_cards();
        assert_eq!(next_id(&conn, IdColumn::NoteId, 1_000).unwrap(), 1_000);
    }

    #[test]
    fn test_next_id_skips_past_existing() {
        let conn = notes_and_cards();
        conn.execute_batch(
            "INSERT INTO notes VALUES (1000, 'a', 1, 1);
             INSERT INTO notes VALUES (1001, 'b', 1, 1);
             INSERT INTO notes VALUES (10, 'c', 1, 1);",
        )
        .unwrap();
        assert_eq!(next_id(&conn, IdColumn::NoteId, 1_000).unwrap(), 1_002);
        assert_eq!(next_id(&conn, IdColumn::NoteId, 5_000).unwrap(), 5_000);
        // Older values below the timestamp do not matter
        assert_eq!(next_id(&conn, IdColumn::NoteId, 11).unwrap(), 1_002);
    }

    #[test]
    fn test_existing_ids_are_reused() {
        let conn = notes_and_cards();
        conn.execute_batch(
            "INSERT INTO notes VALUES (42, 'guid-1', 1, 1);
             INSERT INTO cards VALUES (77, 42, 1, 1);",
        )
        .unwrap();
        assert_eq!(note_id_for_guid(&conn, "guid-1", 1_000).unwrap(), 42);
        assert_eq!(note_id_for_guid(&conn, "guid-2", 1_000).unwrap(), 1_000);
        assert_eq!(card_id_for_note(&conn, 42, 1_000).unwrap(), 77);
        assert_eq!(card_id_for_note(&conn, 43, 1_000).unwrap(), 1_000);
    }

    #[test]
    fn test_note_guid_is_deterministic() {
        let a = note_guid(1234, "Front", "Back");
        let b = note_guid(1234, "Front", "Back");
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));

        assert_ne!(a, note_guid(1235, "Front", "Back"));
        assert_ne!(a, note_guid(1234, "Front", "Back2"));
    }

    #[test]
    fn test_note_guid_known_value() {
        assert_eq!(
            note_guid(1, "Front", "Back"),
            "ddde60fa8fb36b90524091e4e2f2e8e419821f62"
        );
    }

    #[test]
    fn test_checksum_known_value() {
        // 0xe883df8d, the first eight hex digits of the SHA-1
        assert_eq!(checksum("Front\u{1f}Back"), 3_900_956_557);
    }

    #[test]
    fn test_checksum_fits_in_32_bits() {
        let sum = checksum("Front\u{1f}Back");
        assert!(sum >= 0);
        assert!(sum <= i64::from(u32::MAX));
        assert_eq!(sum, checksum("Front\u{1f}Back"));
    }

    #[test]
    fn test_format_tags() {
        assert_eq!(
            format_tags(&["tag1", "tag2", "multi word tag"]),
            " tag1 tag2 multi_word_tag "
        );
        assert_eq!(format_tags::<&str>(&[]), "");
    }

    #[test]
    fn test_format_tags_drops_blank_tags() {
        assert_eq!(format_tags(&["a b", "", "lead", "  ", "x"]), " a_b lead x ");
        assert_eq!(format_tags(&["two  spaces"]), " two_spaces ");
        assert_eq!(format_tags(&["", " "]), "");
    }

    #[test]
    fn test_join_fields() {
        assert_eq!(join_fields("Q", "A"), "Q\u{1f}A");
    }
}
