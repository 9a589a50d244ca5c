//! The deck aggregate: an in-memory collection database plus its media.
//!
//! A [`Deck`] owns a private SQLite connection created from the bootstrap
//! script in [`super::template`]. Cards are written straight into that
//! database; [`crate::export`] turns it into an `.apkg` archive.

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::errors::{DeckError, Result};
use super::ids::{self, IdColumn};
use super::media::{append_markup, MediaKind, MediaRegistry};
use super::models::{CardOptions, Media, NoteRow, TemplateOptions};
use super::template::{self, DeckDefinition, ModelDefinition, DEFAULT_DECK_KEY, SEED_DECK_ID, SEED_MODEL_ID};

/// Initial `due` position of a new card.
const NEW_CARD_DUE: i64 = 179;

/// An Anki deck that can be exported as `.apkg`
pub struct Deck {
    pub(crate) name: String,
    pub(crate) conn: Connection,
    pub(crate) media: MediaRegistry,
    top_deck_id: i64,
    top_model_id: i64,
}

impl std::fmt::Debug for Deck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deck")
            .field("name", &self.name)
            .field("top_deck_id", &self.top_deck_id)
            .field("top_model_id", &self.top_model_id)
            .field("media", &self.media.len())
            .finish()
    }
}

impl Deck {
    /// Create a new deck with the default card template.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        Self::with_template(name, &TemplateOptions::default())
    }

    /// Create a new deck with a custom card template.
    pub fn with_template(name: impl Into<String>, template: &TemplateOptions) -> Result<Self> {
        let name = name.into();
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&template::bootstrap_script(template)?)?;

        let now = now_millis();
        let top_deck_id = ids::next_id(&conn, IdColumn::CardDeck, now)?;
        let top_model_id = ids::next_id(&conn, IdColumn::NoteModel, now)?;

        let deck = Self {
            name,
            conn,
            media: MediaRegistry::new(),
            top_deck_id,
            top_model_id,
        };
        deck.assign_deck_identity()?;
        deck.assign_model_identity()?;

        log::debug!(
            "Created deck '{}' (deck id {}, model id {})",
            deck.name,
            deck.top_deck_id,
            deck.top_model_id
        );
        Ok(deck)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn top_deck_id(&self) -> i64 {
        self.top_deck_id
    }

    pub fn top_model_id(&self) -> i64 {
        self.top_model_id
    }

    /// The underlying collection database.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Release the database handle, reporting any close error.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, err)| DeckError::Sqlite(err))
    }

    // ===== Identity =====

    /// Re-key the placeholder deck to this deck's id and name.
    fn assign_deck_identity(&self) -> Result<()> {
        let mut decks: BTreeMap<String, DeckDefinition> = self.load_blob("decks")?;

        let seed_key = SEED_DECK_ID.to_string();
        let candidates: Vec<&String> = decks.keys().filter(|k| *k != DEFAULT_DECK_KEY).collect();
        if candidates.len() != 1 || candidates[0] != &seed_key {
            return Err(DeckError::SeedInvariant(format!(
                "expected exactly one placeholder deck {}, found {:?}",
                seed_key, candidates
            )));
        }

        if let Some(mut deck) = decks.remove(&seed_key) {
            deck.name = self.name.clone();
            deck.id = self.top_deck_id;
            decks.insert(self.top_deck_id.to_string(), deck);
        }

        self.store_blob("decks", &decks)
    }

    /// Re-key the placeholder model to this deck's model id.
    fn assign_model_identity(&self) -> Result<()> {
        let mut models: BTreeMap<String, ModelDefinition> = self.load_blob("models")?;

        let seed_key = SEED_MODEL_ID.to_string();
        let mut model = match models.remove(&seed_key) {
            Some(model) if models.is_empty() => model,
            _ => {
                return Err(DeckError::SeedInvariant(format!(
                    "expected a single placeholder model {}",
                    seed_key
                )))
            }
        };

        model.name = self.name.clone();
        model.did = self.top_deck_id;
        model.id = self.top_model_id;
        models.insert(self.top_model_id.to_string(), model);

        self.store_blob("models", &models)
    }

    /// Read one of the JSON columns of the `col` row.
    fn load_blob<T: DeserializeOwned>(&self, column: &'static str) -> Result<T> {
        let json: String = self.conn.query_row(
            &format!("SELECT {} FROM col WHERE id = 1", column),
            [],
            |row| row.get(0),
        )?;
        Ok(serde_json::from_str(&json)?)
    }

    fn store_blob<T: Serialize>(&self, column: &'static str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.conn.execute(
            &format!("UPDATE col SET {} = ?1 WHERE id = 1", column),
            params![json],
        )?;
        Ok(())
    }

    // ===== Cards =====

    /// Add a card, returning the id of its note.
    pub fn add_card(&mut self, front: &str, back: &str) -> Result<i64> {
        self.add_card_with_options(front, back, &CardOptions::default())
    }

    /// Add a card with tags and media references.
    ///
    /// Adding the same front and back again updates the existing note and
    /// card instead of creating duplicates.
    pub fn add_card_with_options(
        &mut self,
        front: &str,
        back: &str,
        opts: &CardOptions,
    ) -> Result<i64> {
        let mut front = front.to_string();
        append_markup(&mut front, MediaKind::Audio, opts.front_audio.as_deref());
        append_markup(&mut front, MediaKind::Image, opts.front_image.as_deref());
        append_markup(&mut front, MediaKind::Video, opts.front_video.as_deref());

        let mut back = back.to_string();
        append_markup(&mut back, MediaKind::Audio, opts.back_audio.as_deref());
        append_markup(&mut back, MediaKind::Image, opts.back_image.as_deref());
        append_markup(&mut back, MediaKind::Video, opts.back_video.as_deref());

        let tags = ids::format_tags(&opts.tags);

        let tx = self.conn.transaction()?;
        let note_id = insert_card(
            &tx,
            self.top_deck_id,
            self.top_model_id,
            &front,
            &back,
            &tags,
        )?;
        tx.commit()?;

        Ok(note_id)
    }

    /// Register `data` and add a card with its audio on the back.
    pub fn add_card_with_audio(
        &mut self,
        front: &str,
        back: &str,
        filename: &str,
        data: Vec<u8>,
    ) -> Result<i64> {
        self.add_media(filename, data);
        let opts = CardOptions {
            back_audio: Some(filename.to_string()),
            ..Default::default()
        };
        self.add_card_with_options(front, back, &opts)
    }

    /// Register `data` and add a card with its image on the back.
    pub fn add_card_with_image(
        &mut self,
        front: &str,
        back: &str,
        filename: &str,
        data: Vec<u8>,
    ) -> Result<i64> {
        self.add_media(filename, data);
        let opts = CardOptions {
            back_image: Some(filename.to_string()),
            ..Default::default()
        };
        self.add_card_with_options(front, back, &opts)
    }

    /// Register `data` and add a card with its video on the back.
    pub fn add_card_with_video(
        &mut self,
        front: &str,
        back: &str,
        filename: &str,
        data: Vec<u8>,
    ) -> Result<i64> {
        self.add_media(filename, data);
        let opts = CardOptions {
            back_video: Some(filename.to_string()),
            ..Default::default()
        };
        self.add_card_with_options(front, back, &opts)
    }

    /// Drop this deck's cards and every note, then insert `notes`.
    ///
    /// All or nothing. Returns the number of distinct notes stored; entries
    /// with the same front and back collapse into one note.
    pub(crate) fn replace_notes<'a, I>(&mut self, notes: I) -> Result<usize>
    where
        I: IntoIterator<Item = (&'a str, &'a str, String)>,
    {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM cards WHERE did = ?1", params![self.top_deck_id])?;
        tx.execute("DELETE FROM notes", [])?;

        let mut stored = HashSet::new();
        for (front, back, tags) in notes {
            stored.insert(insert_card(
                &tx,
                self.top_deck_id,
                self.top_model_id,
                front,
                back,
                &tags,
            )?);
        }
        tx.commit()?;

        Ok(stored.len())
    }

    /// Notes that have a card in this deck, oldest first.
    pub fn notes(&self) -> Result<Vec<NoteRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT n.id, n.guid, n.tags, n.flds
             FROM notes n
             JOIN cards c ON c.nid = n.id
             WHERE c.did = ?1
             ORDER BY n.id",
        )?;
        let rows = stmt
            .query_map(params![self.top_deck_id], |row| {
                Ok(NoteRow {
                    id: row.get(0)?,
                    guid: row.get(1)?,
                    tags: row.get(2)?,
                    fields: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // ===== Media =====

    /// Register a media file. No validation or deduplication is done.
    pub fn add_media(&mut self, filename: impl Into<String>, data: Vec<u8>) {
        self.media.push(filename, data);
    }

    /// Register an audio file and return its `[sound:...]` tag.
    pub fn add_audio(&mut self, filename: &str, data: Vec<u8>) -> String {
        self.add_media(filename, data);
        MediaKind::Audio.markup(filename)
    }

    /// Register an image and return its `<img>` tag.
    pub fn add_image(&mut self, filename: &str, data: Vec<u8>) -> String {
        self.add_media(filename, data);
        MediaKind::Image.markup(filename)
    }

    /// Register a video and return its `<video>` tag.
    pub fn add_video(&mut self, filename: &str, data: Vec<u8>) -> String {
        self.add_media(filename, data);
        MediaKind::Video.markup(filename)
    }

    pub fn media(&self) -> &[Media] {
        self.media.entries()
    }
}

/// Upsert the note and card for `front`/`back`, returning the note id.
///
/// Runs several statements; callers wrap it in a transaction.
pub(crate) fn insert_card(
    conn: &Connection,
    deck_id: i64,
    model_id: i64,
    front: &str,
    back: &str,
    tags: &str,
) -> Result<i64> {
    let now = now_millis();
    let guid = ids::note_guid(deck_id, front, back);
    let note_id = ids::note_id_for_guid(conn, &guid, now)?;
    let fields = ids::join_fields(front, back);

    conn.execute(
        "INSERT OR REPLACE INTO notes VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            note_id,
            guid,
            model_id,
            ids::next_id(conn, IdColumn::NoteModified, now)?,
            -1,
            tags,
            fields,
            front,
            ids::checksum(&fields),
            0,
            "",
        ],
    )?;

    let card_id = ids::card_id_for_note(conn, note_id, now)?;
    conn.execute(
        "INSERT OR REPLACE INTO cards VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        params![
            card_id,
            note_id,
            deck_id,
            0, // ord
            ids::next_id(conn, IdColumn::CardModified, now)?,
            -1, // usn
            0,  // type
            0,  // queue
            NEW_CARD_DUE,
            0, // ivl
            0, // factor
            0, // reps
            0, // lapses
            0, // left
            0, // odue
            0, // odid
            0, // flags
            "",
        ],
    )?;

    Ok(note_id)
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
