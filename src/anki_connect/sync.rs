//! Push a deck to a running Anki, or pull one from it.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::client::{AnkiConnect, Result};
use super::media_refs::extract_media_references;
use super::requests::{MediaAttachment, NewNote};
use crate::deck::{ids, Deck, MediaKind, NoteRow};

/// How [`Deck::sync_to_anki`] reconciles with existing remote notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    /// Update remote notes whose front and back match a local note
    pub update_existing: bool,
    /// Reserved; remote notes are never deleted
    pub delete_missing: bool,
    /// Upload registered media and attach it to notes
    pub sync_media: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            update_existing: true,
            delete_missing: false,
            sync_media: false,
        }
    }
}

/// Outcome of a push or sync
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub added: usize,
    pub updated: usize,
    pub duplicates: usize,
    pub media_uploaded: usize,
    pub media_failed: usize,
}

impl Deck {
    /// Add every note of this deck to Anki, without media.
    pub fn push_to_anki(&self, client: &AnkiConnect) -> Result<SyncReport> {
        self.push_to_anki_with_media(client, false)
    }

    /// Add every note of this deck to Anki. Notes Anki already has are skipped.
    pub fn push_to_anki_with_media(
        &self,
        client: &AnkiConnect,
        sync_media: bool,
    ) -> Result<SyncReport> {
        self.prepare_remote(client)?;
        self.push_notes(client, &HashMap::new(), sync_media)
    }

    /// Reconcile this deck with the remote deck of the same name.
    pub fn sync_to_anki(&self, client: &AnkiConnect, opts: &SyncOptions) -> Result<SyncReport> {
        self.prepare_remote(client)?;
        if opts.delete_missing {
            log::debug!("delete_missing is not supported, remote notes are kept");
        }

        let existing = client.find_notes(&self.remote_query())?;
        if !opts.update_existing || existing.is_empty() {
            return self.push_notes(client, &HashMap::new(), opts.sync_media);
        }

        let remote: HashMap<(String, String), i64> = client
            .notes_info(&existing)?
            .into_iter()
            .filter(|info| !info.fields.is_empty())
            .map(|info| ((info.front().to_string(), info.back().to_string()), info.note_id))
            .collect();
        log::debug!("Matching against {} remote notes", remote.len());

        self.push_notes(client, &remote, opts.sync_media)
    }

    /// Replace the local notes with the remote deck's notes.
    ///
    /// Returns the number of notes pulled. An empty remote deck leaves the
    /// local deck untouched.
    pub fn pull_from_anki(&mut self, client: &AnkiConnect) -> Result<usize> {
        client.ping()?;

        let note_ids = client.find_notes(&self.remote_query())?;
        if note_ids.is_empty() {
            log::info!("Remote deck '{}' has no notes", self.name());
            return Ok(0);
        }
        let notes = client.notes_info(&note_ids)?;

        let pulled = self.replace_notes(
            notes
                .iter()
                .filter(|n| !n.fields.is_empty())
                .map(|n| (n.front(), n.back(), ids::format_tags(&n.tags))),
        )?;

        log::info!("Pulled {} notes into '{}'", pulled, self.name());
        Ok(pulled)
    }

    fn remote_query(&self) -> String {
        format!("deck:\"{}\"", self.name())
    }

    /// Ping and make sure the remote deck exists.
    fn prepare_remote(&self, client: &AnkiConnect) -> Result<()> {
        client.ping()?;
        match client.create_deck(self.name()) {
            Ok(_) => Ok(()),
            Err(err) if err.is_deck_exists() => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Update notes found in `remote`, add the rest.
    fn push_notes(
        &self,
        client: &AnkiConnect,
        remote: &HashMap<(String, String), i64>,
        sync_media: bool,
    ) -> Result<SyncReport> {
        let mut report = SyncReport::default();
        if sync_media {
            self.upload_media(client, &mut report);
        }

        for row in self.notes()? {
            let Some((front, back)) = row.front_back() else {
                continue;
            };

            if let Some(&id) = remote.get(&(front.to_string(), back.to_string())) {
                client.update_note_fields(id, front, back)?;
                report.updated += 1;
                continue;
            }

            match client.add_note(self.remote_note(&row, sync_media)) {
                Ok(_) => report.added += 1,
                Err(err) if err.is_duplicate_note() => report.duplicates += 1,
                Err(err) => return Err(err),
            }
        }

        log::info!(
            "Pushed '{}': {} added, {} updated, {} duplicates",
            self.name(),
            report.added,
            report.updated,
            report.duplicates
        );
        Ok(report)
    }

    /// Upload every registered media file. Failures are logged.
    fn upload_media(&self, client: &AnkiConnect, report: &mut SyncReport) {
        for media in self.media() {
            match client.store_media_file(&media.filename, &media.data) {
                Ok(()) => report.media_uploaded += 1,
                Err(err) => {
                    log::warn!("Failed to upload media file {}: {}", media.filename, err);
                    report.media_failed += 1;
                }
            }
        }
    }

    fn remote_note(&self, row: &NoteRow, sync_media: bool) -> NewNote {
        let (front, back) = row.front_back().unwrap_or_default();
        let mut note = NewNote::basic(self.name(), front, back, row.tag_list());
        if sync_media {
            note.audio = self.attachments(front, back, MediaKind::Audio);
            note.picture = self.attachments(front, back, MediaKind::Image);
            note.video = self.attachments(front, back, MediaKind::Video);
        }
        note
    }

    /// Attachments for references to registered media; others are dropped.
    fn attachments(&self, front: &str, back: &str, kind: MediaKind) -> Vec<MediaAttachment> {
        extract_media_references(front, back, kind)
            .into_iter()
            .filter_map(|reference| {
                let Some(media) = self.media.get(&reference.filename) else {
                    log::debug!("{} is not a registered media file", reference.filename);
                    return None;
                };
                Some(MediaAttachment {
                    data: Some(BASE64.encode(&media.data)),
                    filename: reference.filename,
                    fields: vec![reference.field.to_string()],
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::super::test_server::{self, reply_error, reply_ok};
    use super::*;

    fn actions(requests: &[Value]) -> Vec<&str> {
        requests
            .iter()
            .map(|r| r["action"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn test_push_adds_every_note() {
        let server = test_server::spawn(|action, _| match action {
            "version" => reply_ok(json!(6)),
            "createDeck" => reply_ok(json!(1)),
            "addNote" => reply_ok(json!(1234)),
            _ => reply_error("unexpected"),
        });
        let client = AnkiConnect::with_url(&server.url).unwrap();

        let mut deck = Deck::new("Spanish").unwrap();
        deck.add_card_with_options("Hello", "Hola", &crate::deck::CardOptions::with_tags(["greeting"]))
            .unwrap();
        deck.add_card("Goodbye", "Adiós").unwrap();

        let report = deck.push_to_anki(&client).unwrap();
        assert_eq!(report.added, 2);

        let requests = server.requests();
        assert_eq!(actions(&requests), vec!["version", "createDeck", "addNote", "addNote"]);
        assert_eq!(requests[1]["params"], json!({"deck": "Spanish"}));

        let note = &requests[2]["params"]["note"];
        assert_eq!(note["deckName"], "Spanish");
        assert_eq!(note["modelName"], "Basic");
        assert_eq!(note["fields"], json!({"Front": "Hello", "Back": "Hola"}));
        assert_eq!(note["tags"], json!(["greeting"]));
        assert_eq!(note["options"], json!({"allowDuplicate": false}));
        assert!(note.get("audio").is_none());
    }

    #[test]
    fn test_push_tolerates_existing_deck_and_duplicates() {
        let server = test_server::spawn(|action, _| match action {
            "version" => reply_ok(json!(6)),
            "createDeck" => reply_error("deck already exists"),
            "addNote" => reply_error("cannot create note because it is a duplicate"),
            _ => reply_error("unexpected"),
        });
        let client = AnkiConnect::with_url(&server.url).unwrap();

        let mut deck = Deck::new("Spanish").unwrap();
        deck.add_card("Hello", "Hola").unwrap();

        let report = deck.push_to_anki(&client).unwrap();
        assert_eq!(report.added, 0);
        assert_eq!(report.duplicates, 1);
    }

    #[test]
    fn test_push_propagates_other_errors() {
        let server = test_server::spawn(|action, _| match action {
            "version" => reply_ok(json!(6)),
            "createDeck" => reply_ok(json!(1)),
            _ => reply_error("model was not found: Basic"),
        });
        let client = AnkiConnect::with_url(&server.url).unwrap();

        let mut deck = Deck::new("Spanish").unwrap();
        deck.add_card("Hello", "Hola").unwrap();

        let err = deck.push_to_anki(&client).unwrap_err();
        assert!(!err.is_duplicate_note());
        assert!(err.to_string().contains("model was not found"));
    }

    #[test]
    fn test_push_with_media() {
        let server = test_server::spawn(|action, _| match action {
            "version" => reply_ok(json!(6)),
            "createDeck" => reply_ok(json!(1)),
            "storeMediaFile" => reply_ok(json!("ok")),
            "addNote" => reply_ok(json!(1)),
            _ => reply_error("unexpected"),
        });
        let client = AnkiConnect::with_url(&server.url).unwrap();

        let mut deck = Deck::new("Audio").unwrap();
        deck.add_card_with_audio("What sound?", "A bell", "bell.mp3", b"ding".to_vec())
            .unwrap();

        let report = deck.push_to_anki_with_media(&client, true).unwrap();
        assert_eq!(report.media_uploaded, 1);
        assert_eq!(report.added, 1);

        let requests = server.requests();
        assert_eq!(
            actions(&requests),
            vec!["version", "createDeck", "storeMediaFile", "addNote"]
        );
        let audio = &requests[3]["params"]["note"]["audio"];
        assert_eq!(
            *audio,
            json!([{"filename": "bell.mp3", "data": "ZGluZw==", "fields": ["Back"]}])
        );
    }

    #[test]
    fn test_media_upload_failure_is_not_fatal() {
        let server = test_server::spawn(|action, _| match action {
            "version" => reply_ok(json!(6)),
            "createDeck" => reply_ok(json!(1)),
            "storeMediaFile" => reply_error("disk full"),
            "addNote" => reply_ok(json!(1)),
            _ => reply_error("unexpected"),
        });
        let client = AnkiConnect::with_url(&server.url).unwrap();

        let mut deck = Deck::new("Audio").unwrap();
        deck.add_card_with_audio("Q", "A", "a.mp3", vec![1]).unwrap();

        let report = deck.push_to_anki_with_media(&client, true).unwrap();
        assert_eq!(report.media_failed, 1);
        assert_eq!(report.added, 1);
    }

    #[test]
    fn test_sync_updates_matching_notes() {
        let server = test_server::spawn(|action, _| match action {
            "version" => reply_ok(json!(6)),
            "createDeck" => reply_error("deck already exists"),
            "findNotes" => reply_ok(json!([11])),
            "notesInfo" => reply_ok(json!([{
                "noteId": 11,
                "modelName": "Basic",
                "tags": [],
                "fields": {
                    "Front": {"value": "Hello", "order": 0},
                    "Back": {"value": "Hola", "order": 1}
                }
            }])),
            "updateNoteFields" => reply_ok(json!(null)),
            "addNote" => reply_ok(json!(12)),
            _ => reply_error("unexpected"),
        });
        let client = AnkiConnect::with_url(&server.url).unwrap();

        let mut deck = Deck::new("Spanish").unwrap();
        deck.add_card("Hello", "Hola").unwrap();
        deck.add_card("Thanks", "Gracias").unwrap();

        let report = deck.sync_to_anki(&client, &SyncOptions::default()).unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(report.added, 1);

        let requests = server.requests();
        assert_eq!(
            actions(&requests),
            vec![
                "version",
                "createDeck",
                "findNotes",
                "notesInfo",
                "updateNoteFields",
                "addNote"
            ]
        );
        assert_eq!(requests[2]["params"], json!({"query": "deck:\"Spanish\""}));
        assert_eq!(requests[4]["params"]["note"]["id"], 11);
    }

    #[test]
    fn test_sync_without_update_pushes() {
        let server = test_server::spawn(|action, _| match action {
            "version" => reply_ok(json!(6)),
            "createDeck" => reply_ok(json!(1)),
            "findNotes" => reply_ok(json!([11])),
            "addNote" => reply_error("cannot create note because it is a duplicate"),
            _ => reply_error("unexpected"),
        });
        let client = AnkiConnect::with_url(&server.url).unwrap();

        let mut deck = Deck::new("Spanish").unwrap();
        deck.add_card("Hello", "Hola").unwrap();

        let opts = SyncOptions {
            update_existing: false,
            ..Default::default()
        };
        let report = deck.sync_to_anki(&client, &opts).unwrap();
        assert_eq!(report.duplicates, 1);
        assert!(!actions(&server.requests()).contains(&"notesInfo"));
    }

    #[test]
    fn test_pull_replaces_local_notes() {
        let server = test_server::spawn(|action, _| match action {
            "version" => reply_ok(json!(6)),
            "findNotes" => reply_ok(json!([1, 2])),
            "notesInfo" => reply_ok(json!([
                {
                    "noteId": 1,
                    "tags": ["remote", "verb"],
                    "fields": {
                        "Front": {"value": "Comer", "order": 0},
                        "Back": {"value": "To eat", "order": 1}
                    }
                },
                {
                    "noteId": 2,
                    "tags": [],
                    "fields": {
                        "Front": {"value": "Beber", "order": 0},
                        "Back": {"value": "To drink", "order": 1}
                    }
                }
            ])),
            _ => reply_error("unexpected"),
        });
        let client = AnkiConnect::with_url(&server.url).unwrap();

        let mut deck = Deck::new("Spanish").unwrap();
        deck.add_card("Local only", "Gone after pull").unwrap();

        assert_eq!(deck.pull_from_anki(&client).unwrap(), 2);

        let notes = deck.notes().unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].front_back(), Some(("Comer", "To eat")));
        assert_eq!(notes[0].tags, " remote verb ");
        assert_eq!(notes[1].front_back(), Some(("Beber", "To drink")));
    }

    #[test]
    fn test_pull_counts_identical_remote_notes_once() {
        let server = test_server::spawn(|action, _| match action {
            "version" => reply_ok(json!(6)),
            "findNotes" => reply_ok(json!([1, 2])),
            "notesInfo" => reply_ok(json!([
                {"noteId": 1, "fields": {"Front": {"value": "Hola"}, "Back": {"value": "Hello"}}},
                {"noteId": 2, "fields": {"Front": {"value": "Hola"}, "Back": {"value": "Hello"}}}
            ])),
            _ => reply_error("unexpected"),
        });
        let client = AnkiConnect::with_url(&server.url).unwrap();

        let mut deck = Deck::new("Spanish").unwrap();
        assert_eq!(deck.pull_from_anki(&client).unwrap(), 1);
        assert_eq!(deck.notes().unwrap().len(), 1);
    }

    #[test]
    fn test_pull_from_empty_deck_keeps_local_notes() {
        let server = test_server::spawn(|action, _| match action {
            "version" => reply_ok(json!(6)),
            "findNotes" => reply_ok(json!([])),
            _ => reply_error("unexpected"),
        });
        let client = AnkiConnect::with_url(&server.url).unwrap();

        let mut deck = Deck::new("Spanish").unwrap();
        deck.add_card("Local", "Kept").unwrap();

        assert_eq!(deck.pull_from_anki(&client).unwrap(), 0);
        assert_eq!(deck.notes().unwrap().len(), 1);
    }
}
