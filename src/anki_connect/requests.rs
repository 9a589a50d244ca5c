//! Typed AnkiConnect actions.
//!
//! Each request type knows its action name and the shape of its result.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Note type used for every remote note.
pub const BASIC_MODEL: &str = "Basic";

/// Parameters of one AnkiConnect action.
pub trait AnkiRequestParams: fmt::Debug + Serialize {
    /// The name of the action to perform.
    const ACTION: &'static str;

    /// The type of the `result` member on success.
    type Response: fmt::Debug + DeserializeOwned;

    /// Whether the request carries no `params` member.
    fn omit_params(&self) -> bool {
        false
    }
}

/// Request envelope.
#[derive(Serialize)]
pub(crate) struct AnkiRequest<R: AnkiRequestParams> {
    pub(crate) action: &'static str,
    pub(crate) version: u16,
    #[serde(skip_serializing_if = "R::omit_params")]
    pub(crate) params: R,
}

/// Response envelope. A non-empty `error` means failure.
#[derive(Debug, Deserialize)]
pub(crate) struct AnkiResponse {
    #[serde(default)]
    pub(crate) result: Value,
    #[serde(default)]
    pub(crate) error: Option<String>,
}

/// Query the API version; doubles as a connectivity check.
#[derive(Debug, Serialize)]
pub struct VersionRequest;

impl AnkiRequestParams for VersionRequest {
    const ACTION: &'static str = "version";
    type Response = u16;

    fn omit_params(&self) -> bool {
        true
    }
}

/// List every deck name.
#[derive(Debug, Serialize)]
pub struct DeckNamesRequest;

impl AnkiRequestParams for DeckNamesRequest {
    const ACTION: &'static str = "deckNames";
    type Response = Vec<String>;

    fn omit_params(&self) -> bool {
        true
    }
}

#[derive(Debug, Serialize)]
pub struct CreateDeckRequest {
    pub deck: String,
}

impl AnkiRequestParams for CreateDeckRequest {
    const ACTION: &'static str = "createDeck";
    type Response = i64;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDecksRequest {
    pub decks: Vec<String>,
    pub cards_too: bool,
}

impl AnkiRequestParams for DeleteDecksRequest {
    const ACTION: &'static str = "deleteDecks";
    type Response = Value;
}

/// Front and back field values of a Basic note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteFields {
    #[serde(rename = "Front")]
    pub front: String,
    #[serde(rename = "Back")]
    pub back: String,
}

/// A media file attached to a note being added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaAttachment {
    pub filename: String,
    /// Base64 payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteOptions {
    pub allow_duplicate: bool,
}

/// A note to be added remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    pub deck_name: String,
    pub model_name: String,
    pub fields: NoteFields,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub audio: Vec<MediaAttachment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub picture: Vec<MediaAttachment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub video: Vec<MediaAttachment>,
    pub options: NoteOptions,
}

impl NewNote {
    /// A Basic note that refuses duplicates.
    pub fn basic(deck_name: &str, front: &str, back: &str, tags: Vec<String>) -> Self {
        Self {
            deck_name: deck_name.to_string(),
            model_name: BASIC_MODEL.to_string(),
            fields: NoteFields {
                front: front.to_string(),
                back: back.to_string(),
            },
            tags,
            audio: Vec::new(),
            picture: Vec::new(),
            video: Vec::new(),
            options: NoteOptions::default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AddNoteRequest {
    pub note: NewNote,
}

impl AnkiRequestParams for AddNoteRequest {
    const ACTION: &'static str = "addNote";
    type Response = i64;
}

#[derive(Debug, Serialize)]
pub struct FindNotesRequest {
    pub query: String,
}

impl AnkiRequestParams for FindNotesRequest {
    const ACTION: &'static str = "findNotes";
    type Response = Vec<i64>;
}

#[derive(Debug, Serialize)]
pub struct NoteUpdate {
    pub id: i64,
    pub fields: NoteFields,
}

#[derive(Debug, Serialize)]
pub struct UpdateNoteFieldsRequest {
    pub note: NoteUpdate,
}

impl AnkiRequestParams for UpdateNoteFieldsRequest {
    const ACTION: &'static str = "updateNoteFields";
    type Response = Value;
}

#[derive(Debug, Serialize)]
pub struct StoreMediaFileRequest {
    pub filename: String,
    /// Base64 payload.
    pub data: String,
}

impl AnkiRequestParams for StoreMediaFileRequest {
    const ACTION: &'static str = "storeMediaFile";
    type Response = Value;
}

#[derive(Debug, Serialize)]
pub struct NotesInfoRequest {
    pub notes: Vec<i64>,
}

impl AnkiRequestParams for NotesInfoRequest {
    const ACTION: &'static str = "notesInfo";
    type Response = Vec<NoteInfo>;
}

/// Trigger a sync with AnkiWeb.
#[derive(Debug, Serialize)]
pub struct SyncRequest;

impl AnkiRequestParams for SyncRequest {
    const ACTION: &'static str = "sync";
    type Response = Value;

    fn omit_params(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldValue {
    pub value: String,
    #[serde(default)]
    pub order: i64,
}

/// A remote note as returned by `notesInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteInfo {
    pub note_id: i64,
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl NoteInfo {
    /// Value of a field, or empty when the note lacks it.
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map_or("", |f| f.value.as_str())
    }

    pub fn front(&self) -> &str {
        self.field("Front")
    }

    pub fn back(&self) -> &str {
        self.field("Back")
    }
}
