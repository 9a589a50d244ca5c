//! Blocking client for the AnkiConnect add-on.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::blocking::Client;
use thiserror::Error;

use super::requests::*;
use crate::config::AnkiConnectConfig;
use crate::deck::DeckError;

/// Address the add-on listens on by default.
pub const DEFAULT_URL: &str = "http://localhost:8765";

/// API version we speak.
pub const API_VERSION: u16 = 6;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const DUPLICATE_NOTE_MESSAGE: &str = "cannot create note because it is a duplicate";
const DECK_EXISTS_MESSAGE: &str = "deck already exists";

#[derive(Debug, Error)]
pub enum AnkiConnectError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("AnkiConnect error: {0}")]
    Remote(String),
    #[error("Deck error: {0}")]
    Deck(#[from] DeckError),
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl AnkiConnectError {
    /// The remote refused a note that already exists.
    pub fn is_duplicate_note(&self) -> bool {
        matches!(self, Self::Remote(msg) if msg.contains(DUPLICATE_NOTE_MESSAGE))
    }

    /// The remote refused to create a deck that already exists.
    pub fn is_deck_exists(&self) -> bool {
        matches!(self, Self::Remote(msg) if msg.contains(DECK_EXISTS_MESSAGE))
    }
}

impl From<AnkiConnectError> for String {
    fn from(err: AnkiConnectError) -> Self {
        err.to_string()
    }
}

pub type Result<T> = std::result::Result<T, AnkiConnectError>;

/// AnkiConnect client
#[derive(Debug, Clone)]
pub struct AnkiConnect {
    url: String,
    version: u16,
    client: Client,
}

impl AnkiConnect {
    /// Client for the default local address.
    pub fn new() -> Result<Self> {
        Self::from_config(&AnkiConnectConfig::default())
    }

    pub fn with_url(url: impl Into<String>) -> Result<Self> {
        Self::from_config(&AnkiConnectConfig {
            url: url.into(),
            ..Default::default()
        })
    }

    pub fn from_config(config: &AnkiConnectConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            url: config.url.clone(),
            version: config.version,
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Perform one action and decode its result.
    pub fn request<P>(&self, params: P) -> Result<P::Response>
    where
        P: AnkiRequestParams,
    {
        log::trace!("AnkiConnect request: {:?}", params);
        let request = AnkiRequest {
            action: P::ACTION,
            version: self.version,
            params,
        };

        let response = self.client.post(&self.url).json(&request).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(AnkiConnectError::UnexpectedResponse(format!(
                "{} returned HTTP {}",
                P::ACTION,
                status
            )));
        }

        let body = response.text()?;
        let envelope: AnkiResponse = serde_json::from_str(&body)?;
        if let Some(error) = envelope.error.filter(|e| !e.is_empty()) {
            return Err(AnkiConnectError::Remote(error));
        }

        let result: P::Response = serde_json::from_value(envelope.result)?;
        log::trace!("AnkiConnect response: {:?}", result);
        Ok(result)
    }

    /// Check the add-on is reachable and return its API version.
    pub fn ping(&self) -> Result<u16> {
        self.request(VersionRequest)
    }

    pub fn deck_names(&self) -> Result<Vec<String>> {
        self.request(DeckNamesRequest)
    }

    pub fn create_deck(&self, name: &str) -> Result<i64> {
        self.request(CreateDeckRequest {
            deck: name.to_string(),
        })
    }

    /// Delete a deck together with its cards.
    pub fn delete_deck(&self, name: &str) -> Result<()> {
        self.request(DeleteDecksRequest {
            decks: vec![name.to_string()],
            cards_too: true,
        })?;
        Ok(())
    }

    pub fn add_note(&self, note: NewNote) -> Result<i64> {
        self.request(AddNoteRequest { note })
    }

    pub fn find_notes(&self, query: &str) -> Result<Vec<i64>> {
        self.request(FindNotesRequest {
            query: query.to_string(),
        })
    }

    pub fn update_note_fields(&self, id: i64, front: &str, back: &str) -> Result<()> {
        self.request(UpdateNoteFieldsRequest {
            note: NoteUpdate {
                id,
                fields: NoteFields {
                    front: front.to_string(),
                    back: back.to_string(),
                },
            },
        })?;
        Ok(())
    }

    /// Upload a file into the collection's media folder.
    pub fn store_media_file(&self, filename: &str, data: &[u8]) -> Result<()> {
        self.request(StoreMediaFileRequest {
            filename: filename.to_string(),
            data: BASE64.encode(data),
        })?;
        Ok(())
    }

    pub fn notes_info(&self, ids: &[i64]) -> Result<Vec<NoteInfo>> {
        self.request(NotesInfoRequest {
            notes: ids.to_vec(),
        })
    }

    /// Ask Anki to sync with AnkiWeb.
    pub fn sync(&self) -> Result<()> {
        self.request(SyncRequest)?;
        Ok(())
    }
}
