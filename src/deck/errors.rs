//! Deck error types

use thiserror::Error;

/// Errors that can occur while building or exporting a deck
#[derive(Debug, Error)]
pub enum DeckError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Seed data invariant violated: {0}")]
    SeedInvariant(String),
}

impl From<DeckError> for String {
    fn from(err: DeckError) -> Self {
        err.to_string()
    }
}

/// Result type alias for deck operations
pub type Result<T> = std::result::Result<T, DeckError>;
