//! Anki deck building
//!
//! This module provides:
//! - The collection bootstrap (schema, seed configuration, default model)
//! - Id assignment and content-derived note identity
//! - Card upserts with tags and media markup
//! - The media registry that feeds the `.apkg` archive

pub mod errors;
pub mod ids;
pub mod media;
pub mod models;
pub mod storage;
pub mod template;

pub use errors::{DeckError, Result};
pub use media::{MediaKind, MediaRegistry};
pub use models::*;
pub use storage::Deck;
