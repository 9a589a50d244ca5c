//! AnkiConnect integration
//!
//! Talks to a running Anki desktop through the AnkiConnect add-on:
//! - Typed request/response actions
//! - Pushing and syncing a deck's notes and media
//! - Pulling a remote deck back into a [`Deck`](crate::deck::Deck)

pub mod client;
pub mod media_refs;
pub mod requests;
pub mod sync;

#[cfg(test)]
mod test_server;

pub use client::{AnkiConnect, AnkiConnectError};
pub use media_refs::{extract_media_references, MediaReference};
pub use requests::{AnkiRequestParams, NoteInfo};
pub use sync::{SyncOptions, SyncReport};
