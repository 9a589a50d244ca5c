//! Build Anki `.apkg` decks in memory and sync them with a running Anki.
//!
//! ```no_run
//! use ankipack::deck::{CardOptions, Deck};
//!
//! # fn main() -> ankipack::deck::Result<()> {
//! let mut deck = Deck::new("Spanish")?;
//! let audio = deck.add_audio("hola.mp3", std::fs::read("hola.mp3")?);
//! deck.add_card_with_options("Hello", &format!("Hola {}", audio), &CardOptions::with_tags(["greeting"]))?;
//! deck.save_to_file("spanish.apkg")?;
//! # Ok(())
//! # }
//! ```

pub mod anki_connect;
pub mod config;
pub mod deck;
pub mod export;

pub use anki_connect::{AnkiConnect, AnkiConnectError, SyncOptions};
pub use config::AppConfig;
pub use deck::{CardOptions, Deck, DeckError, Media, TemplateOptions};
