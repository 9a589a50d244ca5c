pub mod build;
pub mod decks;
pub mod ping;
pub mod pull;
pub mod push;
