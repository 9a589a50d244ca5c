//! Media registry and the markup that references media from card text.

use std::collections::BTreeMap;

use super::models::Media;

/// Kind of media reference embedded in card text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Image,
    Video,
}

impl MediaKind {
    /// Markup that embeds `filename` in a field.
    pub fn markup(self, filename: &str) -> String {
        match self {
            Self::Audio => format!("[sound:{}]", filename),
            Self::Image => format!("<img src=\"{}\">", filename),
            Self::Video => format!("<video controls><source src=\"{}\"></video>", filename),
        }
    }
}

/// Ordered list of media files attached to a deck
///
/// An entry's identity in the archive is its position, not its filename.
#[derive(Debug, Clone, Default)]
pub struct MediaRegistry {
    entries: Vec<Media>,
}

impl MediaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filename: impl Into<String>, data: Vec<u8>) {
        self.entries.push(Media::new(filename, data));
    }

    pub fn entries(&self) -> &[Media] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry registered under `filename`.
    pub fn get(&self, filename: &str) -> Option<&Media> {
        self.entries.iter().find(|m| m.filename == filename)
    }

    /// Archive entry name for each media file, keyed by position.
    pub fn manifest(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, m)| (i.to_string(), m.filename.clone()))
            .collect()
    }
}

/// Append `filename`'s markup to `text`, separated by a space.
pub(crate) fn append_markup(text: &mut String, kind: MediaKind, filename: Option<&str>) {
    if let Some(filename) = filename {
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(&kind.markup(filename));
    }
}
