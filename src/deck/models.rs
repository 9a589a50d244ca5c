//! Data models for deck building

use serde::{Deserialize, Serialize};

/// Separator between note fields in the `flds` column.
pub const FIELD_SEPARATOR: char = '\u{1f}';

/// A media file to be included in the deck
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub filename: String,
    pub data: Vec<u8>,
}

impl Media {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
        }
    }
}

/// Optional parameters for adding cards
///
/// Media fields name files registered with [`Deck::add_media`](super::Deck::add_media);
/// they are rendered as markup and appended to the matching side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardOptions {
    pub tags: Vec<String>,
    pub front_audio: Option<String>,
    pub back_audio: Option<String>,
    pub front_image: Option<String>,
    pub back_image: Option<String>,
    pub front_video: Option<String>,
    pub back_video: Option<String>,
}

impl CardOptions {
    pub fn with_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}

/// Customization of the card template
///
/// Empty or missing values fall back to the built-in front/back layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct TemplateOptions {
    pub question_format: Option<String>,
    pub answer_format: Option<String>,
    pub css: Option<String>,
}

/// A note row as stored in the collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRow {
    pub id: i64,
    pub guid: String,
    pub tags: String,
    pub fields: String,
}

impl NoteRow {
    /// Front and back, or `None` when the row has fewer than two fields.
    pub fn front_back(&self) -> Option<(&str, &str)> {
        let mut parts = self.fields.split(FIELD_SEPARATOR);
        let front = parts.next()?;
        let back = parts.next()?;
        Some((front, back))
    }

    /// Tags as individual words.
    pub fn tag_list(&self) -> Vec<String> {
        self.tags.split_whitespace().map(str::to_string).collect()
    }
}
