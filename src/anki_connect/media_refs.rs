//! Find media references in card text.

use crate::deck::MediaKind;

/// A media file referenced from one side of a card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaReference {
    pub filename: String,
    /// `"Front"` or `"Back"`
    pub field: &'static str,
}

/// Every reference of `kind` in `front` then `back`, in order of appearance.
pub fn extract_media_references(front: &str, back: &str, kind: MediaKind) -> Vec<MediaReference> {
    let (open, close) = match kind {
        MediaKind::Audio => ("[sound:", "]"),
        MediaKind::Image => ("<img src=\"", "\""),
        MediaKind::Video => ("<source src=\"", "\""),
    };

    let mut refs = Vec::new();
    for (field, text) in [("Front", front), ("Back", back)] {
        for filename in delimited(text, open, close) {
            refs.push(MediaReference {
                filename: filename.to_string(),
                field,
            });
        }
    }
    refs
}

/// Non-empty substrings between `open` and the next `close`.
fn delimited<'a>(text: &'a str, open: &str, close: &str) -> Vec<&'a str> {
    let mut found = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(open) {
        rest = &rest[start + open.len()..];
        let Some(end) = rest.find(close) else {
            break;
        };
        if end > 0 {
            found.push(&rest[..end]);
        }
        rest = &rest[end + close.len()..];
    }
    found
}
