use serde::{Deserialize, Serialize};

/// Named paragraph styles understood by the document API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NamedStyle {
    Title,
    Heading1,
    Heading2,
    NormalText,
}

impl NamedStyle {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "TITLE",
            Self::Heading1 => "HEADING_1",
            Self::Heading2 => "HEADING_2",
            Self::NormalText => "NORMAL_TEXT",
        }
    }
}

/// One step of a document edit batch.
///
/// Indices are document positions in UTF-16 code units. Position 0 is the
/// document start marker; body text begins at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEdit {
    InsertText { index: usize, text: String },
    UpdateParagraphStyle {
        start: usize,
        end: usize,
        style: NamedStyle,
    },
    DeleteContentRange { start: usize, end: usize },
}

/// Length of `text` in document index units.
#[must_use]
pub fn doc_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Concatenation of every inserted text in batch order.
#[must_use]
pub fn inserted_text(edits: &[DocumentEdit]) -> String {
    edits
        .iter()
        .filter_map(|edit| match edit {
            DocumentEdit::InsertText { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}
