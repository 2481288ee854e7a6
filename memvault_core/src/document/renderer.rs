//! Turns a [`ParsedMemory`] into a batch of document edits.

use serde::{Deserialize, Serialize};

use super::edit::{DocumentEdit, NamedStyle, doc_len};
use crate::memory::{Entity, ParsedMemory, Relation};

/// First writable position in an empty document.
pub const BODY_START: usize = 1;

pub const DEFAULT_TITLE: &str = "Claude 메모리 백업";

const ENTITY_HEADER: &str = "=== 엔티티 ===\n\n";
const RELATION_HEADER: &str = "=== 관계 ===\n\n";

/// How the memory graph is laid out in the destination document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStrategy {
    /// Indented JSON of the whole graph as a single insertion
    Raw,
    /// Titled, sectioned plain-text layout
    #[default]
    Formatted,
}

#[derive(Debug, Clone)]
pub struct DocumentRenderer {
    strategy: RenderStrategy,
    title: String,
}

impl DocumentRenderer {
    pub fn new(strategy: RenderStrategy) -> Self {
        Self {
            strategy,
            title: DEFAULT_TITLE.to_string(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub const fn strategy(&self) -> RenderStrategy {
        self.strategy
    }

    pub fn render(&self, memory: &ParsedMemory) -> serde_json::Result<Vec<DocumentEdit>> {
        match self.strategy {
            RenderStrategy::Raw => render_raw(memory),
            RenderStrategy::Formatted => Ok(self.render_formatted(memory)),
        }
    }

    fn render_formatted(&self, memory: &ParsedMemory) -> Vec<DocumentEdit> {
        let mut batch = EditBatch::new();

        let title_start = batch.cursor();
        batch.insert(format!("{}\n\n", self.title));
        batch.style(
            title_start,
            title_start + doc_len(&self.title),
            NamedStyle::Heading1,
        );

        batch.insert(ENTITY_HEADER);
        for entity in &memory.entities {
            render_entity(&mut batch, entity);
        }

        batch.insert(RELATION_HEADER);
        for relation in &memory.relations {
            render_relation(&mut batch, relation);
        }

        batch.finish()
    }
}

fn render_raw(memory: &ParsedMemory) -> serde_json::Result<Vec<DocumentEdit>> {
    let text = serde_json::to_string_pretty(memory)?;
    Ok(vec![DocumentEdit::InsertText {
        index: BODY_START,
        text,
    }])
}

fn render_entity(batch: &mut EditBatch, entity: &Entity) {
    batch.insert(format!(
        "엔티티: {}\n유형: {}\n관찰:\n",
        entity.name(),
        entity.entity_type()
    ));
    for observation in entity.observations() {
        batch.insert(format!("- {observation}\n"));
    }
    batch.insert("\n");
}

fn render_relation(batch: &mut EditBatch, relation: &Relation) {
    batch.insert(format!(
        "{} -> {} -> {}\n",
        relation.source(),
        relation.relation_type(),
        relation.target()
    ));
}

/// Edit list with a running insertion cursor.
///
/// Every insertion lands exactly at the end of the text inserted before it.
struct EditBatch {
    edits: Vec<DocumentEdit>,
    cursor: usize,
}

impl EditBatch {
    const fn new() -> Self {
        Self {
            edits: Vec::new(),
            cursor: BODY_START,
        }
    }

    const fn cursor(&self) -> usize {
        self.cursor
    }

    fn insert(&mut self, text: impl Into<String>) {
        let text = text.into();
        let len = doc_len(&text);
        self.edits.push(DocumentEdit::InsertText {
            index: self.cursor,
            text,
        });
        self.cursor += len;
    }

    fn style(&mut self, start: usize, end: usize, style: NamedStyle) {
        self.edits
            .push(DocumentEdit::UpdateParagraphStyle { start, end, style });
    }

    fn finish(self) -> Vec<DocumentEdit> {
        self.edits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::edit::inserted_text;

    fn sample() -> ParsedMemory {
        ParsedMemory {
            entities: vec![Entity::new(
                "A",
                "T",
                vec!["x".to_string(), "y".to_string()],
            )],
            relations: Vec::new(),
        }
    }

    #[test]
    fn formatted_single_entity_layout() {
        let edits = DocumentRenderer::new(RenderStrategy::Formatted)
            .render(&sample())
            .unwrap();

        let expected = format!(
            "{DEFAULT_TITLE}\n\n=== 엔티티 ===\n\n엔티티: A\n유형: T\n관찰:\n- x\n- y\n\n=== 관계 ===\n\n"
        );
        assert_eq!(inserted_text(&edits), expected);

        let texts: Vec<_> = edits
            .iter()
            .filter_map(|e| match e {
                DocumentEdit::InsertText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(
            &texts[1..],
            [
                "=== 엔티티 ===\n\n",
                "엔티티: A\n유형: T\n관찰:\n",
                "- x\n",
                "- y\n",
                "\n",
                "=== 관계 ===\n\n",
            ]
        );
    }

    #[test]
    fn insertion_indices_are_cumulative() {
        let mut memory = sample();
        memory.relations.push(Relation::new("A", "likes", "B"));
        let edits = DocumentRenderer::new(RenderStrategy::Formatted)
            .render(&memory)
            .unwrap();

        let mut expected_index = BODY_START;
        for edit in &edits {
            if let DocumentEdit::InsertText { index, text } = edit {
                assert_eq!(*index, expected_index, "misplaced insert of {text:?}");
                expected_index += doc_len(text);
            }
        }
        assert!(inserted_text(&edits).ends_with("A -> likes -> B\n"));
    }

    #[test]
    fn title_style_covers_exactly_the_title() {
        let edits = DocumentRenderer::new(RenderStrategy::Formatted)
            .with_title("Backup")
            .render(&ParsedMemory::default())
            .unwrap();
        assert_eq!(
            edits[1],
            DocumentEdit::UpdateParagraphStyle {
                start: 1,
                end: 7,
                style: NamedStyle::Heading1,
            }
        );
    }

    #[test]
    fn empty_memory_renders_only_headers() {
        let edits = DocumentRenderer::new(RenderStrategy::Formatted)
            .with_title("T")
            .render(&ParsedMemory::default())
            .unwrap();
        assert_eq!(
            inserted_text(&edits),
            "T\n\n=== 엔티티 ===\n\n=== 관계 ===\n\n"
        );
    }

    #[test]
    fn raw_strategy_is_one_insert_at_body_start() {
        let memory = sample();
        let edits = DocumentRenderer::new(RenderStrategy::Raw)
            .render(&memory)
            .unwrap();
        assert_eq!(edits.len(), 1);
        let DocumentEdit::InsertText { index, text } = &edits[0] else {
            panic!("expected an insertion");
        };
        assert_eq!(*index, BODY_START);
        let back: ParsedMemory = serde_json::from_str(text).unwrap();
        assert_eq!(back, memory);
    }
}
