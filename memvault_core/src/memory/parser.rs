//! Line-oriented reader for the memory graph file.
//!
//! Each non-blank line holds one JSON object tagged with `"type"`. Parsing is
//! best-effort: a bad line is reported and skipped, the rest still loads.

use serde_json::Value;
use tracing::{debug, warn};

use super::types::{Entity, ParsedMemory, Relation};
use crate::error::MalformedRecord;

const ENTITY_TAG: &str = "entity";
const RELATION_TAG: &str = "relation";

/// Parse the file contents, logging and discarding malformed lines.
#[must_use]
pub fn parse(text: &str) -> ParsedMemory {
    parse_with_warnings(text).0
}

/// Parse the file contents and also return one [`MalformedRecord`] per skipped line.
#[must_use]
pub fn parse_with_warnings(text: &str) -> (ParsedMemory, Vec<MalformedRecord>) {
    let mut memory = ParsedMemory::default();
    let mut warnings = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Err(reason) = classify(trimmed, &mut memory) {
            warn!("Skipping malformed record on line {line_no}: {reason}");
            warnings.push(MalformedRecord {
                line: line_no,
                reason,
            });
        }
    }

    debug!(
        "Parsed {} entities, {} relations ({} malformed lines)",
        memory.entities.len(),
        memory.relations.len(),
        warnings.len()
    );
    (memory, warnings)
}

fn classify(line: &str, memory: &mut ParsedMemory) -> Result<(), String> {
    let value: Value = serde_json::from_str(line).map_err(|e| e.to_string())?;

    match value.get("type").and_then(Value::as_str) {
        Some(ENTITY_TAG) => {
            let entity: Entity = serde_json::from_value(value).map_err(|e| e.to_string())?;
            memory.entities.push(entity);
        }
        Some(RELATION_TAG) => {
            let relation: Relation = serde_json::from_value(value).map_err(|e| e.to_string())?;
            memory.relations.push(relation);
        }
        other => debug!("Dropping record with type {other:?}"),
    }
    Ok(())
}
