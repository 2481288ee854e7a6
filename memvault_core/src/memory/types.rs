use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A named node of the memory graph.
///
/// Fields the backup does not interpret (including the `type` tag) are kept in
/// `extra`, and absent fields stay absent, so the record re-serializes unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "entityType", default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observations: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entity {
    pub fn new(
        name: impl Into<String>,
        entity_type: impl Into<String>,
        observations: Vec<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            entity_type: Some(entity_type.into()),
            observations: Some(observations),
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn entity_type(&self) -> &str {
        self.entity_type.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn observations(&self) -> &[String] {
        self.observations.as_deref().unwrap_or_default()
    }
}

/// A directed, labeled edge between two entity names.
///
/// Endpoints are not checked against the entity set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(rename = "relationType", default, skip_serializing_if = "Option::is_none")]
    pub relation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Relation {
    pub fn new(
        from: impl Into<String>,
        relation_type: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            from: Some(from.into()),
            relation_type: Some(relation_type.into()),
            to: Some(to.into()),
            extra: Map::new(),
        }
    }

    /// Name of the entity the edge starts at.
    #[must_use]
    pub fn source(&self) -> &str {
        self.from.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn relation_type(&self) -> &str {
        self.relation_type.as_deref().unwrap_or_default()
    }

    /// Name of the entity the edge points to.
    #[must_use]
    pub fn target(&self) -> &str {
        self.to.as_deref().unwrap_or_default()
    }
}

/// Entities and relations read from one snapshot of the source file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedMemory {
    pub entities: Vec<Entity>,
    pub relations: Vec<Relation>,
}

impl ParsedMemory {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relations.is_empty()
    }
}
