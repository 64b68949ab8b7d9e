//! Triple: a subject/predicate/object fact with its own description.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A relationship fact between two entities.
///
/// Triples are read-only during enrichment and have no identity beyond their
/// position when rendered into a summarization context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triple {
    /// Name of the source entity.
    pub subject: String,
    /// Relationship label (e.g. "WORKS_AT").
    pub predicate: String,
    /// Name of the target entity.
    pub object: String,
    /// Human-readable summary of the fact.
    #[serde(default)]
    pub description: String,
    /// Storage identifier, if the triple has been persisted.
    #[serde(default)]
    pub id: Option<i64>,
    /// Relevance weight assigned at extraction time.
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub document_id: Option<Uuid>,
    #[serde(default)]
    pub extraction_ids: Vec<Uuid>,
    /// Arbitrary JSON attributes.
    #[serde(default)]
    pub attributes: Option<serde_json::Value>,
}

impl Triple {
    /// Create a triple without provenance or weight.
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            description: description.into(),
            id: None,
            weight: None,
            document_id: None,
            extraction_ids: Vec::new(),
            attributes: None,
        }
    }
}
