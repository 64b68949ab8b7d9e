//! Entity: a named, categorized node extracted from documents.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A knowledge-graph entity (person, place, concept) with its description.
///
/// `(name, category)` is the logical identity used for cache lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// Vector for `description`; a non-empty value marks the entity as enriched.
    #[serde(default)]
    pub description_embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub document_id: Option<Uuid>,
    #[serde(default)]
    pub extraction_ids: Vec<Uuid>,
    #[serde(default)]
    pub community_numbers: Option<Vec<String>>,
    #[serde(default)]
    pub attributes: Option<serde_json::Value>,
}

impl Entity {
    /// Create an entity with no embedding and no provenance.
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            description: description.into(),
            description_embedding: None,
            id: None,
            document_id: None,
            extraction_ids: Vec::new(),
            community_numbers: None,
            attributes: None,
        }
    }

    /// Attach a description embedding.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.description_embedding = Some(embedding);
        self
    }

    /// True when the entity already carries a non-empty description embedding.
    pub fn is_described(&self) -> bool {
        self.description_embedding
            .as_ref()
            .is_some_and(|e| !e.is_empty())
    }

    /// Key under which a described copy of this entity is cached.
    pub fn cache_key(&self) -> String {
        format!("{}_{}", self.name, self.category)
    }
}
