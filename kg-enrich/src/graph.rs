//! Graph containers handed from extraction to enrichment.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::edges::Triple;
use crate::nodes::Entity;

/// Entities and triples grouped under one key of the entity map.
///
/// Both fields are optional on the wire so that an incomplete record can be
/// loaded and reported, instead of silently defaulting to an empty list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(default)]
    pub entities: Option<Vec<Entity>>,
    #[serde(default)]
    pub triples: Option<Vec<Triple>>,
}

impl NodeRecord {
    pub fn new(entities: Vec<Entity>, triples: Vec<Triple>) -> Self {
        Self {
            entities: Some(entities),
            triples: Some(triples),
        }
    }
}

/// Grouping key → node record, as returned by the graph provider.
pub type EntityMap = HashMap<String, NodeRecord>;

/// One entity paired with every triple of its node record.
///
/// The triple set is shared between all entities of the same record.
#[derive(Debug, Clone)]
pub struct EntityTriples {
    pub entity: Entity,
    pub triples: Arc<[Triple]>,
}

impl EntityTriples {
    pub fn new(entity: Entity, triples: impl Into<Arc<[Triple]>>) -> Self {
        Self {
            entity,
            triples: triples.into(),
        }
    }
}
