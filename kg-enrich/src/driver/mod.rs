//! Graph provider abstraction.
//!
//! Defines the [`GraphDriver`] trait the enrichment pipeline reads entities
//! from and writes enriched entities back to, plus an in-process
//! implementation.

pub mod memory;

use crate::errors::Result;
use crate::graph::EntityMap;
use crate::nodes::Entity;

/// Cache namespace holding entities that already have a generated description.
pub const ENTITY_DESCRIPTION_NAMESPACE: &str = "entities_with_description";

/// Trait representing a graph storage backend.
///
/// Implementations must tolerate concurrent `retrieve_cache` calls; the
/// pipeline issues at most one `upsert_entities` per run.
#[allow(async_fn_in_trait)]
pub trait GraphDriver: Send + Sync {
    /// Snapshot of extracted entities and triples, grouped by node key.
    async fn get_entity_map(&self) -> Result<EntityMap>;

    /// Look up a cached entity by namespace and key.
    async fn retrieve_cache(&self, namespace: &str, key: &str) -> Result<Option<Entity>>;

    /// Insert or update `entities` in one batch.
    ///
    /// When `with_embeddings` is false the description embeddings are not
    /// persisted.
    async fn upsert_entities(&self, entities: &[Entity], with_embeddings: bool) -> Result<()>;
}
