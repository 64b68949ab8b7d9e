//! In-process graph driver.
//!
//! Holds the entity map, the entity cache and the persisted entities in
//! memory. Every entity upserted with a non-empty embedding is written through
//! to [`ENTITY_DESCRIPTION_NAMESPACE`], so a second enrichment pass over the
//! same graph is served from cache.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::errors::Result;
use crate::graph::EntityMap;
use crate::nodes::Entity;

use super::{GraphDriver, ENTITY_DESCRIPTION_NAMESPACE};

/// [`GraphDriver`] backed by in-memory maps.
///
/// Thread-safe via `RwLock` and `DashMap`. Nothing is persisted across
/// process restarts.
#[derive(Default)]
pub struct MemoryGraphDriver {
    entity_map: RwLock<EntityMap>,
    /// `(namespace, key)` → cached entity.
    cache: DashMap<(String, String), Entity>,
    /// Cache key (`{name}_{category}`) → last upserted entity.
    entities: DashMap<String, Entity>,
    upserts: AtomicUsize,
}

impl MemoryGraphDriver {
    pub fn new(entity_map: EntityMap) -> Self {
        Self {
            entity_map: RwLock::new(entity_map),
            ..Default::default()
        }
    }

    /// Build a driver from a JSON object of `key -> {entities, triples}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let entity_map: EntityMap = serde_json::from_str(json)?;
        Ok(Self::new(entity_map))
    }

    /// Build a driver from a JSON file (see [`Self::from_json_str`]).
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_json_str(&raw)
    }

    /// Replace the entity map served by [`GraphDriver::get_entity_map`].
    pub async fn set_entity_map(&self, entity_map: EntityMap) {
        *self.entity_map.write().await = entity_map;
    }

    /// Seed the cache directly.
    pub fn insert_cache(&self, namespace: &str, key: &str, entity: Entity) {
        self.cache
            .insert((namespace.to_string(), key.to_string()), entity);
    }

    /// Entity last upserted under `(name, category)`.
    pub fn stored_entity(&self, name: &str, category: &str) -> Option<Entity> {
        self.entities
            .get(&format!("{name}_{category}"))
            .map(|e| e.value().clone())
    }

    /// All upserted entities, in no particular order.
    pub fn stored_entities(&self) -> Vec<Entity> {
        self.entities.iter().map(|e| e.value().clone()).collect()
    }

    /// Number of `upsert_entities` calls served so far.
    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }
}

impl GraphDriver for MemoryGraphDriver {
    async fn get_entity_map(&self) -> Result<EntityMap> {
        Ok(self.entity_map.read().await.clone())
    }

    async fn retrieve_cache(&self, namespace: &str, key: &str) -> Result<Option<Entity>> {
        Ok(self
            .cache
            .get(&(namespace.to_string(), key.to_string()))
            .map(|e| e.value().clone()))
    }

    async fn upsert_entities(&self, entities: &[Entity], with_embeddings: bool) -> Result<()> {
        for entity in entities {
            let mut stored = entity.clone();
            if !with_embeddings {
                stored.description_embedding = None;
            }
            if stored.is_described() {
                self.insert_cache(ENTITY_DESCRIPTION_NAMESPACE, &stored.cache_key(), stored.clone());
            }
            self.entities.insert(stored.cache_key(), stored);
        }
        self.upserts.fetch_add(1, Ordering::SeqCst);
        debug!(count = entities.len(), with_embeddings, "upserted entities");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edges::Triple;
    use crate::graph::NodeRecord;
    use std::io::Write;

    fn sample_map() -> EntityMap {
        let mut map = EntityMap::new();
        map.insert(
            "doc-1".to_string(),
            NodeRecord::new(
                vec![Entity::new("Alice", "Person", "An engineer.")],
                vec![Triple::new("Alice", "WORKS_AT", "Acme", "Alice works at Acme.")],
            ),
        );
        map
    }

    #[tokio::test]
    async fn get_entity_map_returns_snapshot() {
        let driver = MemoryGraphDriver::new(sample_map());
        let map = driver.get_entity_map().await.unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("doc-1"));

        driver.set_entity_map(EntityMap::new()).await;
        assert!(driver.get_entity_map().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn retrieve_cache_misses_on_unknown_key() {
        let driver = MemoryGraphDriver::default();
        let hit = driver
            .retrieve_cache(ENTITY_DESCRIPTION_NAMESPACE, "Alice_Person")
            .await
            .unwrap();
        assert!(hit.is_none());
    }

    #[tokio::test]
    async fn cache_is_partitioned_by_namespace() {
        let driver = MemoryGraphDriver::default();
        driver.insert_cache("other", "Alice_Person", Entity::new("Alice", "Person", "x"));

        let hit = driver
            .retrieve_cache(ENTITY_DESCRIPTION_NAMESPACE, "Alice_Person")
            .await
            .unwrap();
        assert!(hit.is_none());
        assert!(driver.retrieve_cache("other", "Alice_Person").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn upsert_writes_through_described_entities() {
        let driver = MemoryGraphDriver::default();
        let described = Entity::new("Alice", "Person", "summary").with_embedding(vec![1.0, 0.0]);
        let bare = Entity::new("Bob", "Person", "no embedding");

        driver
            .upsert_entities(&[described.clone(), bare], true)
            .await
            .unwrap();

        assert_eq!(driver.upsert_count(), 1);
        assert_eq!(driver.stored_entities().len(), 2);

        let cached = driver
            .retrieve_cache(ENTITY_DESCRIPTION_NAMESPACE, "Alice_Person")
            .await
            .unwrap();
        assert_eq!(cached, Some(described));
        assert!(driver
            .retrieve_cache(ENTITY_DESCRIPTION_NAMESPACE, "Bob_Person")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn upsert_without_embeddings_strips_vectors() {
        let driver = MemoryGraphDriver::default();
        let described = Entity::new("Alice", "Person", "summary").with_embedding(vec![1.0]);

        driver.upsert_entities(&[described], false).await.unwrap();

        let stored = driver.stored_entity("Alice", "Person").unwrap();
        assert!(stored.description_embedding.is_none());
        assert!(driver
            .retrieve_cache(ENTITY_DESCRIPTION_NAMESPACE, "Alice_Person")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn from_json_file_loads_entity_map() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"doc-1": {{"entities": [{{"name": "Alice", "category": "Person"}}], "triples": []}}}}"#
        )
        .unwrap();

        let driver = MemoryGraphDriver::from_json_file(file.path()).await.unwrap();
        let map = driver.get_entity_map().await.unwrap();
        assert_eq!(map["doc-1"].entities.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn from_json_str_rejects_invalid_json() {
        let result = MemoryGraphDriver::from_json_str("not json");
        assert!(matches!(result, Err(crate::EnrichError::Serialization(_))));
    }
}
