//! Entity stream producer.
//!
//! Flattens the provider's entity map into one `(entity, triples)` pair per
//! entity. Records are visited one at a time, so the flattened sequence never
//! exists in memory as a whole.

use std::sync::Arc;

use async_stream::try_stream;
use futures::Stream;

use crate::driver::GraphDriver;
use crate::edges::Triple;
use crate::errors::{EnrichError, Result};
use crate::graph::{EntityMap, EntityTriples, NodeRecord};

/// Lazily yield every entity of `entity_map` with its record's triples.
///
/// No filtering, deduplication or ordering beyond the map's iteration order.
/// A record missing its `entities` or `triples` field ends the stream with
/// [`EnrichError::MalformedGraph`].
pub fn entity_stream(entity_map: EntityMap) -> impl Stream<Item = Result<EntityTriples>> {
    try_stream! {
        for (key, record) in entity_map {
            let NodeRecord { entities, triples } = record;
            let entities = entities.ok_or_else(|| missing_field(&key, "entities"))?;
            let triples: Arc<[Triple]> = triples.ok_or_else(|| missing_field(&key, "triples"))?.into();

            for entity in entities {
                yield EntityTriples::new(entity, Arc::clone(&triples));
            }
        }
    }
}

/// Fetch the entity map from `graph` and stream its entities.
pub async fn extract_entities<G: GraphDriver>(
    graph: &G,
) -> Result<impl Stream<Item = Result<EntityTriples>>> {
    let entity_map = graph.get_entity_map().await?;
    Ok(entity_stream(entity_map))
}

fn missing_field(key: &str, field: &str) -> EnrichError {
    EnrichError::MalformedGraph(format!("node record `{key}` is missing `{field}`"))
}
