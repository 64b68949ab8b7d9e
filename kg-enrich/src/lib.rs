//! # kg-enrich
//!
//! Entity description enrichment for extracted knowledge graphs.
//!
//! Every entity produced by extraction is paired with the triples of its node
//! record, summarized by an LLM and embedded, then written back to the graph
//! store in a single batch.
//!
//! ## Architecture
//!
//! - **Entity stream**: lazy `(entity, triples)` pairs from the graph provider
//! - **Bounded fan-out**: at most `concurrency_limit` entities in flight
//! - **Cache gate**: described entities are reused by `{name}_{category}`
//! - **Barrier then upsert**: nothing is emitted before the batch is persisted

pub mod edges;
pub mod errors;
pub mod graph;
pub mod nodes;
pub mod types;

pub mod driver;
pub mod embedder;
pub mod llm_client;

pub mod prompts;

pub mod pipeline;
pub mod utils;

pub use errors::{EnrichError, ModelCallError, Result};
pub use pipeline::DescriptionEnricher;
