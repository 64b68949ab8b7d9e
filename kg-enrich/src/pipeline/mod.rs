//! Description enrichment pipeline.
//!
//! The stages in order:
//! 1. **Extract**: flatten the entity map into `(entity, triples)` pairs
//! 2. **Assemble**: render triples and pack a shuffled subset into a budget
//! 3. **Describe**: skip, hit cache, or summarize and embed each entity
//! 4. **Persist**: one bulk upsert once every entity has been handled
//! 5. **Emit**: yield the upserted entities

pub mod context;
pub mod description;
pub mod extraction;

pub use context::{assemble_context, render_triples};
pub use description::{DescriptionEnricher, EnrichmentOutput, EnrichmentStats, EntityOutcome};
pub use extraction::{entity_stream, extract_entities};
