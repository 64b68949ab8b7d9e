//! Node types for the knowledge graph.
//!
//! - [`entity::Entity`]: named, categorized entities produced by extraction

pub mod entity;

pub use entity::Entity;
