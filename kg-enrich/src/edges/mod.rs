//! Edge types for the knowledge graph.
//!
//! - [`triple::Triple`]: subject/predicate/object facts between entities

pub mod triple;

pub use triple::Triple;
