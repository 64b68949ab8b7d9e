//! Error types for kg-enrich.

/// Alias for Results returning [`EnrichError`].
pub type Result<T> = std::result::Result<T, EnrichError>;

/// Top-level error type for kg-enrich.
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    /// A node record in the entity map is structurally incomplete.
    #[error("Malformed graph: {0}")]
    MalformedGraph(String),

    #[error("Model call failed: {0}")]
    ModelCall(#[from] ModelCallError),

    /// Bulk upsert or cache read failure in the graph provider.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Enrichment cancelled")]
    Cancelled,
}

impl EnrichError {
    /// Whether this error is scoped to a single entity's model calls.
    ///
    /// Such failures are absorbed at the unit-of-work boundary; every other
    /// variant aborts the whole run.
    pub fn is_model_call(&self) -> bool {
        matches!(self, EnrichError::ModelCall(_))
    }
}

/// Summarization / embedding provider errors.
#[derive(Debug, thiserror::Error)]
pub enum ModelCallError {
    #[error("Rate limited")]
    RateLimit,

    #[error("Model refused to respond")]
    Refusal,

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Authentication failed")]
    Authentication,

    #[error("API error: HTTP {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Embedding count mismatch: expected {expected}, got {actual}")]
    EmbeddingCount { expected: usize, actual: usize },
}
