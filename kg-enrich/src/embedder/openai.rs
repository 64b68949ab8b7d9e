//! OpenAI embedding client implementation.
//!
//! Wraps [`async_openai`] to provide [`EmbedderClient`] for the OpenAI
//! Embeddings API, with chunked batch support and exponential-backoff retry.

use async_openai::{
    config::OpenAIConfig, error::OpenAIError, types::CreateEmbeddingRequestArgs, Client,
};
use backoff::{future::retry, ExponentialBackoffBuilder};
use std::time::Duration;

use crate::embedder::{EmbedderClient, Embedding};
use crate::errors::{EnrichError, ModelCallError, Result};

/// Default embedding model name.
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// Maximum number of inputs per OpenAI embeddings API call.
const BATCH_CHUNK_SIZE: usize = 2048;

/// Embedding dimension for a model name; 1536 for unrecognised models.
fn model_dim(model: &str) -> usize {
    match model {
        "text-embedding-3-large" => 3072,
        _ => 1536,
    }
}

/// Network-level failures are transient, everything else is permanent.
fn classify_error(err: OpenAIError) -> backoff::Error<ModelCallError> {
    let transient = matches!(&err, OpenAIError::Reqwest(e) if e.is_timeout() || e.is_connect());
    let err = ModelCallError::Embedding(err.to_string());
    if transient {
        backoff::Error::transient(err)
    } else {
        backoff::Error::permanent(err)
    }
}

/// OpenAI embedding client that implements [`EmbedderClient`].
pub struct OpenAiEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
    dim: usize,
}

impl OpenAiEmbedder {
    /// Create a new embedder.
    ///
    /// # Arguments
    /// * `api_key` – OpenAI API key (`sk-…`).
    /// * `model`   – Embedding model name (e.g. [`DEFAULT_MODEL`]).
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key.into());
        Self::with_config(config, model)
    }

    /// Create an embedder for an OpenAI-compatible endpoint at `base_url`.
    pub fn with_base_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key.into())
            .with_api_base(base_url.into());
        Self::with_config(config, model)
    }

    fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            client: Client::with_config(config),
            dim: model_dim(&model),
            model,
        }
    }

    /// Issue a single embeddings API call for up to [`BATCH_CHUNK_SIZE`] texts.
    ///
    /// Retries on transient network failures with exponential back-off
    /// (initial 500 ms, cap 10 s, total budget 60 s).
    async fn embed_chunk(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(500))
            .with_max_interval(Duration::from_secs(10))
            .with_max_elapsed_time(Some(Duration::from_secs(60)))
            .build();

        let input: Vec<String> = texts.iter().map(|s| (*s).to_owned()).collect();
        let model = self.model.clone();
        let client = self.client.clone();

        let embeddings = retry(policy, move || {
            let input = input.clone();
            let model = model.clone();
            let client = client.clone();
            async move {
                let request = CreateEmbeddingRequestArgs::default()
                    .model(model.as_str())
                    .input(input)
                    .build()
                    .map_err(|e| backoff::Error::permanent(ModelCallError::Embedding(e.to_string())))?;

                let response = client
                    .embeddings()
                    .create(request)
                    .await
                    .map_err(classify_error)?;

                let mut data = response.data;
                data.sort_by_key(|item| item.index);
                let embeddings: Vec<Embedding> = data.into_iter().map(|item| item.embedding).collect();
                Ok::<_, backoff::Error<ModelCallError>>(embeddings)
            }
        })
        .await
        .map_err(EnrichError::ModelCall)?;

        if embeddings.len() != texts.len() {
            return Err(ModelCallError::EmbeddingCount {
                expected: texts.len(),
                actual: embeddings.len(),
            }
            .into());
        }
        Ok(embeddings)
    }
}

impl EmbedderClient for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let mut embeddings = self.embed_chunk(&[text]).await?;
        embeddings
            .pop()
            .ok_or(EnrichError::ModelCall(ModelCallError::EmptyResponse))
    }

    /// Embed multiple texts, split into chunks of at most
    /// [`BATCH_CHUNK_SIZE`] items to respect OpenAI's per-call limits.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let mut result = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_CHUNK_SIZE) {
            result.extend(self.embed_chunk(chunk).await?);
        }
        Ok(result)
    }

    fn dim(&self) -> usize {
        self.dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn make_response(count: usize, dim: usize) -> serde_json::Value {
        let data: Vec<serde_json::Value> = (0..count)
            .map(|i| {
                serde_json::json!({
                    "object": "embedding",
                    "index": i,
                    "embedding": vec![0.1_f32 * (i as f32 + 1.0); dim],
                })
            })
            .collect();
        serde_json::json!({
            "object": "list",
            "data": data,
            "model": DEFAULT_MODEL,
            "usage": { "prompt_tokens": 8, "total_tokens": 8 },
        })
    }

    async fn mount_ok(server: &MockServer, count: usize, dim: usize) {
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(make_response(count, dim)))
            .mount(server)
            .await;
    }

    fn embedder(server: &MockServer) -> OpenAiEmbedder {
        OpenAiEmbedder::with_base_url("sk-test", DEFAULT_MODEL, server.uri())
    }

    #[test]
    fn dim_follows_model_table() {
        assert_eq!(OpenAiEmbedder::new("key", "text-embedding-3-small").dim(), 1536);
        assert_eq!(OpenAiEmbedder::new("key", "text-embedding-3-large").dim(), 3072);
        assert_eq!(OpenAiEmbedder::new("key", "some-future-model").dim(), 1536);
    }

    #[tokio::test]
    async fn embed_returns_vector_of_correct_length() {
        let server = MockServer::start().await;
        mount_ok(&server, 1, 4).await;

        let embedding = embedder(&server).embed("Alice works at Acme.").await.unwrap();
        assert_eq!(embedding.len(), 4);
        assert!((embedding[0] - 0.1).abs() < 1e-5);
    }

    #[tokio::test]
    async fn embed_batch_preserves_input_order() {
        let server = MockServer::start().await;
        mount_ok(&server, 3, 2).await;

        let embeddings = embedder(&server)
            .embed_batch(&["alpha", "beta", "gamma"])
            .await
            .unwrap();
        assert_eq!(embeddings.len(), 3);
        assert!(embeddings[0][0] < embeddings[1][0]);
        assert!(embeddings[1][0] < embeddings[2][0]);
    }

    #[tokio::test]
    async fn embed_batch_empty_slice_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(make_response(0, 2)))
            .expect(0)
            .mount(&server)
            .await;

        let embeddings = embedder(&server).embed_batch(&[]).await.unwrap();
        assert!(embeddings.is_empty());
    }

    #[tokio::test]
    async fn short_response_is_count_mismatch() {
        let server = MockServer::start().await;
        mount_ok(&server, 1, 2).await;

        let err = embedder(&server).embed_batch(&["a", "b"]).await.unwrap_err();
        assert!(matches!(
            err,
            EnrichError::ModelCall(ModelCallError::EmbeddingCount { expected: 2, actual: 1 })
        ));
    }

    #[tokio::test]
    async fn api_error_maps_to_embedding_variant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {
                    "message": "Incorrect API key provided.",
                    "type": "invalid_request_error",
                    "param": null,
                    "code": "invalid_api_key",
                }
            })))
            .mount(&server)
            .await;

        let err = embedder(&server).embed("test").await.unwrap_err();
        assert!(matches!(err, EnrichError::ModelCall(ModelCallError::Embedding(_))));
    }
}
