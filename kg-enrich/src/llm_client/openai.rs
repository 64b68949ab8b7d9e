//! OpenAI LLM client implementation.
//!
//! Uses `async-openai` for API calls, `moka` for response caching, and
//! `backoff` for exponential-backoff retry on rate limits / transient errors.

use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use moka::future::Cache;
use serde_json::json;
use tracing::{debug, warn};

use crate::errors::{EnrichError, ModelCallError, Result};

use super::{GenerationConfig, LlmClient, Message, Role};

// ── Cache configuration ───────────────────────────────────────────────────────

/// Configuration for the in-process response cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries held in memory.
    pub max_capacity: u64,
    /// How long each entry lives before eviction.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 1_000,
            ttl: Duration::from_secs(3_600),
        }
    }
}

// ── Client struct ─────────────────────────────────────────────────────────────

/// OpenAI chat-completions client implementing [`LlmClient`].
pub struct OpenAiClient {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    /// Used when [`GenerationConfig::model`] is `None`.
    model: String,
    /// Keyed by `md5(model + generation config + messages)` → response text.
    cache: Cache<String, String>,
}

impl OpenAiClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `api_key` – OpenAI secret key.
    /// * `model`   – Default model name (e.g. `"gpt-4o-mini"`).
    /// * `cache_config` – Cache capacity and TTL.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        cache_config: CacheConfig,
    ) -> Self {
        let config = async_openai::config::OpenAIConfig::new().with_api_key(api_key);
        Self::with_config(config, model, cache_config)
    }

    /// Create a client for an OpenAI-compatible endpoint at `base_url`.
    pub fn with_base_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        cache_config: CacheConfig,
    ) -> Self {
        let config = async_openai::config::OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);
        Self::with_config(config, model, cache_config)
    }

    fn with_config(
        config: async_openai::config::OpenAIConfig,
        model: impl Into<String>,
        cache_config: CacheConfig,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(cache_config.max_capacity)
            .time_to_live(cache_config.ttl)
            .build();

        Self {
            client: async_openai::Client::with_config(config),
            model: model.into(),
            cache,
        }
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn model_for<'a>(&'a self, config: &'a GenerationConfig) -> &'a str {
        config.model.as_deref().unwrap_or(&self.model)
    }

    fn cache_key(&self, messages: &[Message], config: &GenerationConfig) -> String {
        use md5::{Digest, Md5};
        let mut h = Md5::new();
        h.update(self.model_for(config).as_bytes());
        h.update(config.temperature.to_le_bytes());
        h.update(config.max_tokens.to_le_bytes());
        if let Some(top_p) = config.top_p {
            h.update(top_p.to_le_bytes());
        }
        for m in messages {
            h.update(role_str(m.role).as_bytes());
            h.update(m.content.as_bytes());
        }
        format!("{:x}", h.finalize())
    }

    /// Serialise our [`Message`] slice into the JSON array expected by the API.
    fn messages_to_json(messages: &[Message]) -> Vec<serde_json::Value> {
        messages
            .iter()
            .map(|m| {
                json!({
                    "role": role_str(m.role),
                    "content": m.content,
                })
            })
            .collect()
    }

    fn request_body(&self, messages: &[Message], config: &GenerationConfig) -> serde_json::Value {
        let mut request = json!({
            "model": self.model_for(config),
            "messages": Self::messages_to_json(messages),
            "temperature": config.temperature,
            "max_tokens": config.max_tokens,
        });
        if let Some(top_p) = config.top_p {
            request["top_p"] = json!(top_p);
        }
        request
    }

    /// Call the chat completions endpoint with exponential-backoff retry.
    ///
    /// Retries on [`ModelCallError::RateLimit`] and 5xx API errors.
    async fn call_with_retry(&self, request: serde_json::Value) -> Result<serde_json::Value> {
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(500))
            .with_max_interval(Duration::from_secs(60))
            .with_max_elapsed_time(Some(Duration::from_secs(300)))
            .build();

        let client = self.client.clone();
        backoff::future::retry(policy, move || {
            let client = client.clone();
            let request = request.clone();
            async move {
                let outcome: std::result::Result<
                    serde_json::Value,
                    async_openai::error::OpenAIError,
                > = client.chat().create_byot(request).await;

                outcome.map_err(|e| {
                    let err = map_openai_error(e);
                    match &err {
                        ModelCallError::RateLimit => {
                            warn!("OpenAI rate limit hit, retrying with backoff");
                            backoff::Error::transient(err)
                        }
                        ModelCallError::Api { status, .. } if *status >= 500 => {
                            warn!(status, "OpenAI server error, retrying");
                            backoff::Error::transient(err)
                        }
                        _ => backoff::Error::permanent(err),
                    }
                })
            }
        })
        .await
        .map_err(EnrichError::ModelCall)
    }

    /// Extract the assistant message text from a chat-completions response.
    fn extract_content(response: &serde_json::Value) -> Result<String> {
        let choice = &response["choices"][0];
        if choice["message"]["refusal"].is_string() {
            return Err(ModelCallError::Refusal.into());
        }
        choice["message"]["content"]
            .as_str()
            .map(ToOwned::to_owned)
            .ok_or(EnrichError::ModelCall(ModelCallError::EmptyResponse))
    }
}

// ── LlmClient implementation ──────────────────────────────────────────────────

impl LlmClient for OpenAiClient {
    async fn generate(&self, messages: &[Message], config: &GenerationConfig) -> Result<String> {
        let key = self.cache_key(messages, config);

        if let Some(cached) = self.cache.get(&key).await {
            debug!("LLM cache hit");
            return Ok(cached);
        }

        let request = self.request_body(messages, config);
        let response = self.call_with_retry(request).await?;
        let content = Self::extract_content(&response)?;

        self.cache.insert(key, content.clone()).await;

        Ok(content)
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn role_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

/// Map an [`async_openai::error::OpenAIError`] to our [`ModelCallError`].
fn map_openai_error(err: async_openai::error::OpenAIError) -> ModelCallError {
    use async_openai::error::OpenAIError;

    match err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or_default();
            let kind = api_err.r#type.as_deref().unwrap_or_default();
            match (code, kind) {
                ("invalid_api_key", _) | (_, "authentication_error") => {
                    ModelCallError::Authentication
                }
                ("rate_limit_exceeded", _) => ModelCallError::RateLimit,
                ("server_error", _) | (_, "server_error") => ModelCallError::Api {
                    status: 500,
                    message: api_err.message,
                },
                _ => ModelCallError::Api {
                    status: 0,
                    message: api_err.message,
                },
            }
        }
        OpenAIError::Reqwest(e) => ModelCallError::Api {
            status: e.status().map(|s| s.as_u16()).unwrap_or(0),
            message: e.to_string(),
        },
        other => ModelCallError::Api {
            status: 0,
            message: other.to_string(),
        },
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
