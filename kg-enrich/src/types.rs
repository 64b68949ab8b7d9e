//! Shared configuration types.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::embedder::openai::{OpenAiEmbedder, DEFAULT_MODEL as DEFAULT_EMBEDDING_MODEL};
use crate::errors::{EnrichError, Result};
use crate::llm_client::openai::{CacheConfig, OpenAiClient};
use crate::llm_client::GenerationConfig;

/// Default character budget for the triple context of one entity.
pub const DEFAULT_MAX_DESCRIPTION_INPUT_LENGTH: usize = 65_536;

/// Default number of entities enriched concurrently.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 64;

const DEFAULT_MODEL_NAME: &str = "gpt-4o-mini";

/// Knobs consumed by [`crate::pipeline::DescriptionEnricher`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct EnrichmentSettings {
    /// Character budget for the assembled triple context.
    pub max_description_input_length: usize,

    /// Maximum number of entities in flight at once (must be > 0).
    #[validate(range(min = 1))]
    pub concurrency_limit: usize,

    /// Sampling parameters for the summarization call.
    pub generation_config: GenerationConfig,

    /// Send the truncated context block to the model instead of the full
    /// shuffled triple list.
    pub truncate_prompt_context: bool,

    /// Seed for triple shuffling; entropy-seeded when `None`.
    pub rng_seed: Option<u64>,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            max_description_input_length: DEFAULT_MAX_DESCRIPTION_INPUT_LENGTH,
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            generation_config: GenerationConfig::default(),
            truncate_prompt_context: false,
            rng_seed: None,
        }
    }
}

/// Central configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EnrichConfig {
    /// OpenAI API key.
    #[validate(length(min = 1))]
    pub openai_api_key: String,

    /// Base URL of an OpenAI-compatible API; the public endpoint when `None`.
    pub openai_base_url: Option<String>,

    /// Summarization model name.
    #[validate(length(min = 1))]
    pub model_name: String,

    /// Embedding model name.
    #[validate(length(min = 1))]
    pub embedding_model: String,

    #[validate(nested)]
    pub settings: EnrichmentSettings,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_base_url: None,
            model_name: DEFAULT_MODEL_NAME.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            settings: EnrichmentSettings::default(),
        }
    }
}

impl EnrichConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` first (non-fatal if `.env` is absent),
    /// then reads each variable from the process environment.
    /// `OPENAI_API_KEY` is required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| EnrichError::Validation("OPENAI_API_KEY is required".to_string()))?;

        let openai_base_url = std::env::var("OPENAI_BASE_URL").ok();

        let model_name =
            std::env::var("MODEL_NAME").unwrap_or_else(|_| DEFAULT_MODEL_NAME.to_string());

        let embedding_model = std::env::var("EMBEDDING_MODEL")
            .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string());

        let defaults = GenerationConfig::default();
        let generation_config = GenerationConfig {
            model: Some(model_name.clone()),
            temperature: parse_env("ENRICHMENT_TEMPERATURE", defaults.temperature)?,
            max_tokens: parse_env("ENRICHMENT_MAX_TOKENS", defaults.max_tokens)?,
            top_p: parse_env_opt("ENRICHMENT_TOP_P")?,
        };

        let settings = EnrichmentSettings {
            max_description_input_length: parse_env(
                "MAX_DESCRIPTION_INPUT_LENGTH",
                DEFAULT_MAX_DESCRIPTION_INPUT_LENGTH,
            )?,
            concurrency_limit: parse_env("ENRICHMENT_CONCURRENCY", DEFAULT_CONCURRENCY_LIMIT)?,
            generation_config,
            truncate_prompt_context: parse_env("ENRICHMENT_TRUNCATE_PROMPT", false)?,
            rng_seed: parse_env_opt("ENRICHMENT_RNG_SEED")?,
        };

        let config = Self {
            openai_api_key,
            openai_base_url,
            model_name,
            embedding_model,
            settings,
        };

        config
            .validate()
            .map_err(|e| EnrichError::Validation(e.to_string()))?;

        Ok(config)
    }

    /// Summarization client for this configuration.
    pub fn llm_client(&self) -> OpenAiClient {
        match &self.openai_base_url {
            Some(url) => OpenAiClient::with_base_url(
                self.openai_api_key.clone(),
                self.model_name.clone(),
                url.clone(),
                CacheConfig::default(),
            ),
            None => OpenAiClient::new(
                self.openai_api_key.clone(),
                self.model_name.clone(),
                CacheConfig::default(),
            ),
        }
    }

    /// Embedding client for this configuration.
    pub fn embedder(&self) -> OpenAiEmbedder {
        match &self.openai_base_url {
            Some(url) => OpenAiEmbedder::with_base_url(
                self.openai_api_key.clone(),
                self.embedding_model.clone(),
                url.clone(),
            ),
            None => OpenAiEmbedder::new(self.openai_api_key.clone(), self.embedding_model.clone()),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    Ok(parse_env_opt(name)?.unwrap_or(default))
}

fn parse_env_opt<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(val) => val
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| EnrichError::Validation(format!("{name} has an invalid value: {val:?}"))),
        Err(_) => Ok(None),
    }
}
