//! Entity description enrichment.
//!
//! For every `(entity, triples)` pair the enricher either keeps the entity
//! (already embedded), reuses a cached description, or asks the LLM for a
//! summary and embeds it. All units finish before a single bulk upsert, and
//! entities are only emitted once that upsert succeeded.
//!
//! Per-entity model failures leave the entity as it was received and do not
//! affect siblings. A malformed graph, a failed upsert or cancellation fail
//! the whole run without emitting anything.

use std::sync::{Mutex, PoisonError};

use async_stream::try_stream;
use futures::{Stream, TryStreamExt};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::driver::{GraphDriver, ENTITY_DESCRIPTION_NAMESPACE};
use crate::edges::Triple;
use crate::embedder::{EmbedderClient, Embedding};
use crate::errors::{EnrichError, ModelCallError, Result};
use crate::graph::EntityTriples;
use crate::llm_client::LlmClient;
use crate::nodes::Entity;
use crate::pipeline::context::{assemble_context, render_triples};
use crate::pipeline::extraction::entity_stream;
use crate::prompts::summarize_entity::{self, TripleContext};
use crate::types::EnrichmentSettings;
use crate::utils::{cancellable, char_len, truncate_with_ellipsis};

/// How a single entity left the enricher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityOutcome {
    /// Already had an embedding; untouched.
    Skipped,
    /// Replaced by the cached described entity.
    CacheHit,
    /// Freshly summarized and embedded.
    Enriched,
    /// A model call failed; entity kept as received.
    Failed,
}

/// Per-run tally of [`EntityOutcome`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentStats {
    pub skipped: usize,
    pub cache_hits: usize,
    pub enriched: usize,
    pub failed: usize,
}

impl EnrichmentStats {
    fn record(&mut self, outcome: EntityOutcome) {
        match outcome {
            EntityOutcome::Skipped => self.skipped += 1,
            EntityOutcome::CacheHit => self.cache_hits += 1,
            EntityOutcome::Enriched => self.enriched += 1,
            EntityOutcome::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.skipped + self.cache_hits + self.enriched + self.failed
    }
}

/// Result of one completed and persisted enrichment run.
#[derive(Debug, Clone)]
pub struct EnrichmentOutput {
    /// Entities in completion order.
    pub entities: Vec<Entity>,
    pub stats: EnrichmentStats,
}

/// Summarizes and embeds entities, then persists them in one batch.
pub struct DescriptionEnricher<G, L, E> {
    graph: G,
    llm: L,
    embedder: E,
    settings: EnrichmentSettings,
    rng: Mutex<StdRng>,
}

impl<G, L, E> DescriptionEnricher<G, L, E>
where
    G: GraphDriver,
    L: LlmClient,
    E: EmbedderClient,
{
    /// Create an enricher, validating `settings`.
    pub fn new(graph: G, llm: L, embedder: E, settings: EnrichmentSettings) -> Result<Self> {
        settings
            .validate()
            .map_err(|e| EnrichError::Validation(e.to_string()))?;

        let rng = match settings.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            graph,
            llm,
            embedder,
            settings,
            rng: Mutex::new(rng),
        })
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn settings(&self) -> &EnrichmentSettings {
        &self.settings
    }

    /// Enrich every pair of `pairs`, then upsert the whole set once.
    ///
    /// Units are admitted as the producer yields pairs, with at most
    /// `concurrency_limit` in flight. The upsert is issued only after every
    /// unit has finished; it is not attempted if the producer fails or
    /// `cancel` fires first. An in-flight upsert is never interrupted.
    pub async fn enrich<S>(&self, pairs: S, cancel: &CancellationToken) -> Result<EnrichmentOutput>
    where
        S: Stream<Item = Result<EntityTriples>>,
    {
        let mut launched = 0usize;
        let processed: Vec<(Entity, EntityOutcome)> = cancellable(
            cancel,
            pairs
                .map_ok(|pair| {
                    launched += 1;
                    self.process_entity(pair, cancel)
                })
                .try_buffer_unordered(self.settings.concurrency_limit)
                .try_collect(),
        )
        .await?;

        let mut stats = EnrichmentStats::default();
        let mut entities = Vec::with_capacity(processed.len());
        for (entity, outcome) in processed {
            stats.record(outcome);
            entities.push(entity);
        }
        info!(
            launched,
            skipped = stats.skipped,
            cache_hits = stats.cache_hits,
            enriched = stats.enriched,
            failed = stats.failed,
            "entity descriptions complete"
        );

        if cancel.is_cancelled() {
            return Err(EnrichError::Cancelled);
        }
        self.graph.upsert_entities(&entities, true).await?;
        info!(count = entities.len(), "upserted described entities");

        Ok(EnrichmentOutput { entities, stats })
    }

    /// Stream form of [`Self::enrich`]: nothing is yielded until the upsert
    /// has succeeded, then each entity is yielded in completion order.
    pub fn run<'a, S>(
        &'a self,
        pairs: S,
        cancel: &'a CancellationToken,
    ) -> impl Stream<Item = Result<Entity>> + 'a
    where
        S: Stream<Item = Result<EntityTriples>> + 'a,
    {
        try_stream! {
            let output = self.enrich(pairs, cancel).await?;
            for entity in output.entities {
                yield entity;
            }
        }
    }

    /// Enrich every entity of the graph provider's entity map.
    pub fn describe_graph<'a>(
        &'a self,
        cancel: &'a CancellationToken,
    ) -> impl Stream<Item = Result<Entity>> + 'a {
        try_stream! {
            let entity_map = cancellable(cancel, self.graph.get_entity_map()).await?;
            let output = self.enrich(entity_stream(entity_map), cancel).await?;
            for entity in output.entities {
                yield entity;
            }
        }
    }

    /// One unit of work. Only cancellation is returned as an error; model
    /// failures are folded into [`EntityOutcome::Failed`].
    async fn process_entity(
        &self,
        pair: EntityTriples,
        cancel: &CancellationToken,
    ) -> Result<(Entity, EntityOutcome)> {
        let EntityTriples { mut entity, triples } = pair;

        if entity.is_described() {
            return Ok((entity, EntityOutcome::Skipped));
        }

        let key = entity.cache_key();
        match cancellable(
            cancel,
            self.graph.retrieve_cache(ENTITY_DESCRIPTION_NAMESPACE, &key),
        )
        .await
        {
            Ok(Some(cached)) => {
                info!(entity = %entity.name, "hit cache for entity");
                return Ok((cached, EntityOutcome::CacheHit));
            }
            Ok(None) => {}
            Err(EnrichError::Cancelled) => return Err(EnrichError::Cancelled),
            Err(e) => warn!(entity = %entity.name, error = %e, "cache lookup failed, treating as miss"),
        }

        match self.describe(&entity, &triples, cancel).await {
            Ok((description, embedding)) => {
                debug!(
                    entity = %entity.name,
                    summary = %truncate_with_ellipsis(&description, 80),
                    "described entity"
                );
                entity.description = description;
                entity.description_embedding = Some(embedding);
                Ok((entity, EntityOutcome::Enriched))
            }
            Err(e) if e.is_model_call() => {
                warn!(entity = %entity.name, error = %e, "failed to describe entity, keeping it as received");
                Ok((entity, EntityOutcome::Failed))
            }
            Err(e) => Err(e),
        }
    }

    /// Summarize `entity` from its triples and embed the summary.
    async fn describe(
        &self,
        entity: &Entity,
        triples: &[Triple],
        cancel: &CancellationToken,
    ) -> Result<(String, Embedding)> {
        let mut lines = render_triples(triples);
        let block = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            assemble_context(
                &mut lines,
                self.settings.max_description_input_length,
                &mut *rng,
            )
        };
        debug!(
            entity = %entity.name,
            triples = lines.len(),
            context_chars = char_len(&block),
            "assembled triple context"
        );

        let context = if self.settings.truncate_prompt_context {
            TripleContext::Block(&block)
        } else {
            TripleContext::Lines(&lines)
        };
        let messages = summarize_entity::build(entity, context);

        let description = cancellable(
            cancel,
            self.llm.generate(&messages, &self.settings.generation_config),
        )
        .await?;

        let mut embeddings =
            cancellable(cancel, self.embedder.embed_batch(&[description.as_str()])).await?;
        if embeddings.len() != 1 {
            return Err(ModelCallError::EmbeddingCount {
                expected: 1,
                actual: embeddings.len(),
            }
            .into());
        }
        let embedding = embeddings.remove(0);
        if embedding.is_empty() {
            return Err(ModelCallError::EmptyResponse.into());
        }

        Ok((description, embedding))
    }
}
