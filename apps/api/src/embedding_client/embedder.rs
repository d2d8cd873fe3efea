//! Embedder — model fallback over an `EmbeddingOracle`, plus sequential batching.
//!
//! The orchestrator only sees `Arc<dyn TextEmbedder>`, so a backend with a
//! native batch endpoint can replace `Embedder` without touching callers.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{
    Embedding, EmbeddingError, EmbeddingOracle, GeminiEmbeddingClient, DEFAULT_EMBEDDING_DIMENSION,
};

/// Construction-time settings for the embedder.
#[derive(Debug, Clone)]
pub struct EmbedderConfig {
    pub api_key: String,
    /// Tried in order; only `ModelUnsupported` moves on to the next entry.
    pub model_priority: Vec<String>,
    pub embedding_dimension: usize,
}

impl EmbedderConfig {
    pub fn new(api_key: String, model_priority: Vec<String>) -> Self {
        Self {
            api_key,
            model_priority,
            embedding_dimension: DEFAULT_EMBEDDING_DIMENSION,
        }
    }
}

/// What a batch does with a text whose embedding failed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BatchFailurePolicy {
    /// Substitute a zero vector. The chunk still takes part in ranking and
    /// scores 0 against any query. `dimension` is only used when no text in
    /// the batch was embedded successfully.
    ZeroVector { dimension: usize },
}

impl BatchFailurePolicy {
    /// Records a per-item failure and returns the stand-in embedding, sized to
    /// `observed_dimension` when the batch produced at least one real vector.
    pub fn degrade(
        &self,
        index: usize,
        text: &str,
        error: &EmbeddingError,
        observed_dimension: Option<usize>,
    ) -> Embedding {
        let preview: String = text.chars().take(50).collect();
        match self {
            BatchFailurePolicy::ZeroVector { dimension } => {
                warn!(
                    index,
                    %error,
                    "failed to embed text \"{preview}...\"; substituting zero vector"
                );
                Embedding::zeros(observed_dimension.unwrap_or(*dimension))
            }
        }
    }
}

/// Embedding seam used by the retrieval pipeline.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embeds a single text. Errors propagate to the caller.
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError>;

    /// Embeds every text, in order. Never fails as a whole: individual
    /// failures are replaced according to the embedder's failure policy.
    async fn embed_batch(&self, texts: &[&str]) -> Vec<Embedding>;
}

/// Gemini-style embedder: one remote call per text, with model fallback.
#[derive(Clone)]
pub struct Embedder {
    oracle: Arc<dyn EmbeddingOracle>,
    models: Vec<String>,
    policy: BatchFailurePolicy,
}

impl Embedder {
    pub fn new(oracle: Arc<dyn EmbeddingOracle>, config: &EmbedderConfig) -> Self {
        Self {
            oracle,
            models: config.model_priority.clone(),
            policy: BatchFailurePolicy::ZeroVector {
                dimension: config.embedding_dimension,
            },
        }
    }

    /// Builds an embedder backed by the Gemini `embedContent` endpoint.
    pub fn gemini(config: &EmbedderConfig, base_url: String) -> Result<Self, EmbeddingError> {
        let client = GeminiEmbeddingClient::new(config.api_key.clone(), base_url)?;
        Ok(Self::new(Arc::new(client), config))
    }
}

#[async_trait]
impl TextEmbedder for Embedder {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        if self.models.is_empty() {
            return Err(EmbeddingError::NoModelsConfigured);
        }

        let mut attempted = Vec::with_capacity(self.models.len());
        let mut last_error = None;

        for model in &self.models {
            attempted.push(model.clone());
            match self.oracle.embed_with_model(model, text).await {
                Ok(embedding) => return Ok(embedding),
                Err(e) if e.is_model_unsupported() => {
                    warn!(model = %model, error = %e, "embedding model unavailable, trying next");
                    last_error = Some(e);
                }
                // quota, auth and malformed responses are not model-specific
                Err(e) => return Err(e),
            }
        }

        Err(EmbeddingError::ModelsExhausted {
            attempted,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string()),
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Vec<Embedding> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await);
        }

        let observed_dimension = results
            .iter()
            .find_map(|r| r.as_ref().ok().map(Embedding::dimensions));

        let embeddings: Vec<Embedding> = results
            .into_iter()
            .zip(texts)
            .enumerate()
            .map(|(index, (result, text))| match result {
                Ok(embedding) => embedding,
                Err(e) => self.policy.degrade(index, text, &e, observed_dimension),
            })
            .collect();

        debug!(count = embeddings.len(), "batch embedding finished");
        embeddings
    }
}
