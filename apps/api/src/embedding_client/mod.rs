/// Embedding client — the single point of entry for all embedding calls.
///
/// ARCHITECTURAL RULE: No other module may call the embedding API directly.
/// Retrieval code talks to `embedder::TextEmbedder`; the Gemini transport
/// lives behind `EmbeddingOracle`.
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod embedder;
#[cfg(test)]
pub mod mock_oracle;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Dimensionality of `text-embedding-004`; also the size of substituted zero vectors.
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 768;
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The model name is unknown to the service or cannot embed content.
    /// Recoverable: the embedder moves on to the next configured model.
    #[error("embedding model '{model}' is not supported: {message}")]
    ModelUnsupported { model: String, message: String },

    /// Authentication, quota, transport or malformed-response failure.
    #[error("embedding service failure (model {model}): {message}")]
    ServiceFailure { model: String, message: String },

    #[error("all embedding models failed (tried: {}): {last_error}", .attempted.join(", "))]
    ModelsExhausted {
        attempted: Vec<String>,
        last_error: String,
    },

    #[error("no embedding models configured")]
    NoModelsConfigured,
}

impl EmbeddingError {
    pub fn is_model_unsupported(&self) -> bool {
        matches!(self, EmbeddingError::ModelUnsupported { .. })
    }
}

/// A fixed-length embedding vector as returned by the oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn zeros(dimension: usize) -> Self {
        Self {
            values: vec![0.0; dimension],
        }
    }

    pub fn dimensions(&self) -> usize {
        self.values.len()
    }

    /// True for the degenerate vectors substituted after a failed embedding.
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }
}

/// The remote embedding service, addressed one model at a time.
#[async_trait]
pub trait EmbeddingOracle: Send + Sync {
    async fn embed_with_model(&self, model: &str, text: &str) -> Result<Embedding, EmbeddingError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini embedContent transport
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct EmbedContentRequest<'a> {
    model: String,
    content: RequestContent<'a>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: Option<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// Gemini `embedContent` client. Stateless apart from the pooled HTTP client.
#[derive(Clone)]
pub struct GeminiEmbeddingClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiEmbeddingClient {
    pub fn new(api_key: String, base_url: String) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| EmbeddingError::ServiceFailure {
                model: String::new(),
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:embedContent", self.base_url, model)
    }
}

#[async_trait]
impl EmbeddingOracle for GeminiEmbeddingClient {
    async fn embed_with_model(&self, model: &str, text: &str) -> Result<Embedding, EmbeddingError> {
        let request_body = build_request(model, text);

        let response = self
            .client
            .post(self.endpoint(model))
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body)
            .send()
            .await
            .map_err(|e| EmbeddingError::ServiceFailure {
                model: model.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| read_failure(model, status, &e))?;

        if !status.is_success() {
            return Err(classify_failure(model, status, &body));
        }

        let embedding = parse_embedding(model, &body)?;
        debug!(model, dimensions = embedding.dimensions(), "embedding call succeeded");
        Ok(embedding)
    }
}

fn build_request<'a>(model: &str, text: &'a str) -> EmbedContentRequest<'a> {
    EmbedContentRequest {
        model: format!("models/{model}"),
        content: RequestContent {
            parts: vec![RequestPart { text }],
        },
    }
}

/// Maps a non-success response to either a recoverable "model unsupported"
/// condition or a terminal service failure.
fn classify_failure(model: &str, status: StatusCode, body: &str) -> EmbeddingError {
    let message = serde_json::from_str::<GeminiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());

    let lowered = message.to_lowercase();
    let mentions_model_gap = lowered.contains("not found") || lowered.contains("not supported");

    if status == StatusCode::NOT_FOUND || (status == StatusCode::BAD_REQUEST && mentions_model_gap)
    {
        EmbeddingError::ModelUnsupported {
            model: model.to_string(),
            message,
        }
    } else {
        EmbeddingError::ServiceFailure {
            model: model.to_string(),
            message: format!("HTTP {}: {}", status.as_u16(), message),
        }
    }
}

fn read_failure(model: &str, status: StatusCode, error: &dyn std::fmt::Display) -> EmbeddingError {
    EmbeddingError::ServiceFailure {
        model: model.to_string(),
        message: format!(
            "failed to read response body (HTTP {}): {error}",
            status.as_u16()
        ),
    }
}

fn parse_embedding(model: &str, body: &str) -> Result<Embedding, EmbeddingError> {
    let malformed = |message: String| EmbeddingError::ServiceFailure {
        model: model.to_string(),
        message,
    };

    let parsed: EmbedContentResponse = serde_json::from_str(body)
        .map_err(|e| malformed(format!("malformed embedding response: {e}")))?;

    match parsed.embedding {
        Some(ContentEmbedding { values }) if !values.is_empty() => Ok(Embedding::new(values)),
        _ => Err(malformed("embedding response contained no values".to_string())),
    }
}
