//! Deterministic in-process oracle for tests.
//!
//! Vectors are bag-of-words counts over a tiny vocabulary plus a constant bias
//! component, so any successfully embedded text is non-zero and texts sharing
//! vocabulary words score higher against each other.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{Embedding, EmbeddingError, EmbeddingOracle};

const VOCABULARY: [&str; 7] = ["python", "sql", "docker", "kubernetes", "pipeline", "acme", "rust"];
pub const MOCK_DIMENSION: usize = VOCABULARY.len() + 1;

#[derive(Debug, Clone, Copy)]
pub enum ScriptedFailure {
    Quota,
    Auth,
}

#[derive(Default)]
pub struct MockOracle {
    unsupported_models: Vec<String>,
    failing_models: Vec<(String, ScriptedFailure)>,
    failing_texts: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports `model` as not found.
    pub fn unsupported(mut self, model: &str) -> Self {
        self.unsupported_models.push(model.to_string());
        self
    }

    /// Fails every call to `model` with a non-recoverable error.
    pub fn failing(mut self, model: &str, failure: ScriptedFailure) -> Self {
        self.failing_models.push((model.to_string(), failure));
        self
    }

    /// Fails any text containing `marker` with a quota error, on every model.
    pub fn failing_text(mut self, marker: &str) -> Self {
        self.failing_texts.push(marker.to_string());
        self
    }

    /// Model names in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

pub fn bag_of_words(text: &str) -> Embedding {
    let mut values = vec![0.0_f32; MOCK_DIMENSION];
    for token in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        if let Some(i) = VOCABULARY.iter().position(|w| *w == token) {
            values[i] += 1.0;
        }
    }
    values[MOCK_DIMENSION - 1] = 1.0;
    Embedding::new(values)
}

#[async_trait]
impl EmbeddingOracle for MockOracle {
    async fn embed_with_model(&self, model: &str, text: &str) -> Result<Embedding, EmbeddingError> {
        self.calls.lock().unwrap().push(model.to_string());

        if self.unsupported_models.iter().any(|m| m == model) {
            return Err(EmbeddingError::ModelUnsupported {
                model: model.to_string(),
                message: format!("models/{model} is not found for API version v1beta"),
            });
        }

        if let Some((_, failure)) = self.failing_models.iter().find(|(m, _)| m == model) {
            let message = match failure {
                ScriptedFailure::Quota => "HTTP 429: quota exceeded",
                ScriptedFailure::Auth => "HTTP 403: API key not valid",
            };
            return Err(EmbeddingError::ServiceFailure {
                model: model.to_string(),
                message: message.to_string(),
            });
        }

        if self.failing_texts.iter().any(|marker| text.contains(marker.as_str())) {
            return Err(EmbeddingError::ServiceFailure {
                model: model.to_string(),
                message: "HTTP 429: quota exceeded".to_string(),
            });
        }

        Ok(bag_of_words(text))
    }
}
