use anyhow::{Context, Result};

use crate::embedding_client::{DEFAULT_EMBEDDING_DIMENSION, GEMINI_API_BASE};
use crate::retrieval::pipeline::PIPELINE_TOP_K;

const DEFAULT_EMBEDDING_MODELS: &str = "text-embedding-004,embedding-001";

/// Service configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_api_base: String,
    /// Embedding models in priority order; later entries are only tried when
    /// earlier ones are reported as unsupported.
    pub embedding_models: Vec<String>,
    pub embedding_dimension: usize,
    pub retrieval_top_k: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let embedding_models = parse_model_list(
            &std::env::var("EMBEDDING_MODELS")
                .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODELS.to_string()),
        );
        if embedding_models.is_empty() {
            anyhow::bail!("EMBEDDING_MODELS must name at least one model");
        }

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_api_base: std::env::var("GEMINI_API_BASE")
                .unwrap_or_else(|_| GEMINI_API_BASE.to_string()),
            embedding_models,
            embedding_dimension: parse_env_or("EMBEDDING_DIMENSION", DEFAULT_EMBEDDING_DIMENSION)?,
            retrieval_top_k: parse_env_or("RETRIEVAL_TOP_K", PIPELINE_TOP_K)?,
            port: parse_env_or("PORT", 8080u16)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

/// Splits a comma-separated model list, dropping blanks and duplicates while
/// keeping the first occurrence's position.
pub fn parse_model_list(raw: &str) -> Vec<String> {
    let mut models: Vec<String> = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !models.iter().any(|m| m == name) {
            models.push(name.to_string());
        }
    }
    models
}
