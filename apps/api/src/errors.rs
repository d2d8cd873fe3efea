use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::embedding_client::EmbeddingError;
use crate::retrieval::RetrievalError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<EmbeddingError> for AppError {
    fn from(e: EmbeddingError) -> Self {
        AppError::Retrieval(RetrievalError::Embedding(e))
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Retrieval(RetrievalError::EmptyInput) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "EMPTY_INPUT",
                "Resume text is empty".to_string(),
            ),
            AppError::Retrieval(RetrievalError::Embedding(e)) => {
                tracing::error!("Embedding error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "ANALYSIS_FAILED",
                    "Analysis failed: the embedding service could not process the resume"
                        .to_string(),
                )
            }
            AppError::Retrieval(RetrievalError::InvalidInput(msg)) => {
                tracing::error!("Invalid retrieval input: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
