// Résumé retrieval: sectioning, chunking, embedding, ranking.
// All embedding calls go through embedding_client — no direct HTTP calls here.

pub mod chunker;
pub mod context;
pub mod handlers;
pub mod pipeline;
pub mod query;
pub mod sectioner;
pub mod similarity;

use thiserror::Error;

use crate::embedding_client::EmbeddingError;

#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Caller bug: mismatched vector lengths, unusable window sizes.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("resume text is empty")]
    EmptyInput,

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}
