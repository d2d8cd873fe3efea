//! Similarity Ranker — cosine similarity and top-K selection.

use std::cmp::Ordering;

use crate::embedding_client::Embedding;
use crate::models::chunk::{EmbeddedChunk, RankedChunk};
use crate::retrieval::RetrievalError;

pub const DEFAULT_TOP_K: usize = 5;

/// Dot product over the product of Euclidean norms.
///
/// Returns exactly 0.0 when either vector has zero norm, so zero vectors
/// substituted for failed embeddings rank last instead of producing NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, RetrievalError> {
    if a.len() != b.len() {
        return Err(RetrievalError::InvalidInput(format!(
            "vectors must have the same length ({} vs {})",
            a.len(),
            b.len()
        )));
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / denominator)
}

/// Scores every chunk against `query`, sorts descending and keeps the first
/// `min(top_k, chunks.len())`. Ties keep their input order.
pub fn find_similar_chunks(
    query: &Embedding,
    chunks: Vec<EmbeddedChunk>,
    top_k: usize,
) -> Result<Vec<RankedChunk>, RetrievalError> {
    let mut ranked = chunks
        .into_iter()
        .map(|chunk| {
            let similarity = cosine_similarity(&query.values, &chunk.embedding.values)?;
            Ok(RankedChunk { chunk, similarity })
        })
        .collect::<Result<Vec<_>, RetrievalError>>()?;

    // sort_by is stable
    ranked.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(top_k);

    Ok(ranked)
}
