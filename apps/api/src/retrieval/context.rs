//! Turns ranked chunks into prompt-ready context records.

use serde::{Deserialize, Serialize};

use crate::models::chunk::{RankedChunk, SectionType};

/// One retrieved chunk as handed to prompt assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedContext {
    pub section_type: SectionType,
    /// Similarity × 100, rounded to one decimal.
    pub similarity_score_percent: f64,
    pub text: String,
}

impl From<&RankedChunk> for RetrievedContext {
    fn from(ranked: &RankedChunk) -> Self {
        Self {
            section_type: ranked.section_type(),
            similarity_score_percent: (ranked.similarity * 1000.0).round() / 10.0,
            text: ranked.text().to_string(),
        }
    }
}

pub fn to_context(ranked: &[RankedChunk]) -> Vec<RetrievedContext> {
    ranked.iter().map(RetrievedContext::from).collect()
}

/// Renders contexts as blank-line separated blocks:
/// `[SKILLS | relevance 87.3%]` followed by the chunk text.
pub fn render_context_block(contexts: &[RetrievedContext]) -> String {
    contexts
        .iter()
        .map(|c| {
            format!(
                "[{} | relevance {:.1}%]\n{}",
                c.section_type.as_str().to_uppercase(),
                c.similarity_score_percent,
                c.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
