//! Axum route handlers for the Retrieval API.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::chunk::{SectionChunk, SectionType};
use crate::models::job_role::{JobRoleSkill, IMPORTANCE_RANGE};
use crate::retrieval::context::{render_context_block, to_context, RetrievedContext};
use crate::retrieval::pipeline::chunk_resume;
use crate::retrieval::sectioner::{detect_sections, Sectioning};
use crate::retrieval::RetrievalError;
use crate::state::AppState;

const MAX_TOP_K: usize = 50;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RetrieveRequest {
    pub resume_text: String,
    pub job_role_title: String,
    #[serde(default)]
    pub skills: Vec<JobRoleSkill>,
    /// Overrides the configured result count.
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RetrieveResponse {
    pub retrieval_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub results: Vec<RetrievedContext>,
    pub context_block: String,
}

#[derive(Debug, Deserialize)]
pub struct SectionsRequest {
    pub resume_text: String,
}

#[derive(Debug, Serialize)]
pub struct SectionPreview {
    pub section_type: SectionType,
    pub chunk_count: usize,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SectionsResponse {
    /// False when no headings were found and the whole text is `general`.
    pub structured: bool,
    pub sections: Vec<SectionPreview>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/retrieval
///
/// Chunks and embeds the résumé, embeds the job role query and returns the
/// most relevant chunks plus a prompt-ready context block.
pub async fn handle_retrieve(
    State(state): State<AppState>,
    Json(request): Json<RetrieveRequest>,
) -> Result<Json<RetrieveResponse>, AppError> {
    if request.job_role_title.trim().is_empty() {
        return Err(AppError::Validation(
            "job_role_title cannot be empty".to_string(),
        ));
    }

    if let Some(skill) = request.skills.iter().find(|s| !s.has_valid_importance()) {
        return Err(AppError::Validation(format!(
            "importance for skill '{}' must be between {} and {}, got {}",
            skill.name.trim(),
            IMPORTANCE_RANGE.start(),
            IMPORTANCE_RANGE.end(),
            skill.importance
        )));
    }

    let top_k = request.top_k.unwrap_or(state.retrieval.top_k());
    if top_k == 0 || top_k > MAX_TOP_K {
        return Err(AppError::Validation(format!(
            "top_k must be between 1 and {MAX_TOP_K}"
        )));
    }

    let ranked = state
        .retrieval
        .retrieve_top(
            &request.resume_text,
            &request.skills,
            &request.job_role_title,
            top_k,
        )
        .await?;

    let results = to_context(&ranked);
    let context_block = render_context_block(&results);

    Ok(Json(RetrieveResponse {
        retrieval_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        results,
        context_block,
    }))
}

/// POST /api/v1/retrieval/sections
///
/// Previews how the résumé is sectioned and chunked, exactly as `retrieve`
/// would chunk it. No embedding calls.
pub async fn handle_sections(
    State(state): State<AppState>,
    Json(request): Json<SectionsRequest>,
) -> Result<Json<SectionsResponse>, AppError> {
    let chunks = chunk_resume(&request.resume_text, state.retrieval.catalog());
    if chunks.is_empty() {
        return Err(RetrievalError::EmptyInput.into());
    }

    let structured = chunks.iter().all(|c| c.section_type != SectionType::General);
    let sections = if structured {
        match detect_sections(&request.resume_text, state.retrieval.catalog()) {
            Sectioning::Sections(sections) => sections
                .into_iter()
                .map(|s| preview(&chunks, s.section_type, s.text))
                .filter(|p| p.chunk_count > 0)
                .collect(),
            Sectioning::NoStructure => Vec::new(),
        }
    } else {
        vec![preview(
            &chunks,
            SectionType::General,
            request.resume_text.trim().to_string(),
        )]
    };

    Ok(Json(SectionsResponse {
        structured,
        sections,
    }))
}

fn preview(chunks: &[SectionChunk], section_type: SectionType, text: String) -> SectionPreview {
    SectionPreview {
        section_type,
        chunk_count: chunks
            .iter()
            .filter(|c| c.section_type == section_type)
            .count(),
        text,
    }
}
