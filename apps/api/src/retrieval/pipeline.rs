//! Pipeline Orchestrator — chunk résumé → embed chunks → embed query → rank.
//!
//! Runs sequentially within one request and holds no mutable state, so a
//! single `Arc<RetrievalPipeline>` is shared across all handlers.

use std::sync::Arc;

use tracing::{info, warn};

use crate::embedding_client::embedder::TextEmbedder;
use crate::embedding_client::Embedding;
use crate::models::chunk::{EmbeddedChunk, RankedChunk, SectionChunk, SectionType};
use crate::models::job_role::JobRoleSkill;
use crate::retrieval::chunker::{split_into_chunks, ChunkWindow};
use crate::retrieval::query::build_skill_query;
use crate::retrieval::sectioner::{detect_sections, SectionCatalog, Sectioning};
use crate::retrieval::similarity::find_similar_chunks;
use crate::retrieval::RetrievalError;

/// Chunks handed to the downstream prompt; more than the generic default of 5.
pub const PIPELINE_TOP_K: usize = 8;

pub struct RetrievalPipeline {
    embedder: Arc<dyn TextEmbedder>,
    catalog: SectionCatalog,
    top_k: usize,
}

impl RetrievalPipeline {
    pub fn new(embedder: Arc<dyn TextEmbedder>) -> Self {
        Self {
            embedder,
            catalog: SectionCatalog::default(),
            top_k: PIPELINE_TOP_K,
        }
    }

    pub fn with_catalog(mut self, catalog: SectionCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn catalog(&self) -> &SectionCatalog {
        &self.catalog
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Returns the résumé chunks most relevant to the job role, best first.
    pub async fn retrieve(
        &self,
        resume_text: &str,
        skills: &[JobRoleSkill],
        job_role_title: &str,
    ) -> Result<Vec<RankedChunk>, RetrievalError> {
        self.retrieve_top(resume_text, skills, job_role_title, self.top_k)
            .await
    }

    /// Same as `retrieve` with an explicit result count.
    pub async fn retrieve_top(
        &self,
        resume_text: &str,
        skills: &[JobRoleSkill],
        job_role_title: &str,
        top_k: usize,
    ) -> Result<Vec<RankedChunk>, RetrievalError> {
        let chunks = chunk_resume(resume_text, &self.catalog);
        if chunks.is_empty() {
            return Err(RetrievalError::EmptyInput);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await;

        let degraded = embeddings.iter().filter(|e| e.is_zero()).count();
        if degraded > 0 {
            warn!(
                degraded,
                total = chunks.len(),
                "some chunks were ranked with zero-vector embeddings"
            );
        }

        let mut embedded: Vec<EmbeddedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| EmbeddedChunk { chunk, embedding })
            .collect();

        let query = build_skill_query(job_role_title, skills);
        let query_embedding = self.embedder.embed(&query).await?;

        // substitutes sized from config may not match the model's real length
        let dimension = query_embedding.dimensions();
        for chunk in embedded
            .iter_mut()
            .filter(|c| c.embedding.is_zero() && c.embedding.dimensions() != dimension)
        {
            chunk.embedding = Embedding::zeros(dimension);
        }

        let total = embedded.len();
        let ranked = find_similar_chunks(&query_embedding, embedded, top_k)?;

        info!(
            chunks = total,
            returned = ranked.len(),
            top_similarity = ranked.first().map(|r| r.similarity).unwrap_or(0.0),
            "retrieval finished for role '{}'",
            job_role_title.trim()
        );

        Ok(ranked)
    }
}

/// Sections the résumé and chunks each section with its own window. Falls
/// back to one `general` section when no section produced a chunk.
pub fn chunk_resume(resume_text: &str, catalog: &SectionCatalog) -> Vec<SectionChunk> {
    let mut chunks = Vec::new();

    if let Sectioning::Sections(sections) = detect_sections(resume_text, catalog) {
        for section in sections {
            chunks.extend(tag_chunks(&section.text, section.section_type));
        }
    }

    if chunks.is_empty() {
        chunks = tag_chunks(resume_text, SectionType::General);
    }

    chunks
}

fn tag_chunks(text: &str, section_type: SectionType) -> Vec<SectionChunk> {
    let pieces = split_into_chunks(text, ChunkWindow::for_section(section_type));
    let count = pieces.len();

    pieces
        .into_iter()
        .enumerate()
        .map(|(index, text)| SectionChunk {
            text,
            section_type,
            index_within_section: index,
            section_chunk_count: count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding_client::embedder::{Embedder, EmbedderConfig};
    use crate::embedding_client::mock_oracle::{MockOracle, ScriptedFailure, MOCK_DIMENSION};
    use crate::embedding_client::EmbeddingError;

    const RESUME: &str =
        "SKILLS\nPython, SQL, Docker\nEXPERIENCE\nBuilt a data pipeline at Acme Corp for 2 years.";

    fn pipeline(oracle: MockOracle, models: &[&str]) -> RetrievalPipeline {
        let config = EmbedderConfig {
            api_key: "test-key".to_string(),
            model_priority: models.iter().map(|m| m.to_string()).collect(),
            embedding_dimension: MOCK_DIMENSION,
        };
        RetrievalPipeline::new(Arc::new(Embedder::new(Arc::new(oracle), &config)))
    }

    fn data_engineer_skills() -> Vec<JobRoleSkill> {
        vec![
            JobRoleSkill {
                name: "Python".to_string(),
                importance: 5,
                required_level: Some("advanced".to_string()),
            },
            JobRoleSkill {
                name: "Kubernetes".to_string(),
                importance: 4,
                required_level: Some("intermediate".to_string()),
            },
        ]
    }

    #[test]
    fn test_chunk_resume_tags_sections() {
        let chunks = chunk_resume(RESUME, &SectionCatalog::default());
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].section_type, SectionType::Skills);
        assert_eq!(chunks[0].text, "Python, SQL, Docker");
        assert_eq!(chunks[1].section_type, SectionType::Experience);
        assert_eq!(chunks[1].index_within_section, 0);
        assert_eq!(chunks[1].section_chunk_count, 1);
    }

    #[test]
    fn test_chunk_resume_indexes_within_section() {
        let long_experience = "Shipped a feature to production. ".repeat(40);
        let text = format!("Experience\n{long_experience}\nEducation\nBSc");
        let chunks = chunk_resume(&text, &SectionCatalog::default());

        let experience: Vec<_> = chunks
            .iter()
            .filter(|c| c.section_type == SectionType::Experience)
            .collect();
        assert!(experience.len() > 1);
        for (i, chunk) in experience.iter().enumerate() {
            assert_eq!(chunk.index_within_section, i);
            assert_eq!(chunk.section_chunk_count, experience.len());
        }
    }

    #[test]
    fn test_unstructured_text_falls_back_to_general() {
        let chunks = chunk_resume(
            "Seasoned developer with Rust and Python background.",
            &SectionCatalog::default(),
        );
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].section_type, SectionType::General);
    }

    #[test]
    fn test_headings_with_empty_bodies_fall_back_to_general() {
        let chunks = chunk_resume("Skills\nExperience\n", &SectionCatalog::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].section_type, SectionType::General);
    }

    #[tokio::test]
    async fn test_skills_chunk_ranks_above_experience() {
        let pipeline = pipeline(MockOracle::new(), &["text-embedding-004"]);
        let ranked = pipeline
            .retrieve(RESUME, &data_engineer_skills(), "Data Engineer")
            .await
            .unwrap();

        assert!(!ranked.is_empty());
        assert_eq!(ranked[0].section_type(), SectionType::Skills);
        let best_experience = ranked
            .iter()
            .filter(|r| r.section_type() == SectionType::Experience)
            .map(|r| r.similarity)
            .fold(f64::MIN, f64::max);
        assert!(ranked[0].similarity > best_experience);
    }

    #[tokio::test]
    async fn test_empty_resume_is_empty_input() {
        let pipeline = pipeline(MockOracle::new(), &["m"]);
        for text in ["", "   \n\t "] {
            let err = pipeline
                .retrieve(text, &data_engineer_skills(), "Data Engineer")
                .await
                .unwrap_err();
            assert!(matches!(err, RetrievalError::EmptyInput));
        }
    }

    #[tokio::test]
    async fn test_empty_resume_makes_no_embedding_calls() {
        let oracle = Arc::new(MockOracle::new());
        let config = EmbedderConfig::new("k".to_string(), vec!["m".to_string()]);
        let pipeline = RetrievalPipeline::new(Arc::new(Embedder::new(oracle.clone(), &config)));

        let _ = pipeline.retrieve("", &[], "Any").await;
        assert!(oracle.calls().is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_models_propagate() {
        let oracle = MockOracle::new().unsupported("a").unsupported("b");
        let pipeline = pipeline(oracle, &["a", "b"]);

        let err = pipeline
            .retrieve(RESUME, &data_engineer_skills(), "Data Engineer")
            .await
            .unwrap_err();
        match err {
            RetrievalError::Embedding(EmbeddingError::ModelsExhausted { attempted, .. }) => {
                assert_eq!(attempted, vec!["a", "b"]);
            }
            other => panic!("expected exhausted models, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_auth_failure_propagates_unchanged() {
        let oracle = MockOracle::new().failing("m", ScriptedFailure::Auth);
        let pipeline = pipeline(oracle, &["m", "other"]);

        let err = pipeline
            .retrieve(RESUME, &data_engineer_skills(), "Data Engineer")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::Embedding(EmbeddingError::ServiceFailure { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_chunk_participates_with_zero_score() {
        let oracle = MockOracle::new().failing_text("Acme");
        let pipeline = pipeline(oracle, &["m"]);

        let ranked = pipeline
            .retrieve(RESUME, &data_engineer_skills(), "Data Engineer")
            .await
            .unwrap();

        assert_eq!(ranked.len(), 2, "zero-vector chunk must not be dropped");
        let failed = ranked
            .iter()
            .find(|r| r.section_type() == SectionType::Experience)
            .unwrap();
        assert_eq!(failed.similarity, 0.0);
        assert_eq!(ranked.last().unwrap().section_type(), SectionType::Experience);
    }

    #[tokio::test]
    async fn test_failed_chunk_survives_dimension_mismatch_with_config() {
        // configured for 768 dimensions, the oracle returns MOCK_DIMENSION
        let oracle = MockOracle::new().failing_text("Acme");
        let config = EmbedderConfig::new("k".to_string(), vec!["m".to_string()]);
        let pipeline = RetrievalPipeline::new(Arc::new(Embedder::new(Arc::new(oracle), &config)));

        let ranked = pipeline
            .retrieve(
                "SKILLS\nPython, SQL\nEXPERIENCE\nBuilt a pipeline at Acme Corp.",
                &data_engineer_skills(),
                "Data Engineer",
            )
            .await
            .unwrap();

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].section_type(), SectionType::Skills);
        assert_eq!(ranked[1].section_type(), SectionType::Experience);
        assert_eq!(ranked[1].similarity, 0.0);
        assert_eq!(ranked[1].chunk.embedding.dimensions(), MOCK_DIMENSION);
    }

    #[tokio::test]
    async fn test_all_chunks_failed_are_resized_to_query() {
        let oracle = MockOracle::new().failing_text("Acme").failing_text("SQL");
        let config = EmbedderConfig::new("k".to_string(), vec!["m".to_string()]);
        let pipeline = RetrievalPipeline::new(Arc::new(Embedder::new(Arc::new(oracle), &config)));

        let ranked = pipeline
            .retrieve(
                "SKILLS\nPython, SQL\nEXPERIENCE\nBuilt a pipeline at Acme Corp.",
                &data_engineer_skills(),
                "Data Engineer",
            )
            .await
            .unwrap();

        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|r| r.similarity == 0.0));
        assert!(ranked
            .iter()
            .all(|r| r.chunk.embedding.dimensions() == MOCK_DIMENSION));
    }

    #[tokio::test]
    async fn test_top_k_limits_results() {
        let text = format!(
            "Experience\n{}\nSkills\nPython",
            "Maintained the Acme data pipeline. ".repeat(120)
        );
        let pipeline = pipeline(MockOracle::new(), &["m"]);

        let ranked = pipeline
            .retrieve(&text, &data_engineer_skills(), "Data Engineer")
            .await
            .unwrap();
        assert_eq!(ranked.len(), PIPELINE_TOP_K);

        let ranked = pipeline
            .retrieve_top(&text, &data_engineer_skills(), "Data Engineer", 3)
            .await
            .unwrap();
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].section_type(), SectionType::Skills);
    }

    #[tokio::test]
    async fn test_custom_catalog_is_used() {
        let catalog = SectionCatalog::default().with_synonyms(SectionType::Skills, &["Toolbox"]);
        let pipeline = pipeline(MockOracle::new(), &["m"]).with_catalog(catalog);

        let ranked = pipeline
            .retrieve("TOOLBOX\nPython, Rust", &data_engineer_skills(), "Data Engineer")
            .await
            .unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].section_type(), SectionType::Skills);
    }
}
