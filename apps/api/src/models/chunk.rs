use std::fmt;

use serde::{Deserialize, Serialize};

use crate::embedding_client::Embedding;

/// Canonical résumé section. `General` is used when no headings are found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Summary,
    Skills,
    Experience,
    Education,
    Projects,
    Certifications,
    General,
}

impl SectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Summary => "summary",
            SectionType::Skills => "skills",
            SectionType::Experience => "experience",
            SectionType::Education => "education",
            SectionType::Projects => "projects",
            SectionType::Certifications => "certifications",
            SectionType::General => "general",
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A trimmed, non-empty span of résumé text tagged with its section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionChunk {
    pub text: String,
    pub section_type: SectionType,
    pub index_within_section: usize,
    pub section_chunk_count: usize,
}

/// A chunk together with the embedding computed for it.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedChunk {
    pub chunk: SectionChunk,
    pub embedding: Embedding,
}

/// A chunk scored against one query. Lives for a single request.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedChunk {
    pub chunk: EmbeddedChunk,
    pub similarity: f64,
}

impl RankedChunk {
    pub fn section_type(&self) -> SectionType {
        self.chunk.chunk.section_type
    }

    pub fn text(&self) -> &str {
        &self.chunk.chunk.text
    }
}
