//! Sectioner — splits résumé text into labeled sections by heading keyword.
//!
//! A line is a heading for keyword `k` when, after normalization (lowercase,
//! every run of non-letters collapsed to one space, trimmed), it equals `k` or
//! starts with `"k "`. Headings are looked up in a `SectionCatalog`, so new
//! synonyms never require touching the matching code.

use serde::Serialize;

use crate::models::chunk::SectionType;

/// Ordered mapping of section type → heading synonyms.
#[derive(Debug, Clone)]
pub struct SectionCatalog {
    entries: Vec<(SectionType, Vec<String>)>,
}

impl Default for SectionCatalog {
    fn default() -> Self {
        Self::new(vec![
            (
                SectionType::Summary,
                vec![
                    "summary",
                    "professional summary",
                    "profile",
                    "objective",
                    "about me",
                    "career summary",
                ],
            ),
            (
                SectionType::Skills,
                vec![
                    "skills",
                    "technical skills",
                    "core skills",
                    "skill set",
                    "technologies",
                    "competencies",
                    "core competencies",
                ],
            ),
            (
                SectionType::Experience,
                vec![
                    "experience",
                    "work experience",
                    "professional experience",
                    "employment",
                    "work history",
                ],
            ),
            (
                SectionType::Education,
                vec!["education", "academic background", "academics"],
            ),
            (SectionType::Projects, vec!["projects", "project experience"]),
            (
                SectionType::Certifications,
                vec![
                    "certifications",
                    "certification",
                    "licenses",
                    "licences",
                    "certificates",
                ],
            ),
        ])
    }
}

impl SectionCatalog {
    pub fn new(entries: Vec<(SectionType, Vec<&str>)>) -> Self {
        let mut catalog = Self {
            entries: Vec::new(),
        };
        for (section, synonyms) in entries {
            catalog = catalog.with_synonyms(section, &synonyms);
        }
        catalog
    }

    /// Adds heading synonyms for `section`, appending the section at the end of
    /// the catalog order if it is not present yet.
    pub fn with_synonyms(mut self, section: SectionType, synonyms: &[&str]) -> Self {
        let normalized: Vec<String> = synonyms
            .iter()
            .map(|s| normalize_heading(s))
            .filter(|s| !s.is_empty())
            .collect();

        match self.entries.iter_mut().find(|(s, _)| *s == section) {
            Some((_, existing)) => {
                for synonym in normalized {
                    if !existing.contains(&synonym) {
                        existing.push(synonym);
                    }
                }
            }
            None => self.entries.push((section, normalized)),
        }
        self
    }

    pub fn sections(&self) -> impl Iterator<Item = SectionType> + '_ {
        self.entries.iter().map(|(s, _)| *s)
    }

    pub fn synonyms(&self, section: SectionType) -> &[String] {
        self.entries
            .iter()
            .find(|(s, _)| *s == section)
            .map(|(_, syns)| syns.as_slice())
            .unwrap_or(&[])
    }

    /// Returns the section a line is a heading for, preferring the longest
    /// matching synonym.
    pub fn classify(&self, line: &str) -> Option<SectionType> {
        let normalized = normalize_heading(line);
        if normalized.is_empty() {
            return None;
        }

        self.entries
            .iter()
            .flat_map(|(section, synonyms)| synonyms.iter().map(move |k| (*section, k)))
            .filter(|(_, keyword)| heading_matches(&normalized, keyword))
            .max_by_key(|(_, keyword)| keyword.len())
            .map(|(section, _)| section)
    }

    /// Body of the first `section` heading in `text`, or `None` if absent.
    pub fn extract(&self, text: &str, section: SectionType) -> Option<String> {
        extract_section(text, self.synonyms(section), self)
    }
}

/// A section found in the résumé. The body may be empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumeSection {
    pub section_type: SectionType,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sectioning {
    Sections(Vec<ResumeSection>),
    /// No known heading anywhere; treat the whole document as `general`.
    NoStructure,
}

/// Lowercases, replaces each run of non-letters with a single space, trims.
pub fn normalize_heading(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut pending_space = false;

    for c in line.chars().flat_map(char::to_lowercase) {
        if c.is_alphabetic() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }

    out
}

fn heading_matches(normalized: &str, keyword: &str) -> bool {
    normalized == keyword
        || normalized
            .strip_prefix(keyword)
            .is_some_and(|rest| rest.starts_with(' '))
}

/// Returns the text after the first heading matching one of `synonyms`, up to
/// the next heading of a different catalog section or the end of the text.
///
/// Inline content after a colon on the heading line (`Skills: Rust, Go`) is
/// kept as the first body line.
pub fn extract_section<S: AsRef<str>>(
    text: &str,
    synonyms: &[S],
    catalog: &SectionCatalog,
) -> Option<String> {
    let synonyms: Vec<String> = synonyms
        .iter()
        .map(|s| normalize_heading(s.as_ref()))
        .filter(|s| !s.is_empty())
        .collect();
    let is_own_heading = |line: &str| {
        let normalized = normalize_heading(line);
        synonyms.iter().any(|k| heading_matches(&normalized, k))
    };

    let mut lines = text.lines();
    let heading = lines.by_ref().find(|line| is_own_heading(*line))?;

    let mut body: Vec<&str> = Vec::new();
    if let Some((_, inline)) = heading.split_once(':') {
        if !inline.trim().is_empty() {
            body.push(inline.trim());
        }
    }

    for line in lines {
        if catalog.classify(line).is_some() && !is_own_heading(line) {
            break;
        }
        body.push(line);
    }

    Some(body.join("\n").trim().to_string())
}

/// Runs extraction for every catalog section, in catalog order.
pub fn detect_sections(text: &str, catalog: &SectionCatalog) -> Sectioning {
    let sections: Vec<ResumeSection> = catalog
        .sections()
        .filter_map(|section_type| {
            catalog
                .extract(text, section_type)
                .map(|body| ResumeSection {
                    section_type,
                    text: body,
                })
        })
        .collect();

    if sections.is_empty() {
        Sectioning::NoStructure
    } else {
        Sectioning::Sections(sections)
    }
}
