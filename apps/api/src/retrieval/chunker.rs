//! Chunker — bounded, sentence-boundary-aware, overlapping windows.
//!
//! Lengths are counted in chars so multi-byte résumé text (bullets, accents)
//! never splits inside a code point.

use crate::models::chunk::SectionType;
use crate::retrieval::RetrievalError;

/// A break point must land past this fraction of the window to be used.
const MIN_BREAK_FRACTION: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkWindow {
    max_chars: usize,
    overlap_chars: usize,
}

impl ChunkWindow {
    pub const SECTION: ChunkWindow = ChunkWindow {
        max_chars: 500,
        overlap_chars: 30,
    };
    /// Skills lists are dense; smaller windows keep retrieval precise.
    pub const SKILLS: ChunkWindow = ChunkWindow {
        max_chars: 300,
        overlap_chars: 30,
    };
    /// Whole-document fallback when no headings are detected.
    pub const GENERAL: ChunkWindow = ChunkWindow {
        max_chars: 500,
        overlap_chars: 50,
    };

    pub fn new(max_chars: usize, overlap_chars: usize) -> Result<Self, RetrievalError> {
        if max_chars == 0 {
            return Err(RetrievalError::InvalidInput(
                "chunk window must be at least one character".to_string(),
            ));
        }
        if overlap_chars >= max_chars {
            return Err(RetrievalError::InvalidInput(format!(
                "chunk overlap ({overlap_chars}) must be smaller than the window ({max_chars})"
            )));
        }
        Ok(Self {
            max_chars,
            overlap_chars,
        })
    }

    pub fn for_section(section: SectionType) -> Self {
        match section {
            SectionType::Skills => Self::SKILLS,
            SectionType::General => Self::GENERAL,
            _ => Self::SECTION,
        }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn overlap_chars(&self) -> usize {
        self.overlap_chars
    }
}

/// Splits `text` into trimmed, non-empty chunks of at most `max_chars` chars.
///
/// Algorithm:
/// 1. Take a candidate window of `max_chars` from the cursor
/// 2. If the window stops short of the end, look for the later of its last
///    `.` or `\n`; past 70% of the window, cut there (inclusive) and resume at
///    `break + 1 - overlap`, otherwise resume at `window end - overlap`
/// 3. Keep the trimmed window if anything is left
pub fn split_into_chunks(text: &str, window: ChunkWindow) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let max = window.max_chars;
    let overlap = window.overlap_chars;

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < total {
        let end = (start + max).min(total);
        let candidate = &chars[start..end];

        let (piece, next_start) = if end < total {
            match find_break_point(candidate) {
                Some(bp) if bp as f64 > max as f64 * MIN_BREAK_FRACTION => {
                    (&candidate[..=bp], (start + bp + 1).saturating_sub(overlap))
                }
                _ => (candidate, end.saturating_sub(overlap)),
            }
        } else {
            (candidate, end)
        };

        let piece: String = piece.iter().collect();
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }

        // the cursor always moves forward, whatever the window configuration
        start = next_start.max(start + 1);
    }

    chunks
}

fn find_break_point(window: &[char]) -> Option<usize> {
    let last_period = window.iter().rposition(|c| *c == '.');
    let last_newline = window.iter().rposition(|c| *c == '\n');
    last_period.max(last_newline)
}
