//! Sequence normalization and positional similarity
//!
//! Similarity is a strict positional comparison: character `i` of one
//! sequence is compared with character `i` of the other, with no gaps,
//! insertions, deletions or reverse-complement matching. The ratio is taken
//! over the longer of the two lengths, so a length mismatch always lowers the
//! score even when the shared prefix is identical.
//!
//! # Example
//!
//! ```
//! use phenomatch::sequence::similarity;
//!
//! assert_eq!(similarity("ATCG", "ATCG"), 1.0);
//! assert_eq!(similarity("ATCG", "ATGG"), 0.75);
//! assert_eq!(similarity("AT", "ATCG"), 0.5);
//! assert_eq!(similarity("", "ATCG"), 0.0);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PhenoError;

/// Bases accepted when a sequence is written to the corpus
pub const NUCLEOTIDES: [char; 4] = ['A', 'T', 'C', 'G'];

/// Uppercase a sequence and strip all whitespace
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// A sequence that has already been normalized
///
/// Comparing one submitted sequence against many corpus entries should
/// normalize it once and reuse this value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedSequence {
    bases: String,
}

impl NormalizedSequence {
    /// Normalize a raw sequence
    pub fn new(raw: &str) -> Self {
        Self {
            bases: normalize(raw),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.bases
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.bases.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    pub fn into_string(self) -> String {
        self.bases
    }
}

impl fmt::Display for NormalizedSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bases)
    }
}

impl From<&str> for NormalizedSequence {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Normalize a sequence and check it only contains `A`, `T`, `C`, `G`
///
/// Used at write time; comparison inputs are not alphabet-checked.
pub fn validate_bases(raw: &str) -> Result<NormalizedSequence, PhenoError> {
    let normalized = NormalizedSequence::new(raw);
    if normalized.is_empty() {
        return Err(PhenoError::EmptySequence);
    }
    if let Some((position, found)) = normalized
        .as_str()
        .chars()
        .enumerate()
        .find(|(_, c)| !NUCLEOTIDES.contains(c))
    {
        return Err(PhenoError::InvalidBase { position, found });
    }
    Ok(normalized)
}

/// Positional similarity between two raw sequences, in `[0, 1]`
///
/// Both inputs are normalized first. Returns `0.0` if either is empty.
pub fn similarity(a: &str, b: &str) -> f64 {
    similarity_normalized(&NormalizedSequence::new(a), &NormalizedSequence::new(b))
}

/// Positional similarity between two already-normalized sequences
pub fn similarity_normalized(a: &NormalizedSequence, b: &NormalizedSequence) -> f64 {
    let (matches, max_len) = positional_matches(a.as_str(), b.as_str());
    if max_len == 0 || a.is_empty() || b.is_empty() {
        return 0.0;
    }
    matches as f64 / max_len as f64
}

/// Whether two normalized sequences match exactly (similarity of `1.0`)
///
/// Equivalent to `similarity_normalized(a, b) == 1.0`, which requires equal
/// length and identity at every position.
pub fn is_exact_match(a: &NormalizedSequence, b: &NormalizedSequence) -> bool {
    !a.is_empty() && a == b
}

/// Count identical positions over the shared prefix; also returns the longer length
fn positional_matches(a: &str, b: &str) -> (usize, usize) {
    let mut matches = 0;
    let mut len_a = 0;
    let mut len_b = 0;
    let mut left = a.chars();
    let mut right = b.chars();
    loop {
        match (left.next(), right.next()) {
            (Some(x), Some(y)) => {
                len_a += 1;
                len_b += 1;
                if x == y {
                    matches += 1;
                }
            }
            (Some(_), None) => len_a += 1,
            (None, Some(_)) => len_b += 1,
            (None, None) => break,
        }
    }
    (matches, len_a.max(len_b))
}
