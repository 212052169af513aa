//! Error types for phenomatch
//!
//! Every failure in the core is reported through [`PhenoError`]. The variants
//! are grouped the same way callers react to them:
//! - criteria errors (bad `Y`/`N` tokens, combinations outside the rule table)
//! - sequence and gene errors (empty input, characters outside `ATCG`)
//! - batch errors (empty or malformed comparison batches)
//! - I/O and JSON errors from corpus files

use std::fmt;
use thiserror::Error;

/// Name of one of the three clinical criteria
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum CriterionField {
    /// Presence of ovarian cysts
    Cysts,
    /// Irregular menstrual cycle
    IrregularCycle,
    /// Hyperandrogenism
    Hyperandrogenism,
}

impl CriterionField {
    /// Field name as it appears in request bodies and stored documents
    pub fn as_str(&self) -> &'static str {
        match self {
            CriterionField::Cysts => "cysts",
            CriterionField::IrregularCycle => "irregularCycle",
            CriterionField::Hyperandrogenism => "hyperandrogenism",
        }
    }
}

impl fmt::Display for CriterionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for phenomatch operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhenoError {
    /// A criterion token was something other than `Y` or `N`
    #[error("Invalid value for {field}: expected \"Y\" or \"N\", found {token:?}")]
    InvalidCriterion {
        field: CriterionField,
        token: String,
    },

    /// The criteria are valid but do not meet any diagnostic rule
    #[error("Criteria combination does not meet diagnostic rule ({criteria})")]
    Unclassifiable { criteria: String },

    /// Sequence was empty after normalization
    #[error("Sequence is empty")]
    EmptySequence,

    /// Sequence contains a character outside the nucleotide alphabet
    #[error("Invalid base {found:?} at position {position}: sequences may only contain A, T, C, G")]
    InvalidBase { position: usize, found: char },

    /// Gene name was empty after trimming
    #[error("Gene name is empty")]
    EmptyGeneName,

    /// Comparison batch had no entries
    #[error("Comparison batch must contain at least one entry")]
    EmptyBatch,

    /// Comparison batch had no entry with both a gene name and a sequence
    #[error("Malformed comparison batch: {msg}")]
    MalformedBatch { msg: String },

    /// Phenotype label outside the four fixed labels
    #[error("Unknown phenotype label: {label}")]
    UnknownPhenotype { label: String },

    /// I/O error
    #[error("I/O error: {msg}")]
    Io { msg: String },

    /// JSON (de)serialization error
    #[error("JSON error: {msg}")]
    Json { msg: String },
}

impl PhenoError {
    /// Whether the error comes from caller input rather than the environment
    pub fn is_validation(&self) -> bool {
        !matches!(self, PhenoError::Io { .. } | PhenoError::Json { .. })
    }
}

impl From<std::io::Error> for PhenoError {
    fn from(err: std::io::Error) -> Self {
        PhenoError::Io {
            msg: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for PhenoError {
    fn from(err: serde_json::Error) -> Self {
        PhenoError::Json {
            msg: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_criterion_message_names_field() {
        let err = PhenoError::InvalidCriterion {
            field: CriterionField::IrregularCycle,
            token: "yes".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("irregularCycle"));
        assert!(msg.contains("\"yes\""));
    }

    #[test]
    fn test_invalid_base_message() {
        let err = PhenoError::InvalidBase {
            position: 3,
            found: 'X',
        };
        assert_eq!(
            err.to_string(),
            "Invalid base 'X' at position 3: sequences may only contain A, T, C, G"
        );
    }

    #[test]
    fn test_is_validation() {
        assert!(PhenoError::EmptyBatch.is_validation());
        assert!(PhenoError::EmptySequence.is_validation());
        assert!(!PhenoError::Io {
            msg: "disk".to_string()
        }
        .is_validation());
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: PhenoError = io.into();
        assert!(matches!(err, PhenoError::Io { .. }));
    }
}
