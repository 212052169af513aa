//! Input validation at the service boundary
//!
//! Requests are checked here before anything reaches the core: required
//! fields, gene name format, sequence size and alphabet, criterion tokens,
//! and batch size.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CriterionField, PhenoError};
use crate::phenotype::{parse_flag, Criteria};
use crate::sequence::{validate_bases, NormalizedSequence};
use crate::service::types::ServiceError;

/// Maximum allowed length for gene names
pub const MAX_GENE_NAME_LENGTH: usize = 64;

/// Maximum allowed bases in a submitted sequence
pub const MAX_SEQUENCE_LENGTH: usize = 100_000;

/// Maximum allowed length for chat messages
pub const MAX_CHAT_MESSAGE_LENGTH: usize = 2000;

/// Gene symbols: alphanumeric start, then alphanumerics, dots, dashes, underscores
static GENE_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap());

/// Validation errors for user input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationError {
    /// Required field is absent
    Missing { field: String },
    /// Field is empty after trimming
    Empty { field: String },
    /// Field is too long
    TooLong {
        field: String,
        max: usize,
        actual: usize,
    },
    /// Field contains non-ASCII characters
    NonAscii { field: String },
    /// Gene name doesn't match the allowed pattern
    InvalidGeneName,
    /// Sequence contains a character outside `ATCG`
    InvalidBase { position: usize, found: char },
    /// Criterion token other than `Y` or `N`
    InvalidToken { field: CriterionField, token: String },
    /// Batch has no entries
    EmptyBatch,
    /// Batch size exceeds maximum allowed
    BatchTooLarge { max: usize, actual: usize },
    /// Similarity outside `[0, 1]` or not finite
    InvalidSimilarity { value: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Missing { field } => write!(f, "Missing required field: {}", field),
            ValidationError::Empty { field } => write!(f, "{} cannot be empty", field),
            ValidationError::TooLong { field, max, actual } => {
                write!(
                    f,
                    "{} too long: {} characters (max: {})",
                    field, actual, max
                )
            }
            ValidationError::NonAscii { field } => {
                write!(f, "{} must contain only ASCII characters", field)
            }
            ValidationError::InvalidGeneName => write!(
                f,
                "geneName must start with a letter or digit and contain only letters, digits, '.', '-' or '_'"
            ),
            ValidationError::InvalidBase { position, found } => write!(
                f,
                "Invalid base {:?} at position {}: sequences may only contain A, T, C, G",
                found, position
            ),
            ValidationError::InvalidToken { field, token } => write!(
                f,
                "Invalid value for {}: expected \"Y\" or \"N\", found {:?}",
                field, token
            ),
            ValidationError::EmptyBatch => {
                write!(f, "geneComparisons must be a non-empty array")
            }
            ValidationError::BatchTooLarge { max, actual } => {
                write!(f, "Batch size {} exceeds maximum allowed ({})", actual, max)
            }
            ValidationError::InvalidSimilarity { value } => {
                write!(f, "similarity must be a number between 0 and 1, found {}", value)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        match &err {
            ValidationError::InvalidToken { .. } => ServiceError::InvalidCriteria(err.to_string()),
            ValidationError::InvalidBase { .. } => ServiceError::InvalidSequence(err.to_string()),
            ValidationError::TooLong { field, .. } | ValidationError::Empty { field }
                if field == "sequence" =>
            {
                ServiceError::InvalidSequence(err.to_string())
            }
            _ => ServiceError::BadRequest(err.to_string()),
        }
    }
}

/// Return a required string field or report it missing
pub fn require<'a>(field: &str, value: Option<&'a String>) -> Result<&'a str, ValidationError> {
    value
        .map(String::as_str)
        .ok_or_else(|| ValidationError::Missing {
            field: field.to_string(),
        })
}

/// Validate a gene name, returning it trimmed
///
/// Gene names are kept case-sensitive.
pub fn validate_gene_name(input: &str) -> Result<&str, ValidationError> {
    let gene_name = input.trim();
    if gene_name.is_empty() {
        return Err(ValidationError::Empty {
            field: "geneName".to_string(),
        });
    }

    if gene_name.len() > MAX_GENE_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "geneName".to_string(),
            max: MAX_GENE_NAME_LENGTH,
            actual: gene_name.len(),
        });
    }

    if !gene_name.is_ascii() {
        return Err(ValidationError::NonAscii {
            field: "geneName".to_string(),
        });
    }

    if !GENE_NAME_PATTERN.is_match(gene_name) {
        return Err(ValidationError::InvalidGeneName);
    }

    Ok(gene_name)
}

/// Normalize a submitted sequence and check its size and alphabet
pub fn validate_sequence(input: &str) -> Result<NormalizedSequence, ValidationError> {
    let normalized = NormalizedSequence::new(input);
    if normalized.len() > MAX_SEQUENCE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "sequence".to_string(),
            max: MAX_SEQUENCE_LENGTH,
            actual: normalized.len(),
        });
    }

    validate_bases(normalized.as_str()).map_err(|e| match e {
        PhenoError::InvalidBase { position, found } => {
            ValidationError::InvalidBase { position, found }
        }
        _ => ValidationError::Empty {
            field: "sequence".to_string(),
        },
    })
}

/// Parse the three criterion tokens
pub fn validate_criteria(
    cysts: &str,
    irregular_cycle: &str,
    hyperandrogenism: &str,
) -> Result<Criteria, ValidationError> {
    let flag = |field: CriterionField, token: &str| {
        parse_flag(field, token).map_err(|_| ValidationError::InvalidToken {
            field,
            token: token.to_string(),
        })
    };
    Ok(Criteria::new(
        flag(CriterionField::Cysts, cysts)?,
        flag(CriterionField::IrregularCycle, irregular_cycle)?,
        flag(CriterionField::Hyperandrogenism, hyperandrogenism)?,
    ))
}

/// Check a comparison batch is non-empty and within the size limit
pub fn validate_batch_size(len: usize, max: usize) -> Result<(), ValidationError> {
    if len == 0 {
        return Err(ValidationError::EmptyBatch);
    }
    if len > max {
        return Err(ValidationError::BatchTooLarge { max, actual: len });
    }
    Ok(())
}

/// Check a similarity value is finite and in `[0, 1]`
pub fn validate_similarity(value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::InvalidSimilarity {
            value: value.to_string(),
        })
    }
}

/// Validate a chat message, returning it trimmed
pub fn validate_chat_message(input: &str) -> Result<&str, ValidationError> {
    let message = input.trim();
    if message.is_empty() {
        return Err(ValidationError::Empty {
            field: "message".to_string(),
        });
    }
    let length = message.chars().count();
    if length > MAX_CHAT_MESSAGE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "message".to_string(),
            max: MAX_CHAT_MESSAGE_LENGTH,
            actual: length,
        });
    }
    Ok(message)
}
