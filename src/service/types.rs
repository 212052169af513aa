//! Request and response types for the phenomatch web service

use serde::{Deserialize, Serialize};

use crate::compare::{ComparisonResult, GeneComparison};
use crate::error::PhenoError;
use crate::phenotype::Phenotype;
use crate::record::SequenceRecord;

/// Request body for `POST /api/add-sequence`
///
/// Every field is optional at the serde level so a missing field is reported
/// through the service error schema instead of a bare deserialization error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSequenceRequest {
    pub gene_name: Option<String>,
    pub sequence: Option<String>,
    pub cysts: Option<String>,
    pub irregular_cycle: Option<String>,
    pub hyperandrogenism: Option<String>,
}

/// Response for a stored submission (HTTP 201)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddSequenceResponse {
    /// Always "Sequence added successfully"
    pub message: String,
    /// Store-assigned document id
    pub id: String,
    /// Phenotype assigned by the classifier
    pub phenotype: Phenotype,
}

/// One entry of a comparison batch as submitted
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneComparisonInput {
    pub gene_name: Option<String>,
    pub new_sequence: Option<String>,
}

impl GeneComparisonInput {
    /// Convert to a core comparison pair; absent fields become empty and the
    /// entry is skipped by the aggregator
    pub fn into_comparison(self) -> GeneComparison {
        GeneComparison::new(
            self.gene_name.unwrap_or_default(),
            self.new_sequence.unwrap_or_default(),
        )
    }
}

/// Request body for `POST /api/compare-sequences`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    pub gene_comparisons: Vec<GeneComparisonInput>,
}

/// Request body for `POST /api/compare-sequences-legacy`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyCompareRequest {
    pub gene_name: Option<String>,
    pub sequence: Option<String>,
}

/// Request body for `POST /api/explain`
///
/// Either a comparison result (the highest percentage is used) or a raw
/// similarity in `[0, 1]` must be supplied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExplainRequest {
    pub result: Option<ComparisonResult>,
    pub similarity: Option<f64>,
    #[serde(default)]
    pub sequences: Vec<String>,
}

/// Generated explanation and recommendations, as HTML fragments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainResponse {
    /// Similarity the text was generated for, in `[0, 1]`
    pub similarity: f64,
    /// Phenotype with the highest percentage, when a result was supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phenotype: Option<Phenotype>,
    pub explanation: String,
    pub recommendations: String,
    /// False when either text fell back to the fixed default
    pub generated: bool,
}

/// Request body for `POST /api/chat`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
}

/// Response for `POST /api/chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub generated: bool,
}

/// Response for `GET /api/sequences`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequencesResponse {
    pub count: usize,
    pub records: Vec<SequenceRecord>,
}

/// Status of one collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentStatus {
    /// Collaborator name (store backend or generator name)
    pub name: String,
    /// healthy, degraded, unhealthy or disabled
    pub status: String,
    /// Whether requests depending on it can be served
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Overall service health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status (starting, healthy, degraded, unhealthy)
    pub status: String,
    pub store: Option<ComponentStatus>,
    pub text_generation: Option<ComponentStatus>,
    /// Number of records in the corpus at the last check
    pub corpus_size: Option<usize>,
    /// Last health check time (ISO 8601)
    pub last_check: Option<String>,
}

/// Standard error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error type
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    pub details: Option<serde_json::Value>,
}

/// Service error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid criteria: {0}")]
    InvalidCriteria(String),

    #[error("Invalid sequence: {0}")]
    InvalidSequence(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Corpus store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Text generation failed: {0}")]
    TextGenerationFailed(String),

    #[error("Circuit breaker open - service temporarily unavailable")]
    CircuitBreakerOpen,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServiceError {
    /// Convert to HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) => 400,
            ServiceError::InvalidCriteria(_) => 400,
            ServiceError::InvalidSequence(_) => 400,
            ServiceError::Timeout => 408,
            ServiceError::ConfigError(_) => 500,
            ServiceError::InternalError(_) => 500,
            ServiceError::TextGenerationFailed(_) => 502,
            ServiceError::StoreUnavailable(_) => 503,
            ServiceError::CircuitBreakerOpen => 503,
        }
    }

    /// Machine-readable error type
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::BadRequest(_) => "bad_request",
            ServiceError::InvalidCriteria(_) => "invalid_criteria",
            ServiceError::InvalidSequence(_) => "invalid_sequence",
            ServiceError::Timeout => "timeout",
            ServiceError::StoreUnavailable(_) => "store_unavailable",
            ServiceError::TextGenerationFailed(_) => "text_generation_failed",
            ServiceError::CircuitBreakerOpen => "circuit_breaker_open",
            ServiceError::ConfigError(_) => "config_error",
            ServiceError::InternalError(_) => "internal_error",
        }
    }

    /// Convert to error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
            details: None,
        }
    }
}

impl From<PhenoError> for ServiceError {
    fn from(err: PhenoError) -> Self {
        match err {
            PhenoError::InvalidCriterion { .. } => ServiceError::InvalidCriteria(err.to_string()),
            PhenoError::Unclassifiable { criteria } => ServiceError::InvalidCriteria(format!(
                "Invalid phenotype combination ({})",
                criteria
            )),
            PhenoError::EmptySequence | PhenoError::InvalidBase { .. } => {
                ServiceError::InvalidSequence(err.to_string())
            }
            PhenoError::EmptyGeneName
            | PhenoError::EmptyBatch
            | PhenoError::MalformedBatch { .. }
            | PhenoError::UnknownPhenotype { .. } => ServiceError::BadRequest(err.to_string()),
            PhenoError::Io { .. } | PhenoError::Json { .. } => {
                ServiceError::InternalError(err.to_string())
            }
        }
    }
}

/// Standardized health check system
pub mod health_check {
    use super::*;

    /// Result of a health check operation
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub enum HealthCheckResult {
        /// Collaborator is fully operational
        Healthy,
        /// Collaborator is operational but with limitations or warnings
        Degraded { reason: String },
        /// Collaborator is not operational
        Unhealthy { reason: String },
    }

    impl HealthCheckResult {
        /// Check if the collaborator is available for use (healthy or degraded)
        pub fn is_available(&self) -> bool {
            matches!(
                self,
                HealthCheckResult::Healthy | HealthCheckResult::Degraded { .. }
            )
        }

        /// Get status string for API responses
        pub fn status_string(&self) -> &'static str {
            match self {
                HealthCheckResult::Healthy => "healthy",
                HealthCheckResult::Degraded { .. } => "degraded",
                HealthCheckResult::Unhealthy { .. } => "unhealthy",
            }
        }

        /// Reason attached to a degraded or unhealthy result
        pub fn reason(&self) -> Option<&str> {
            match self {
                HealthCheckResult::Healthy => None,
                HealthCheckResult::Degraded { reason } | HealthCheckResult::Unhealthy { reason } => {
                    Some(reason)
                }
            }
        }
    }
}
