// Copyright (c) 2025 The phenomatch developers
// SPDX-License-Identifier: MIT

//! phenomatch: rule-based phenotype classification and sequence matching
//!
//! Submitted sequences are tagged with three clinical criteria, classified
//! into one of four phenotype labels, and stored in a reference corpus. New
//! batches of `(gene, sequence)` pairs are compared against that corpus to
//! produce a per-phenotype match percentage.
//!
//! # Example
//!
//! ```
//! use phenomatch::{aggregate, classify, similarity, GeneComparison, Phenotype};
//!
//! assert_eq!(classify(true, true, true), Some(Phenotype::TypeA));
//! assert_eq!(similarity("ATCG", "ATGG"), 0.75);
//!
//! // Nothing in an empty corpus matches
//! let result = aggregate(&[], &[GeneComparison::new("FSHR", "ATGC")]).unwrap();
//! assert!(result.is_zero());
//! ```

pub mod cli;
pub mod compare;
pub mod error;
pub mod phenotype;
pub mod record;
pub mod seed;
pub mod sequence;
#[cfg(feature = "web-service")]
pub mod service;

// Re-export commonly used types
pub use compare::{
    aggregate, aggregate_detailed, ComparisonResult, ComparisonSummary, CorpusIndex,
    GeneComparison, PhenotypeTally,
};
pub use error::{CriterionField, PhenoError};
pub use phenotype::{classify, classify_tokens, Criteria, Phenotype};
pub use record::{NewRecord, SequenceRecord};
pub use seed::SeedGenerator;
pub use sequence::{similarity, NormalizedSequence};

/// Result type alias for phenomatch operations
pub type Result<T> = std::result::Result<T, PhenoError>;
