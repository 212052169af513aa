//! Stored reference records and corpus files
//!
//! A [`SequenceRecord`] is created once, when a submission is classified and
//! handed to the store, and is never mutated afterwards. Corpus files are JSON
//! arrays of records in the same document shape the web service stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::PhenoError;
use crate::phenotype::{Criteria, Phenotype};
use crate::sequence::{validate_bases, NormalizedSequence};

/// One stored reference sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceRecord {
    /// Store-assigned document id
    pub id: String,
    /// Gene identifier, matched case-sensitively
    pub gene_name: String,
    /// Uppercase sequence over `ATCG` with whitespace removed
    pub sequence: String,
    /// Phenotype assigned by the classifier at creation
    pub phenotype: Phenotype,
    /// Flags that produced the phenotype
    pub criteria: Criteria,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// A classified submission that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub gene_name: String,
    pub sequence: NormalizedSequence,
    pub phenotype: Phenotype,
    pub criteria: Criteria,
}

impl NewRecord {
    /// Validate and classify a submission
    ///
    /// The gene name is trimmed but otherwise kept as given. Fails if the
    /// gene name is empty, the sequence is empty or contains non-`ATCG`
    /// characters, or the criteria fall outside the rule table; nothing is
    /// produced in that case.
    pub fn classify(
        gene_name: &str,
        sequence: &str,
        criteria: Criteria,
    ) -> Result<Self, PhenoError> {
        let gene_name = gene_name.trim();
        if gene_name.is_empty() {
            return Err(PhenoError::EmptyGeneName);
        }
        let sequence = validate_bases(sequence)?;
        let phenotype = criteria.require_phenotype()?;
        Ok(Self {
            gene_name: gene_name.to_string(),
            sequence,
            phenotype,
            criteria,
        })
    }

    /// Attach the store-assigned id and timestamp
    pub fn into_record(self, id: String, created_at: DateTime<Utc>) -> SequenceRecord {
        SequenceRecord {
            id,
            gene_name: self.gene_name,
            sequence: self.sequence.into_string(),
            phenotype: self.phenotype,
            criteria: self.criteria,
            created_at,
        }
    }
}

/// Read a corpus from a JSON array file
pub fn read_corpus(path: &Path) -> Result<Vec<SequenceRecord>, PhenoError> {
    let content = std::fs::read_to_string(path)?;
    parse_corpus(&content)
}

/// Parse a corpus from JSON text; blank input is an empty corpus
pub fn parse_corpus(content: &str) -> Result<Vec<SequenceRecord>, PhenoError> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(content)?)
}

/// Write a corpus as a pretty-printed JSON array
pub fn write_corpus(path: &Path, records: &[SequenceRecord]) -> Result<(), PhenoError> {
    let content = serde_json::to_string_pretty(records)?;
    std::fs::write(path, content)?;
    Ok(())
}
