//! Batch comparison of submitted sequences against the reference corpus
//!
//! The corpus is grouped into `(phenotype, gene)` buckets once per call. Each
//! submitted `(gene, sequence)` pair is then compared with every stored
//! sequence in the bucket for its gene, for every phenotype. A phenotype's
//! percentage is the share of those comparisons that were exact positional
//! matches, normalized by that phenotype's own comparison count, so the four
//! percentages do not in general sum to 100.
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use phenomatch::compare::{aggregate, GeneComparison};
//! use phenomatch::phenotype::{Criteria, Phenotype};
//! use phenomatch::record::NewRecord;
//!
//! let corpus = vec![
//!     NewRecord::classify("FSHR", "ATGC", Criteria::new(true, true, true))
//!         .unwrap()
//!         .into_record("a".into(), Utc::now()),
//!     NewRecord::classify("FSHR", "ATGG", Criteria::new(false, true, true))
//!         .unwrap()
//!         .into_record("b".into(), Utc::now()),
//! ];
//! let batch = vec![GeneComparison::new("FSHR", "ATGC")];
//!
//! let result = aggregate(&corpus, &batch).unwrap();
//! assert_eq!(result.get(Phenotype::TypeA), 100.0);
//! assert_eq!(result.get(Phenotype::TypeB), 0.0);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::PhenoError;
use crate::phenotype::Phenotype;
use crate::record::SequenceRecord;
use crate::sequence::{is_exact_match, NormalizedSequence};

/// One `(gene, sequence)` pair of a comparison batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneComparison {
    pub gene_name: String,
    pub new_sequence: String,
}

impl GeneComparison {
    pub fn new(gene_name: impl Into<String>, new_sequence: impl Into<String>) -> Self {
        Self {
            gene_name: gene_name.into(),
            new_sequence: new_sequence.into(),
        }
    }

    /// Both fields are present and non-empty
    ///
    /// Whitespace-only values still count: a blank sequence normalizes to
    /// empty and is compared (never matching), a blank gene finds no bucket.
    pub fn is_complete(&self) -> bool {
        !self.gene_name.is_empty() && !self.new_sequence.is_empty()
    }
}

/// Exact-match and comparison counts for one phenotype
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PhenotypeTally {
    pub matches: usize,
    pub total: usize,
}

impl PhenotypeTally {
    /// Match percentage rounded to two decimals; `0.0` when nothing was compared
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        round2(self.matches as f64 / self.total as f64 * 100.0)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Per-phenotype match percentages in `[0, 100]`
///
/// All four labels are always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    #[serde(rename = "typeA")]
    pub type_a: f64,
    #[serde(rename = "typeB")]
    pub type_b: f64,
    #[serde(rename = "typeC")]
    pub type_c: f64,
    #[serde(rename = "typeD")]
    pub type_d: f64,
}

impl ComparisonResult {
    /// Build from tallies indexed by [`Phenotype::index`]
    pub fn from_tallies(tallies: &[PhenotypeTally; 4]) -> Self {
        Self {
            type_a: tallies[Phenotype::TypeA.index()].percentage(),
            type_b: tallies[Phenotype::TypeB.index()].percentage(),
            type_c: tallies[Phenotype::TypeC.index()].percentage(),
            type_d: tallies[Phenotype::TypeD.index()].percentage(),
        }
    }

    pub fn get(&self, phenotype: Phenotype) -> f64 {
        match phenotype {
            Phenotype::TypeA => self.type_a,
            Phenotype::TypeB => self.type_b,
            Phenotype::TypeC => self.type_c,
            Phenotype::TypeD => self.type_d,
        }
    }

    /// Labels paired with their percentages, in label order
    pub fn iter(&self) -> impl Iterator<Item = (Phenotype, f64)> + '_ {
        Phenotype::ALL.into_iter().map(|p| (p, self.get(p)))
    }

    /// Highest percentage and its label; ties go to the earlier label
    pub fn top(&self) -> (Phenotype, f64) {
        self.iter()
            .fold((Phenotype::TypeA, self.type_a), |best, (p, v)| {
                if v > best.1 {
                    (p, v)
                } else {
                    best
                }
            })
    }

    /// Whether every percentage is zero
    pub fn is_zero(&self) -> bool {
        self.iter().all(|(_, v)| v == 0.0)
    }
}

/// Result of one aggregation pass with the counts behind it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSummary {
    pub result: ComparisonResult,
    /// Tallies indexed by [`Phenotype::index`]
    pub tallies: [PhenotypeTally; 4],
    /// Batch entries that were compared
    pub compared_pairs: usize,
    /// Batch entries skipped for a missing gene name or sequence
    pub skipped_pairs: usize,
}

impl ComparisonSummary {
    pub fn tally(&self, phenotype: Phenotype) -> PhenotypeTally {
        self.tallies[phenotype.index()]
    }
}

/// Corpus grouped by phenotype, then gene, with sequences pre-normalized
///
/// Gene names are matched exactly as stored and as submitted.
#[derive(Debug, Clone, Default)]
pub struct CorpusIndex {
    buckets: HashMap<Phenotype, HashMap<String, Vec<NormalizedSequence>>>,
    records: usize,
}

impl CorpusIndex {
    /// Group a corpus snapshot
    pub fn build(corpus: &[SequenceRecord]) -> Self {
        let mut buckets: HashMap<Phenotype, HashMap<String, Vec<NormalizedSequence>>> =
            HashMap::new();
        for record in corpus {
            buckets
                .entry(record.phenotype)
                .or_default()
                .entry(record.gene_name.clone())
                .or_default()
                .push(NormalizedSequence::new(&record.sequence));
        }
        Self {
            buckets,
            records: corpus.len(),
        }
    }

    /// Stored sequences for a phenotype and gene; empty if none
    pub fn sequences(&self, phenotype: Phenotype, gene_name: &str) -> &[NormalizedSequence] {
        self.buckets
            .get(&phenotype)
            .and_then(|genes| genes.get(gene_name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of records the index was built from
    pub fn len(&self) -> usize {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    /// Number of non-empty `(phenotype, gene)` buckets
    pub fn bucket_count(&self) -> usize {
        self.buckets.values().map(HashMap::len).sum()
    }

    /// Compare a batch against the indexed corpus
    ///
    /// Fails only if the batch is empty or has no complete entry. Entries
    /// naming a gene absent from the corpus contribute nothing.
    pub fn compare(&self, batch: &[GeneComparison]) -> Result<ComparisonSummary, PhenoError> {
        if batch.is_empty() {
            return Err(PhenoError::EmptyBatch);
        }

        let mut tallies = [PhenotypeTally::default(); 4];
        let mut compared_pairs = 0;
        let mut skipped_pairs = 0;

        for (index, comparison) in batch.iter().enumerate() {
            if !comparison.is_complete() {
                tracing::warn!(
                    "Skipping comparison {} with missing geneName or newSequence",
                    index
                );
                skipped_pairs += 1;
                continue;
            }
            compared_pairs += 1;

            let gene_name = comparison.gene_name.as_str();
            let submitted = NormalizedSequence::new(&comparison.new_sequence);

            for phenotype in Phenotype::ALL {
                let tally = &mut tallies[phenotype.index()];
                for stored in self.sequences(phenotype, gene_name) {
                    tally.total += 1;
                    if is_exact_match(&submitted, stored) {
                        tally.matches += 1;
                    }
                }
            }
        }

        if compared_pairs == 0 {
            return Err(PhenoError::MalformedBatch {
                msg: "no entry has both geneName and newSequence".to_string(),
            });
        }

        tracing::debug!(
            "Compared {} pairs against {} records ({} skipped)",
            compared_pairs,
            self.records,
            skipped_pairs
        );

        Ok(ComparisonSummary {
            result: ComparisonResult::from_tallies(&tallies),
            tallies,
            compared_pairs,
            skipped_pairs,
        })
    }
}

/// Compare a batch against a corpus snapshot, returning percentages only
pub fn aggregate(
    corpus: &[SequenceRecord],
    batch: &[GeneComparison],
) -> Result<ComparisonResult, PhenoError> {
    aggregate_detailed(corpus, batch).map(|summary| summary.result)
}

/// Compare a batch against a corpus snapshot, keeping the tallies
pub fn aggregate_detailed(
    corpus: &[SequenceRecord],
    batch: &[GeneComparison],
) -> Result<ComparisonSummary, PhenoError> {
    CorpusIndex::build(corpus).compare(batch)
}
