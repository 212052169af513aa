//! Random reference records for demos and load testing
//!
//! Draws gene names from a fixed list of PCOS-associated genes, random
//! sequences of 15-24 bases, and weighted criteria. Draws that fall outside
//! the classification rule table are re-drawn, so every generated record
//! carries the phenotype the classifier would assign.

use chrono::Utc;
use rand::distributions::{Alphanumeric, DistString};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::phenotype::{Criteria, Phenotype};
use crate::record::{NewRecord, SequenceRecord};
use crate::sequence::NUCLEOTIDES;

/// Genes used for generated records
pub const SEED_GENES: [&str; 20] = [
    "INS", "FSHR", "CAPN10", "LHCGR", "AMH", "CYP19A1", "SHBG", "AR", "CYP17A1", "PPARG",
    "ADIPOQ", "LEP", "LEPR", "TNF", "IL6", "VDR", "MTHFR", "ACE", "AGT", "APOE",
];

/// Probability that each criterion is `Y`
const CYSTS_PROBABILITY: f64 = 0.7;
const IRREGULAR_CYCLE_PROBABILITY: f64 = 0.8;
const HYPERANDROGENISM_PROBABILITY: f64 = 0.6;

const MIN_SEQUENCE_LENGTH: usize = 15;
const MAX_SEQUENCE_LENGTH: usize = 25;

/// Length of generated document ids
pub const ID_LENGTH: usize = 20;

/// Generate a random alphanumeric document id
pub fn random_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    Alphanumeric.sample_string(rng, ID_LENGTH)
}

/// Random record generator
pub struct SeedGenerator {
    rng: StdRng,
}

impl SeedGenerator {
    /// Generator seeded from system entropy
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn random_sequence(&mut self) -> String {
        let length = self.rng.gen_range(MIN_SEQUENCE_LENGTH..MAX_SEQUENCE_LENGTH);
        (0..length)
            .map(|_| NUCLEOTIDES[self.rng.gen_range(0..NUCLEOTIDES.len())])
            .collect()
    }

    fn random_criteria(&mut self) -> Criteria {
        Criteria::new(
            self.rng.gen_bool(CYSTS_PROBABILITY),
            self.rng.gen_bool(IRREGULAR_CYCLE_PROBABILITY),
            self.rng.gen_bool(HYPERANDROGENISM_PROBABILITY),
        )
    }

    /// Draw criteria until they classify
    fn classifiable_criteria(&mut self) -> (Criteria, Phenotype) {
        loop {
            let criteria = self.random_criteria();
            if let Some(phenotype) = criteria.classify() {
                return (criteria, phenotype);
            }
        }
    }

    /// Generate one classified submission
    pub fn next_new_record(&mut self) -> NewRecord {
        let gene_name = SEED_GENES[self.rng.gen_range(0..SEED_GENES.len())];
        let sequence = self.random_sequence();
        let (criteria, phenotype) = self.classifiable_criteria();
        NewRecord {
            gene_name: gene_name.to_string(),
            sequence: sequence.as_str().into(),
            phenotype,
            criteria,
        }
    }

    /// Generate a stored record with an id and the current timestamp
    pub fn next_record(&mut self) -> SequenceRecord {
        let id = random_id(&mut self.rng);
        self.next_new_record().into_record(id, Utc::now())
    }

    /// Generate `count` stored records
    pub fn records(&mut self, count: usize) -> Vec<SequenceRecord> {
        (0..count).map(|_| self.next_record()).collect()
    }
}

impl Default for SeedGenerator {
    fn default() -> Self {
        Self::new()
    }
}
