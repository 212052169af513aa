//! Phenotype labels and the rule-based classifier
//!
//! Three binary clinical criteria (ovarian cysts, irregular cycle,
//! hyperandrogenism) map to one of four phenotype labels. Only four of the
//! eight possible combinations are covered by the rule table; the rest have no
//! classification.
//!
//! # Example
//!
//! ```
//! use phenomatch::phenotype::{classify, classify_tokens, Phenotype};
//!
//! assert_eq!(classify(true, true, true), Some(Phenotype::TypeA));
//! assert_eq!(classify(false, false, false), None);
//! assert_eq!(classify_tokens("N", "Y", "Y").unwrap(), Some(Phenotype::TypeB));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CriterionField, PhenoError};

/// One of the four fixed phenotype labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phenotype {
    #[serde(rename = "typeA")]
    TypeA,
    #[serde(rename = "typeB")]
    TypeB,
    #[serde(rename = "typeC")]
    TypeC,
    #[serde(rename = "typeD")]
    TypeD,
}

impl Phenotype {
    /// All labels in result order
    pub const ALL: [Phenotype; 4] = [
        Phenotype::TypeA,
        Phenotype::TypeB,
        Phenotype::TypeC,
        Phenotype::TypeD,
    ];

    /// Label as stored and returned over the API
    pub fn as_str(&self) -> &'static str {
        match self {
            Phenotype::TypeA => "typeA",
            Phenotype::TypeB => "typeB",
            Phenotype::TypeC => "typeC",
            Phenotype::TypeD => "typeD",
        }
    }

    /// Position in [`Phenotype::ALL`]
    pub fn index(&self) -> usize {
        match self {
            Phenotype::TypeA => 0,
            Phenotype::TypeB => 1,
            Phenotype::TypeC => 2,
            Phenotype::TypeD => 3,
        }
    }
}

impl fmt::Display for Phenotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Phenotype {
    type Err = PhenoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "typeA" => Ok(Phenotype::TypeA),
            "typeB" => Ok(Phenotype::TypeB),
            "typeC" => Ok(Phenotype::TypeC),
            "typeD" => Ok(Phenotype::TypeD),
            _ => Err(PhenoError::UnknownPhenotype {
                label: s.to_string(),
            }),
        }
    }
}

/// Parse a single `Y`/`N` criterion token
///
/// Tokens are matched exactly: `"y"`, `"yes"` or `""` are rejected rather
/// than coerced.
pub fn parse_flag(field: CriterionField, token: &str) -> Result<bool, PhenoError> {
    match token {
        "Y" => Ok(true),
        "N" => Ok(false),
        _ => Err(PhenoError::InvalidCriterion {
            field,
            token: token.to_string(),
        }),
    }
}

/// Render a flag as its `Y`/`N` token
pub fn flag_token(flag: bool) -> &'static str {
    if flag {
        "Y"
    } else {
        "N"
    }
}

/// The three clinical flags that produced a phenotype
///
/// Serialized with `Y`/`N` tokens so stored documents keep the submitted
/// representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criteria {
    #[serde(with = "token_serde")]
    pub cysts: bool,
    #[serde(with = "token_serde")]
    pub irregular_cycle: bool,
    #[serde(with = "token_serde")]
    pub hyperandrogenism: bool,
}

impl Criteria {
    pub fn new(cysts: bool, irregular_cycle: bool, hyperandrogenism: bool) -> Self {
        Self {
            cysts,
            irregular_cycle,
            hyperandrogenism,
        }
    }

    /// Parse criteria from their request tokens
    pub fn from_tokens(
        cysts: &str,
        irregular_cycle: &str,
        hyperandrogenism: &str,
    ) -> Result<Self, PhenoError> {
        Ok(Self {
            cysts: parse_flag(CriterionField::Cysts, cysts)?,
            irregular_cycle: parse_flag(CriterionField::IrregularCycle, irregular_cycle)?,
            hyperandrogenism: parse_flag(CriterionField::Hyperandrogenism, hyperandrogenism)?,
        })
    }

    /// Apply the rule table
    pub fn classify(&self) -> Option<Phenotype> {
        classify(self.cysts, self.irregular_cycle, self.hyperandrogenism)
    }

    /// Apply the rule table, treating "no classification" as an error
    pub fn require_phenotype(&self) -> Result<Phenotype, PhenoError> {
        self.classify().ok_or_else(|| PhenoError::Unclassifiable {
            criteria: self.to_string(),
        })
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cysts={}, irregularCycle={}, hyperandrogenism={}",
            flag_token(self.cysts),
            flag_token(self.irregular_cycle),
            flag_token(self.hyperandrogenism)
        )
    }
}

mod token_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(super::flag_token(*flag))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let token = String::deserialize(deserializer)?;
        match token.as_str() {
            "Y" => Ok(true),
            "N" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected \"Y\" or \"N\", found {:?}",
                other
            ))),
        }
    }
}

/// Map the three clinical flags to a phenotype
///
/// | cysts | irregular cycle | hyperandrogenism | result |
/// |-------|-----------------|------------------|--------|
/// | Y     | Y               | Y                | typeA  |
/// | N     | Y               | Y                | typeB  |
/// | Y     | N               | Y                | typeC  |
/// | Y     | Y               | N                | typeD  |
///
/// Every other combination returns `None`.
pub fn classify(cysts: bool, irregular_cycle: bool, hyperandrogenism: bool) -> Option<Phenotype> {
    match (cysts, irregular_cycle, hyperandrogenism) {
        (true, true, true) => Some(Phenotype::TypeA),
        (false, true, true) => Some(Phenotype::TypeB),
        (true, false, true) => Some(Phenotype::TypeC),
        (true, true, false) => Some(Phenotype::TypeD),
        _ => None,
    }
}

/// Classify from raw `Y`/`N` tokens
///
/// Invalid tokens are an error; a valid combination outside the rule table
/// is `Ok(None)`.
pub fn classify_tokens(
    cysts: &str,
    irregular_cycle: &str,
    hyperandrogenism: &str,
) -> Result<Option<Phenotype>, PhenoError> {
    Criteria::from_tokens(cysts, irregular_cycle, hyperandrogenism).map(|c| c.classify())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Y", "Y", "Y", Some(Phenotype::TypeA))]
    #[case("N", "Y", "Y", Some(Phenotype::TypeB))]
    #[case("Y", "N", "Y", Some(Phenotype::TypeC))]
    #[case("Y", "Y", "N", Some(Phenotype::TypeD))]
    #[case("N", "N", "N", None)]
    #[case("Y", "N", "N", None)]
    #[case("N", "Y", "N", None)]
    #[case("N", "N", "Y", None)]
    fn test_classify_rule_table(
        #[case] cysts: &str,
        #[case] irregular: &str,
        #[case] hyper: &str,
        #[case] expected: Option<Phenotype>,
    ) {
        assert_eq!(classify_tokens(cysts, irregular, hyper).unwrap(), expected);
    }

    #[test]
    fn test_classify_is_total_over_valid_input() {
        let mut classified = 0;
        for cysts in [true, false] {
            for irregular in [true, false] {
                for hyper in [true, false] {
                    if classify(cysts, irregular, hyper).is_some() {
                        classified += 1;
                    }
                }
            }
        }
        assert_eq!(classified, 4);
    }

    #[rstest]
    #[case("y")]
    #[case("n")]
    #[case("yes")]
    #[case("")]
    #[case(" Y")]
    #[case("1")]
    fn test_invalid_tokens_rejected(#[case] token: &str) {
        let result = classify_tokens(token, "Y", "Y");
        assert!(matches!(
            result,
            Err(PhenoError::InvalidCriterion {
                field: CriterionField::Cysts,
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_token_reports_field() {
        let err = classify_tokens("Y", "Y", "maybe").unwrap_err();
        assert_eq!(
            err,
            PhenoError::InvalidCriterion {
                field: CriterionField::Hyperandrogenism,
                token: "maybe".to_string()
            }
        );
    }

    #[test]
    fn test_require_phenotype() {
        let criteria = Criteria::new(false, false, false);
        assert!(matches!(
            criteria.require_phenotype(),
            Err(PhenoError::Unclassifiable { .. })
        ));
        assert_eq!(
            Criteria::new(true, true, false).require_phenotype().unwrap(),
            Phenotype::TypeD
        );
    }

    #[test]
    fn test_phenotype_labels_round_trip() {
        for phenotype in Phenotype::ALL {
            assert_eq!(phenotype.as_str().parse::<Phenotype>().unwrap(), phenotype);
            assert_eq!(Phenotype::ALL[phenotype.index()], phenotype);
        }
        assert!("typeE".parse::<Phenotype>().is_err());
        assert!("TypeA".parse::<Phenotype>().is_err());
    }

    #[test]
    fn test_criteria_serialized_as_tokens() {
        let criteria = Criteria::new(true, false, true);
        let json = serde_json::to_value(criteria).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"cysts": "Y", "irregularCycle": "N", "hyperandrogenism": "Y"})
        );

        let parsed: Criteria = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, criteria);

        let bad = serde_json::json!({"cysts": "y", "irregularCycle": "N", "hyperandrogenism": "Y"});
        assert!(serde_json::from_value::<Criteria>(bad).is_err());
    }

    #[test]
    fn test_phenotype_serde_label() {
        assert_eq!(
            serde_json::to_string(&Phenotype::TypeC).unwrap(),
            "\"typeC\""
        );
    }
}
