//! Output formatting utilities for CLI operations

use crate::compare::ComparisonSummary;
use crate::error::PhenoError;
use crate::phenotype::{flag_token, Criteria, Phenotype};
use serde_json::json;
use std::io::{self, Write};
use std::str::FromStr;

/// Output format for CLI results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Plain text format (default)
    #[default]
    Text,
    /// JSON format
    Json,
}

impl FromStr for OutputFormat {
    type Err = std::convert::Infallible;

    /// Parse an output format from a string
    ///
    /// # Examples
    ///
    /// ```
    /// use phenomatch::cli::OutputFormat;
    /// use std::str::FromStr;
    ///
    /// assert!(matches!(OutputFormat::from_str("json").unwrap(), OutputFormat::Json));
    /// assert!(matches!(OutputFormat::from_str("text").unwrap(), OutputFormat::Text));
    /// assert!(matches!(OutputFormat::from_str("other").unwrap(), OutputFormat::Text));
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        })
    }
}

/// Write a classification result
///
/// # Examples
///
/// ```
/// use phenomatch::cli::{output_classification, OutputFormat};
/// use phenomatch::{Criteria, Phenotype};
/// use std::io::Cursor;
///
/// let mut buffer = Cursor::new(Vec::new());
/// let criteria = Criteria::new(true, true, true);
/// output_classification(&mut buffer, &criteria, Some(Phenotype::TypeA), OutputFormat::Text).unwrap();
/// let result = String::from_utf8(buffer.into_inner()).unwrap();
/// assert_eq!(result, "typeA\n");
/// ```
pub fn output_classification<W: Write>(
    writer: &mut W,
    criteria: &Criteria,
    phenotype: Option<Phenotype>,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let value = json!({
                "cysts": flag_token(criteria.cysts),
                "irregularCycle": flag_token(criteria.irregular_cycle),
                "hyperandrogenism": flag_token(criteria.hyperandrogenism),
                "phenotype": phenotype.map(|p| p.as_str()),
            });
            writeln!(writer, "{}", value)
        }
        OutputFormat::Text => match phenotype {
            Some(phenotype) => writeln!(writer, "{}", phenotype),
            None => writeln!(writer, "no classification ({})", criteria),
        },
    }
}

/// Write a similarity ratio
pub fn output_similarity<W: Write>(
    writer: &mut W,
    a: &str,
    b: &str,
    ratio: f64,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let value = json!({"a": a, "b": b, "similarity": ratio});
            writeln!(writer, "{}", value)
        }
        OutputFormat::Text => writeln!(writer, "{:.4}", ratio),
    }
}

/// Write a comparison result with the tallies behind each percentage
///
/// Text output has one line per phenotype in label order:
/// `typeA\t100.00\t1/1`.
pub fn output_comparison<W: Write>(
    writer: &mut W,
    summary: &ComparisonSummary,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let value = json!({
                "result": summary.result,
                "tallies": Phenotype::ALL
                    .iter()
                    .map(|p| (p.as_str().to_string(), json!(summary.tally(*p))))
                    .collect::<serde_json::Map<String, serde_json::Value>>(),
                "comparedPairs": summary.compared_pairs,
                "skippedPairs": summary.skipped_pairs,
            });
            writeln!(writer, "{}", value)
        }
        OutputFormat::Text => {
            for (phenotype, percentage) in summary.result.iter() {
                let tally = summary.tally(phenotype);
                writeln!(
                    writer,
                    "{}\t{:.2}\t{}/{}",
                    phenotype, percentage, tally.matches, tally.total
                )?;
            }
            if summary.skipped_pairs > 0 {
                writeln!(writer, "# skipped {} incomplete pairs", summary.skipped_pairs)?;
            }
            Ok(())
        }
    }
}

/// Write an error to the output
///
/// # Examples
///
/// ```
/// use phenomatch::cli::{output_error, OutputFormat};
/// use phenomatch::PhenoError;
/// use std::io::Cursor;
///
/// let mut buffer = Cursor::new(Vec::new());
/// output_error(&mut buffer, "Q", &PhenoError::EmptyBatch, OutputFormat::Text).unwrap();
/// let result = String::from_utf8(buffer.into_inner()).unwrap();
/// assert!(result.starts_with("ERROR: Q"));
/// ```
pub fn output_error<W: Write>(
    writer: &mut W,
    input: &str,
    error: &PhenoError,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let value = json!({
                "input": input,
                "error": error.to_string(),
                "status": "error",
            });
            writeln!(writer, "{}", value)
        }
        OutputFormat::Text => writeln!(writer, "ERROR: {} - {}", input, error),
    }
}
