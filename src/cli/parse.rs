//! Parsing utilities for CLI operations

use crate::compare::GeneComparison;
use crate::error::PhenoError;

use super::process_input_line;

/// Parse a `GENE:SEQUENCE` comparison pair
///
/// A tab may be used instead of the colon, so two-column TSV lines parse the
/// same way. The sequence is kept as given; normalization happens at
/// comparison time.
///
/// # Examples
///
/// ```
/// use phenomatch::cli::parse_pair;
///
/// let pair = parse_pair("FSHR:ATGC").unwrap();
/// assert_eq!(pair.gene_name, "FSHR");
/// assert_eq!(pair.new_sequence, "ATGC");
///
/// assert!(parse_pair("FSHR").is_err());
/// assert!(parse_pair(":ATGC").is_err());
/// ```
pub fn parse_pair(input: &str) -> Result<GeneComparison, PhenoError> {
    let (gene_name, sequence) = input
        .split_once(':')
        .or_else(|| input.split_once('\t'))
        .ok_or_else(|| PhenoError::MalformedBatch {
            msg: format!("expected GENE:SEQUENCE, found {:?}", input),
        })?;

    let pair = GeneComparison::new(gene_name.trim(), sequence.trim());
    if !pair.is_complete() {
        return Err(PhenoError::MalformedBatch {
            msg: format!("pair {:?} is missing a gene name or sequence", input),
        });
    }
    Ok(pair)
}

/// Parse every non-comment line of a pairs file
///
/// Blank lines and `#` comments are skipped. Errors carry the 1-based line
/// number.
pub fn parse_pairs(content: &str) -> Result<Vec<GeneComparison>, PhenoError> {
    let mut pairs = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let Some(line) = process_input_line(line, index == 0) else {
            continue;
        };
        let pair = parse_pair(line).map_err(|e| PhenoError::MalformedBatch {
            msg: format!("line {}: {}", index + 1, e),
        })?;
        pairs.push(pair);
    }
    Ok(pairs)
}
