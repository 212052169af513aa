//! CLI utilities for phenomatch
//!
//! This module provides testable functions used by the CLI binaries.
//! Parsing and output formatting live in the library so they can be unit
//! tested against in-memory buffers.

pub mod format;
pub mod parse;

// Re-export commonly used items
pub use format::{
    output_classification, output_comparison, output_error, output_similarity, OutputFormat,
};
pub use parse::{parse_pair, parse_pairs};

/// UTF-8 BOM (Byte Order Mark) constant
const UTF8_BOM: &str = "\u{feff}";

/// Strip UTF-8 BOM from the beginning of a string if present.
///
/// This is common when files are exported from Windows applications or Excel.
///
/// # Examples
///
/// ```
/// use phenomatch::cli::strip_bom;
///
/// assert_eq!(strip_bom("\u{feff}FSHR:ATGC"), "FSHR:ATGC");
/// assert_eq!(strip_bom("FSHR:ATGC"), "FSHR:ATGC");
/// ```
pub fn strip_bom(s: &str) -> &str {
    s.strip_prefix(UTF8_BOM).unwrap_or(s)
}

/// Strip inline comments from an input line.
///
/// Comments start with `#` and extend to the end of the line.
///
/// # Examples
///
/// ```
/// use phenomatch::cli::strip_inline_comment;
///
/// assert_eq!(strip_inline_comment("FSHR:ATGC  # control"), "FSHR:ATGC");
/// assert_eq!(strip_inline_comment("# full line comment"), "");
/// ```
pub fn strip_inline_comment(s: &str) -> &str {
    match s.find('#') {
        Some(pos) => s[..pos].trim(),
        None => s.trim(),
    }
}

/// Process an input line: trim whitespace, strip BOM (for first line), and strip inline comments.
///
/// Returns None if the line is empty or a comment-only line.
pub fn process_input_line(line: &str, is_first_line: bool) -> Option<&str> {
    let line = line.trim();
    let line = if is_first_line { strip_bom(line) } else { line };
    let line = strip_inline_comment(line);

    if line.is_empty() {
        None
    } else {
        Some(line)
    }
}
