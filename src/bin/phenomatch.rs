// Copyright (c) 2025 The phenomatch developers
// SPDX-License-Identifier: MIT

//! phenomatch CLI
//!
//! Offline phenotype classification, sequence similarity and corpus
//! comparison.

use clap::{Parser, Subcommand};
use phenomatch::cli::{
    output_classification, output_comparison, output_error, output_similarity, parse_pair,
    parse_pairs, OutputFormat,
};
use phenomatch::record::{read_corpus, write_corpus};
use phenomatch::{aggregate_detailed, similarity, Criteria, PhenoError, SeedGenerator};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "phenomatch")]
#[command(author, version, about = "Phenotype classifier and sequence matcher")]
#[command(long_about = "Classify clinical criteria into phenotypes and compare sequences \
against a reference corpus.

Examples:
  phenomatch classify Y Y Y
  phenomatch similarity ATCG ATGG
  phenomatch compare --corpus corpus.json --pair FSHR:ATGCATGC --pair LHCGR:GGCA
  phenomatch compare --corpus corpus.json --pairs-file pairs.txt --format json
  phenomatch seed --count 100 --output corpus.json --seed 42")]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify three Y/N criteria into a phenotype
    Classify {
        /// Ovarian cysts (Y or N)
        cysts: String,

        /// Irregular menstrual cycle (Y or N)
        irregular_cycle: String,

        /// Hyperandrogenism (Y or N)
        hyperandrogenism: String,

        /// Output format
        #[arg(short = 'f', long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Positional similarity of two sequences
    Similarity {
        /// First sequence
        a: String,

        /// Second sequence
        b: String,

        /// Output format
        #[arg(short = 'f', long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Compare gene/sequence pairs against a corpus file
    Compare {
        /// Corpus file (JSON array of records)
        #[arg(short, long)]
        corpus: PathBuf,

        /// Pair in GENE:SEQUENCE form (repeatable)
        #[arg(long = "pair")]
        pairs: Vec<String>,

        /// File with one GENE:SEQUENCE pair per line (use - for stdin)
        #[arg(long)]
        pairs_file: Option<PathBuf>,

        /// Output format
        #[arg(short = 'f', long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Write randomly generated classified records
    Seed {
        /// Number of records
        #[arg(short = 'n', long, default_value = "20")]
        count: usize,

        /// Output corpus file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    match cli.command {
        Commands::Classify {
            cysts,
            irregular_cycle,
            hyperandrogenism,
            format,
        } => {
            let code = run_classify(
                &cysts,
                &irregular_cycle,
                &hyperandrogenism,
                parse_format(&format),
            )?;
            if code != 0 {
                std::process::exit(code);
            }
        }
        Commands::Similarity { a, b, format } => {
            let ratio = similarity(&a, &b);
            let stdout = io::stdout();
            output_similarity(&mut stdout.lock(), &a, &b, ratio, parse_format(&format))?;
        }
        Commands::Compare {
            corpus,
            pairs,
            pairs_file,
            format,
        } => {
            let format = parse_format(&format);
            if let Err(e) = run_compare(&corpus, &pairs, pairs_file.as_deref(), format) {
                let stderr = io::stderr();
                output_error(&mut stderr.lock(), &corpus.display().to_string(), &e, format)?;
                std::process::exit(1);
            }
        }
        Commands::Seed {
            count,
            output,
            seed,
        } => run_seed(count, output.as_deref(), seed)?,
    }

    Ok(())
}

fn parse_format(format: &str) -> OutputFormat {
    format.parse().unwrap_or_default()
}

/// Returns the process exit code: 0 classified, 2 no classification, 1 invalid token
fn run_classify(
    cysts: &str,
    irregular_cycle: &str,
    hyperandrogenism: &str,
    format: OutputFormat,
) -> io::Result<i32> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match Criteria::from_tokens(cysts, irregular_cycle, hyperandrogenism) {
        Ok(criteria) => {
            let phenotype = criteria.classify();
            output_classification(&mut out, &criteria, phenotype, format)?;
            Ok(if phenotype.is_some() { 0 } else { 2 })
        }
        Err(e) => {
            let input = format!("{} {} {}", cysts, irregular_cycle, hyperandrogenism);
            output_error(&mut io::stderr().lock(), &input, &e, format)?;
            Ok(1)
        }
    }
}

fn run_compare(
    corpus_path: &Path,
    pair_args: &[String],
    pairs_file: Option<&Path>,
    format: OutputFormat,
) -> Result<(), PhenoError> {
    let corpus = read_corpus(corpus_path)?;
    info!(
        "Loaded {} records from {}",
        corpus.len(),
        corpus_path.display()
    );

    let mut batch = pair_args
        .iter()
        .map(|pair| parse_pair(pair))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(path) = pairs_file {
        let content = if path == Path::new("-") {
            let mut content = String::new();
            io::stdin().read_to_string(&mut content)?;
            content
        } else {
            std::fs::read_to_string(path)?
        };
        batch.extend(parse_pairs(&content)?);
    }
    debug!("Comparing {} pairs", batch.len());

    let summary = aggregate_detailed(&corpus, &batch)?;
    if summary.skipped_pairs > 0 {
        warn!("Skipped {} incomplete pairs", summary.skipped_pairs);
    }

    let stdout = io::stdout();
    output_comparison(&mut stdout.lock(), &summary, format)?;
    Ok(())
}

fn run_seed(
    count: usize,
    output: Option<&Path>,
    seed: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut generator = match seed {
        Some(seed) => SeedGenerator::with_seed(seed),
        None => SeedGenerator::new(),
    };
    let records = generator.records(count);

    match output {
        Some(path) => {
            write_corpus(path, &records)?;
            info!("Wrote {} records to {}", records.len(), path.display());
        }
        None => {
            let mut writer = BufWriter::new(io::stdout().lock());
            serde_json::to_writer_pretty(&mut writer, &records)?;
            writeln!(writer)?;
            writer.flush()?;
        }
    }
    Ok(())
}

fn init_tracing(level: &str) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter =
        EnvFilter::try_new(level).map_err(|e| format!("Invalid log level '{}': {}", level, e))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_defaults_to_info() {
        let cli = Cli::try_parse_from(["phenomatch", "classify", "Y", "Y", "Y"]).unwrap();
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_log_level_is_global() {
        let args = ["phenomatch", "similarity", "AT", "AT", "--log-level", "debug"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.log_level, "debug");
    }
}
