//! Corpus comparison endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};

use crate::compare::{aggregate_detailed, ComparisonResult, GeneComparison};
use crate::service::{
    handlers::{error_response, json_body, ApiError},
    server::AppState,
    types::{CompareRequest, GeneComparisonInput, LegacyCompareRequest, ServiceError},
    validation::{require, validate_batch_size},
};

/// Compare a batch against a fresh corpus snapshot
async fn run_comparison(
    state: &AppState,
    batch: Vec<GeneComparison>,
) -> Result<ComparisonResult, ServiceError> {
    let corpus = state.fetch_corpus().await?;
    let summary = aggregate_detailed(&corpus, &batch)?;
    tracing::debug!(
        "Compared {} pairs ({} skipped) against {} records: {:?}",
        summary.compared_pairs,
        summary.skipped_pairs,
        corpus.len(),
        summary.result
    );
    Ok(summary.result)
}

/// Per-phenotype exact-match percentages for a batch of `(gene, sequence)` pairs
///
/// Entries with a missing gene name or sequence are skipped; the request
/// fails only if no entry is complete. Genes absent from the corpus
/// contribute nothing.
pub async fn compare_sequences(
    State(state): State<AppState>,
    payload: Result<Json<CompareRequest>, JsonRejection>,
) -> Result<Json<ComparisonResult>, ApiError> {
    let request = json_body(payload)?;

    validate_batch_size(request.gene_comparisons.len(), state.config.max_batch_size())
        .map_err(|e| error_response(e.into()))?;

    let batch = request
        .gene_comparisons
        .into_iter()
        .map(GeneComparisonInput::into_comparison)
        .collect();

    run_comparison(&state, batch)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Single-pair comparison with the same result schema
pub async fn compare_sequences_legacy(
    State(state): State<AppState>,
    payload: Result<Json<LegacyCompareRequest>, JsonRejection>,
) -> Result<Json<ComparisonResult>, ApiError> {
    let request = json_body(payload)?;

    let gene_name = require("geneName", request.gene_name.as_ref())
        .map_err(|e| error_response(e.into()))?;
    let sequence =
        require("sequence", request.sequence.as_ref()).map_err(|e| error_response(e.into()))?;

    run_comparison(&state, vec![GeneComparison::new(gene_name, sequence)])
        .await
        .map(Json)
        .map_err(error_response)
}
