//! Corpus write and listing endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
};

use crate::record::NewRecord;
use crate::service::{
    handlers::{error_response, json_body, ApiError},
    server::AppState,
    types::{AddSequenceRequest, AddSequenceResponse, SequencesResponse, ServiceError},
    validation::{require, validate_criteria, validate_gene_name, validate_sequence},
};

/// Validate and classify a submission without touching the store
pub fn classify_submission(request: &AddSequenceRequest) -> Result<NewRecord, ServiceError> {
    let gene_name = validate_gene_name(require("geneName", request.gene_name.as_ref())?)?;
    let sequence = validate_sequence(require("sequence", request.sequence.as_ref())?)?;
    let criteria = validate_criteria(
        require("cysts", request.cysts.as_ref())?,
        require("irregularCycle", request.irregular_cycle.as_ref())?,
        require("hyperandrogenism", request.hyperandrogenism.as_ref())?,
    )?;
    Ok(NewRecord::classify(gene_name, sequence.as_str(), criteria)?)
}

/// Classify a submission and store it
///
/// Nothing is written unless the criteria classify.
pub async fn add_sequence(
    State(state): State<AppState>,
    payload: Result<Json<AddSequenceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AddSequenceResponse>), ApiError> {
    let request = json_body(payload)?;
    let new_record = classify_submission(&request).map_err(|e| {
        tracing::debug!("Rejected submission: {}", e);
        error_response(e)
    })?;

    let stored = state.store.insert(new_record).await.map_err(|e| {
        tracing::error!("Failed to store sequence: {}", e);
        error_response(e)
    })?;

    tracing::info!(
        "Stored {} sequence for {} as {}",
        stored.phenotype,
        stored.gene_name,
        stored.id
    );

    Ok((
        StatusCode::CREATED,
        Json(AddSequenceResponse {
            message: "Sequence added successfully".to_string(),
            id: stored.id,
            phenotype: stored.phenotype,
        }),
    ))
}

/// Return the full corpus
pub async fn list_sequences(
    State(state): State<AppState>,
) -> Result<Json<SequencesResponse>, ApiError> {
    let records = state.fetch_corpus().await.map_err(error_response)?;
    Ok(Json(SequencesResponse {
        count: records.len(),
        records,
    }))
}
