//! Generated-text endpoints
//!
//! Both endpoints always answer 200 once the request validates; generator
//! failures are reported through `generated: false` and fallback text.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};

use crate::service::{
    handlers::{error_response, json_body, ApiError},
    server::AppState,
    textgen::{chat_prompt, explain as generate_explanation, format_markdown, FALLBACK_CHAT_RESPONSE},
    types::{ChatRequest, ChatResponse, ExplainRequest, ExplainResponse, ServiceError},
    validation::{require, validate_chat_message, validate_similarity},
};

/// Explain a comparison result or a raw similarity
///
/// When a result is supplied, its highest percentage divided by 100 is the
/// similarity; otherwise `similarity` must be given directly.
pub async fn explain(
    State(state): State<AppState>,
    payload: Result<Json<ExplainRequest>, JsonRejection>,
) -> Result<Json<ExplainResponse>, ApiError> {
    let request = json_body(payload)?;

    let (similarity, phenotype) = match (&request.result, request.similarity) {
        (Some(result), _) => {
            let (phenotype, percentage) = result.top();
            (percentage / 100.0, Some(phenotype))
        }
        (None, Some(similarity)) => (similarity, None),
        (None, None) => {
            return Err(error_response(ServiceError::BadRequest(
                "Either result or similarity is required".to_string(),
            )))
        }
    };
    let similarity = validate_similarity(similarity).map_err(|e| error_response(e.into()))?;

    let text = generate_explanation(state.text_generator.as_ref(), similarity, &request.sequences)
        .await;

    Ok(Json(ExplainResponse {
        similarity,
        phenotype,
        explanation: text.explanation,
        recommendations: text.recommendations,
        generated: text.generated,
    }))
}

/// Answer a free-form question
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let request = json_body(payload)?;
    let message = require("message", request.message.as_ref())
        .and_then(validate_chat_message)
        .map_err(|e| error_response(e.into()))?;

    let response = match state.text_generator.generate(&chat_prompt(message)).await {
        Ok(text) => ChatResponse {
            response: format_markdown(&text),
            generated: true,
        },
        Err(e) => {
            if state.text_generator.is_enabled() {
                tracing::warn!("Error generating chat response: {}", e);
            }
            ChatResponse {
                response: FALLBACK_CHAT_RESPONSE.to_string(),
                generated: false,
            }
        }
    };

    Ok(Json(response))
}
