//! HTTP request handlers for the phenomatch web service

use axum::{extract::rejection::JsonRejection, http::StatusCode, response::Json};

use crate::service::types::{ErrorResponse, ServiceError};

pub mod compare;
pub mod explain;
pub mod health;
pub mod info;
pub mod sequences;

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Convert a service error into its HTTP status and JSON body
pub fn error_response(error: ServiceError) -> ApiError {
    let status_code =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status_code, Json(error.to_response()))
}

/// Unwrap a JSON body, reporting rejections as `bad_request`
///
/// Oversized bodies keep their 413 status.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        let error = ServiceError::BadRequest(rejection.body_text());
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            (StatusCode::PAYLOAD_TOO_LARGE, Json(error.to_response()))
        } else {
            error_response(error)
        }
    })
}
