//! Health check endpoints

use axum::{extract::State, response::Json};

use crate::service::{
    handlers::ApiError,
    server::AppState,
    types::{health_check::HealthCheckResult, ComponentStatus, HealthResponse},
};

/// Check overall service health - returns cached health from periodic background task
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let cached = state.health_cache.response.read().await;
    if let Some(ref response) = *cached {
        return Ok(Json(response.clone()));
    }
    drop(cached);

    // Background task will populate the cache shortly
    Ok(Json(HealthResponse {
        status: "starting".to_string(),
        store: None,
        text_generation: None,
        corpus_size: None,
        last_check: None,
    }))
}

fn component(name: &str, result: &HealthCheckResult) -> ComponentStatus {
    ComponentStatus {
        name: name.to_string(),
        status: result.status_string().to_string(),
        available: result.is_available(),
        message: result.reason().map(str::to_string),
    }
}

/// Check every collaborator and summarize (used by background task)
///
/// The store decides whether the service is unhealthy. A failing text
/// generator only degrades it, since comparisons do not depend on it.
pub async fn run_health_check(state: &AppState) -> HealthResponse {
    let store_result = state.store.health_check().await;
    let corpus_size = match state.store.count().await {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::warn!("Failed to count corpus records: {}", e);
            None
        }
    };

    let generator = state.text_generator.as_ref();
    let (text_status, text_result) = if generator.is_enabled() {
        let result = generator.health_check().await;
        (component(generator.name(), &result), Some(result))
    } else {
        (
            ComponentStatus {
                name: generator.name().to_string(),
                status: "disabled".to_string(),
                available: false,
                message: None,
            },
            None,
        )
    };

    let status = match (&store_result, &text_result) {
        (HealthCheckResult::Unhealthy { .. }, _) => "unhealthy",
        (HealthCheckResult::Degraded { .. }, _) => "degraded",
        (_, Some(HealthCheckResult::Healthy)) | (_, None) => "healthy",
        (_, Some(_)) => "degraded",
    };

    if status != "healthy" {
        tracing::warn!(
            "Service {}: store={}, text_generation={}",
            status,
            store_result.status_string(),
            text_status.status
        );
    }

    HealthResponse {
        status: status.to_string(),
        store: Some(component(state.store.backend_name(), &store_result)),
        text_generation: Some(text_status),
        corpus_size,
        last_check: Some(chrono::Utc::now().to_rfc3339()),
    }
}
