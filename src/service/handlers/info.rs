//! Service information endpoints

use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::service::server::AppState;

/// Provide basic service information
pub async fn service_info(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "service": "phenomatch-web",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Phenotype classification and sequence comparison service",
        "store": state.store.backend_name(),
        "text_generation": state.text_generator.name(),
        "max_batch_size": state.config.max_batch_size(),
        "endpoints": {
            "sequences": {
                "add": "POST /api/add-sequence",
                "list": "GET /api/sequences"
            },
            "compare": {
                "batch": "POST /api/compare-sequences",
                "legacy": "POST /api/compare-sequences-legacy"
            },
            "text": {
                "explain": "POST /api/explain",
                "chat": "POST /api/chat"
            },
            "health": {
                "service": "GET /api/health"
            }
        }
    }))
}
