//! Web server setup using Axum framework

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::record::SequenceRecord;
use crate::service::{
    config::ServiceConfig,
    handlers,
    store::{build_store, CorpusStore},
    textgen::{build_text_generator, TextGenerator},
    types::{ErrorResponse, HealthResponse, ServiceError},
};

/// Cached health check results
#[derive(Clone)]
pub struct HealthCache {
    /// Cached health response
    pub response: Arc<RwLock<Option<HealthResponse>>>,
    /// Timestamp of last update
    pub last_updated: Arc<RwLock<Option<chrono::DateTime<chrono::Utc>>>>,
}

impl Default for HealthCache {
    fn default() -> Self {
        Self {
            response: Arc::new(RwLock::new(None)),
            last_updated: Arc::new(RwLock::new(None)),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Reference corpus
    pub store: Arc<dyn CorpusStore>,
    /// Explanation and chat text
    pub text_generator: Arc<dyn TextGenerator>,
    /// Service configuration
    pub config: Arc<ServiceConfig>,
    /// Cached health check results
    pub health_cache: HealthCache,
}

impl AppState {
    pub fn new(
        config: ServiceConfig,
        store: Arc<dyn CorpusStore>,
        text_generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            store,
            text_generator,
            config: Arc::new(config),
            health_cache: HealthCache::default(),
        }
    }

    /// Fetch the full corpus, bounded by the configured request timeout
    pub async fn fetch_corpus(&self) -> Result<Vec<SequenceRecord>, ServiceError> {
        let limit = Duration::from_secs(self.config.server.request_timeout_seconds);
        match tokio::time::timeout(limit, self.store.fetch_all()).await {
            Ok(result) => result.map_err(|e| {
                tracing::error!("Failed to fetch corpus: {}", e);
                e
            }),
            Err(_) => {
                tracing::error!("Corpus fetch timed out after {:?}", limit);
                Err(ServiceError::Timeout)
            }
        }
    }
}

/// Create the Axum application with all routes and middleware
pub async fn create_app(config: ServiceConfig) -> Result<(Router, AppState), ServiceError> {
    let store = build_store(&config.store).await?;
    let text_generator = build_text_generator(&config.text_generation)?;

    tracing::info!(
        "Using {} store with {} records",
        store.backend_name(),
        store.count().await?
    );

    let state = AppState::new(config, store, text_generator);
    let app = build_router(state.clone())?;
    Ok((app, state))
}

/// Build the router for an existing state
pub fn build_router(state: AppState) -> Result<Router, ServiceError> {
    let max_size = parse_size(&state.config.server.max_request_size)
        .map_err(|e| ServiceError::ConfigError(format!("Invalid max_request_size: {}", e)))?;
    let enable_cors = state.config.server.enable_cors;

    let mut app = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/api/health", get(handlers::health::health_check))
        // Corpus endpoints
        .route("/api/add-sequence", post(handlers::sequences::add_sequence))
        .route("/api/sequences", get(handlers::sequences::list_sequences))
        // Comparison endpoints
        .route(
            "/api/compare-sequences",
            post(handlers::compare::compare_sequences),
        )
        .route(
            "/api/compare-sequences-legacy",
            post(handlers::compare::compare_sequences_legacy),
        )
        // Generated text endpoints
        .route("/api/explain", post(handlers::explain::explain))
        .route("/api/chat", post(handlers::explain::chat))
        // API info endpoint
        .route("/api/info", get(handlers::info::service_info))
        // Handle 404s
        .fallback(handle_404)
        .with_state(state);

    app = app.layer(DefaultBodyLimit::max(max_size));
    if enable_cors {
        app = app.layer(middleware::from_fn(cors));
    }

    Ok(app)
}

/// Handle 404 errors
async fn handle_404() -> (StatusCode, Json<ErrorResponse>) {
    let error = ServiceError::BadRequest("Endpoint not found".to_string());
    (StatusCode::NOT_FOUND, Json(error.to_response()))
}

/// Allow any origin; answers preflight requests directly
async fn cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type"),
    );
    response
}

/// Parse size strings like "10MB", "1GB", etc.
fn parse_size(size_str: &str) -> Result<usize, String> {
    let size_str = size_str.trim().to_uppercase();

    // Check longer suffixes first to avoid partial matches
    let (num_str, multiplier) = if let Some(n) = size_str.strip_suffix("GB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = size_str.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = size_str.strip_suffix("KB") {
        (n, 1024)
    } else if let Some(n) = size_str.strip_suffix('B') {
        (n, 1)
    } else {
        (size_str.as_str(), 1)
    };

    num_str
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(|| format!("Invalid size format: {}", size_str))
}

/// Health check interval (15 minutes)
const HEALTH_CHECK_INTERVAL_SECS: u64 = 15 * 60;

/// Spawn background task to periodically update health cache
pub fn spawn_health_check_task(state: AppState) {
    tokio::spawn(async move {
        update_health_cache(&state).await;

        let mut interval = tokio::time::interval(Duration::from_secs(HEALTH_CHECK_INTERVAL_SECS));
        interval.tick().await; // First tick is immediate, skip it since we just ran

        loop {
            interval.tick().await;
            tracing::info!("Running periodic health check...");
            update_health_cache(&state).await;
        }
    });
}

/// Update the health cache with fresh results
pub async fn update_health_cache(state: &AppState) {
    let response = handlers::health::run_health_check(state).await;
    let now = chrono::Utc::now();
    tracing::info!("Health cache updated at {}: {}", now, response.status);
    *state.health_cache.response.write().await = Some(response);
    *state.health_cache.last_updated.write().await = Some(now);
}
