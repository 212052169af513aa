//! HTTP client with rate limiting and a circuit breaker

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::sleep;

use crate::service::{
    config::{CircuitBreakerConfig, ConnectionPoolConfig},
    types::ServiceError,
};

/// Circuit breaker state
#[derive(Debug, Clone, PartialEq)]
pub enum CircuitState {
    Closed,
    Open { opened_at: Instant },
    HalfOpen,
}

/// HTTP client that rate limits requests and fails fast while the upstream is down
#[derive(Debug)]
pub struct EnhancedHttpClient {
    client: Client,
    /// One request in flight at a time
    rate_limiter: Arc<Semaphore>,
    /// Minimum delay between requests
    rate_limit_delay: Option<Duration>,
    last_request_time: Arc<Mutex<Option<Instant>>>,
    circuit_state: Arc<Mutex<CircuitState>>,
    circuit_config: CircuitBreakerConfig,
    failure_count: Arc<AtomicU32>,
    /// Successes while half-open
    success_count: Arc<AtomicU32>,
    request_count: Arc<AtomicU64>,
}

impl EnhancedHttpClient {
    /// Create a new client
    pub fn new(
        pool_config: Option<&ConnectionPoolConfig>,
        circuit_config: Option<&CircuitBreakerConfig>,
        rate_limit_ms: Option<u64>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let mut client_builder = Client::builder().timeout(timeout);

        if let Some(pool) = pool_config {
            if let Some(max_conn) = pool.max_connections {
                client_builder = client_builder.pool_max_idle_per_host(max_conn);
            }

            if let Some(idle_timeout) = pool.idle_timeout_seconds {
                client_builder =
                    client_builder.pool_idle_timeout(Duration::from_secs(idle_timeout));
            }

            if let Some(keep_alive) = pool.keep_alive_seconds {
                client_builder = client_builder.tcp_keepalive(Duration::from_secs(keep_alive));
            }
        }

        client_builder = client_builder.gzip(true).deflate(true);

        let client = client_builder.build().map_err(|e| {
            ServiceError::InternalError(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            rate_limiter: Arc::new(Semaphore::new(1)),
            rate_limit_delay: rate_limit_ms.map(Duration::from_millis),
            last_request_time: Arc::new(Mutex::new(None)),
            circuit_state: Arc::new(Mutex::new(CircuitState::Closed)),
            circuit_config: circuit_config.cloned().unwrap_or_default(),
            failure_count: Arc::new(AtomicU32::new(0)),
            success_count: Arc::new(AtomicU32::new(0)),
            request_count: Arc::new(AtomicU64::new(0)),
        })
    }

    /// POST a JSON body with circuit breaker protection
    pub async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, ServiceError> {
        self.execute_request(|| self.client.post(url).json(body))
            .await
    }

    /// Execute HTTP request with rate limiting and circuit breaker
    async fn execute_request<F>(
        &self,
        request_builder: F,
    ) -> Result<reqwest::Response, ServiceError>
    where
        F: FnOnce() -> reqwest::RequestBuilder,
    {
        self.check_circuit_breaker().await?;

        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|e| ServiceError::InternalError(format!("Rate limiter error: {}", e)))?;

        if let Some(delay) = self.rate_limit_delay {
            let mut last_time = self.last_request_time.lock().await;
            if let Some(last) = *last_time {
                let elapsed = last.elapsed();
                if elapsed < delay {
                    sleep(delay - elapsed).await;
                }
            }
            *last_time = Some(Instant::now());
        }

        self.request_count.fetch_add(1, Ordering::Relaxed);
        let result = request_builder().send().await.map_err(|e| {
            if e.is_timeout() {
                ServiceError::Timeout
            } else {
                // Strip the URL, which carries the API key
                ServiceError::TextGenerationFailed(format!(
                    "HTTP request failed: {}",
                    e.without_url()
                ))
            }
        });

        match &result {
            Ok(response) if response.status().is_success() => self.record_success().await,
            // Client errors are the request's fault, not the upstream's
            Ok(response) if response.status().is_client_error() => {}
            _ => self.record_failure().await,
        }

        result
    }

    /// Check circuit breaker state and potentially fail fast
    async fn check_circuit_breaker(&self) -> Result<(), ServiceError> {
        let mut state = self.circuit_state.lock().await;

        match *state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open { opened_at } => {
                let recovery_timeout =
                    Duration::from_secs(self.circuit_config.recovery_timeout_seconds.unwrap_or(60));

                if opened_at.elapsed() >= recovery_timeout {
                    *state = CircuitState::HalfOpen;
                    self.success_count.store(0, Ordering::Relaxed);
                    tracing::info!("Circuit breaker transitioning to half-open state");
                    Ok(())
                } else {
                    Err(ServiceError::CircuitBreakerOpen)
                }
            }
            CircuitState::HalfOpen => Ok(()),
        }
    }

    async fn record_success(&self) {
        let mut state = self.circuit_state.lock().await;

        match *state {
            CircuitState::Closed => {
                self.failure_count.store(0, Ordering::Relaxed);
            }
            CircuitState::HalfOpen => {
                let success_count = self.success_count.fetch_add(1, Ordering::Relaxed) + 1;
                let success_threshold = self.circuit_config.success_threshold.unwrap_or(3);

                if success_count >= success_threshold {
                    *state = CircuitState::Closed;
                    self.failure_count.store(0, Ordering::Relaxed);
                    self.success_count.store(0, Ordering::Relaxed);
                    tracing::info!(
                        "Circuit breaker closed after {} successful requests",
                        success_count
                    );
                }
            }
            CircuitState::Open { .. } => {
                *state = CircuitState::Closed;
                self.failure_count.store(0, Ordering::Relaxed);
            }
        }
    }

    async fn record_failure(&self) {
        let failure_count = self.failure_count.fetch_add(1, Ordering::Relaxed) + 1;
        let failure_threshold = self.circuit_config.failure_threshold.unwrap_or(5);

        let mut state = self.circuit_state.lock().await;
        let reopen = match *state {
            // Any failure while probing reopens the circuit
            CircuitState::HalfOpen => true,
            CircuitState::Closed => failure_count >= failure_threshold,
            CircuitState::Open { .. } => false,
        };
        if reopen {
            *state = CircuitState::Open {
                opened_at: Instant::now(),
            };
            tracing::warn!("Circuit breaker opened after {} failures", failure_count);
        }
    }

    /// Current circuit breaker state
    pub async fn circuit_state(&self) -> CircuitState {
        self.circuit_state.lock().await.clone()
    }

    /// Request statistics
    pub fn stats(&self) -> ClientStats {
        ClientStats {
            total_requests: self.request_count.load(Ordering::Relaxed),
            failure_count: self.failure_count.load(Ordering::Relaxed),
            success_count: self.success_count.load(Ordering::Relaxed),
        }
    }
}

/// HTTP client statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientStats {
    pub total_requests: u64,
    pub failure_count: u32,
    pub success_count: u32,
}
