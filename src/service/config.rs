//! Configuration for the phenomatch web service

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default maximum number of pairs in one comparison batch
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// Main service configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Corpus store configuration
    #[serde(default)]
    pub store: StoreConfig,
    /// Text-generation collaborator configuration
    #[serde(default)]
    pub text_generation: TextGenerationConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to (default: "0.0.0.0")
    pub host: String,
    /// Port to listen on (default: 5000)
    pub port: u16,
    /// Maximum request size (default: "10MB")
    pub max_request_size: String,
    /// Timeout for fetching the corpus, in seconds (default: 30)
    pub request_timeout_seconds: u64,
    /// Enable CORS (default: true)
    pub enable_cors: bool,
    /// Maximum pairs per comparison batch (default: 1000)
    pub max_batch_size: Option<usize>,
}

/// Corpus store backend
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StoreBackend {
    /// Process memory, reset on restart
    #[default]
    Memory,
    /// JSON array file on disk
    JsonFile,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            StoreBackend::JsonFile => "json-file",
        }
    }
}

/// Corpus store configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Backend to use
    #[serde(default)]
    pub backend: StoreBackend,
    /// Corpus file path (required for `json-file`)
    pub path: Option<PathBuf>,
    /// Number of random records to insert at startup (default: 0)
    #[serde(default)]
    pub seed_records: usize,
}

/// Text-generation collaborator configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TextGenerationConfig {
    /// Whether explanations are generated (default: false)
    pub enabled: bool,
    /// Base API URL, without the model path
    pub api_url: String,
    /// Model name
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_seconds: u64,
    /// Minimum delay between requests in milliseconds (default: 100)
    pub rate_limit_ms: Option<u64>,
    /// Connection pool configuration
    pub connection_pool: Option<ConnectionPoolConfig>,
    /// Circuit breaker configuration
    pub circuit_breaker: Option<CircuitBreakerConfig>,
}

/// HTTP connection pool configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionPoolConfig {
    /// Maximum idle connections per host (default: 10)
    pub max_connections: Option<usize>,
    /// Connection idle timeout in seconds (default: 30)
    pub idle_timeout_seconds: Option<u64>,
    /// TCP keep-alive in seconds (default: 90)
    pub keep_alive_seconds: Option<u64>,
}

/// Circuit breaker configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CircuitBreakerConfig {
    /// Failure threshold before opening circuit (default: 5)
    pub failure_threshold: Option<u32>,
    /// Recovery timeout in seconds (default: 60)
    pub recovery_timeout_seconds: Option<u64>,
    /// Success threshold for closing circuit (default: 3)
    pub success_threshold: Option<u32>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_request_size: "10MB".to_string(),
            request_timeout_seconds: 30,
            enable_cors: true,
            max_batch_size: Some(DEFAULT_MAX_BATCH_SIZE),
        }
    }
}

impl Default for TextGenerationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_seconds: 30,
            rate_limit_ms: Some(100),
            connection_pool: Some(ConnectionPoolConfig::default()),
            circuit_breaker: Some(CircuitBreakerConfig::default()),
        }
    }
}

impl Default for ConnectionPoolConfig {
    fn default() -> Self {
        Self {
            max_connections: Some(10),
            idle_timeout_seconds: Some(30),
            keep_alive_seconds: Some(90),
        }
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: Some(5),
            recovery_timeout_seconds: Some(60),
            success_threshold: Some(3),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: ServiceConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file(&self, path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Effective batch size limit
    pub fn max_batch_size(&self) -> usize {
        self.server
            .max_batch_size
            .unwrap_or(DEFAULT_MAX_BATCH_SIZE)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }

        if self.max_batch_size() == 0 {
            return Err("max_batch_size must be greater than 0".to_string());
        }

        if self.server.request_timeout_seconds == 0 {
            return Err("request_timeout_seconds must be greater than 0".to_string());
        }

        if self.store.backend == StoreBackend::JsonFile && self.store.path.is_none() {
            return Err("The json-file store backend requires store.path".to_string());
        }

        let text = &self.text_generation;
        if text.enabled {
            if text.api_url.trim().is_empty() {
                return Err("Text generation is enabled but api_url is empty".to_string());
            }
            if text.model.trim().is_empty() {
                return Err("Text generation is enabled but model is empty".to_string());
            }
        }

        Ok(())
    }
}
