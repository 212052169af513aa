//! Web service for phenotype classification and sequence comparison
//!
//! Wraps the core in an HTTP API:
//! - submissions are validated, classified and written to a corpus store
//! - comparison batches are run against a fresh corpus snapshot
//! - an optional text generator explains results in plain language
//!
//! Percentages never depend on the text generator.

pub mod config;
pub mod handlers;
pub mod server;
pub mod store;
pub mod textgen;
pub mod types;
pub mod validation;

pub use config::ServiceConfig;
pub use server::{build_router, create_app, spawn_health_check_task, AppState};
pub use store::{CorpusStore, JsonFileStore, MemoryStore};
pub use textgen::{DisabledTextGenerator, GeminiClient, TextGenerator};
pub use types::*;
