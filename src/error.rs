//! Error types for the Trellis context resolution engine.

use thiserror::Error;

/// Content store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("List not found: {0}")]
    ListNotFound(String),

    #[error("Invalid store parameter {name}: {value}")]
    InvalidParam { name: String, value: String },

    #[error("Store backend failed: {0}")]
    Backend(String),

    #[error("Store I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Store fixture is malformed: {0}")]
    Fixture(#[from] serde_json::Error),
}

/// Post-processing (transform pipeline) errors
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Unknown process type: {0}")]
    UnknownAction(String),

    #[error("Invalid process spec: {0}")]
    InvalidSpec(String),

    #[error("Invalid parameters for {action}: {reason}")]
    InvalidParams { action: &'static str, reason: String },

    #[error("{action} expects {expected}, got {found}")]
    InvalidInput {
        action: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

/// Directive execution errors (parse, dispatch, backend, pipeline)
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Cannot parse query: {0:?}")]
    Parse(String),

    #[error("Unknown query module: {0}")]
    UnknownModule(String),

    #[error("Unknown query action: {module}/{action}")]
    UnknownAction { module: String, action: String },

    #[error("Query action {action} requires a target")]
    MissingTarget { action: String },

    #[error("Unknown timeline type: {0}")]
    UnknownTimelineUnit(String),

    #[error("Query timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Backend error: {0}")]
    Store(#[from] StoreError),

    #[error("Pipeline error: {0}")]
    Process(#[from] ProcessError),
}

/// Structural template errors; the only failures that abort a whole resolution
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Invalid template node at {path}: {reason}")]
    InvalidTemplate { path: String, reason: String },
}

/// Top-level errors surfaced to callers of the library and CLI
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(std::path::PathBuf),

    #[error("Invalid JSON in {path}: {source}")]
    InvalidJson {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("Resolve error: {0}")]
    ResolveError(#[from] ResolveError),

    #[error("Query error: {0}")]
    QueryError(#[from] QueryError),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
