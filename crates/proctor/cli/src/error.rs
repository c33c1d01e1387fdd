//! CLI error types

use proctor_monitor::MonitorError;
use thiserror::Error;

/// CLI error types
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Replay script could not be parsed or is inconsistent
    #[error("Script error: {0}")]
    Script(String),

    /// Monitor construction failed
    #[error("Monitor error: {0}")]
    Monitor(#[from] MonitorError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
