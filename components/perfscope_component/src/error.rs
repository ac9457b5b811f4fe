//! Error types for the pipeline context

use thiserror::Error;

/// Errors that can occur operating the pipeline context.
#[derive(Error, Debug)]
pub enum PerfScopeError {
    /// Sampling is already running
    #[error("Pipeline is already running")]
    AlreadyRunning,

    /// Sampling has not been started
    #[error("Pipeline is not running")]
    NotRunning,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Other errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PerfScopeError>;
