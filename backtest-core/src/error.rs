//! Error types for the backtester

use thiserror::Error;

/// Backtester-wide error type
///
/// Malformed per-item data (an unparseable label, a degenerate NO-side
/// entry) never surfaces here: those degrade to neutral defaults at the
/// point of use. Variants in this enum abort the run.
#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("Missing required input: {0}")]
    MissingInput(String),

    #[error("Missing required credential: {0}")]
    MissingCredential(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BacktestError {
    pub fn missing_input(msg: impl Into<String>) -> Self {
        BacktestError::MissingInput(msg.into())
    }

    pub fn missing_credential(msg: impl Into<String>) -> Self {
        BacktestError::MissingCredential(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        BacktestError::Network(msg.into())
    }

    pub fn api(msg: impl Into<String>) -> Self {
        BacktestError::Api(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        BacktestError::Parse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        BacktestError::Config(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        BacktestError::Storage(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        BacktestError::Internal(msg.into())
    }
}

/// Result type alias for backtester operations
pub type BacktestResult<T> = Result<T, BacktestError>;
