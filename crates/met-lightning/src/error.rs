//! Error types for the lightning node.

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;

/// Errors that can occur while starting or running the node.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Configuration file not found, unreadable or invalid
    #[error("Config error: {0}")]
    Config(String),

    /// Failed to parse configuration YAML
    #[error("Parse error: {0}")]
    Parse(String),

    /// Node initialization failed
    #[error("Init error: {0}")]
    Init(String),

    /// Upstream provider error
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

impl From<ConfigError> for NodeError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Parse(msg) => NodeError::Parse(msg),
            ConfigError::Io(msg) | ConfigError::Invalid(msg) => NodeError::Config(msg),
        }
    }
}

impl From<ctrlc::Error> for NodeError {
    fn from(err: ctrlc::Error) -> Self {
        NodeError::Init(err.to_string())
    }
}
