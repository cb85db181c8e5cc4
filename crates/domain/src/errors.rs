//! Error types used throughout the workspace

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the lower layers (transport, configuration, input
/// shaping)
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum MdrError {
    /// Missing or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The transport failed before a response arrived
    #[error("Network error: {0}")]
    Network(String),

    /// Rejected credentials or tokens
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Input of the wrong shape
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Nothing matched a lookup
    #[error("Not found: {0}")]
    NotFound(String),

    /// A broken invariant inside the client
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for mdrkit operations
pub type Result<T> = std::result::Result<T, MdrError>;
