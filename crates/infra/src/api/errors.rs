//! API-specific error types

use std::time::Duration;

use mdrkit_domain::MdrError;
use thiserror::Error;

/// API operation errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Identity, session or token handling failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A resource endpoint answered with something other than 200
    #[error("{action} returned status {status}: {body}")]
    Api { action: String, status: u16, body: String },

    /// Input rejected before any request was sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// A lookup matched nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request never got a response
    #[error("Network error: {0}")]
    Network(String),

    /// The call exceeded its time budget
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// Settings that cannot drive a client
    #[error("Configuration error: {0}")]
    Config(String),

    /// The server answered 200 with a payload of the wrong shape
    #[error("Client error: {0}")]
    Client(String),

    /// Every attempt of a retried call failed; `source` is the last failure
    #[error("Gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<ApiError>,
    },
}

impl ApiError {
    /// HTTP status of the failed call, when the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::RetriesExhausted { source, .. } => source.status(),
            _ => None,
        }
    }

    /// `true` for non-200 answers from a resource endpoint
    pub fn is_status_failure(&self) -> bool {
        matches!(self, Self::Api { .. })
    }
}

impl From<MdrError> for ApiError {
    fn from(err: MdrError) -> Self {
        match err {
            MdrError::Network(message) => Self::Network(message),
            MdrError::Auth(message) => Self::Auth(message),
            MdrError::Config(message) => Self::Config(message),
            MdrError::InvalidInput(message) => Self::Validation(message),
            MdrError::NotFound(message) => Self::NotFound(message),
            MdrError::Internal(message) => Self::Client(message),
        }
    }
}
