//! Conversions from external infrastructure errors into domain errors.

use mdrkit_domain::MdrError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub MdrError);

impl From<InfraError> for MdrError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<MdrError> for InfraError {
    fn from(value: MdrError) -> Self {
        InfraError(value)
    }
}

trait IntoMdrError {
    fn into_mdr(self) -> MdrError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → MdrError */
/* -------------------------------------------------------------------------- */

impl IntoMdrError for HttpError {
    fn into_mdr(self) -> MdrError {
        if self.is_timeout() {
            return MdrError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return MdrError::Network("HTTP connection failure".into());
        }

        if self.is_builder() {
            return MdrError::InvalidInput(format!("invalid HTTP request: {self}"));
        }

        if self.is_decode() {
            return MdrError::Internal(format!("failed to decode HTTP response: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => MdrError::Auth(message),
                404 => MdrError::NotFound(message),
                400..=499 => MdrError::InvalidInput(message),
                _ => MdrError::Network(message),
            };
        }

        MdrError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_mdr())
    }
}
