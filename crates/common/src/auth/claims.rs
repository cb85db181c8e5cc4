//! Unverified JWT claim decoding

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;

/// Why a token could not be decoded
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimsError {
    /// Not a three-part JWT with a readable header and payload
    #[error("malformed token: {0}")]
    Format(String),

    /// The payload is not a JSON claims object
    #[error("failed to parse token payload: {0}")]
    Payload(String),
}

impl From<jsonwebtoken::errors::Error> for ClaimsError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::Json(inner) => Self::Payload(inner.to_string()),
            _ => Self::Format(err.to_string()),
        }
    }
}

/// The subset of registered claims the client cares about
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    /// Subject; robot sessions carry `<login>+<session id>`
    #[serde(default)]
    pub sub: Option<String>,
    /// Expiry as a Unix timestamp in seconds
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// `true` if the token expires within `threshold_seconds` from now.
    /// A token without `exp` never expires.
    pub fn expires_within(&self, threshold_seconds: i64) -> bool {
        match self.exp {
            Some(exp) => Utc::now().timestamp() + threshold_seconds >= exp,
            None => false,
        }
    }
}

/// Decode the claims of a JWT without checking its signature or any
/// registered claim. Expired tokens decode fine.
///
/// # Errors
/// Returns an error if the token is not a well-formed JWT or the payload is
/// not a JSON claims object.
pub fn decode_unverified_claims(token: &str) -> Result<TokenClaims, ClaimsError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_aud = false;

    let data = decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(data.claims)
}
