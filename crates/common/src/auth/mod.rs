//! Token helpers
//!
//! Signature verification is the backend's job; clients only peek at claims
//! to schedule refreshes and to recover session ids.

pub mod claims;

pub use claims::{decode_unverified_claims, ClaimsError, TokenClaims};
