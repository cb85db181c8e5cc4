//! Reusable helpers shared across mdrkit crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: pure helpers (unverified JWT claim decoding)
//! - `runtime`: async infrastructure (bounded retry executor)
//! - `observability`: tracing events (pulled in by `runtime`)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod auth;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use auth::{decode_unverified_claims, ClaimsError, TokenClaims};
#[cfg(feature = "runtime")]
pub use resilience::{
    retry_with_policy, BackoffStrategy, RetryConfig, RetryConfigBuilder, RetryConfigError,
    RetryDecision, RetryError, RetryExecutor, RetryPolicy, RetryResult,
};
