//! Resilience patterns for transient failures
//!
//! Generic over the error type so the HTTP transport and API-level callers
//! can share one executor with different policies.

pub mod retry;

pub use retry::{
    policies, retry_with_policy, BackoffStrategy, RetryConfig, RetryConfigBuilder, RetryConfigError,
    RetryDecision, RetryError, RetryExecutor, RetryPolicy, RetryResult,
};
