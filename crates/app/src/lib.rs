//! # mdrkit App
//!
//! Application layer - the MDR manager facade and the maintenance binary.
//!
//! This crate contains:
//! - [`MdrManager`], wiring the session manager and the resource clients
//! - Logging setup shared by the binary and the scenario tests
//!
//! ## Architecture
//! - Depends on `domain` and `infra`
//! - Adds pagination, lookups and cross-resource flows on top of the
//!   resource clients

pub mod context;
pub mod utils;

// Re-export for convenience
pub use context::*;
