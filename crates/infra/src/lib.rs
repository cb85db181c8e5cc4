//! # mdrkit Infrastructure
//!
//! Impure side of the MDR client.
//!
//! This crate contains:
//! - The HTTP transport with bounded retry on transport failures
//! - Conversions from external errors into domain errors
//! - The configuration loader (environment, JSON and TOML files)
//! - The session manager and the request dispatcher shared by every
//!   resource client
//! - One client per MDR API resource group
//!
//! ## Architecture
//! - Depends on `mdrkit-domain` for data types and `mdrkit-common` for retry
//!   and token helpers
//! - Contains all I/O

pub mod api;
pub mod config;
pub mod errors;
pub mod http;

// Re-export commonly used items
pub use api::*;
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
