//! # mdrkit Domain
//!
//! Data types shared by every mdrkit crate.
//!
//! This crate contains:
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Credential, session and request body types
//! - Protocol constants
//!
//! ## Architecture
//! - No dependencies on other mdrkit crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
