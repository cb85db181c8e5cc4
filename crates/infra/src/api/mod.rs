//! MDR API client
//!
//! - [`SessionManager`] runs the login flow and keeps the access token fresh
//! - [`ApiClient`] is the request/validate helper every resource call uses
//! - [`resources`] holds one typed client per resource group
//!
//! Each resource call asks the [`AccessTokenProvider`] for a token first, so
//! an access token close to expiry is refreshed before the request goes out.

pub mod auth;
pub mod client;
pub mod errors;
pub mod resources;

pub use auth::{AccessTokenProvider, SessionManager, SessionManagerConfig};
pub use client::{ApiClient, ApiClientConfig, Bearer};
pub use errors::ApiError;
pub use resources::{
    AssetsClient, CommentsClient, IncidentsClient, OrganizationDeleteConfig, OrganizationsClient,
    SchedulesClient, SettingsClient, TenantsClient,
};
