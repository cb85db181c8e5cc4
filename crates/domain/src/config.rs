//! Configuration management

use serde::Deserialize;

use crate::constants::{
    DEFAULT_API_PREFIX, DEFAULT_REFRESH_THRESHOLD_SECONDS, DEFAULT_ROLE, DEFAULT_TIMEOUT_SECONDS,
    DEFAULT_TRANSPORT_ATTEMPTS, ORGANIZATION_DELETE_ATTEMPTS, ORGANIZATION_DELETE_DELAY_MS,
};
use crate::types::{Credential, Role, Secret};

/// Environment configuration for one MDR deployment
#[derive(Debug, Clone, Deserialize)]
pub struct MdrConfig {
    /// MDR REST API endpoint
    pub api: ApiSettings,
    /// Identity provider for the password grant
    pub identity: IdentitySettings,
    /// Account used when no login override is given
    pub account: AccountSettings,
    /// Session role and token refresh
    #[serde(default)]
    pub session: SessionSettings,
    /// Retry budget of the slow backend operations
    #[serde(default)]
    pub retry: RetrySettings,
}

/// MDR REST API endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    /// Scheme and host, e.g. `https://mdr.example.com`
    pub url: String,
    /// Path prefix in front of every client id, `api/v1` by default
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Timeout of a single transport attempt
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Total transport attempts per request (initial try + retries)
    #[serde(default = "default_transport_attempts")]
    pub transport_attempts: usize,
}

impl ApiSettings {
    /// Base URL every resource path is appended to, e.g.
    /// `https://mdr.example.com/api/v1`
    pub fn base_url(&self) -> String {
        let url = self.url.trim_end_matches('/');
        let prefix = self.prefix.trim_matches('/');
        if prefix.is_empty() {
            url.to_string()
        } else {
            format!("{url}/{prefix}")
        }
    }
}

/// Identity provider (UIS) used for the password grant
#[derive(Debug, Clone, Deserialize)]
pub struct IdentitySettings {
    /// Identity provider base, e.g. `https://uis.example.com`
    pub url: String,
    pub client_id: String,
    pub client_secret: Secret,
}

/// Default account the manager logs in with
#[derive(Debug, Clone, Deserialize)]
pub struct AccountSettings {
    pub login: String,
    pub password: Secret,
    pub client_id: String,
}

impl AccountSettings {
    /// Root-scoped credential for this account
    pub fn credential(&self) -> Credential {
        Credential::new(self.login.clone(), self.password.clone(), self.client_id.clone())
    }
}

/// Robot session behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    /// Role requested for new sessions, `SUPERVISOR` by default
    #[serde(default)]
    pub role: Role,
    /// Refresh the access token this many seconds before its `exp` claim
    #[serde(default = "default_refresh_threshold")]
    pub refresh_threshold_seconds: i64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self { role: Role::default(), refresh_threshold_seconds: default_refresh_threshold() }
    }
}

/// Retry budget for `organizations/delete`
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    /// Total attempts, 20 by default
    #[serde(default = "default_org_attempts")]
    pub organization_delete_attempts: u32,
    /// Pause between attempts, 6 seconds by default
    #[serde(default = "default_org_delay")]
    pub organization_delete_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            organization_delete_attempts: default_org_attempts(),
            organization_delete_delay_ms: default_org_delay(),
        }
    }
}

fn default_prefix() -> String {
    DEFAULT_API_PREFIX.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn default_transport_attempts() -> usize {
    DEFAULT_TRANSPORT_ATTEMPTS
}

fn default_refresh_threshold() -> i64 {
    DEFAULT_REFRESH_THRESHOLD_SECONDS
}

fn default_org_attempts() -> u32 {
    ORGANIZATION_DELETE_ATTEMPTS
}

fn default_org_delay() -> u64 {
    ORGANIZATION_DELETE_DELAY_MS
}

impl Default for Role {
    fn default() -> Self {
        Role::new(DEFAULT_ROLE)
    }
}
