//! Credential and robot session types

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Secret;
use crate::constants::ROOT_TENANT_ID;
use crate::impl_domain_status_conversions;

/// Tenant selector used in session scopes and tenant deletion bodies
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantRef {
    pub tenant_id: String,
}

impl TenantRef {
    /// Scope limited to `tenant_id`
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self { tenant_id: tenant_id.into() }
    }

    /// The `"-"` tenant, meaning every tenant of the client
    pub fn root() -> Self {
        Self::new(ROOT_TENANT_ID)
    }

    /// `true` for the all-tenants selector
    pub fn is_root(&self) -> bool {
        self.tenant_id == ROOT_TENANT_ID
    }
}

/// Session role, e.g. `SUPERVISOR`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub fn new(role: impl Into<String>) -> Self {
        Self(role.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Login material for one account and one tenant scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub login: String,
    pub password: Secret,
    pub client_id: String,
    pub tenant_scope: Vec<TenantRef>,
}

impl Credential {
    /// Credential scoped to the root tenant
    pub fn new(login: impl Into<String>, password: Secret, client_id: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password,
            client_id: client_id.into(),
            tenant_scope: vec![TenantRef::root()],
        }
    }

    pub fn with_tenants(mut self, tenants: Vec<TenantRef>) -> Self {
        self.tenant_scope = tenants;
        self
    }

    pub fn is_root_scope(&self) -> bool {
        matches!(self.tenant_scope.as_slice(), [only] if only.is_root())
    }
}

/// Backend-tracked robot session owned by the session manager
#[derive(Debug, Clone)]
pub struct Session {
    /// Backend id, a UUID
    pub session_id: String,
    /// `autotest_` or `autotest_tenant_` plus a random suffix
    pub session_name: String,
    pub role: Role,
    /// Tenants the session may act on
    pub tenant_scope: Vec<TenantRef>,
    /// Traded for a new token pair on every refresh
    pub refresh_token: Secret,
    /// `None` until the first `session/confirm` exchange
    pub access_token: Option<Secret>,
}

/// One entry of `robot_sessions/list`
///
/// Fields other than the id and name are kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub session_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Lifecycle of the manager's single session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Nothing obtained yet, or the last login failed
    #[default]
    Unauthenticated,
    /// Identity token in hand, no session yet
    IdentityTokenObtained,
    /// Session created, access token not yet confirmed
    SessionCreated,
    /// Access token confirmed; resource calls may proceed
    AccessTokenValid,
    /// The manager's session was deleted
    Deleted,
}

impl_domain_status_conversions!(SessionPhase {
    Unauthenticated => "unauthenticated",
    IdentityTokenObtained => "identity_token_obtained",
    SessionCreated => "session_created",
    AccessTokenValid => "access_token_valid",
    Deleted => "deleted",
});

/// Body of `robot_session/create`
#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionRequest {
    pub session_name: String,
    pub role: Role,
    pub tenants: Vec<TenantRef>,
}

/// Body of `robot_sessions/delete`
#[derive(Debug, Clone, Serialize)]
pub struct SessionIdRequest {
    pub session_id: String,
}
