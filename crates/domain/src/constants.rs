//! Protocol constants
//!
//! Centralized location for the values the MDR API and its identity provider
//! expect on the wire.

// Identity provider
pub const IDENTITY_TOKEN_PATH: &str = "connect/token";
pub const PASSWORD_GRANT_TYPE: &str = "password";

// Sessions
pub const ROOT_TENANT_ID: &str = "-";
pub const DEFAULT_ROLE: &str = "SUPERVISOR";
pub const TENANT_SESSION_PREFIX: &str = "autotest_tenant_";
pub const SESSION_PREFIX: &str = "autotest_";
pub const REQUEST_ID_HEADER: &str = "Request-ID";
pub const DEFAULT_EXCLUDE_KEY: &str = "~";
/// Sessions held by the portal itself; left alone by manual cleanup.
pub const PORTAL_SESSION_KEY: &str = "MDR_SESSION";
pub const DEFAULT_REFRESH_THRESHOLD_SECONDS: i64 = 60;

// Transport
pub const DEFAULT_API_PREFIX: &str = "api/v1";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_TRANSPORT_ATTEMPTS: usize = 1;

// Pagination
pub const ASSETS_PAGE_SIZE: u32 = 10_000;
pub const INCIDENTS_PAGE_SIZE: u32 = 100;
pub const INCIDENTS_MAX_PAGE: u32 = 100;

// Organization deletion propagates slowly on the backend
pub const ORGANIZATION_DELETE_ATTEMPTS: u32 = 20;
pub const ORGANIZATION_DELETE_DELAY_MS: u64 = 6_000;

// Schedules
pub const WEEKLY_SCHEDULE: &str = "weekly";
