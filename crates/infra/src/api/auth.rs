//! Session lifecycle against the identity provider and the MDR session API
//!
//! A [`SessionManager`] owns exactly one robot session at a time:
//!
//! ```text
//! Unauthenticated -> IdentityTokenObtained -> SessionCreated
//!     -> AccessTokenValid -> (refresh)* -> Deleted
//! ```
//!
//! Resource clients only see it through [`AccessTokenProvider`], which
//! refreshes the access token before handing it out when it is close to
//! expiry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mdrkit_common::auth::decode_unverified_claims;
use mdrkit_domain::constants::{
    IDENTITY_TOKEN_PATH, PASSWORD_GRANT_TYPE, PORTAL_SESSION_KEY, REQUEST_ID_HEADER,
    SESSION_PREFIX, TENANT_SESSION_PREFIX,
};
use mdrkit_domain::{
    CreateSessionRequest, Credential, MdrConfig, Role, Secret, Session, SessionIdRequest,
    SessionPhase, SessionSummary, TenantRef,
};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::client::{dispatch, parse_body};
use super::errors::ApiError;
use crate::http::HttpClient;

/// Trait for providing tokens and the client scope to resource clients
///
/// This trait allows dependency injection and testing with mock providers.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Get a valid session access token, refreshing it first if it is due.
    async fn access_token(&self) -> Result<Secret, ApiError>;

    /// Identity provider token of the current login.
    async fn identity_token(&self) -> Result<Secret, ApiError>;

    /// Client id every resource path is scoped to.
    async fn client_id(&self) -> Result<String, ApiError>;
}

/// Settings the session manager needs from [`MdrConfig`]
#[derive(Debug, Clone)]
pub struct SessionManagerConfig {
    /// Prefixed API base, e.g. `https://mdr.example.com/api/v1`
    pub api_base_url: String,
    /// Identity provider base, without a trailing slash
    pub identity_url: String,
    /// OAuth client the password grant is made for
    pub oauth_client_id: String,
    /// Secret of `oauth_client_id`
    pub oauth_client_secret: Secret,
    /// Role requested for every new session
    pub role: Role,
    /// Refresh the access token once it expires within this many seconds
    pub refresh_threshold_seconds: i64,
    /// Per-request timeout for the session endpoints
    pub timeout: Duration,
}

impl From<&MdrConfig> for SessionManagerConfig {
    fn from(config: &MdrConfig) -> Self {
        Self {
            api_base_url: config.api.base_url(),
            identity_url: config.identity.url.trim_end_matches('/').to_string(),
            oauth_client_id: config.identity.client_id.clone(),
            oauth_client_secret: config.identity.client_secret.clone(),
            role: config.session.role.clone(),
            refresh_threshold_seconds: config.session.refresh_threshold_seconds,
            timeout: Duration::from_secs(config.api.timeout_seconds),
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    phase: SessionPhase,
    credential: Option<Credential>,
    client_id: Option<String>,
    identity_token: Option<Secret>,
    session: Option<Session>,
    sessions_cache: Option<Vec<SessionSummary>>,
}

/// Owner of the credential, the identity token and the active session
///
/// State lives behind a `RwLock` that is never held across a request, so
/// multi-step flows (`login`, `rotate_session`) are not atomic: use one
/// manager from one logical task at a time.
pub struct SessionManager {
    http: Arc<HttpClient>,
    config: SessionManagerConfig,
    state: RwLock<SessionState>,
}

impl SessionManager {
    /// Unauthenticated manager; call [`login`](Self::login) before use.
    pub fn new(config: SessionManagerConfig, http: Arc<HttpClient>) -> Self {
        Self { http, config, state: RwLock::new(SessionState::default()) }
    }

    /// Settings this manager was built with
    pub fn config(&self) -> &SessionManagerConfig {
        &self.config
    }

    /// Where the manager is in the login lifecycle
    pub async fn phase(&self) -> SessionPhase {
        self.state.read().await.phase
    }

    /// Id of the active session, if any
    pub async fn session_id(&self) -> Option<String> {
        self.state.read().await.session.as_ref().map(|session| session.session_id.clone())
    }

    /// Snapshot of the active session, tokens included
    pub async fn current_session(&self) -> Option<Session> {
        self.state.read().await.session.clone()
    }

    /// Credential of the last successful login
    pub async fn credential(&self) -> Option<Credential> {
        self.state.read().await.credential.clone()
    }

    /// Exchange login and password for an identity provider token.
    ///
    /// # Errors
    /// `ApiError::Auth` on any status but 200 or a payload without
    /// `access_token`.
    #[instrument(skip(self, password))]
    pub async fn obtain_identity_token(
        &self,
        login: &str,
        password: &Secret,
    ) -> Result<Secret, ApiError> {
        let url = format!("{}/{}", self.config.identity_url, IDENTITY_TOKEN_PATH);
        let form = [
            ("grant_type", PASSWORD_GRANT_TYPE),
            ("client_id", self.config.oauth_client_id.as_str()),
            ("client_secret", self.config.oauth_client_secret.value()),
            ("username", login),
            ("password", password.value()),
        ];

        let request = self.http.request(Method::POST, &url).form(&form);
        let (status, text) = dispatch(&self.http, request, self.config.timeout).await?;
        if status != StatusCode::OK {
            return Err(ApiError::Auth(format!(
                "identity provider returned status {}",
                status.as_u16()
            )));
        }

        let token = parse_body(&text)?
            .get("access_token")
            .and_then(Value::as_str)
            .map(Secret::new)
            .ok_or_else(|| ApiError::Auth("identity provider response has no access_token".into()))?;

        let mut state = self.state.write().await;
        state.identity_token = Some(token.clone());
        state.phase = SessionPhase::IdentityTokenObtained;
        debug!("identity token obtained");

        Ok(token)
    }

    /// Create a robot session with the identity token.
    ///
    /// Without `tenant_scope` the session is root-scoped. An already active
    /// session is deleted first; failing to do so is only logged.
    ///
    /// # Errors
    /// `ApiError::Auth` on any status but 200 or a payload missing
    /// `session_id` or `refresh_token`.
    #[instrument(skip(self, identity, tenant_scope))]
    pub async fn create_session(
        &self,
        identity: &Secret,
        client_id: &str,
        role: &Role,
        tenant_scope: Option<Vec<TenantRef>>,
    ) -> Result<Session, ApiError> {
        let (prior, prior_client_id) = {
            let mut state = self.state.write().await;
            (state.session.take(), state.client_id.clone())
        };
        if let Some(prior) = prior {
            let scope = prior_client_id.as_deref().unwrap_or(client_id);
            match self.post_delete_session(scope, &prior.session_id, identity).await {
                Ok(()) => info!(session_id = %prior.session_id, "previous session deleted"),
                Err(err) => {
                    warn!(session_id = %prior.session_id, error = %err, "failed to delete previous session");
                }
            }
        }

        let (session_name, tenants) = match tenant_scope {
            None => (
                format!("{TENANT_SESSION_PREFIX}{}", Uuid::new_v4().simple()),
                vec![TenantRef::root()],
            ),
            Some(tenants) => (format!("{SESSION_PREFIX}{}", Uuid::new_v4().simple()), tenants),
        };
        let body = CreateSessionRequest {
            session_name: session_name.clone(),
            role: role.clone(),
            tenants: tenants.clone(),
        };

        let url = format!("{}/{}/robot_session/create", self.config.api_base_url, client_id);
        let request = self
            .http
            .request(Method::POST, &url)
            .bearer_auth(identity.value())
            .header(REQUEST_ID_HEADER, Uuid::new_v4().simple().to_string())
            .json(&body);
        let (status, text) = dispatch(&self.http, request, self.config.timeout).await?;
        if status != StatusCode::OK {
            return Err(ApiError::Auth(format!(
                "robot_session/create returned status {}: {text}",
                status.as_u16()
            )));
        }

        let payload = parse_body(&text)?;
        let field = |name: &str| payload.get(name).and_then(Value::as_str).map(str::to_string);
        let (Some(session_id), Some(refresh_token)) = (field("session_id"), field("refresh_token"))
        else {
            return Err(ApiError::Auth(
                "session response is missing session_id or refresh_token".into(),
            ));
        };

        let session = Session {
            session_id,
            session_name,
            role: role.clone(),
            tenant_scope: tenants,
            refresh_token: Secret::new(refresh_token),
            access_token: None,
        };

        let mut state = self.state.write().await;
        state.session = Some(session.clone());
        state.client_id = Some(client_id.to_string());
        state.phase = SessionPhase::SessionCreated;
        info!(session_id = %session.session_id, session_name = %session.session_name, "session created");

        Ok(session)
    }

    /// Trade the refresh token for a new access/refresh token pair.
    ///
    /// # Errors
    /// `ApiError::Auth` without a session, on any status but 200, or when
    /// the payload is not exactly `{access_token, refresh_token}`.
    #[instrument(skip(self))]
    pub async fn refresh_access_token(&self) -> Result<Secret, ApiError> {
        let (client_id, refresh_token, bearer) = {
            let state = self.state.read().await;
            let session = active_session(&state)?;
            let bearer = session
                .access_token
                .clone()
                .or_else(|| state.identity_token.clone())
                .ok_or_else(|| ApiError::Auth("no token to confirm the session with".into()))?;
            (scoped_client_id(&state)?, session.refresh_token.clone(), bearer)
        };

        let url = format!("{}/{}/session/confirm", self.config.api_base_url, client_id);
        let request = self
            .http
            .request(Method::POST, &url)
            .bearer_auth(bearer.value())
            .json(&json!({ "refresh_token": refresh_token.value() }));
        let (status, text) = dispatch(&self.http, request, self.config.timeout).await?;
        if status != StatusCode::OK {
            return Err(ApiError::Auth(format!(
                "session/confirm returned status {}: {text}",
                status.as_u16()
            )));
        }

        let (access_token, refresh_token) = confirm_tokens(&parse_body(&text)?)?;

        let mut state = self.state.write().await;
        if let Some(session) = state.session.as_mut() {
            session.access_token = Some(access_token.clone());
            session.refresh_token = refresh_token;
        }
        state.phase = SessionPhase::AccessTokenValid;
        info!("access token refreshed");

        Ok(access_token)
    }

    /// Ask the backend for a new refresh token for the current session.
    ///
    /// # Errors
    /// `ApiError::Auth` without a session, on any status but 200, or a
    /// payload without `refresh_token`.
    #[instrument(skip(self))]
    pub async fn restart_refresh_token(&self) -> Result<(), ApiError> {
        let bearer = self.access_token().await?;
        let client_id = scoped_client_id(&*self.state.read().await)?;

        let url = format!("{}/{}/session/restart", self.config.api_base_url, client_id);
        let request =
            self.http.request(Method::POST, &url).bearer_auth(bearer.value()).json(&json!({}));
        let (status, text) = dispatch(&self.http, request, self.config.timeout).await?;
        if status != StatusCode::OK {
            return Err(ApiError::Auth(format!(
                "session/restart returned status {}: {text}",
                status.as_u16()
            )));
        }

        let refresh_token = parse_body(&text)?
            .get("refresh_token")
            .and_then(Value::as_str)
            .map(Secret::new)
            .ok_or_else(|| ApiError::Auth("session/restart response has no refresh_token".into()))?;

        if let Some(session) = self.state.write().await.session.as_mut() {
            session.refresh_token = refresh_token;
        }
        debug!("refresh token restarted");
        Ok(())
    }

    /// Full login: identity token, robot session, first access token.
    ///
    /// # Errors
    /// Propagates the first failing step.
    #[instrument(skip(self, credential), fields(login = %credential.login, client_id = %credential.client_id))]
    pub async fn login(&self, credential: Credential) -> Result<(), ApiError> {
        self.state.write().await.phase = SessionPhase::Unauthenticated;

        let identity = self.obtain_identity_token(&credential.login, &credential.password).await?;
        self.create_session(
            &identity,
            &credential.client_id,
            &self.config.role,
            Some(credential.tenant_scope.clone()),
        )
        .await?;
        self.state.write().await.credential = Some(credential);
        self.refresh_access_token().await?;

        info!("logged in");
        Ok(())
    }

    /// Log in again with the stored credential and delete the session the
    /// given (or current) access token belongs to.
    ///
    /// # Errors
    /// `ApiError::Auth` if the token does not carry a session id or there is
    /// no stored credential, plus whatever `login` and `delete_session`
    /// return.
    #[instrument(skip(self, token))]
    pub async fn rotate_session(&self, token: Option<&Secret>) -> Result<(), ApiError> {
        let token = match token {
            Some(token) => token.clone(),
            None => active_session(&*self.state.read().await)?
                .access_token
                .clone()
                .ok_or_else(|| ApiError::Auth("session has no access token".into()))?,
        };
        let previous_id = session_id_from_token(&token)?;

        let (credential, detached) = {
            let mut state = self.state.write().await;
            let credential = state
                .credential
                .clone()
                .ok_or_else(|| ApiError::Auth("no stored credential to log in with".into()))?;
            // Detach so the login below does not delete it a second time
            let detached = if state
                .session
                .as_ref()
                .is_some_and(|session| same_session(&session.session_id, &previous_id))
            {
                let phase = state.phase;
                state.session.take().map(|session| (session, phase))
            } else {
                None
            };
            (credential, detached)
        };
        // Delete by the id as the backend spells it
        let target = detached
            .as_ref()
            .map_or_else(|| previous_id.clone(), |(session, _)| session.session_id.clone());

        if let Err(err) = self.login(credential).await {
            self.recover_detached(detached, &target).await;
            return Err(err);
        }
        self.delete_session(Some(&target)).await?;

        info!(previous_session_id = %previous_id, "session rotated");
        Ok(())
    }

    /// Sessions of the current client, cached until
    /// [`reset_session_cache`](Self::reset_session_cache).
    ///
    /// # Errors
    /// `ApiError::Auth` on any status but 200, `ApiError::Client` if the
    /// payload is not a list of sessions.
    #[instrument(skip(self))]
    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>, ApiError> {
        if let Some(cached) = self.state.read().await.sessions_cache.clone() {
            return Ok(cached);
        }

        let bearer = self.access_token().await?;
        let client_id = scoped_client_id(&*self.state.read().await)?;

        let url = format!("{}/{}/robot_sessions/list", self.config.api_base_url, client_id);
        let request =
            self.http.request(Method::POST, &url).bearer_auth(bearer.value()).json(&json!({}));
        let (status, text) = dispatch(&self.http, request, self.config.timeout).await?;
        if status != StatusCode::OK {
            return Err(ApiError::Auth(format!(
                "robot_sessions/list returned status {}: {text}",
                status.as_u16()
            )));
        }

        let sessions: Vec<SessionSummary> = serde_json::from_value(parse_body(&text)?)
            .map_err(|err| ApiError::Client(format!("unexpected session list: {err}")))?;

        self.state.write().await.sessions_cache = Some(sessions.clone());
        Ok(sessions)
    }

    /// Forget the cached session list so the next call lists again.
    pub async fn reset_session_cache(&self) {
        self.state.write().await.sessions_cache = None;
    }

    /// Delete `session_id`, or the current session when `None`.
    ///
    /// # Errors
    /// `ApiError::Auth` without a session to delete or on any status but 200.
    #[instrument(skip(self))]
    pub async fn delete_session(&self, session_id: Option<&str>) -> Result<(), ApiError> {
        let target = match session_id {
            Some(id) => id.to_string(),
            None => active_session(&*self.state.read().await)?.session_id.clone(),
        };

        let bearer = self.access_token().await?;
        let client_id = scoped_client_id(&*self.state.read().await)?;
        self.post_delete_session(&client_id, &target, &bearer).await?;

        let mut state = self.state.write().await;
        if state.session.as_ref().is_some_and(|session| same_session(&session.session_id, &target)) {
            state.session = None;
            state.phase = SessionPhase::Deleted;
        }
        info!(session_id = %target, "session deleted");
        Ok(())
    }

    /// Delete every listed session except this manager's own, the names in
    /// `exclude` and names containing `exclude_key`, then delete the own
    /// session. Returns how many foreign sessions were deleted.
    ///
    /// # Errors
    /// Stops at the first failing list or delete call.
    #[instrument(skip(self, exclude))]
    pub async fn delete_sessions(
        &self,
        exclude: &[&str],
        exclude_key: &str,
    ) -> Result<usize, ApiError> {
        let own = self.session_id().await;
        let sessions = self.list_sessions().await?;

        let doomed: Vec<&SessionSummary> = sessions
            .iter()
            .filter(|summary| own.as_deref() != Some(summary.session_id.as_str()))
            .filter(|summary| {
                !(summary.session_name.contains(exclude_key)
                    || exclude.contains(&summary.session_name.as_str()))
            })
            .collect();

        for summary in &doomed {
            self.delete_session(Some(&summary.session_id)).await?;
            info!(
                session_id = %summary.session_id,
                session_name = %summary.session_name,
                "foreign session deleted"
            );
        }
        info!(deleted = doomed.len(), "sessions cleanup finished");

        if own.is_some() {
            self.delete_session(None).await?;
        }
        Ok(doomed.len())
    }

    /// Cleanup for manual runs: keeps only the portal's own sessions.
    ///
    /// # Errors
    /// See [`delete_sessions`](Self::delete_sessions).
    pub async fn delete_extra_sessions(&self) -> Result<usize, ApiError> {
        self.delete_sessions(&[], PORTAL_SESSION_KEY).await
    }

    async fn needs_refresh(&self) -> bool {
        let state = self.state.read().await;
        let Some(session) = state.session.as_ref() else {
            return false;
        };
        match session.access_token.as_ref() {
            None => true,
            Some(token) => decode_unverified_claims(token.value())
                .map(|claims| claims.expires_within(self.config.refresh_threshold_seconds))
                .unwrap_or(false),
        }
    }

    /// Undo the detach of a failed rotation. Reattach the session if login
    /// never replaced it, otherwise delete it through the new session.
    async fn recover_detached(&self, detached: Option<(Session, SessionPhase)>, previous_id: &str) {
        let Some((session, phase)) = detached else {
            return;
        };
        {
            let mut state = self.state.write().await;
            if state.session.is_none() {
                state.session = Some(session);
                state.phase = phase;
                return;
            }
        }
        if let Err(err) = self.delete_session(Some(previous_id)).await {
            warn!(session_id = %previous_id, error = %err, "failed to delete rotated session");
        }
    }

    async fn post_delete_session(
        &self,
        client_id: &str,
        session_id: &str,
        bearer: &Secret,
    ) -> Result<(), ApiError> {
        let url = format!("{}/{}/robot_sessions/delete", self.config.api_base_url, client_id);
        let request = self
            .http
            .request(Method::POST, &url)
            .bearer_auth(bearer.value())
            .json(&SessionIdRequest { session_id: session_id.to_string() });
        let (status, text) = dispatch(&self.http, request, self.config.timeout).await?;
        if status != StatusCode::OK {
            warn!(session_id, status = status.as_u16(), "session delete rejected");
            return Err(ApiError::Auth(format!(
                "robot_sessions/delete returned status {}: {text}",
                status.as_u16()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl AccessTokenProvider for SessionManager {
    async fn access_token(&self) -> Result<Secret, ApiError> {
        if self.needs_refresh().await {
            return self.refresh_access_token().await;
        }
        active_session(&*self.state.read().await)?
            .access_token
            .clone()
            .ok_or_else(|| ApiError::Auth("session has no access token".into()))
    }

    async fn identity_token(&self) -> Result<Secret, ApiError> {
        self.state
            .read()
            .await
            .identity_token
            .clone()
            .ok_or_else(|| ApiError::Auth("no identity token; log in first".into()))
    }

    async fn client_id(&self) -> Result<String, ApiError> {
        scoped_client_id(&*self.state.read().await)
    }
}

fn active_session(state: &SessionState) -> Result<&Session, ApiError> {
    state.session.as_ref().ok_or_else(|| ApiError::Auth("no active session; log in first".into()))
}

fn scoped_client_id(state: &SessionState) -> Result<String, ApiError> {
    state.client_id.clone().ok_or_else(|| ApiError::Auth("no client id; log in first".into()))
}

/// Validate a `session/confirm` payload: exactly the two token fields.
fn confirm_tokens(payload: &Value) -> Result<(Secret, Secret), ApiError> {
    let fields = payload
        .as_object()
        .ok_or_else(|| ApiError::Auth("session/confirm payload is not an object".into()))?;

    let token = |name: &str| fields.get(name).and_then(Value::as_str).map(Secret::new);
    match (fields.len(), token("access_token"), token("refresh_token")) {
        (2, Some(access), Some(refresh)) => Ok((access, refresh)),
        _ => {
            let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
            Err(ApiError::Auth(format!(
                "session/confirm payload must hold exactly access_token and refresh_token, got [{}]",
                keys.join(", ")
            )))
        }
    }
}

/// Session ids are UUIDs the backend may print in any form.
fn same_session(a: &str, b: &str) -> bool {
    match (Uuid::parse_str(a), Uuid::parse_str(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Session id carried in the `sub` claim, as `<anything>+<uuid>`.
fn session_id_from_token(token: &Secret) -> Result<String, ApiError> {
    let claims = decode_unverified_claims(token.value())
        .map_err(|err| ApiError::Auth(format!("cannot decode access token: {err}")))?;
    let subject =
        claims.sub.ok_or_else(|| ApiError::Auth("access token has no sub claim".into()))?;
    let raw = subject.rsplit('+').next().unwrap_or_default();
    let id = Uuid::parse_str(raw)
        .map_err(|err| ApiError::Auth(format!("sub claim does not end in a session id: {err}")))?;
    Ok(id.hyphenated().to_string())
}
