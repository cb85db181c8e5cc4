//! Shared fixtures: a wiremock stand-in for the identity provider and the
//! MDR session endpoints.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use mdrkit_domain::{
    AccountSettings, ApiSettings, IdentitySettings, MdrConfig, RetrySettings, Secret,
    SessionSettings,
};
use mdrkit_infra::{ApiClient, ApiClientConfig, HttpClient, SessionManager, SessionManagerConfig};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const CLIENT_ID: &str = "c0ffee";
pub const IDENTITY_TOKEN: &str = "identity-token";

/// Unsigned JWT with the given claims
pub fn jwt(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}

/// Access token for `session_id` valid for `ttl_seconds`
pub fn access_token_for(session_id: &str, ttl_seconds: i64) -> String {
    jwt(&json!({
        "sub": format!("robot@example.com+{session_id}"),
        "exp": Utc::now().timestamp() + ttl_seconds,
    }))
}

/// Session id the fake backend hands out for the n-th create call
pub fn session_id(n: usize) -> String {
    format!("00000000-0000-4000-8000-{n:012}")
}

pub fn api_path(resource_action: &str) -> String {
    format!("/api/v1/{CLIENT_ID}/{resource_action}")
}

pub struct MockBackend {
    pub server: MockServer,
    creates: Arc<AtomicUsize>,
}

impl MockBackend {
    pub async fn start() -> Self {
        Self { server: MockServer::start().await, creates: Arc::new(AtomicUsize::new(0)) }
    }

    pub fn config(&self) -> MdrConfig {
        MdrConfig {
            api: ApiSettings {
                url: self.server.uri(),
                prefix: "api/v1".into(),
                timeout_seconds: 5,
                transport_attempts: 1,
            },
            identity: IdentitySettings {
                url: format!("{}/uis", self.server.uri()),
                client_id: "autotests".into(),
                client_secret: Secret::new("uis-secret"),
            },
            account: AccountSettings {
                login: "robot@example.com".into(),
                password: Secret::new("hunter2"),
                client_id: CLIENT_ID.into(),
            },
            session: SessionSettings::default(),
            retry: RetrySettings {
                organization_delete_attempts: 20,
                organization_delete_delay_ms: 5,
            },
        }
    }

    /// Identity provider, session create/confirm and session delete.
    ///
    /// Create hands out `session_id(1)`, `session_id(2)`, ... and the
    /// refresh token `refresh-<session id>`; confirm answers with an access
    /// token whose `sub` ends in that session id and is valid for an hour.
    pub async fn mount_login(&self) {
        self.mount_identity().await;
        self.mount_create().await;
        self.mount_confirm(3_600).await;
        self.mount_session_delete().await;
    }

    pub async fn mount_identity(&self) {
        Mock::given(method("POST"))
            .and(path("/uis/connect/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": IDENTITY_TOKEN, "expires_in": 300})),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mount_create(&self) {
        self.mount_create_with(session_id).await;
    }

    /// Session create that formats the n-th session id with `id_for`
    pub async fn mount_create_with(&self, id_for: fn(usize) -> String) {
        let creates = Arc::clone(&self.creates);
        Mock::given(method("POST"))
            .and(path(api_path("robot_session/create")))
            .respond_with(move |_req: &Request| -> ResponseTemplate {
                let id = id_for(creates.fetch_add(1, Ordering::SeqCst) + 1);
                ResponseTemplate::new(200).set_body_json(json!({
                    "session_id": id,
                    "refresh_token": format!("refresh-{id}"),
                }))
            })
            .mount(&self.server)
            .await;
    }

    pub async fn mount_confirm(&self, ttl_seconds: i64) {
        Mock::given(method("POST"))
            .and(path(api_path("session/confirm")))
            .respond_with(move |req: &Request| -> ResponseTemplate {
                let body: Value = serde_json::from_slice(&req.body).unwrap_or_default();
                let refresh = body["refresh_token"].as_str().unwrap_or_default();
                let id = refresh.rsplit("refresh-").next().unwrap_or_default().to_string();
                ResponseTemplate::new(200).set_body_json(json!({
                    "access_token": access_token_for(&id, ttl_seconds),
                    "refresh_token": format!("refresh-{id}"),
                }))
            })
            .mount(&self.server)
            .await;
    }

    pub async fn mount_session_delete(&self) {
        Mock::given(method("POST"))
            .and(path(api_path("robot_sessions/delete")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&self.server)
            .await;
    }

    /// Requests received on `resource_action`, in arrival order
    pub async fn requests_to(&self, resource_action: &str) -> Vec<Request> {
        let wanted = api_path(resource_action);
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|req| req.url.path() == wanted)
            .collect()
    }

    /// Paths of every received request, in arrival order
    pub async fn request_paths(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|req| req.url.path().to_string())
            .collect()
    }

    /// `session_id` fields of every delete request, in arrival order
    pub async fn deleted_session_ids(&self) -> Vec<String> {
        self.requests_to("robot_sessions/delete")
            .await
            .iter()
            .filter_map(|req| serde_json::from_slice::<Value>(&req.body).ok())
            .filter_map(|body| body["session_id"].as_str().map(str::to_string))
            .collect()
    }

    pub fn session_manager(&self, config: &MdrConfig) -> Arc<SessionManager> {
        let http = HttpClient::from_settings(&config.api).expect("http client");
        Arc::new(SessionManager::new(SessionManagerConfig::from(config), Arc::new(http)))
    }

    pub fn api_client(&self, config: &MdrConfig, auth: Arc<SessionManager>) -> Arc<ApiClient> {
        let http = HttpClient::from_settings(&config.api).expect("http client");
        Arc::new(ApiClient::new(ApiClientConfig::from_settings(&config.api), Arc::new(http), auth))
    }

    /// Logged-in session manager plus a shared API client on top of it
    pub async fn logged_in(&self) -> (Arc<SessionManager>, Arc<ApiClient>) {
        self.mount_login().await;
        let config = self.config();
        let sessions = self.session_manager(&config);
        sessions.login(config.account.credential()).await.expect("login");
        let api = self.api_client(&config, Arc::clone(&sessions));
        (sessions, api)
    }
}
