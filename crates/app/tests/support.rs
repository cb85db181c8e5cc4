//! Wiremock backend for manager tests

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
use mdrkit_lib::MdrManager;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const CLIENT_ID: &str = "c0ffee";
pub const IDENTITY_TOKEN: &str = "identity-token";

pub fn api_path(resource_action: &str) -> String {
    format!("/api/v1/{CLIENT_ID}/{resource_action}")
}

fn access_token_for(session_id: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let claims = json!({
        "sub": format!("robot@example.com+{session_id}"),
        "exp": Utc::now().timestamp() + 3_600,
    });
    format!("{header}.{}.signature", URL_SAFE_NO_PAD.encode(claims.to_string()))
}

pub struct Backend {
    pub server: MockServer,
}

impl Backend {
    /// Server answering the identity, session create/confirm and session
    /// delete calls. Sessions are numbered from 1 in creation order.
    pub async fn start() -> Self {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/uis/connect/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"access_token": IDENTITY_TOKEN})),
            )
            .mount(&server)
            .await;

        let creates = Arc::new(AtomicUsize::new(0));
        Mock::given(method("POST"))
            .and(path(api_path("robot_session/create")))
            .respond_with(move |_req: &Request| -> ResponseTemplate {
                let n = creates.fetch_add(1, Ordering::SeqCst) + 1;
                let id = format!("00000000-0000-4000-8000-{n:012}");
                ResponseTemplate::new(200)
                    .set_body_json(json!({"session_id": id, "refresh_token": format!("refresh-{id}")}))
            })
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path(api_path("session/confirm")))
            .respond_with(|req: &Request| -> ResponseTemplate {
                let body: Value = serde_json::from_slice(&req.body).unwrap_or_default();
                let refresh = body["refresh_token"].as_str().unwrap_or_default();
                let id = refresh.trim_start_matches("refresh-").to_string();
                ResponseTemplate::new(200).set_body_json(json!({
                    "access_token": access_token_for(&id),
                    "refresh_token": refresh,
                }))
            })
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path(api_path("robot_sessions/delete")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        Self { server }
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
            retry: RetrySettings { organization_delete_attempts: 3, organization_delete_delay_ms: 1 },
        }
    }

    pub async fn manager(&self) -> MdrManager {
        MdrManager::connect(self.config()).await.expect("connect")
    }

    /// Answer `assets/list` for `page` with `items`
    pub async fn mount_assets_page(&self, page: u32, items: Value) {
        Mock::given(method("POST"))
            .and(path(api_path("assets/list")))
            .and(body_partial_json(json!({"page": page})))
            .respond_with(ResponseTemplate::new(200).set_body_json(items))
            .mount(&self.server)
            .await;
    }

    /// `page` fields of every `resource_action` request, in arrival order
    pub async fn requested_pages(&self, resource_action: &str) -> Vec<u64> {
        self.bodies(resource_action).await.iter().filter_map(|body| body["page"].as_u64()).collect()
    }

    pub async fn bodies(&self, resource_action: &str) -> Vec<Value> {
        let wanted = api_path(resource_action);
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|req| req.url.path() == wanted)
            .filter_map(|req| serde_json::from_slice(&req.body).ok())
            .collect()
    }
}
