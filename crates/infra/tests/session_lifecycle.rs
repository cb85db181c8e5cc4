//! Session manager against a mocked identity provider and session API

mod support;

use mdrkit_domain::{Credential, Secret, SessionPhase, TenantRef};
use mdrkit_infra::{AccessTokenProvider, ApiError};
use serde_json::{json, Value};
use support::{access_token_for, api_path, jwt, session_id, MockBackend, CLIENT_ID, IDENTITY_TOKEN};
use wiremock::matchers::{body_string_contains, header, header_exists, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn login_walks_identity_create_and_confirm() {
    let backend = MockBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/uis/connect/token"))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("client_id=autotests"))
        .and(body_string_contains("client_secret=uis-secret"))
        .and(body_string_contains("username=robot%40example.com"))
        .and(body_string_contains("password=hunter2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": IDENTITY_TOKEN})))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path(api_path("robot_session/create")))
        .and(header("Authorization", format!("Bearer {IDENTITY_TOKEN}").as_str()))
        .and(header_exists("Request-ID"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": session_id(1),
            "refresh_token": format!("refresh-{}", session_id(1)),
        })))
        .expect(1)
        .mount(&backend.server)
        .await;
    backend.mount_confirm(3_600).await;

    let config = backend.config();
    let sessions = backend.session_manager(&config);
    assert_eq!(sessions.phase().await, SessionPhase::Unauthenticated);

    sessions.login(config.account.credential()).await.unwrap();

    assert_eq!(sessions.phase().await, SessionPhase::AccessTokenValid);
    assert_eq!(sessions.session_id().await, Some(session_id(1)));
    assert_eq!(sessions.client_id().await.unwrap(), CLIENT_ID);
    assert_eq!(sessions.identity_token().await.unwrap().value(), IDENTITY_TOKEN);

    let create = &backend.requests_to("robot_session/create").await[0];
    let body: Value = serde_json::from_slice(&create.body).unwrap();
    assert!(body["session_name"].as_str().unwrap().starts_with("autotest_"));
    assert_eq!(body["role"], "SUPERVISOR");
    assert_eq!(body["tenants"], json!([{"tenant_id": "-"}]));

    let confirm = &backend.requests_to("session/confirm").await[0];
    let body: Value = serde_json::from_slice(&confirm.body).unwrap();
    assert_eq!(body, json!({"refresh_token": format!("refresh-{}", session_id(1))}));
}

#[tokio::test]
async fn create_session_without_scope_is_root_tenant_session() {
    let backend = MockBackend::start().await;
    backend.mount_create().await;
    let config = backend.config();
    let sessions = backend.session_manager(&config);

    let role = config.session.role.clone();
    let session =
        sessions.create_session(&Secret::new(IDENTITY_TOKEN), CLIENT_ID, &role, None).await.unwrap();

    assert!(session.session_name.starts_with("autotest_tenant_"));
    assert_eq!(session.tenant_scope, vec![TenantRef::root()]);
    assert!(session.access_token.is_none());
    assert_eq!(sessions.phase().await, SessionPhase::SessionCreated);
}

#[tokio::test]
async fn second_login_deletes_prior_session_before_creating() {
    let backend = MockBackend::start().await;
    let (sessions, _api) = backend.logged_in().await;

    sessions.login(backend.config().account.credential()).await.unwrap();

    assert_eq!(sessions.session_id().await, Some(session_id(2)));
    assert_eq!(backend.deleted_session_ids().await, vec![session_id(1)]);

    let paths = backend.request_paths().await;
    let delete_at = paths.iter().position(|p| *p == api_path("robot_sessions/delete")).unwrap();
    let second_create_at = paths
        .iter()
        .enumerate()
        .filter(|(_, p)| **p == api_path("robot_session/create"))
        .map(|(i, _)| i)
        .nth(1)
        .unwrap();
    assert!(delete_at < second_create_at);
}

#[tokio::test]
async fn failed_prior_session_delete_does_not_abort_login() {
    let backend = MockBackend::start().await;
    backend.mount_identity().await;
    backend.mount_create().await;
    backend.mount_confirm(3_600).await;
    Mock::given(method("POST"))
        .and(path(api_path("robot_sessions/delete")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&backend.server)
        .await;

    let config = backend.config();
    let sessions = backend.session_manager(&config);
    sessions.login(config.account.credential()).await.unwrap();
    sessions.login(config.account.credential()).await.unwrap();

    assert_eq!(sessions.session_id().await, Some(session_id(2)));
    assert_eq!(sessions.phase().await, SessionPhase::AccessTokenValid);
}

#[tokio::test]
async fn identity_provider_rejection_is_an_auth_error() {
    let backend = MockBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/uis/connect/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})))
        .mount(&backend.server)
        .await;

    let config = backend.config();
    let sessions = backend.session_manager(&config);
    let err = sessions.login(config.account.credential()).await.unwrap_err();

    assert!(matches!(err, ApiError::Auth(_)));
    assert_eq!(sessions.phase().await, SessionPhase::Unauthenticated);
}

#[tokio::test]
async fn identity_response_without_token_is_rejected() {
    let backend = MockBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/uis/connect/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token_type": "bearer"})))
        .mount(&backend.server)
        .await;

    let config = backend.config();
    let sessions = backend.session_manager(&config);
    let err = sessions
        .obtain_identity_token("robot@example.com", &Secret::new("hunter2"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Auth(_)));
}

#[tokio::test]
async fn session_response_missing_refresh_token_is_rejected() {
    let backend = MockBackend::start().await;
    backend.mount_identity().await;
    Mock::given(method("POST"))
        .and(path(api_path("robot_session/create")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"session_id": session_id(1)})))
        .mount(&backend.server)
        .await;

    let config = backend.config();
    let sessions = backend.session_manager(&config);
    let err = sessions.login(config.account.credential()).await.unwrap_err();

    assert!(matches!(err, ApiError::Auth(_)));
    assert_eq!(sessions.session_id().await, None);
}

async fn login_with_confirm_payload(payload: Value) -> (MockBackend, Result<(), ApiError>) {
    let backend = MockBackend::start().await;
    backend.mount_identity().await;
    backend.mount_create().await;
    Mock::given(method("POST"))
        .and(path(api_path("session/confirm")))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload))
        .mount(&backend.server)
        .await;

    let config = backend.config();
    let sessions = backend.session_manager(&config);
    let result = sessions.login(config.account.credential()).await;
    assert_eq!(sessions.phase().await, SessionPhase::SessionCreated);
    (backend, result)
}

#[tokio::test]
async fn confirm_with_one_field_is_rejected() {
    let (_backend, result) = login_with_confirm_payload(json!({"access_token": "a"})).await;
    assert!(matches!(result, Err(ApiError::Auth(_))));
}

#[tokio::test]
async fn confirm_with_three_fields_is_rejected() {
    let (_backend, result) = login_with_confirm_payload(json!({
        "access_token": access_token_for(&session_id(1), 3_600),
        "refresh_token": "r",
        "expires_in": 300,
    }))
    .await;
    assert!(matches!(result, Err(ApiError::Auth(_))));
}

#[tokio::test]
async fn access_token_is_refreshed_when_close_to_expiry() {
    let backend = MockBackend::start().await;
    backend.mount_identity().await;
    backend.mount_create().await;
    // Expires well inside the default 60 s threshold
    backend.mount_confirm(10).await;

    let config = backend.config();
    let sessions = backend.session_manager(&config);
    sessions.login(config.account.credential()).await.unwrap();
    assert_eq!(backend.requests_to("session/confirm").await.len(), 1);

    sessions.access_token().await.unwrap();
    sessions.access_token().await.unwrap();
    assert_eq!(backend.requests_to("session/confirm").await.len(), 3);

    // Every refresh after the first one is authorized with the previous token
    let second = &backend.requests_to("session/confirm").await[1];
    let bearer = second.headers.get("authorization").unwrap().to_str().unwrap();
    assert!(bearer.starts_with("Bearer ey"));
}

#[tokio::test]
async fn fresh_or_expiry_less_tokens_are_not_refreshed() {
    let backend = MockBackend::start().await;
    backend.mount_identity().await;
    backend.mount_create().await;
    Mock::given(method("POST"))
        .and(path(api_path("session/confirm")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": jwt(&json!({"sub": format!("robot+{}", session_id(1))})),
            "refresh_token": "r",
        })))
        .mount(&backend.server)
        .await;

    let config = backend.config();
    let sessions = backend.session_manager(&config);
    sessions.login(config.account.credential()).await.unwrap();

    for _ in 0..3 {
        sessions.access_token().await.unwrap();
    }
    assert_eq!(backend.requests_to("session/confirm").await.len(), 1);
}

#[tokio::test]
async fn access_token_without_login_is_an_auth_error() {
    let backend = MockBackend::start().await;
    let sessions = backend.session_manager(&backend.config());

    assert!(matches!(sessions.access_token().await, Err(ApiError::Auth(_))));
    assert!(matches!(sessions.client_id().await, Err(ApiError::Auth(_))));
    assert!(matches!(sessions.identity_token().await, Err(ApiError::Auth(_))));
}

#[tokio::test]
async fn restart_replaces_refresh_token() {
    let backend = MockBackend::start().await;
    let (sessions, _api) = backend.logged_in().await;
    Mock::given(method("POST"))
        .and(path(api_path("session/restart")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"refresh_token": format!("refresh-{}", session_id(9))})),
        )
        .expect(1)
        .mount(&backend.server)
        .await;

    sessions.restart_refresh_token().await.unwrap();
    sessions.refresh_access_token().await.unwrap();

    let confirms = backend.requests_to("session/confirm").await;
    let body: Value = serde_json::from_slice(&confirms.last().unwrap().body).unwrap();
    assert_eq!(body["refresh_token"], format!("refresh-{}", session_id(9)));
}

#[tokio::test]
async fn delete_current_session_drops_tokens() {
    let backend = MockBackend::start().await;
    let (sessions, _api) = backend.logged_in().await;

    sessions.delete_session(None).await.unwrap();

    assert_eq!(sessions.phase().await, SessionPhase::Deleted);
    assert_eq!(sessions.session_id().await, None);
    assert_eq!(backend.deleted_session_ids().await, vec![session_id(1)]);
    assert!(matches!(sessions.access_token().await, Err(ApiError::Auth(_))));
}

#[tokio::test]
async fn deleting_a_foreign_session_keeps_own_session() {
    let backend = MockBackend::start().await;
    let (sessions, _api) = backend.logged_in().await;

    sessions.delete_session(Some("foreign")).await.unwrap();

    assert_eq!(sessions.phase().await, SessionPhase::AccessTokenValid);
    assert_eq!(sessions.session_id().await, Some(session_id(1)));
}

fn session_list(own: &str) -> Value {
    json!([
        {"session_id": own, "session_name": "autotest_own"},
        {"session_id": "s-x", "session_name": "X"},
        {"session_id": "s-k", "session_name": "portal-K-session"},
        {"session_id": "s-1", "session_name": "autotest_a", "role": "SUPERVISOR"},
        {"session_id": "s-2", "session_name": "autotest_b"},
    ])
}

#[tokio::test]
async fn delete_sessions_skips_own_excluded_and_keyed_sessions() {
    let backend = MockBackend::start().await;
    let (sessions, _api) = backend.logged_in().await;
    Mock::given(method("POST"))
        .and(path(api_path("robot_sessions/list")))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_list(&session_id(1))))
        .mount(&backend.server)
        .await;

    let deleted = sessions.delete_sessions(&["X"], "K").await.unwrap();

    assert_eq!(deleted, 2);
    assert_eq!(
        backend.deleted_session_ids().await,
        vec!["s-1".to_string(), "s-2".to_string(), session_id(1)]
    );
    assert_eq!(sessions.phase().await, SessionPhase::Deleted);
}

#[tokio::test]
async fn delete_extra_sessions_keeps_portal_sessions() {
    let backend = MockBackend::start().await;
    let (sessions, _api) = backend.logged_in().await;
    Mock::given(method("POST"))
        .and(path(api_path("robot_sessions/list")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"session_id": "portal", "session_name": "MDR_SESSION_1"},
            {"session_id": "stale", "session_name": "autotest_stale~"},
        ])))
        .mount(&backend.server)
        .await;

    assert_eq!(sessions.delete_extra_sessions().await.unwrap(), 1);
    assert_eq!(backend.deleted_session_ids().await, vec!["stale".to_string(), session_id(1)]);
}

#[tokio::test]
async fn session_list_is_cached_until_reset() {
    let backend = MockBackend::start().await;
    let (sessions, _api) = backend.logged_in().await;
    Mock::given(method("POST"))
        .and(path(api_path("robot_sessions/list")))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_list(&session_id(1))))
        .mount(&backend.server)
        .await;

    let first = sessions.list_sessions().await.unwrap();
    let second = sessions.list_sessions().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first[3].extra["role"], "SUPERVISOR");
    assert_eq!(backend.requests_to("robot_sessions/list").await.len(), 1);

    sessions.reset_session_cache().await;
    sessions.list_sessions().await.unwrap();
    assert_eq!(backend.requests_to("robot_sessions/list").await.len(), 2);
}

#[tokio::test]
async fn rotate_session_logs_in_again_and_deletes_previous_once() {
    let backend = MockBackend::start().await;
    let (sessions, _api) = backend.logged_in().await;

    sessions.rotate_session(None).await.unwrap();

    assert_eq!(sessions.session_id().await, Some(session_id(2)));
    assert_eq!(sessions.phase().await, SessionPhase::AccessTokenValid);
    assert_eq!(backend.deleted_session_ids().await, vec![session_id(1)]);
}

#[tokio::test]
async fn rotate_session_with_explicit_token_deletes_that_session() {
    let backend = MockBackend::start().await;
    let (sessions, _api) = backend.logged_in().await;
    let stale = Secret::new(access_token_for("5b0d3c7e-1f2a-4b6c-8d9e-0a1b2c3d4e5f", 60));

    sessions.rotate_session(Some(&stale)).await.unwrap();

    // The own session is replaced by login, the stale one deleted explicitly
    assert_eq!(
        backend.deleted_session_ids().await,
        vec![session_id(1), "5b0d3c7e-1f2a-4b6c-8d9e-0a1b2c3d4e5f".to_string()]
    );
}

#[tokio::test]
async fn rotate_session_matches_session_ids_in_any_uuid_form() {
    let backend = MockBackend::start().await;
    backend.mount_identity().await;
    backend.mount_create_with(|n| session_id(n).replace('-', "")).await;
    backend.mount_confirm(3_600).await;
    backend.mount_session_delete().await;
    let config = backend.config();
    let sessions = backend.session_manager(&config);
    sessions.login(config.account.credential()).await.unwrap();

    sessions.rotate_session(None).await.unwrap();

    assert_eq!(sessions.session_id().await, Some(session_id(2).replace('-', "")));
    assert_eq!(backend.deleted_session_ids().await, vec![session_id(1).replace('-', "")]);
}

#[tokio::test]
async fn failed_rotation_keeps_the_previous_session_reachable() {
    let backend = MockBackend::start().await;
    let (sessions, _api) = backend.logged_in().await;
    Mock::given(method("POST"))
        .and(path("/uis/connect/token"))
        .respond_with(ResponseTemplate::new(503))
        .with_priority(1)
        .mount(&backend.server)
        .await;

    let err = sessions.rotate_session(None).await.unwrap_err();

    assert!(matches!(err, ApiError::Auth(_)));
    assert_eq!(sessions.session_id().await, Some(session_id(1)));
    assert_eq!(sessions.phase().await, SessionPhase::AccessTokenValid);
    assert!(backend.deleted_session_ids().await.is_empty());

    sessions.delete_session(None).await.unwrap();
    assert_eq!(backend.deleted_session_ids().await, vec![session_id(1)]);
}

#[tokio::test]
async fn rotate_session_rejects_tokens_without_session_id() {
    let backend = MockBackend::start().await;
    let (sessions, _api) = backend.logged_in().await;
    let token = Secret::new(jwt(&json!({"sub": "robot@example.com"})));

    let err = sessions.rotate_session(Some(&token)).await.unwrap_err();
    assert!(matches!(err, ApiError::Auth(_)));
    assert_eq!(backend.requests_to("robot_session/create").await.len(), 1);
}

#[tokio::test]
async fn tenant_scoped_login_sends_scope() {
    let backend = MockBackend::start().await;
    backend.mount_login().await;
    let config = backend.config();
    let sessions = backend.session_manager(&config);

    let credential = Credential::new("robot@example.com", Secret::new("hunter2"), CLIENT_ID)
        .with_tenants(vec![TenantRef::new("tenant-7")]);
    sessions.login(credential).await.unwrap();

    let create = &backend.requests_to("robot_session/create").await[0];
    let body: Value = serde_json::from_slice(&create.body).unwrap();
    assert_eq!(body["tenants"], json!([{"tenant_id": "tenant-7"}]));
    assert_eq!(sessions.current_session().await.unwrap().tenant_scope, vec![TenantRef::new("tenant-7")]);

    let stored = sessions.credential().await.unwrap();
    assert!(!stored.is_root_scope());
}
