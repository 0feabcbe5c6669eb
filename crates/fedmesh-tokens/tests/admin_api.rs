//! Token manager against a fake admin API.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::sync::atomic::{AtomicBool, Ordering};

use fedmesh_tokens::{
    AdminClient, AdminSession, RevokeOutcome, TokenError, TokenManager, TokenStatus,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKENS: &str = "/_synapse/admin/v1/registration_tokens";

fn manager(server: &MockServer) -> TokenManager {
    TokenManager::new(AdminClient::new(&server.uri(), "syt_admin").unwrap())
}

#[tokio::test]
async fn create_with_zero_uses_sends_null_and_no_expiry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{TOKENS}/new")))
        .and(header("authorization", "Bearer syt_admin"))
        .and(body_json(json!({ "length": 16, "uses_allowed": null })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "abcdefghijklmnop",
            "uses_allowed": null,
            "pending": 0,
            "completed": 0,
            "expiry_time": null,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = manager(&server).create(Some(0), None).await.unwrap();
    assert_eq!(token.token, "abcdefghijklmnop");
    assert_eq!(token.uses_allowed, None);
}

#[tokio::test]
async fn create_defaults_to_single_use() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{TOKENS}/new")))
        .and(body_json(json!({ "length": 16, "uses_allowed": 1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "single-use-token",
            "uses_allowed": 1,
            "pending": 0,
            "completed": 0,
            "expiry_time": null,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = manager(&server).create(None, None).await.unwrap();
    assert_eq!(token.uses_allowed, Some(1));
}

#[tokio::test]
async fn create_with_bad_duration_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = manager(&server).create(None, Some("abc d")).await.unwrap_err();
    assert!(matches!(err, TokenError::DurationParse { .. }));
}

#[tokio::test]
async fn list_derives_status_before_filtering() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TOKENS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "registration_tokens": [
                { "token": "expired-but-unused", "uses_allowed": 5, "pending": 0,
                  "completed": 0, "expiry_time": 1_000 },
                { "token": "all-used-up", "uses_allowed": 3, "pending": 0,
                  "completed": 3, "expiry_time": null },
                { "token": "open-forever", "uses_allowed": null, "pending": 2,
                  "completed": 40, "expiry_time": null },
            ]
        })))
        .mount(&server)
        .await;

    let manager = manager(&server);
    let all = manager.list(false).await.unwrap();
    let statuses: Vec<TokenStatus> = all.iter().map(|l| l.status).collect();
    assert_eq!(
        statuses,
        [TokenStatus::Expired, TokenStatus::Exhausted, TokenStatus::Active]
    );

    let active = manager.list(true).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].token.token, "open-forever");
    assert_eq!(active[0].token.pending, 2);
}

#[tokio::test]
async fn revoke_without_confirmation_makes_no_call() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let asked = AtomicBool::new(false);
    let outcome = manager(&server)
        .revoke("abcdefghijklmnop", |token| {
            assert_eq!(token, "abcdefghijklmnop");
            asked.store(true, Ordering::SeqCst);
            false
        })
        .await
        .unwrap();
    assert_eq!(outcome, RevokeOutcome::Cancelled);
    assert!(asked.load(Ordering::SeqCst));
}

#[tokio::test]
async fn revoke_with_confirmation_deletes() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{TOKENS}/abcdefghijklmnop")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = manager(&server)
        .revoke("abcdefghijklmnop", |_| true)
        .await
        .unwrap();
    assert_eq!(outcome, RevokeOutcome::Revoked);
}

#[tokio::test]
async fn api_error_surfaces_error_field() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errcode": "M_NOT_FOUND",
            "error": "No such registration token: nope",
        })))
        .mount(&server)
        .await;

    let err = manager(&server).revoke("nope", |_| true).await.unwrap_err();
    match err {
        TokenError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "No such registration token: nope");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn manager_from_saved_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TOKENS))
        .and(header("authorization", "Bearer syt_saved"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "registration_tokens": [] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let session_path = dir.path().join("admin.json");
    AdminSession {
        server_url: server.uri(),
        element_url: "http://localhost:8080".into(),
        access_token: "syt_saved".into(),
    }
    .save(&session_path)
    .unwrap();

    let session = AdminSession::load(&session_path).unwrap();
    let listed = TokenManager::from_session(&session)
        .unwrap()
        .list(false)
        .await
        .unwrap();
    assert!(listed.is_empty());
}
