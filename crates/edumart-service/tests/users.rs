//! User registration, identity and admin user management tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::{json, Value};

use edumart_core::UserId;
use edumart_service::ServiceConfig;

#[tokio::test]
async fn health_is_public() {
    let harness = TestHarness::start().await;
    let response = harness.server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["service"], "edumart");
}

#[tokio::test]
async fn register_and_read_profile() {
    let harness = TestHarness::start().await;
    let id = UserId::generate();

    let response = harness
        .post("/v1/users", id)
        .json(&json!({ "name": "Ada", "email": "Ada@Example.com", "bio": "hi" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["id"], id.to_string());
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["role"], "student");

    let me: Value = harness.get("/v1/users/me", id).await.json();
    assert_eq!(me["name"], "Ada");

    let updated = harness
        .patch("/v1/users/me", id)
        .json(&json!({ "name": "Ada L.", "bio": "" }))
        .await;
    updated.assert_status_ok();
    let updated: Value = updated.json();
    assert_eq!(updated["name"], "Ada L.");
    assert!(updated["bio"].is_null());
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let harness = TestHarness::start().await;
    harness
        .register(UserId::generate(), "Ada", "ada@example.com", "student")
        .await;

    let response = harness
        .post("/v1/users", UserId::generate())
        .json(&json!({ "name": "Imposter", "email": "ADA@example.com" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["error"]["code"], "conflict");
}

#[tokio::test]
async fn admin_role_cannot_be_self_assigned() {
    let harness = TestHarness::start().await;
    let response = harness
        .post("/v1/users", UserId::generate())
        .json(&json!({ "name": "Mallory", "email": "m@example.com", "role": "admin" }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_or_missing_identity_is_unauthorized() {
    let harness = TestHarness::start().await;
    harness
        .get("/v1/users/me", UserId::generate())
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    harness
        .server
        .get("/v1/users/me")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bootstrap_admin_manages_users() {
    let harness = TestHarness::start().await;
    let me: Value = harness.get("/v1/users/me", harness.admin_id).await.json();
    assert_eq!(me["role"], "admin");

    let student = harness.student("Bob").await;
    harness
        .get("/v1/admin/users", student)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let users: Value = harness.get("/v1/admin/users", harness.admin_id).await.json();
    assert_eq!(users["total"], 2);

    let promoted = harness
        .post(&format!("/v1/admin/users/{student}/role"), harness.admin_id)
        .json(&json!({ "role": "instructor" }))
        .await;
    promoted.assert_status_ok();
    assert_eq!(promoted.json::<Value>()["role"], "instructor");

    harness
        .post(&format!("/v1/admin/users/{student}/deactivate"), harness.admin_id)
        .await
        .assert_status_ok();
    harness
        .get("/v1/users/me", student)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admins_cannot_demote_themselves() {
    let harness = TestHarness::start().await;
    harness
        .post(
            &format!("/v1/admin/users/{}/role", harness.admin_id),
            harness.admin_id,
        )
        .json(&json!({ "role": "student" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn gateway_key_is_enforced_when_configured() {
    let harness = TestHarness::with_config(ServiceConfig {
        gateway_key: Some("gw-secret".into()),
        ..ServiceConfig::default()
    })
    .await;

    harness
        .get("/v1/users/me", harness.admin_id)
        .await
        .assert_status_ok();

    harness
        .server
        .get("/v1/users/me")
        .add_header(
            axum::http::HeaderName::from_static("x-user-id"),
            axum::http::HeaderValue::from_str(&harness.admin_id.to_string()).unwrap(),
        )
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}
