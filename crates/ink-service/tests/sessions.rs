//! Grading session integration tests.

mod common;

use chrono::{Duration, Utc};
use common::TestHarness;
use serde_json::json;

use ink_core::SessionId;
use ink_store::Store;

async fn start_session(harness: &TestHarness) -> serde_json::Value {
    let response = harness
        .server
        .post("/v1/sessions/start")
        .add_header("x-account-id", harness.teacher_id.to_string())
        .await;
    response.assert_status_ok();
    response.json()
}

#[tokio::test]
async fn start_creates_then_reuses_session() {
    let harness = TestHarness::new();
    harness.register_accounts().await;
    harness.fund_teacher(100).await;

    let first = start_session(&harness).await;
    assert_eq!(first["reused"], false);
    assert_eq!(first["session"]["status"], "active");

    let second = start_session(&harness).await;
    assert_eq!(second["reused"], true);
    assert_eq!(second["session"]["id"], first["session"]["id"]);
    assert_eq!(
        second["session"]["expires_at"],
        first["session"]["expires_at"]
    );
}

#[tokio::test]
async fn expired_session_is_settled_and_replaced_on_start() {
    let harness = TestHarness::new();
    harness.register_accounts().await;
    harness.fund_teacher(100).await;

    let first = start_session(&harness).await;
    let first_id: SessionId = first["session"]["id"].as_str().unwrap().parse().unwrap();

    // Rewind the expiry past the TTL.
    let mut stored = harness.store.get_session(&first_id).unwrap().unwrap();
    stored.expires_at = Utc::now() - Duration::minutes(1);
    harness.store.put_session(&stored).unwrap();

    let second = start_session(&harness).await;
    assert_eq!(second["reused"], false);
    assert_ne!(second["session"]["id"], first["session"]["id"]);

    let old = harness.store.get_session(&first_id).unwrap().unwrap();
    assert_eq!(old.status, ink_core::SessionStatus::Expired);
}

#[tokio::test]
async fn zero_balance_starts_but_negative_does_not() {
    let harness = TestHarness::new();
    harness.register_accounts().await;

    // Balance is zero after registration.
    start_session(&harness).await;

    // Overdraw directly; admin corrections cannot go below zero.
    harness
        .store
        .write_balance(&harness.teacher_id, -5)
        .unwrap();

    let response = harness
        .server
        .post("/v1/sessions/start")
        .add_header("x-account-id", harness.teacher_id.to_string())
        .await;

    response.assert_status(axum::http::StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn settle_session_once_only() {
    let harness = TestHarness::new();
    harness.register_accounts().await;
    harness.fund_teacher(100).await;

    let started = start_session(&harness).await;
    let session_id = started["session"]["id"].as_str().unwrap();

    let response = harness
        .server
        .post(&format!("/v1/sessions/{session_id}/settle"))
        .add_header("x-account-id", harness.teacher_id.to_string())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["charged_credits"], 0);
    assert_eq!(body["applied"], true);

    // Already settled.
    harness
        .server
        .post(&format!("/v1/sessions/{session_id}/settle"))
        .add_header("x-account-id", harness.teacher_id.to_string())
        .await
        .assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn settling_a_foreign_session_is_forbidden() {
    let harness = TestHarness::new();
    harness.register_accounts().await;
    harness.fund_teacher(100).await;

    let started = start_session(&harness).await;
    let session_id = started["session"]["id"].as_str().unwrap();

    let other = ink_core::AccountId::generate();
    harness
        .server
        .post("/v1/accounts")
        .add_header("x-account-id", other.to_string())
        .await
        .assert_status_ok();

    harness
        .server
        .post(&format!("/v1/sessions/{session_id}/settle"))
        .add_header("x-account-id", other.to_string())
        .await
        .assert_status_forbidden();

    // Admins may settle on the owner's behalf.
    harness
        .server
        .post(&format!("/v1/sessions/{session_id}/settle"))
        .add_header("x-account-id", harness.admin_id.to_string())
        .add_header("x-role", "admin")
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn usage_can_reference_the_session() {
    let harness = TestHarness::new();
    harness.register_accounts().await;
    harness.fund_teacher(100).await;

    let started = start_session(&harness).await;
    let session_id = started["session"]["id"].as_str().unwrap();

    let response = harness
        .server
        .post("/v1/usage")
        .add_header("x-account-id", harness.teacher_id.to_string())
        .json(&json!({
            "usage": { "input_tokens": 200_000, "output_tokens": 100_000 },
            "session_id": session_id
        }))
        .await;

    response.assert_status_ok();

    let ledger = harness
        .server
        .get("/v1/credits/ledger")
        .add_header("x-account-id", harness.teacher_id.to_string())
        .await;
    let ledger: serde_json::Value = ledger.json();
    let charge = ledger["entries"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["reason"] == "ai_usage_charge")
        .unwrap();
    assert_eq!(charge["detail"]["session_id"], session_id);
}
