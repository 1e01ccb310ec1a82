//! Usage metering integration tests.

mod common;

use common::TestHarness;
use serde_json::json;

#[tokio::test]
async fn charge_usage_success() {
    let harness = TestHarness::new();
    harness.register_accounts().await;
    harness.fund_teacher(100).await;

    // 200k input + 100k output at the default rates costs 15 ink points.
    let response = harness
        .server
        .post("/v1/usage")
        .add_header("x-account-id", harness.teacher_id.to_string())
        .json(&json!({
            "usage": {
                "input_tokens": 200_000,
                "output_tokens": 100_000,
                "total_tokens": 300_000
            }
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["charge"], 15);
    assert_eq!(body["balance_before"], 100);
    assert_eq!(body["balance_after"], 85);
    assert_eq!(body["applied"], true);
    assert!(body["entry_id"].as_str().is_some());

    let balance = harness
        .server
        .get("/v1/credits/balance")
        .add_header("x-account-id", harness.teacher_id.to_string())
        .await;
    let balance: serde_json::Value = balance.json();
    assert_eq!(balance["balance"], 85);
}

#[tokio::test]
async fn charges_appear_in_ledger() {
    let harness = TestHarness::new();
    harness.register_accounts().await;
    harness.fund_teacher(100).await;

    for _ in 0..2 {
        harness
            .server
            .post("/v1/usage")
            .add_header("x-account-id", harness.teacher_id.to_string())
            .json(&json!({
                "usage": { "input_tokens": 200_000, "output_tokens": 100_000 }
            }))
            .await
            .assert_status_ok();
    }

    let response = harness
        .server
        .get("/v1/credits/ledger")
        .add_header("x-account-id", harness.teacher_id.to_string())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let entries = body["entries"].as_array().unwrap();
    // Funding row plus two charges.
    assert_eq!(entries.len(), 3);
    let charges: Vec<_> = entries
        .iter()
        .filter(|e| e["reason"] == "ai_usage_charge")
        .collect();
    assert_eq!(charges.len(), 2);
    assert!(charges.iter().all(|e| e["delta"] == -15));
    assert_eq!(body["has_more"], false);
}

#[tokio::test]
async fn missing_usage_report_is_upstream_error() {
    let harness = TestHarness::new();
    harness.register_accounts().await;
    harness.fund_teacher(100).await;

    let response = harness
        .server
        .post("/v1/usage")
        .add_header("x-account-id", harness.teacher_id.to_string())
        .json(&json!({}))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_GATEWAY);

    // No charge was applied.
    let balance = harness
        .server
        .get("/v1/credits/balance")
        .add_header("x-account-id", harness.teacher_id.to_string())
        .await;
    let balance: serde_json::Value = balance.json();
    assert_eq!(balance["balance"], 100);
}

#[tokio::test]
async fn inconsistent_usage_report_is_upstream_error() {
    let harness = TestHarness::new();
    harness.register_accounts().await;
    harness.fund_teacher(100).await;

    let response = harness
        .server
        .post("/v1/usage")
        .add_header("x-account-id", harness.teacher_id.to_string())
        .json(&json!({
            "usage": {
                "input_tokens": 100,
                "output_tokens": 100,
                "total_tokens": 999
            }
        }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn depleted_balance_blocks_usage() {
    let harness = TestHarness::new();
    harness.register_accounts().await;
    harness.fund_teacher(1).await;

    let usage = json!({
        "usage": { "input_tokens": 200_000, "output_tokens": 100_000 }
    });

    // Balance 1 accepts the call and overdraws to -14.
    harness
        .server
        .post("/v1/usage")
        .add_header("x-account-id", harness.teacher_id.to_string())
        .json(&usage)
        .await
        .assert_status_ok();

    // Depleted now: the next call is rejected with 402.
    let response = harness
        .server
        .post("/v1/usage")
        .add_header("x-account-id", harness.teacher_id.to_string())
        .json(&usage)
        .await;

    response.assert_status(axum::http::StatusCode::PAYMENT_REQUIRED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "insufficient_credits");
    assert_eq!(body["error"]["details"]["balance"], -14);
}

#[tokio::test]
async fn idempotency_key_replays_recorded_outcome() {
    let harness = TestHarness::new();
    harness.register_accounts().await;
    harness.fund_teacher(100).await;

    let request = json!({
        "usage": { "input_tokens": 200_000, "output_tokens": 100_000 },
        "idempotency_key": "req-1"
    });

    let first = harness
        .server
        .post("/v1/usage")
        .add_header("x-account-id", harness.teacher_id.to_string())
        .json(&request)
        .await;
    first.assert_status_ok();
    let first: serde_json::Value = first.json();

    let retry = harness
        .server
        .post("/v1/usage")
        .add_header("x-account-id", harness.teacher_id.to_string())
        .json(&request)
        .await;
    retry.assert_status_ok();
    let retry: serde_json::Value = retry.json();

    assert_eq!(retry["entry_id"], first["entry_id"]);
    assert_eq!(retry["balance_after"], 85); // charged once

    let balance = harness
        .server
        .get("/v1/credits/balance")
        .add_header("x-account-id", harness.teacher_id.to_string())
        .await;
    let balance: serde_json::Value = balance.json();
    assert_eq!(balance["balance"], 85);
}

#[tokio::test]
async fn unregistered_account_is_not_found() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/usage")
        .add_header("x-account-id", harness.teacher_id.to_string())
        .json(&json!({
            "usage": { "input_tokens": 10, "output_tokens": 10 }
        }))
        .await;

    response.assert_status_not_found();
}
