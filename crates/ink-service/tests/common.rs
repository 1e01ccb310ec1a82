//! Common test utilities for ink-service integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use serde_json::json;
use tempfile::TempDir;

use ink_core::AccountId;
use ink_service::{create_router, AppState, ServiceConfig};
use ink_store::RocksStore;

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Direct store handle, shared with the service, for rewinding
    /// timestamps in TTL tests.
    pub store: Arc<RocksStore>,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// A teacher account id for authenticated requests.
    pub teacher_id: AccountId,
    /// An admin account id for privileged requests.
    pub admin_id: AccountId,
}

impl TestHarness {
    /// Create a new test harness with a fresh database.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Arc::new(RocksStore::open(temp_dir.path()).expect("Failed to open store"));

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            pricing: ink_core::PricingConfig::default(),
        };

        let state = AppState::new(Arc::clone(&store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            _temp_dir: temp_dir,
            teacher_id: AccountId::generate(),
            admin_id: AccountId::generate(),
        }
    }

    /// Register the harness teacher and admin accounts.
    pub async fn register_accounts(&self) {
        self.server
            .post("/v1/accounts")
            .add_header("x-account-id", self.teacher_id.to_string())
            .await
            .assert_status_ok();
        self.server
            .post("/v1/accounts")
            .add_header("x-account-id", self.admin_id.to_string())
            .add_header("x-role", "admin")
            .await
            .assert_status_ok();
    }

    /// Give the harness teacher a starting balance through the admin API.
    pub async fn fund_teacher(&self, balance: i64) {
        self.server
            .patch(&format!("/v1/accounts/{}", self.teacher_id))
            .add_header("x-account-id", self.admin_id.to_string())
            .add_header("x-role", "admin")
            .json(&json!({ "set_balance": balance }))
            .await
            .assert_status_ok();
    }

    /// Publish a default catalog package through the admin API.
    pub async fn seed_package(&self, id: &str, base: i64, bonus: i64) {
        self.server
            .put(&format!("/v1/packages/{id}"))
            .add_header("x-account-id", self.admin_id.to_string())
            .add_header("x-role", "admin")
            .json(&json!({
                "base_credits": base,
                "bonus_credits": bonus,
                "price": 9900,
                "label": "Test pack",
                "sort_order": 1
            }))
            .await
            .assert_status_ok();
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
