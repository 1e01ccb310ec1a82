//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, patch, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{accounts, credits, health, orders, packages, sessions, usage};
use crate::state::AppState;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET /v1/packages` - Purchasable package catalog
///
/// ## Accounts (identity headers)
/// - `POST /v1/accounts` - Register the calling account
/// - `GET /v1/accounts/me` - Get the calling account
/// - `GET /v1/accounts` - List accounts (admin)
/// - `PATCH /v1/accounts/:id` - Profile fields and balance corrections (admin)
///
/// ## Credits
/// - `GET /v1/credits/balance` - Cached ink-point balance
/// - `GET /v1/credits/ledger` - Ledger history, newest first
///
/// ## Usage
/// - `POST /v1/usage` - Meter one AI call
///
/// ## Sessions
/// - `POST /v1/sessions/start` - Start or resume a grading session
/// - `POST /v1/sessions/:id/settle` - Settle a session explicitly
///
/// ## Orders
/// - `POST /v1/orders` - Create a pending order
/// - `GET /v1/orders` - List own orders (expires stale pendings)
/// - `GET /v1/orders/all` - List every order (admin)
/// - `POST /v1/orders/:id/paid` - Confirm payment and credit (admin)
/// - `POST /v1/orders/:id/cancel` - Cancel an uncredited order
///
/// ## Catalog administration
/// - `PUT /v1/packages/:id` - Create or replace a package (admin)
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    Router::new()
        // Health (public)
        .route("/health", get(health::health))
        // Accounts
        .route("/v1/accounts", post(accounts::create_account))
        .route("/v1/accounts", get(accounts::list_accounts))
        .route("/v1/accounts/me", get(accounts::get_account))
        .route("/v1/accounts/:id", patch(accounts::patch_account))
        // Credits
        .route("/v1/credits/balance", get(credits::get_balance))
        .route("/v1/credits/ledger", get(credits::list_ledger))
        // Usage metering
        .route("/v1/usage", post(usage::charge))
        // Sessions
        .route("/v1/sessions/start", post(sessions::start))
        .route("/v1/sessions/:id/settle", post(sessions::settle))
        // Orders
        .route("/v1/orders", post(orders::create))
        .route("/v1/orders", get(orders::list))
        .route("/v1/orders/all", get(orders::list_all))
        .route("/v1/orders/:id/paid", post(orders::paid))
        .route("/v1/orders/:id/cancel", post(orders::cancel))
        // Package catalog
        .route("/v1/packages", get(packages::list))
        .route("/v1/packages/:id", put(packages::put))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
