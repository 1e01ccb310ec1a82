//! Ink Economy HTTP API Service.
//!
//! This crate provides the HTTP API for the ink economy, including:
//!
//! - Account registration and admin corrections
//! - Ink-point balance and ledger history
//! - Usage metering for AI grading calls
//! - Grading session lifecycle
//! - Order reconciliation against the package catalog
//!
//! # Authentication
//!
//! Requests carry identity headers set by the gateway in front of this
//! service: `x-account-id` (required) and `x-role` (`admin` elevates).

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers stay async for routing consistency

pub mod auth;
pub mod billing;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
