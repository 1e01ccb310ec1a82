//! Grading session handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use ink_core::{Session, SessionId, SessionStatus};
use ink_store::Store;

use crate::auth::Identity;
use crate::billing::sessions::{settle_session, start_session};
use crate::error::ApiError;
use crate::state::AppState;

/// Session representation returned by the API.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// Session id.
    pub id: String,
    /// Owning account.
    pub account_id: String,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Start time.
    pub started_at: String,
    /// Last touch time.
    pub last_activity_at: String,
    /// Fixed expiry set at start.
    pub expires_at: String,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.to_string(),
            account_id: session.account_id.to_string(),
            status: session.status,
            started_at: session.started_at.to_rfc3339(),
            last_activity_at: session.last_activity_at.to_rfc3339(),
            expires_at: session.expires_at.to_rfc3339(),
        }
    }
}

/// Session start response.
#[derive(Debug, Serialize)]
pub struct StartResponse {
    /// The active session.
    pub session: SessionResponse,
    /// True when an unexpired session was reused.
    pub reused: bool,
}

/// Start or resume the calling account's grading session.
pub async fn start(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<StartResponse>, ApiError> {
    let outcome = start_session(state.store.as_ref(), identity.account_id, Utc::now())?;

    Ok(Json(StartResponse {
        session: SessionResponse::from(&outcome.session),
        reused: outcome.reused,
    }))
}

/// Session settle response.
#[derive(Debug, Serialize)]
pub struct SettleResponse {
    /// Residual ink points charged at settlement.
    pub charged_credits: i64,
    /// Balance before settlement.
    pub balance_before: i64,
    /// Balance after settlement.
    pub balance_after: i64,
    /// False when a residual write lost its ledger append.
    pub applied: bool,
}

/// Settle a session explicitly. Owners and admins only.
pub async fn settle(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(session_id): Path<String>,
) -> Result<Json<SettleResponse>, ApiError> {
    let session_id = session_id
        .parse::<SessionId>()
        .map_err(|_| ApiError::Validation("invalid session id".into()))?;

    let session = state
        .store
        .get_session(&session_id)?
        .ok_or_else(|| ApiError::NotFound(format!("session not found: {session_id}")))?;

    if session.account_id != identity.account_id && !identity.role.is_admin() {
        return Err(ApiError::Forbidden);
    }

    let outcome = settle_session(state.store.as_ref(), session_id, Utc::now())?;

    Ok(Json(SettleResponse {
        charged_credits: outcome.charged_credits,
        balance_before: outcome.balance_before,
        balance_after: outcome.balance_after,
        applied: outcome.applied,
    }))
}
