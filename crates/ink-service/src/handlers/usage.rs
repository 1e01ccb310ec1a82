//! Usage metering handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use ink_core::{SessionId, UsageReport};

use crate::auth::Identity;
use crate::billing::usage::charge_for_usage;
use crate::error::ApiError;
use crate::state::AppState;

/// Usage charge request.
///
/// `usage` is the report from the upstream AI endpoint. When the upstream
/// call failed it is absent and no charge applies.
#[derive(Debug, Deserialize)]
pub struct ChargeRequest {
    /// Token counts reported by the upstream endpoint.
    pub usage: Option<UsageBody>,
    /// The grading session this call belongs to, if any.
    pub session_id: Option<String>,
    /// Retry guard; repeating a key replays the recorded outcome.
    pub idempotency_key: Option<String>,
}

/// Usage report in request format.
#[derive(Debug, Deserialize)]
pub struct UsageBody {
    /// Tokens sent to the model.
    pub input_tokens: u64,
    /// Tokens produced by the model.
    pub output_tokens: u64,
    /// Total as reported upstream; must match the sum when present.
    pub total_tokens: Option<u64>,
}

/// Usage charge response.
#[derive(Debug, Serialize)]
pub struct ChargeResponse {
    /// Ink points charged.
    pub charge: i64,
    /// Balance before the charge.
    pub balance_before: i64,
    /// Balance after the charge.
    pub balance_after: i64,
    /// False when the balance write lost its ledger append.
    pub applied: bool,
    /// The audit entry id, when one was written.
    pub entry_id: Option<String>,
}

/// Meter one inference call against the calling account.
pub async fn charge(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(body): Json<ChargeRequest>,
) -> Result<Json<ChargeResponse>, ApiError> {
    let usage = body
        .usage
        .ok_or_else(|| ApiError::Upstream("no usable usage report; nothing charged".into()))?;

    if let Some(total) = usage.total_tokens {
        if total != usage.input_tokens + usage.output_tokens {
            return Err(ApiError::Upstream(
                "inconsistent usage report; nothing charged".into(),
            ));
        }
    }

    let session_id = body
        .session_id
        .map(|id| id.parse::<SessionId>())
        .transpose()
        .map_err(|_| ApiError::Validation("invalid session id".into()))?;

    let outcome = charge_for_usage(
        state.store.as_ref(),
        &state.config.pricing,
        identity.account_id,
        UsageReport::new(usage.input_tokens, usage.output_tokens),
        session_id,
        body.idempotency_key,
    )?;

    Ok(Json(ChargeResponse {
        charge: outcome.charge,
        balance_before: outcome.balance_before,
        balance_after: outcome.balance_after,
        applied: outcome.applied,
        entry_id: outcome.entry_id.map(|id| id.to_string()),
    }))
}
