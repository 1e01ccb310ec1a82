//! Balance and ledger read surfaces.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use ink_core::LedgerEntry;
use ink_store::Store;

use crate::auth::Identity;
use crate::error::ApiError;
use crate::state::AppState;

/// Balance response.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Cached ink-point balance. May be negative.
    pub balance: i64,
}

/// Get the current ink-point balance.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<BalanceResponse>, ApiError> {
    let account = state
        .store
        .get_account(&identity.account_id)?
        .ok_or_else(|| ApiError::NotFound("account not registered".into()))?;

    Ok(Json(BalanceResponse {
        balance: account.balance,
    }))
}

/// Ledger list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListLedgerQuery {
    /// Maximum number of entries to return (default: 50).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// Ledger entry as returned by the API.
#[derive(Debug, Serialize)]
pub struct EntryResponse {
    /// Entry id.
    pub id: String,
    /// Signed ink-point delta.
    pub delta: i64,
    /// Reason tag.
    pub reason: String,
    /// Full audit payload.
    pub detail: serde_json::Value,
    /// Timestamp.
    pub created_at: String,
}

impl EntryResponse {
    fn from_entry(entry: &LedgerEntry) -> Result<Self, ApiError> {
        Ok(Self {
            id: entry.id.to_string(),
            delta: entry.delta,
            reason: entry.reason().to_string(),
            detail: serde_json::to_value(&entry.detail)
                .map_err(|e| ApiError::Internal(e.to_string()))?,
            created_at: entry.created_at.to_rfc3339(),
        })
    }
}

/// Ledger list response.
#[derive(Debug, Serialize)]
pub struct ListLedgerResponse {
    /// Entries, newest first.
    pub entries: Vec<EntryResponse>,
    /// Whether more entries exist beyond this page.
    pub has_more: bool,
}

/// List the calling account's ledger, newest first.
pub async fn list_ledger(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Query(query): Query<ListLedgerQuery>,
) -> Result<Json<ListLedgerResponse>, ApiError> {
    state
        .store
        .get_account(&identity.account_id)?
        .ok_or_else(|| ApiError::NotFound("account not registered".into()))?;

    // Fetch one more than requested to determine has_more.
    let limit = query.limit.min(100);
    let entries = state
        .store
        .list_entries(&identity.account_id, limit + 1, query.offset)?;

    let has_more = entries.len() > limit;
    let entries = entries
        .iter()
        .take(limit)
        .map(EntryResponse::from_entry)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(ListLedgerResponse { entries, has_more }))
}
