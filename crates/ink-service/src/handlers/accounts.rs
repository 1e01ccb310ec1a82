//! Account registration and admin account surfaces.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use ink_core::{Account, AccountId, Role};
use ink_store::Store;

use crate::auth::{AdminIdentity, Identity};
use crate::billing::admin::{correct_balance, AdjustOutcome, Correction};
use crate::error::ApiError;
use crate::state::AppState;

/// Account representation returned by the API.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// Account id.
    pub account_id: String,
    /// Role.
    pub role: Role,
    /// Permission tier.
    pub tier: u8,
    /// Cached ink-point balance.
    pub balance: i64,
    /// Admin note, if set.
    pub admin_note: Option<String>,
    /// Registration time.
    pub created_at: String,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.account_id.to_string(),
            role: account.role,
            tier: account.tier,
            balance: account.balance,
            admin_note: account.admin_note.clone(),
            created_at: account.created_at.to_rfc3339(),
        }
    }
}

/// Register the calling account. Idempotent: an existing account is
/// returned unchanged.
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<AccountResponse>, ApiError> {
    if let Some(existing) = state.store.get_account(&identity.account_id)? {
        return Ok(Json(AccountResponse::from(&existing)));
    }

    let account = Account::new(identity.account_id, identity.role);
    state.store.put_account(&account)?;

    tracing::info!(account_id = %account.account_id, "Account registered");

    Ok(Json(AccountResponse::from(&account)))
}

/// Get the calling account.
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state
        .store
        .get_account(&identity.account_id)?
        .ok_or_else(|| ApiError::NotFound("account not registered".into()))?;

    Ok(Json(AccountResponse::from(&account)))
}

/// Account list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListAccountsQuery {
    /// Maximum number of accounts to return (default: 50).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// Account list response.
#[derive(Debug, Serialize)]
pub struct ListAccountsResponse {
    /// Accounts, newest registration first.
    pub accounts: Vec<AccountResponse>,
}

/// List accounts (admin).
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    _admin: AdminIdentity,
    Query(query): Query<ListAccountsQuery>,
) -> Result<Json<ListAccountsResponse>, ApiError> {
    let accounts = state
        .store
        .list_accounts(query.limit.min(100), query.offset)?;

    Ok(Json(ListAccountsResponse {
        accounts: accounts.iter().map(AccountResponse::from).collect(),
    }))
}

/// Admin account patch request.
///
/// Profile fields (role, tier, note) bypass the ledger; the balance
/// corrections never do.
#[derive(Debug, Deserialize)]
pub struct PatchAccountRequest {
    /// New role, if changing.
    pub role: Option<Role>,
    /// New tier, if changing.
    pub tier: Option<u8>,
    /// New admin note, if changing.
    pub admin_note: Option<String>,
    /// Set the balance to an absolute value (clamped to >= 0).
    pub set_balance: Option<i64>,
    /// Shift the balance by a delta (result clamped to >= 0).
    pub adjust_balance: Option<i64>,
    /// Operator note stored with the ledger entry.
    pub correction_note: Option<String>,
    /// Retry guard for the balance correction.
    pub idempotency_key: Option<String>,
}

/// Admin account patch response.
#[derive(Debug, Serialize)]
pub struct PatchAccountResponse {
    /// The account after the patch.
    pub account: AccountResponse,
    /// The balance correction outcome, when one was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correction: Option<CorrectionResponse>,
}

/// Serialized balance-correction outcome.
#[derive(Debug, Serialize)]
pub struct CorrectionResponse {
    /// Balance before the write.
    pub balance_before: i64,
    /// Balance after the write.
    pub balance_after: i64,
    /// The delta the ledger recorded (zero for no-ops).
    pub realized_delta: i64,
    /// False when the balance write lost its ledger append.
    pub applied: bool,
    /// The audit entry id, when one was written.
    pub entry_id: Option<String>,
}

impl From<AdjustOutcome> for CorrectionResponse {
    fn from(outcome: AdjustOutcome) -> Self {
        Self {
            balance_before: outcome.balance_before,
            balance_after: outcome.balance_after,
            realized_delta: outcome.realized_delta,
            applied: outcome.applied,
            entry_id: outcome.entry_id.map(|id| id.to_string()),
        }
    }
}

/// Patch an account (admin): profile fields and/or a balance correction.
pub async fn patch_account(
    State(state): State<Arc<AppState>>,
    admin: AdminIdentity,
    Path(account_id): Path<String>,
    Json(body): Json<PatchAccountRequest>,
) -> Result<Json<PatchAccountResponse>, ApiError> {
    let account_id = account_id
        .parse::<AccountId>()
        .map_err(|_| ApiError::Validation("invalid account id".into()))?;

    let correction = match (body.set_balance, body.adjust_balance) {
        (Some(_), Some(_)) => {
            return Err(ApiError::Validation(
                "set_balance and adjust_balance are mutually exclusive".into(),
            ))
        }
        (Some(value), None) => Some(Correction::SetBalance(value)),
        (None, Some(delta)) => Some(Correction::AdjustBalance(delta)),
        (None, None) => None,
    };

    // Profile fields first; they are independent of the ledger.
    let mut account = state
        .store
        .get_account(&account_id)?
        .ok_or_else(|| ApiError::NotFound(format!("account not found: {account_id}")))?;

    if body.role.is_some() || body.tier.is_some() || body.admin_note.is_some() {
        if let Some(role) = body.role {
            account.role = role;
        }
        if let Some(tier) = body.tier {
            account.tier = tier;
        }
        if let Some(note) = body.admin_note {
            account.admin_note = Some(note);
        }
        account.updated_at = Utc::now();
        state.store.put_account(&account)?;
    }

    let correction = correction
        .map(|correction| {
            correct_balance(
                state.store.as_ref(),
                account_id,
                correction,
                admin.0.account_id,
                body.correction_note.clone(),
                body.idempotency_key.clone(),
            )
        })
        .transpose()?;

    let account = state
        .store
        .get_account(&account_id)?
        .ok_or_else(|| ApiError::NotFound(format!("account not found: {account_id}")))?;

    Ok(Json(PatchAccountResponse {
        account: AccountResponse::from(&account),
        correction: correction.map(CorrectionResponse::from),
    }))
}
