//! Session lifecycle and settlement.

use chrono::{DateTime, Utc};

use ink_core::{AccountId, LedgerDetail, LedgerEntry, Session, SessionId, SessionStatus};
use ink_store::Store;

use crate::error::ApiError;

use super::require_account;

/// Result of a `start` call.
#[derive(Debug, Clone)]
pub struct StartOutcome {
    /// The active session, freshly created or reused.
    pub session: Session,

    /// True when an unexpired session was returned instead of a new row.
    pub reused: bool,
}

/// Result of settling a session.
#[derive(Debug, Clone)]
pub struct SettleOutcome {
    /// Residual ink points charged at settlement.
    pub charged_credits: i64,

    /// Cached balance before settlement.
    pub balance_before: i64,

    /// Cached balance after settlement.
    pub balance_after: i64,

    /// False when a residual balance write lost its ledger append.
    pub applied: bool,
}

/// Start or resume the account's grading session.
///
/// Reuses the newest active session while its TTL holds; settles it and
/// creates a fresh one when the TTL has elapsed. There is no background
/// sweep: an abandoned session stays nominally active until this call
/// discovers it.
///
/// # Errors
///
/// - `ApiError::NotFound` if the account doesn't exist.
/// - `ApiError::InsufficientCredits` if the balance is negative.
pub fn start_session(
    store: &dyn Store,
    account_id: AccountId,
    now: DateTime<Utc>,
) -> Result<StartOutcome, ApiError> {
    let account = require_account(store, &account_id)?;

    if !account.can_start_session() {
        return Err(ApiError::InsufficientCredits {
            balance: account.balance,
        });
    }

    // Plain point query, no lock: two racing starts can both miss and
    // each create a session. Accepted for one-teacher accounts.
    match store.latest_active_session(&account_id)? {
        Some(mut session) if !session.is_expired(now) => {
            session.touch(now);
            store.put_session(&session)?;
            tracing::debug!(
                account_id = %account_id,
                session_id = %session.id,
                "Active session reused"
            );
            Ok(StartOutcome {
                session,
                reused: true,
            })
        }
        stale => {
            if let Some(session) = stale {
                // Lazily resolve the session the TTL already ended.
                settle(store, session, now)?;
            }
            let session = Session::start(account_id, now);
            store.put_session(&session)?;
            tracing::info!(
                account_id = %account_id,
                session_id = %session.id,
                expires_at = %session.expires_at,
                "Session started"
            );
            Ok(StartOutcome {
                session,
                reused: false,
            })
        }
    }
}

/// Settle a session explicitly.
///
/// # Errors
///
/// - `ApiError::NotFound` if the session doesn't exist.
/// - `ApiError::Conflict` if the session was already settled.
pub fn settle_session(
    store: &dyn Store,
    session_id: SessionId,
    now: DateTime<Utc>,
) -> Result<SettleOutcome, ApiError> {
    let session = store
        .get_session(&session_id)?
        .ok_or_else(|| ApiError::NotFound(format!("session not found: {session_id}")))?;

    if session.status == SessionStatus::Expired {
        return Err(ApiError::Conflict(format!(
            "session already settled: {session_id}"
        )));
    }

    settle(store, session, now)
}

/// Finalize a session's residual charge and mark it expired.
///
/// Per-call usage is already metered as it happens, so the residual is
/// zero today; a non-zero residual goes through the same balance-write +
/// ledger-append pair as usage charging. Idempotent per expiry
/// transition: callers check the stored status first.
fn settle(
    store: &dyn Store,
    mut session: Session,
    now: DateTime<Utc>,
) -> Result<SettleOutcome, ApiError> {
    let account = require_account(store, &session.account_id)?;
    let residual = session_residual(&session);

    let outcome = if residual == 0 {
        // No charge, no audit row.
        SettleOutcome {
            charged_credits: 0,
            balance_before: account.balance,
            balance_after: account.balance,
            applied: true,
        }
    } else {
        let target = account.balance - residual;
        let previous = store.write_balance(&session.account_id, target)?;
        let entry = LedgerEntry::new(
            session.account_id,
            target - previous,
            LedgerDetail::SessionSettlement {
                session_id: session.id,
                before: previous,
                after: target,
            },
        );
        let applied = match store.append_entry(&entry) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    session_id = %session.id,
                    error = %e,
                    "Settlement charged but ledger append failed"
                );
                false
            }
        };
        SettleOutcome {
            charged_credits: residual,
            balance_before: previous,
            balance_after: target,
            applied,
        }
    };

    session.status = SessionStatus::Expired;
    session.last_activity_at = now;
    store.put_session(&session)?;

    tracing::info!(
        session_id = %session.id,
        account_id = %session.account_id,
        charged = outcome.charged_credits,
        "Session settled"
    );

    Ok(outcome)
}

/// Residual ink points owed when a session expires.
fn session_residual(_session: &Session) -> i64 {
    0
}
