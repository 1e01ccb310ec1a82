//! Manual balance corrections, always mediated through the ledger.

use ink_core::{AccountId, EntryId, LedgerDetail, LedgerEntry};
use ink_store::Store;

use crate::error::ApiError;

use super::require_account;

/// Result of an admin correction.
#[derive(Debug, Clone)]
pub struct AdjustOutcome {
    /// Cached balance before the write.
    pub balance_before: i64,

    /// Cached balance after the write, clamped to >= 0.
    pub balance_after: i64,

    /// The delta that was actually realized (zero for no-ops).
    pub realized_delta: i64,

    /// False when the balance was written but the ledger append failed.
    pub applied: bool,

    /// The audit entry, when one was written. No-op corrections leave no
    /// audit row by design.
    pub entry_id: Option<EntryId>,
}

/// What kind of correction the admin asked for.
#[derive(Debug, Clone, Copy)]
pub enum Correction {
    /// Set the balance to an absolute value.
    SetBalance(i64),

    /// Shift the balance by a signed delta.
    AdjustBalance(i64),
}

/// Apply an admin balance correction.
///
/// The result is clamped to a minimum of zero, and the ledger records the
/// *realized* delta between the clamped result and the balance the store
/// held at write time. Without an idempotency key this operation is not
/// retry-safe.
///
/// # Errors
///
/// - `ApiError::NotFound` if the account doesn't exist.
pub fn correct_balance(
    store: &dyn Store,
    account_id: AccountId,
    correction: Correction,
    actor: AccountId,
    note: Option<String>,
    idempotency_key: Option<String>,
) -> Result<AdjustOutcome, ApiError> {
    let account = require_account(store, &account_id)?;

    if let Some(key) = idempotency_key.as_deref() {
        if let Some(existing) = store.find_entry_by_idempotency_key(&account_id, key)? {
            tracing::info!(
                account_id = %account_id,
                idempotency_key = %key,
                entry_id = %existing.id,
                "Admin correction replayed, returning recorded outcome"
            );
            return Ok(AdjustOutcome {
                balance_before: existing.balance_before(),
                balance_after: existing.balance_after(),
                realized_delta: existing.delta,
                applied: true,
                entry_id: Some(existing.id),
            });
        }
    }

    let clamped = match correction {
        Correction::SetBalance(value) => value.max(0),
        Correction::AdjustBalance(delta) => (account.balance + delta).max(0),
    };

    let realized = clamped - account.balance;
    if realized == 0 {
        // A no-op adjustment leaves no audit row.
        return Ok(AdjustOutcome {
            balance_before: account.balance,
            balance_after: account.balance,
            realized_delta: 0,
            applied: true,
            entry_id: None,
        });
    }

    let previous = store.write_balance(&account_id, clamped)?;
    let delta = clamped - previous;

    let detail = match correction {
        Correction::SetBalance(value) => LedgerDetail::AdminSetBalance {
            before: previous,
            after: clamped,
            requested_value: value,
            actor,
            note,
            idempotency_key,
        },
        Correction::AdjustBalance(requested) => LedgerDetail::AdminAdjustment {
            before: previous,
            after: clamped,
            requested_delta: requested,
            actor,
            note,
            idempotency_key,
        },
    };
    let entry = LedgerEntry::new(account_id, delta, detail);

    let applied = match store.append_entry(&entry) {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(
                account_id = %account_id,
                delta,
                error = %e,
                "Correction written but ledger append failed; manual reconciliation needed"
            );
            false
        }
    };

    tracing::info!(
        account_id = %account_id,
        actor = %actor,
        balance_after = clamped,
        realized_delta = delta,
        "Admin balance correction"
    );

    Ok(AdjustOutcome {
        balance_before: previous,
        balance_after: clamped,
        realized_delta: delta,
        applied,
        entry_id: applied.then_some(entry.id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ink_core::{Account, Role};
    use ink_store::RocksStore;
    use tempfile::TempDir;

    fn setup(balance: i64) -> (RocksStore, AccountId, AccountId, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();

        let mut teacher = Account::new(AccountId::generate(), Role::Teacher);
        teacher.balance = balance;
        store.put_account(&teacher).unwrap();

        let admin = Account::new(AccountId::generate(), Role::Admin);
        store.put_account(&admin).unwrap();

        (store, teacher.account_id, admin.account_id, dir)
    }

    #[test]
    fn set_balance_records_realized_delta() {
        let (store, teacher, admin, _dir) = setup(100);

        let outcome = correct_balance(
            &store,
            teacher,
            Correction::SetBalance(250),
            admin,
            Some("goodwill".into()),
            None,
        )
        .unwrap();

        assert_eq!(outcome.balance_after, 250);
        assert_eq!(outcome.realized_delta, 150);

        let entries = store.list_entries(&teacher, 10, 0).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].delta, 150);
        assert_eq!(entries[0].reason(), "admin_set_balance");
    }

    #[test]
    fn results_clamp_to_zero() {
        let (store, teacher, admin, _dir) = setup(100);

        let set = correct_balance(
            &store,
            teacher,
            Correction::SetBalance(-500),
            admin,
            None,
            None,
        )
        .unwrap();
        assert_eq!(set.balance_after, 0);
        assert_eq!(set.realized_delta, -100);

        let adjust = correct_balance(
            &store,
            teacher,
            Correction::AdjustBalance(-9999),
            admin,
            None,
            None,
        )
        .unwrap();
        assert_eq!(adjust.balance_after, 0);
        assert_eq!(adjust.realized_delta, 0); // already at zero
    }

    #[test]
    fn overdrawn_balance_clamps_up_through_the_ledger() {
        let (store, teacher, admin, _dir) = setup(-20);

        let outcome = correct_balance(
            &store,
            teacher,
            Correction::AdjustBalance(-5),
            admin,
            None,
            None,
        )
        .unwrap();

        // Requested -5 but the clamp pulls the overdrawn balance to zero.
        assert_eq!(outcome.balance_after, 0);
        assert_eq!(outcome.realized_delta, 20);

        let entries = store.list_entries(&teacher, 10, 0).unwrap();
        assert_eq!(entries[0].delta, 20);
    }

    #[test]
    fn noop_correction_leaves_no_audit_row() {
        let (store, teacher, admin, _dir) = setup(100);

        let outcome = correct_balance(
            &store,
            teacher,
            Correction::SetBalance(100),
            admin,
            None,
            None,
        )
        .unwrap();

        assert_eq!(outcome.realized_delta, 0);
        assert!(outcome.entry_id.is_none());
        assert!(store.list_entries(&teacher, 10, 0).unwrap().is_empty());
    }

    #[test]
    fn idempotency_key_makes_retry_a_noop() {
        let (store, teacher, admin, _dir) = setup(100);

        let first = correct_balance(
            &store,
            teacher,
            Correction::AdjustBalance(50),
            admin,
            None,
            Some("fix-42".into()),
        )
        .unwrap();
        let retry = correct_balance(
            &store,
            teacher,
            Correction::AdjustBalance(50),
            admin,
            None,
            Some("fix-42".into()),
        )
        .unwrap();

        assert_eq!(retry.balance_after, first.balance_after);
        assert_eq!(retry.entry_id, first.entry_id);
        assert_eq!(store.list_entries(&teacher, 10, 0).unwrap().len(), 1);
        assert_eq!(store.get_account(&teacher).unwrap().unwrap().balance, 150);
    }
}
