//! Usage charging.

use ink_core::{AccountId, EntryId, LedgerDetail, LedgerEntry, PricingConfig, SessionId, UsageReport};
use ink_store::Store;

use crate::error::ApiError;

use super::require_account;

/// Result of metering one inference call.
#[derive(Debug, Clone)]
pub struct ChargeOutcome {
    /// Ink points charged.
    pub charge: i64,

    /// Cached balance before the write.
    pub balance_before: i64,

    /// Cached balance after the write.
    pub balance_after: i64,

    /// False when the balance was written but the ledger append failed;
    /// the caller should prompt manual follow-up.
    pub applied: bool,

    /// The ledger entry recording the charge, when one was written.
    pub entry_id: Option<EntryId>,
}

/// Charge an account for one metered inference call.
///
/// New usage is blocked only when the balance is already depleted before
/// the call; the charge itself may overdraw. Without an idempotency key
/// this operation is not retry-safe: an ambiguous network failure plus a
/// client retry double-charges.
///
/// # Errors
///
/// - `ApiError::NotFound` if the account doesn't exist.
/// - `ApiError::InsufficientCredits` if the balance is already <= 0.
pub fn charge_for_usage(
    store: &dyn Store,
    pricing: &PricingConfig,
    account_id: AccountId,
    usage: UsageReport,
    session_id: Option<SessionId>,
    idempotency_key: Option<String>,
) -> Result<ChargeOutcome, ApiError> {
    let account = require_account(store, &account_id)?;

    if let Some(key) = idempotency_key.as_deref() {
        if let Some(existing) = store.find_entry_by_idempotency_key(&account_id, key)? {
            tracing::info!(
                account_id = %account_id,
                idempotency_key = %key,
                entry_id = %existing.id,
                "Usage charge replayed, returning recorded outcome"
            );
            return Ok(ChargeOutcome {
                charge: -existing.delta,
                balance_before: existing.balance_before(),
                balance_after: existing.balance_after(),
                applied: true,
                entry_id: Some(existing.id),
            });
        }
    }

    if !account.can_charge_usage() {
        return Err(ApiError::InsufficientCredits {
            balance: account.balance,
        });
    }

    let breakdown = pricing.charge_for(&usage);
    if breakdown.charge == 0 {
        // Nothing to meter; a zero charge leaves no audit row.
        return Ok(ChargeOutcome {
            charge: 0,
            balance_before: account.balance,
            balance_after: account.balance,
            applied: true,
            entry_id: None,
        });
    }

    let target = account.balance - breakdown.charge;
    let previous = store.write_balance(&account_id, target)?;
    // The realized delta: what actually happened to the cached value,
    // even if another writer slipped in since our read.
    let delta = target - previous;
    let charge = breakdown.charge;

    let entry = LedgerEntry::new(
        account_id,
        delta,
        LedgerDetail::AiUsageCharge {
            before: previous,
            after: target,
            usage,
            breakdown,
            session_id,
            idempotency_key,
        },
    );

    match store.append_entry(&entry) {
        Ok(()) => {
            tracing::info!(
                account_id = %account_id,
                charge = charge,
                balance_after = target,
                entry_id = %entry.id,
                "Usage charged"
            );
            Ok(ChargeOutcome {
                charge,
                balance_before: previous,
                balance_after: target,
                applied: true,
                entry_id: Some(entry.id),
            })
        }
        Err(e) => {
            tracing::error!(
                account_id = %account_id,
                charge = charge,
                error = %e,
                "Balance written but ledger append failed; manual reconciliation needed"
            );
            Ok(ChargeOutcome {
                charge,
                balance_before: previous,
                balance_after: target,
                applied: false,
                entry_id: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ink_core::{Account, Role};
    use ink_store::RocksStore;
    use tempfile::TempDir;

    fn store_with_account(balance: i64) -> (RocksStore, AccountId, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        let mut account = Account::new(AccountId::generate(), Role::Teacher);
        account.balance = balance;
        store.put_account(&account).unwrap();
        (store, account.account_id, dir)
    }

    #[test]
    fn scenario_a_charges_fifteen() {
        let (store, account_id, _dir) = store_with_account(100);
        let pricing = PricingConfig::default();

        let outcome = charge_for_usage(
            &store,
            &pricing,
            account_id,
            UsageReport::new(200_000, 100_000),
            None,
            None,
        )
        .unwrap();

        assert_eq!(outcome.charge, 15);
        assert_eq!(outcome.balance_before, 100);
        assert_eq!(outcome.balance_after, 85);
        assert!(outcome.applied);

        let entries = store.list_entries(&account_id, 10, 0).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].delta, -15);
        assert_eq!(entries[0].reason(), "ai_usage_charge");
    }

    #[test]
    fn usage_may_overdraw_but_not_start_from_zero() {
        let (store, account_id, _dir) = store_with_account(1);
        let pricing = PricingConfig::default();
        let usage = UsageReport::new(200_000, 100_000);

        // Balance 1 accepts the call and overdraws.
        let outcome =
            charge_for_usage(&store, &pricing, account_id, usage, None, None).unwrap();
        assert_eq!(outcome.balance_after, -14);

        // Now depleted: the next call is rejected before any write.
        let err = charge_for_usage(&store, &pricing, account_id, usage, None, None).unwrap_err();
        assert!(matches!(
            err,
            ApiError::InsufficientCredits { balance: -14 }
        ));
        assert_eq!(store.list_entries(&account_id, 10, 0).unwrap().len(), 1);
    }

    #[test]
    fn zero_tokens_leave_no_audit_row() {
        let (store, account_id, _dir) = store_with_account(100);
        let pricing = PricingConfig::default();

        let outcome = charge_for_usage(
            &store,
            &pricing,
            account_id,
            UsageReport::new(0, 0),
            None,
            None,
        )
        .unwrap();

        assert_eq!(outcome.charge, 0);
        assert!(outcome.entry_id.is_none());
        assert!(store.list_entries(&account_id, 10, 0).unwrap().is_empty());
    }

    #[test]
    fn idempotency_key_makes_retry_a_noop() {
        let (store, account_id, _dir) = store_with_account(100);
        let pricing = PricingConfig::default();
        let usage = UsageReport::new(200_000, 100_000);

        let first = charge_for_usage(
            &store,
            &pricing,
            account_id,
            usage,
            None,
            Some("req-1".into()),
        )
        .unwrap();
        let retry = charge_for_usage(
            &store,
            &pricing,
            account_id,
            usage,
            None,
            Some("req-1".into()),
        )
        .unwrap();

        assert_eq!(retry.charge, first.charge);
        assert_eq!(retry.balance_after, first.balance_after);
        assert_eq!(retry.entry_id, first.entry_id);
        assert_eq!(store.list_entries(&account_id, 10, 0).unwrap().len(), 1);

        let account = store.get_account(&account_id).unwrap().unwrap();
        assert_eq!(account.balance, 85); // charged once
    }

    #[test]
    fn without_key_a_retry_double_charges() {
        // The documented gap: retries are only safe with a key.
        let (store, account_id, _dir) = store_with_account(100);
        let pricing = PricingConfig::default();
        let usage = UsageReport::new(200_000, 100_000);

        charge_for_usage(&store, &pricing, account_id, usage, None, None).unwrap();
        charge_for_usage(&store, &pricing, account_id, usage, None, None).unwrap();

        let account = store.get_account(&account_id).unwrap().unwrap();
        assert_eq!(account.balance, 70);
        assert_eq!(store.list_entries(&account_id, 10, 0).unwrap().len(), 2);
    }
}
