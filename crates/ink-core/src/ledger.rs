//! Append-only ledger entries.
//!
//! Every balance-affecting operation creates exactly one `LedgerEntry`;
//! entries are never updated or deleted. The audit payload is a tagged
//! variant keyed by `reason`, so each reason carries a fixed shape instead
//! of an open bag of fields. Each variant snapshots the balance `before`
//! and `after` the write it mirrors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, CostBreakdown, EntryId, OrderId, PackageSnapshot, SessionId, UsageReport};

/// An immutable record of one balance change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique entry id (ULID for time-ordering).
    pub id: EntryId,

    /// The account whose balance changed.
    pub account_id: AccountId,

    /// Signed change in ink points. Positive = credit, negative = debit.
    ///
    /// Always the *realized* delta: new balance minus the balance the
    /// store reported at write time, never re-derived from caller intent.
    pub delta: i64,

    /// Audit payload, tagged by reason.
    pub detail: LedgerDetail,

    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Create a new entry with a fresh id and timestamp.
    #[must_use]
    pub fn new(account_id: AccountId, delta: i64, detail: LedgerDetail) -> Self {
        Self {
            id: EntryId::generate(),
            account_id,
            delta,
            detail,
            created_at: Utc::now(),
        }
    }

    /// The reason tag, as persisted.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match &self.detail {
            LedgerDetail::OrderPaid { .. } => "order_paid",
            LedgerDetail::AdminAdjustment { .. } => "admin_adjustment",
            LedgerDetail::AdminSetBalance { .. } => "admin_set_balance",
            LedgerDetail::AiUsageCharge { .. } => "ai_usage_charge",
            LedgerDetail::SessionSettlement { .. } => "session_settlement",
        }
    }

    /// The order credited by this entry, if it is an `order_paid` entry.
    #[must_use]
    pub const fn credited_order(&self) -> Option<OrderId> {
        match &self.detail {
            LedgerDetail::OrderPaid { order_id, .. } => Some(*order_id),
            _ => None,
        }
    }

    /// The caller-supplied idempotency key, for retry-guarded reasons.
    #[must_use]
    pub fn idempotency_key(&self) -> Option<&str> {
        match &self.detail {
            LedgerDetail::AiUsageCharge {
                idempotency_key, ..
            }
            | LedgerDetail::AdminAdjustment {
                idempotency_key, ..
            }
            | LedgerDetail::AdminSetBalance {
                idempotency_key, ..
            } => idempotency_key.as_deref(),
            _ => None,
        }
    }

    /// Balance snapshot before the paired write.
    #[must_use]
    pub const fn balance_before(&self) -> i64 {
        match &self.detail {
            LedgerDetail::OrderPaid { before, .. }
            | LedgerDetail::AdminAdjustment { before, .. }
            | LedgerDetail::AdminSetBalance { before, .. }
            | LedgerDetail::AiUsageCharge { before, .. }
            | LedgerDetail::SessionSettlement { before, .. } => *before,
        }
    }

    /// Balance snapshot after the paired write.
    #[must_use]
    pub const fn balance_after(&self) -> i64 {
        match &self.detail {
            LedgerDetail::OrderPaid { after, .. }
            | LedgerDetail::AdminAdjustment { after, .. }
            | LedgerDetail::AdminSetBalance { after, .. }
            | LedgerDetail::AiUsageCharge { after, .. }
            | LedgerDetail::SessionSettlement { after, .. } => *after,
        }
    }
}

/// Audit payload for a ledger entry, tagged by `reason`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum LedgerDetail {
    /// A purchase order was credited. Written at most once per order.
    OrderPaid {
        /// The credited order.
        order_id: OrderId,
        /// Payment provider name.
        provider: String,
        /// Provider-side transaction reference, if any.
        provider_txn_id: Option<String>,
        /// Balance before the credit.
        before: i64,
        /// Balance after the credit.
        after: i64,
        /// Catalog snapshot taken when the order was created.
        package: PackageSnapshot,
        /// Who confirmed the payment.
        actor: AccountId,
    },

    /// Manual relative correction by an admin.
    AdminAdjustment {
        /// Balance before the adjustment.
        before: i64,
        /// Balance after the adjustment (clamped to >= 0).
        after: i64,
        /// The delta the admin asked for, pre-clamping.
        requested_delta: i64,
        /// The acting admin.
        actor: AccountId,
        /// Optional operator note.
        note: Option<String>,
        /// Caller-supplied retry guard.
        idempotency_key: Option<String>,
    },

    /// Manual absolute correction by an admin.
    AdminSetBalance {
        /// Balance before the write.
        before: i64,
        /// Balance after the write (clamped to >= 0).
        after: i64,
        /// The absolute value the admin asked for, pre-clamping.
        requested_value: i64,
        /// The acting admin.
        actor: AccountId,
        /// Optional operator note.
        note: Option<String>,
        /// Caller-supplied retry guard.
        idempotency_key: Option<String>,
    },

    /// A metered AI inference call was charged.
    AiUsageCharge {
        /// Balance before the charge.
        before: i64,
        /// Balance after the charge.
        after: i64,
        /// Token counts reported upstream.
        usage: UsageReport,
        /// The arithmetic behind the charge.
        breakdown: CostBreakdown,
        /// The grading session the call was attributed to, if any.
        session_id: Option<SessionId>,
        /// Caller-supplied retry guard.
        idempotency_key: Option<String>,
    },

    /// Residual charge finalized when a session expired.
    SessionSettlement {
        /// The settled session.
        session_id: SessionId,
        /// Balance before settlement.
        before: i64,
        /// Balance after settlement.
        after: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage_entry(account_id: AccountId, key: Option<&str>) -> LedgerEntry {
        let usage = UsageReport::new(1000, 500);
        let breakdown = crate::PricingConfig::default().charge_for(&usage);
        LedgerEntry::new(
            account_id,
            -breakdown.charge,
            LedgerDetail::AiUsageCharge {
                before: 100,
                after: 100 - breakdown.charge,
                usage,
                breakdown,
                session_id: None,
                idempotency_key: key.map(str::to_owned),
            },
        )
    }

    #[test]
    fn reason_tags_match_wire_names() {
        let account_id = AccountId::generate();
        let entry = usage_entry(account_id, None);
        assert_eq!(entry.reason(), "ai_usage_charge");

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["detail"]["reason"], "ai_usage_charge");
    }

    #[test]
    fn credited_order_only_on_order_paid() {
        let account_id = AccountId::generate();
        let order_id = OrderId::generate();
        let entry = LedgerEntry::new(
            account_id,
            550,
            LedgerDetail::OrderPaid {
                order_id,
                provider: "portone".into(),
                provider_txn_id: Some("imp_1".into()),
                before: 0,
                after: 550,
                package: PackageSnapshot {
                    package_id: "pack-500".into(),
                    label: "Starter".into(),
                    description: String::new(),
                    base_credits: 500,
                    bonus_credits: 50,
                },
                actor: account_id,
            },
        );

        assert_eq!(entry.credited_order(), Some(order_id));
        assert_eq!(usage_entry(account_id, None).credited_order(), None);
    }

    #[test]
    fn idempotency_key_surfaces_for_guarded_reasons() {
        let account_id = AccountId::generate();
        assert_eq!(
            usage_entry(account_id, Some("retry-1")).idempotency_key(),
            Some("retry-1")
        );
        assert_eq!(usage_entry(account_id, None).idempotency_key(), None);
    }

    #[test]
    fn before_after_snapshots() {
        let entry = usage_entry(AccountId::generate(), None);
        assert_eq!(entry.balance_before(), 100);
        assert_eq!(entry.balance_after(), 100 + entry.delta);
    }
}
