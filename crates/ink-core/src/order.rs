//! Purchase orders for ink-point packs.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, OrderId, PackageSnapshot};

/// How long a pending order stays payable before it is lazily cancelled.
pub const ORDER_PENDING_TTL_MINUTES: i64 = 30;

/// A purchase order for a credit pack.
///
/// Lifecycle: created pending, then paid or cancelled. Once a paid
/// transition has produced a ledger credit, the status can never become
/// cancelled again; the ledger entry is the guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Order id (ULID, time-ordered).
    pub id: OrderId,

    /// The purchasing account.
    pub account_id: AccountId,

    /// Ink points granted on payment.
    pub base_credits: i64,

    /// Promotional extra points granted on payment.
    pub bonus_credits: i64,

    /// Amount due at checkout, smallest local-currency unit.
    pub amount_due: i64,

    /// Current lifecycle state.
    pub status: OrderStatus,

    /// Payment provider name.
    pub provider: String,

    /// Provider-side transaction reference, set when payment confirms.
    pub provider_txn_id: Option<String>,

    /// Catalog fields frozen at creation time.
    pub package: PackageSnapshot,

    /// When the order was created.
    pub created_at: DateTime<Utc>,

    /// When the order was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a pending order from a package snapshot.
    #[must_use]
    pub fn pending(
        account_id: AccountId,
        package: PackageSnapshot,
        amount_due: i64,
        provider: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::generate(),
            account_id,
            base_credits: package.base_credits,
            bonus_credits: package.bonus_credits,
            amount_due,
            status: OrderStatus::Pending,
            provider: provider.into(),
            provider_txn_id: None,
            package,
            created_at: now,
            updated_at: now,
        }
    }

    /// Total ink points this order grants when paid.
    #[must_use]
    pub const fn total_credits(&self) -> i64 {
        self.base_credits + self.bonus_credits
    }

    /// Whether a still-pending order has outlived its payment window.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.status == OrderStatus::Pending
            && now - self.created_at >= Duration::minutes(ORDER_PENDING_TTL_MINUTES)
    }
}

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, awaiting payment confirmation.
    Pending,

    /// Payment confirmed and credits granted.
    Paid,

    /// Abandoned or explicitly cancelled before payment.
    Cancelled,
}
