//! Purchasable credit-pack catalog items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A purchasable ink-point pack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    /// Catalog id (stable, human-assigned).
    pub id: String,

    /// Ink points granted on purchase.
    pub base_credits: i64,

    /// Promotional extra points granted on purchase.
    pub bonus_credits: i64,

    /// Amount due at checkout, in the smallest local-currency unit.
    pub price: i64,

    /// Display label.
    pub label: String,

    /// Display description.
    pub description: String,

    /// Start of the sale window, if bounded.
    pub active_from: Option<DateTime<Utc>>,

    /// End of the sale window, if bounded.
    pub active_until: Option<DateTime<Utc>>,

    /// Catalog ordering.
    pub sort_order: i32,

    /// Whether the package is offered at all.
    pub is_active: bool,
}

impl Package {
    /// Whether the package can be purchased at `now`.
    #[must_use]
    pub fn is_purchasable(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.active_from.map_or(true, |from| now >= from)
            && self.active_until.map_or(true, |until| now < until)
    }

    /// Snapshot the fields an order must preserve.
    ///
    /// Orders keep this copy so history stays accurate if the catalog
    /// later changes.
    #[must_use]
    pub fn snapshot(&self) -> PackageSnapshot {
        PackageSnapshot {
            package_id: self.id.clone(),
            label: self.label.clone(),
            description: self.description.clone(),
            base_credits: self.base_credits,
            bonus_credits: self.bonus_credits,
        }
    }
}

/// Package fields frozen into an order at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSnapshot {
    /// The catalog id the order was created from.
    pub package_id: String,

    /// Label at purchase time.
    pub label: String,

    /// Description at purchase time.
    pub description: String,

    /// Base credits at purchase time.
    pub base_credits: i64,

    /// Bonus credits at purchase time.
    pub bonus_credits: i64,
}
