//! Account types for the ink economy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AccountId;

/// A billing account for a teacher.
///
/// `balance` is a denormalized running total in ink points; the ledger is
/// the source of truth and every writer keeps the two in step. The balance
/// may go negative: a single usage charge is allowed to overdraw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// The account id (from the identity collaborator).
    pub account_id: AccountId,

    /// Role of the account holder.
    pub role: Role,

    /// Permission tier, interpreted by the surrounding product.
    pub tier: u8,

    /// Cached ink-point balance. Signed: may be overdrawn.
    pub balance: i64,

    /// Free-text note set by admins.
    pub admin_note: Option<String>,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with zero balance.
    #[must_use]
    pub fn new(account_id: AccountId, role: Role) -> Self {
        let now = Utc::now();
        Self {
            account_id,
            role,
            tier: 0,
            balance: 0,
            admin_note: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether a new usage charge may be accepted.
    ///
    /// Usage is blocked only when the balance is already depleted before
    /// the call; the call itself may overdraw.
    #[must_use]
    pub const fn can_charge_usage(&self) -> bool {
        self.balance > 0
    }

    /// Whether a new grading session may be started.
    ///
    /// Sessions are blocked only when the balance is strictly negative.
    #[must_use]
    pub const fn can_start_session(&self) -> bool {
        self.balance >= 0
    }
}

/// Role of an account holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Ordinary teacher account.
    Teacher,

    /// Administrator with access to corrections and catalog management.
    Admin,
}

impl Role {
    /// Whether this role may call admin surfaces.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_has_zero_balance() {
        let account = Account::new(AccountId::generate(), Role::Teacher);
        assert_eq!(account.balance, 0);
        assert!(account.admin_note.is_none());
    }

    #[test]
    fn usage_blocked_at_or_below_zero() {
        let mut account = Account::new(AccountId::generate(), Role::Teacher);
        assert!(!account.can_charge_usage());

        account.balance = 1;
        assert!(account.can_charge_usage());

        account.balance = -5;
        assert!(!account.can_charge_usage());
    }

    #[test]
    fn sessions_blocked_only_when_negative() {
        let mut account = Account::new(AccountId::generate(), Role::Teacher);
        assert!(account.can_start_session()); // exactly zero is fine

        account.balance = -1;
        assert!(!account.can_start_session());
    }

    #[test]
    fn role_admin_check() {
        assert!(Role::Admin.is_admin());
        assert!(!Role::Teacher.is_admin());
    }
}
