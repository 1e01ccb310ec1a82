//! Billing primitives.
//!
//! Every balance-affecting operation lives here, mediated through the
//! same two-step write: overwrite the cached balance, then append the
//! ledger entry recording the realized delta. The two writes are not
//! wrapped in a transaction; when the second half fails the first is not
//! rolled back and the outcome surfaces `applied = false` so the caller
//! can prompt manual follow-up.

pub mod admin;
pub mod orders;
pub mod sessions;
pub mod usage;

use ink_core::{Account, AccountId};
use ink_store::Store;

use crate::error::ApiError;

/// Fetch an account or fail with `NotFound`.
pub(crate) fn require_account(store: &dyn Store, account_id: &AccountId) -> Result<Account, ApiError> {
    store
        .get_account(account_id)?
        .ok_or_else(|| ApiError::NotFound(format!("account not found: {account_id}")))
}
