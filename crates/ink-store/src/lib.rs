//! `RocksDB` storage layer for the ink economy.
//!
//! The ledger is the source of truth and its column family is append-only:
//! the `Store` trait exposes no way to update or delete an entry. The
//! cached account balance is written separately from the paired ledger
//! append — there is deliberately no compound operation bundling the two,
//! so callers own the dual-write and its partial-failure window.
//!
//! # Column families
//!
//! - `accounts`: account records, keyed by `account_id`
//! - `ledger` / `ledger_by_account`: entries plus a per-account index
//! - `orders` / `orders_by_account`: purchase orders plus index
//! - `sessions` / `sessions_by_account`: grading sessions plus index
//! - `packages`: catalog items, keyed by package id

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use ink_core::{
    Account, AccountId, EntryId, LedgerEntry, Order, OrderId, Package, Session, SessionId,
};

/// The storage trait defining all database operations.
///
/// Abstracts the backend so service logic can be tested against any
/// implementation.
pub trait Store: Send + Sync {
    // =========================================================================
    // Accounts & Balance Cache
    // =========================================================================

    /// Insert or update an account record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_account(&self, account: &Account) -> Result<()>;

    /// Get an account by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_account(&self, account_id: &AccountId) -> Result<Option<Account>>;

    /// List all accounts (admin surface), newest registration first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_accounts(&self, limit: usize, offset: usize) -> Result<Vec<Account>>;

    /// Overwrite the cached balance and return the balance that was stored
    /// at write time.
    ///
    /// Callers must derive the ledger delta from the returned value, not
    /// from the balance they read earlier, so the ledger mirrors what
    /// actually happened to the cache even under a lost-update race.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the account doesn't exist.
    fn write_balance(&self, account_id: &AccountId, new_balance: i64) -> Result<i64>;

    // =========================================================================
    // Ledger (append-only)
    // =========================================================================

    /// Append a ledger entry and maintain the per-account index.
    ///
    /// This is the only write the ledger column family ever sees; entries
    /// are never updated or deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn append_entry(&self, entry: &LedgerEntry) -> Result<()>;

    /// Get a ledger entry by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_entry(&self, entry_id: &EntryId) -> Result<Option<LedgerEntry>>;

    /// List an account's ledger entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_entries(
        &self,
        account_id: &AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LedgerEntry>>;

    /// Find the `order_paid` entry crediting `order_id`, if one exists.
    ///
    /// This point query is the idempotency guard for the crediting path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_order_credit(
        &self,
        account_id: &AccountId,
        order_id: &OrderId,
    ) -> Result<Option<LedgerEntry>>;

    /// Find the entry carrying a caller-supplied idempotency key, if any.
    ///
    /// Generalizes the order-credit guard to usage charges and admin
    /// adjustments.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_entry_by_idempotency_key(
        &self,
        account_id: &AccountId,
        key: &str,
    ) -> Result<Option<LedgerEntry>>;

    // =========================================================================
    // Orders
    // =========================================================================

    /// Insert or update an order and maintain the per-account index.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_order(&self, order: &Order) -> Result<()>;

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_order(&self, order_id: &OrderId) -> Result<Option<Order>>;

    /// List an account's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_orders(&self, account_id: &AccountId) -> Result<Vec<Order>>;

    /// List all orders (admin surface), newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_all_orders(&self, limit: usize, offset: usize) -> Result<Vec<Order>>;

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Insert or update a session and maintain the per-account index.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_session(&self, session: &Session) -> Result<()>;

    /// Get a session by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_session(&self, session_id: &SessionId) -> Result<Option<Session>>;

    /// The most recent session still marked active, if any.
    ///
    /// A plain point query with no locking; the at-most-one-active
    /// invariant is best effort under concurrent starts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn latest_active_session(&self, account_id: &AccountId) -> Result<Option<Session>>;

    // =========================================================================
    // Packages
    // =========================================================================

    /// Insert or update a catalog package.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_package(&self, package: &Package) -> Result<()>;

    /// Get a package by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_package(&self, package_id: &str) -> Result<Option<Package>>;

    /// List every package in the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_packages(&self) -> Result<Vec<Package>>;
}
