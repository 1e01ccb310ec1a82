//! Column family definitions.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary account records, keyed by `account_id`.
    pub const ACCOUNTS: &str = "accounts";

    /// Ledger entries, keyed by `entry_id` (ULID). Append-only: no code
    /// path writes an existing key or deletes one.
    pub const LEDGER: &str = "ledger";

    /// Index: ledger entries by account, keyed by `account_id || entry_id`.
    /// Value is empty (index only).
    pub const LEDGER_BY_ACCOUNT: &str = "ledger_by_account";

    /// Purchase orders, keyed by `order_id` (ULID).
    pub const ORDERS: &str = "orders";

    /// Index: orders by account, keyed by `account_id || order_id`.
    pub const ORDERS_BY_ACCOUNT: &str = "orders_by_account";

    /// Grading sessions, keyed by `session_id` (ULID).
    pub const SESSIONS: &str = "sessions";

    /// Index: sessions by account, keyed by `account_id || session_id`.
    pub const SESSIONS_BY_ACCOUNT: &str = "sessions_by_account";

    /// Catalog packages, keyed by package id string.
    pub const PACKAGES: &str = "packages";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::ACCOUNTS,
        cf::LEDGER,
        cf::LEDGER_BY_ACCOUNT,
        cf::ORDERS,
        cf::ORDERS_BY_ACCOUNT,
        cf::SESSIONS,
        cf::SESSIONS_BY_ACCOUNT,
        cf::PACKAGES,
    ]
}
