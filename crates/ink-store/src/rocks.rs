//! `RocksDB` storage implementation.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode, Options,
    WriteBatch,
};

use ink_core::{
    Account, AccountId, EntryId, LedgerEntry, Order, OrderId, Package, Session, SessionId,
    SessionStatus,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<rocksdb::MultiThreaded>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn get_cf_value<T: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        key: &[u8],
    ) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn put_cf_value<T: serde::Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let value = Self::serialize(value)?;
        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Record ids under an account prefix, newest first.
    ///
    /// ULIDs are time-ordered, so a forward scan yields oldest first;
    /// collect and reverse.
    fn account_index_ids(&self, cf_name: &str, account_id: &AccountId) -> Result<Vec<[u8; 16]>> {
        let cf = self.cf(cf_name)?;
        let prefix = keys::account_prefix(account_id);

        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&prefix, Direction::Forward));

        let mut ids = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            if let Some(id) = keys::index_record_id(&key) {
                ids.push(id);
            }
        }

        ids.reverse();
        Ok(ids)
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Accounts & Balance Cache
    // =========================================================================

    fn put_account(&self, account: &Account) -> Result<()> {
        self.put_cf_value(cf::ACCOUNTS, &keys::account_key(&account.account_id), account)
    }

    fn get_account(&self, account_id: &AccountId) -> Result<Option<Account>> {
        self.get_cf_value(cf::ACCOUNTS, &keys::account_key(account_id))
    }

    fn list_accounts(&self, limit: usize, offset: usize) -> Result<Vec<Account>> {
        let cf = self.cf(cf::ACCOUNTS)?;

        // Account keys are UUIDs with no time ordering; sort after the scan.
        let mut accounts = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            accounts.push(Self::deserialize::<Account>(&value)?);
        }
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(accounts.into_iter().skip(offset).take(limit).collect())
    }

    fn write_balance(&self, account_id: &AccountId, new_balance: i64) -> Result<i64> {
        let mut account = self
            .get_account(account_id)?
            .ok_or_else(|| StoreError::NotFound {
                entity: "account",
                id: account_id.to_string(),
            })?;

        let previous = account.balance;
        account.balance = new_balance;
        account.updated_at = chrono::Utc::now();

        self.put_cf_value(cf::ACCOUNTS, &keys::account_key(account_id), &account)?;

        Ok(previous)
    }

    // =========================================================================
    // Ledger (append-only)
    // =========================================================================

    fn append_entry(&self, entry: &LedgerEntry) -> Result<()> {
        let cf_ledger = self.cf(cf::LEDGER)?;
        let cf_by_account = self.cf(cf::LEDGER_BY_ACCOUNT)?;

        let entry_key = keys::entry_key(&entry.id);
        let index_key = keys::account_index_key(&entry.account_id, entry.id.to_bytes());
        let value = Self::serialize(entry)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_ledger, &entry_key, &value);
        batch.put_cf(&cf_by_account, &index_key, []); // Index entry (empty value)

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(
            entry_id = %entry.id,
            account_id = %entry.account_id,
            delta = entry.delta,
            reason = entry.reason(),
            "Ledger entry appended"
        );

        Ok(())
    }

    fn get_entry(&self, entry_id: &EntryId) -> Result<Option<LedgerEntry>> {
        self.get_cf_value(cf::LEDGER, &keys::entry_key(entry_id))
    }

    fn list_entries(
        &self,
        account_id: &AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LedgerEntry>> {
        let ids = self.account_index_ids(cf::LEDGER_BY_ACCOUNT, account_id)?;

        let mut entries = Vec::new();
        for id in ids.into_iter().skip(offset) {
            if entries.len() >= limit {
                break;
            }
            if let Some(entry) = self.get_entry(&EntryId::from_bytes(id))? {
                entries.push(entry);
            }
        }

        Ok(entries)
    }

    fn find_order_credit(
        &self,
        account_id: &AccountId,
        order_id: &OrderId,
    ) -> Result<Option<LedgerEntry>> {
        for id in self.account_index_ids(cf::LEDGER_BY_ACCOUNT, account_id)? {
            if let Some(entry) = self.get_entry(&EntryId::from_bytes(id))? {
                if entry.credited_order() == Some(*order_id) {
                    return Ok(Some(entry));
                }
            }
        }
        Ok(None)
    }

    fn find_entry_by_idempotency_key(
        &self,
        account_id: &AccountId,
        key: &str,
    ) -> Result<Option<LedgerEntry>> {
        for id in self.account_index_ids(cf::LEDGER_BY_ACCOUNT, account_id)? {
            if let Some(entry) = self.get_entry(&EntryId::from_bytes(id))? {
                if entry.idempotency_key() == Some(key) {
                    return Ok(Some(entry));
                }
            }
        }
        Ok(None)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    fn put_order(&self, order: &Order) -> Result<()> {
        let cf_orders = self.cf(cf::ORDERS)?;
        let cf_by_account = self.cf(cf::ORDERS_BY_ACCOUNT)?;

        let order_key = keys::order_key(&order.id);
        let index_key = keys::account_index_key(&order.account_id, order.id.to_bytes());
        let value = Self::serialize(order)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_orders, &order_key, &value);
        batch.put_cf(&cf_by_account, &index_key, []);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_order(&self, order_id: &OrderId) -> Result<Option<Order>> {
        self.get_cf_value(cf::ORDERS, &keys::order_key(order_id))
    }

    fn list_orders(&self, account_id: &AccountId) -> Result<Vec<Order>> {
        let ids = self.account_index_ids(cf::ORDERS_BY_ACCOUNT, account_id)?;

        let mut orders = Vec::new();
        for id in ids {
            if let Some(order) = self.get_order(&OrderId::from_bytes(id))? {
                orders.push(order);
            }
        }

        Ok(orders)
    }

    fn list_all_orders(&self, limit: usize, offset: usize) -> Result<Vec<Order>> {
        let cf = self.cf(cf::ORDERS)?;

        // Order keys are ULIDs; iterating from the end gives newest first.
        let mut orders = Vec::new();
        let mut skipped = 0;
        for item in self.db.iterator_cf(&cf, IteratorMode::End) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if skipped < offset {
                skipped += 1;
                continue;
            }
            if orders.len() >= limit {
                break;
            }
            orders.push(Self::deserialize::<Order>(&value)?);
        }

        Ok(orders)
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    fn put_session(&self, session: &Session) -> Result<()> {
        let cf_sessions = self.cf(cf::SESSIONS)?;
        let cf_by_account = self.cf(cf::SESSIONS_BY_ACCOUNT)?;

        let session_key = keys::session_key(&session.id);
        let index_key = keys::account_index_key(&session.account_id, session.id.to_bytes());
        let value = Self::serialize(session)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_sessions, &session_key, &value);
        batch.put_cf(&cf_by_account, &index_key, []);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_session(&self, session_id: &SessionId) -> Result<Option<Session>> {
        self.get_cf_value(cf::SESSIONS, &keys::session_key(session_id))
    }

    fn latest_active_session(&self, account_id: &AccountId) -> Result<Option<Session>> {
        for id in self.account_index_ids(cf::SESSIONS_BY_ACCOUNT, account_id)? {
            if let Some(session) = self.get_session(&SessionId::from_bytes(id))? {
                if session.status == SessionStatus::Active {
                    return Ok(Some(session));
                }
            }
        }
        Ok(None)
    }

    // =========================================================================
    // Packages
    // =========================================================================

    fn put_package(&self, package: &Package) -> Result<()> {
        self.put_cf_value(cf::PACKAGES, &keys::package_key(&package.id), package)
    }

    fn get_package(&self, package_id: &str) -> Result<Option<Package>> {
        self.get_cf_value(cf::PACKAGES, &keys::package_key(package_id))
    }

    fn list_packages(&self) -> Result<Vec<Package>> {
        let cf = self.cf(cf::PACKAGES)?;

        let mut packages = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            packages.push(Self::deserialize::<Package>(&value)?);
        }

        Ok(packages)
    }
}
