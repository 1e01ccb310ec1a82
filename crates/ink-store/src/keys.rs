//! Key encoding for the column families.
//!
//! Account-scoped indexes are `account_id (16 bytes) || record_id (16
//! bytes)`. ULIDs are time-ordered, so a forward prefix scan yields a
//! record's history oldest first.

use ink_core::{AccountId, EntryId, OrderId, SessionId};

/// Account record key.
#[must_use]
pub fn account_key(account_id: &AccountId) -> Vec<u8> {
    account_id.as_bytes().to_vec()
}

/// Ledger entry key.
#[must_use]
pub fn entry_key(entry_id: &EntryId) -> Vec<u8> {
    entry_id.to_bytes().to_vec()
}

/// Order record key.
#[must_use]
pub fn order_key(order_id: &OrderId) -> Vec<u8> {
    order_id.to_bytes().to_vec()
}

/// Session record key.
#[must_use]
pub fn session_key(session_id: &SessionId) -> Vec<u8> {
    session_id.to_bytes().to_vec()
}

/// Package record key.
#[must_use]
pub fn package_key(package_id: &str) -> Vec<u8> {
    package_id.as_bytes().to_vec()
}

/// Prefix covering all of an account's index rows.
#[must_use]
pub fn account_prefix(account_id: &AccountId) -> Vec<u8> {
    account_id.as_bytes().to_vec()
}

/// Index key `account_id || record_id` for a 16-byte record id.
#[must_use]
pub fn account_index_key(account_id: &AccountId, record_id: [u8; 16]) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(account_id.as_bytes());
    key.extend_from_slice(&record_id);
    key
}

/// Extract the record-id half of an `account_id || record_id` index key.
///
/// Returns `None` if the key is not exactly 32 bytes.
#[must_use]
pub fn index_record_id(key: &[u8]) -> Option<[u8; 16]> {
    if key.len() != 32 {
        return None;
    }
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    Some(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_key_is_sixteen_bytes() {
        let account_id = AccountId::generate();
        assert_eq!(account_key(&account_id).len(), 16);
    }

    #[test]
    fn index_key_layout() {
        let account_id = AccountId::generate();
        let entry_id = EntryId::generate();
        let key = account_index_key(&account_id, entry_id.to_bytes());

        assert_eq!(key.len(), 32);
        assert_eq!(&key[..16], account_id.as_bytes());
        assert_eq!(&key[16..], entry_id.to_bytes());
    }

    #[test]
    fn index_record_id_roundtrip() {
        let account_id = AccountId::generate();
        let session_id = SessionId::generate();
        let key = account_index_key(&account_id, session_id.to_bytes());

        assert_eq!(index_record_id(&key), Some(session_id.to_bytes()));
        assert_eq!(index_record_id(&key[..20]), None);
    }
}
