//! `RocksDB` storage implementation.
//!
//! One column family per table. Batch preconditions are checked under a
//! commit lock and the writes are applied with a single `RocksDB` write batch.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options,
};

use crate::batch::{WriteBatch, WriteOp};
use crate::error::{Result, StoreError};
use crate::schema::all_tables;
use crate::{Entry, Store};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    commit_lock: Mutex<()>,
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

        let cf_descriptors: Vec<_> = all_tables()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!("Opened RocksDB store");
        Ok(Self {
            db: Arc::new(db),
            commit_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }
}

impl Store for RocksStore {
    fn get(&self, table: &'static str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self.cf(table)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn scan_prefix(&self, table: &'static str, prefix: &[u8]) -> Result<Vec<Entry>> {
        let cf = self.cf(table)?;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix, Direction::Forward));

        let mut entries = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(prefix) {
                break;
            }
            entries.push((key.to_vec(), value.to_vec()));
        }
        Ok(entries)
    }

    fn commit(&self, batch: WriteBatch) -> Result<()> {
        let _guard = self
            .commit_lock
            .lock()
            .map_err(|_| StoreError::Database("commit lock poisoned".into()))?;

        let mut inserted: HashSet<(&'static str, &[u8])> = HashSet::new();
        for op in batch.ops() {
            match op {
                WriteOp::Insert { table, key, .. } => {
                    if self.get(*table, key)?.is_some() || !inserted.insert((*table, key.as_slice()))
                    {
                        return Err(StoreError::Conflict { table: *table });
                    }
                }
                WriteOp::CompareAndPut {
                    table,
                    key,
                    expected,
                    ..
                } => {
                    if self.get(*table, key)? != *expected {
                        return Err(StoreError::StaleWrite { table: *table });
                    }
                }
                WriteOp::Put { .. } | WriteOp::Delete { .. } => {}
            }
        }

        let mut write = rocksdb::WriteBatch::default();
        for op in batch.ops() {
            let cf = self.cf(op.table())?;
            match op {
                WriteOp::Put { key, value, .. }
                | WriteOp::Insert { key, value, .. }
                | WriteOp::CompareAndPut { key, value, .. } => write.put_cf(&cf, key, value),
                WriteOp::Delete { key, .. } => write.delete_cf(&cf, key),
            }
        }

        self.db
            .write(write)
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::table;
    use crate::StoreExt;
    use edumart_core::{
        Notification, NotificationKind, Order, OrderStatus, Quote, Role, User, UserId,
    };
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    #[test]
    fn record_roundtrip_and_unique_insert() {
        let (store, _dir) = create_test_store();
        let user = User::new(UserId::generate(), "Ada", "ada@example.com", Role::Student).unwrap();

        let mut batch = WriteBatch::new();
        batch.insert(&user).unwrap();
        batch.insert_raw(
            table::USERS_BY_EMAIL,
            user.email.as_bytes().to_vec(),
            user.id.as_bytes().to_vec(),
        );
        store.commit(batch).unwrap();

        let loaded: User = store.fetch(user.id.as_bytes()).unwrap().unwrap();
        assert_eq!(loaded.email, "ada@example.com");

        let mut again = WriteBatch::new();
        again.insert(&user).unwrap();
        assert!(matches!(
            store.commit(again),
            Err(StoreError::Conflict { table: "users" })
        ));
    }

    #[test]
    fn notifications_scan_in_creation_order() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();

        let first = Notification::new(user_id, NotificationKind::Sale, "first", "");
        std::thread::sleep(std::time::Duration::from_millis(2)); // Ensure different ULIDs
        let second = Notification::new(user_id, NotificationKind::Sale, "second", "");
        store.save(&second).unwrap();
        store.save(&first).unwrap();
        store
            .save(&Notification::new(UserId::generate(), NotificationKind::Sale, "other", ""))
            .unwrap();

        let listed: Vec<Notification> = store.scan(user_id.as_bytes()).unwrap();
        let titles: Vec<_> = listed.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }

    #[test]
    fn stale_write_is_rejected() {
        let (store, _dir) = create_test_store();
        let quote = Quote {
            lines: Vec::new(),
            subtotal_cents: 0,
            discount_cents: 0,
            total_cents: 0,
            coupon_code: None,
        };
        let order = Order::from_quote(UserId::generate(), quote, 20);
        store.save(&order).unwrap();

        let key = crate::keys::order_key(&order.id);
        let read = store.fetch_versioned::<Order>(&key).unwrap().unwrap();
        let mut refunded = read.value.clone();
        refunded.refund(chrono::Utc::now()).unwrap();
        store.save(&refunded).unwrap();

        let mut batch = WriteBatch::new();
        batch.replace(&read, &read.value).unwrap();
        assert!(matches!(
            store.commit(batch),
            Err(StoreError::StaleWrite { .. })
        ));
        let stored: Order = store.fetch(&key).unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Refunded);
    }
}
