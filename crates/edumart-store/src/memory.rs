//! In-memory storage implementation.
//!
//! Used by default and by the test suites. Tables are `BTreeMap`s so prefix
//! scans come back in key order, matching the `RocksDB` backend.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

use crate::batch::{WriteBatch, WriteOp};
use crate::error::{Result, StoreError};
use crate::{Entry, Store};

type Table = BTreeMap<Vec<u8>, Vec<u8>>;

/// Memory-backed storage. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<&'static str, Table>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Database("memory store lock poisoned".into())
}

impl Store for MemoryStore {
    fn get(&self, table: &'static str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.get(table).and_then(|t| t.get(key)).cloned())
    }

    fn scan_prefix(&self, table: &'static str, prefix: &[u8]) -> Result<Vec<Entry>> {
        let tables = self.tables.read().map_err(poisoned)?;
        let Some(t) = tables.get(table) else {
            return Ok(Vec::new());
        };
        Ok(t.range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn commit(&self, batch: WriteBatch) -> Result<()> {
        let mut tables = self.tables.write().map_err(poisoned)?;

        // Inserts earlier in the same batch count as existing keys.
        let mut inserted: HashSet<(&'static str, &[u8])> = HashSet::new();
        for op in batch.ops() {
            let current = tables.get(op.table()).and_then(|t| t.get(op.key()));
            match op {
                WriteOp::Insert { table, key, .. } => {
                    if current.is_some() || !inserted.insert((*table, key.as_slice())) {
                        return Err(StoreError::Conflict { table: *table });
                    }
                }
                WriteOp::CompareAndPut {
                    table, expected, ..
                } => {
                    if current != expected.as_ref() {
                        return Err(StoreError::StaleWrite { table: *table });
                    }
                }
                WriteOp::Put { .. } | WriteOp::Delete { .. } => {}
            }
        }

        for op in batch.into_ops() {
            match op {
                WriteOp::Put { table, key, value }
                | WriteOp::Insert { table, key, value }
                | WriteOp::CompareAndPut {
                    table, key, value, ..
                } => {
                    tables.entry(table).or_default().insert(key, value);
                }
                WriteOp::Delete { table, key } => {
                    if let Some(t) = tables.get_mut(table) {
                        t.remove(&key);
                    }
                }
            }
        }
        Ok(())
    }
}
