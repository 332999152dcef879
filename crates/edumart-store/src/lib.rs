//! Storage layer for edumart.
//!
//! The store is a set of named tables, each a sorted map from binary keys to
//! CBOR-encoded values. The [`Store`] trait is deliberately small and object
//! safe: point reads, ordered prefix scans and atomic batch commits. Typed
//! access goes through [`StoreExt`] and the [`Record`] trait.
//!
//! # Consistency
//!
//! Unique constraints (one review per user and item, unique coupon codes and
//! emails, one entitlement per item) are [`WriteOp::Insert`] preconditions.
//! Counters (coupon usage, live class seats) are updated with
//! [`WriteOp::CompareAndPut`] so concurrent writers cannot lose updates; the
//! loser gets [`StoreError::StaleWrite`] and retries.
//!
//! # Example
//!
//! ```
//! use edumart_store::{MemoryStore, Store, StoreExt, WriteBatch};
//! use edumart_core::{Role, User, UserId};
//!
//! let store = MemoryStore::new();
//! let user = User::new(UserId::generate(), "Ada", "ada@example.com", Role::Student).unwrap();
//!
//! let mut batch = WriteBatch::new();
//! batch.insert(&user).unwrap();
//! store.commit(batch).unwrap();
//!
//! let loaded: Option<User> = store.fetch(user.id.as_bytes()).unwrap();
//! assert_eq!(loaded.map(|u| u.email), Some("ada@example.com".to_string()));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod batch;
pub mod codec;
pub mod error;
pub mod keys;
pub mod memory;
pub mod records;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
pub mod schema;

pub use batch::{WriteBatch, WriteOp};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use records::Record;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

/// A key/value pair returned by scans.
pub type Entry = (Vec<u8>, Vec<u8>);

/// The storage trait.
///
/// Implementations must apply [`WriteBatch`]es atomically and check every
/// precondition in the batch before writing anything.
pub trait Store: Send + Sync {
    /// Read one value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get(&self, table: &'static str, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// All entries whose key starts with `prefix`, in ascending key order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn scan_prefix(&self, table: &'static str, prefix: &[u8]) -> Result<Vec<Entry>>;

    /// Apply a batch atomically.
    ///
    /// # Errors
    ///
    /// - `StoreError::Conflict` if an insert hits an existing key.
    /// - `StoreError::StaleWrite` if a compare-and-put finds other bytes.
    fn commit(&self, batch: WriteBatch) -> Result<()>;
}

/// A record read together with its stored bytes, for compare-and-put.
#[derive(Debug, Clone)]
pub struct Versioned<R> {
    /// The decoded record.
    pub value: R,
    raw: Vec<u8>,
}

impl<R> Versioned<R> {
    /// The bytes the record was decoded from.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Take the record.
    pub fn into_inner(self) -> R {
        self.value
    }
}

/// Typed helpers over any [`Store`].
pub trait StoreExt: Store {
    /// Read and decode a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the value cannot be decoded.
    fn fetch<R: Record>(&self, key: &[u8]) -> Result<Option<R>> {
        self.get(R::TABLE, key)?
            .map(|data| codec::decode(&data))
            .transpose()
    }

    /// Read a record along with its current bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the value cannot be decoded.
    fn fetch_versioned<R: Record>(&self, key: &[u8]) -> Result<Option<Versioned<R>>> {
        self.get(R::TABLE, key)?
            .map(|raw| {
                codec::decode(&raw).map(|value| Versioned { value, raw })
            })
            .transpose()
    }

    /// Decode every record under `prefix`, in key order.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan fails or a value cannot be decoded.
    fn scan<R: Record>(&self, prefix: &[u8]) -> Result<Vec<R>> {
        self.scan_prefix(R::TABLE, prefix)?
            .into_iter()
            .map(|(_, value)| codec::decode(&value))
            .collect()
    }

    /// Whether a key exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn contains(&self, table: &'static str, key: &[u8]) -> Result<bool> {
        Ok(self.get(table, key)?.is_some())
    }

    /// Write a single record unconditionally.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the write fails.
    fn save<R: Record>(&self, record: &R) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.put(record)?;
        self.commit(batch)
    }
}

impl<S: Store + ?Sized> StoreExt for S {}
