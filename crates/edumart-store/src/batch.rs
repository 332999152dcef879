//! Atomic write batches with preconditions.

use crate::codec;
use crate::error::Result;
use crate::{Record, Versioned};

/// A single write in a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Unconditional write.
    Put {
        /// Target table.
        table: &'static str,
        /// Key.
        key: Vec<u8>,
        /// Encoded value.
        value: Vec<u8>,
    },
    /// Unconditional delete. Deleting a missing key is a no-op.
    Delete {
        /// Target table.
        table: &'static str,
        /// Key.
        key: Vec<u8>,
    },
    /// Write that fails with `StoreError::Conflict` if the key exists.
    Insert {
        /// Target table.
        table: &'static str,
        /// Key.
        key: Vec<u8>,
        /// Encoded value.
        value: Vec<u8>,
    },
    /// Write that fails with `StoreError::StaleWrite` unless the current
    /// value equals `expected` (`None` meaning absent).
    CompareAndPut {
        /// Target table.
        table: &'static str,
        /// Key.
        key: Vec<u8>,
        /// Value the caller last read.
        expected: Option<Vec<u8>>,
        /// Encoded value.
        value: Vec<u8>,
    },
}

impl WriteOp {
    /// Table the op writes to.
    #[must_use]
    pub fn table(&self) -> &'static str {
        match self {
            Self::Put { table, .. }
            | Self::Delete { table, .. }
            | Self::Insert { table, .. }
            | Self::CompareAndPut { table, .. } => table,
        }
    }

    /// Key the op writes to.
    #[must_use]
    pub fn key(&self) -> &[u8] {
        match self {
            Self::Put { key, .. }
            | Self::Delete { key, .. }
            | Self::Insert { key, .. }
            | Self::CompareAndPut { key, .. } => key,
        }
    }
}

/// A set of writes applied all-or-nothing.
///
/// Every precondition is checked against the state before the batch; if any
/// fails, nothing is written.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ops.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether the batch has no ops.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The queued ops, in order.
    #[must_use]
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Consume the batch.
    #[must_use]
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    /// Queue a raw put.
    pub fn put_raw(&mut self, table: &'static str, key: Vec<u8>, value: Vec<u8>) -> &mut Self {
        self.ops.push(WriteOp::Put { table, key, value });
        self
    }

    /// Queue a raw unique insert.
    pub fn insert_raw(&mut self, table: &'static str, key: Vec<u8>, value: Vec<u8>) -> &mut Self {
        self.ops.push(WriteOp::Insert { table, key, value });
        self
    }

    /// Queue a delete.
    pub fn delete(&mut self, table: &'static str, key: Vec<u8>) -> &mut Self {
        self.ops.push(WriteOp::Delete { table, key });
        self
    }

    /// Queue an unconditional write of a record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if the record cannot be encoded.
    pub fn put<R: Record>(&mut self, record: &R) -> Result<&mut Self> {
        let value = codec::encode(record)?;
        Ok(self.put_raw(R::TABLE, record.key(), value))
    }

    /// Queue a write of a record that must not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if the record cannot be encoded.
    pub fn insert<R: Record>(&mut self, record: &R) -> Result<&mut Self> {
        let value = codec::encode(record)?;
        Ok(self.insert_raw(R::TABLE, record.key(), value))
    }

    /// Queue a delete of a record.
    pub fn remove<R: Record>(&mut self, record: &R) -> &mut Self {
        self.delete(R::TABLE, record.key())
    }

    /// Queue a replacement of a record read earlier; the commit fails with
    /// `StoreError::StaleWrite` if someone else wrote it in between.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if the record cannot be encoded.
    pub fn replace<R: Record>(&mut self, previous: &Versioned<R>, next: &R) -> Result<&mut Self> {
        let value = codec::encode(next)?;
        self.ops.push(WriteOp::CompareAndPut {
            table: R::TABLE,
            key: next.key(),
            expected: Some(previous.raw().to_vec()),
            value,
        });
        Ok(self)
    }

    /// Like [`WriteBatch::replace`], but `previous` may be `None` for a record
    /// that did not exist when it was read. The commit then fails with
    /// `StoreError::StaleWrite` if someone created it in between.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if the record cannot be encoded.
    pub fn compare_and_put<R: Record>(
        &mut self,
        previous: Option<&Versioned<R>>,
        next: &R,
    ) -> Result<&mut Self> {
        let value = codec::encode(next)?;
        self.ops.push(WriteOp::CompareAndPut {
            table: R::TABLE,
            key: next.key(),
            expected: previous.map(|p| p.raw().to_vec()),
            value,
        });
        Ok(self)
    }
}
