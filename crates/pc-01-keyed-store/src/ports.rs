//! # Storage Port
//!
//! Production: `RocksDbStore` (feature `rocksdb`)
//! Testing: [`crate::MemoryStore`]

use crate::errors::DbError;

/// Ordered key/value store.
///
/// Methods take `&self`; implementations use interior locking so one store
/// can be shared behind an `Arc` by the ledger and the shared memory.
pub trait KeyedStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, DbError>;

    fn has(&self, key: &[u8]) -> Result<bool, DbError> {
        Ok(self.get(key)?.is_some())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), DbError>;

    fn delete(&self, key: &[u8]) -> Result<(), DbError>;

    /// Applies every operation of `batch` or none of them.
    fn write_batch(&self, batch: Batch) -> Result<(), DbError>;

    /// All pairs whose key starts with `prefix`, in ascending key order.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, DbError>;

    /// Pairs under `prefix` whose key is `>= prefix || start`, ascending.
    fn scan_from(
        &self,
        prefix: &[u8],
        start: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, DbError> {
        let mut from = prefix.to_vec();
        from.extend_from_slice(start);
        Ok(self
            .prefix_scan(prefix)?
            .into_iter()
            .filter(|(k, _)| k.as_slice() >= from.as_slice())
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    pub fn key(&self) -> &[u8] {
        match self {
            BatchOperation::Put { key, .. } | BatchOperation::Delete { key } => key,
        }
    }
}

/// Queued writes committed together by [`KeyedStore::write_batch`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    ops: Vec<BatchOperation>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.ops.push(BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn delete(&mut self, key: impl Into<Vec<u8>>) {
        self.ops.push(BatchOperation::Delete { key: key.into() });
    }

    /// Appends `other` after the operations already queued.
    pub fn extend(&mut self, other: Batch) {
        self.ops.extend(other.ops);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Total key and value bytes queued.
    pub fn size(&self) -> usize {
        self.ops
            .iter()
            .map(|op| match op {
                BatchOperation::Put { key, value } => key.len() + value.len(),
                BatchOperation::Delete { key } => key.len(),
            })
            .sum()
    }

    pub fn ops(&self) -> &[BatchOperation] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<BatchOperation> {
        self.ops
    }

    /// Rewrites every key through `f`.
    pub fn map_keys(self, f: impl Fn(&[u8]) -> Vec<u8>) -> Batch {
        let ops = self
            .ops
            .into_iter()
            .map(|op| match op {
                BatchOperation::Put { key, value } => BatchOperation::Put {
                    key: f(&key),
                    value,
                },
                BatchOperation::Delete { key } => BatchOperation::Delete { key: f(&key) },
            })
            .collect();
        Batch { ops }
    }
}
