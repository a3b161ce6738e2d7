use crate::errors::DbError;
use crate::ports::{Batch, BatchOperation, KeyedStore};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

/// Write-buffering overlay over a base store.
///
/// Reads see buffered writes first. Nothing reaches the base until
/// [`VersionStore::commit`], or the buffered writes are taken out as one
/// [`Batch`] with [`VersionStore::commit_batch`] so the caller can merge
/// them with other batches and write everything at once.
pub struct VersionStore {
    base: Arc<dyn KeyedStore>,
    // `None` marks a buffered delete.
    mem: RwLock<BTreeMap<Vec<u8>, Option<Vec<u8>>>>,
}

impl VersionStore {
    pub fn new(base: Arc<dyn KeyedStore>) -> Self {
        Self {
            base,
            mem: RwLock::new(BTreeMap::new()),
        }
    }

    /// Buffered writes as a batch against the base, in key order.
    pub fn commit_batch(&self) -> Batch {
        let mem = self.mem.read();
        let mut batch = Batch::new();
        for (key, value) in mem.iter() {
            match value {
                Some(v) => batch.put(key.clone(), v.clone()),
                None => batch.delete(key.clone()),
            }
        }
        batch
    }

    /// Writes the buffered changes to the base and clears the buffer.
    pub fn commit(&self) -> Result<(), DbError> {
        let batch = self.commit_batch();
        self.base.write_batch(batch)?;
        self.abort();
        Ok(())
    }

    /// Drops every buffered change.
    pub fn abort(&self) {
        self.mem.write().clear();
    }

    pub fn pending_len(&self) -> usize {
        self.mem.read().len()
    }
}

impl KeyedStore for VersionStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, DbError> {
        if let Some(entry) = self.mem.read().get(key) {
            return Ok(entry.clone());
        }
        self.base.get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), DbError> {
        self.mem.write().insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), DbError> {
        self.mem.write().insert(key.to_vec(), None);
        Ok(())
    }

    fn write_batch(&self, batch: Batch) -> Result<(), DbError> {
        let mut mem = self.mem.write();
        for op in batch.into_ops() {
            match op {
                BatchOperation::Put { key, value } => {
                    mem.insert(key, Some(value));
                }
                BatchOperation::Delete { key } => {
                    mem.insert(key, None);
                }
            }
        }
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, DbError> {
        self.scan_from(prefix, &[])
    }

    fn scan_from(
        &self,
        prefix: &[u8],
        start: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, DbError> {
        let mut merged: BTreeMap<Vec<u8>, Option<Vec<u8>>> = self
            .base
            .scan_from(prefix, start)?
            .into_iter()
            .map(|(k, v)| (k, Some(v)))
            .collect();

        let mut from = prefix.to_vec();
        from.extend_from_slice(start);
        let mem = self.mem.read();
        for (k, v) in mem
            .range::<[u8], _>((Bound::Included(from.as_slice()), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            merged.insert(k.clone(), v.clone());
        }

        Ok(merged
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k, v)))
            .collect())
    }
}
