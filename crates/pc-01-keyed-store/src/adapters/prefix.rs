use crate::errors::DbError;
use crate::ports::{Batch, KeyedStore};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// A keyspace carved out of another store.
///
/// The physical prefix is `sha256(name)`, so every view has a fixed-length
/// prefix and no two names can produce overlapping keyspaces. Views nest:
/// wrapping a `PrefixStore` in another one prefixes twice.
#[derive(Clone)]
pub struct PrefixStore {
    prefix: [u8; 32],
    inner: Arc<dyn KeyedStore>,
}

impl PrefixStore {
    pub fn new(name: &[u8], inner: Arc<dyn KeyedStore>) -> Self {
        Self {
            prefix: Sha256::digest(name).into(),
            inner,
        }
    }

    /// Nested view: `PrefixStore::new(name, Arc::new(self.clone()))`.
    pub fn nested(&self, name: &[u8]) -> Self {
        Self::new(name, Arc::new(self.clone()))
    }

    fn physical(&self, key: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.prefix.len() + key.len());
        out.extend_from_slice(&self.prefix);
        out.extend_from_slice(key);
        out
    }

    fn strip(&self, pairs: Vec<(Vec<u8>, Vec<u8>)>) -> Vec<(Vec<u8>, Vec<u8>)> {
        let n = self.prefix.len();
        pairs
            .into_iter()
            .map(|(k, v)| (k[n..].to_vec(), v))
            .collect()
    }
}

impl KeyedStore for PrefixStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, DbError> {
        self.inner.get(&self.physical(key))
    }

    fn has(&self, key: &[u8]) -> Result<bool, DbError> {
        self.inner.has(&self.physical(key))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), DbError> {
        self.inner.put(&self.physical(key), value)
    }

    fn delete(&self, key: &[u8]) -> Result<(), DbError> {
        self.inner.delete(&self.physical(key))
    }

    fn write_batch(&self, batch: Batch) -> Result<(), DbError> {
        self.inner.write_batch(batch.map_keys(|k| self.physical(k)))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, DbError> {
        Ok(self.strip(self.inner.prefix_scan(&self.physical(prefix))?))
    }

    fn scan_from(
        &self,
        prefix: &[u8],
        start: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, DbError> {
        Ok(self.strip(self.inner.scan_from(&self.physical(prefix), start)?))
    }
}
