//! # RocksDB Storage Adapter
//!
//! Production implementation of [`KeyedStore`].
//!
//! One default column family holds everything: ledger tables and the
//! shared-memory namespaces are separated by [`crate::PrefixStore`] views,
//! which is what lets a single `WriteBatch` commit a block's ledger changes
//! together with its cross-chain requests.

use crate::errors::DbError;
use crate::ports::{Batch, BatchOperation, KeyedStore};
use parking_lot::RwLock;
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, WriteOptions, DB};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Path to the database directory
    pub path: String,
    /// Block cache size in bytes (default: 256MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 64MB)
    pub write_buffer_size: usize,
    pub max_write_buffer_number: i32,
    /// fsync after each write
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: "./data/platform".to_string(),
            block_cache_size: 256 * 1024 * 1024,
            write_buffer_size: 64 * 1024 * 1024,
            max_write_buffer_number: 3,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Smaller buffers, no sync.
    pub fn for_testing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 8 * 1024 * 1024,
            write_buffer_size: 4 * 1024 * 1024,
            max_write_buffer_number: 2,
            sync_writes: false,
        }
    }
}

pub struct RocksDbStore {
    db: Arc<RwLock<DB>>,
    config: RocksDbConfig,
}

impl RocksDbStore {
    pub fn open(config: RocksDbConfig) -> Result<Self, DbError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_max_write_buffer_number(config.max_write_buffer_number);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&rocksdb::Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let db = DB::open(&opts, &config.path)
            .map_err(|e| DbError::io(format!("Failed to open RocksDB: {}", e)))?;
        tracing::info!(path = %config.path, "opened rocksdb store");

        Ok(Self {
            db: Arc::new(RwLock::new(db)),
            config,
        })
    }

    fn write_opts(&self) -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(self.config.sync_writes);
        opts
    }
}

impl KeyedStore for RocksDbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, DbError> {
        let db = self.db.read();
        db.get(key)
            .map_err(|e| DbError::io(format!("RocksDB get failed: {}", e)))
    }

    fn has(&self, key: &[u8]) -> Result<bool, DbError> {
        let db = self.db.read();
        db.get_pinned(key)
            .map(|v| v.is_some())
            .map_err(|e| DbError::io(format!("RocksDB exists check failed: {}", e)))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), DbError> {
        let db = self.db.write();
        db.put_opt(key, value, &self.write_opts())
            .map_err(|e| DbError::io(format!("RocksDB put failed: {}", e)))
    }

    fn delete(&self, key: &[u8]) -> Result<(), DbError> {
        let db = self.db.write();
        db.delete_opt(key, &self.write_opts())
            .map_err(|e| DbError::io(format!("RocksDB delete failed: {}", e)))
    }

    fn write_batch(&self, batch: Batch) -> Result<(), DbError> {
        let db = self.db.write();
        let mut wb = WriteBatch::default();
        for op in batch.into_ops() {
            match op {
                BatchOperation::Put { key, value } => wb.put(&key, &value),
                BatchOperation::Delete { key } => wb.delete(&key),
            }
        }
        db.write_opt(wb, &self.write_opts())
            .map_err(|e| DbError::io(format!("RocksDB batch write failed: {}", e)))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, DbError> {
        self.scan_from(prefix, &[])
    }

    fn scan_from(
        &self,
        prefix: &[u8],
        start: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, DbError> {
        let mut from = prefix.to_vec();
        from.extend_from_slice(start);

        let db = self.db.read();
        let mut results = Vec::new();
        for item in db.iterator(IteratorMode::From(&from, Direction::Forward)) {
            let (key, value) =
                item.map_err(|e| DbError::io(format!("RocksDB scan failed: {}", e)))?;
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
        }
        Ok(results)
    }
}
