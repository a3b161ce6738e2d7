//! # Manager Configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid mempool config: {0}")]
    Mempool(&'static str),

    #[error("Invalid builder config: {0}")]
    Builder(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Put the decision transactions of a rejected block back into the
    /// mempool.
    pub requeue_rejected_txs: bool,
    pub mempool_capacity: usize,
    /// Most decision transactions a built block carries.
    pub max_block_txs: usize,
    /// How many dropped transaction IDs are remembered with their reason.
    pub dropped_cache_size: usize,
    /// Period of the mempool maintenance task.
    pub maintenance_interval_ms: u64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            requeue_rejected_txs: true,
            mempool_capacity: 4_096,
            max_block_txs: 64,
            dropped_cache_size: 1_024,
            maintenance_interval_ms: 1_000,
        }
    }
}

impl ManagerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mempool_capacity == 0 {
            return Err(ConfigError::Mempool("capacity must be positive"));
        }
        if self.dropped_cache_size == 0 {
            return Err(ConfigError::Mempool("dropped cache size must be positive"));
        }
        if self.max_block_txs == 0 {
            return Err(ConfigError::Builder("max block txs must be positive"));
        }
        if self.maintenance_interval_ms == 0 {
            return Err(ConfigError::Builder("maintenance interval must be positive"));
        }
        Ok(())
    }
}
