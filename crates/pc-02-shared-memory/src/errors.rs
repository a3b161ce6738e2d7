use pc_01_keyed_store::DbError;
use shared_types::{ChainId, CodecError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SharedMemoryError {
    /// The value has not been delivered (yet). Not a corruption signal.
    #[error("Key not found in shared memory: {key}")]
    NotFound { key: String },

    #[error("Duplicate put of key {key}")]
    DuplicatePut { key: String },

    #[error("Duplicate remove of key {key}")]
    DuplicateRemove { key: String },

    #[error("Chain {chain} cannot exchange elements with itself")]
    SameChain { chain: ChainId },

    #[error("Storage error: {0}")]
    Db(#[from] DbError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

impl SharedMemoryError {
    pub fn not_found(key: &[u8]) -> Self {
        SharedMemoryError::NotFound {
            key: hex::encode(key),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SharedMemoryError::NotFound { .. })
    }
}
