use pc_01_keyed_store::DbError;
use shared_types::{BlockId, CodecError, Id, NodeId, SubnetId, TxId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Validator {node_id} not found in subnet {subnet_id}")]
    ValidatorNotFound { subnet_id: SubnetId, node_id: NodeId },

    #[error("UTXO not found: {0}")]
    UtxoNotFound(Id),

    #[error("Transaction not found: {0}")]
    TxNotFound(TxId),

    #[error("Subnet owner not found: {0}")]
    SubnetOwnerNotFound(SubnetId),

    #[error("Subnet transformation not found: {0}")]
    TransformationNotFound(SubnetId),

    #[error("Supply not found for subnet {0}")]
    SupplyNotFound(SubnetId),

    #[error("Block not found: {0}")]
    BlockNotFound(BlockId),

    /// A diff's parent is neither a processing block nor the last accepted
    /// one.
    #[error("Missing state for parent block {block_id}")]
    MissingParentState { block_id: BlockId },

    #[error("Validator weight overflow")]
    WeightOverflow,

    #[error("Validator weight underflow for {node_id} at height {height}")]
    WeightUnderflow { node_id: NodeId, height: u64 },

    #[error("Height {requested} is above the last accepted height {current}")]
    HeightUnavailable { requested: u64, current: u64 },

    #[error("State already initialized")]
    AlreadyInitialized,

    #[error("Storage error: {0}")]
    Db(#[from] DbError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

impl LedgerError {
    /// Lookup misses, as opposed to corruption or storage failures.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LedgerError::ValidatorNotFound { .. }
                | LedgerError::UtxoNotFound(_)
                | LedgerError::TxNotFound(_)
                | LedgerError::SubnetOwnerNotFound(_)
                | LedgerError::TransformationNotFound(_)
                | LedgerError::SupplyNotFound(_)
                | LedgerError::BlockNotFound(_)
        )
    }
}
