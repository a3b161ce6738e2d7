use pc_03_staker_ledger::ChainReader;
use shared_types::BlockId;
use std::sync::Arc;

/// Resolves the ledger view a block's children execute on.
pub trait Versions: Send + Sync {
    /// `None` when the block is neither processing nor the last accepted
    /// one.
    fn get_state(&self, block_id: BlockId) -> Option<Arc<dyn ChainReader>>;
}
