use super::effects::TxEffects;
use super::standard::StandardTxExecutor;
use crate::backend::Backend;
use crate::domain::{advance_time_to, next_staker_change_time};
use crate::errors::ExecutorError;
use pc_03_staker_ledger::ChainReader;
use pc_04_state_diff::{Diff, Versions};
use shared_types::{BlockId, Tx, UnsignedTx};
use std::sync::Arc;

/// Checks whether a transaction would be valid on top of the preferred
/// block, without keeping any of its effects.
pub struct MempoolTxVerifier<'a> {
    backend: &'a Backend,
    versions: Arc<dyn Versions>,
}

impl<'a> MempoolTxVerifier<'a> {
    pub fn new(backend: &'a Backend, versions: Arc<dyn Versions>) -> Self {
        Self { backend, versions }
    }

    /// After Banff the next block may advance chain time, so the check runs
    /// at the time that block would most likely carry: local time, capped at
    /// the next staker change and never before the parent's time.
    pub fn verify(&self, preferred: BlockId, tx: &Tx, now: u64) -> Result<TxEffects, ExecutorError> {
        let unsigned = tx.unsigned();
        match unsigned {
            UnsignedTx::AdvanceTime(_) | UnsignedTx::RewardValidator(_) => {
                return Err(ExecutorError::WrongTxType {
                    executor: "mempool",
                    tx: unsigned.name(),
                })
            }
            UnsignedTx::AddValidator(_)
            | UnsignedTx::AddSubnetValidator(_)
            | UnsignedTx::AddDelegator(_)
            | UnsignedTx::AddPermissionlessValidator(_)
            | UnsignedTx::AddPermissionlessDelegator(_)
            | UnsignedTx::RemoveSubnetValidator(_)
            | UnsignedTx::TransformSubnet(_)
            | UnsignedTx::CreateSubnet(_)
            | UnsignedTx::CreateChain(_)
            | UnsignedTx::Import(_)
            | UnsignedTx::Export(_) => {}
        }

        let mut diff = Diff::new(preferred, self.versions.clone())?;
        let parent_time = diff.timestamp();
        if self.backend.config.upgrades.is_banff_active(parent_time) {
            let mut next_time = now.max(parent_time);
            if let Some(change) = next_staker_change_time(&diff)? {
                next_time = next_time.min(change);
            }
            let next_time = next_time.max(parent_time);
            if next_time > parent_time {
                advance_time_to(self.backend, &mut diff, next_time)?;
            }
        }
        StandardTxExecutor::new(self.backend).execute(&mut diff, tx)
    }
}
