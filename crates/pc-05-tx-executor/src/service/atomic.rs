use super::effects::TxEffects;
use super::standard::StandardTxExecutor;
use crate::backend::Backend;
use crate::errors::ExecutorError;
use pc_04_state_diff::{Diff, Versions};
use shared_types::{BlockId, Tx, UnsignedTx};
use std::sync::Arc;

/// Executes the single import or export carried by an atomic block.
pub struct AtomicTxExecutor<'a> {
    backend: &'a Backend,
    versions: Arc<dyn Versions>,
}

impl<'a> AtomicTxExecutor<'a> {
    pub fn new(backend: &'a Backend, versions: Arc<dyn Versions>) -> Self {
        Self { backend, versions }
    }

    /// Runs `tx` on a fresh diff over `parent_id` and returns the diff with
    /// the transaction's effects.
    pub fn execute(&self, parent_id: BlockId, tx: &Tx) -> Result<(Diff, TxEffects), ExecutorError> {
        let unsigned = tx.unsigned();
        match unsigned {
            UnsignedTx::Import(_) | UnsignedTx::Export(_) => {}
            UnsignedTx::AddValidator(_)
            | UnsignedTx::AddSubnetValidator(_)
            | UnsignedTx::AddDelegator(_)
            | UnsignedTx::AddPermissionlessValidator(_)
            | UnsignedTx::AddPermissionlessDelegator(_)
            | UnsignedTx::RemoveSubnetValidator(_)
            | UnsignedTx::TransformSubnet(_)
            | UnsignedTx::CreateSubnet(_)
            | UnsignedTx::CreateChain(_)
            | UnsignedTx::AdvanceTime(_)
            | UnsignedTx::RewardValidator(_) => {
                return Err(ExecutorError::WrongTxType {
                    executor: "atomic",
                    tx: unsigned.name(),
                })
            }
        }

        let mut diff = Diff::new(parent_id, self.versions.clone())?;
        let effects = StandardTxExecutor::new(self.backend).execute(&mut diff, tx)?;
        Ok((diff, effects))
    }
}
