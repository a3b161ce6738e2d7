use crate::errors::ExecutorError;
use shared_types::{Tx, UnsignedTx};

/// Signature checks that depend on the consensus height of the platform
/// chain.
///
/// No platform transaction kind carries a cross-chain signed message yet,
/// so every kind passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct WarpVerifier;

impl WarpVerifier {
    pub fn verify(&self, tx: &Tx, _pchain_height: u64) -> Result<(), ExecutorError> {
        match tx.unsigned() {
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
            | UnsignedTx::Export(_)
            | UnsignedTx::AdvanceTime(_)
            | UnsignedTx::RewardValidator(_) => Ok(()),
        }
    }
}
