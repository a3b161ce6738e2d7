use super::State;
use crate::domain::Staker;
use crate::errors::LedgerError;
use crate::ports::ChainReader;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use shared_types::{Id, NodeId, OutputOwners, SubnetId, Tx, TxId, TxStatus, Utxo};
use std::sync::Arc;

/// The committed state behind a lock, shared by the block manager and every
/// diff whose parent is the last accepted block.
///
/// Reads through [`ChainReader`] take the read lock per call. Acceptance
/// takes the write lock for the whole apply-and-commit sequence.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<RwLock<State>>,
}

impl SharedState {
    pub fn new(state: State) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, State> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.inner.write()
    }
}

impl ChainReader for SharedState {
    fn timestamp(&self) -> u64 {
        self.read().timestamp()
    }

    fn current_supply(&self, subnet_id: SubnetId) -> Result<u64, LedgerError> {
        self.read().current_supply(subnet_id)
    }

    fn get_current_validator(
        &self,
        subnet_id: SubnetId,
        node_id: NodeId,
    ) -> Result<Staker, LedgerError> {
        self.read().get_current_validator(subnet_id, node_id)
    }

    fn get_current_delegators(
        &self,
        subnet_id: SubnetId,
        node_id: NodeId,
    ) -> Result<Vec<Staker>, LedgerError> {
        self.read().get_current_delegators(subnet_id, node_id)
    }

    fn current_stakers(&self) -> Result<Vec<Staker>, LedgerError> {
        self.read().current_stakers()
    }

    fn get_pending_validator(
        &self,
        subnet_id: SubnetId,
        node_id: NodeId,
    ) -> Result<Staker, LedgerError> {
        self.read().get_pending_validator(subnet_id, node_id)
    }

    fn get_pending_delegators(
        &self,
        subnet_id: SubnetId,
        node_id: NodeId,
    ) -> Result<Vec<Staker>, LedgerError> {
        self.read().get_pending_delegators(subnet_id, node_id)
    }

    fn pending_stakers(&self) -> Result<Vec<Staker>, LedgerError> {
        self.read().pending_stakers()
    }

    fn get_utxo(&self, utxo_id: Id) -> Result<Utxo, LedgerError> {
        self.read().get_utxo(utxo_id)
    }

    fn get_subnet_owner(&self, subnet_id: SubnetId) -> Result<OutputOwners, LedgerError> {
        self.read().get_subnet_owner(subnet_id)
    }

    fn get_subnet_transformation(&self, subnet_id: SubnetId) -> Result<Tx, LedgerError> {
        self.read().get_subnet_transformation(subnet_id)
    }

    fn get_chains(&self, subnet_id: SubnetId) -> Result<Vec<Tx>, LedgerError> {
        self.read().get_chains(subnet_id)
    }

    fn get_tx(&self, tx_id: TxId) -> Result<(Tx, TxStatus), LedgerError> {
        self.read().get_tx(tx_id)
    }

    fn get_reward_utxos(&self, tx_id: TxId) -> Result<Vec<Utxo>, LedgerError> {
        self.read().get_reward_utxos(tx_id)
    }
}
