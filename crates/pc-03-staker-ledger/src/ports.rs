//! # Ledger Ports
//!
//! [`ChainReader`] is implemented by the committed base ([`crate::State`],
//! [`crate::SharedState`]) and by every candidate-block diff, so a diff can
//! read through to its parent without knowing what the parent is.
//! [`Chain`] adds the mutations a transaction executor performs.

use crate::domain::Staker;
use crate::errors::LedgerError;
use shared_types::{Id, NodeId, OutputOwners, SubnetId, Tx, TxId, TxStatus, Utxo};

pub trait ChainReader: Send + Sync {
    /// Chain time in seconds.
    fn timestamp(&self) -> u64;

    fn current_supply(&self, subnet_id: SubnetId) -> Result<u64, LedgerError>;

    fn get_current_validator(
        &self,
        subnet_id: SubnetId,
        node_id: NodeId,
    ) -> Result<Staker, LedgerError>;

    /// Current delegators of the node, in staker order. Empty if none.
    fn get_current_delegators(
        &self,
        subnet_id: SubnetId,
        node_id: NodeId,
    ) -> Result<Vec<Staker>, LedgerError>;

    /// All current stakers, in staker order.
    fn current_stakers(&self) -> Result<Vec<Staker>, LedgerError>;

    fn get_pending_validator(
        &self,
        subnet_id: SubnetId,
        node_id: NodeId,
    ) -> Result<Staker, LedgerError>;

    fn get_pending_delegators(
        &self,
        subnet_id: SubnetId,
        node_id: NodeId,
    ) -> Result<Vec<Staker>, LedgerError>;

    /// All pending stakers, in staker order.
    fn pending_stakers(&self) -> Result<Vec<Staker>, LedgerError>;

    /// UTXO by input ID.
    fn get_utxo(&self, utxo_id: Id) -> Result<Utxo, LedgerError>;

    fn get_subnet_owner(&self, subnet_id: SubnetId) -> Result<OutputOwners, LedgerError>;

    /// The accepted `TransformSubnet` transaction of a permissionless subnet.
    fn get_subnet_transformation(&self, subnet_id: SubnetId) -> Result<Tx, LedgerError>;

    fn get_chains(&self, subnet_id: SubnetId) -> Result<Vec<Tx>, LedgerError>;

    fn get_tx(&self, tx_id: TxId) -> Result<(Tx, TxStatus), LedgerError>;

    fn get_reward_utxos(&self, tx_id: TxId) -> Result<Vec<Utxo>, LedgerError>;
}

/// Mutable ledger view.
///
/// Mutations never fail: validity is checked by the executor before
/// anything is written, and persistence errors surface when the committed
/// base is written out.
pub trait Chain: ChainReader {
    fn set_timestamp(&mut self, timestamp: u64);

    fn set_current_supply(&mut self, subnet_id: SubnetId, supply: u64);

    fn put_current_validator(&mut self, staker: Staker);
    fn delete_current_validator(&mut self, staker: &Staker);
    fn put_current_delegator(&mut self, staker: Staker);
    fn delete_current_delegator(&mut self, staker: &Staker);

    fn put_pending_validator(&mut self, staker: Staker);
    fn delete_pending_validator(&mut self, staker: &Staker);
    fn put_pending_delegator(&mut self, staker: Staker);
    fn delete_pending_delegator(&mut self, staker: &Staker);

    fn add_utxo(&mut self, utxo: Utxo);
    fn delete_utxo(&mut self, utxo_id: Id);

    fn set_subnet_owner(&mut self, subnet_id: SubnetId, owner: OutputOwners);
    fn add_subnet_transformation(&mut self, subnet_id: SubnetId, tx: Tx);
    fn add_chain(&mut self, subnet_id: SubnetId, tx: Tx);

    fn add_tx(&mut self, tx: Tx, status: TxStatus);
    fn add_reward_utxo(&mut self, tx_id: TxId, utxo: Utxo);
}
