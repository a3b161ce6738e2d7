use crate::ports::Versions;
use pc_03_staker_ledger::{
    Chain, ChainReader, DiffLookup, DiffStakers, LedgerError, Staker,
};
use shared_types::{BlockId, Id, NodeId, OutputOwners, SubnetId, Tx, TxId, TxStatus, Utxo};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

/// One block's changes over its parent's view.
///
/// Mutations land only in the overlay. Reads check the overlay and fall
/// back to the parent, resolved through [`Versions`] on every call so a
/// diff whose parent gets accepted reads the committed base from then on.
pub struct Diff {
    parent_id: BlockId,
    versions: Arc<dyn Versions>,

    timestamp: u64,
    current_supply: BTreeMap<SubnetId, u64>,

    current: DiffStakers,
    pending: DiffStakers,

    /// `None` marks a consumed UTXO.
    utxos: BTreeMap<Id, Option<Utxo>>,
    subnet_owners: BTreeMap<SubnetId, OutputOwners>,
    transformations: BTreeMap<SubnetId, Tx>,
    added_chains: BTreeMap<SubnetId, Vec<Tx>>,
    added_txs: BTreeMap<TxId, (Tx, TxStatus)>,
    reward_utxos: BTreeMap<TxId, Vec<Utxo>>,
}

impl Diff {
    pub fn new(parent_id: BlockId, versions: Arc<dyn Versions>) -> Result<Self, LedgerError> {
        let parent = versions
            .get_state(parent_id)
            .ok_or(LedgerError::MissingParentState {
                block_id: parent_id,
            })?;
        Ok(Self {
            parent_id,
            timestamp: parent.timestamp(),
            versions,
            current_supply: BTreeMap::new(),
            current: DiffStakers::new(),
            pending: DiffStakers::new(),
            utxos: BTreeMap::new(),
            subnet_owners: BTreeMap::new(),
            transformations: BTreeMap::new(),
            added_chains: BTreeMap::new(),
            added_txs: BTreeMap::new(),
            reward_utxos: BTreeMap::new(),
        })
    }

    pub fn parent_id(&self) -> BlockId {
        self.parent_id
    }

    fn parent(&self) -> Result<Arc<dyn ChainReader>, LedgerError> {
        self.versions
            .get_state(self.parent_id)
            .ok_or(LedgerError::MissingParentState {
                block_id: self.parent_id,
            })
    }

    /// Replays the overlay onto `base`.
    ///
    /// Order: current deletions, current additions, pending deletions,
    /// pending additions, UTXO removals, UTXO additions, subnet metadata,
    /// supplies, timestamp, transactions, reward UTXOs. The base derives weight diffs from the
    /// current-set changes it is given.
    pub fn apply<C: Chain + ?Sized>(&self, base: &mut C) {
        for (_, _, diff) in self.current.validator_diffs() {
            if let Some(validator) = &diff.deleted {
                base.delete_current_validator(validator);
            }
            for delegator in diff.deleted_delegators.values() {
                base.delete_current_delegator(delegator);
            }
        }
        for (_, _, diff) in self.current.validator_diffs() {
            if let Some(validator) = &diff.added {
                base.put_current_validator(validator.clone());
            }
            for delegator in &diff.added_delegators {
                base.put_current_delegator(delegator.clone());
            }
        }
        for (_, _, diff) in self.pending.validator_diffs() {
            if let Some(validator) = &diff.deleted {
                base.delete_pending_validator(validator);
            }
            for delegator in diff.deleted_delegators.values() {
                base.delete_pending_delegator(delegator);
            }
        }
        for (_, _, diff) in self.pending.validator_diffs() {
            if let Some(validator) = &diff.added {
                base.put_pending_validator(validator.clone());
            }
            for delegator in &diff.added_delegators {
                base.put_pending_delegator(delegator.clone());
            }
        }

        for (utxo_id, utxo) in &self.utxos {
            if utxo.is_none() {
                base.delete_utxo(*utxo_id);
            }
        }
        for utxo in self.utxos.values().flatten() {
            base.add_utxo(utxo.clone());
        }

        for (subnet_id, owner) in &self.subnet_owners {
            base.set_subnet_owner(*subnet_id, owner.clone());
        }
        for (subnet_id, tx) in &self.transformations {
            base.add_subnet_transformation(*subnet_id, tx.clone());
        }
        for (subnet_id, chains) in &self.added_chains {
            for tx in chains {
                base.add_chain(*subnet_id, tx.clone());
            }
        }

        for (subnet_id, supply) in &self.current_supply {
            base.set_current_supply(*subnet_id, *supply);
        }
        base.set_timestamp(self.timestamp);

        for (tx, status) in self.added_txs.values() {
            base.add_tx(tx.clone(), *status);
        }
        for (tx_id, utxos) in &self.reward_utxos {
            for utxo in utxos {
                base.add_reward_utxo(*tx_id, utxo.clone());
            }
        }
        trace!(
            parent = %self.parent_id,
            utxos = self.utxos.len(),
            txs = self.added_txs.len(),
            "applied diff"
        );
    }
}

impl ChainReader for Diff {
    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn current_supply(&self, subnet_id: SubnetId) -> Result<u64, LedgerError> {
        match self.current_supply.get(&subnet_id) {
            Some(supply) => Ok(*supply),
            None => self.parent()?.current_supply(subnet_id),
        }
    }

    fn get_current_validator(
        &self,
        subnet_id: SubnetId,
        node_id: NodeId,
    ) -> Result<Staker, LedgerError> {
        match self.current.get_validator(subnet_id, node_id) {
            DiffLookup::Added(staker) => Ok(staker),
            DiffLookup::Deleted => Err(LedgerError::ValidatorNotFound { subnet_id, node_id }),
            DiffLookup::Unmodified => self.parent()?.get_current_validator(subnet_id, node_id),
        }
    }

    fn get_current_delegators(
        &self,
        subnet_id: SubnetId,
        node_id: NodeId,
    ) -> Result<Vec<Staker>, LedgerError> {
        let parent = self.parent()?.get_current_delegators(subnet_id, node_id)?;
        Ok(self.current.get_delegators(subnet_id, node_id, parent))
    }

    fn current_stakers(&self) -> Result<Vec<Staker>, LedgerError> {
        Ok(self.current.stakers(self.parent()?.current_stakers()?))
    }

    fn get_pending_validator(
        &self,
        subnet_id: SubnetId,
        node_id: NodeId,
    ) -> Result<Staker, LedgerError> {
        match self.pending.get_validator(subnet_id, node_id) {
            DiffLookup::Added(staker) => Ok(staker),
            DiffLookup::Deleted => Err(LedgerError::ValidatorNotFound { subnet_id, node_id }),
            DiffLookup::Unmodified => self.parent()?.get_pending_validator(subnet_id, node_id),
        }
    }

    fn get_pending_delegators(
        &self,
        subnet_id: SubnetId,
        node_id: NodeId,
    ) -> Result<Vec<Staker>, LedgerError> {
        let parent = self.parent()?.get_pending_delegators(subnet_id, node_id)?;
        Ok(self.pending.get_delegators(subnet_id, node_id, parent))
    }

    fn pending_stakers(&self) -> Result<Vec<Staker>, LedgerError> {
        Ok(self.pending.stakers(self.parent()?.pending_stakers()?))
    }

    fn get_utxo(&self, utxo_id: Id) -> Result<Utxo, LedgerError> {
        match self.utxos.get(&utxo_id) {
            Some(Some(utxo)) => Ok(utxo.clone()),
            Some(None) => Err(LedgerError::UtxoNotFound(utxo_id)),
            None => self.parent()?.get_utxo(utxo_id),
        }
    }

    fn get_subnet_owner(&self, subnet_id: SubnetId) -> Result<OutputOwners, LedgerError> {
        match self.subnet_owners.get(&subnet_id) {
            Some(owner) => Ok(owner.clone()),
            None => self.parent()?.get_subnet_owner(subnet_id),
        }
    }

    fn get_subnet_transformation(&self, subnet_id: SubnetId) -> Result<Tx, LedgerError> {
        match self.transformations.get(&subnet_id) {
            Some(tx) => Ok(tx.clone()),
            None => self.parent()?.get_subnet_transformation(subnet_id),
        }
    }

    fn get_chains(&self, subnet_id: SubnetId) -> Result<Vec<Tx>, LedgerError> {
        let mut chains = self.parent()?.get_chains(subnet_id)?;
        if let Some(added) = self.added_chains.get(&subnet_id) {
            chains.extend(added.iter().cloned());
        }
        Ok(chains)
    }

    fn get_tx(&self, tx_id: TxId) -> Result<(Tx, TxStatus), LedgerError> {
        match self.added_txs.get(&tx_id) {
            Some(entry) => Ok(entry.clone()),
            None => self.parent()?.get_tx(tx_id),
        }
    }

    fn get_reward_utxos(&self, tx_id: TxId) -> Result<Vec<Utxo>, LedgerError> {
        if let Some(utxos) = self.reward_utxos.get(&tx_id) {
            return Ok(utxos.clone());
        }
        self.parent()?.get_reward_utxos(tx_id)
    }
}

impl Chain for Diff {
    fn set_timestamp(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
    }

    fn set_current_supply(&mut self, subnet_id: SubnetId, supply: u64) {
        self.current_supply.insert(subnet_id, supply);
    }

    fn put_current_validator(&mut self, staker: Staker) {
        self.current.put_validator(staker);
    }

    fn delete_current_validator(&mut self, staker: &Staker) {
        self.current.delete_validator(staker);
    }

    fn put_current_delegator(&mut self, staker: Staker) {
        self.current.put_delegator(staker);
    }

    fn delete_current_delegator(&mut self, staker: &Staker) {
        self.current.delete_delegator(staker);
    }

    fn put_pending_validator(&mut self, staker: Staker) {
        self.pending.put_validator(staker);
    }

    fn delete_pending_validator(&mut self, staker: &Staker) {
        self.pending.delete_validator(staker);
    }

    fn put_pending_delegator(&mut self, staker: Staker) {
        self.pending.put_delegator(staker);
    }

    fn delete_pending_delegator(&mut self, staker: &Staker) {
        self.pending.delete_delegator(staker);
    }

    fn add_utxo(&mut self, utxo: Utxo) {
        self.utxos.insert(utxo.input_id(), Some(utxo));
    }

    fn delete_utxo(&mut self, utxo_id: Id) {
        self.utxos.insert(utxo_id, None);
    }

    fn set_subnet_owner(&mut self, subnet_id: SubnetId, owner: OutputOwners) {
        self.subnet_owners.insert(subnet_id, owner);
    }

    fn add_subnet_transformation(&mut self, subnet_id: SubnetId, tx: Tx) {
        self.transformations.insert(subnet_id, tx);
    }

    fn add_chain(&mut self, subnet_id: SubnetId, tx: Tx) {
        self.added_chains.entry(subnet_id).or_default().push(tx);
    }

    fn add_tx(&mut self, tx: Tx, status: TxStatus) {
        self.added_txs.insert(tx.id(), (tx, status));
    }

    fn add_reward_utxo(&mut self, tx_id: TxId, utxo: Utxo) {
        self.reward_utxos.entry(tx_id).or_default().push(utxo);
    }
}
