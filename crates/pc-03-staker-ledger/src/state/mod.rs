//! # Committed State
//!
//! The ledger as of the last accepted block. Stakers and supplies are kept
//! in memory and loaded at open; UTXOs, transactions and subnet metadata are
//! read from the store on demand.
//!
//! Mutations through [`Chain`] are staged until [`State::write_batch`] turns
//! them into one [`Batch`], which block acceptance commits together with the
//! block's shared-memory requests.

mod persist;
mod shared;
mod validators;

pub use shared::SharedState;

use crate::domain::{BaseStakers, Staker};
use crate::errors::LedgerError;
use crate::ports::{Chain, ChainReader};
use lru::LruCache;
use parking_lot::Mutex;
use pc_01_keyed_store::KeyedStore;
use serde::{Deserialize, Serialize};
use shared_types::{
    BlockId, Codec, Id, NodeId, OutputOwners, SubnetId, Tx, TxId, TxStatus, UnsignedTx, Utxo,
    PRIMARY_NETWORK_ID,
};
use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Historical validator sets kept in memory.
    pub validator_set_cache_size: usize,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            validator_set_cache_size: 64,
        }
    }
}

/// A staker present at genesis. It starts in the current set.
#[derive(Debug, Clone)]
pub struct GenesisStaker {
    pub tx: Tx,
    pub potential_reward: u64,
}

/// Parsed genesis content.
#[derive(Debug, Clone)]
pub struct Genesis {
    pub genesis_block_id: BlockId,
    pub timestamp: u64,
    pub initial_supply: u64,
    pub utxos: Vec<Utxo>,
    pub validators: Vec<GenesisStaker>,
    pub chains: Vec<Tx>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StakerTable {
    CurrentValidator,
    CurrentDelegator,
    PendingValidator,
    PendingDelegator,
}

#[derive(Debug, Clone)]
struct StakerChange {
    table: StakerTable,
    staker: Staker,
    added: bool,
}

/// Changes since the last write.
#[derive(Default)]
struct Staged {
    stakers: Vec<StakerChange>,
    utxos: HashMap<Id, Option<Utxo>>,
    subnet_owners: HashMap<SubnetId, OutputOwners>,
    transformations: HashMap<SubnetId, Tx>,
    chains: Vec<(SubnetId, Tx)>,
    txs: HashMap<TxId, (Tx, TxStatus)>,
    reward_utxos: Vec<(TxId, Utxo)>,
    blocks: Vec<(BlockId, Vec<u8>)>,
}

pub struct State {
    codec: Arc<Codec>,
    db: Arc<dyn KeyedStore>,
    initialized: bool,
    timestamp: u64,
    last_accepted: BlockId,
    height: u64,
    supplies: HashMap<SubnetId, u64>,
    current: BaseStakers,
    pending: BaseStakers,
    staged: Staged,
    validator_sets: Mutex<LruCache<(SubnetId, u64), BTreeMap<NodeId, u64>>>,
}

impl State {
    /// Opens the state stored in `db`. A fresh store yields an
    /// uninitialized state; see [`State::initialize`].
    pub fn open(
        db: Arc<dyn KeyedStore>,
        codec: Arc<Codec>,
        config: StateConfig,
    ) -> Result<Self, LedgerError> {
        let cache_size =
            NonZeroUsize::new(config.validator_set_cache_size).unwrap_or(NonZeroUsize::MIN);
        let mut state = Self {
            codec,
            db,
            initialized: false,
            timestamp: 0,
            last_accepted: Id::EMPTY,
            height: 0,
            supplies: HashMap::new(),
            current: BaseStakers::new(),
            pending: BaseStakers::new(),
            staged: Staged::default(),
            validator_sets: Mutex::new(LruCache::new(cache_size)),
        };
        if state.load()? {
            info!(
                height = state.height,
                last_accepted = %state.last_accepted,
                current_stakers = state.current.len(),
                pending_stakers = state.pending.len(),
                "loaded platform state"
            );
        }
        Ok(state)
    }

    /// Writes genesis as height 0.
    pub fn initialize(&mut self, genesis: Genesis) -> Result<(), LedgerError> {
        if self.initialized {
            return Err(LedgerError::AlreadyInitialized);
        }
        self.timestamp = genesis.timestamp;
        self.supplies.insert(PRIMARY_NETWORK_ID, genesis.initial_supply);
        for utxo in genesis.utxos {
            self.add_utxo(utxo);
        }
        for g in genesis.validators {
            let Some(info) = g.tx.unsigned().staker() else {
                warn!(tx_id = %g.tx.id(), "genesis validator is not a staking transaction");
                continue;
            };
            let staker =
                Staker::new_current(g.tx.id(), &info, info.start_time, g.potential_reward);
            if info.is_validator() {
                self.put_current_validator(staker);
            } else {
                self.put_current_delegator(staker);
            }
            self.add_tx(g.tx, TxStatus::Committed);
        }
        for tx in genesis.chains {
            if let UnsignedTx::CreateChain(body) = tx.unsigned() {
                let subnet_id = body.subnet_id;
                self.add_chain(subnet_id, tx.clone());
            }
            self.add_tx(tx, TxStatus::Committed);
        }
        self.last_accepted = genesis.genesis_block_id;
        self.initialized = true;
        self.commit(0)?;
        info!(
            genesis = %genesis.genesis_block_id,
            validators = self.current.len(),
            "initialized platform state"
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn codec(&self) -> &Arc<Codec> {
        &self.codec
    }

    pub fn db(&self) -> &Arc<dyn KeyedStore> {
        &self.db
    }

    pub fn last_accepted(&self) -> BlockId {
        self.last_accepted
    }

    pub fn set_last_accepted(&mut self, block_id: BlockId) {
        self.last_accepted = block_id;
    }

    /// Height of the last accepted block.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Stores an accepted block's bytes.
    pub fn add_block(&mut self, block_id: BlockId, bytes: Vec<u8>) {
        self.staged.blocks.push((block_id, bytes));
    }

    pub fn get_block(&self, block_id: BlockId) -> Result<Vec<u8>, LedgerError> {
        if let Some((_, bytes)) = self.staged.blocks.iter().find(|(id, _)| *id == block_id) {
            return Ok(bytes.clone());
        }
        self.read_block(block_id)
    }

    /// Whether there are changes not yet turned into a batch.
    pub fn has_staged_changes(&self) -> bool {
        let s = &self.staged;
        !(s.stakers.is_empty()
            && s.utxos.is_empty()
            && s.subnet_owners.is_empty()
            && s.transformations.is_empty()
            && s.chains.is_empty()
            && s.txs.is_empty()
            && s.reward_utxos.is_empty()
            && s.blocks.is_empty())
    }

    fn record(&mut self, table: StakerTable, staker: Staker, added: bool) {
        self.staged.stakers.push(StakerChange {
            table,
            staker,
            added,
        });
    }
}

impl ChainReader for State {
    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn current_supply(&self, subnet_id: SubnetId) -> Result<u64, LedgerError> {
        self.supplies
            .get(&subnet_id)
            .copied()
            .ok_or(LedgerError::SupplyNotFound(subnet_id))
    }

    fn get_current_validator(
        &self,
        subnet_id: SubnetId,
        node_id: NodeId,
    ) -> Result<Staker, LedgerError> {
        self.current
            .get_validator(subnet_id, node_id)
            .cloned()
            .ok_or(LedgerError::ValidatorNotFound { subnet_id, node_id })
    }

    fn get_current_delegators(
        &self,
        subnet_id: SubnetId,
        node_id: NodeId,
    ) -> Result<Vec<Staker>, LedgerError> {
        Ok(self.current.get_delegators(subnet_id, node_id))
    }

    fn current_stakers(&self) -> Result<Vec<Staker>, LedgerError> {
        Ok(self.current.stakers().cloned().collect())
    }

    fn get_pending_validator(
        &self,
        subnet_id: SubnetId,
        node_id: NodeId,
    ) -> Result<Staker, LedgerError> {
        self.pending
            .get_validator(subnet_id, node_id)
            .cloned()
            .ok_or(LedgerError::ValidatorNotFound { subnet_id, node_id })
    }

    fn get_pending_delegators(
        &self,
        subnet_id: SubnetId,
        node_id: NodeId,
    ) -> Result<Vec<Staker>, LedgerError> {
        Ok(self.pending.get_delegators(subnet_id, node_id))
    }

    fn pending_stakers(&self) -> Result<Vec<Staker>, LedgerError> {
        Ok(self.pending.stakers().cloned().collect())
    }

    fn get_utxo(&self, utxo_id: Id) -> Result<Utxo, LedgerError> {
        match self.staged.utxos.get(&utxo_id) {
            Some(Some(utxo)) => Ok(utxo.clone()),
            Some(None) => Err(LedgerError::UtxoNotFound(utxo_id)),
            None => self.read_utxo(utxo_id),
        }
    }

    fn get_subnet_owner(&self, subnet_id: SubnetId) -> Result<OutputOwners, LedgerError> {
        match self.staged.subnet_owners.get(&subnet_id) {
            Some(owner) => Ok(owner.clone()),
            None => self.read_subnet_owner(subnet_id),
        }
    }

    fn get_subnet_transformation(&self, subnet_id: SubnetId) -> Result<Tx, LedgerError> {
        match self.staged.transformations.get(&subnet_id) {
            Some(tx) => Ok(tx.clone()),
            None => self.read_transformation(subnet_id),
        }
    }

    fn get_chains(&self, subnet_id: SubnetId) -> Result<Vec<Tx>, LedgerError> {
        let mut chains = self.read_chains(subnet_id)?;
        chains.extend(
            self.staged
                .chains
                .iter()
                .filter(|(s, _)| *s == subnet_id)
                .map(|(_, tx)| tx.clone()),
        );
        Ok(chains)
    }

    fn get_tx(&self, tx_id: TxId) -> Result<(Tx, TxStatus), LedgerError> {
        match self.staged.txs.get(&tx_id) {
            Some(entry) => Ok(entry.clone()),
            None => self.read_tx(tx_id),
        }
    }

    fn get_reward_utxos(&self, tx_id: TxId) -> Result<Vec<Utxo>, LedgerError> {
        let mut utxos = self.read_reward_utxos(tx_id)?;
        utxos.extend(
            self.staged
                .reward_utxos
                .iter()
                .filter(|(id, _)| *id == tx_id)
                .map(|(_, u)| u.clone()),
        );
        Ok(utxos)
    }
}

impl Chain for State {
    fn set_timestamp(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
    }

    fn set_current_supply(&mut self, subnet_id: SubnetId, supply: u64) {
        self.supplies.insert(subnet_id, supply);
    }

    fn put_current_validator(&mut self, staker: Staker) {
        self.current.put_validator(staker.clone());
        self.record(StakerTable::CurrentValidator, staker, true);
    }

    fn delete_current_validator(&mut self, staker: &Staker) {
        if self.current.delete_validator(staker) {
            self.record(StakerTable::CurrentValidator, staker.clone(), false);
        } else {
            warn!(tx_id = %staker.tx_id, "deleting unknown current validator");
        }
    }

    fn put_current_delegator(&mut self, staker: Staker) {
        self.current.put_delegator(staker.clone());
        self.record(StakerTable::CurrentDelegator, staker, true);
    }

    fn delete_current_delegator(&mut self, staker: &Staker) {
        if self.current.delete_delegator(staker) {
            self.record(StakerTable::CurrentDelegator, staker.clone(), false);
        } else {
            warn!(tx_id = %staker.tx_id, "deleting unknown current delegator");
        }
    }

    fn put_pending_validator(&mut self, staker: Staker) {
        self.pending.put_validator(staker.clone());
        self.record(StakerTable::PendingValidator, staker, true);
    }

    fn delete_pending_validator(&mut self, staker: &Staker) {
        if self.pending.delete_validator(staker) {
            self.record(StakerTable::PendingValidator, staker.clone(), false);
        } else {
            warn!(tx_id = %staker.tx_id, "deleting unknown pending validator");
        }
    }

    fn put_pending_delegator(&mut self, staker: Staker) {
        self.pending.put_delegator(staker.clone());
        self.record(StakerTable::PendingDelegator, staker, true);
    }

    fn delete_pending_delegator(&mut self, staker: &Staker) {
        if self.pending.delete_delegator(staker) {
            self.record(StakerTable::PendingDelegator, staker.clone(), false);
        } else {
            warn!(tx_id = %staker.tx_id, "deleting unknown pending delegator");
        }
    }

    fn add_utxo(&mut self, utxo: Utxo) {
        self.staged.utxos.insert(utxo.input_id(), Some(utxo));
    }

    fn delete_utxo(&mut self, utxo_id: Id) {
        self.staged.utxos.insert(utxo_id, None);
    }

    fn set_subnet_owner(&mut self, subnet_id: SubnetId, owner: OutputOwners) {
        self.staged.subnet_owners.insert(subnet_id, owner);
    }

    fn add_subnet_transformation(&mut self, subnet_id: SubnetId, tx: Tx) {
        self.staged.transformations.insert(subnet_id, tx);
    }

    fn add_chain(&mut self, subnet_id: SubnetId, tx: Tx) {
        self.staged.chains.push((subnet_id, tx));
    }

    fn add_tx(&mut self, tx: Tx, status: TxStatus) {
        self.staged.txs.insert(tx.id(), (tx, status));
    }

    fn add_reward_utxo(&mut self, tx_id: TxId, utxo: Utxo) {
        self.staged.reward_utxos.push((tx_id, utxo));
    }
}
