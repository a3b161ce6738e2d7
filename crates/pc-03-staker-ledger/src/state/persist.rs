//! On-disk layout of the committed state.
//!
//! Every table is a [`PrefixStore`] view over the one physical store:
//!
//! | Table | Key | Value |
//! |-------|-----|-------|
//! | `current_validators` … `pending_delegators` | tx ID | `Staker` |
//! | `utxos` | input ID | `Utxo` |
//! | `subnet_owners` | subnet ID | `OutputOwners` |
//! | `subnet_transformations` | subnet ID | tx bytes |
//! | `chains` | subnet ID ‖ tx ID | tx bytes |
//! | `txs` | tx ID | `StoredTx` |
//! | `reward_utxos` | tx ID ‖ input ID | `Utxo` |
//! | `weight_diffs` | subnet ‖ height ‖ node | `ValidatorWeightDiff` |
//! | `supplies` | subnet ID | `u64` |
//! | `blocks` | block ID | block bytes |
//! | `singletons` | name | value |

use super::{StakerChange, StakerTable, State};
use crate::domain::{weight_diff_key, Staker, ValidatorWeightDiff};
use crate::errors::LedgerError;
use pc_01_keyed_store::{Batch, DbError, KeyedStore, PrefixStore, VersionStore};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use shared_types::{BlockId, Id, NodeId, OutputOwners, SubnetId, Tx, TxId, TxStatus, Utxo};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub(super) const CURRENT_VALIDATORS: &[u8] = b"current_validators";
pub(super) const CURRENT_DELEGATORS: &[u8] = b"current_delegators";
pub(super) const PENDING_VALIDATORS: &[u8] = b"pending_validators";
pub(super) const PENDING_DELEGATORS: &[u8] = b"pending_delegators";
pub(super) const UTXOS: &[u8] = b"utxos";
pub(super) const SUBNET_OWNERS: &[u8] = b"subnet_owners";
pub(super) const SUBNET_TRANSFORMATIONS: &[u8] = b"subnet_transformations";
pub(super) const CHAINS: &[u8] = b"chains";
pub(super) const TXS: &[u8] = b"txs";
pub(super) const REWARD_UTXOS: &[u8] = b"reward_utxos";
pub(super) const WEIGHT_DIFFS: &[u8] = b"weight_diffs";
pub(super) const SUPPLIES: &[u8] = b"supplies";
pub(super) const BLOCKS: &[u8] = b"blocks";
pub(super) const SINGLETONS: &[u8] = b"singletons";

const TIMESTAMP_KEY: &[u8] = b"timestamp";
const LAST_ACCEPTED_KEY: &[u8] = b"last_accepted";
const HEIGHT_KEY: &[u8] = b"height";
const INITIALIZED_KEY: &[u8] = b"initialized";

#[serde_as]
#[derive(Serialize, Deserialize)]
struct StoredTx {
    #[serde_as(as = "Bytes")]
    bytes: Vec<u8>,
    status: TxStatus,
}

impl StakerTable {
    fn name(self) -> &'static [u8] {
        match self {
            StakerTable::CurrentValidator => CURRENT_VALIDATORS,
            StakerTable::CurrentDelegator => CURRENT_DELEGATORS,
            StakerTable::PendingValidator => PENDING_VALIDATORS,
            StakerTable::PendingDelegator => PENDING_DELEGATORS,
        }
    }

    fn is_current(self) -> bool {
        matches!(
            self,
            StakerTable::CurrentValidator | StakerTable::CurrentDelegator
        )
    }
}

fn concat(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(a.len() + b.len());
    key.extend_from_slice(a);
    key.extend_from_slice(b);
    key
}

impl State {
    pub(super) fn table(&self, name: &[u8]) -> PrefixStore {
        PrefixStore::new(name, self.db.clone())
    }

    /// Loads singletons, supplies and stakers. Returns false on a fresh
    /// store.
    pub(super) fn load(&mut self) -> Result<bool, LedgerError> {
        let singletons = self.table(SINGLETONS);
        let initialized = match singletons.get(INITIALIZED_KEY)? {
            Some(bytes) => self.codec.unmarshal(&bytes)?,
            None => false,
        };
        if !initialized {
            return Ok(false);
        }
        self.timestamp = self.read_singleton(&singletons, TIMESTAMP_KEY)?;
        self.last_accepted = self.read_singleton(&singletons, LAST_ACCEPTED_KEY)?;
        self.height = self.read_singleton(&singletons, HEIGHT_KEY)?;

        for (key, value) in self.table(SUPPLIES).prefix_scan(&[])? {
            let subnet: [u8; 32] = key
                .as_slice()
                .try_into()
                .map_err(|_| DbError::corrupted(&key, "supply key length"))?;
            self.supplies.insert(Id(subnet), self.codec.unmarshal(&value)?);
        }

        for table in [
            StakerTable::CurrentValidator,
            StakerTable::CurrentDelegator,
            StakerTable::PendingValidator,
            StakerTable::PendingDelegator,
        ] {
            for (_, value) in self.table(table.name()).prefix_scan(&[])? {
                let staker: Staker = self.codec.unmarshal(&value)?;
                let set = if table.is_current() {
                    &mut self.current
                } else {
                    &mut self.pending
                };
                if staker.is_validator() {
                    set.put_validator(staker);
                } else {
                    set.put_delegator(staker);
                }
            }
        }
        self.initialized = true;
        Ok(true)
    }

    fn read_singleton<T: serde::de::DeserializeOwned>(
        &self,
        singletons: &PrefixStore,
        key: &[u8],
    ) -> Result<T, LedgerError> {
        let bytes = singletons
            .get(key)?
            .ok_or_else(|| DbError::corrupted(key, "missing singleton"))?;
        Ok(self.codec.unmarshal(&bytes)?)
    }

    /// Turns every staged change into one batch of physical writes without
    /// touching the store, and records `height` as the last accepted height.
    ///
    /// Current-set changes are folded into per-validator weight diffs keyed
    /// at `height`. Staged changes are consumed even if this fails; a failed
    /// write leaves the in-memory state ahead of the store and must be
    /// treated as fatal by the caller.
    pub fn write_batch(&mut self, height: u64) -> Result<Batch, LedgerError> {
        let staged = std::mem::take(&mut self.staged);
        let version = Arc::new(VersionStore::new(self.db.clone()));
        let root: Arc<dyn KeyedStore> = version.clone();
        let table = |name: &[u8]| PrefixStore::new(name, root.clone());

        let mut weight_diffs: BTreeMap<(SubnetId, NodeId), ValidatorWeightDiff> = BTreeMap::new();
        for StakerChange {
            table: kind,
            staker,
            added,
        } in &staged.stakers
        {
            let store = table(kind.name());
            if *added {
                store.put(staker.tx_id.as_bytes(), &self.codec.marshal(staker)?)?;
            } else {
                store.delete(staker.tx_id.as_bytes())?;
            }
            if kind.is_current() {
                weight_diffs
                    .entry((staker.subnet_id, staker.node_id))
                    .or_default()
                    .add(!*added, staker.weight)?;
            }
        }
        let diffs = table(WEIGHT_DIFFS);
        for ((subnet_id, node_id), diff) in &weight_diffs {
            if !diff.is_zero() {
                diffs.put(
                    &weight_diff_key(*subnet_id, height, *node_id),
                    &self.codec.marshal(diff)?,
                )?;
            }
        }

        let utxos = table(UTXOS);
        for (id, utxo) in &staged.utxos {
            match utxo {
                Some(utxo) => utxos.put(id.as_bytes(), &self.codec.marshal(utxo)?)?,
                None => utxos.delete(id.as_bytes())?,
            }
        }

        let owners = table(SUBNET_OWNERS);
        for (subnet_id, owner) in &staged.subnet_owners {
            owners.put(subnet_id.as_bytes(), &self.codec.marshal(owner)?)?;
        }
        let transformations = table(SUBNET_TRANSFORMATIONS);
        for (subnet_id, tx) in &staged.transformations {
            transformations.put(subnet_id.as_bytes(), tx.bytes())?;
        }
        let chains = table(CHAINS);
        for (subnet_id, tx) in &staged.chains {
            chains.put(&concat(subnet_id.as_bytes(), tx.id().as_bytes()), tx.bytes())?;
        }
        let txs = table(TXS);
        for (tx_id, (tx, status)) in &staged.txs {
            let stored = StoredTx {
                bytes: tx.bytes().to_vec(),
                status: *status,
            };
            txs.put(tx_id.as_bytes(), &self.codec.marshal(&stored)?)?;
        }
        let rewards = table(REWARD_UTXOS);
        for (tx_id, utxo) in &staged.reward_utxos {
            rewards.put(
                &concat(tx_id.as_bytes(), utxo.input_id().as_bytes()),
                &self.codec.marshal(utxo)?,
            )?;
        }
        let blocks = table(BLOCKS);
        for (block_id, bytes) in &staged.blocks {
            blocks.put(block_id.as_bytes(), bytes)?;
        }

        let supplies = table(SUPPLIES);
        for (subnet_id, supply) in &self.supplies {
            supplies.put(subnet_id.as_bytes(), &self.codec.marshal(supply)?)?;
        }
        let singletons = table(SINGLETONS);
        singletons.put(TIMESTAMP_KEY, &self.codec.marshal(&self.timestamp)?)?;
        singletons.put(LAST_ACCEPTED_KEY, &self.codec.marshal(&self.last_accepted)?)?;
        singletons.put(HEIGHT_KEY, &self.codec.marshal(&height)?)?;
        singletons.put(INITIALIZED_KEY, &self.codec.marshal(&self.initialized)?)?;

        self.height = height;
        let batch = version.commit_batch();
        debug!(
            height,
            ops = batch.len(),
            staker_changes = staged.stakers.len(),
            weight_diffs = weight_diffs.len(),
            "built state batch"
        );
        Ok(batch)
    }

    /// [`State::write_batch`] followed by a write to the store.
    pub fn commit(&mut self, height: u64) -> Result<(), LedgerError> {
        let batch = self.write_batch(height)?;
        self.db.write_batch(batch)?;
        Ok(())
    }

    pub(super) fn read_utxo(&self, utxo_id: Id) -> Result<Utxo, LedgerError> {
        match self.table(UTXOS).get(utxo_id.as_bytes())? {
            Some(bytes) => Ok(self.codec.unmarshal(&bytes)?),
            None => Err(LedgerError::UtxoNotFound(utxo_id)),
        }
    }

    pub(super) fn read_subnet_owner(&self, subnet_id: SubnetId) -> Result<OutputOwners, LedgerError> {
        match self.table(SUBNET_OWNERS).get(subnet_id.as_bytes())? {
            Some(bytes) => Ok(self.codec.unmarshal(&bytes)?),
            None => Err(LedgerError::SubnetOwnerNotFound(subnet_id)),
        }
    }

    pub(super) fn read_transformation(&self, subnet_id: SubnetId) -> Result<Tx, LedgerError> {
        match self.table(SUBNET_TRANSFORMATIONS).get(subnet_id.as_bytes())? {
            Some(bytes) => Ok(Tx::parse(&bytes, &self.codec)?),
            None => Err(LedgerError::TransformationNotFound(subnet_id)),
        }
    }

    pub(super) fn read_chains(&self, subnet_id: SubnetId) -> Result<Vec<Tx>, LedgerError> {
        self.table(CHAINS)
            .prefix_scan(subnet_id.as_bytes())?
            .into_iter()
            .map(|(_, bytes)| Tx::parse(&bytes, &self.codec).map_err(LedgerError::from))
            .collect()
    }

    pub(super) fn read_tx(&self, tx_id: TxId) -> Result<(Tx, TxStatus), LedgerError> {
        match self.table(TXS).get(tx_id.as_bytes())? {
            Some(bytes) => {
                let stored: StoredTx = self.codec.unmarshal(&bytes)?;
                Ok((Tx::parse(&stored.bytes, &self.codec)?, stored.status))
            }
            None => Err(LedgerError::TxNotFound(tx_id)),
        }
    }

    pub(super) fn read_reward_utxos(&self, tx_id: TxId) -> Result<Vec<Utxo>, LedgerError> {
        self.table(REWARD_UTXOS)
            .prefix_scan(tx_id.as_bytes())?
            .into_iter()
            .map(|(_, bytes)| self.codec.unmarshal(&bytes).map_err(LedgerError::from))
            .collect()
    }

    pub(super) fn read_block(&self, block_id: BlockId) -> Result<Vec<u8>, LedgerError> {
        self.table(BLOCKS)
            .get(block_id.as_bytes())?
            .ok_or(LedgerError::BlockNotFound(block_id))
    }
}
