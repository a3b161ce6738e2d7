//! # Block Manager
//!
//! Tracks processing blocks from verification to a decision.
//!
//! ```text
//! unverified --verify--> verified --accept--> accepted
//!                            \-----reject---> (dropped)
//! ```
//!
//! Verifying executes a block once into a frozen diff registered in the
//! [`DiffArena`] under the block's ID. Proposal blocks additionally carry
//! a commit view and an abort view; their option children adopt one of the
//! two as their own diff. Accepting applies the block's diff to the
//! committed base and writes it together with the block's shared-memory
//! requests in one batch.

use super::lock::{ChainGuard, ChainLock};
use crate::config::ManagerConfig;
use crate::domain::{Block, BlockBody, Mempool, OptionKind};
use crate::errors::BlockError;
use crate::metrics;
use crate::ports::{ChainCreator, Clock, Uptime};
use parking_lot::Mutex;
use pc_02_shared_memory::SharedMemory;
use pc_03_staker_ledger::{ChainReader, LedgerError};
use pc_04_state_diff::{Diff, DiffArena};
use pc_05_tx_executor::{
    advance_time_to, next_staker_change_time, AcceptEffect, AtomicTxExecutor, Backend,
    ErrorKind, MempoolTxVerifier, ProposalTxExecutor, StandardTxExecutor, TxEffects,
    WarpVerifier,
};
use shared_types::{BlockId, Tx, TxId};
use std::collections::{BTreeSet, HashMap};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Collaborators of the manager that live outside the ledger.
#[derive(Clone)]
pub struct ManagerPorts {
    pub chain_creator: Arc<dyn ChainCreator>,
    pub uptimes: Arc<dyn Uptime>,
    pub clock: Arc<dyn Clock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
    Verified,
    /// Only proposal blocks stay tracked once accepted, until one of their
    /// options is accepted.
    Accepted,
}

/// Both outcomes of a verified proposal block.
#[derive(Clone)]
pub(crate) struct ProposalState {
    pub(crate) tx: Tx,
    pub(crate) on_commit: Arc<Diff>,
    pub(crate) on_abort: Arc<Diff>,
    pub(crate) prefers_commit: bool,
}

pub(crate) struct BlockState {
    pub(crate) block: Block,
    pub(crate) status: BlockStatus,
    pub(crate) diff: Arc<Diff>,
    pub(crate) effects: TxEffects,
    pub(crate) proposal: Option<ProposalState>,
    pub(crate) verified_heights: BTreeSet<u64>,
}

/// What a child block needs to know about its parent.
pub(crate) struct ParentInfo {
    pub(crate) height: u64,
    /// Chain time after the parent.
    pub(crate) timestamp: u64,
    pub(crate) block: Option<Block>,
    pub(crate) proposal: Option<ProposalState>,
}

pub(crate) struct Inner {
    pub(crate) blocks: HashMap<BlockId, BlockState>,
    pub(crate) preferred: BlockId,
    pub(crate) mempool: Mempool,
}

pub struct BlockManager {
    pub(crate) lock: ChainLock,
    pub(crate) config: ManagerConfig,
    pub(crate) backend: Backend,
    pub(crate) arena: Arc<DiffArena>,
    pub(crate) shared_memory: Arc<SharedMemory>,
    pub(crate) ports: ManagerPorts,
    pub(crate) inner: Mutex<Inner>,
}

impl BlockManager {
    /// `lock` must be the lock the consensus driver holds while calling
    /// into the manager. The arena's last accepted block becomes the
    /// initial preference.
    pub fn new(
        lock: ChainLock,
        config: ManagerConfig,
        backend: Backend,
        arena: Arc<DiffArena>,
        shared_memory: Arc<SharedMemory>,
        ports: ManagerPorts,
    ) -> Self {
        let dropped_cache_size =
            NonZeroUsize::new(config.dropped_cache_size).unwrap_or(NonZeroUsize::MIN);
        let inner = Inner {
            blocks: HashMap::new(),
            preferred: arena.last_accepted(),
            mempool: Mempool::new(config.mempool_capacity, dropped_cache_size),
        };
        Self {
            lock,
            config,
            backend,
            arena,
            shared_memory,
            ports,
            inner: Mutex::new(inner),
        }
    }

    pub fn chain_lock(&self) -> &ChainLock {
        &self.lock
    }

    pub(crate) fn check_guard(&self, guard: &ChainGuard<'_>) -> Result<(), BlockError> {
        if guard.is_for(&self.lock) {
            Ok(())
        } else {
            Err(BlockError::ForeignLock)
        }
    }

    pub fn verify(&self, guard: &ChainGuard<'_>, block: Block) -> Result<(), BlockError> {
        let height = self.arena.base().read().height();
        self.verify_with_context(guard, block, height)
    }

    /// Verifies `block` for consensus height `pchain_height`.
    ///
    /// A block that is already verified is not executed again; only the
    /// height-dependent checks run and the height is recorded.
    pub fn verify_with_context(
        &self,
        guard: &ChainGuard<'_>,
        block: Block,
        pchain_height: u64,
    ) -> Result<(), BlockError> {
        self.check_guard(guard)?;
        let block_id = block.id();
        let mut inner = self.inner.lock();

        if let Some(state) = inner.blocks.get_mut(&block_id) {
            verify_warp(&state.block, pchain_height)?;
            state.verified_heights.insert(pchain_height);
            debug!(block_id = %block_id, pchain_height, "Block already verified");
            return Ok(());
        }
        if block_id == self.arena.last_accepted() {
            return Ok(());
        }

        verify_warp(&block, pchain_height)?;
        let state = match self.execute(&inner, block, pchain_height) {
            Ok(state) => state,
            Err(e) => {
                metrics::record_verify_failure();
                debug!(block_id = %block_id, error = %e, "Block verification failed");
                return Err(e);
            }
        };

        for tx in state.block.decision_txs() {
            inner.mempool.remove(&tx.id());
        }
        debug!(
            block_id = %block_id,
            height = state.block.height(),
            kind = state.block.kind(),
            txs = state.block.txs().count(),
            "Verified block"
        );
        metrics::record_block_verified(state.block.kind());
        inner.blocks.insert(block_id, state);
        metrics::set_processing_blocks(inner.blocks.len());
        metrics::set_mempool_size(inner.mempool.len());
        Ok(())
    }

    /// `None` when the parent is neither processing nor last accepted.
    pub(crate) fn parent_info(&self, inner: &Inner, parent_id: BlockId) -> Option<ParentInfo> {
        if let Some(parent) = inner.blocks.get(&parent_id) {
            return Some(ParentInfo {
                height: parent.block.height(),
                timestamp: parent.diff.timestamp(),
                block: Some(parent.block.clone()),
                proposal: parent.proposal.clone(),
            });
        }
        if parent_id == self.arena.last_accepted() {
            let base = self.arena.base().read();
            return Some(ParentInfo {
                height: base.height(),
                timestamp: base.timestamp(),
                block: None,
                proposal: None,
            });
        }
        None
    }

    /// A fresh diff over `parent_id` for the child `block_id`.
    pub(crate) fn new_diff(&self, block_id: BlockId, parent_id: BlockId) -> Result<Diff, BlockError> {
        Diff::new(parent_id, self.arena.clone()).map_err(|e| match e {
            LedgerError::MissingParentState { .. } => {
                BlockError::ParentNotFound { block_id, parent_id }
            }
            e => e.into(),
        })
    }

    fn execute(
        &self,
        inner: &Inner,
        block: Block,
        pchain_height: u64,
    ) -> Result<BlockState, BlockError> {
        let block_id = block.id();
        let parent_id = block.parent_id();
        let parent = self
            .parent_info(inner, parent_id)
            .ok_or(BlockError::ParentNotFound { block_id, parent_id })?;
        if block.height() != parent.height + 1 {
            return Err(BlockError::WrongHeight {
                expected: parent.height + 1,
                actual: block.height(),
            });
        }
        if let Some(kind) = block.option_kind() {
            return self.execute_option(block, kind, &parent, pchain_height);
        }
        if parent.proposal.is_some() {
            return Err(BlockError::ExpectedOption(block_id));
        }

        let upgrades = self.backend.config.upgrades;
        let now = self.ports.clock.now();
        let (mut diff, staker_changed) = match block.timestamp() {
            None => {
                if upgrades.is_banff_active(parent.timestamp) {
                    return Err(BlockError::ApricotBlockAfterFork {
                        kind: block.kind(),
                        timestamp: parent.timestamp,
                    });
                }
                (self.new_diff(block_id, parent_id)?, false)
            }
            Some(timestamp) => self.advance_banff_time(&block, &parent, timestamp, now)?,
        };

        let effects = match block.body() {
            BlockBody::ApricotAtomic { tx } => {
                let (atomic, effects) =
                    AtomicTxExecutor::new(&self.backend, self.arena.clone())
                        .execute(parent_id, tx)
                        .map_err(|e| BlockError::tx(tx.id(), e))?;
                diff = atomic;
                effects
            }
            _ => self.execute_decisions(&mut diff, block.decision_txs())?,
        };
        if block.proposal_tx().is_none()
            && block.decision_txs().is_empty()
            && !staker_changed
        {
            return Err(BlockError::EmptyBlock(block_id));
        }
        check_ancestor_conflicts(inner, parent_id, &effects)?;

        let diff = Arc::new(diff);
        let proposal = match block.proposal_tx() {
            Some(tx) => {
                // Both outcome views read through the decision diff by ID.
                self.arena.insert(block_id, diff.clone());
                match self.execute_proposal(block_id, tx, now) {
                    Ok(proposal) => Some(proposal),
                    Err(e) => {
                        self.arena.remove(block_id);
                        return Err(e);
                    }
                }
            }
            None => {
                self.arena.insert(block_id, diff.clone());
                None
            }
        };

        Ok(BlockState {
            block,
            status: BlockStatus::Verified,
            diff,
            effects,
            proposal,
            verified_heights: BTreeSet::from([pchain_height]),
        })
    }

    /// Checks a Banff block's time against its parent, local time and the
    /// next staker change, and returns a diff advanced to it.
    fn advance_banff_time(
        &self,
        block: &Block,
        parent: &ParentInfo,
        timestamp: u64,
        now: u64,
    ) -> Result<(Diff, bool), BlockError> {
        let config = &self.backend.config;
        if !config.upgrades.is_banff_active(timestamp) {
            return Err(BlockError::BanffBlockBeforeFork {
                kind: block.kind(),
                timestamp,
            });
        }
        if timestamp < parent.timestamp {
            return Err(BlockError::TimestampBeforeParent {
                proposed: timestamp,
                parent: parent.timestamp,
            });
        }
        let bound = now.saturating_add(config.sync_bound);
        if timestamp > bound {
            return Err(BlockError::TimestampTooFar {
                proposed: timestamp,
                bound,
            });
        }
        let mut diff = self.new_diff(block.id(), block.parent_id())?;
        if let Some(next_change) = next_staker_change_time(&diff)? {
            if timestamp > next_change {
                return Err(BlockError::TimestampBeyondStakerChange {
                    proposed: timestamp,
                    next_change,
                });
            }
        }
        let changed = advance_time_to(&self.backend, &mut diff, timestamp)?;
        Ok((diff, changed))
    }

    pub(crate) fn execute_decisions(
        &self,
        diff: &mut Diff,
        txs: &[Tx],
    ) -> Result<TxEffects, BlockError> {
        let executor = StandardTxExecutor::new(&self.backend);
        let mut effects = TxEffects::default();
        for tx in txs {
            let tx_effects = executor
                .execute(diff, tx)
                .map_err(|e| BlockError::tx(tx.id(), e))?;
            if let Some(input_id) = tx_effects
                .inputs
                .iter()
                .find(|id| effects.inputs.contains(*id))
            {
                return Err(BlockError::ConflictingBlockTxs(*input_id));
            }
            effects.merge(tx_effects);
        }
        Ok(effects)
    }

    fn execute_proposal(
        &self,
        block_id: BlockId,
        tx: &Tx,
        now: u64,
    ) -> Result<ProposalState, BlockError> {
        let mut on_commit = self.new_diff(block_id, block_id)?;
        let mut on_abort = self.new_diff(block_id, block_id)?;
        let outcome = ProposalTxExecutor::new(&self.backend)
            .execute(&mut on_commit, &mut on_abort, tx, now)
            .map_err(|e| BlockError::tx(tx.id(), e))?;
        Ok(ProposalState {
            tx: tx.clone(),
            on_commit: Arc::new(on_commit),
            on_abort: Arc::new(on_abort),
            prefers_commit: outcome.prefers_commit,
        })
    }

    fn execute_option(
        &self,
        block: Block,
        kind: OptionKind,
        parent: &ParentInfo,
        pchain_height: u64,
    ) -> Result<BlockState, BlockError> {
        let (Some(proposal), Some(parent_block)) = (&parent.proposal, &parent.block) else {
            return Err(BlockError::NotProposalBlock(block.parent_id()));
        };
        match (parent_block.timestamp(), block.timestamp()) {
            (Some(expected), Some(actual)) if expected != actual => {
                return Err(BlockError::OptionTimestampMismatch { expected, actual })
            }
            (Some(timestamp), None) => {
                return Err(BlockError::ApricotBlockAfterFork {
                    kind: block.kind(),
                    timestamp,
                })
            }
            (None, Some(timestamp)) => {
                return Err(BlockError::BanffBlockBeforeFork {
                    kind: block.kind(),
                    timestamp,
                })
            }
            _ => {}
        }

        let diff = match kind {
            OptionKind::Commit => proposal.on_commit.clone(),
            OptionKind::Abort => proposal.on_abort.clone(),
        };
        self.arena.insert(block.id(), diff.clone());
        Ok(BlockState {
            block,
            status: BlockStatus::Verified,
            diff,
            effects: TxEffects::default(),
            proposal: None,
            verified_heights: BTreeSet::from([pchain_height]),
        })
    }

    /// Commits a verified child of the last accepted block.
    ///
    /// An error here means the committed ledger can no longer be trusted to
    /// match the decided chain; callers must stop the node.
    pub fn accept(&self, guard: &ChainGuard<'_>, block_id: BlockId) -> Result<(), BlockError> {
        self.check_guard(guard)?;
        let mut inner = self.inner.lock();

        let parent_id = {
            let state = inner
                .blocks
                .get(&block_id)
                .ok_or(BlockError::UnknownBlock(block_id))?;
            if state.status == BlockStatus::Accepted {
                return Ok(());
            }
            let last_accepted = self.arena.last_accepted();
            if state.block.parent_id() != last_accepted {
                return Err(BlockError::NotChildOfLastAccepted {
                    block_id,
                    last_accepted,
                });
            }
            if let Err(e) = self.commit(state) {
                error!(
                    block_id = %block_id,
                    height = state.block.height(),
                    error = %e,
                    "Failed to commit accepted block"
                );
                metrics::record_accept_failure();
                return Err(e);
            }
            state.block.parent_id()
        };

        self.arena.set_last_accepted(block_id);
        self.arena.remove(block_id);
        if inner
            .blocks
            .get(&parent_id)
            .is_some_and(|parent| parent.status == BlockStatus::Accepted)
        {
            inner.blocks.remove(&parent_id);
        }
        if inner.preferred == parent_id {
            inner.preferred = block_id;
        }

        let keep = inner
            .blocks
            .get(&block_id)
            .is_some_and(|state| state.proposal.is_some());
        let (block, effects) = if keep {
            let state = inner
                .blocks
                .get_mut(&block_id)
                .ok_or(BlockError::UnknownBlock(block_id))?;
            state.status = BlockStatus::Accepted;
            (state.block.clone(), state.effects.clone())
        } else {
            let state = inner
                .blocks
                .remove(&block_id)
                .ok_or(BlockError::UnknownBlock(block_id))?;
            (state.block, state.effects)
        };
        for tx in block.txs() {
            inner.mempool.remove(&tx.id());
        }
        for effect in &effects.on_accept {
            match effect {
                AcceptEffect::CreateChain {
                    chain_id,
                    subnet_id,
                    tx,
                } => self
                    .ports
                    .chain_creator
                    .queue_chain_creation(*chain_id, *subnet_id, tx),
            }
        }

        info!(
            block_id = %block_id,
            height = block.height(),
            kind = block.kind(),
            txs = block.txs().count(),
            atomic_peers = effects.atomic_requests.len(),
            "Accepted block"
        );
        metrics::record_block_accepted();
        metrics::set_processing_blocks(inner.blocks.len());
        metrics::set_mempool_size(inner.mempool.len());
        Ok(())
    }

    fn commit(&self, state: &BlockState) -> Result<(), BlockError> {
        let block_id = state.block.id();
        let mut base = self.arena.base().write();
        state.diff.apply(&mut *base);
        base.add_block(block_id, state.block.bytes().to_vec());
        base.set_last_accepted(block_id);
        let batch = base.write_batch(state.block.height())?;
        self.shared_memory
            .apply(&state.effects.atomic_requests, vec![batch])?;
        Ok(())
    }

    /// Discards a processing block. Its decision transactions go back to
    /// the mempool when configured.
    pub fn reject(&self, guard: &ChainGuard<'_>, block_id: BlockId) -> Result<(), BlockError> {
        self.check_guard(guard)?;
        let mut inner = self.inner.lock();
        let state = inner
            .blocks
            .remove(&block_id)
            .ok_or(BlockError::UnknownBlock(block_id))?;
        self.arena.remove(block_id);

        let requeued = if self.config.requeue_rejected_txs {
            inner
                .mempool
                .requeue(state.block.decision_txs().iter().cloned())
        } else {
            0
        };
        if inner.preferred == block_id {
            inner.preferred = state.block.parent_id();
        }

        info!(
            block_id = %block_id,
            height = state.block.height(),
            kind = state.block.kind(),
            requeued,
            "Rejected block"
        );
        metrics::record_block_rejected();
        metrics::set_processing_blocks(inner.blocks.len());
        metrics::set_mempool_size(inner.mempool.len());
        Ok(())
    }

    pub fn set_preference(
        &self,
        guard: &ChainGuard<'_>,
        block_id: BlockId,
    ) -> Result<(), BlockError> {
        self.check_guard(guard)?;
        let mut inner = self.inner.lock();
        if !inner.blocks.contains_key(&block_id) && block_id != self.arena.last_accepted() {
            return Err(BlockError::UnknownBlock(block_id));
        }
        inner.preferred = block_id;
        Ok(())
    }

    pub fn preferred(&self, guard: &ChainGuard<'_>) -> Result<BlockId, BlockError> {
        self.check_guard(guard)?;
        Ok(self.inner.lock().preferred)
    }

    pub fn last_accepted(&self, guard: &ChainGuard<'_>) -> Result<BlockId, BlockError> {
        self.check_guard(guard)?;
        Ok(self.arena.last_accepted())
    }

    /// A processing block, or an accepted one from storage.
    pub fn get_block(&self, guard: &ChainGuard<'_>, block_id: BlockId) -> Result<Block, BlockError> {
        self.check_guard(guard)?;
        if let Some(state) = self.inner.lock().blocks.get(&block_id) {
            return Ok(state.block.clone());
        }
        let bytes = match self.arena.base().read().get_block(block_id) {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => return Err(BlockError::UnknownBlock(block_id)),
            Err(e) => return Err(e.into()),
        };
        Ok(Block::parse(&bytes, &self.backend.codec)?)
    }

    /// Consensus heights the block has been verified for.
    pub fn verified_heights(
        &self,
        guard: &ChainGuard<'_>,
        block_id: BlockId,
    ) -> Result<Vec<u64>, BlockError> {
        self.check_guard(guard)?;
        let inner = self.inner.lock();
        let state = inner
            .blocks
            .get(&block_id)
            .ok_or(BlockError::UnknownBlock(block_id))?;
        Ok(state.verified_heights.iter().copied().collect())
    }

    pub fn status(
        &self,
        guard: &ChainGuard<'_>,
        block_id: BlockId,
    ) -> Result<Option<BlockStatus>, BlockError> {
        self.check_guard(guard)?;
        Ok(self.inner.lock().blocks.get(&block_id).map(|s| s.status))
    }

    /// Verifies `tx` on top of the preferred block and pools it.
    pub fn add_tx(&self, guard: &ChainGuard<'_>, tx: Tx) -> Result<(), BlockError> {
        self.check_guard(guard)?;
        let tx_id = tx.id();
        let mut inner = self.inner.lock();
        if inner.mempool.contains(&tx_id) {
            return Ok(());
        }
        let preferred = inner.preferred;
        let verifier = MempoolTxVerifier::new(&self.backend, self.arena.clone());
        if let Err(e) = verifier.verify(preferred, &tx, self.ports.clock.now()) {
            if e.kind() != ErrorKind::Storage {
                inner.mempool.mark_dropped(tx_id, e.to_string());
            }
            debug!(tx_id = %tx_id, error = %e, "Rejected transaction");
            return Err(BlockError::tx(tx_id, e));
        }
        inner.mempool.add(tx)?;
        metrics::set_mempool_size(inner.mempool.len());
        debug!(tx_id = %tx_id, pooled = inner.mempool.len(), "Pooled transaction");
        Ok(())
    }

    /// Re-verifies every pooled transaction against the preferred block
    /// and drops the ones that no longer apply. Returns how many were
    /// dropped.
    pub fn prune_mempool(&self, guard: &ChainGuard<'_>) -> Result<usize, BlockError> {
        self.check_guard(guard)?;
        let mut inner = self.inner.lock();
        let preferred = inner.preferred;
        let now = self.ports.clock.now();
        let verifier = MempoolTxVerifier::new(&self.backend, self.arena.clone());

        let mut failed: Vec<(TxId, String)> = Vec::new();
        for tx in inner.mempool.iter() {
            match verifier.verify(preferred, tx, now) {
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::Storage => return Err(e.into()),
                Err(e) => failed.push((tx.id(), e.to_string())),
            }
        }
        for (tx_id, reason) in &failed {
            debug!(tx_id = %tx_id, reason = %reason, "Dropping stale transaction");
            inner.mempool.mark_dropped(*tx_id, reason.clone());
        }
        metrics::set_mempool_size(inner.mempool.len());
        Ok(failed.len())
    }

    pub fn mempool_len(&self, guard: &ChainGuard<'_>) -> Result<usize, BlockError> {
        self.check_guard(guard)?;
        Ok(self.inner.lock().mempool.len())
    }

    pub fn dropped_reason(
        &self,
        guard: &ChainGuard<'_>,
        tx_id: TxId,
    ) -> Result<Option<String>, BlockError> {
        self.check_guard(guard)?;
        Ok(self
            .inner
            .lock()
            .mempool
            .dropped_reason(&tx_id)
            .map(str::to_owned))
    }

    pub fn processing_len(&self, guard: &ChainGuard<'_>) -> Result<usize, BlockError> {
        self.check_guard(guard)?;
        Ok(self
            .inner
            .lock()
            .blocks
            .values()
            .filter(|s| s.status == BlockStatus::Verified)
            .count())
    }
}

fn verify_warp(block: &Block, pchain_height: u64) -> Result<(), BlockError> {
    let verifier = WarpVerifier;
    for tx in block.txs() {
        verifier
            .verify(tx, pchain_height)
            .map_err(|e| BlockError::tx(tx.id(), e))?;
    }
    Ok(())
}

/// Inputs may be consumed only once along a chain of processing blocks.
pub(crate) fn check_ancestor_conflicts(
    inner: &Inner,
    parent_id: BlockId,
    effects: &TxEffects,
) -> Result<(), BlockError> {
    let mut ancestor = parent_id;
    while let Some(state) = inner.blocks.get(&ancestor) {
        if state.status == BlockStatus::Accepted {
            break;
        }
        if let Some(input_id) = effects
            .inputs
            .iter()
            .find(|id| state.effects.inputs.contains(*id))
        {
            return Err(BlockError::ConflictingParentTxs {
                input_id: *input_id,
                ancestor,
            });
        }
        ancestor = state.block.parent_id();
    }
    Ok(())
}
