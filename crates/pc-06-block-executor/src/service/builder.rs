//! # Block Builder
//!
//! Builds the next block on top of the preferred block.
//!
//! Priority, Banff:
//! 1. a reward proposal when a staker's end is due at the new block time;
//! 2. a standard block with mempool transactions, or with none when time
//!    advancement alone changes stakers.
//!
//! Priority, Apricot:
//! 1. a reward proposal when a staker's end equals chain time;
//! 2. an `AdvanceTime` proposal when the next staker change is due;
//! 3. a standard block of non-atomic transactions;
//! 4. an atomic block with the first valid import or export.
//!
//! The built block is not verified; callers hand it to
//! [`BlockManager::verify`] like any other block.

use super::lock::ChainGuard;
use super::manager::{check_ancestor_conflicts, BlockManager, Inner};
use crate::domain::{Block, BlockBody};
use crate::errors::BlockError;
use pc_03_staker_ledger::{ChainReader, Staker};
use pc_04_state_diff::Diff;
use pc_05_tx_executor::{
    advance_time_to, next_staker_change_time, AtomicTxExecutor, ErrorKind, ExecutorError,
    StandardTxExecutor, TxEffects,
};
use shared_types::{AdvanceTimeTx, BlockId, RewardValidatorTx, Tx, UnsignedTx};
use tracing::debug;

impl BlockManager {
    pub fn build_block(&self, guard: &ChainGuard<'_>) -> Result<Block, BlockError> {
        self.check_guard(guard)?;
        let mut inner = self.inner.lock();
        let preferred = inner.preferred;
        let parent = self
            .parent_info(&inner, preferred)
            .ok_or(BlockError::NoBlockToBuild(preferred))?;
        if parent.proposal.is_some() {
            // Children of a proposal block are its options.
            return Err(BlockError::NoBlockToBuild(preferred));
        }

        let mut scratch = self.new_diff(preferred, preferred)?;
        let now = self.ports.clock.now();
        let next_change = next_staker_change_time(&scratch)?;
        let timestamp = parent
            .timestamp
            .max(now.min(next_change.unwrap_or(u64::MAX)));

        let body = if self.backend.config.upgrades.is_banff_active(timestamp) {
            self.build_banff(&mut inner, &mut scratch, preferred, timestamp)?
        } else {
            self.build_apricot(&mut inner, &mut scratch, preferred, next_change, now)?
        };
        let block = Block::new(preferred, parent.height + 1, body, &self.backend.codec)?;
        debug!(
            block_id = %block.id(),
            parent_id = %preferred,
            kind = block.kind(),
            txs = block.txs().count(),
            "Built block"
        );
        Ok(block)
    }

    fn build_banff(
        &self,
        inner: &mut Inner,
        scratch: &mut Diff,
        preferred: BlockId,
        timestamp: u64,
    ) -> Result<BlockBody, BlockError> {
        let changed = advance_time_to(&self.backend, &mut *scratch, timestamp)?;
        if let Some(staker) = staker_to_reward(&*scratch, timestamp)? {
            return Ok(BlockBody::BanffProposal {
                timestamp,
                decision_txs: vec![],
                tx: self.reward_tx(&staker)?,
            });
        }

        let txs = self.pack_txs(inner, scratch, preferred, |_| true);
        if txs.is_empty() && !changed {
            return Err(BlockError::NoBlockToBuild(preferred));
        }
        Ok(BlockBody::BanffStandard { timestamp, txs })
    }

    fn build_apricot(
        &self,
        inner: &mut Inner,
        scratch: &mut Diff,
        preferred: BlockId,
        next_change: Option<u64>,
        now: u64,
    ) -> Result<BlockBody, BlockError> {
        let chain_time = scratch.timestamp();
        if let Some(staker) = staker_to_reward(&*scratch, chain_time)? {
            return Ok(BlockBody::ApricotProposal {
                tx: self.reward_tx(&staker)?,
            });
        }
        if let Some(time) = next_change.filter(|change| *change <= now) {
            let tx = Tx::new(
                UnsignedTx::AdvanceTime(AdvanceTimeTx { time }),
                vec![],
                &self.backend.codec,
            )?;
            return Ok(BlockBody::ApricotProposal { tx });
        }

        let txs = self.pack_txs(inner, scratch, preferred, |tx| !is_atomic(tx));
        if !txs.is_empty() {
            return Ok(BlockBody::ApricotStandard { txs });
        }

        let executor = AtomicTxExecutor::new(&self.backend, self.arena.clone());
        let candidates: Vec<Tx> = inner
            .mempool
            .iter()
            .filter(|tx| is_atomic(tx))
            .cloned()
            .collect();
        for tx in candidates {
            match executor.execute(preferred, &tx) {
                Ok((_, effects)) => {
                    if check_ancestor_conflicts(inner, preferred, &effects).is_ok() {
                        return Ok(BlockBody::ApricotAtomic { tx });
                    }
                }
                Err(e) => drop_failed(inner, &tx, &e),
            }
        }
        Err(BlockError::NoBlockToBuild(preferred))
    }

    /// Runs pooled transactions on `scratch` in arrival order and keeps the
    /// ones that apply, up to the block limit. Failing transactions are
    /// dropped from the pool; conflicting ones stay for a later block.
    fn pack_txs(
        &self,
        inner: &mut Inner,
        scratch: &mut Diff,
        preferred: BlockId,
        eligible: impl Fn(&Tx) -> bool,
    ) -> Vec<Tx> {
        let executor = StandardTxExecutor::new(&self.backend);
        let candidates: Vec<Tx> = inner
            .mempool
            .iter()
            .filter(|tx| eligible(*tx))
            .cloned()
            .collect();
        let mut packed = Vec::new();
        let mut effects = TxEffects::default();
        for tx in candidates {
            if packed.len() >= self.config.max_block_txs {
                break;
            }
            let inputs = tx.unsigned().input_ids();
            if inputs.iter().any(|id| effects.inputs.contains(id)) {
                continue;
            }
            let probe = TxEffects {
                inputs: inputs.into_iter().collect(),
                ..Default::default()
            };
            if check_ancestor_conflicts(inner, preferred, &probe).is_err() {
                continue;
            }
            match executor.execute(&mut *scratch, &tx) {
                Ok(tx_effects) => {
                    effects.merge(tx_effects);
                    packed.push(tx);
                }
                Err(e) => drop_failed(inner, &tx, &e),
            }
        }
        packed
    }

    fn reward_tx(&self, staker: &Staker) -> Result<Tx, BlockError> {
        Ok(Tx::new(
            UnsignedTx::RewardValidator(RewardValidatorTx {
                tx_id: staker.tx_id,
            }),
            vec![],
            &self.backend.codec,
        )?)
    }
}

/// The first current staker if its staking period ends at `timestamp`.
/// Permissioned subnet validators leave through time advancement instead.
fn staker_to_reward<R: ChainReader + ?Sized>(
    chain: &R,
    timestamp: u64,
) -> Result<Option<Staker>, BlockError> {
    Ok(chain
        .current_stakers()?
        .into_iter()
        .find(|s| !s.priority.is_permissioned_validator())
        .filter(|s| s.end_time <= timestamp))
}

fn is_atomic(tx: &Tx) -> bool {
    matches!(tx.unsigned(), UnsignedTx::Import(_) | UnsignedTx::Export(_))
}

fn drop_failed(inner: &mut Inner, tx: &Tx, error: &ExecutorError) {
    if error.kind() == ErrorKind::Storage {
        return;
    }
    debug!(tx_id = %tx.id(), error = %error, "Dropping transaction that no longer applies");
    inner.mempool.mark_dropped(tx.id(), error.to_string());
}
