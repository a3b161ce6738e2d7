//! # Proposal Options
//!
//! A verified proposal block has two children, commit and abort. This node
//! votes for the preferred one first. For reward proposals the preference
//! follows the staker's observed uptime: commit pays the reward, so it is
//! preferred only when the uptime meets the subnet's requirement.

use super::lock::ChainGuard;
use super::manager::BlockManager;
use crate::domain::{Block, OptionKind};
use crate::errors::{BlockError, PreferenceError};
use pc_04_state_diff::Versions;
use pc_05_tx_executor::domain::staking_rules;
use shared_types::{BlockId, TxId, UnsignedTx, PERCENT_DENOMINATOR, PRIMARY_NETWORK_ID};
use tracing::{debug, warn};

impl BlockManager {
    /// The commit and abort children of a verified proposal block, the
    /// preferred one first.
    pub fn options(
        &self,
        guard: &ChainGuard<'_>,
        proposal_id: BlockId,
    ) -> Result<[Block; 2], BlockError> {
        self.check_guard(guard)?;
        let inner = self.inner.lock();
        let state = inner
            .blocks
            .get(&proposal_id)
            .ok_or(BlockError::UnknownBlock(proposal_id))?;
        let proposal = state
            .proposal
            .as_ref()
            .ok_or(BlockError::NotProposalBlock(proposal_id))?;

        let commit = Block::option(&state.block, OptionKind::Commit, &self.backend.codec)?;
        let abort = Block::option(&state.block, OptionKind::Abort, &self.backend.codec)?;

        let prefers_commit = match proposal.tx.unsigned() {
            UnsignedTx::RewardValidator(body) => {
                match self.prefers_reward(proposal_id, body.tx_id) {
                    Ok(prefers) => prefers,
                    Err(e) => {
                        warn!(
                            block_id = %proposal_id,
                            staker_tx_id = %body.tx_id,
                            error = %e,
                            "Could not evaluate uptime, preferring commit"
                        );
                        true
                    }
                }
            }
            _ => proposal.prefers_commit,
        };

        debug!(block_id = %proposal_id, prefers_commit, "Ordered proposal options");
        Ok(if prefers_commit {
            [commit, abort]
        } else {
            [abort, commit]
        })
    }

    /// Whether the staker created by `staker_tx_id` earned its reward.
    ///
    /// Delegators are always rewarded here; their validator's uptime was
    /// judged when the validator itself was rewarded.
    fn prefers_reward(
        &self,
        proposal_id: BlockId,
        staker_tx_id: TxId,
    ) -> Result<bool, PreferenceError> {
        let view = self
            .arena
            .get_state(proposal_id)
            .ok_or(PreferenceError::MissingState(proposal_id))?;

        let (tx, _) = view
            .get_tx(staker_tx_id)
            .map_err(|source| PreferenceError::StakerTx {
                tx_id: staker_tx_id,
                source,
            })?;
        let staker = tx
            .unsigned()
            .staker()
            .ok_or(PreferenceError::NotStaker(staker_tx_id))?;
        if !staker.is_validator() {
            return Ok(true);
        }

        let primary = view
            .get_current_validator(PRIMARY_NETWORK_ID, staker.node_id)
            .map_err(|_| PreferenceError::PrimaryValidator(staker.node_id))?;
        let rules = staking_rules(&self.backend, &*view, staker.subnet_id).map_err(|source| {
            PreferenceError::Rules {
                subnet_id: staker.subnet_id,
                source,
            }
        })?;
        let required = f64::from(rules.uptime_requirement) / f64::from(PERCENT_DENOMINATOR);
        let uptime = self
            .ports
            .uptimes
            .calculate_uptime_percent_from(staker.node_id, staker.subnet_id, primary.start_time)
            .map_err(|source| PreferenceError::Uptime {
                node_id: staker.node_id,
                source,
            })?;

        debug!(
            node_id = %staker.node_id,
            subnet_id = %staker.subnet_id,
            uptime,
            required,
            "Evaluated staker uptime"
        );
        Ok(uptime >= required)
    }
}
