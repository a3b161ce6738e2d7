//! # Proposal Executor
//!
//! Proposal transactions carry two outcomes. The executor writes the commit
//! outcome into one view and the abort outcome into another; consensus
//! picks one of them later.

use crate::backend::Backend;
use crate::domain::{advance_time_to, next_staker_change_time, staking_rules};
use crate::errors::ExecutorError;
use pc_03_staker_ledger::{Chain, ChainReader, Staker};
use shared_types::{
    AdvanceTimeTx, Output, OutputOwners, RewardValidatorTx, TransferOutput, Tx, TxId, TxStatus,
    UnsignedTx, Utxo, UtxoId, PERCENT_DENOMINATOR,
};
use tracing::debug;

/// What this node would vote for, absent other information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProposalOutcome {
    pub prefers_commit: bool,
}

pub struct ProposalTxExecutor<'a> {
    backend: &'a Backend,
}

/// A reward payment: who receives it, under which transaction.
struct Payout {
    staker_tx_id: TxId,
    utxo: Utxo,
}

impl<'a> ProposalTxExecutor<'a> {
    pub fn new(backend: &'a Backend) -> Self {
        Self { backend }
    }

    /// Executes `tx` into both outcome views.
    ///
    /// `on_commit` and `on_abort` must both start from the proposal block's
    /// parent state. `local_now` is this node's wall-clock time.
    pub fn execute(
        &self,
        on_commit: &mut dyn Chain,
        on_abort: &mut dyn Chain,
        tx: &Tx,
        local_now: u64,
    ) -> Result<ProposalOutcome, ExecutorError> {
        let unsigned = tx.unsigned();
        let outcome = match unsigned {
            UnsignedTx::AdvanceTime(body) => {
                self.advance_time(on_commit, on_abort, tx, body, local_now)
            }
            UnsignedTx::RewardValidator(body) => {
                self.reward_validator(on_commit, on_abort, tx, body)
            }
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
            | UnsignedTx::Export(_) => Err(ExecutorError::WrongTxType {
                executor: "proposal",
                tx: unsigned.name(),
            }),
        }?;

        debug!(
            tx_id = %tx.id(),
            kind = unsigned.name(),
            prefers_commit = outcome.prefers_commit,
            "Executed proposal"
        );
        Ok(outcome)
    }

    fn advance_time(
        &self,
        on_commit: &mut dyn Chain,
        on_abort: &mut dyn Chain,
        tx: &Tx,
        body: &AdvanceTimeTx,
        local_now: u64,
    ) -> Result<ProposalOutcome, ExecutorError> {
        let proposed = body.time;
        if self.backend.config.upgrades.is_banff_active(proposed) {
            return Err(ExecutorError::DisabledAfterBanff {
                tx: tx.unsigned().name(),
            });
        }
        let current = on_commit.timestamp();
        if proposed <= current {
            return Err(ExecutorError::TimestampNotIncreasing { proposed, current });
        }
        let bound = local_now.saturating_add(self.backend.config.sync_bound);
        if proposed > bound {
            return Err(ExecutorError::TimestampTooFar { proposed, bound });
        }
        if let Some(next_change) = next_staker_change_time(&*on_commit)? {
            if proposed > next_change {
                return Err(ExecutorError::TimestampBeyondStakerChange {
                    proposed,
                    next_change,
                });
            }
        }

        advance_time_to(self.backend, on_commit, proposed)?;
        on_commit.add_tx(tx.clone(), TxStatus::Committed);
        on_abort.add_tx(tx.clone(), TxStatus::Aborted);

        // A time this node has not reached yet is voted down.
        Ok(ProposalOutcome {
            prefers_commit: proposed <= local_now,
        })
    }

    fn reward_validator(
        &self,
        on_commit: &mut dyn Chain,
        on_abort: &mut dyn Chain,
        tx: &Tx,
        body: &RewardValidatorTx,
    ) -> Result<ProposalOutcome, ExecutorError> {
        let staker = on_commit
            .current_stakers()?
            .into_iter()
            .next()
            .ok_or(ExecutorError::NoStakerToRemove)?;
        if staker.tx_id != body.tx_id {
            return Err(ExecutorError::UnexpectedStaker {
                expected: staker.tx_id,
                actual: body.tx_id,
            });
        }
        let now = on_commit.timestamp();
        if staker.end_time != now {
            return Err(ExecutorError::RemoveStakerTooEarly {
                tx_id: staker.tx_id,
                end_time: staker.end_time,
                now,
            });
        }

        let (staker_tx, _) = on_commit.get_tx(staker.tx_id)?;
        let stake = returned_stake(&staker_tx);
        let payouts = if staker.potential_reward == 0 {
            vec![]
        } else {
            self.reward_payouts(&*on_commit, &staker, &staker_tx)?
        };
        let supply = on_abort.current_supply(staker.subnet_id)?;

        for view in [&mut *on_commit as &mut dyn Chain, &mut *on_abort as &mut dyn Chain] {
            remove_staker(view, &staker);
            for utxo in &stake {
                view.add_utxo(utxo.clone());
            }
        }
        for payout in payouts {
            on_commit.add_utxo(payout.utxo.clone());
            on_commit.add_reward_utxo(payout.staker_tx_id, payout.utxo);
        }
        // The reward was added to the supply when it was promised.
        on_abort.set_current_supply(
            staker.subnet_id,
            supply.saturating_sub(staker.potential_reward),
        );
        on_commit.add_tx(tx.clone(), TxStatus::Committed);
        on_abort.add_tx(tx.clone(), TxStatus::Aborted);

        Ok(ProposalOutcome {
            prefers_commit: true,
        })
    }

    /// Reward UTXOs for a departing staker. A delegator's reward is split
    /// with its validator according to the validator's delegation fee.
    fn reward_payouts<R: ChainReader + ?Sized>(
        &self,
        chain: &R,
        staker: &Staker,
        staker_tx: &Tx,
    ) -> Result<Vec<Payout>, ExecutorError> {
        let asset_id = staking_rules(self.backend, chain, staker.subnet_id)?.asset_id;
        let first_index = output_count(staker_tx);
        let reward_utxo = |index: u32, amount: u64, owner: OutputOwners| Utxo {
            utxo_id: UtxoId::new(staker.tx_id, index),
            asset_id,
            output: Output::Transfer(TransferOutput::new(amount, owner)),
        };
        let owner = rewards_owner(staker_tx).ok_or(ExecutorError::NotStakerTx(staker.tx_id))?;

        if staker.is_validator() {
            return Ok(vec![Payout {
                staker_tx_id: staker.tx_id,
                utxo: reward_utxo(first_index, staker.potential_reward, owner),
            }]);
        }

        let validator = match chain.get_current_validator(staker.subnet_id, staker.node_id) {
            Ok(validator) => Some(validator),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e.into()),
        };
        let fee = match validator {
            Some(validator) => {
                let (validator_tx, _) = chain.get_tx(validator.tx_id)?;
                delegation_terms(&validator_tx).map(|(shares, owner)| {
                    let cut = (u128::from(staker.potential_reward) * u128::from(shares)
                        / u128::from(PERCENT_DENOMINATOR)) as u64;
                    (cut, owner)
                })
            }
            None => None,
        };

        let mut payouts = Vec::with_capacity(2);
        let (cut, validator_owner) = fee.unwrap_or((0, owner.clone()));
        let delegator_amount = staker.potential_reward - cut;
        if delegator_amount > 0 {
            payouts.push(Payout {
                staker_tx_id: staker.tx_id,
                utxo: reward_utxo(first_index, delegator_amount, owner),
            });
        }
        if cut > 0 {
            payouts.push(Payout {
                staker_tx_id: staker.tx_id,
                utxo: reward_utxo(first_index + payouts.len() as u32, cut, validator_owner),
            });
        }
        Ok(payouts)
    }
}

fn remove_staker(chain: &mut dyn Chain, staker: &Staker) {
    if staker.is_validator() {
        chain.delete_current_validator(staker);
    } else {
        chain.delete_current_delegator(staker);
    }
}

/// Outputs the staking transaction already occupies: its change outputs
/// then its stake.
fn output_count(tx: &Tx) -> u32 {
    let unsigned = tx.unsigned();
    let change = unsigned.base().map_or(0, |base| base.outs.len());
    (change + unsigned.stake_outs().len()) as u32
}

/// The locked stake, released at the indices after the change outputs.
fn returned_stake(tx: &Tx) -> Vec<Utxo> {
    let unsigned = tx.unsigned();
    let offset = unsigned.base().map_or(0, |base| base.outs.len());
    unsigned
        .stake_outs()
        .iter()
        .enumerate()
        .map(|(i, out)| Utxo {
            utxo_id: UtxoId::new(tx.id(), (offset + i) as u32),
            asset_id: out.asset_id,
            output: out.output.clone(),
        })
        .collect()
}

fn rewards_owner(tx: &Tx) -> Option<OutputOwners> {
    match tx.unsigned() {
        UnsignedTx::AddValidator(body) => Some(body.rewards_owner.clone()),
        UnsignedTx::AddDelegator(body) => Some(body.rewards_owner.clone()),
        UnsignedTx::AddPermissionlessValidator(body) => Some(body.validator_rewards_owner.clone()),
        UnsignedTx::AddPermissionlessDelegator(body) => Some(body.rewards_owner.clone()),
        _ => None,
    }
}

/// Delegation fee and the owner it is paid to.
fn delegation_terms(tx: &Tx) -> Option<(u32, OutputOwners)> {
    match tx.unsigned() {
        UnsignedTx::AddValidator(body) => {
            Some((body.delegation_shares, body.rewards_owner.clone()))
        }
        UnsignedTx::AddPermissionlessValidator(body) => {
            Some((body.delegation_shares, body.delegator_rewards_owner.clone()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpgradeConfig;
    use crate::service::fixtures::{self, Harness};
    use crate::service::StandardTxExecutor;
    use pc_04_state_diff::Diff;
    use shared_types::{
        AddPermissionlessDelegatorTx, AddPermissionlessValidatorTx, Id, NodeId,
        ProofOfPossession, ShortId, Signer, Validator, PRIMARY_NETWORK_ID,
    };

    const END: u64 = fixtures::GENESIS_TIME + 1_000;

    fn validator_tx(h: &Harness) -> Tx {
        let utxo = fixtures::genesis_utxo(1, 1_000_000);
        h.sign(
            UnsignedTx::AddPermissionlessValidator(AddPermissionlessValidatorTx {
                base: fixtures::base(vec![fixtures::spend(&utxo)], vec![fixtures::transfer(995_000)]),
                validator: Validator {
                    node_id: NodeId::from_byte(9),
                    start: fixtures::GENESIS_TIME,
                    end: END,
                    weight: 5_000,
                },
                subnet_id: PRIMARY_NETWORK_ID,
                signer: Signer::ProofOfPossession(ProofOfPossession {
                    public_key: [1; 48],
                    signature: [1; 96],
                }),
                stake_outs: vec![fixtures::transfer(5_000)],
                validator_rewards_owner: fixtures::owners(),
                delegator_rewards_owner: OutputOwners::single(ShortId::from_byte(5)),
                delegation_shares: 100_000,
            }),
            vec![fixtures::cred()],
        )
    }

    fn delegator_tx(h: &Harness) -> Tx {
        let utxo = fixtures::genesis_utxo(2, 500_000);
        h.sign(
            UnsignedTx::AddPermissionlessDelegator(AddPermissionlessDelegatorTx {
                base: fixtures::base(vec![fixtures::spend(&utxo)], vec![fixtures::transfer(490_000)]),
                validator: Validator {
                    node_id: NodeId::from_byte(9),
                    start: fixtures::GENESIS_TIME,
                    end: END,
                    weight: 10_000,
                },
                subnet_id: PRIMARY_NETWORK_ID,
                stake_outs: vec![fixtures::transfer(10_000)],
                rewards_owner: OutputOwners::single(ShortId::from_byte(6)),
            }),
            vec![fixtures::cred()],
        )
    }

    /// Both outcome views with the given staking transactions applied and
    /// chain time at their end.
    fn staked(h: &Harness, txs: &[Tx]) -> (Diff, Diff) {
        let mut views = (h.diff(), h.diff());
        for view in [&mut views.0, &mut views.1] {
            for tx in txs {
                StandardTxExecutor::new(&h.backend).execute(view, tx).unwrap();
            }
            view.set_timestamp(END);
        }
        views
    }

    fn reward_tx(h: &Harness, staker: TxId) -> Tx {
        h.sign(
            UnsignedTx::RewardValidator(RewardValidatorTx { tx_id: staker }),
            vec![],
        )
    }

    #[test]
    fn test_reward_validator_pays_on_commit_only() {
        let h = Harness::new();
        let add = validator_tx(&h);
        let (mut commit, mut abort) = staked(&h, &[add.clone()]);
        let staker = commit
            .get_current_validator(PRIMARY_NETWORK_ID, NodeId::from_byte(9))
            .unwrap();
        let supply = commit.current_supply(PRIMARY_NETWORK_ID).unwrap();

        let outcome = ProposalTxExecutor::new(&h.backend)
            .execute(&mut commit, &mut abort, &reward_tx(&h, add.id()), END)
            .unwrap();
        assert!(outcome.prefers_commit);

        for view in [&commit, &abort] {
            assert!(view
                .get_current_validator(PRIMARY_NETWORK_ID, NodeId::from_byte(9))
                .is_err());
            assert_eq!(
                view.get_utxo(add.id().prefixed(1)).unwrap().output.amount(),
                5_000
            );
        }
        let rewards = commit.get_reward_utxos(add.id()).unwrap();
        assert_eq!(rewards.len(), 1);
        assert_eq!(rewards[0].output.amount(), staker.potential_reward);
        assert_eq!(rewards[0].utxo_id, UtxoId::new(add.id(), 2));
        assert!(commit.get_utxo(add.id().prefixed(2)).is_ok());
        assert!(abort.get_utxo(add.id().prefixed(2)).is_err());

        assert_eq!(commit.current_supply(PRIMARY_NETWORK_ID).unwrap(), supply);
        assert_eq!(
            abort.current_supply(PRIMARY_NETWORK_ID).unwrap(),
            supply - staker.potential_reward
        );
        assert_eq!(commit.get_tx(add.id()).unwrap().1, TxStatus::Committed);
    }

    #[test]
    fn test_delegator_reward_split_with_validator() {
        let h = Harness::new();
        let add = validator_tx(&h);
        let delegate = delegator_tx(&h);
        let (mut commit, mut abort) = staked(&h, &[add, delegate.clone()]);
        let reward = commit
            .get_current_delegators(PRIMARY_NETWORK_ID, NodeId::from_byte(9))
            .unwrap()[0]
            .potential_reward;
        assert!(reward > 0);

        // Delegators end before validators with the same end time.
        ProposalTxExecutor::new(&h.backend)
            .execute(&mut commit, &mut abort, &reward_tx(&h, delegate.id()), END)
            .unwrap();
        let paid = commit.get_reward_utxos(delegate.id()).unwrap();
        let cut = reward / 10;
        let amounts: Vec<(u64, ShortId)> = paid
            .iter()
            .map(|u| (u.output.amount(), u.output.owners().addresses[0]))
            .collect();
        assert_eq!(
            amounts,
            vec![
                (reward - cut, ShortId::from_byte(6)),
                (cut, ShortId::from_byte(5)),
            ]
        );
    }

    #[test]
    fn test_reward_validator_checks_order_and_time() {
        let h = Harness::new();
        let add = validator_tx(&h);
        let (mut commit, mut abort) = staked(&h, &[add.clone()]);
        let wrong = Id::from_byte(0x77);
        assert_eq!(
            ProposalTxExecutor::new(&h.backend).execute(
                &mut commit,
                &mut abort,
                &reward_tx(&h, wrong),
                END
            ),
            Err(ExecutorError::UnexpectedStaker {
                expected: add.id(),
                actual: wrong,
            })
        );

        commit.set_timestamp(END - 1);
        assert_eq!(
            ProposalTxExecutor::new(&h.backend).execute(
                &mut commit,
                &mut abort,
                &reward_tx(&h, add.id()),
                END
            ),
            Err(ExecutorError::RemoveStakerTooEarly {
                tx_id: add.id(),
                end_time: END,
                now: END - 1,
            })
        );
        assert!(commit
            .get_current_validator(PRIMARY_NETWORK_ID, NodeId::from_byte(9))
            .is_ok());
    }

    fn apricot() -> Harness {
        let mut config = fixtures::config();
        config.upgrades = UpgradeConfig::apricot();
        Harness::with_config(config)
    }

    fn advance(h: &Harness, time: u64) -> Tx {
        h.sign(UnsignedTx::AdvanceTime(AdvanceTimeTx { time }), vec![])
    }

    #[test]
    fn test_advance_time_bounds() {
        let h = apricot();
        let (mut commit, mut abort) = (h.diff(), h.diff());
        let executor = ProposalTxExecutor::new(&h.backend);
        let now = fixtures::GENESIS_TIME + 100;

        assert_eq!(
            executor.execute(&mut commit, &mut abort, &advance(&h, fixtures::GENESIS_TIME), now),
            Err(ExecutorError::TimestampNotIncreasing {
                proposed: fixtures::GENESIS_TIME,
                current: fixtures::GENESIS_TIME,
            })
        );
        assert_eq!(
            executor.execute(&mut commit, &mut abort, &advance(&h, now + 11), now),
            Err(ExecutorError::TimestampTooFar {
                proposed: now + 11,
                bound: now + 10,
            })
        );
        let end = fixtures::GENESIS_TIME + fixtures::GENESIS_DURATION;
        assert_eq!(
            executor.execute(&mut commit, &mut abort, &advance(&h, end + 1), end + 5),
            Err(ExecutorError::TimestampBeyondStakerChange {
                proposed: end + 1,
                next_change: end,
            })
        );
        assert_eq!(commit.timestamp(), fixtures::GENESIS_TIME);
    }

    #[test]
    fn test_advance_time_writes_commit_view_only() {
        let h = apricot();
        let (mut commit, mut abort) = (h.diff(), h.diff());
        let executor = ProposalTxExecutor::new(&h.backend);
        let target = fixtures::GENESIS_TIME + 50;

        let outcome = executor
            .execute(&mut commit, &mut abort, &advance(&h, target), target)
            .unwrap();
        assert!(outcome.prefers_commit);
        assert_eq!(commit.timestamp(), target);
        assert_eq!(abort.timestamp(), fixtures::GENESIS_TIME);

        // Ahead of local time, still valid but voted down.
        let (mut commit, mut abort) = (h.diff(), h.diff());
        let outcome = executor
            .execute(&mut commit, &mut abort, &advance(&h, target), target - 5)
            .unwrap();
        assert!(!outcome.prefers_commit);
    }

    #[test]
    fn test_advance_time_disabled_after_banff() {
        let h = Harness::new();
        let (mut commit, mut abort) = (h.diff(), h.diff());
        assert_eq!(
            ProposalTxExecutor::new(&h.backend).execute(
                &mut commit,
                &mut abort,
                &advance(&h, fixtures::GENESIS_TIME + 1),
                fixtures::GENESIS_TIME + 1
            ),
            Err(ExecutorError::DisabledAfterBanff {
                tx: "advance_time"
            })
        );
    }
}
