//! Stake bounds, staking windows and delegation caps.

use crate::backend::Backend;
use crate::config::RewardConfig;
use crate::errors::ExecutorError;
use pc_03_staker_ledger::{ChainReader, Staker};
use shared_types::{
    AssetId, NodeId, SubnetId, TransferableOutput, UnsignedTx, PRIMARY_NETWORK_ID,
};

/// Staking parameters of one subnet.
///
/// The primary network takes them from the executor configuration; a
/// permissionless subnet takes them from its accepted `TransformSubnet`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakingRules {
    pub asset_id: AssetId,
    pub min_validator_stake: u64,
    pub max_validator_stake: u64,
    pub min_delegator_stake: u64,
    pub min_delegation_fee: u32,
    pub min_stake_duration: u64,
    pub max_stake_duration: u64,
    pub max_validator_weight_factor: u64,
    pub uptime_requirement: u32,
    pub reward: RewardConfig,
}

pub fn staking_rules<R: ChainReader + ?Sized>(
    backend: &Backend,
    chain: &R,
    subnet_id: SubnetId,
) -> Result<StakingRules, ExecutorError> {
    let config = &backend.config;
    if subnet_id == PRIMARY_NETWORK_ID {
        let s = &config.staking;
        return Ok(StakingRules {
            asset_id: config.fee_asset_id,
            min_validator_stake: s.min_validator_stake,
            max_validator_stake: s.max_validator_stake,
            min_delegator_stake: s.min_delegator_stake,
            min_delegation_fee: s.min_delegation_fee,
            min_stake_duration: s.min_stake_duration,
            max_stake_duration: s.max_stake_duration,
            max_validator_weight_factor: s.max_validator_weight_factor,
            uptime_requirement: s.uptime_requirement,
            reward: s.reward,
        });
    }

    let tx = match chain.get_subnet_transformation(subnet_id) {
        Ok(tx) => tx,
        Err(e) if e.is_not_found() => return Err(ExecutorError::SubnetNotTransformed(subnet_id)),
        Err(e) => return Err(e.into()),
    };
    let UnsignedTx::TransformSubnet(t) = tx.unsigned() else {
        return Err(ExecutorError::SubnetNotTransformed(subnet_id));
    };
    Ok(StakingRules {
        asset_id: t.asset_id,
        min_validator_stake: t.min_validator_stake,
        max_validator_stake: t.max_validator_stake,
        min_delegator_stake: t.min_delegator_stake,
        min_delegation_fee: t.min_delegation_fee,
        min_stake_duration: t.min_stake_duration,
        max_stake_duration: t.max_stake_duration,
        max_validator_weight_factor: u64::from(t.max_validator_weight_factor),
        uptime_requirement: t.uptime_requirement,
        reward: RewardConfig {
            max_consumption_rate: t.max_consumption_rate,
            min_consumption_rate: t.min_consumption_rate,
            minting_period: config.staking.reward.minting_period,
            supply_cap: t.maximum_supply,
        },
    })
}

/// The node's validator in `subnet_id`, current or pending.
pub fn get_validator<R: ChainReader + ?Sized>(
    chain: &R,
    subnet_id: SubnetId,
    node_id: NodeId,
) -> Result<Option<Staker>, ExecutorError> {
    match chain.get_current_validator(subnet_id, node_id) {
        Ok(staker) => return Ok(Some(staker)),
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e.into()),
    }
    match chain.get_pending_validator(subnet_id, node_id) {
        Ok(staker) => Ok(Some(staker)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn verify_stake_asset(
    stake_outs: &[TransferableOutput],
    asset_id: AssetId,
) -> Result<(), ExecutorError> {
    match stake_outs.iter().find(|out| out.asset_id != asset_id) {
        Some(out) => Err(ExecutorError::WrongStakeAsset {
            expected: asset_id,
            actual: out.asset_id,
        }),
        None => Ok(()),
    }
}

pub fn verify_weight(weight: u64, min: u64, max: u64) -> Result<(), ExecutorError> {
    if weight < min {
        return Err(ExecutorError::WeightTooSmall { weight, min });
    }
    if weight > max {
        return Err(ExecutorError::WeightTooLarge { weight, max });
    }
    Ok(())
}

/// Checks the staking window and returns the staker's effective start.
///
/// After Durango a staker starts at chain time, whatever it declared.
/// Before, the declared start must lie in `(now, now + max_future_start]`.
pub fn verify_window(
    backend: &Backend,
    rules: &StakingRules,
    now: u64,
    start: u64,
    end: u64,
) -> Result<u64, ExecutorError> {
    let effective_start = if backend.config.upgrades.is_durango_active(now) {
        now
    } else {
        if start <= now {
            return Err(ExecutorError::StartNotInFuture { start, now });
        }
        let max = now.saturating_add(backend.config.staking.max_future_start_time);
        if start > max {
            return Err(ExecutorError::StartTooFar { start, max });
        }
        start
    };

    let duration = end.saturating_sub(effective_start);
    if duration < rules.min_stake_duration {
        return Err(ExecutorError::DurationTooShort {
            duration,
            min: rules.min_stake_duration,
        });
    }
    if duration > rules.max_stake_duration {
        return Err(ExecutorError::DurationTooLong {
            duration,
            max: rules.max_stake_duration,
        });
    }
    Ok(effective_start)
}

/// A delegation or subnet validation must fit inside the validator's window.
pub fn verify_within(validator: &Staker, start: u64, end: u64) -> Result<(), ExecutorError> {
    if start < validator.start_time || end > validator.end_time {
        return Err(ExecutorError::PeriodMismatch);
    }
    Ok(())
}

/// Caps a validator's total weight at
/// `min(own_weight * max_validator_weight_factor, max_validator_stake)`.
///
/// Every current and pending delegator counts, regardless of whether its
/// window overlaps the new one.
pub fn verify_delegation_cap<R: ChainReader + ?Sized>(
    chain: &R,
    rules: &StakingRules,
    validator: &Staker,
    new_weight: u64,
) -> Result<(), ExecutorError> {
    let max = validator
        .weight
        .saturating_mul(rules.max_validator_weight_factor)
        .min(rules.max_validator_stake);

    let current = chain.get_current_delegators(validator.subnet_id, validator.node_id)?;
    let pending = chain.get_pending_delegators(validator.subnet_id, validator.node_id)?;
    let weight = current
        .iter()
        .chain(&pending)
        .try_fold(validator.weight, |acc, d| acc.checked_add(d.weight))
        .and_then(|acc| acc.checked_add(new_weight))
        .ok_or(ExecutorError::Overflow)?;

    if weight > max {
        return Err(ExecutorError::OverDelegated {
            node_id: validator.node_id,
            weight,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::fixtures;
    use pc_03_staker_ledger::Chain;
    use shared_types::{Id, Priority};

    fn rules() -> StakingRules {
        staking_rules(&fixtures::backend(), &fixtures::state(), PRIMARY_NETWORK_ID).unwrap()
    }

    #[test]
    fn test_primary_rules_come_from_config() {
        let backend = fixtures::backend();
        let r = rules();
        assert_eq!(r.asset_id, backend.config.fee_asset_id);
        assert_eq!(r.min_validator_stake, backend.config.staking.min_validator_stake);
    }

    #[test]
    fn test_untransformed_subnet_has_no_rules() {
        let subnet = Id::from_byte(0x51);
        assert_eq!(
            staking_rules(&fixtures::backend(), &fixtures::state(), subnet),
            Err(ExecutorError::SubnetNotTransformed(subnet))
        );
    }

    #[test]
    fn test_window_before_and_after_durango() {
        let mut backend = fixtures::backend();
        let r = rules();
        let now = 1_000;
        let end = now + r.min_stake_duration + 10;

        // Durango: starts now, declared start ignored.
        assert_eq!(verify_window(&backend, &r, now, 0, end), Ok(now));
        assert!(matches!(
            verify_window(&backend, &r, now, 0, now + 1),
            Err(ExecutorError::DurationTooShort { .. })
        ));

        fixtures::set_upgrades(&mut backend, crate::UpgradeConfig::apricot());
        assert_eq!(
            verify_window(&backend, &r, now, now, end),
            Err(ExecutorError::StartNotInFuture { start: now, now })
        );
        assert_eq!(verify_window(&backend, &r, now, now + 5, end), Ok(now + 5));
        let far = now + backend.config.staking.max_future_start_time + 1;
        assert!(matches!(
            verify_window(&backend, &r, now, far, far + r.min_stake_duration),
            Err(ExecutorError::StartTooFar { .. })
        ));
    }

    #[test]
    fn test_weight_bounds() {
        assert_eq!(verify_weight(5, 5, 10), Ok(()));
        assert_eq!(
            verify_weight(4, 5, 10),
            Err(ExecutorError::WeightTooSmall { weight: 4, min: 5 })
        );
        assert_eq!(
            verify_weight(11, 5, 10),
            Err(ExecutorError::WeightTooLarge { weight: 11, max: 10 })
        );
    }

    #[test]
    fn test_delegation_cap_counts_all_delegators() {
        let mut state = fixtures::state();
        let mut r = rules();
        r.max_validator_weight_factor = 2;
        let validator = state
            .get_current_validator(PRIMARY_NETWORK_ID, fixtures::GENESIS_NODE)
            .unwrap();
        let w = validator.weight;

        let mut delegator = validator.clone();
        delegator.tx_id = Id::from_byte(0xD1);
        delegator.weight = w / 2;
        delegator.priority = Priority::PrimaryNetworkDelegatorCurrent;
        state.put_current_delegator(delegator.clone());

        let mut pending = delegator.clone();
        pending.tx_id = Id::from_byte(0xD2);
        pending.priority = Priority::PrimaryNetworkDelegatorBanffPending;
        pending.next_time = pending.start_time;
        state.put_pending_delegator(pending);

        // w + w/2 + w/2 = 2w: exactly at the cap.
        assert_eq!(verify_delegation_cap(&state, &r, &validator, 0), Ok(()));
        assert!(matches!(
            verify_delegation_cap(&state, &r, &validator, 1),
            Err(ExecutorError::OverDelegated { .. })
        ));
    }

    #[test]
    fn test_get_validator_falls_back_to_pending() {
        let mut state = fixtures::state();
        assert!(get_validator(&state, PRIMARY_NETWORK_ID, fixtures::GENESIS_NODE)
            .unwrap()
            .is_some());

        let node = shared_types::NodeId::from_byte(0x77);
        assert_eq!(get_validator(&state, PRIMARY_NETWORK_ID, node), Ok(None));
        let mut pending = state
            .get_current_validator(PRIMARY_NETWORK_ID, fixtures::GENESIS_NODE)
            .unwrap();
        pending.node_id = node;
        pending.tx_id = Id::from_byte(0x78);
        pending.priority = Priority::PrimaryNetworkValidatorPending;
        state.put_pending_validator(pending.clone());
        assert_eq!(get_validator(&state, PRIMARY_NETWORK_ID, node), Ok(Some(pending)));
    }
}
