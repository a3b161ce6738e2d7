//! Chain-time advancement.

use super::reward::RewardCalculator;
use super::staking::staking_rules;
use crate::backend::Backend;
use crate::errors::ExecutorError;
use pc_03_staker_ledger::{Chain, ChainReader, Staker};
use shared_types::SubnetId;
use std::collections::BTreeMap;
use tracing::debug;

/// Earliest time at which any staker starts or ends, if there are stakers.
pub fn next_staker_change_time<R: ChainReader + ?Sized>(
    chain: &R,
) -> Result<Option<u64>, ExecutorError> {
    let current = chain.current_stakers()?.first().map(|s| s.next_time);
    let pending = chain.pending_stakers()?.first().map(|s| s.next_time);
    Ok(match (current, pending) {
        (Some(c), Some(p)) => Some(c.min(p)),
        (c, p) => c.or(p),
    })
}

/// Moves chain time to `new_time`.
///
/// Pending stakers whose start is due become current with their potential
/// reward fixed now, and each subnet's supply grows by the rewards it
/// promised. Permissioned subnet validators whose end is due leave the
/// current set. Returns whether any staker moved.
///
/// Everything is read before the first write, so an error leaves `chain`
/// untouched.
pub fn advance_time_to(
    backend: &Backend,
    chain: &mut dyn Chain,
    new_time: u64,
) -> Result<bool, ExecutorError> {
    let pending = chain.pending_stakers()?;
    let current = chain.current_stakers()?;

    let mut supplies: BTreeMap<SubnetId, u64> = BTreeMap::new();
    let mut promoted: Vec<(Staker, Staker)> = Vec::new();
    for staker in pending.into_iter().take_while(|s| s.next_time <= new_time) {
        let reward = if staker.priority.is_permissioned_validator() {
            0
        } else {
            let supply = match supplies.get(&staker.subnet_id) {
                Some(supply) => *supply,
                None => chain.current_supply(staker.subnet_id)?,
            };
            let rules = staking_rules(backend, &*chain, staker.subnet_id)?;
            let reward = RewardCalculator::new(rules.reward).calculate(
                staker.duration(),
                staker.weight,
                supply,
            );
            let supply = supply.checked_add(reward).ok_or(ExecutorError::Overflow)?;
            supplies.insert(staker.subnet_id, supply);
            reward
        };
        let current = staker.promote(reward);
        promoted.push((staker, current));
    }

    let expired: Vec<Staker> = current
        .into_iter()
        .take_while(|s| s.next_time <= new_time)
        .filter(|s| s.priority.is_permissioned_validator())
        .collect();

    for (pending, current) in &promoted {
        if pending.is_validator() {
            chain.delete_pending_validator(pending);
            chain.put_current_validator(current.clone());
        } else {
            chain.delete_pending_delegator(pending);
            chain.put_current_delegator(current.clone());
        }
    }
    for staker in &expired {
        chain.delete_current_validator(staker);
    }
    for (subnet_id, supply) in supplies {
        chain.set_current_supply(subnet_id, supply);
    }
    chain.set_timestamp(new_time);

    if !promoted.is_empty() || !expired.is_empty() {
        debug!(
            new_time,
            promoted = promoted.len(),
            expired = expired.len(),
            "Advanced chain time"
        );
    }
    Ok(!promoted.is_empty() || !expired.is_empty())
}
