use crate::config::RewardConfig;
use primitive_types::U512;
use shared_types::PERCENT_DENOMINATOR;

/// Potential reward of a staker, fixed when it becomes current.
///
/// ```text
/// rate   = (min_rate * minting_period + (max_rate - min_rate) * duration)
///          / (minting_period * 1_000_000)
/// reward = remaining_supply * rate * (weight / supply) * (duration / minting_period)
/// ```
///
/// Intermediates are 512-bit; the result never exceeds the remaining supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardCalculator {
    config: RewardConfig,
}

impl RewardCalculator {
    pub fn new(config: RewardConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    pub fn calculate(&self, staked_duration: u64, staked_amount: u64, current_supply: u64) -> u64 {
        let c = &self.config;
        if current_supply == 0 || current_supply >= c.supply_cap || c.minting_period == 0 {
            return 0;
        }
        let remaining_supply = c.supply_cap - current_supply;
        let duration = staked_duration.min(c.minting_period);

        let period = U512::from(c.minting_period);
        let rate_numerator = U512::from(c.max_consumption_rate.saturating_sub(c.min_consumption_rate))
            * U512::from(duration)
            + U512::from(c.min_consumption_rate) * period;
        let rate_denominator = period * U512::from(PERCENT_DENOMINATOR);

        let numerator = U512::from(remaining_supply)
            * rate_numerator
            * U512::from(staked_amount)
            * U512::from(duration);
        let denominator = rate_denominator * U512::from(current_supply) * period;
        let reward = numerator / denominator;

        if reward > U512::from(remaining_supply) {
            remaining_supply
        } else {
            reward.low_u64()
        }
    }
}
