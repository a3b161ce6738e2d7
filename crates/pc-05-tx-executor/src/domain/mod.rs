pub mod flow;
pub mod reward;
pub mod staking;
pub mod time;

pub use flow::verify_spend;
pub use reward::RewardCalculator;
pub use staking::{
    get_validator, staking_rules, verify_delegation_cap, verify_stake_asset, verify_weight,
    verify_window, verify_within, StakingRules,
};
pub use time::{advance_time_to, next_staker_change_time};
