//! # Executor Configuration
//!
//! Staking bounds, the reward curve, fees and upgrade times. Amounts are in
//! nano-units of the fee asset; times and durations are in seconds; rates
//! and shares are parts per million.

use serde::{Deserialize, Serialize};
use shared_types::{AssetId, ChainId, Id, TxContext, PERCENT_DENOMINATOR};
use thiserror::Error;

const UNIT: u64 = 1_000_000_000;
const DAY: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid staking bounds: {0}")]
    StakingBounds(&'static str),

    #[error("Invalid reward config: {0}")]
    Reward(&'static str),

    #[error("Durango time {durango} precedes Banff time {banff}")]
    UpgradeOrder { banff: u64, durango: u64 },
}

/// Parameters of the minting curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardConfig {
    pub max_consumption_rate: u64,
    pub min_consumption_rate: u64,
    /// Staking duration that earns the maximum rate.
    pub minting_period: u64,
    pub supply_cap: u64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            max_consumption_rate: 120_000,
            min_consumption_rate: 100_000,
            minting_period: 365 * DAY,
            supply_cap: 720_000_000 * UNIT,
        }
    }
}

/// Primary-network staking rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakingConfig {
    pub min_validator_stake: u64,
    pub max_validator_stake: u64,
    pub min_delegator_stake: u64,
    pub min_delegation_fee: u32,
    pub min_stake_duration: u64,
    pub max_stake_duration: u64,
    /// How far past chain time a pending staker may start.
    pub max_future_start_time: u64,
    /// A validator's total weight is capped at its own stake times this.
    pub max_validator_weight_factor: u64,
    /// Uptime a primary-network validator needs to be rewarded.
    pub uptime_requirement: u32,
    pub reward: RewardConfig,
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            min_validator_stake: 2_000 * UNIT,
            max_validator_stake: 3_000_000 * UNIT,
            min_delegator_stake: 25 * UNIT,
            min_delegation_fee: 20_000,
            min_stake_duration: 14 * DAY,
            max_stake_duration: 365 * DAY,
            max_future_start_time: 14 * DAY,
            max_validator_weight_factor: 5,
            uptime_requirement: 800_000,
            reward: RewardConfig::default(),
        }
    }
}

/// Burned fee per transaction kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeConfig {
    pub tx_fee: u64,
    pub create_subnet_tx_fee: u64,
    pub create_blockchain_tx_fee: u64,
    pub transform_subnet_tx_fee: u64,
    pub add_primary_network_validator_fee: u64,
    pub add_primary_network_delegator_fee: u64,
    pub add_subnet_validator_fee: u64,
    pub add_subnet_delegator_fee: u64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            tx_fee: UNIT / 1_000,
            create_subnet_tx_fee: UNIT,
            create_blockchain_tx_fee: UNIT,
            transform_subnet_tx_fee: 10 * UNIT,
            add_primary_network_validator_fee: 0,
            add_primary_network_delegator_fee: 0,
            add_subnet_validator_fee: UNIT / 1_000,
            add_subnet_delegator_fee: UNIT / 1_000,
        }
    }
}

/// Chain times (seconds) at which protocol upgrades activate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeConfig {
    /// Timestamped blocks, permissionless stakers.
    pub banff_time: u64,
    /// Stakers start immediately; `AddValidator`/`AddDelegator` retired.
    pub durango_time: u64,
}

impl UpgradeConfig {
    pub fn is_banff_active(&self, timestamp: u64) -> bool {
        timestamp >= self.banff_time
    }

    pub fn is_durango_active(&self, timestamp: u64) -> bool {
        timestamp >= self.durango_time
    }

    /// Every upgrade active from genesis.
    pub fn latest() -> Self {
        Self::default()
    }

    /// No upgrade ever activates.
    pub fn apricot() -> Self {
        Self {
            banff_time: u64::MAX,
            durango_time: u64::MAX,
        }
    }
}

/// Whether proof-of-possession checks are relaxed while a network is
/// being bootstrapped.
///
/// The relaxation is opt-in, limited to primary-network validators and
/// bounded by chain time; it can never be switched on from the process
/// environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BootstrapMode {
    #[default]
    Disabled,
    /// All-zero proofs of possession are accepted until chain time reaches
    /// `until`.
    AllowZeroProofOfPossession { until: u64 },
}

impl BootstrapMode {
    pub fn allows_zero_pop(&self, timestamp: u64) -> bool {
        match self {
            BootstrapMode::Disabled => false,
            BootstrapMode::AllowZeroProofOfPossession { until } => timestamp < *until,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    pub network_id: u32,
    /// ID of the platform chain itself.
    pub chain_id: ChainId,
    /// Asset fees are paid in and primary-network stake is denominated in.
    pub fee_asset_id: AssetId,
    pub staking: StakingConfig,
    pub fees: FeeConfig,
    pub upgrades: UpgradeConfig,
    pub bootstrap: BootstrapMode,
    /// How far ahead of local time a proposed chain time may be.
    pub sync_bound: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            network_id: 1,
            chain_id: Id::EMPTY,
            fee_asset_id: Id::EMPTY,
            staking: StakingConfig::default(),
            fees: FeeConfig::default(),
            upgrades: UpgradeConfig::latest(),
            bootstrap: BootstrapMode::Disabled,
            sync_bound: 10,
        }
    }
}

impl ExecutorConfig {
    pub fn tx_context(&self) -> TxContext {
        TxContext {
            network_id: self.network_id,
            chain_id: self.chain_id,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.staking;
        if s.min_validator_stake == 0 || s.min_validator_stake > s.max_validator_stake {
            return Err(ConfigError::StakingBounds("validator stake"));
        }
        if s.min_delegator_stake == 0 {
            return Err(ConfigError::StakingBounds("delegator stake"));
        }
        if s.min_stake_duration == 0 || s.min_stake_duration > s.max_stake_duration {
            return Err(ConfigError::StakingBounds("stake duration"));
        }
        if s.min_delegation_fee > PERCENT_DENOMINATOR
            || s.uptime_requirement > PERCENT_DENOMINATOR
        {
            return Err(ConfigError::StakingBounds("rates above 100%"));
        }
        if s.max_validator_weight_factor == 0 {
            return Err(ConfigError::StakingBounds("max validator weight factor"));
        }
        let r = &s.reward;
        if r.min_consumption_rate > r.max_consumption_rate
            || r.max_consumption_rate > PERCENT_DENOMINATOR as u64
        {
            return Err(ConfigError::Reward("consumption rates"));
        }
        if r.minting_period == 0 {
            return Err(ConfigError::Reward("minting period"));
        }
        if self.upgrades.durango_time < self.upgrades.banff_time {
            return Err(ConfigError::UpgradeOrder {
                banff: self.upgrades.banff_time,
                durango: self.upgrades.durango_time,
            });
        }
        Ok(())
    }
}
