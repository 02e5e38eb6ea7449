use meridian_state::{Address, Bytes32, Uint256};
use serde::{Deserialize, Serialize};

/// Staking commitment length. Longer commitments earn a higher reward
/// rate, mirroring the spec's `{Low, Medium, High}` tiers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum StakingPeriod {
    #[default]
    Low,
    Medium,
    High,
}

impl StakingPeriod {
    /// Period length in blocks.
    pub fn blocks(&self) -> u64 {
        match self {
            StakingPeriod::Low => 10_000,
            StakingPeriod::Medium => 30_000,
            StakingPeriod::High => 90_000,
        }
    }

    /// Reward rate in parts-per-million of stake, per period.
    pub fn reward_rate_ppm(&self) -> u64 {
        match self {
            StakingPeriod::Low => 2_000,
            StakingPeriod::Medium => 7_000,
            StakingPeriod::High => 25_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ValidationStatus {
    #[default]
    Unknown,
    Queued,
    Active,
    Cooldown,
    Exited,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Validation {
    pub endorsor: Address,
    pub node_master: Address,
    pub stake: Uint256,
    pub status: ValidationStatus,
    pub auto_renew: bool,
    pub online: bool,
    pub period: StakingPeriod,
    pub start_block: u64,
    pub exit_block: u64,
    pub completed_periods: u64,
    pub offline_since: Option<u64>,
    pub delegators_stake: Uint256,
    pub delegators_weight: Uint256,
    pub withdrawable: Uint256,
    /// Amount requested via `decrease_stake` while `Active`, not yet moved
    /// out of `stake` into `withdrawable`; applied by `advance_periods` at
    /// the next period close.
    pub pending_decrease: Uint256,
    pub prev: Bytes32,
    pub next: Bytes32,
    pub present: bool,
}

impl Validation {
    /// `weight = stake + Σ delegation.stake * multiplier/100`, matching
    /// the spec's weighting formula used by the PoS scheduler.
    pub fn weight(&self) -> Uint256 {
        self.stake.saturating_add(self.delegators_weight)
    }

    pub fn total_stake(&self) -> Uint256 {
        self.stake.saturating_add(self.delegators_stake)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Delegation {
    pub validation_id: Bytes32,
    pub delegator: Address,
    pub stake: Uint256,
    /// Period index (the validation's `completed_periods` at creation
    /// time) the delegation started contributing weight in.
    pub start_period: u64,
    pub auto_renew: bool,
    /// `100` = 1.00x, up to `255` = 2.55x.
    pub multiplier: u16,
    pub withdrawable: Uint256,
    /// Position in the owning validation's per-validation delegation list,
    /// walked by `settle_delegations`/`release_all_delegations` at period
    /// boundaries and on validator exit.
    pub prev: Bytes32,
    pub next: Bytes32,
    pub present: bool,
}

impl Delegation {
    pub fn weighted_stake(&self) -> Uint256 {
        self.stake * Uint256::from(self.multiplier) / Uint256::from(100u64)
    }
}
