//! Declarative genesis specification, `serde`-deserialized from a JSON
//! file the way the node's configuration is loaded.

use std::collections::BTreeMap;

use meridian_state::{Address, Uint256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSpec {
    pub address: Address,
    #[serde(default)]
    pub balance: Uint256,
    #[serde(default)]
    pub energy: Uint256,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthoritySpec {
    pub node_master: Address,
    pub endorsor: Address,
    pub identity: meridian_state::Bytes32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorSpec {
    pub address: Address,
    #[serde(default)]
    pub approvers: Vec<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ForkConfig {
    #[serde(default)]
    pub vip191: u64,
    #[serde(default)]
    pub vip214: u64,
    #[serde(default)]
    pub finality: u64,
    #[serde(default)]
    pub hayabusa: Option<u64>,
    #[serde(default)]
    pub galactica: Option<u64>,
    /// Interval, in blocks, at which the PoA→PoS transition check runs
    /// after the `hayabusa` fork height.
    #[serde(default = "default_hayabusa_tp")]
    pub hayabusa_tp: u64,
}

fn default_hayabusa_tp() -> u64 {
    180_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisSpec {
    pub launch_time: u64,
    pub block_interval: u64,
    #[serde(default)]
    pub accounts: Vec<AccountSpec>,
    #[serde(default)]
    pub authority: Vec<AuthoritySpec>,
    pub executor: ExecutorSpec,
    #[serde(default)]
    pub params: BTreeMap<String, Uint256>,
    #[serde(default)]
    pub fork: ForkConfig,
    /// If true, genesis immediately runs the staker's one-shot PoA→PoS
    /// transition and a housekeeping pass so the chain starts in PoS mode
    /// (§4.12 step 4).
    #[serde(default)]
    pub start_in_pos: bool,
    pub min_validator_stake: Uint256,
    pub max_block_proposers: u64,
}
