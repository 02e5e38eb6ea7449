//! Node configuration, loaded from environment variables.
//!
//! Grounded on `indexer/src/config/mod.rs::IndexerConfig`: a `serde`
//! struct with `#[serde(default = "...")]` field defaults, loaded through
//! the `config` crate's `Environment` source.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    /// Path to the genesis spec JSON file (env: `GENESIS_SPEC_PATH`).
    pub genesis_spec_path: String,

    /// Target spacing between blocks, in seconds.
    #[serde(default = "default_block_interval")]
    pub block_interval: u64,

    /// Minimum number of blocks behind the chain tip the pruner keeps
    /// before it is willing to prune.
    #[serde(default = "default_min_span")]
    pub retention_min_span: u64,

    /// Maximum number of blocks behind the chain tip the pruner lets
    /// accumulate before forcing a prune.
    #[serde(default = "default_max_span")]
    pub retention_max_span: u64,

    /// `pretty` or `json`; overridden by `LOG_FORMAT` if both are set.
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_block_interval() -> u64 {
    10
}

fn default_min_span() -> u64 {
    720
}

fn default_max_span() -> u64 {
    18_000
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl NodeConfig {
    pub fn load() -> std::result::Result<Self, config::ConfigError> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()?;
        cfg.try_deserialize()
    }

    pub fn from_env() -> std::result::Result<Self, config::ConfigError> {
        Self::load()
    }
}
