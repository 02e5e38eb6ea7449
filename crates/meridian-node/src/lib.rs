//! Process wiring for the Meridian node: config loading, genesis
//! assembly, and the packer/pruner cooperating task pair.
//!
//! Grounded on `indexer/src/lib.rs`'s thin service-struct shape and
//! `indexer/src/bin/stellarroute-indexer.rs`'s initialize-then-run main,
//! generalized from one HTTP-polling loop to two cooperating background
//! tasks sharing a cancellation token.

pub mod cli;
pub mod config;
pub mod error;
pub mod telemetry;

pub use config::NodeConfig;
pub use error::{NodeError, Result};

use std::sync::Arc;
use std::time::Duration;

use meridian_builtins::{addresses, Authority, Energy, NativeRegistry};
use meridian_genesis::spec::GenesisSpec;
use meridian_packer::{Packer, PackerConfig};
use meridian_pruner::{FinalityOracle, Pruner, PrunerConfig};
use meridian_staker::Staker;
use meridian_state::{InMemoryStore, Uint256};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const ENERGY_GROWTH_RATE: u64 = 5;
const ENERGY_SCALE: u64 = 1_000_000_000;

fn load_spec(path: &str) -> Result<GenesisSpec> {
    let raw = std::fs::read_to_string(path).map_err(|e| NodeError::ReadSpecFile {
        path: path.to_string(),
        source: e,
    })?;
    serde_json::from_str(&raw).map_err(|e| NodeError::InvalidGenesisSpec {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

/// `genesis` subcommand: assemble from the spec and print a one-line
/// summary without starting the block loop.
pub fn genesis_summary(spec_path: &str) -> Result<String> {
    let spec = load_spec(spec_path)?;
    let result = meridian_genesis::assemble(&spec)?;
    Ok(format!(
        "genesis id {:?}: {} accounts, {} authority candidates, start_in_pos={}",
        result.id,
        spec.accounts.len(),
        spec.authority.len(),
        spec.start_in_pos
    ))
}

/// `prune-once` subcommand: assembles a fresh genesis store (there is no
/// cross-process persistence to load an existing one from) and runs a
/// single pruner pass against a finality oracle pinned to the chain tip,
/// so the pass always has something eligible to prune in a short-lived
/// CLI invocation.
pub async fn prune_once(spec_path: &str) -> Result<meridian_state::PruneStats> {
    let spec = load_spec(spec_path)?;
    let result = meridian_genesis::assemble(&spec)?;
    let store = Arc::new(result.store);
    let oracle = Arc::new(meridian_pruner::finality::FixedOracle::new(store.best_block()));
    let pruner = Pruner::new(store, oracle, PrunerConfig::default());
    Ok(pruner.run_once().await?)
}

/// `run` subcommand: assembles genesis, then drives the packer and pruner
/// as cooperating tokio tasks sharing a single cancellation token, exactly
/// as `run()` cancels both on Ctrl-C.
///
/// There is no consensus/P2P collaborator wired in yet (§1 out-of-scope),
/// so finality is tracked optimistically against the store's own tip via
/// [`meridian_pruner::finality::TrackingOracle`] rather than a real BFT
/// finality feed.
pub async fn run(config: NodeConfig) -> Result<()> {
    let spec = load_spec(&config.genesis_spec_path)?;
    let assembled = meridian_genesis::assemble(&spec)?;
    let store = Arc::new(assembled.store);
    info!(genesis_id = ?assembled.id, "assembled genesis state");

    let oracle: Arc<dyn FinalityOracle> =
        Arc::new(meridian_pruner::finality::TrackingOracle::new(store.clone()));
    let pruner_config = PrunerConfig {
        min_span: config.retention_min_span,
        max_span: config.retention_max_span,
        ..PrunerConfig::default()
    };
    let pruner = Arc::new(Pruner::new(store.clone(), oracle, pruner_config));

    let cancel = CancellationToken::new();

    let pruner_task = {
        let pruner = pruner.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { pruner.run(cancel).await })
    };

    let packer_task = {
        let cancel = cancel.clone();
        let block_interval = config.block_interval;
        let min_stake = spec.min_validator_stake;
        let max_proposers = spec.max_block_proposers;
        let fork = spec.fork.clone();
        let store = store.clone();
        tokio::spawn(async move {
            run_packer_loop(store, block_interval, min_stake, max_proposers, fork, cancel).await
        })
    };

    tokio::signal::ctrl_c().await.ok();
    info!("received shutdown signal");
    cancel.cancel();

    if let Err(e) = pruner_task.await {
        error!(error = %e, "pruner task panicked");
    }
    if let Err(e) = packer_task.await {
        error!(error = %e, "packer task panicked");
    }
    Ok(())
}

async fn run_packer_loop(
    store: Arc<InMemoryStore>,
    block_interval: u64,
    min_stake: Uint256,
    max_proposers: u64,
    fork: meridian_genesis::spec::ForkConfig,
    cancel: CancellationToken,
) {
    let mut parent_time: u64 = 0;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("packer shutting down at parent_time {}", parent_time);
                return;
            }
            _ = tokio::time::sleep(Duration::from_secs(block_interval)) => {
                // `Packer` owns its store and collaborators by value, so
                // they are rebuilt each tick from the shared, cheaply
                // cloned `Arc<InMemoryStore>`. The registry has nothing
                // registered here; wiring real native selectors is
                // VM-integration work outside this workspace's scope.
                let packer = Packer::new(
                    InMemoryStoreRef(store.clone()),
                    Authority::new(addresses::AUTHORITY),
                    Staker::new(addresses::STAKER, min_stake),
                    Energy::new(addresses::ENERGY, Uint256::from(ENERGY_GROWTH_RATE), Uint256::from(ENERGY_SCALE)),
                    NativeRegistry::new(),
                    PackerConfig {
                        block_interval,
                        max_block_proposers: max_proposers,
                        eviction_threshold: fork.hayabusa_tp,
                        min_endorsement: Uint256::zero(),
                        fork: fork.clone(),
                        poa_variant: meridian_scheduler::poa::PoaVariant::V1,
                    },
                );
                let now = parent_time + block_interval;
                match packer.propose_block(addresses::AUTHORITY, parent_time, now, 10_000_000, &[]) {
                    Ok(proposed) => parent_time = proposed.time,
                    Err(e) => error!(error = %e, "block proposal failed"),
                }
            }
        }
    }
}

/// Thin `Store` forwarder so `Packer`, which owns its store by value, can
/// hold a cheap clone of the `Arc<InMemoryStore>` shared with the pruner.
struct InMemoryStoreRef(Arc<InMemoryStore>);

impl meridian_state::Store for InMemoryStoreRef {
    fn read_at(&self, key: meridian_state::SlotKey, block: u64) -> Option<Vec<u8>> {
        self.0.read_at(key, block)
    }
    fn write(&self, key: meridian_state::SlotKey, block: u64, value: Option<Vec<u8>>) {
        self.0.write(key, block, value)
    }
    fn prune_below(&self, floor: u64) -> meridian_state::PruneStats {
        self.0.prune_below(floor)
    }
    fn best_block(&self) -> u64 {
        self.0.best_block()
    }
}
