//! Meridian Node Binary
//!
//! Main entry point for the node process: loads configuration, assembles
//! or validates genesis state, and runs the packer/pruner loop.
//!
//! Grounded on `indexer/src/bin/stellarroute-indexer.rs`'s
//! initialize-then-run `main` and exit-code convention.

use std::process;

use clap::Parser;
use tracing::{error, info};

use meridian_node::cli::{Cli, Command};
use meridian_node::NodeConfig;

#[tokio::main]
async fn main() {
    meridian_node::telemetry::init();
    let cli = Cli::parse();

    let config = match NodeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Run => {
            info!("starting Meridian node");
            meridian_node::run(config).await
        }
        Command::Genesis { spec_path } => {
            let path = spec_path.unwrap_or(config.genesis_spec_path);
            match meridian_node::genesis_summary(&path) {
                Ok(summary) => {
                    println!("{summary}");
                    Ok(())
                }
                Err(e) => Err(e),
            }
        }
        Command::PruneOnce { spec_path } => {
            let path = spec_path.unwrap_or(config.genesis_spec_path);
            match meridian_node::prune_once(&path).await {
                Ok(stats) => {
                    println!(
                        "pruned {} versions across {} keys",
                        stats.versions_dropped, stats.keys_touched
                    );
                    Ok(())
                }
                Err(e) => Err(e),
            }
        }
    };

    if let Err(e) = result {
        error!("{}", e);
        process::exit(1);
    }
}
