//! Node binary subcommands.
//!
//! Grounded on the pack's `clap`-derive CLI precedents (`tos-network-tos`,
//! `jono94-rust-ethereum`); the teacher itself has no CLI beyond argv-free
//! `main` functions, so the subcommand shape is original to this crate.

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "meridian-node", about = "Meridian chain node")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Assemble (or reuse) genesis state and run the packer and pruner
    /// loops until interrupted.
    Run,
    /// Assemble genesis state from a spec file and print a summary
    /// without starting the block loop.
    Genesis {
        /// Overrides `GENESIS_SPEC_PATH` from the environment.
        #[arg(long)]
        spec_path: Option<String>,
    },
    /// Run a single pruner pass against a freshly assembled genesis store
    /// and exit. Useful for ops tooling and the test suite; this node has
    /// no cross-process persistence layer, so there is no "existing"
    /// store to load outside of a single `run` session.
    PruneOnce {
        #[arg(long)]
        spec_path: Option<String>,
    },
}
