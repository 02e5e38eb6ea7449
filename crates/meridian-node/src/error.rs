//! Error types for the node process.
//!
//! Grounded on `indexer/src/error.rs`'s `IndexerError`: one enum at the
//! crate boundary with a `log_level`/`is_retryable` pair the binary's
//! `main` consults before deciding whether to exit or keep running.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NodeError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("genesis spec at {path} is invalid: {reason}")]
    InvalidGenesisSpec { path: String, reason: String },

    #[error("genesis assembly failed: {0}")]
    Genesis(#[from] meridian_genesis::GenesisError),

    #[error("packer error: {0}")]
    Packer(#[from] meridian_packer::PackerError),

    #[error("pruner error: {0}")]
    Pruner(#[from] meridian_pruner::PrunerError),

    #[error("failed to read genesis spec file {path}: {source}")]
    ReadSpecFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl NodeError {
    pub fn log_level(&self) -> tracing::Level {
        match self {
            NodeError::Config(_) | NodeError::InvalidGenesisSpec { .. } | NodeError::ReadSpecFile { .. } => {
                tracing::Level::ERROR
            }
            NodeError::Genesis(_) => tracing::Level::ERROR,
            NodeError::Packer(e) => e.log_level(),
            NodeError::Pruner(_) => tracing::Level::WARN,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, NodeError::Packer(e) if e.is_retryable())
    }
}

pub type Result<T> = std::result::Result<T, NodeError>;
