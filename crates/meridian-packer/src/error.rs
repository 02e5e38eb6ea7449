use meridian_state::{Address, Bytes32};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackerError {
    #[error("no legal production time for {caller} at or after parent {parent_time}")]
    NoLegalSlot { caller: Address, parent_time: u64 },

    #[error("unknown native contract/selector at {contract}")]
    UnknownNative { contract: Address },

    #[error("scheduler error: {0}")]
    Scheduler(#[from] meridian_scheduler::SchedulerError),

    #[error("staker error: {0}")]
    Staker(#[from] meridian_staker::StakerError),

    #[error("contract error: {0}")]
    Contract(#[from] meridian_builtins::ContractError),

    #[error("state error: {0}")]
    State(#[from] meridian_state::StateError),

    #[error("parent state root {0:?} is not the store's current head")]
    StaleParent(Bytes32),
}

impl PackerError {
    pub fn log_level(&self) -> tracing::Level {
        match self {
            PackerError::NoLegalSlot { .. } => tracing::Level::DEBUG,
            PackerError::Scheduler(_) | PackerError::Staker(_) | PackerError::Contract(_) => {
                tracing::Level::WARN
            }
            PackerError::UnknownNative { .. } | PackerError::State(_) | PackerError::StaleParent(_) => {
                tracing::Level::ERROR
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, PackerError::NoLegalSlot { .. })
    }
}

pub type Result<T> = std::result::Result<T, PackerError>;
