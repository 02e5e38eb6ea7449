use meridian_state::Address;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("{caller} is not an authorized block proposer")]
    Unauthorized { caller: Address },

    #[error("no active validators to schedule against")]
    NoActiveValidators,
}

impl SchedulerError {
    pub fn log_level(&self) -> tracing::Level {
        tracing::Level::WARN
    }

    pub fn is_retryable(&self) -> bool {
        false
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
