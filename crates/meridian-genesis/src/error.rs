use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("state error: {0}")]
    State(#[from] meridian_state::StateError),

    #[error("contract error during genesis: {0}")]
    Contract(#[from] meridian_builtins::ContractError),

    #[error("staker error during genesis: {0}")]
    Staker(#[from] meridian_staker::StakerError),

    #[error("genesis spec is invalid: {reason}")]
    InvalidSpec { reason: String },
}

impl GenesisError {
    pub fn log_level(&self) -> tracing::Level {
        tracing::Level::ERROR
    }

    pub fn is_retryable(&self) -> bool {
        false
    }
}

pub type Result<T> = std::result::Result<T, GenesisError>;
