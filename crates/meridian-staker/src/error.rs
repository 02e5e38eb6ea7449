use meridian_state::{Address, Bytes32};
use thiserror::Error;

/// Every staker native surfaces failure through the ABI's trailing-string
/// error convention (§4.9); this enum is the internal sum type marshaled
/// to that string at the native-dispatch boundary.
#[derive(Debug, Error)]
pub enum StakerError {
    #[error("stake below minimum")]
    BelowMinStake,

    #[error("node {0} already has a queued or active validation")]
    NodeAlreadyStaking(Address),

    #[error("validation {0:?} not found")]
    ValidationNotFound(Bytes32),

    #[error("delegation {0:?} not found")]
    DelegationNotFound(Bytes32),

    #[error("validation is not in the required state for this call")]
    WrongState,

    #[error("caller is not authorized for this validation")]
    Unauthorized,

    #[error("only the registered delegator contract may add delegations")]
    NotDelegatorContract,

    #[error("delegation multiplier must be in [100, 255]")]
    InvalidMultiplier,

    #[error("nothing withdrawable yet")]
    NothingWithdrawable,

    #[error("state error: {0}")]
    State(#[from] meridian_state::StateError),

    #[error("contract error: {0}")]
    Contract(#[from] meridian_builtins::ContractError),
}

impl StakerError {
    pub fn log_level(&self) -> tracing::Level {
        match self {
            StakerError::State(_) => tracing::Level::ERROR,
            _ => tracing::Level::WARN,
        }
    }

    pub fn is_retryable(&self) -> bool {
        false
    }

    /// The trailing-string ABI convention: empty string means success, any
    /// other string is the revert message.
    pub fn as_abi_string(&self) -> String {
        self.to_string()
    }
}

pub type Result<T> = std::result::Result<T, StakerError>;
