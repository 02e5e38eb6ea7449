use meridian_state::{Address, StateError};
use thiserror::Error;

/// Domain errors raised by the built-in contracts (Params, Authority,
/// Prototype, Energy, Executor) and the native dispatch registry.
///
/// Mirrors the teacher's `IndexerError` shape: one enum per crate boundary,
/// with a `log_level`/`is_retryable` pair so the caller (here, the native
/// dispatch boundary and eventually the packer) can decide how loudly to
/// report a failure without matching on every variant.
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("caller {caller} is not the executor")]
    NotExecutor { caller: Address },

    #[error("{what} already exists")]
    AlreadyExists { what: String },

    #[error("{what} is not listed")]
    NotListed { what: String },

    #[error("endorsor balance below the endorsement threshold")]
    BelowEndorsement,

    #[error("parameter is frozen after governance lock")]
    ParamLocked,

    #[error("quorum not met: {approvals}/{quorum}")]
    QuorumNotMet { approvals: u32, quorum: u32 },

    #[error("proposal expired")]
    ProposalExpired,

    #[error("approver already approved this proposal")]
    AlreadyApproved,

    #[error("proposal {id:?} not found")]
    ProposalNotFound { id: meridian_state::Bytes32 },

    #[error("proposal already executed")]
    AlreadyExecuted,

    #[error("caller {caller} is not authorized for this call")]
    Unauthorized { caller: Address },

    #[error("state error: {0}")]
    State(#[from] StateError),
}

impl ContractError {
    pub fn log_level(&self) -> tracing::Level {
        match self {
            ContractError::State(_) => tracing::Level::ERROR,
            _ => tracing::Level::WARN,
        }
    }

    /// None of these are retryable: they are all rejections of the exact
    /// call as submitted, not transient conditions.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

pub type Result<T> = std::result::Result<T, ContractError>;
