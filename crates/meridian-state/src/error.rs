use thiserror::Error;

/// Errors surfaced by the typed state adapters and the underlying store.
///
/// Mirrors the three-tier error design: decode/storage failures are
/// recoverable by the caller (they map onto a contract revert), while a
/// mismatched encoding of a value the node itself wrote is a bug.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("slot decode failed at {address:?}/{slot:?}: {reason}")]
    Decode {
        address: primitive_types::H160,
        slot: primitive_types::H256,
        reason: String,
    },

    #[error("slot encode failed: {reason}")]
    Encode { reason: String },

    #[error("value out of range for a 256-bit unsigned integer")]
    OutOfRange,

    #[error("out of gas: needed {needed}, had {available}")]
    OutOfGas { needed: u64, available: u64 },

    #[error("read at block {requested} is outside the retained window [{floor}, {best}]")]
    PrunedHistory {
        requested: u64,
        floor: u64,
        best: u64,
    },
}

impl StateError {
    /// Domain errors of this kind surface to callers as a revert with this
    /// message; storage/gas errors carry the same shape so the native
    /// dispatch boundary (meridian-builtins) can marshal either uniformly.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

pub type Result<T> = std::result::Result<T, StateError>;
