//! Typed events emitted by the built-in contracts.
//!
//! Grounded on `contracts/src/events.rs`'s one-function-per-event pattern
//! (`pub fn initialized(e, admin, fee_rate)`); here the ABI topic/selector
//! string is exposed via `Event::topic()` rather than encoded at emit
//! time, since full ABI log encoding is VM territory (out of scope, §6).

use std::cell::RefCell;

use meridian_state::{Address, Bytes32};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Candidate { node_master: Address, action: Bytes32 },
    ParamSet { key: Bytes32, value: meridian_state::Uint256 },
    ValidatorQueued { id: Bytes32 },
    ValidatorWithdrawn { id: Bytes32 },
    StakeIncreased { id: Bytes32, amount: meridian_state::Uint256 },
    StakeDecreased { id: Bytes32, amount: meridian_state::Uint256 },
    DelegationAdded { id: Bytes32, validation_id: Bytes32 },
    DelegationWithdrawn { id: Bytes32 },
    UpdatedAutoRenew { id: Bytes32, auto_renew: bool },
    Proposal { id: Bytes32, action: &'static str },
    Approver { approver: Address, action: &'static str },
    VotingContract { contract: Address, action: &'static str },
}

impl Event {
    /// Matches the ABI event name the corresponding surface contract
    /// declares; kept as a plain string since this workspace does not
    /// encode Ethereum-style log topics (out of scope, §6).
    pub fn topic(&self) -> &'static str {
        match self {
            Event::Candidate { .. } => "Candidate",
            Event::ParamSet { .. } => "Set",
            Event::ValidatorQueued { .. } => "ValidatorQueued",
            Event::ValidatorWithdrawn { .. } => "ValidatorWithdrawn",
            Event::StakeIncreased { .. } => "StakeIncreased",
            Event::StakeDecreased { .. } => "StakeDecreased",
            Event::DelegationAdded { .. } => "DelegationAdded",
            Event::DelegationWithdrawn { .. } => "DelegationWithdrawn",
            Event::UpdatedAutoRenew { .. } => "UpdatedAutoRenew",
            Event::Proposal { .. } => "Proposal",
            Event::Approver { .. } => "Approver",
            Event::VotingContract { .. } => "VotingContract",
        }
    }
}

/// Right-pads an ASCII action label into the 32-byte `action` field of a
/// `Candidate` event (truncating past 32 bytes), matching the `pad32`-style
/// plain byte layout the spec uses for fixed-width identifiers.
pub fn action_bytes(label: &[u8]) -> Bytes32 {
    let mut out = [0u8; 32];
    let len = label.len().min(32);
    out[..len].copy_from_slice(&label[..len]);
    Bytes32::from_slice(&out)
}

/// Per-block event log. The packer drains this after processing each
/// block and attaches it to the receipt set.
///
/// Holds its buffer behind a `RefCell`, the same interior-mutability shape
/// `GasMeter` uses for its `Cell<u64>` counter, so every mutator across
/// Params/Authority/Executor/Staker can take `&EventLog` alongside `&Ctx`
/// without needing `&mut self` threaded through their call chains.
#[derive(Default)]
pub struct EventLog {
    events: RefCell<Vec<Event>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }

    pub fn drain(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}
