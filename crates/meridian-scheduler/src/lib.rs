//! The two proposer-scheduling strategies: PoA round-robin (v1/v2) and
//! PoS stake-weighted priority lottery.
//!
//! Grounded on the teacher's `contracts/src/adapters.rs` trait-object
//! backend-selection pattern (`PoolAdapterTrait` implemented by a
//! swappable adapter): here `ProposerSchedule` plays the same role so the
//! packer (`meridian-packer`) can hold either variant behind one
//! interface and switch at the fork/transition boundary.

pub mod error;
pub mod poa;
pub mod pos;

pub use error::{Result, SchedulerError};

use meridian_state::Address;

/// A candidate in the active rotation, already filtered to "currently
/// active" by the caller (Authority/Staker); the scheduler itself does not
/// know how a candidate became eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Proposer {
    pub address: Address,
    /// PoA ignores this; PoS uses it as the stake weight.
    pub weight: u64,
    pub active: bool,
}

/// The set of active-flag flips, and the resulting score, that a newly
/// produced block must commit.
#[derive(Debug, Clone, Default)]
pub struct ScheduleUpdate {
    pub flips: Vec<(Address, bool)>,
    pub score: u64,
}

/// Common interface both scheduler variants implement; the packer selects
/// one based on fork height and whether the staker has transitioned.
pub trait ProposerSchedule {
    /// Earliest timestamp `>= now` at which `caller` may legally produce,
    /// assuming every other active proposer behaves.
    fn schedule(&self, proposers: &[Proposer], caller: Address, parent_time: u64, now: u64) -> Result<u64>;

    /// Whether `t` is a legal production time for `caller` given the
    /// current active set.
    fn is_the_time(&self, proposers: &[Proposer], caller: Address, parent_time: u64, t: u64) -> Result<bool>;

    /// Active-flag updates a block produced by `producer` at time `t` must
    /// commit, plus the resulting activity score.
    fn updates(&self, proposers: &[Proposer], producer: Address, parent_time: u64, t: u64) -> Result<ScheduleUpdate>;
}
