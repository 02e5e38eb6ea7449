//! On-chain governance: propose/approve/execute with a quorum over a set
//! of approvers, plus an auxiliary set of voting contracts that may also
//! propose.
//!
//! Grounded directly on `contracts/src/governance.rs`: `propose` returning
//! a proposal id, `approve` gated on in-power + not-yet-expired +
//! not-already-approved, and `execute_proposal` setting `executed = true`
//! before dispatching the call to prevent re-entry — carried over
//! verbatim as the documented re-entry guard.

use std::collections::BTreeSet;

use meridian_state::{Address, Bytes32, Ctx, Mapping, RawAdapter};
use serde::{Deserialize, Serialize};

use crate::error::{ContractError, Result};
use crate::events::{Event, EventLog};

const PROPOSAL_TTL_SECONDS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Proposal {
    pub time_proposed: u64,
    pub proposer: Address,
    pub target: Address,
    pub calldata: Vec<u8>,
    pub approvals: BTreeSet<Address>,
    pub executed: bool,
    pub present: bool,
}

/// A dispatchable target invoked once a proposal reaches quorum. The
/// native dispatch registry (`dispatch.rs`) is the production
/// implementation; tests use a closure-backed stub.
pub trait Dispatcher {
    fn dispatch(&self, ctx: &Ctx, target: Address, calldata: &[u8]) -> Result<()>;
}

pub struct Executor {
    approvers: Mapping<Address, bool>,
    approver_count: RawAdapter<u32>,
    voting_contracts: Mapping<Address, bool>,
    proposals: Mapping<Bytes32, Proposal>,
}

impl Executor {
    pub fn new(address: Address) -> Self {
        Self {
            approvers: Mapping::new(address, Bytes32::repeat_byte(0xE0)),
            approver_count: RawAdapter::new(address, Bytes32::repeat_byte(0xE1)),
            voting_contracts: Mapping::new(address, Bytes32::repeat_byte(0xE2)),
            proposals: Mapping::new(address, Bytes32::repeat_byte(0xE3)),
        }
    }

    fn is_approver(&self, ctx: &Ctx, who: Address) -> Result<bool> {
        Ok(self.approvers.get(ctx, &who)?)
    }

    fn is_voting_contract(&self, ctx: &Ctx, who: Address) -> Result<bool> {
        Ok(self.voting_contracts.get(ctx, &who)?)
    }

    fn quorum(&self, ctx: &Ctx) -> Result<u32> {
        let n = self.approver_count.get(ctx)?;
        Ok((2 * (n + 1) + 2) / 3)
    }

    /// Callable only by the executor itself (i.e. via a prior proposal's
    /// `execute`), or by genesis assembly during bootstrap.
    pub fn add_approver(&self, ctx: &Ctx, approver: Address, events: &EventLog) -> Result<()> {
        if self.is_approver(ctx, approver)? {
            return Err(ContractError::AlreadyExists {
                what: format!("approver {approver}"),
            });
        }
        self.approvers.set(ctx, &approver, &true)?;
        let n = self.approver_count.get(ctx)?;
        self.approver_count.set(ctx, &(n + 1))?;
        events.emit(Event::Approver { approver, action: "added" });
        Ok(())
    }

    pub fn revoke_approver(&self, ctx: &Ctx, approver: Address, events: &EventLog) -> Result<()> {
        if !self.is_approver(ctx, approver)? {
            return Err(ContractError::NotListed {
                what: format!("approver {approver}"),
            });
        }
        self.approvers.set(ctx, &approver, &false)?;
        let n = self.approver_count.get(ctx)?;
        self.approver_count.set(ctx, &n.saturating_sub(1))?;
        events.emit(Event::Approver { approver, action: "revoked" });
        Ok(())
    }

    pub fn attach_voting_contract(&self, ctx: &Ctx, contract: Address, events: &EventLog) -> Result<()> {
        self.voting_contracts.set(ctx, &contract, &true)?;
        events.emit(Event::VotingContract { contract, action: "attached" });
        Ok(())
    }

    pub fn detach_voting_contract(&self, ctx: &Ctx, contract: Address, events: &EventLog) -> Result<()> {
        self.voting_contracts.set(ctx, &contract, &false)?;
        events.emit(Event::VotingContract { contract, action: "detached" });
        Ok(())
    }

    pub fn propose(
        &self,
        ctx: &Ctx,
        caller: Address,
        target: Address,
        calldata: Vec<u8>,
        events: &EventLog,
    ) -> Result<Bytes32> {
        if !self.is_approver(ctx, caller)? && !self.is_voting_contract(ctx, caller)? {
            return Err(ContractError::Unauthorized { caller });
        }
        let id = proposal_id(ctx.block, caller);
        if self.proposals.get(ctx, &id)?.present {
            return Err(ContractError::AlreadyExists {
                what: "proposal id collision".into(),
            });
        }
        let proposal = Proposal {
            time_proposed: ctx.block,
            proposer: caller,
            target,
            calldata,
            approvals: BTreeSet::new(),
            executed: false,
            present: true,
        };
        self.proposals.set(ctx, &id, &proposal)?;
        events.emit(Event::Proposal { id, action: "proposed" });
        Ok(id)
    }

    pub fn approve(&self, ctx: &Ctx, caller: Address, id: Bytes32) -> Result<()> {
        if !self.is_approver(ctx, caller)? {
            return Err(ContractError::Unauthorized { caller });
        }
        let mut proposal = self.load(ctx, id)?;
        if ctx.block.saturating_sub(proposal.time_proposed) > PROPOSAL_TTL_SECONDS {
            return Err(ContractError::ProposalExpired);
        }
        if !proposal.approvals.insert(caller) {
            return Err(ContractError::AlreadyApproved);
        }
        self.proposals.set(ctx, &id, &proposal)?;
        Ok(())
    }

    pub fn execute(&self, ctx: &Ctx, id: Bytes32, dispatcher: &dyn Dispatcher, events: &EventLog) -> Result<()> {
        let mut proposal = self.load(ctx, id)?;
        if proposal.executed {
            return Err(ContractError::AlreadyExecuted);
        }
        let quorum = self.quorum(ctx)?;
        let approvals = proposal.approvals.len() as u32;
        if approvals < quorum {
            return Err(ContractError::QuorumNotMet { approvals, quorum });
        }
        // Set before dispatch: a re-entrant call into `execute` for the
        // same id must observe `executed = true` and bail out above.
        proposal.executed = true;
        self.proposals.set(ctx, &id, &proposal)?;
        dispatcher.dispatch(ctx, proposal.target, &proposal.calldata)?;
        events.emit(Event::Proposal { id, action: "executed" });
        Ok(())
    }

    fn load(&self, ctx: &Ctx, id: Bytes32) -> Result<Proposal> {
        let proposal = self.proposals.get(ctx, &id)?;
        if !proposal.present {
            return Err(ContractError::ProposalNotFound { id });
        }
        Ok(proposal)
    }

    pub fn get(&self, ctx: &Ctx, id: Bytes32) -> Result<Proposal> {
        self.load(ctx, id)
    }
}

fn proposal_id(now: u64, proposer: Address) -> Bytes32 {
    use blake2::digest::consts::U32;
    use blake2::{Blake2b, Digest};
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(now.to_be_bytes());
    hasher.update(proposer.as_bytes());
    Bytes32::from_slice(&hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_state::{GasMeter, InMemoryStore};
    use std::cell::RefCell;

    struct RecordingDispatcher(RefCell<Vec<(Address, Vec<u8>)>>);
    impl Dispatcher for RecordingDispatcher {
        fn dispatch(&self, _ctx: &Ctx, target: Address, calldata: &[u8]) -> Result<()> {
            self.0.borrow_mut().push((target, calldata.to_vec()));
            Ok(())
        }
    }

    #[test]
    fn quorum_of_two_approvers_out_of_two() {
        let store = InMemoryStore::new();
        let gas = GasMeter::new(10_000_000);
        let ctx = Ctx::new(&store, 1, &gas);
        let executor = Executor::new(Address::repeat_byte(5));
        let events = EventLog::new();
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);
        for approver in [a, b] {
            executor.add_approver(&ctx, approver, &events).unwrap();
        }

        let id = executor
            .propose(&ctx, a, Address::repeat_byte(9), vec![1, 2, 3], &events)
            .unwrap();
        let dispatcher = RecordingDispatcher(RefCell::new(Vec::new()));
        let err = executor.execute(&ctx, id, &dispatcher, &events).unwrap_err();
        assert!(matches!(err, ContractError::QuorumNotMet { approvals: 0, quorum: 2 }));

        executor.approve(&ctx, a, id).unwrap();
        let err = executor.execute(&ctx, id, &dispatcher, &events).unwrap_err();
        assert!(matches!(err, ContractError::QuorumNotMet { approvals: 1, quorum: 2 }));

        executor.approve(&ctx, b, id).unwrap();
        executor.execute(&ctx, id, &dispatcher, &events).unwrap();
        assert_eq!(dispatcher.0.borrow().len(), 1);

        let err = executor.execute(&ctx, id, &dispatcher, &events).unwrap_err();
        assert!(matches!(err, ContractError::AlreadyExecuted));

        let log = events.drain();
        assert!(log.iter().any(|e| matches!(e, Event::Proposal { action: "proposed", .. })));
        assert!(log.iter().any(|e| matches!(e, Event::Proposal { action: "executed", .. })));
    }
}
