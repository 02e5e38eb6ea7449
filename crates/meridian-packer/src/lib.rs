//! Ties the scheduler, the staker's housekeeping pass, and native-call
//! dispatch together into the block-proposal path.
//!
//! Grounded on the teacher's `indexer/src/lib.rs` orchestrator shape (a
//! thin struct wrapping the collaborators a long-running service drives)
//! and `indexer/src/bin/stellarroute-indexer.rs`'s top-level
//! initialize-then-loop structure, generalized here from "poll Horizon,
//! write to Postgres" to "ask the scheduler for a slot, run housekeeping,
//! apply admitted calls".

pub mod checkpoint;
pub mod error;

pub use error::{PackerError, Result};

use meridian_builtins::{Authority, Energy, Event, EventLog, NativeRegistry};
use meridian_genesis::spec::ForkConfig;
use meridian_scheduler::{poa::PoaSchedule, poa::PoaVariant, pos::PosSchedule, Proposer, ProposerSchedule, ScheduleUpdate};
use meridian_staker::Staker;
use meridian_state::{Address, Ctx, GasMeter, Store};
use tracing::{info, warn};

/// A transaction already admitted by the (out-of-scope) tx-pool/VM
/// boundary: a native call ready to dispatch. The packer does not decode
/// or validate calldata beyond routing it to the registered handler.
#[derive(Debug, Clone)]
pub struct NativeCall {
    pub contract: Address,
    pub selector: [u8; 4],
    pub caller: Address,
    pub data: Vec<u8>,
}

/// Summary of one `propose_block` pass, enough for the caller to seal and
/// broadcast a header plus log a summary the way the teacher's indexing
/// loop logs rows processed.
#[derive(Debug, Default)]
pub struct ProposedBlock {
    pub time: u64,
    pub applied: usize,
    pub reverted: usize,
    pub housekeep: meridian_staker::HousekeepReport,
    pub schedule_update: ScheduleUpdate,
    pub events: Vec<Event>,
}

pub struct PackerConfig {
    pub block_interval: u64,
    pub max_block_proposers: u64,
    pub eviction_threshold: u64,
    pub min_endorsement: meridian_state::Uint256,
    pub fork: ForkConfig,
    pub poa_variant: PoaVariant,
}

pub struct Packer<S: Store> {
    store: S,
    authority: Authority,
    staker: Staker,
    energy: Energy,
    registry: NativeRegistry,
    config: PackerConfig,
    events: EventLog,
}

impl<S: Store> Packer<S> {
    pub fn new(
        store: S,
        authority: Authority,
        staker: Staker,
        energy: Energy,
        registry: NativeRegistry,
        config: PackerConfig,
    ) -> Self {
        Self {
            store,
            authority,
            staker,
            energy,
            registry,
            config,
            events: EventLog::new(),
        }
    }

    /// True once the chain has passed the `hayabusa` fork height and the
    /// staker's one-shot PoA→PoS transition has run; selects which
    /// scheduler variant backs this block.
    fn pos_active(&self, ctx: &Ctx, block: u64) -> Result<bool> {
        let past_fork = self.config.fork.hayabusa.map(|h| block >= h).unwrap_or(false);
        Ok(past_fork && self.staker.transitioned(ctx)?)
    }

    fn proposers(&self, ctx: &Ctx, pos: bool) -> Result<Vec<Proposer>> {
        if pos {
            Ok(self
                .staker
                .active_validations(ctx)?
                .into_iter()
                .map(|(_, v)| Proposer {
                    address: v.node_master,
                    weight: v.weight().as_u64(),
                    active: v.online,
                })
                .collect())
        } else {
            Ok(self
                .authority
                .candidates(ctx, &self.energy, self.config.min_endorsement, usize::MAX)?
                .into_iter()
                .map(|(master, rec)| Proposer {
                    address: master,
                    weight: 0,
                    active: rec.active,
                })
                .collect())
        }
    }

    /// Builds and applies one block at or after `now`, for `producer`,
    /// against the parent header's `parent_time`. Housekeeping runs before
    /// any admitted call, matching §5's fixed-position requirement; each
    /// call gets its own rollback checkpoint so one reverted transaction
    /// does not poison the rest of the block.
    pub fn propose_block(
        &self,
        producer: Address,
        parent_time: u64,
        now: u64,
        gas_limit: u64,
        calls: &[NativeCall],
    ) -> Result<ProposedBlock> {
        let block = self.store.best_block().max(parent_time);
        let gas = GasMeter::new(gas_limit);
        let ctx = Ctx::new(&self.store, block, &gas);
        let pos = self.pos_active(&ctx, block)?;
        let proposers = self.proposers(&ctx, pos)?;

        let scheduler: Box<dyn ProposerSchedule> = if pos {
            Box::new(PosSchedule::new(self.config.block_interval, fork_seed(&self.config.fork)))
        } else {
            Box::new(PoaSchedule::new(self.config.block_interval, self.config.poa_variant))
        };

        let time = scheduler.schedule(&proposers, producer, parent_time, now)?;
        let gas = GasMeter::new(gas_limit);
        let seal_ctx = Ctx::new(&self.store, time, &gas);

        let housekeep =
            self.staker
                .housekeep(&seal_ctx, self.config.max_block_proposers, self.config.eviction_threshold)?;

        let mut applied = 0;
        let mut reverted = 0;
        for call in calls {
            let recording = checkpoint::RecordingStore::new(&self.store);
            let tx_gas = GasMeter::new(gas_limit);
            let tx_ctx = Ctx::new(&recording, time, &tx_gas);
            match self
                .registry
                .dispatch(&tx_ctx, call.contract, call.selector, call.caller, &call.data)
            {
                Ok(_) => applied += 1,
                Err(e) => {
                    warn!(contract = %call.contract, error = %e, "transaction reverted");
                    recording.revert(time);
                    reverted += 1;
                }
            }
        }

        let proposers = self.proposers(&seal_ctx, pos)?;
        let schedule_update = scheduler.updates(&proposers, producer, parent_time, time)?;
        for (master, active) in &schedule_update.flips {
            if pos {
                // PoS activity flips are recorded on the validation's
                // `online` flag via `set_online`, not `Authority::update`.
                if let Some((id, _)) = self
                    .staker
                    .active_validations(&seal_ctx)?
                    .into_iter()
                    .find(|(_, v)| v.node_master == *master)
                {
                    self.staker.set_online(&seal_ctx, id, *active)?;
                }
            } else {
                self.authority.update(&seal_ctx, *master, *active, &self.events)?;
            }
        }

        info!(
            time,
            applied,
            reverted,
            promoted = housekeep.promoted,
            score = schedule_update.score,
            "proposed block"
        );

        Ok(ProposedBlock {
            time,
            applied,
            reverted,
            housekeep,
            schedule_update,
            events: self.events.drain(),
        })
    }
}

fn fork_seed(fork: &ForkConfig) -> [u8; 32] {
    let mut seed = [0u8; 32];
    seed[..8].copy_from_slice(&fork.hayabusa.unwrap_or(0).to_be_bytes());
    seed
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_builtins::addresses;
    use meridian_state::{InMemoryStore, Uint256};

    fn config() -> PackerConfig {
        PackerConfig {
            block_interval: 10,
            max_block_proposers: 3,
            eviction_threshold: 1_000,
            min_endorsement: Uint256::zero(),
            fork: ForkConfig::default(),
            poa_variant: PoaVariant::V1,
        }
    }

    #[test]
    fn poa_block_promotes_candidate_and_flips_activity() {
        let store = InMemoryStore::new();
        let authority = Authority::new(addresses::AUTHORITY);
        let staker = Staker::new(addresses::STAKER, Uint256::from(1000));
        let energy = Energy::new(addresses::ENERGY, Uint256::from(1), Uint256::from(1));
        let registry = NativeRegistry::new();

        {
            let gas = GasMeter::new(10_000_000);
            let ctx = Ctx::new(&store, 0, &gas);
            let node = Address::repeat_byte(1);
            let events = meridian_builtins::EventLog::new();
            authority
                .add(&ctx, node, node, meridian_state::Bytes32::repeat_byte(1), None, &events)
                .unwrap();
            authority.update(&ctx, node, true, &events).unwrap();
        }

        let packer = Packer::new(store, authority, staker, energy, registry, config());
        let node = Address::repeat_byte(1);
        let result = packer.propose_block(node, 0, 10, 10_000_000, &[]).unwrap();
        assert_eq!(result.time, 10);
    }
}
