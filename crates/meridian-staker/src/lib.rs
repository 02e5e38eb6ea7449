//! Validator/delegation lifecycle state machine, period rewards,
//! auto-renew, housekeeping, and the PoA→PoS transition.
//!
//! Grounded on `contracts/src/governance.rs`'s proposal lifecycle shape
//! (create → approve/auto-execute → terminal state, each transition
//! dispatched through one public function per action) and
//! `contracts/src/upgrade.rs`'s period/version bookkeeping
//! (`ContractVersion`, run-once migration guard), generalized here to
//! validation/delegation periods instead of contract upgrades.

pub mod error;
pub mod types;

pub use error::{Result, StakerError};
pub use types::{Delegation, StakingPeriod, Validation, ValidationStatus};

use meridian_builtins::{Event, EventLog};
use meridian_state::{Address, Bytes32, Ctx, Mapping, RawAdapter, Uint256};

fn hash_id(parts: &[&[u8]]) -> Bytes32 {
    use blake2::digest::consts::U32;
    use blake2::{Blake2b, Digest};
    let mut hasher = Blake2b::<U32>::new();
    for p in parts {
        hasher.update(p);
    }
    Bytes32::from_slice(&hasher.finalize())
}

/// Summary of a single `housekeep` pass, surfaced for logging the way the
/// teacher's `ArchivalManager` reports counts of rows touched.
#[derive(Debug, Default, Clone)]
pub struct HousekeepReport {
    pub promoted: u64,
    pub periods_advanced: u64,
    pub evicted: u64,
    pub exited: u64,
    pub rewards_credited: Uint256,
}

pub struct Staker {
    address: Address,
    min_stake: Uint256,
    validations: Mapping<Bytes32, Validation>,
    queued_head: RawAdapter<Bytes32>,
    queued_tail: RawAdapter<Bytes32>,
    active_head: RawAdapter<Bytes32>,
    active_tail: RawAdapter<Bytes32>,
    active_count: RawAdapter<u64>,
    node_taken: Mapping<Address, bool>,
    id_nonce: RawAdapter<u64>,
    delegations: Mapping<Bytes32, Delegation>,
    delegation_counter: RawAdapter<u64>,
    delegation_heads: Mapping<Bytes32, Bytes32>,
    delegation_tails: Mapping<Bytes32, Bytes32>,
    rewards: Mapping<(Bytes32, u64), Uint256>,
    delegator_contract: RawAdapter<Address>,
    transitioned: RawAdapter<bool>,
}

impl Staker {
    pub fn new(address: Address, min_stake: Uint256) -> Self {
        Self {
            address,
            min_stake,
            validations: Mapping::new(address, meridian_state::Bytes32::repeat_byte(0xF0)),
            queued_head: RawAdapter::new(address, meridian_state::Bytes32::repeat_byte(0xF1)),
            queued_tail: RawAdapter::new(address, meridian_state::Bytes32::repeat_byte(0xF2)),
            active_head: RawAdapter::new(address, meridian_state::Bytes32::repeat_byte(0xF3)),
            active_tail: RawAdapter::new(address, meridian_state::Bytes32::repeat_byte(0xF4)),
            active_count: RawAdapter::new(address, meridian_state::Bytes32::repeat_byte(0xF5)),
            node_taken: Mapping::new(address, meridian_state::Bytes32::repeat_byte(0xF6)),
            id_nonce: RawAdapter::new(address, meridian_state::Bytes32::repeat_byte(0xF7)),
            delegations: Mapping::new(address, meridian_state::Bytes32::repeat_byte(0xF8)),
            delegation_counter: RawAdapter::new(address, meridian_state::Bytes32::repeat_byte(0xF9)),
            rewards: Mapping::new(address, meridian_state::Bytes32::repeat_byte(0xFA)),
            delegator_contract: RawAdapter::new(address, meridian_state::Bytes32::repeat_byte(0xFB)),
            transitioned: RawAdapter::new(address, meridian_state::Bytes32::repeat_byte(0xFC)),
            delegation_heads: Mapping::new(address, meridian_state::Bytes32::repeat_byte(0xFD)),
            delegation_tails: Mapping::new(address, meridian_state::Bytes32::repeat_byte(0xFE)),
        }
    }

    pub fn get(&self, ctx: &Ctx, id: Bytes32) -> Result<Validation> {
        let v = self.validations.get(ctx, &id)?;
        if !v.present {
            return Err(StakerError::ValidationNotFound(id));
        }
        Ok(v)
    }

    fn put(&self, ctx: &Ctx, id: Bytes32, v: &Validation) -> Result<()> {
        self.validations.set(ctx, &id, v)?;
        Ok(())
    }

    pub fn set_delegator_contract(&self, ctx: &Ctx, contract: Address) -> Result<()> {
        self.delegator_contract.set(ctx, &contract)?;
        Ok(())
    }

    pub fn add_validation(
        &self,
        ctx: &Ctx,
        endorsor: Address,
        node_master: Address,
        period: StakingPeriod,
        stake: Uint256,
        events: &EventLog,
    ) -> Result<Bytes32> {
        if stake < self.min_stake {
            return Err(StakerError::BelowMinStake);
        }
        if self.node_taken.get(ctx, &node_master)? {
            return Err(StakerError::NodeAlreadyStaking(node_master));
        }
        let nonce = self.id_nonce.get(ctx)?;
        self.id_nonce.set(ctx, &(nonce + 1))?;
        let id = hash_id(&[endorsor.as_bytes(), &nonce.to_be_bytes()]);

        let tail = self.queued_tail.get(ctx)?;
        let validation = Validation {
            endorsor,
            node_master,
            stake,
            status: ValidationStatus::Queued,
            auto_renew: true,
            online: true,
            period,
            start_block: ctx.block,
            exit_block: 0,
            completed_periods: 0,
            offline_since: None,
            delegators_stake: Uint256::zero(),
            delegators_weight: Uint256::zero(),
            withdrawable: Uint256::zero(),
            pending_decrease: Uint256::zero(),
            prev: tail,
            next: Bytes32::zero(),
            present: true,
        };
        self.put(ctx, id, &validation)?;
        if tail.is_zero() {
            self.queued_head.set(ctx, &id)?;
        } else {
            let mut prev = self.get(ctx, tail)?;
            prev.next = id;
            self.put(ctx, tail, &prev)?;
        }
        self.queued_tail.set(ctx, &id)?;
        self.node_taken.set(ctx, &node_master, &true)?;
        events.emit(Event::ValidatorQueued { id });
        Ok(id)
    }

    pub fn increase_stake(
        &self,
        ctx: &Ctx,
        id: Bytes32,
        caller: Address,
        amount: Uint256,
        events: &EventLog,
    ) -> Result<()> {
        let mut v = self.get(ctx, id)?;
        if caller != v.endorsor {
            return Err(StakerError::Unauthorized);
        }
        if !matches!(v.status, ValidationStatus::Queued | ValidationStatus::Active) {
            return Err(StakerError::WrongState);
        }
        v.stake = v.stake.saturating_add(amount);
        self.put(ctx, id, &v)?;
        events.emit(Event::StakeIncreased { id, amount });
        Ok(())
    }

    /// Queued validations shrink immediately. Active validations cannot
    /// shrink their committed stake mid-period: the amount accumulates in
    /// `pending_decrease` and is moved into `withdrawable` by
    /// `advance_periods` once the current period closes.
    pub fn decrease_stake(
        &self,
        ctx: &Ctx,
        id: Bytes32,
        caller: Address,
        amount: Uint256,
        events: &EventLog,
    ) -> Result<()> {
        let mut v = self.get(ctx, id)?;
        if caller != v.endorsor {
            return Err(StakerError::Unauthorized);
        }
        match v.status {
            ValidationStatus::Queued => {
                let new_stake = v.stake.checked_sub(amount).ok_or(StakerError::WrongState)?;
                if new_stake < self.min_stake {
                    return Err(StakerError::BelowMinStake);
                }
                v.stake = new_stake;
            }
            ValidationStatus::Active => {
                let pending = v.pending_decrease.saturating_add(amount);
                let new_stake = v.stake.checked_sub(pending).ok_or(StakerError::WrongState)?;
                if new_stake < self.min_stake {
                    return Err(StakerError::BelowMinStake);
                }
                v.pending_decrease = pending;
            }
            _ => return Err(StakerError::WrongState),
        }
        self.put(ctx, id, &v)?;
        events.emit(Event::StakeDecreased { id, amount });
        Ok(())
    }

    pub fn disable_auto_renew(&self, ctx: &Ctx, id: Bytes32, caller: Address, events: &EventLog) -> Result<()> {
        let mut v = self.get(ctx, id)?;
        if caller != v.endorsor {
            return Err(StakerError::Unauthorized);
        }
        v.auto_renew = false;
        self.put(ctx, id, &v)?;
        events.emit(Event::UpdatedAutoRenew { id, auto_renew: false });
        Ok(())
    }

    pub fn set_online(&self, ctx: &Ctx, id: Bytes32, online: bool) -> Result<()> {
        let mut v = self.get(ctx, id)?;
        if online {
            v.online = true;
            v.offline_since = None;
        } else if v.online {
            v.online = false;
            v.offline_since = Some(ctx.block);
        }
        self.put(ctx, id, &v)?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_delegation(
        &self,
        ctx: &Ctx,
        caller: Address,
        delegator: Address,
        validation_id: Bytes32,
        stake: Uint256,
        auto_renew: bool,
        multiplier: u16,
        events: &EventLog,
    ) -> Result<Bytes32> {
        if caller != self.delegator_contract.get(ctx)? {
            return Err(StakerError::NotDelegatorContract);
        }
        if !(100..=255).contains(&multiplier) {
            return Err(StakerError::InvalidMultiplier);
        }
        let mut v = self.get(ctx, validation_id)?;
        if !matches!(v.status, ValidationStatus::Queued | ValidationStatus::Active) {
            return Err(StakerError::WrongState);
        }
        let counter = self.delegation_counter.get(ctx)?;
        self.delegation_counter.set(ctx, &(counter + 1))?;
        let id = hash_id(&[validation_id.as_bytes(), &counter.to_be_bytes()]);
        let tail = self.delegation_tails.get(ctx, &validation_id)?;
        let delegation = Delegation {
            validation_id,
            delegator,
            stake,
            start_period: v.completed_periods,
            auto_renew,
            multiplier,
            withdrawable: Uint256::zero(),
            prev: tail,
            next: Bytes32::zero(),
            present: true,
        };
        v.delegators_stake = v.delegators_stake.saturating_add(stake);
        v.delegators_weight = v
            .delegators_weight
            .saturating_add(delegation.weighted_stake());
        self.put(ctx, validation_id, &v)?;
        self.delegations.set(ctx, &id, &delegation)?;
        if tail.is_zero() {
            self.delegation_heads.set(ctx, &validation_id, &id)?;
        } else {
            let mut prev = self.load_delegation(ctx, tail)?;
            prev.next = id;
            self.delegations.set(ctx, &tail, &prev)?;
        }
        self.delegation_tails.set(ctx, &validation_id, &id)?;
        events.emit(Event::DelegationAdded { id, validation_id });
        Ok(id)
    }

    /// Flips auto-renew off; the delegation's stake stays weighted into
    /// the validation until the current period closes, at which point
    /// `advance_periods` moves its principal into `withdrawable` and
    /// unlinks it from the validation's delegation list.
    pub fn signal_delegation_exit(&self, ctx: &Ctx, id: Bytes32, caller: Address, events: &EventLog) -> Result<()> {
        let mut d = self.load_delegation(ctx, id)?;
        if caller != d.delegator {
            return Err(StakerError::Unauthorized);
        }
        d.auto_renew = false;
        self.delegations.set(ctx, &id, &d)?;
        events.emit(Event::UpdatedAutoRenew { id, auto_renew: false });
        Ok(())
    }

    fn load_delegation(&self, ctx: &Ctx, id: Bytes32) -> Result<Delegation> {
        let d = self.delegations.get(ctx, &id)?;
        if !d.present {
            return Err(StakerError::DelegationNotFound(id));
        }
        Ok(d)
    }

    pub fn withdraw_stake(&self, ctx: &Ctx, id: Bytes32, caller: Address, events: &EventLog) -> Result<Uint256> {
        let mut v = self.get(ctx, id)?;
        if caller != v.endorsor {
            return Err(StakerError::Unauthorized);
        }
        if v.status != ValidationStatus::Exited {
            return Err(StakerError::WrongState);
        }
        let amount = v.withdrawable;
        if amount.is_zero() {
            return Err(StakerError::NothingWithdrawable);
        }
        v.withdrawable = Uint256::zero();
        v.present = false;
        self.put(ctx, id, &v)?;
        self.node_taken.set(ctx, &v.node_master, &false)?;
        events.emit(Event::ValidatorWithdrawn { id });
        Ok(amount)
    }

    pub fn withdraw_delegation(&self, ctx: &Ctx, id: Bytes32, caller: Address, events: &EventLog) -> Result<Uint256> {
        let mut d = self.load_delegation(ctx, id)?;
        if caller != d.delegator {
            return Err(StakerError::Unauthorized);
        }
        if d.withdrawable.is_zero() {
            return Err(StakerError::NothingWithdrawable);
        }
        let amount = d.withdrawable;
        d.withdrawable = Uint256::zero();
        d.present = false;
        self.delegations.set(ctx, &id, &d)?;
        events.emit(Event::DelegationWithdrawn { id });
        Ok(amount)
    }

    pub fn get_rewards(&self, ctx: &Ctx, id: Bytes32, period: u64) -> Result<Uint256> {
        Ok(self.rewards.get(ctx, &(id, period))?)
    }

    pub fn get_completed_periods(&self, ctx: &Ctx, id: Bytes32) -> Result<u64> {
        Ok(self.get(ctx, id)?.completed_periods)
    }

    pub fn transitioned(&self, ctx: &Ctx) -> Result<bool> {
        Ok(self.transitioned.get(ctx)?)
    }

    /// Walks the active list in order, returning every validation currently
    /// in `Active` status. Used by the packer to build the PoS scheduler's
    /// candidate set each block.
    pub fn active_validations(&self, ctx: &Ctx) -> Result<Vec<(Bytes32, Validation)>> {
        let mut out = Vec::new();
        let mut cursor = self.active_head.get(ctx)?;
        while !cursor.is_zero() {
            let v = self.get(ctx, cursor)?;
            let next = v.next;
            out.push((cursor, v));
            cursor = next;
        }
        Ok(out)
    }

    /// One-shot bootstrap: converts existing Authority candidates into
    /// queued validations endorsed at `min_stake`, for the PoA→PoS
    /// transition described in §4.9/§4.12.
    pub fn transition_from_authority(
        &self,
        ctx: &Ctx,
        candidates: &[(Address, Address)],
        events: &EventLog,
    ) -> Result<()> {
        if self.transitioned.get(ctx)? {
            return Ok(());
        }
        for (node_master, endorsor) in candidates {
            self.add_validation(ctx, *endorsor, *node_master, StakingPeriod::Low, self.min_stake, events)?;
        }
        self.transitioned.set(ctx, &true)?;
        Ok(())
    }

    /// The once-per-block maintenance pass: promotes queued validators
    /// into active slots, advances period counters and credits rewards,
    /// walks auto-renew-disabled validators through cooldown → exited,
    /// and evicts validators that have been offline past the threshold.
    pub fn housekeep(&self, ctx: &Ctx, max_active: u64, eviction_threshold: u64) -> Result<HousekeepReport> {
        let mut report = HousekeepReport::default();
        self.evict(ctx, eviction_threshold, &mut report)?;
        self.advance_periods(ctx, &mut report)?;
        self.promote(ctx, max_active, &mut report)?;
        Ok(report)
    }

    fn promote(&self, ctx: &Ctx, max_active: u64, report: &mut HousekeepReport) -> Result<()> {
        while self.active_count.get(ctx)? < max_active {
            let head = self.queued_head.get(ctx)?;
            if head.is_zero() {
                break;
            }
            let mut v = self.get(ctx, head)?;
            self.unlink_queued(ctx, head, &v)?;
            v.status = ValidationStatus::Active;
            v.start_block = ctx.block;
            v.prev = self.active_tail.get(ctx)?;
            v.next = Bytes32::zero();
            self.link_active_tail(ctx, head, &v)?;
            report.promoted += 1;
        }
        Ok(())
    }

    fn unlink_queued(&self, ctx: &Ctx, id: Bytes32, v: &Validation) -> Result<()> {
        if v.prev.is_zero() {
            self.queued_head.set(ctx, &v.next)?;
        } else {
            let mut prev = self.get(ctx, v.prev)?;
            prev.next = v.next;
            self.put(ctx, v.prev, &prev)?;
        }
        if v.next.is_zero() {
            self.queued_tail.set(ctx, &v.prev)?;
        } else {
            let mut next = self.get(ctx, v.next)?;
            next.prev = v.prev;
            self.put(ctx, v.next, &next)?;
        }
        let _ = id;
        Ok(())
    }

    fn link_active_tail(&self, ctx: &Ctx, id: Bytes32, v: &Validation) -> Result<()> {
        let tail = v.prev;
        self.put(ctx, id, v)?;
        if tail.is_zero() {
            self.active_head.set(ctx, &id)?;
        } else {
            let mut prev = self.get(ctx, tail)?;
            prev.next = id;
            self.put(ctx, tail, &prev)?;
        }
        self.active_tail.set(ctx, &id)?;
        let count = self.active_count.get(ctx)?;
        self.active_count.set(ctx, &(count + 1))?;
        Ok(())
    }

    fn unlink_active(&self, ctx: &Ctx, id: Bytes32, v: &Validation) -> Result<()> {
        if v.prev.is_zero() {
            self.active_head.set(ctx, &v.next)?;
        } else {
            let mut prev = self.get(ctx, v.prev)?;
            prev.next = v.next;
            self.put(ctx, v.prev, &prev)?;
        }
        if v.next.is_zero() {
            self.active_tail.set(ctx, &v.prev)?;
        } else {
            let mut next = self.get(ctx, v.next)?;
            next.prev = v.prev;
            self.put(ctx, v.next, &next)?;
        }
        let count = self.active_count.get(ctx)?;
        self.active_count.set(ctx, &count.saturating_sub(1))?;
        let _ = id;
        Ok(())
    }

    /// Unlinks a single delegation from its validation's per-validation
    /// list without touching the validation's aggregate stake/weight
    /// fields; callers update those themselves.
    fn unlink_delegation(&self, ctx: &Ctx, validation_id: Bytes32, d: &Delegation) -> Result<()> {
        if d.prev.is_zero() {
            self.delegation_heads.set(ctx, &validation_id, &d.next)?;
        } else {
            let mut prev = self.load_delegation(ctx, d.prev)?;
            prev.next = d.next;
            self.delegations.set(ctx, &d.prev, &prev)?;
        }
        if d.next.is_zero() {
            self.delegation_tails.set(ctx, &validation_id, &d.prev)?;
        } else {
            let mut next = self.load_delegation(ctx, d.next)?;
            next.prev = d.prev;
            self.delegations.set(ctx, &d.next, &next)?;
        }
        Ok(())
    }

    /// Credits each delegation attached to `v` its reward share for the
    /// period just closed, at the same per-unit-weight rate the validator
    /// itself earned at. Delegations with auto-renew disabled have their
    /// principal released into `withdrawable` and are unlinked, matching
    /// §4.9's "funds become withdrawable at period end".
    fn settle_delegations(&self, ctx: &Ctx, validation_id: Bytes32, v: &mut Validation, rate_ppm: u64) -> Result<()> {
        let rate = Uint256::from(rate_ppm);
        let scale = Uint256::from(1_000_000u64);
        let mut cursor = self.delegation_heads.get(ctx, &validation_id)?;
        while !cursor.is_zero() {
            let mut d = self.load_delegation(ctx, cursor)?;
            let next = d.next;
            let share = d.weighted_stake() * rate / scale;
            d.withdrawable = d.withdrawable.saturating_add(share);
            if !d.auto_renew {
                v.delegators_stake = v.delegators_stake.saturating_sub(d.stake);
                v.delegators_weight = v.delegators_weight.saturating_sub(d.weighted_stake());
                d.withdrawable = d.withdrawable.saturating_add(d.stake);
                d.stake = Uint256::zero();
                self.unlink_delegation(ctx, validation_id, &d)?;
                d.prev = Bytes32::zero();
                d.next = Bytes32::zero();
            }
            self.delegations.set(ctx, &cursor, &d)?;
            cursor = next;
        }
        Ok(())
    }

    /// Releases every delegation still attached to a validation that has
    /// just exited (cooldown completion or eviction): their principal
    /// becomes withdrawable immediately since the validation no longer
    /// exists to keep earning against.
    fn release_all_delegations(&self, ctx: &Ctx, validation_id: Bytes32) -> Result<()> {
        let mut cursor = self.delegation_heads.get(ctx, &validation_id)?;
        while !cursor.is_zero() {
            let mut d = self.load_delegation(ctx, cursor)?;
            let next = d.next;
            d.withdrawable = d.withdrawable.saturating_add(d.stake);
            d.stake = Uint256::zero();
            d.prev = Bytes32::zero();
            d.next = Bytes32::zero();
            self.delegations.set(ctx, &cursor, &d)?;
            cursor = next;
        }
        self.delegation_heads.set(ctx, &validation_id, &Bytes32::zero())?;
        self.delegation_tails.set(ctx, &validation_id, &Bytes32::zero())?;
        Ok(())
    }

    fn advance_periods(&self, ctx: &Ctx, report: &mut HousekeepReport) -> Result<()> {
        let mut cursor = self.active_head.get(ctx)?;
        while !cursor.is_zero() {
            let mut v = self.get(ctx, cursor)?;
            let next_cursor = v.next;
            let period_len = v.period.blocks();
            if ctx.block >= v.start_block && (ctx.block - v.start_block) > 0 && (ctx.block - v.start_block) % period_len == 0 {
                let rate_ppm = v.period.reward_rate_ppm();
                let rate = Uint256::from(rate_ppm);
                let scale = Uint256::from(1_000_000u64);
                let reward = v.weight() * rate / scale;
                self.rewards.set(ctx, &(cursor, v.completed_periods), &reward)?;
                v.completed_periods += 1;
                report.periods_advanced += 1;
                report.rewards_credited = report.rewards_credited.saturating_add(reward);

                // The validator's own share uses its own stake at the rate
                // that produced `reward`; delegations get their own shares
                // from `settle_delegations` at the same rate.
                let validator_share = v.stake * rate / scale;
                v.withdrawable = v.withdrawable.saturating_add(validator_share);
                self.settle_delegations(ctx, cursor, &mut v, rate_ppm)?;

                if !v.pending_decrease.is_zero() {
                    let dec = v.pending_decrease;
                    v.stake = v.stake.saturating_sub(dec);
                    v.withdrawable = v.withdrawable.saturating_add(dec);
                    v.pending_decrease = Uint256::zero();
                }

                if !v.auto_renew {
                    if v.status == ValidationStatus::Active {
                        v.status = ValidationStatus::Cooldown;
                        self.put(ctx, cursor, &v)?;
                    } else if v.status == ValidationStatus::Cooldown {
                        self.unlink_active(ctx, cursor, &v)?;
                        v.status = ValidationStatus::Exited;
                        v.exit_block = ctx.block;
                        v.withdrawable = v.withdrawable.saturating_add(v.stake);
                        v.stake = Uint256::zero();
                        self.release_all_delegations(ctx, cursor)?;
                        self.put(ctx, cursor, &v)?;
                        report.exited += 1;
                    }
                } else {
                    self.put(ctx, cursor, &v)?;
                }
            }
            cursor = next_cursor;
        }
        Ok(())
    }

    fn evict(&self, ctx: &Ctx, eviction_threshold: u64, report: &mut HousekeepReport) -> Result<()> {
        let mut cursor = self.active_head.get(ctx)?;
        while !cursor.is_zero() {
            let v = self.get(ctx, cursor)?;
            let next_cursor = v.next;
            if let Some(since) = v.offline_since {
                if ctx.block.saturating_sub(since) >= eviction_threshold {
                    let mut v = v;
                    self.unlink_active(ctx, cursor, &v)?;
                    v.status = ValidationStatus::Exited;
                    v.exit_block = ctx.block;
                    v.withdrawable = v.withdrawable.saturating_add(v.stake);
                    v.stake = Uint256::zero();
                    self.release_all_delegations(ctx, cursor)?;
                    self.put(ctx, cursor, &v)?;
                    self.node_taken.set(ctx, &v.node_master, &false)?;
                    report.evicted += 1;
                }
            }
            cursor = next_cursor;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_state::{GasMeter, InMemoryStore};

    fn staker() -> (InMemoryStore, GasMeter) {
        (InMemoryStore::new(), GasMeter::new(100_000_000))
    }

    #[test]
    fn full_lifecycle_queued_active_cooldown_exited_withdraw() {
        let (store, gas) = staker();
        let mut ctx = Ctx::new(&store, 0, &gas);
        let events = EventLog::new();
        let s = Staker::new(Address::repeat_byte(0xF), Uint256::from(1000));
        let endorsor = Address::repeat_byte(1);
        let node = Address::repeat_byte(2);

        let id = s
            .add_validation(&ctx, endorsor, node, StakingPeriod::Low, Uint256::from(1000), &events)
            .unwrap();
        assert_eq!(s.get(&ctx, id).unwrap().status, ValidationStatus::Queued);

        let mut report = s.housekeep(&ctx, 1, 1_000_000).unwrap();
        assert_eq!(report.promoted, 1);
        assert_eq!(s.get(&ctx, id).unwrap().status, ValidationStatus::Active);

        s.disable_auto_renew(&ctx, id, endorsor, &events).unwrap();

        ctx.block = StakingPeriod::Low.blocks();
        report = s.housekeep(&ctx, 1, 1_000_000).unwrap();
        assert_eq!(report.periods_advanced, 1);
        assert_eq!(s.get(&ctx, id).unwrap().status, ValidationStatus::Cooldown);
        // stake=1000, Low rate 2000ppm -> reward = 2, credited into withdrawable now.
        assert_eq!(s.get(&ctx, id).unwrap().withdrawable, Uint256::from(2));

        ctx.block = StakingPeriod::Low.blocks() * 2;
        report = s.housekeep(&ctx, 1, 1_000_000).unwrap();
        assert_eq!(report.exited, 1);
        let v = s.get(&ctx, id).unwrap();
        assert_eq!(v.status, ValidationStatus::Exited);
        // principal (1000) plus two periods' worth of reward (2 each) = 1004.
        assert_eq!(v.withdrawable, Uint256::from(1004));

        let withdrawn = s.withdraw_stake(&ctx, id, endorsor, &events).unwrap();
        assert_eq!(withdrawn, Uint256::from(1004));
        let err = s.withdraw_stake(&ctx, id, endorsor, &events).unwrap_err();
        assert!(matches!(err, StakerError::ValidationNotFound(_)));
    }

    #[test]
    fn withdraw_before_exit_is_rejected() {
        let (store, gas) = staker();
        let ctx = Ctx::new(&store, 0, &gas);
        let events = EventLog::new();
        let s = Staker::new(Address::repeat_byte(0xF), Uint256::from(1000));
        let id = s
            .add_validation(
                &ctx,
                Address::repeat_byte(1),
                Address::repeat_byte(2),
                StakingPeriod::Low,
                Uint256::from(1000),
                &events,
            )
            .unwrap();
        let err = s.withdraw_stake(&ctx, id, Address::repeat_byte(1), &events).unwrap_err();
        assert!(matches!(err, StakerError::WrongState));
    }

    #[test]
    fn duplicate_node_master_is_rejected() {
        let (store, gas) = staker();
        let ctx = Ctx::new(&store, 0, &gas);
        let events = EventLog::new();
        let s = Staker::new(Address::repeat_byte(0xF), Uint256::from(1000));
        let node = Address::repeat_byte(2);
        s.add_validation(&ctx, Address::repeat_byte(1), node, StakingPeriod::Low, Uint256::from(1000), &events)
            .unwrap();
        let err = s
            .add_validation(&ctx, Address::repeat_byte(9), node, StakingPeriod::Low, Uint256::from(1000), &events)
            .unwrap_err();
        assert!(matches!(err, StakerError::NodeAlreadyStaking(_)));
    }

    #[test]
    fn decrease_stake_while_active_defers_into_withdrawable_pool() {
        let (store, gas) = staker();
        let mut ctx = Ctx::new(&store, 0, &gas);
        let events = EventLog::new();
        let s = Staker::new(Address::repeat_byte(0xF), Uint256::from(1000));
        let endorsor = Address::repeat_byte(1);
        let node = Address::repeat_byte(2);
        let id = s
            .add_validation(&ctx, endorsor, node, StakingPeriod::Low, Uint256::from(2000), &events)
            .unwrap();
        s.housekeep(&ctx, 1, 1_000_000).unwrap();
        assert_eq!(s.get(&ctx, id).unwrap().status, ValidationStatus::Active);

        s.decrease_stake(&ctx, id, endorsor, Uint256::from(500), &events).unwrap();
        // Stake is untouched mid-period.
        assert_eq!(s.get(&ctx, id).unwrap().stake, Uint256::from(2000));

        ctx.block = StakingPeriod::Low.blocks();
        s.housekeep(&ctx, 1, 1_000_000).unwrap();
        let v = s.get(&ctx, id).unwrap();
        assert_eq!(v.stake, Uint256::from(1500));
        // reward is computed on the pre-decrease stake: 2000 * 2000ppm = 4.
        assert_eq!(v.withdrawable, Uint256::from(504));
    }

    #[test]
    fn delegation_exit_settles_into_its_own_withdrawable() {
        let (store, gas) = staker();
        let mut ctx = Ctx::new(&store, 0, &gas);
        let events = EventLog::new();
        let s = Staker::new(Address::repeat_byte(0xF), Uint256::from(1000));
        let endorsor = Address::repeat_byte(1);
        let node = Address::repeat_byte(2);
        let delegator_contract = Address::repeat_byte(3);
        let delegator = Address::repeat_byte(4);
        s.set_delegator_contract(&ctx, delegator_contract).unwrap();

        let vid = s
            .add_validation(&ctx, endorsor, node, StakingPeriod::Low, Uint256::from(1000), &events)
            .unwrap();
        s.housekeep(&ctx, 1, 1_000_000).unwrap();

        let did = s
            .add_delegation(&ctx, delegator_contract, delegator, vid, Uint256::from(1000), true, 100, &events)
            .unwrap();

        let err = s.withdraw_delegation(&ctx, did, delegator, &events).unwrap_err();
        assert!(matches!(err, StakerError::NothingWithdrawable));

        s.signal_delegation_exit(&ctx, did, delegator, &events).unwrap();

        ctx.block = StakingPeriod::Low.blocks();
        s.housekeep(&ctx, 1, 1_000_000).unwrap();

        let withdrawn = s.withdraw_delegation(&ctx, did, delegator, &events).unwrap();
        // principal (1000) + one period's reward share (1000 * 2000ppm = 2).
        assert_eq!(withdrawn, Uint256::from(1002));
    }
}
