//! Per-account metadata: master role, sponsor selection, and user credit
//! plans for gas-sponsored calls.
//!
//! Grounded on `contracts/src/storage.rs`'s `StorageKey` enum-per-field
//! approach and `contracts/src/tokens.rs`'s admin/master gating pattern.

use meridian_state::{Address, Bytes32, Ctx, Mapping};
use serde::{Deserialize, Serialize};

use crate::error::{ContractError, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct CreditPlan {
    pub credit: u64,
    pub recovery_rate: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct UserCreditState {
    pub used_credit: u64,
    pub last_block_time: u64,
}

pub struct Prototype {
    master: Mapping<Address, Address>,
    credit_plan: Mapping<Address, CreditPlan>,
    user_state: Mapping<(Address, Address), UserCreditState>,
    user_listed: Mapping<(Address, Address), bool>,
    sponsor_listed: Mapping<(Address, Address), bool>,
    current_sponsor: Mapping<Address, Address>,
}

impl Prototype {
    pub fn new(address: Address) -> Self {
        Self {
            master: Mapping::new(address, Bytes32::repeat_byte(0xD0)),
            credit_plan: Mapping::new(address, Bytes32::repeat_byte(0xD1)),
            user_state: Mapping::new(address, Bytes32::repeat_byte(0xD2)),
            user_listed: Mapping::new(address, Bytes32::repeat_byte(0xD3)),
            sponsor_listed: Mapping::new(address, Bytes32::repeat_byte(0xD4)),
            current_sponsor: Mapping::new(address, Bytes32::repeat_byte(0xD5)),
        }
    }

    pub fn master_of(&self, ctx: &Ctx, target: Address) -> Result<Address> {
        Ok(self.master.get(ctx, &target)?)
    }

    pub fn set_master(&self, ctx: &Ctx, caller: Address, target: Address, new_master: Address) -> Result<()> {
        let current = self.master_of(ctx, target)?;
        if caller != current && caller != target {
            return Err(ContractError::Unauthorized { caller });
        }
        self.master.set(ctx, &target, &new_master)?;
        Ok(())
    }

    pub fn set_credit_plan(&self, ctx: &Ctx, caller: Address, target: Address, plan: CreditPlan) -> Result<()> {
        self.require_master(ctx, caller, target)?;
        self.credit_plan.set(ctx, &target, &plan)?;
        Ok(())
    }

    pub fn credit_plan_of(&self, ctx: &Ctx, target: Address) -> Result<CreditPlan> {
        Ok(self.credit_plan.get(ctx, &target)?)
    }

    pub fn add_user(&self, ctx: &Ctx, caller: Address, target: Address, user: Address) -> Result<()> {
        self.require_master(ctx, caller, target)?;
        self.user_listed.set(ctx, &(target, user), &true)?;
        Ok(())
    }

    pub fn remove_user(&self, ctx: &Ctx, caller: Address, target: Address, user: Address) -> Result<()> {
        self.require_master(ctx, caller, target)?;
        self.user_listed.set(ctx, &(target, user), &false)?;
        self.user_state
            .set(ctx, &(target, user), &UserCreditState::default())?;
        Ok(())
    }

    /// `userCredit`: remaining spendable credit for `user` against `target`
    /// at the current block time, clamped to `[0, plan.credit]`.
    pub fn user_credit(&self, ctx: &Ctx, target: Address, user: Address) -> Result<u64> {
        if !self.user_listed.get(ctx, &(target, user))? {
            return Ok(0);
        }
        let plan = self.credit_plan_of(ctx, target)?;
        let state = self.user_state.get(ctx, &(target, user))?;
        let elapsed = ctx.block.saturating_sub(state.last_block_time);
        let recovered = state
            .used_credit
            .saturating_sub(elapsed.saturating_mul(plan.recovery_rate));
        Ok(plan.credit.saturating_sub(recovered.min(plan.credit)))
    }

    /// Records that `user` spent `amount` of `target`'s credit at the
    /// current block time. Called by the packer when a sponsored
    /// transaction is admitted.
    pub fn spend_credit(&self, ctx: &Ctx, target: Address, user: Address, amount: u64) -> Result<()> {
        let available = self.user_credit(ctx, target, user)?;
        if amount > available {
            return Err(ContractError::NotListed {
                what: "insufficient user credit".into(),
            });
        }
        let plan = self.credit_plan_of(ctx, target)?;
        let state = self.user_state.get(ctx, &(target, user))?;
        let elapsed = ctx.block.saturating_sub(state.last_block_time);
        let recovered = state
            .used_credit
            .saturating_sub(elapsed.saturating_mul(plan.recovery_rate));
        let used_now = recovered.min(plan.credit).saturating_add(amount);
        self.user_state.set(
            ctx,
            &(target, user),
            &UserCreditState {
                used_credit: used_now,
                last_block_time: ctx.block,
            },
        )?;
        Ok(())
    }

    pub fn sponsor(&self, ctx: &Ctx, target: Address, sponsor: Address) -> Result<()> {
        self.sponsor_listed.set(ctx, &(target, sponsor), &true)?;
        Ok(())
    }

    pub fn unsponsor(&self, ctx: &Ctx, target: Address, sponsor: Address) -> Result<()> {
        self.sponsor_listed.set(ctx, &(target, sponsor), &false)?;
        Ok(())
    }

    pub fn select_sponsor(&self, ctx: &Ctx, caller: Address, target: Address, sponsor: Address) -> Result<()> {
        self.require_master(ctx, caller, target)?;
        if !self.sponsor_listed.get(ctx, &(target, sponsor))? {
            return Err(ContractError::NotListed {
                what: format!("sponsor {sponsor} for {target}"),
            });
        }
        self.current_sponsor.set(ctx, &target, &sponsor)?;
        Ok(())
    }

    pub fn current_sponsor(&self, ctx: &Ctx, target: Address) -> Result<Address> {
        Ok(self.current_sponsor.get(ctx, &target)?)
    }

    fn require_master(&self, ctx: &Ctx, caller: Address, target: Address) -> Result<()> {
        if caller != self.master_of(ctx, target)? {
            return Err(ContractError::Unauthorized { caller });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_state::{GasMeter, InMemoryStore};

    #[test]
    fn credit_recovers_linearly_and_clamps() {
        let store = InMemoryStore::new();
        let gas = GasMeter::new(10_000_000);
        let mut ctx = Ctx::new(&store, 0, &gas);
        let proto = Prototype::new(Address::repeat_byte(1));
        let target = Address::repeat_byte(2);
        let user = Address::repeat_byte(3);

        proto.master.set(&ctx, &target, &target).unwrap();
        proto
            .set_credit_plan(&ctx, target, target, CreditPlan { credit: 1000, recovery_rate: 10 })
            .unwrap();
        proto.add_user(&ctx, target, target, user).unwrap();
        proto.spend_credit(&ctx, target, user, 1000).unwrap();
        assert_eq!(proto.user_credit(&ctx, target, user).unwrap(), 0);

        ctx.block = 50;
        assert_eq!(proto.user_credit(&ctx, target, user).unwrap(), 500);

        ctx.block = 200;
        assert_eq!(proto.user_credit(&ctx, target, user).unwrap(), 1000);
    }
}
