//! VTHO: a second fungible token whose per-account balance grows linearly
//! between snapshots.
//!
//! Grounded on `contracts/src/storage.rs`'s per-account typed record
//! pattern (read the whole struct, mutate a field, write it back), applied
//! here to a balance/snapshot/share record instead of a swap-nonce.

use meridian_state::{Address, Bytes32, Ctx, Mapping, Uint256};
use serde::{Deserialize, Serialize};

use crate::authority::BalanceSource;
use crate::error::Result;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct EnergyAccount {
    /// Balance as of `snapshot_time`, not including unrealized growth.
    pub balance: Uint256,
    pub snapshot_time: u64,
    /// The VET balance this account held at the snapshot, which growth
    /// accrues against.
    pub share_balance: Uint256,
}

pub struct Energy {
    growth_rate: Uint256,
    scale: Uint256,
    accounts: Mapping<Address, EnergyAccount>,
    transition_time: Option<u64>,
}

impl Energy {
    pub fn new(address: Address, growth_rate: Uint256, scale: Uint256) -> Self {
        Self {
            growth_rate,
            scale,
            accounts: Mapping::new(address, Bytes32::repeat_byte(0xC0)),
            transition_time: None,
        }
    }

    /// Freezes the growth rate at zero from `time` onward, used once the
    /// staker has fully transitioned off time-linear VTHO issuance.
    pub fn with_transition(mut self, time: u64) -> Self {
        self.transition_time = Some(time);
        self
    }

    fn grown_balance(&self, account: &EnergyAccount, at: u64) -> Uint256 {
        let effective_end = match self.transition_time {
            Some(t) if t < at => t,
            _ => at,
        };
        let elapsed = effective_end.saturating_sub(account.snapshot_time);
        if elapsed == 0 || account.share_balance.is_zero() {
            return account.balance;
        }
        let growth = Uint256::from(elapsed) * self.growth_rate * account.share_balance / self.scale;
        account.balance.saturating_add(growth)
    }

    pub fn balance_at(&self, ctx: &Ctx, account: Address, at: u64) -> Result<Uint256> {
        let rec = self.accounts.get(ctx, &account)?;
        Ok(self.grown_balance(&rec, at))
    }

    pub fn balance_of(&self, ctx: &Ctx, account: Address) -> Result<Uint256> {
        self.balance_at(ctx, account, ctx.block)
    }

    /// Realizes accrued growth into `balance` and takes a fresh snapshot;
    /// called whenever the account's VET balance changes, so future growth
    /// is computed against the new share.
    pub fn resnapshot(
        &self,
        ctx: &Ctx,
        account: Address,
        new_share_balance: Uint256,
    ) -> Result<()> {
        let mut rec = self.accounts.get(ctx, &account)?;
        rec.balance = self.grown_balance(&rec, ctx.block);
        rec.snapshot_time = ctx.block;
        rec.share_balance = new_share_balance;
        self.accounts.set(ctx, &account, &rec)?;
        Ok(())
    }

    /// Bootstrap-only credit that sets `balance` directly without
    /// transferring from another account. Mirrors `Params::set_unchecked`:
    /// used only by genesis assembly, where there is no funded source
    /// account to transfer from.
    pub fn mint(&self, ctx: &Ctx, account: Address, amount: Uint256) -> Result<()> {
        let mut rec = self.accounts.get(ctx, &account)?;
        rec.balance = self.grown_balance(&rec, ctx.block).saturating_add(amount);
        rec.snapshot_time = ctx.block;
        self.accounts.set(ctx, &account, &rec)?;
        Ok(())
    }

    pub fn transfer(&self, ctx: &Ctx, from: Address, to: Address, amount: Uint256) -> Result<()> {
        let mut from_rec = self.accounts.get(ctx, &from)?;
        from_rec.balance = self.grown_balance(&from_rec, ctx.block);
        from_rec.snapshot_time = ctx.block;
        if from_rec.balance < amount {
            return Err(crate::error::ContractError::NotListed {
                what: "insufficient energy balance".into(),
            });
        }
        from_rec.balance -= amount;
        self.accounts.set(ctx, &from, &from_rec)?;

        let mut to_rec = self.accounts.get(ctx, &to)?;
        to_rec.balance = self.grown_balance(&to_rec, ctx.block).saturating_add(amount);
        to_rec.snapshot_time = ctx.block;
        self.accounts.set(ctx, &to, &to_rec)?;
        Ok(())
    }
}

impl BalanceSource for Energy {
    fn balance_of(&self, ctx: &Ctx, account: Address) -> Result<Uint256> {
        Energy::balance_of(self, ctx, account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_state::{GasMeter, InMemoryStore};

    #[test]
    fn balance_grows_linearly_between_snapshots() {
        let store = InMemoryStore::new();
        let gas = GasMeter::new(10_000_000);
        let ctx = Ctx::new(&store, 0, &gas);
        let energy = Energy::new(Address::repeat_byte(1), Uint256::from(1), Uint256::from(1));
        let acc = Address::repeat_byte(2);
        energy.resnapshot(&ctx, acc, Uint256::from(1_000)).unwrap();

        assert_eq!(energy.balance_at(&ctx, acc, 0).unwrap(), Uint256::zero());
        assert_eq!(energy.balance_at(&ctx, acc, 10).unwrap(), Uint256::from(10_000));
        assert_eq!(energy.balance_at(&ctx, acc, 100).unwrap(), Uint256::from(100_000));
    }

    #[test]
    fn transfer_moves_accrued_plus_principal() {
        let store = InMemoryStore::new();
        let gas = GasMeter::new(10_000_000);
        let mut ctx = Ctx::new(&store, 0, &gas);
        let energy = Energy::new(Address::repeat_byte(1), Uint256::from(1), Uint256::from(1));
        let a = Address::repeat_byte(2);
        let b = Address::repeat_byte(3);
        energy.resnapshot(&ctx, a, Uint256::from(100)).unwrap();

        ctx.block = 10;
        energy.transfer(&ctx, a, b, Uint256::from(500)).unwrap();
        assert_eq!(energy.balance_at(&ctx, a, 10).unwrap(), Uint256::from(500));
        assert_eq!(energy.balance_at(&ctx, b, 10).unwrap(), Uint256::from(500));
    }
}
