//! Governance-settable constants, keyed by name and guarded by the
//! executor address itself stored at a well-known key.
//!
//! Grounded on `contracts/src/storage.rs::get_instance_config`, which
//! bundles a handful of named config reads behind one accessor; here the
//! values live in a `Mapping` rather than instance storage because the
//! spec requires them addressable by an arbitrary caller-supplied key,
//! not just a fixed struct.

use meridian_state::{Address, Bytes32, Ctx, Mapping, Uint256};

use crate::addresses::{self, KEY_MAX_BLOCK_PROPOSERS};
use crate::error::{ContractError, Result};
use crate::events::{Event, EventLog};

pub struct Params {
    address: Address,
    values: Mapping<Bytes32, Uint256>,
    locked: Mapping<Bytes32, Uint256>,
}

impl Params {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            values: Mapping::new(address, Bytes32::repeat_byte(0xA0)),
            locked: Mapping::new(address, Bytes32::repeat_byte(0xA1)),
        }
    }

    pub fn get(&self, ctx: &Ctx, key: Bytes32) -> Result<Uint256> {
        Ok(self.values.get(ctx, &key)?)
    }

    /// Returns the address currently installed as `executor-address`, or
    /// the zero address before genesis has set it.
    pub fn executor(&self, ctx: &Ctx) -> Result<Address> {
        let raw = self.get(ctx, addresses::param_key(addresses::KEY_EXECUTOR_ADDRESS))?;
        let mut bytes = [0u8; 32];
        raw.to_big_endian(&mut bytes);
        Ok(Address::from_slice(&bytes[12..]))
    }

    /// Governance write, gated on the caller being the registered executor.
    /// `MaxBlockProposers` additionally rejects any write once the
    /// governance lock has been engaged for that key.
    pub fn set(&self, ctx: &Ctx, caller: Address, key: Bytes32, value: Uint256, events: &EventLog) -> Result<()> {
        let executor = self.executor(ctx)?;
        if caller != executor {
            return Err(ContractError::NotExecutor { caller });
        }
        if key == addresses::param_key(KEY_MAX_BLOCK_PROPOSERS)
            && self.locked.get(ctx, &key)?.as_u64() != 0
        {
            return Err(ContractError::ParamLocked);
        }
        self.values.set(ctx, &key, &value)?;
        events.emit(Event::ParamSet { key, value });
        Ok(())
    }

    /// One-shot call used by genesis/governance to freeze a key against
    /// further mutation. Mirrors the teacher's lock-on-first-mutation
    /// governance-config pattern.
    pub fn lock(&self, ctx: &Ctx, key: Bytes32) -> Result<()> {
        self.locked.set(ctx, &key, &Uint256::from(1u64))?;
        Ok(())
    }

    /// Bootstrap write used only by genesis assembly, bypassing the
    /// executor check since no executor is registered yet.
    pub fn set_unchecked(&self, ctx: &Ctx, key: Bytes32, value: Uint256) -> Result<()> {
        self.values.set(ctx, &key, &value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_state::{GasMeter, InMemoryStore};

    #[test]
    fn executor_gated_set_rejects_other_callers() {
        let store = InMemoryStore::new();
        let gas = GasMeter::new(1_000_000);
        let ctx = Ctx::new(&store, 1, &gas);
        let params = Params::new(addresses::PARAMS);
        let exec = Address::repeat_byte(9);
        let events = EventLog::new();
        params
            .set_unchecked(
                &ctx,
                addresses::param_key(addresses::KEY_EXECUTOR_ADDRESS),
                Uint256::from_big_endian(exec.as_bytes()),
            )
            .unwrap();
        assert_eq!(params.executor(&ctx).unwrap(), exec);

        let key = addresses::param_key("some-constant");
        let err = params
            .set(&ctx, Address::repeat_byte(1), key, Uint256::from(5), &events)
            .unwrap_err();
        assert!(matches!(err, ContractError::NotExecutor { .. }));

        params.set(&ctx, exec, key, Uint256::from(5), &events).unwrap();
        assert_eq!(params.get(&ctx, key).unwrap(), Uint256::from(5));
        assert_eq!(events.drain().len(), 1);
    }

    #[test]
    fn locked_max_block_proposers_rejects_further_writes() {
        let store = InMemoryStore::new();
        let gas = GasMeter::new(1_000_000);
        let ctx = Ctx::new(&store, 1, &gas);
        let params = Params::new(addresses::PARAMS);
        let exec = Address::repeat_byte(9);
        let events = EventLog::new();
        params
            .set_unchecked(
                &ctx,
                addresses::param_key(addresses::KEY_EXECUTOR_ADDRESS),
                Uint256::from_big_endian(exec.as_bytes()),
            )
            .unwrap();
        let key = addresses::param_key(KEY_MAX_BLOCK_PROPOSERS);
        params.set(&ctx, exec, key, Uint256::from(101), &events).unwrap();
        params.lock(&ctx, key).unwrap();
        let err = params.set(&ctx, exec, key, Uint256::from(1), &events).unwrap_err();
        assert!(matches!(err, ContractError::ParamLocked));
    }
}
