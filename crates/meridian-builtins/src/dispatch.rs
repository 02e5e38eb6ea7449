//! Native dispatch registry: routes `(contractAddress, selector)` calls to
//! typed handlers instead of executing VM bytecode.
//!
//! Grounded on `contracts/src/router.rs`'s `#[contractimpl]` dispatch (one
//! public method per selector on a single contract struct), generalized
//! into an explicit registry since this workspace intercepts calls across
//! several distinct built-in addresses rather than one contract.

use std::collections::HashMap;

use meridian_state::{Address, Ctx};

use crate::error::{ContractError, Result};

pub type Selector = [u8; 4];

/// A typed native handler: given the calling context, the caller address,
/// and ABI-encoded (here: `bincode`-encoded) call data, produces
/// `bincode`-encoded return data or a domain error.
pub trait NativeHandler: Send + Sync {
    fn call(&self, ctx: &Ctx, caller: Address, data: &[u8]) -> Result<Vec<u8>>;
}

impl<F> NativeHandler for F
where
    F: Fn(&Ctx, Address, &[u8]) -> Result<Vec<u8>> + Send + Sync,
{
    fn call(&self, ctx: &Ctx, caller: Address, data: &[u8]) -> Result<Vec<u8>> {
        (self)(ctx, caller, data)
    }
}

/// Maps `(contract, selector)` to a handler. Registered once at node
/// startup; the VM consults this before attempting to execute bytecode at
/// `contract`, short-circuiting straight to the handler on a hit.
#[derive(Default)]
pub struct NativeRegistry {
    handlers: HashMap<(Address, Selector), Box<dyn NativeHandler>>,
}

impl NativeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, contract: Address, selector: Selector, handler: impl NativeHandler + 'static) {
        self.handlers.insert((contract, selector), Box::new(handler));
    }

    pub fn is_native(&self, contract: Address, selector: Selector) -> bool {
        self.handlers.contains_key(&(contract, selector))
    }

    pub fn dispatch(&self, ctx: &Ctx, contract: Address, selector: Selector, caller: Address, data: &[u8]) -> Result<Vec<u8>> {
        let handler = self
            .handlers
            .get(&(contract, selector))
            .ok_or_else(|| ContractError::NotListed {
                what: format!("native selector {selector:02x?} on {contract}"),
            })?;
        handler.call(ctx, caller, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_state::{GasMeter, InMemoryStore};

    #[test]
    fn unregistered_selector_is_not_native() {
        let registry = NativeRegistry::new();
        let contract = Address::repeat_byte(1);
        assert!(!registry.is_native(contract, [0, 0, 0, 1]));
    }

    #[test]
    fn registered_handler_is_invoked() {
        let store = InMemoryStore::new();
        let gas = GasMeter::new(10_000_000);
        let ctx = Ctx::new(&store, 1, &gas);
        let mut registry = NativeRegistry::new();
        let contract = Address::repeat_byte(1);
        registry.register(contract, [0, 0, 0, 1], |_ctx: &Ctx, _caller, data: &[u8]| {
            Ok(data.to_vec())
        });
        let out = registry
            .dispatch(&ctx, contract, [0, 0, 0, 1], Address::zero(), b"hello")
            .unwrap();
        assert_eq!(out, b"hello");
    }
}
