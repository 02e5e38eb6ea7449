use std::cell::Cell;

use crate::error::{Result, StateError};

/// Accumulates gas spent by native operations within a single call so the
/// cost of a built-in is observable and identical across nodes executing
/// the same transaction.
pub struct GasMeter {
    limit: u64,
    used: Cell<u64>,
}

impl GasMeter {
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            used: Cell::new(0),
        }
    }

    pub fn used(&self) -> u64 {
        self.used.get()
    }

    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.used.get())
    }

    pub fn charge(&self, amount: u64) -> Result<()> {
        let available = self.remaining();
        if amount > available {
            return Err(StateError::OutOfGas {
                needed: amount,
                available,
            });
        }
        self.used.set(self.used.get() + amount);
        Ok(())
    }
}
