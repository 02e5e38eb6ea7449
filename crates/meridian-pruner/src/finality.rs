//! Abstraction over the external finality collaborator (§1, §4.10): the
//! pruner only needs to know the highest finalized and justified block,
//! not how that determination is made (BFT commit certificate vs.
//! majority-of-proposers reverse scan).

use async_trait::async_trait;

#[async_trait]
pub trait FinalityOracle: Send + Sync {
    async fn finalized(&self) -> u64;
    async fn justified(&self) -> u64;
}

/// Test/ops double: reports a fixed finalized height, or tracks one set
/// externally via `AtomicU64` for scripted tests.
pub struct FixedOracle {
    finalized: std::sync::atomic::AtomicU64,
}

impl FixedOracle {
    pub fn new(finalized: u64) -> Self {
        Self {
            finalized: std::sync::atomic::AtomicU64::new(finalized),
        }
    }

    pub fn advance_to(&self, block: u64) {
        self.finalized.store(block, std::sync::atomic::Ordering::SeqCst);
    }
}

#[async_trait]
impl FinalityOracle for FixedOracle {
    async fn finalized(&self) -> u64 {
        self.finalized.load(std::sync::atomic::Ordering::SeqCst)
    }

    async fn justified(&self) -> u64 {
        self.finalized().await
    }
}

/// Optimistic placeholder for the real BFT finality collaborator (§1):
/// reports the store's own chain tip as finalized. A production
/// deployment replaces this with a client of the actual consensus engine,
/// which lags the tip by the commit-certificate delay; this stand-in is
/// only correct when no such engine is present, e.g. the single-process
/// `meridian-node run` wiring before P2P/consensus integration lands.
pub struct TrackingOracle<S: meridian_state::Store> {
    store: std::sync::Arc<S>,
}

impl<S: meridian_state::Store> TrackingOracle<S> {
    pub fn new(store: std::sync::Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: meridian_state::Store> FinalityOracle for TrackingOracle<S> {
    async fn finalized(&self) -> u64 {
        self.store.best_block()
    }

    async fn justified(&self) -> u64 {
        self.finalized().await
    }
}
