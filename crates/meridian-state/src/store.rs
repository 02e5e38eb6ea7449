//! A minimal versioned key/value store standing in for a content-addressed
//! trie database. It is deliberately not Merkle-hashed and exposes no
//! proofs — its only job is to give the adapters (`adapters.rs`) and the
//! pruner (in `meridian-pruner`) something real to read, write, and prune.
//!
//! Grounded on the connection-wrapper shape of the teacher's
//! `indexer/src/db/connection.rs` (a struct owning the backing resource
//! behind a constructor and a handful of narrow methods), adapted here to
//! an in-process versioned map since there is no external database.

use std::collections::HashMap;

use parking_lot::RwLock;
use primitive_types::H160;
use primitive_types::H256;

/// A single versioned slot key: an account address paired with a 32-byte
/// slot address (already hashed, where applicable, by the caller).
pub type SlotKey = (H160, H256);

/// Abstraction the adapters and the pruner program against, so a real trie
/// implementation can be substituted without touching either.
pub trait Store: Send + Sync {
    /// The value visible at `block`: the most recent write with
    /// `commit_num <= block`, or `None` if no such write exists (including
    /// because it has since been pruned).
    fn read_at(&self, key: SlotKey, block: u64) -> Option<Vec<u8>>;

    /// Record a write at `block`. `value = None` represents clearing the
    /// slot to its zero value.
    fn write(&self, key: SlotKey, block: u64, value: Option<Vec<u8>>);

    /// Discard all versions of every key strictly older than the newest
    /// surviving version `<= floor`. Keeps the invariant that reads at any
    /// block `>= floor` still succeed.
    fn prune_below(&self, floor: u64) -> PruneStats;

    /// Highest block number ever written through `write`.
    fn best_block(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PruneStats {
    pub versions_dropped: u64,
    pub keys_touched: u64,
}

#[derive(Default)]
struct Versions {
    /// Ascending by block number; `write` always appends a block number
    /// greater than or equal to the previous one for a given key.
    entries: Vec<(u64, Option<Vec<u8>>)>,
}

impl Versions {
    fn read_at(&self, block: u64) -> Option<Vec<u8>> {
        match self.entries.partition_point(|(b, _)| *b <= block) {
            0 => None,
            n => self.entries[n - 1].1.clone(),
        }
    }

    fn prune_below(&mut self, floor: u64) -> u64 {
        let keep_from = match self.entries.partition_point(|(b, _)| *b <= floor) {
            0 => return 0,
            n => n - 1,
        };
        let dropped = keep_from;
        self.entries.drain(0..keep_from);
        dropped as u64
    }
}

/// Default `Store` implementation: an in-memory map guarded by a single
/// reader/writer lock. Adequate for a single-process node and for tests;
/// a production deployment would back this trait with a real trie.
#[derive(Default)]
pub struct InMemoryStore {
    slots: RwLock<HashMap<SlotKey, Versions>>,
    best_block: RwLock<u64>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for InMemoryStore {
    fn read_at(&self, key: SlotKey, block: u64) -> Option<Vec<u8>> {
        self.slots.read().get(&key).and_then(|v| v.read_at(block))
    }

    fn write(&self, key: SlotKey, block: u64, value: Option<Vec<u8>>) {
        let mut slots = self.slots.write();
        slots.entry(key).or_default().entries.push((block, value));
        let mut best = self.best_block.write();
        if block > *best {
            *best = block;
        }
    }

    fn prune_below(&self, floor: u64) -> PruneStats {
        let mut slots = self.slots.write();
        let mut stats = PruneStats::default();
        for versions in slots.values_mut() {
            let dropped = versions.prune_below(floor);
            if dropped > 0 {
                stats.versions_dropped += dropped;
                stats.keys_touched += 1;
            }
        }
        stats
    }

    fn best_block(&self) -> u64 {
        *self.best_block.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u8) -> SlotKey {
        (H160::repeat_byte(n), H256::repeat_byte(n))
    }

    #[test]
    fn read_at_returns_latest_version_not_after_block() {
        let store = InMemoryStore::new();
        let k = key(1);
        store.write(k, 10, Some(vec![1]));
        store.write(k, 20, Some(vec![2]));
        assert_eq!(store.read_at(k, 5), None);
        assert_eq!(store.read_at(k, 10), Some(vec![1]));
        assert_eq!(store.read_at(k, 15), Some(vec![1]));
        assert_eq!(store.read_at(k, 20), Some(vec![2]));
        assert_eq!(store.read_at(k, 1000), Some(vec![2]));
    }

    #[test]
    fn prune_below_keeps_window_readable() {
        let store = InMemoryStore::new();
        let k = key(2);
        for b in [10u64, 20, 30, 40] {
            store.write(k, b, Some(vec![b as u8]));
        }
        let stats = store.prune_below(25);
        assert_eq!(stats.keys_touched, 1);
        assert_eq!(stats.versions_dropped, 1);
        assert_eq!(store.read_at(k, 25), Some(vec![20]));
        assert_eq!(store.read_at(k, 10), None);
        assert_eq!(store.read_at(k, 40), Some(vec![40]));
    }
}
