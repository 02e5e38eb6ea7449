//! Per-transaction rollback: records the pre-transaction value of every
//! slot a transaction touches so a reverted transaction's writes can be
//! undone without disturbing transactions already committed earlier in
//! the same block.
//!
//! Grounded on the teacher's connection-wrapper pattern (one narrow struct
//! owning the backing resource) applied to `Store` instead of a database
//! pool; there is no teacher analogue for transactional rollback itself,
//! since the indexer has no notion of a reversible unit of work.

use std::cell::RefCell;
use std::collections::HashMap;

use meridian_state::{PruneStats, SlotKey, Store};

pub struct RecordingStore<'a> {
    inner: &'a dyn Store,
    /// First-seen value for each touched key, captured before this
    /// transaction's own writes land.
    before: RefCell<HashMap<SlotKey, Option<Vec<u8>>>>,
}

impl<'a> RecordingStore<'a> {
    pub fn new(inner: &'a dyn Store) -> Self {
        Self {
            inner,
            before: RefCell::new(HashMap::new()),
        }
    }

    /// Re-applies every captured pre-transaction value, undoing this
    /// transaction's writes while leaving earlier transactions in the same
    /// block untouched.
    pub fn revert(&self, block: u64) {
        for (key, value) in self.before.borrow_mut().drain() {
            self.inner.write(key, block, value);
        }
    }
}

impl<'a> Store for RecordingStore<'a> {
    fn read_at(&self, key: SlotKey, block: u64) -> Option<Vec<u8>> {
        self.inner.read_at(key, block)
    }

    fn write(&self, key: SlotKey, block: u64, value: Option<Vec<u8>>) {
        self.before
            .borrow_mut()
            .entry(key)
            .or_insert_with(|| self.inner.read_at(key, block));
        self.inner.write(key, block, value);
    }

    fn prune_below(&self, floor: u64) -> PruneStats {
        self.inner.prune_below(floor)
    }

    fn best_block(&self) -> u64 {
        self.inner.best_block()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_state::{Address, Bytes32, InMemoryStore};

    #[test]
    fn revert_restores_pre_transaction_values() {
        let store = InMemoryStore::new();
        let key = (Address::repeat_byte(1), Bytes32::repeat_byte(2));
        store.write(key, 0, Some(vec![1]));

        let recording = RecordingStore::new(&store);
        recording.write(key, 1, Some(vec![2]));
        assert_eq!(recording.read_at(key, 1), Some(vec![2]));

        recording.revert(1);
        assert_eq!(store.read_at(key, 1), Some(vec![1]));
    }

    #[test]
    fn revert_only_restores_first_captured_value_per_key() {
        let store = InMemoryStore::new();
        let key = (Address::repeat_byte(1), Bytes32::repeat_byte(2));
        store.write(key, 0, Some(vec![1]));

        let recording = RecordingStore::new(&store);
        recording.write(key, 1, Some(vec![2]));
        recording.write(key, 1, Some(vec![3]));
        recording.revert(1);
        assert_eq!(store.read_at(key, 1), Some(vec![1]));
    }
}
