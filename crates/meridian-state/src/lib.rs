//! Typed accessors over a key/value storage trie, plus the minimal
//! versioned store they read and write through.
//!
//! Re-exports `primitive_types::{H160 as Address, H256 as Bytes32, U256 as
//! Uint256}` as the canonical chain primitives so every other crate in the
//! workspace imports them from here rather than pulling `primitive-types`
//! directly.

pub mod adapters;
pub mod error;
pub mod gas;
pub mod gas_meter;
pub mod store;

pub use adapters::{AddressAdapter, Bytes32Adapter, ConfigVariable, Ctx, Mapping, RawAdapter, Uint256Adapter};
pub use error::{Result, StateError};
pub use gas_meter::GasMeter;
pub use primitive_types::{H160 as Address, H256 as Bytes32, U256 as Uint256};
pub use store::{InMemoryStore, PruneStats, SlotKey, Store};
