//! Well-known addresses the built-in contracts are installed at, and the
//! param keys governance reads/writes at a fixed slot in `Params`.

use meridian_state::{Address, Bytes32};

pub const PARAMS: Address = Address::repeat_byte(0x01);
pub const AUTHORITY: Address = Address::repeat_byte(0x02);
pub const ENERGY: Address = Address::repeat_byte(0x03);
pub const PROTOTYPE: Address = Address::repeat_byte(0x04);
pub const EXECUTOR: Address = Address::repeat_byte(0x05);
pub const STAKER: Address = Address::repeat_byte(0x06);

/// Returns the `Params` key for a named governance constant. Matches the
/// spec's `pad32(name)` convention closely enough for a non-RLP codec: the
/// name is hashed rather than zero-padded, since slot addressing here goes
/// through `Mapping`'s `blake2b` hashing rather than raw storage.
pub fn param_key(name: &str) -> Bytes32 {
    use blake2::digest::consts::U32;
    use blake2::{Blake2b, Digest};
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(name.as_bytes());
    Bytes32::from_slice(&hasher.finalize())
}

pub const KEY_EXECUTOR_ADDRESS: &str = "executor-address";
pub const KEY_MAX_BLOCK_PROPOSERS: &str = "max-block-proposers";
pub const KEY_ENDORSEMENT: &str = "endorsement";
pub const KEY_VALIDATOR_EVICTION_THRESHOLD: &str = "validator-eviction-threshold";
