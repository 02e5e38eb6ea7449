//! Gas constants for native state access.
//!
//! Every adapter operation is priced as an integer combination of these so
//! that two nodes executing the same block agree bit-for-bit on gas spent.

/// Cost of reading a single storage slot.
pub const SLOAD_GAS: u64 = 200;

/// Cost of writing a previously-zero slot to a nonzero value.
pub const SSTORE_SET_GAS: u64 = 20_000;

/// Cost of writing a previously-nonzero slot (including clearing it to zero).
pub const SSTORE_RESET_GAS: u64 = 5_000;

/// Per-32-byte-word surcharge for `Raw`/`Mapping` values whose encoding
/// exceeds one word. Capped at two billed words regardless of actual size,
/// matching the fixed two-word policy for oversized payloads.
pub const WORD_GAS: u64 = 50;
pub const MAX_BILLED_WORDS: u64 = 2;

pub(crate) fn words_for(len: usize) -> u64 {
    let words = (len as u64 + 31) / 32;
    words.max(1).min(MAX_BILLED_WORDS)
}
