/*!

Structural hashing primitives shared by every part of the term graph.

The core never hashes with the language's default `Hasher` because that hasher's output isn't required to be
stable across calls, and we need a hash that can be combined incrementally as we walk a term's fields (see
`Heap::hash` in `redex-core`). We use a small FNV-1a variant instead: simple, dependency-free, and
referentially transparent.

*/

pub type HashType = u64;

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// Hashes a byte slice with FNV-1a.
#[inline]
pub fn hash_bytes(bytes: &[u8]) -> HashType {
  let mut hash = FNV_OFFSET_BASIS;
  for &byte in bytes {
    hash ^= byte as u64;
    hash = hash.wrapping_mul(FNV_PRIME);
  }
  hash
}

/// Folds a new hash value into an accumulator. Order matters: `combine(a, b) != combine(b, a)` in general,
/// which is what lets a map's bucket-scan-order hash be expressed just by folding entries in iteration
/// order, with no separate canonicalization step.
#[inline(always)]
pub fn combine(accumulator: HashType, value: HashType) -> HashType {
  let mut hash = accumulator ^ value;
  hash = hash.wrapping_mul(FNV_PRIME);
  hash
}

/// Hashes a u64, used for primitives that are already numeric (ints, symbol ids, timestamps, bit patterns of
/// floats).
#[inline(always)]
pub fn hash_u64(value: u64) -> HashType {
  hash_bytes(&value.to_le_bytes())
}
