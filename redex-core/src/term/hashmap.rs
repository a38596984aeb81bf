/*!

An open-addressed, linear-probed hashmap term. Capacity grows by amortized doubling; entries are never
removed in place (every `insert` produces a fresh bucket array and a fresh term), matching the rest of the
term graph's logical immutability.

Hash and equality deliberately depart from the uniform, derived, structural scheme the rest of the term
model uses:

- the hash is *order-sensitive*, folded over bucket scan order, so two semantically equal maps built via
  different insertion histories can hash differently;
- equality is *probabilistic*: same entry count and same hash is treated as equal, with no fallback deep
  comparison.

Both are retained deliberately as a performance tradeoff rather than "fixed," because the behavior this
replaces already worked this way and tests are written against the documented semantics, not an idealized
one.

*/

use std::rc::Rc;

use redex_abs::hash::{combine, HashType};

use crate::heap::{Heap, TermId};

pub const MIN_CAPACITY: usize = 8;

#[derive(Clone, Copy, Debug)]
pub enum Bucket {
  Empty,
  Occupied(TermId, TermId),
}

#[derive(Clone, Debug)]
pub struct HashmapData {
  pub num_entries: u32,
  pub buckets: Rc<[Bucket]>,
}

impl HashmapData {
  pub fn empty() -> HashmapData {
    HashmapData { num_entries: 0, buckets: Rc::from(vec![Bucket::Empty; MIN_CAPACITY]) }
  }

  pub fn is_empty(&self) -> bool {
    self.num_entries == 0
  }

  /// Smallest allocation-friendly capacity (a power of two, floor `MIN_CAPACITY`) that keeps `num_entries`
  /// entries under a 3/4 load factor.
  fn capacity_for(num_entries: usize) -> usize {
    let needed = (4 * num_entries).div_ceil(3);
    let mut cap = MIN_CAPACITY;
    while cap < needed {
      cap *= 2;
    }
    cap
  }

  /// Probes `buckets` for `key`, inserting `(key, value)`. Returns `true` if this added a new entry,
  /// `false` if it replaced an existing key's value.
  fn probe_insert(heap: &Heap, buckets: &mut [Bucket], key: TermId, value: TermId) -> bool {
    let cap = buckets.len();
    let mut index = (heap.hash(key) as usize) % cap;
    loop {
      match buckets[index] {
        Bucket::Empty => {
          buckets[index] = Bucket::Occupied(key, value);
          return true;
        }
        Bucket::Occupied(existing_key, _) if heap.term_eq(existing_key, key) => {
          buckets[index] = Bucket::Occupied(key, value);
          return false;
        }
        Bucket::Occupied(..) => {
          index = (index + 1) % cap;
        }
      }
    }
  }

  pub fn get(&self, heap: &Heap, key: TermId) -> Option<TermId> {
    let cap = self.buckets.len();
    if cap == 0 {
      return None;
    }
    let mut index = (heap.hash(key) as usize) % cap;
    for _ in 0..cap {
      match self.buckets[index] {
        Bucket::Empty => return None,
        Bucket::Occupied(existing_key, value) if heap.term_eq(existing_key, key) => return Some(value),
        Bucket::Occupied(..) => index = (index + 1) % cap,
      }
    }
    None
  }

  pub fn has(&self, heap: &Heap, key: TermId) -> bool {
    self.get(heap, key).is_some()
  }

  /// Returns a new map with `key` bound to `value`; last-write-wins on key collision.
  pub fn insert(&self, heap: &Heap, key: TermId, value: TermId) -> HashmapData {
    let target_entries = self.num_entries as usize + 1;
    let needed_capacity = Self::capacity_for(target_entries);
    let current_capacity = self.buckets.len();

    if needed_capacity > current_capacity {
      let mut rehashed = vec![Bucket::Empty; needed_capacity];
      for bucket in self.buckets.iter() {
        if let Bucket::Occupied(k, v) = bucket {
          Self::probe_insert(heap, &mut rehashed, *k, *v);
        }
      }
      let is_new = Self::probe_insert(heap, &mut rehashed, key, value);
      HashmapData {
        num_entries: self.num_entries + u32::from(is_new),
        buckets: Rc::from(rehashed),
      }
    } else {
      let mut grown = self.buckets.to_vec();
      let is_new = Self::probe_insert(heap, &mut grown, key, value);
      HashmapData {
        num_entries: self.num_entries + u32::from(is_new),
        buckets: Rc::from(grown),
      }
    }
  }

  /// Builds a map from a sequence of `(key, value)` pairs, last-write-wins, sized once up front.
  pub fn from_entries(heap: &Heap, entries: &[(TermId, TermId)]) -> HashmapData {
    let capacity = Self::capacity_for(entries.len());
    let mut buckets = vec![Bucket::Empty; capacity];
    let mut num_entries = 0u32;
    for &(key, value) in entries {
      if Self::probe_insert(heap, &mut buckets, key, value) {
        num_entries += 1;
      }
    }
    HashmapData { num_entries, buckets: Rc::from(buckets) }
  }

  pub fn entries(&self) -> impl Iterator<Item = (TermId, TermId)> + '_ {
    self.buckets.iter().filter_map(|bucket| match bucket {
      Bucket::Occupied(key, value) => Some((*key, *value)),
      Bucket::Empty => None,
    })
  }

  /// Order-sensitive hash over bucket scan order, folded with the entry count. Takes the raw per-term
  /// hash table rather than `&Heap` so it can run during allocation, before the owning term itself has a
  /// `Heap` to be looked up through.
  pub fn order_sensitive_hash(&self, hashes: &[HashType]) -> HashType {
    let mut accumulator = 0u64;
    for (key, value) in self.entries() {
      accumulator = combine(accumulator, hashes[key.index()]);
      accumulator = combine(accumulator, hashes[value.index()]);
    }
    combine(accumulator, self.num_entries as u64)
  }

  /// The documented "probabilistic" equality: same size and same hash, no deep comparison.
  pub fn probably_equals(&self, self_hash: HashType, other: &HashmapData, other_hash: HashType) -> bool {
    self.num_entries == other.num_entries && self_hash == other_hash
  }
}
