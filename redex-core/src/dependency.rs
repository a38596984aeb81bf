/*!

A dependency set is a `Tree` whose leaves are `Condition` terms (§3.3). `union` is associative but not
order-preserving, and duplicates are tolerated rather than eagerly deduplicated — the same condition can
appear more than once if two branches both depended on it, and callers that care (e.g. `getStateDependencies`)
dedupe on the way out instead.

*/

use redex_abs::hash::{combine, HashType};

use crate::{
  error::HeapResult,
  heap::{Heap, TermId},
  term::Term,
};

/// A dependency set is represented directly as the `Tree`-of-`Condition` term it denotes; `TermId::NIL`
/// is the empty set.
pub type DependencySet = TermId;

/// `union(a, b)`: returns whichever side is empty, or a fresh `Tree` node joining both.
pub fn union(heap: &mut Heap, a: DependencySet, b: DependencySet) -> HeapResult<DependencySet> {
  if a.is_nil() {
    return Ok(b);
  }
  if b.is_nil() {
    return Ok(a);
  }
  heap.create_tree(a, b)
}

pub fn union3(heap: &mut Heap, a: DependencySet, b: DependencySet, c: DependencySet) -> HeapResult<DependencySet> {
  let ab = union(heap, a, b)?;
  union(heap, ab, c)
}

/// Depth-first, left-before-right traversal yielding every leaf `Condition` handle, duplicates included.
pub fn conditions_of(heap: &Heap, deps: DependencySet, out: &mut Vec<TermId>) {
  if deps.is_nil() {
    return;
  }
  match heap.get(deps) {
    Term::Tree { left, right, .. } => {
      conditions_of(heap, *left, out);
      conditions_of(heap, *right, out);
    }
    Term::Condition(_) => out.push(deps),
    _ => {}
  }
}

/// `getStateDependencies`: the distinct conditions in a dependency set, in first-seen traversal order.
pub fn distinct_conditions(heap: &Heap, deps: DependencySet) -> Vec<TermId> {
  let mut all = Vec::new();
  conditions_of(heap, deps, &mut all);
  let mut distinct: Vec<TermId> = Vec::with_capacity(all.len());
  for condition in all {
    if !distinct.iter().any(|&seen| heap.term_eq(seen, condition)) {
      distinct.push(condition);
    }
  }
  distinct
}

/// The "state-value-hash": the aggregate hash of `state[c]` for every condition `c` in the dependency set,
/// in traversal order. Used by the application cache to validate a fast-path hit against a changed state.
pub fn state_value_hash(heap: &Heap, deps: DependencySet, state: TermId) -> HashType {
  let mut conditions = Vec::new();
  conditions_of(heap, deps, &mut conditions);
  let mut accumulator: HashType = 0;
  for condition in conditions {
    let value = crate::effect::lookup_value(heap, condition, state);
    accumulator = combine(accumulator, heap.hash(value));
  }
  accumulator
}
