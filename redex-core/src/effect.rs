/*!

`Effect` terms are how the graph reads the outside world. `state` is an abstract condition-keyed map the
host supplies per evaluation call — in practice a `Hashmap` term, but `lookup` only requires that it answer
"what, if anything, is bound to this condition," so `NIL` (no state supplied at all) is handled uniformly
rather than as a special case the caller has to avoid.

*/

use crate::{
  dependency::DependencySet,
  error::HeapResult,
  heap::{Heap, TermId},
};

/// Looks up the value bound to `condition` in `state`, without recording a dependency. `reducer::evaluate`
/// wraps this to additionally fold `condition` itself into the returned dependency set, which is the only
/// thing `Effect`-evaluation adds beyond a plain lookup.
pub fn lookup_value(heap: &Heap, condition: TermId, state: TermId) -> TermId {
  if state.is_nil() {
    return TermId::NIL;
  }
  heap.hashmap_get(state, condition).unwrap_or(TermId::NIL)
}

/// `lookup(condition, state) -> (value, {condition})`. A single condition is already a valid dependency
/// set on its own (a one-leaf `Tree`), so no allocation is needed to build it.
///
/// Returns `None` for a miss rather than folding it into `TermId::NIL` the way `lookup_value` does — a
/// condition can legitimately be bound to the `Nil` term, and `evaluate(Effect{..})` needs to tell that
/// apart from "nothing bound at all" to decide whether to signal.
pub fn lookup(heap: &Heap, condition: TermId, state: TermId) -> HeapResult<(Option<TermId>, DependencySet)> {
  if state.is_nil() {
    return Ok((None, condition));
  }
  Ok((heap.hashmap_get(state, condition), condition))
}
