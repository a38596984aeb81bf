/*!

The per-`Application` memoization cell (§3.4, §4.5). Each `Application` instance remembers the last result
it produced together with two digests of the state it was computed against: an "overall" hash of the whole
state term (cheap to check, but invalidated by any unrelated state change) and a "minimal" hash of just the
dependency set resolved against that state (slower to check, but survives state changes the computation
never actually read). A miss on both monotonically discards the cache rather than trying to patch it,
since state is assumed to only move forward.

*/

use redex_abs::log;

use crate::{
  dependency::{self, DependencySet},
  error::HeapResult,
  heap::{Heap, TermId},
  reducer,
  term::ApplicationCache,
};

pub fn evaluate_application(heap: &mut Heap, application: TermId, state: TermId) -> HeapResult<(TermId, DependencySet)> {
  let (target, args, cache) = heap.application_parts(application)?;

  if !cache.value.is_nil() {
    let overall_hash = heap.hash(state);

    if cache.overall_state_hash == Some(overall_hash) {
      log::trace!(?application, "application cache fast-path hit");
      return Ok((cache.value, cache.dependencies));
    }

    let minimal_hash = dependency::state_value_hash(heap, cache.dependencies, state);
    if cache.minimal_state_hash == Some(minimal_hash) {
      log::trace!(?application, "application cache validated hit");
      heap.set_application_cache(
        application,
        ApplicationCache { overall_state_hash: Some(overall_hash), ..cache },
      );
      return Ok((cache.value, cache.dependencies));
    }

    log::trace!(?application, "application cache discarded");
    heap.set_application_cache(application, ApplicationCache::default());
  }

  let (resolved_target, deps_target) = reducer::evaluate(heap, target, state)?;
  let (intermediate, deps_apply) = reducer::apply(heap, resolved_target, args, state)?;
  let (value, deps_eval) = reducer::evaluate(heap, intermediate, state)?;
  let deps = dependency::union3(heap, deps_target, deps_apply, deps_eval)?;

  let overall_hash = heap.hash(state);
  let minimal_hash = dependency::state_value_hash(heap, deps, state);
  heap.set_application_cache(
    application,
    ApplicationCache {
      value,
      dependencies: deps,
      overall_state_hash: Some(overall_hash),
      minimal_state_hash: Some(minimal_hash),
    },
  );

  Ok((value, deps))
}
