/*!

The host-facing surface (§6). Everything here is a thin wrapper over [`crate::heap::Heap`] and the other
internal modules — construction, `isX`/`getXField` queries, evaluation, and the text/JSON renderings — kept
in one place so a host only ever needs `use redex_core::api::*;` plus a [`Heap`](crate::Heap) to drive the
runtime. No function here ever panics or raises a Rust-level error for a user-facing fault: per §6/§7, every
runtime error is an in-band `Signal` term, not an exception. [`HeapError`](crate::HeapError) is reserved for
host misuse (ill-typed plumbing, heap exhaustion), never for ordinary evaluation failures.

*/

use crate::{
  builtin::Builtin,
  dependency::{self, DependencySet},
  display as term_display,
  error::HeapResult,
  heap::{Heap, TermId},
  json, reducer,
  term::{
    condition::Condition,
    iterator::{self, IterItem, IterKind, IterState},
    Tag, Term,
  },
};

// region Construction

pub fn create_nil() -> TermId {
  TermId::NIL
}

pub fn create_boolean(heap: &mut Heap, value: bool) -> HeapResult<TermId> {
  heap.create_boolean(value)
}

pub fn create_int(heap: &mut Heap, value: i64) -> HeapResult<TermId> {
  heap.create_int(value)
}

pub fn create_float(heap: &mut Heap, value: f64) -> HeapResult<TermId> {
  heap.create_float(value)
}

pub fn create_string(heap: &mut Heap, bytes: &[u8]) -> HeapResult<TermId> {
  heap.create_string(bytes)
}

pub fn create_symbol(heap: &mut Heap, id: u32) -> HeapResult<TermId> {
  heap.create_symbol(id)
}

pub fn create_timestamp(heap: &mut Heap, millis: i64) -> HeapResult<TermId> {
  heap.create_timestamp(millis)
}

pub fn create_empty_list(heap: &Heap) -> TermId {
  heap.empty_list()
}

pub fn create_unit_list(heap: &mut Heap, x: TermId) -> HeapResult<TermId> {
  heap.create_list(&[x])
}

pub fn create_pair(heap: &mut Heap, a: TermId, b: TermId) -> HeapResult<TermId> {
  heap.create_list(&[a, b])
}

pub fn create_triple(heap: &mut Heap, a: TermId, b: TermId, c: TermId) -> HeapResult<TermId> {
  heap.create_list(&[a, b, c])
}

pub fn create_list(heap: &mut Heap, items: &[TermId]) -> HeapResult<TermId> {
  heap.create_list(items)
}

pub fn create_empty_hashmap(heap: &Heap) -> TermId {
  heap.empty_hashmap()
}

pub fn create_hashmap(heap: &mut Heap, entries: &[(TermId, TermId)]) -> HeapResult<TermId> {
  heap.create_hashmap(entries)
}

pub fn create_hashset(heap: &mut Heap, items: &[TermId]) -> HeapResult<TermId> {
  heap.create_hashset(items)
}

pub fn create_tree(heap: &mut Heap, left: TermId, right: TermId) -> HeapResult<TermId> {
  heap.create_tree(left, right)
}

pub fn create_record(heap: &mut Heap, keys: TermId, values: TermId) -> HeapResult<TermId> {
  heap.create_record(keys, values)
}

pub fn create_lambda(heap: &mut Heap, num_args: u32, body: TermId) -> HeapResult<TermId> {
  heap.create_lambda(num_args, body)
}

pub fn create_partial(heap: &mut Heap, target: TermId, bound_args: TermId) -> HeapResult<TermId> {
  heap.create_partial(target, bound_args)
}

pub fn create_builtin(heap: &mut Heap, builtin: Builtin) -> HeapResult<TermId> {
  heap.create_builtin(builtin)
}

pub fn create_compiled(heap: &mut Heap, target_id: u32, num_args: u32) -> HeapResult<TermId> {
  heap.create_compiled(target_id, num_args)
}

pub fn create_variable(heap: &mut Heap, stack_offset: u32) -> HeapResult<TermId> {
  heap.create_variable(stack_offset)
}

pub fn create_let(heap: &mut Heap, initializer: TermId, body: TermId) -> HeapResult<TermId> {
  heap.create_let(initializer, body)
}

pub fn create_application(heap: &mut Heap, target: TermId, args: TermId) -> HeapResult<TermId> {
  heap.create_application(target, args)
}

pub fn create_effect(heap: &mut Heap, condition: TermId) -> HeapResult<TermId> {
  heap.create_effect(condition)
}

pub fn create_signal(heap: &mut Heap, conditions: TermId) -> HeapResult<TermId> {
  heap.create_signal(conditions)
}

pub fn create_custom_condition(heap: &mut Heap, effect_type: TermId, payload: TermId, token: TermId) -> HeapResult<TermId> {
  heap.create_condition(Condition::Custom { effect_type, payload, token })
}

pub fn create_error_condition(heap: &mut Heap, payload: TermId) -> HeapResult<TermId> {
  heap.create_condition(Condition::Error { payload })
}

pub fn create_type_error_condition(heap: &mut Heap, expected_tag: Tag, received: TermId) -> HeapResult<TermId> {
  heap.create_condition(Condition::TypeError { expected_tag, received })
}

pub fn create_invalid_function_target_condition(heap: &mut Heap, target: TermId) -> HeapResult<TermId> {
  heap.create_condition(Condition::InvalidFunctionTarget { target })
}

pub fn create_invalid_function_args_condition(heap: &mut Heap, target: Option<TermId>, args: TermId) -> HeapResult<TermId> {
  heap.create_condition(Condition::InvalidFunctionArgs { target, args })
}

pub fn create_pending_condition(heap: &Heap) -> TermId {
  heap.pending_condition()
}

pub fn create_invalid_pointer_condition(heap: &Heap) -> TermId {
  heap.invalid_pointer_condition()
}

pub fn create_lazy_result(heap: &mut Heap, value: TermId, dependencies: TermId) -> HeapResult<TermId> {
  heap.create_lazy_result(value, dependencies)
}

pub fn create_iterator(heap: &mut Heap, kind: IterKind) -> HeapResult<TermId> {
  heap.create_iterator(kind)
}

// endregion

// region Query: isX / getXField / arity

pub fn is_nil(heap: &Heap, id: TermId) -> bool {
  heap.tag(id) == Tag::Nil
}

macro_rules! is_tag {
  ($name:ident, $tag:ident) => {
    pub fn $name(heap: &Heap, id: TermId) -> bool {
      heap.tag(id) == Tag::$tag
    }
  };
}

is_tag!(is_boolean, Boolean);
is_tag!(is_int, Int);
is_tag!(is_float, Float);
is_tag!(is_string, String);
is_tag!(is_symbol, Symbol);
is_tag!(is_timestamp, Timestamp);
is_tag!(is_list, List);
is_tag!(is_record, Record);
is_tag!(is_tree, Tree);
is_tag!(is_hashmap, Hashmap);
is_tag!(is_hashset, Hashset);
is_tag!(is_condition, Condition);
is_tag!(is_signal, Signal);
is_tag!(is_effect, Effect);
is_tag!(is_builtin, Builtin);
is_tag!(is_compiled, Compiled);
is_tag!(is_lambda, Lambda);
is_tag!(is_partial, Partial);
is_tag!(is_constructor, Constructor);
is_tag!(is_variable, Variable);
is_tag!(is_let, Let);
is_tag!(is_application, Application);
is_tag!(is_lazy_result, LazyResult);
is_tag!(is_iterator, Iterator);

pub fn is_truthy(heap: &Heap, id: TermId) -> bool {
  heap.is_truthy(id)
}

pub fn get_boolean(heap: &Heap, id: TermId) -> Option<bool> {
  match heap.get(id) {
    Term::Boolean(value) => Some(*value),
    _ => None,
  }
}

pub fn get_int(heap: &Heap, id: TermId) -> Option<i64> {
  match heap.get(id) {
    Term::Int(value) => Some(*value),
    _ => None,
  }
}

pub fn get_float(heap: &Heap, id: TermId) -> Option<f64> {
  match heap.get(id) {
    Term::Float(value) => Some(value.0),
    _ => None,
  }
}

pub fn get_string(heap: &Heap, id: TermId) -> Option<std::rc::Rc<[u8]>> {
  match heap.get(id) {
    Term::Str(bytes) => Some(bytes.clone()),
    _ => None,
  }
}

pub fn get_symbol(heap: &Heap, id: TermId) -> Option<u32> {
  match heap.get(id) {
    Term::Symbol(value) => Some(*value),
    _ => None,
  }
}

pub fn get_timestamp(heap: &Heap, id: TermId) -> Option<i64> {
  match heap.get(id) {
    Term::Timestamp(value) => Some(*value),
    _ => None,
  }
}

pub fn get_list_items(heap: &Heap, id: TermId) -> Option<std::rc::Rc<[TermId]>> {
  heap.list_items(id)
}

pub fn get_record_fields(heap: &Heap, id: TermId) -> Option<(TermId, TermId)> {
  match heap.get(id) {
    Term::Record { keys, values } => Some((*keys, *values)),
    _ => None,
  }
}

pub fn get_tree_parts(heap: &Heap, id: TermId) -> Option<(TermId, TermId)> {
  match heap.get(id) {
    Term::Tree { left, right, .. } => Some((*left, *right)),
    _ => None,
  }
}

pub fn get_hashmap_entries(heap: &Heap, id: TermId) -> Option<Vec<(TermId, TermId)>> {
  match heap.get(id) {
    Term::Hashmap(data) | Term::Hashset(data) => Some(data.entries().collect()),
    _ => None,
  }
}

pub fn get_condition(heap: &Heap, id: TermId) -> Option<Condition> {
  match heap.get(id) {
    Term::Condition(condition) => Some(*condition),
    _ => None,
  }
}

pub fn get_signal_conditions(heap: &Heap, id: TermId) -> Option<TermId> {
  match heap.get(id) {
    Term::Signal { conditions } => Some(*conditions),
    _ => None,
  }
}

pub fn get_effect_condition(heap: &Heap, id: TermId) -> Option<TermId> {
  match heap.get(id) {
    Term::Effect { condition } => Some(*condition),
    _ => None,
  }
}

pub fn get_builtin(heap: &Heap, id: TermId) -> Option<Builtin> {
  match heap.get(id) {
    Term::Builtin(builtin) => Some(*builtin),
    _ => None,
  }
}

pub fn get_compiled_parts(heap: &Heap, id: TermId) -> Option<(u32, u32)> {
  match heap.get(id) {
    Term::Compiled { target_id, num_args } => Some((*target_id, *num_args)),
    _ => None,
  }
}

pub fn get_lambda_parts(heap: &Heap, id: TermId) -> Option<(u32, TermId)> {
  match heap.get(id) {
    Term::Lambda { num_args, body } => Some((*num_args, *body)),
    _ => None,
  }
}

pub fn get_partial_parts(heap: &Heap, id: TermId) -> Option<(TermId, TermId)> {
  match heap.get(id) {
    Term::Partial { target, bound_args } => Some((*target, *bound_args)),
    _ => None,
  }
}

pub fn get_constructor_keys(heap: &Heap, id: TermId) -> Option<TermId> {
  match heap.get(id) {
    Term::Constructor { keys } => Some(*keys),
    _ => None,
  }
}

pub fn get_variable_offset(heap: &Heap, id: TermId) -> Option<u32> {
  match heap.get(id) {
    Term::Variable { stack_offset } => Some(*stack_offset),
    _ => None,
  }
}

pub fn get_let_parts(heap: &Heap, id: TermId) -> Option<(TermId, TermId)> {
  match heap.get(id) {
    Term::Let { initializer, body } => Some((*initializer, *body)),
    _ => None,
  }
}

pub fn get_application_parts(heap: &Heap, id: TermId) -> Option<(TermId, TermId)> {
  match heap.get(id) {
    Term::Application { target, args, .. } => Some((*target, *args)),
    _ => None,
  }
}

pub fn get_lazy_result_parts(heap: &Heap, id: TermId) -> Option<(TermId, TermId)> {
  match heap.get(id) {
    Term::LazyResult { value, dependencies } => Some((*value, *dependencies)),
    _ => None,
  }
}

pub fn get_iter_kind(heap: &Heap, id: TermId) -> Option<IterKind> {
  match heap.get(id) {
    Term::Iterator(kind) => Some(*kind),
    _ => None,
  }
}

/// `(n, is_variadic)`. `Constructor` and `Partial` need heap access to resolve their effective arity, unlike
/// every other callable tag, so this can't be answered by [`Term::arity`] alone.
pub fn arity(heap: &Heap, id: TermId) -> (u32, bool) {
  match heap.get(id) {
    Term::Constructor { keys } => (heap.list_len(*keys).unwrap_or(0), false),
    Term::Partial { target, bound_args } => {
      let (target_arity, variadic) = arity(heap, *target);
      let bound = heap.list_len(*bound_args).unwrap_or(0);
      (target_arity.saturating_sub(bound), variadic)
    }
    other => other.arity(),
  }
}

// endregion

// region Evaluation, hashing, equality, rendering

pub fn evaluate(heap: &mut Heap, term: TermId, state: TermId) -> HeapResult<(TermId, DependencySet)> {
  reducer::evaluate(heap, term, state)
}

pub fn apply(heap: &mut Heap, target: TermId, args: TermId, state: TermId) -> HeapResult<(TermId, DependencySet)> {
  reducer::apply(heap, target, args, state)
}

pub fn hash(heap: &Heap, id: TermId) -> u64 {
  heap.hash(id)
}

pub fn equals(heap: &Heap, a: TermId, b: TermId) -> bool {
  heap.term_eq(a, b)
}

/// The `Debug`-style rendering, with container boundaries and variant names visible.
pub fn format(heap: &Heap, id: TermId) -> String {
  term_display::format(heap, id)
}

/// The terse, human-facing rendering.
pub fn display(heap: &Heap, id: TermId) -> String {
  term_display::display(heap, id)
}

pub fn to_json(heap: &Heap, id: TermId) -> Option<String> {
  json::to_json(heap, id)
}

pub fn get_state_dependencies(heap: &Heap, deps: DependencySet) -> Vec<TermId> {
  dependency::distinct_conditions(heap, deps)
}

// endregion

// region Iterator utilities

pub fn size_hint(heap: &Heap, id: TermId) -> HeapResult<Option<u32>> {
  let kind = heap.iter_kind(id)?;
  Ok(kind.size_hint(heap))
}

pub fn next(heap: &mut Heap, id: TermId, state: IterState, host_state: TermId) -> HeapResult<(IterItem, IterState, DependencySet)> {
  let kind = heap.iter_kind(id)?;
  iterator::next(heap, kind, state, host_state)
}

/// Walks `id` to completion, returning the items in traversal order as a fresh `List`, without forcing them.
pub fn collect(heap: &mut Heap, id: TermId, host_state: TermId) -> HeapResult<(TermId, DependencySet)> {
  let kind = heap.iter_kind(id)?;
  let mut state = IterState::Start;
  let mut items = Vec::new();
  let mut deps = heap.nil();
  loop {
    let (item, next_state, step_deps) = iterator::next(heap, kind, state, host_state)?;
    deps = dependency::union(heap, deps, step_deps)?;
    match item {
      IterItem::End => break,
      IterItem::Value(value) => items.push(value),
    }
    state = next_state;
  }
  let list = heap.create_list(&items)?;
  Ok((list, deps))
}

/// Like [`collect`], but evaluates every item against `host_state`. A `Signal` among the evaluated items
/// doesn't stop the walk (§7: "the iteration continues, to surface parallel errors") — every remaining
/// item is still forced so its signals are folded in too, and the final result is the union of every signal
/// encountered rather than a partial list.
pub fn collect_strict(heap: &mut Heap, id: TermId, host_state: TermId) -> HeapResult<(TermId, DependencySet)> {
  let kind = heap.iter_kind(id)?;
  let mut state = IterState::Start;
  let mut items = Vec::new();
  let mut deps = heap.nil();
  let mut signal_conditions = heap.nil();
  let mut saw_signal = false;

  loop {
    let (item, next_state, step_deps) = iterator::next(heap, kind, state, host_state)?;
    deps = dependency::union(heap, deps, step_deps)?;
    match item {
      IterItem::End => break,
      IterItem::Value(value) => {
        let (evaluated, eval_deps) = reducer::evaluate(heap, value, host_state)?;
        deps = dependency::union(heap, deps, eval_deps)?;
        if let Term::Signal { conditions } = heap.get(evaluated).clone() {
          saw_signal = true;
          signal_conditions = dependency::union(heap, signal_conditions, conditions)?;
        } else {
          items.push(evaluated);
        }
      }
    }
    state = next_state;
  }

  if saw_signal {
    let signal = heap.create_signal(signal_conditions)?;
    return Ok((signal, deps));
  }
  let list = heap.create_list(&items)?;
  Ok((list, deps))
}

// endregion

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn equals_and_hash_are_reflexive() {
    let mut heap = Heap::new();
    let a = create_int(&mut heap, 42).unwrap();
    assert!(equals(&heap, a, a));
    assert_eq!(hash(&heap, a), hash(&heap, a));
  }

  #[test]
  fn small_ints_and_variables_intern() {
    let mut heap = Heap::new();
    for n in -1..=9 {
      let a = create_int(&mut heap, n).unwrap();
      let b = create_int(&mut heap, n).unwrap();
      assert_eq!(a, b, "Int({n}) should be a singleton");
    }
    for n in 0..=15 {
      let a = create_variable(&mut heap, n).unwrap();
      let b = create_variable(&mut heap, n).unwrap();
      assert_eq!(a, b, "Variable({n}) should be a singleton");
    }
    assert_eq!(create_empty_list(&heap), heap.empty_list());
    assert_eq!(create_empty_hashmap(&heap), heap.empty_hashmap());
    assert_eq!(create_hashset(&mut heap, &[]).unwrap(), heap.empty_hashset());
    assert_eq!(create_pending_condition(&heap), create_pending_condition(&heap));
  }

  #[test]
  fn nil_is_slot_zero_and_is_the_nil_term() {
    let heap = Heap::new();
    assert!(create_nil().is_nil());
    assert!(is_nil(&heap, create_nil()));
  }

  #[test]
  fn scenario_add_applied_to_a_pair() {
    let mut heap = Heap::new();
    let add = create_builtin(&mut heap, Builtin::Add).unwrap();
    let three = create_int(&mut heap, 3).unwrap();
    let four = create_int(&mut heap, 4).unwrap();
    let args = create_pair(&mut heap, three, four).unwrap();
    let application = create_application(&mut heap, add, args).unwrap();

    let (value, deps) = evaluate(&mut heap, application, TermId::NIL).unwrap();
    assert_eq!(get_int(&heap, value), Some(7));
    assert!(deps.is_nil());
  }

  #[test]
  fn scenario_lambda_beta_reduction_builds_a_hashmap() {
    let mut heap = Heap::new();
    let var2 = create_variable(&mut heap, 2).unwrap();
    let var1 = create_variable(&mut heap, 1).unwrap();
    let var0 = create_variable(&mut heap, 0).unwrap();
    let foo = create_string(&mut heap, b"foo").unwrap();
    let bar = create_string(&mut heap, b"bar").unwrap();
    let baz = create_string(&mut heap, b"baz").unwrap();
    let body = create_hashmap(&mut heap, &[(foo, var2), (bar, var1), (baz, var0)]).unwrap();
    let lambda = create_lambda(&mut heap, 3, body).unwrap();

    let three = create_int(&mut heap, 3).unwrap();
    let four = create_int(&mut heap, 4).unwrap();
    let five = create_int(&mut heap, 5).unwrap();
    let args = create_triple(&mut heap, three, four, five).unwrap();
    let application = create_application(&mut heap, lambda, args).unwrap();

    let (value, _deps) = evaluate(&mut heap, application, TermId::NIL).unwrap();
    assert!(is_hashmap(&heap, value));
    assert_eq!(get_int(&heap, heap.hashmap_get(value, foo).unwrap()), Some(3));
    assert_eq!(get_int(&heap, heap.hashmap_get(value, bar).unwrap()), Some(4));
    assert_eq!(get_int(&heap, heap.hashmap_get(value, baz).unwrap()), Some(5));
  }

  #[test]
  fn scenario_effect_resolved_against_state() {
    let mut heap = Heap::new();
    let effect_type = create_symbol(&mut heap, 123).unwrap();
    let token = create_symbol(&mut heap, 0).unwrap();
    let payload = create_int(&mut heap, 3).unwrap();
    let condition = create_custom_condition(&mut heap, effect_type, payload, token).unwrap();

    let effect = create_effect(&mut heap, condition).unwrap();
    let add = create_builtin(&mut heap, Builtin::Add).unwrap();
    let state = create_hashmap(&mut heap, &[(condition, add)]).unwrap();

    let three = create_int(&mut heap, 3).unwrap();
    let four = create_int(&mut heap, 4).unwrap();
    let args = create_pair(&mut heap, three, four).unwrap();
    let application = create_application(&mut heap, effect, args).unwrap();

    let (value, deps) = evaluate(&mut heap, application, state).unwrap();
    assert_eq!(get_int(&heap, value), Some(7));
    let dependencies = get_state_dependencies(&heap, deps);
    assert_eq!(dependencies, vec![condition]);
  }

  #[test]
  fn scenario_application_cache_follows_state_changes() {
    let mut heap = Heap::new();
    let effect_type_a = create_symbol(&mut heap, 1).unwrap();
    let effect_type_b = create_symbol(&mut heap, 2).unwrap();
    let token = create_symbol(&mut heap, 0).unwrap();
    let payload = create_nil();
    let condition_a = create_custom_condition(&mut heap, effect_type_a, payload, token).unwrap();
    let condition_b = create_custom_condition(&mut heap, effect_type_b, payload, token).unwrap();

    let effect_a = create_effect(&mut heap, condition_a).unwrap();
    let effect_b = create_effect(&mut heap, condition_b).unwrap();
    let add = create_builtin(&mut heap, Builtin::Add).unwrap();
    let args = create_pair(&mut heap, effect_a, effect_b).unwrap();
    let application = create_application(&mut heap, add, args).unwrap();

    let one = create_int(&mut heap, 1).unwrap();
    let six = create_int(&mut heap, 6).unwrap();

    // No state: both effects are unresolved, signal.
    let (first, _) = evaluate(&mut heap, application, TermId::NIL).unwrap();
    assert!(is_signal(&heap, first));

    // Both effects resolved: a real value, cached against this state.
    let full_state = create_hashmap(&mut heap, &[(condition_a, one), (condition_b, six)]).unwrap();
    let (second, deps) = evaluate(&mut heap, application, full_state).unwrap();
    assert_eq!(get_int(&heap, second), Some(7));
    let mut seen = get_state_dependencies(&heap, deps);
    seen.sort_by_key(|id| hash(&heap, *id));
    let mut expected = vec![condition_a, condition_b];
    expected.sort_by_key(|id| hash(&heap, *id));
    assert_eq!(seen, expected);

    // Evaluating again under the same state hits the cache and agrees.
    let (second_repeat, deps_repeat) = evaluate(&mut heap, application, full_state).unwrap();
    assert!(equals(&heap, second, second_repeat));
    assert_eq!(get_state_dependencies(&heap, deps), get_state_dependencies(&heap, deps_repeat));

    // A state that only resolves one effect invalidates the cache and signals again.
    let partial_state = create_hashmap(&mut heap, &[(condition_a, one)]).unwrap();
    let (third, _) = evaluate(&mut heap, application, partial_state).unwrap();
    assert!(is_signal(&heap, third));
  }

  #[test]
  fn scenario_nested_let_subtraction() {
    let mut heap = Heap::new();
    let three = create_int(&mut heap, 3).unwrap();
    let four = create_int(&mut heap, 4).unwrap();
    let var1 = create_variable(&mut heap, 1).unwrap();
    let var0 = create_variable(&mut heap, 0).unwrap();
    let subtract = create_builtin(&mut heap, Builtin::Subtract).unwrap();
    let args = create_pair(&mut heap, var1, var0).unwrap();
    let application = create_application(&mut heap, subtract, args).unwrap();
    let inner_let = create_let(&mut heap, four, application).unwrap();
    let outer_let = create_let(&mut heap, three, inner_let).unwrap();

    let (value, deps) = evaluate(&mut heap, outer_let, TermId::NIL).unwrap();
    assert_eq!(get_int(&heap, value), Some(-1));
    assert!(deps.is_nil());
  }

  #[test]
  fn scenario_signal_absorption_and_union() {
    let mut heap = Heap::new();
    let effect_type = create_symbol(&mut heap, 123).unwrap();
    let token = create_symbol(&mut heap, 0).unwrap();
    let foo = create_string(&mut heap, b"foo").unwrap();
    let condition = create_custom_condition(&mut heap, effect_type, foo, token).unwrap();
    let signal = create_signal(&mut heap, condition).unwrap();

    let add = create_builtin(&mut heap, Builtin::Add).unwrap();
    let three = create_int(&mut heap, 3).unwrap();
    let args = create_pair(&mut heap, three, signal).unwrap();

    let (value, _) = apply(&mut heap, add, args, TermId::NIL).unwrap();
    assert!(equals(&heap, value, signal));

    // Both args a signal: result is the union of both sets of conditions.
    let other_signal = create_signal(&mut heap, condition).unwrap();
    let args_both = create_pair(&mut heap, signal, other_signal).unwrap();
    let (unioned, _) = apply(&mut heap, add, args_both, TermId::NIL).unwrap();
    assert!(is_signal(&heap, unioned));
  }

  #[test]
  fn substitution_identity_when_variables_is_nil_and_scope_offset_zero() {
    let mut heap = Heap::new();
    let lambda_body = {
      let var0 = create_variable(&mut heap, 0).unwrap();
      create_lambda(&mut heap, 1, var0).unwrap()
    };
    let result = crate::substitute::substitute(&mut heap, lambda_body, TermId::NIL, 0).unwrap();
    assert!(result.is_none(), "substitute(t, NIL, 0) should be a no-op for every term");
  }

  #[test]
  fn splicing_a_closed_replacement_into_a_nested_scope_does_not_shift_its_own_binders() {
    let mut heap = Heap::new();
    // identity = \x. x, a closed lambda used as the value being substituted in.
    let identity = {
      let var0 = create_variable(&mut heap, 0).unwrap();
      create_lambda(&mut heap, 1, var0).unwrap()
    };

    // inner_lambda = \y. Variable(1) + Variable(0), one binder below the splice point: Variable(1) is free
    // relative to inner_lambda and is what gets replaced by `identity`; Variable(0) is inner_lambda's own
    // bound variable and must stay `$0`.
    let add = create_builtin(&mut heap, Builtin::Add).unwrap();
    let var1 = create_variable(&mut heap, 1).unwrap();
    let var0 = create_variable(&mut heap, 0).unwrap();
    let args = create_pair(&mut heap, var1, var0).unwrap();
    let application = create_application(&mut heap, add, args).unwrap();
    let inner_lambda = create_lambda(&mut heap, 1, application).unwrap();

    let variables = create_list(&mut heap, &[identity]).unwrap();
    let substituted = crate::substitute::substitute(&mut heap, inner_lambda, variables, 0).unwrap().unwrap();

    let Term::Lambda { body, .. } = heap.get(substituted).clone() else { panic!("expected a Lambda") };
    let Term::Application { args, .. } = heap.get(body).clone() else { panic!("expected an Application") };
    let items = heap.list_items(args).unwrap();
    let spliced = items[0];

    assert!(equals(&heap, spliced, identity), "splicing a closed term must leave it structurally unchanged");
    let Term::Lambda { body: identity_body, .. } = heap.get(spliced).clone() else { panic!("expected a Lambda") };
    assert_eq!(
      get_variable_offset(&heap, identity_body),
      Some(0),
      "the spliced lambda's own bound variable must not be shifted by the splice"
    );
  }

  #[test]
  fn to_json_renders_primitives_and_containers() {
    let mut heap = Heap::new();
    let one = create_int(&mut heap, 1).unwrap();
    let two = create_int(&mut heap, 2).unwrap();
    let list = create_list(&mut heap, &[one, two]).unwrap();
    assert_eq!(to_json(&heap, list).as_deref(), Some("[1,2]"));

    let lambda = create_lambda(&mut heap, 1, one).unwrap();
    assert_eq!(to_json(&heap, lambda), None);
  }

  #[test]
  fn collect_walks_a_range_iterator_to_a_list() {
    let mut heap = Heap::new();
    let iter = create_iterator(&mut heap, IterKind::Range { start: 0, end: Some(3), step: 1 }).unwrap();
    let (list, deps) = collect(&mut heap, iter, TermId::NIL).unwrap();
    let items = get_list_items(&heap, list).unwrap();
    let values: Vec<i64> = items.iter().map(|&id| get_int(&heap, id).unwrap()).collect();
    assert_eq!(values, vec![0, 1, 2]);
    assert!(deps.is_nil());
  }

  #[test]
  fn intersperse_places_a_separator_strictly_between_items_with_none_trailing() {
    let mut heap = Heap::new();
    let source = create_iterator(&mut heap, IterKind::Range { start: 0, end: Some(3), step: 1 }).unwrap();
    let separator = create_int(&mut heap, -1).unwrap();
    let iter = create_iterator(&mut heap, IterKind::Intersperse { source, separator }).unwrap();

    let (list, _deps) = collect(&mut heap, iter, TermId::NIL).unwrap();
    let items = get_list_items(&heap, list).unwrap();
    let values: Vec<i64> = items.iter().map(|&id| get_int(&heap, id).unwrap()).collect();
    assert_eq!(values, vec![0, -1, 1, -1, 2], "separator must alternate between items with no trailing copy");
  }

  #[test]
  fn intersperse_of_a_single_item_emits_no_separator() {
    let mut heap = Heap::new();
    let source = create_iterator(&mut heap, IterKind::Range { start: 5, end: Some(6), step: 1 }).unwrap();
    let separator = create_int(&mut heap, -1).unwrap();
    let iter = create_iterator(&mut heap, IterKind::Intersperse { source, separator }).unwrap();

    let (list, _deps) = collect(&mut heap, iter, TermId::NIL).unwrap();
    let items = get_list_items(&heap, list).unwrap();
    let values: Vec<i64> = items.iter().map(|&id| get_int(&heap, id).unwrap()).collect();
    assert_eq!(values, vec![5]);
  }
}
