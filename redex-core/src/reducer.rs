/*!

Normal-order β-reduction by substitution (§4.3). `evaluate` forces a term to head-normal form; `apply`
resolves a call. Strict argument positions are evaluated eagerly and short-circuit to the union of every
`Signal` encountered among them — not just the first — so independent errors in sibling positions surface
together rather than hiding one another.

*/

use crate::{
  builtin::Builtin,
  cache,
  dependency::{self, DependencySet},
  error::{HeapError, HeapResult},
  heap::{Heap, TermId},
  substitute,
  term::{condition::Condition, Tag, Term},
};

/// `evaluate(term, state) -> (value, dependencies)`. Only `Application`, `Effect`, `Let`, and `LazyResult`
/// do anything beyond returning themselves.
pub fn evaluate(heap: &mut Heap, term: TermId, state: TermId) -> HeapResult<(TermId, DependencySet)> {
  match heap.get(term).clone() {
    Term::Let { initializer, body } => {
      let singleton_scope = heap.create_list(&[initializer])?;
      let instantiated = substitute::substitute(heap, body, singleton_scope, 0)?.unwrap_or(body);
      evaluate(heap, instantiated, state)
    }

    Term::LazyResult { value, dependencies } => Ok((value, dependencies)),

    Term::Effect { condition } => {
      let (hit, deps) = crate::effect::lookup(heap, condition, state)?;
      match hit {
        Some(value) => Ok((value, deps)),
        None => {
          let signal = heap.create_signal(deps)?;
          Ok((signal, deps))
        }
      }
    }

    Term::Application { .. } => cache::evaluate_application(heap, term, state),

    _ => Ok((term, heap.nil())),
  }
}

/// `apply(target, args, state) -> (value, dependencies)`.
pub fn apply(heap: &mut Heap, target: TermId, args: TermId, state: TermId) -> HeapResult<(TermId, DependencySet)> {
  match heap.get(target).clone() {
    Term::Signal { .. } => Ok((target, heap.nil())),

    Term::Lambda { num_args, body } => {
      let given = arg_count(heap, args)?;
      if given != num_args {
        return invalid_args(heap, Some(target), args);
      }
      let substituted = substitute::substitute(heap, body, args, 0)?.unwrap_or(body);
      Ok((substituted, heap.nil()))
    }

    Term::Partial { target: inner_target, bound_args } => {
      let mut combined = heap.list_items(bound_args).expect("Partial.bound_args is always a List").to_vec();
      combined.extend(heap.list_items(args).expect("apply's args is always a List").iter());
      let combined_args = heap.create_list(&combined)?;
      apply(heap, inner_target, combined_args, state)
    }

    Term::Constructor { keys } => {
      let key_count = arg_count(heap, keys)?;
      let given = arg_count(heap, args)?;
      if key_count != given {
        return invalid_args(heap, Some(target), args);
      }
      let record = heap.create_record(keys, args)?;
      Ok((record, heap.nil()))
    }

    Term::Builtin(builtin) => apply_builtin(heap, target, builtin, args, state),

    Term::Compiled { target_id, num_args } => {
      let given = arg_count(heap, args)?;
      if given != num_args {
        return invalid_args(heap, Some(target), args);
      }
      apply_compiled(heap, target, target_id, args, state)
    }

    _ => {
      let condition = heap.create_condition(Condition::InvalidFunctionTarget { target })?;
      let signal = heap.create_signal(condition)?;
      Ok((signal, heap.nil()))
    }
  }
}

fn arg_count(heap: &Heap, args: TermId) -> HeapResult<u32> {
  heap.list_len(args).ok_or_else(|| HeapError::invariant("apply's args must be a List term"))
}

fn invalid_args(heap: &mut Heap, target: Option<TermId>, args: TermId) -> HeapResult<(TermId, DependencySet)> {
  let condition = heap.create_condition(Condition::InvalidFunctionArgs { target, args })?;
  let signal = heap.create_signal(condition)?;
  Ok((signal, heap.nil()))
}

/// Externally linked functions registered for `Compiled` targets. The host ABI itself is out of scope; this
/// is just the seam a host plugs into via [`Heap::register_compiled`](crate::heap::Heap::register_compiled).
fn apply_compiled(
  heap: &mut Heap,
  target: TermId,
  target_id: u32,
  args: TermId,
  state: TermId,
) -> HeapResult<(TermId, DependencySet)> {
  match heap.take_compiled_fn(target_id) {
    Some(native) => {
      let arg_items = heap.list_items(args).expect("checked by caller");
      let result = native(heap, &arg_items, state);
      heap.restore_compiled_fn(target_id, native);
      result
    }
    None => {
      let condition = heap.create_condition(Condition::InvalidFunctionTarget { target })?;
      let signal = heap.create_signal(condition)?;
      Ok((signal, heap.nil()))
    }
  }
}

fn apply_builtin(
  heap: &mut Heap,
  target: TermId,
  builtin: Builtin,
  args: TermId,
  state: TermId,
) -> HeapResult<(TermId, DependencySet)> {
  let arg_items = heap.list_items(args).ok_or_else(|| HeapError::invariant("builtin args must be a List"))?;
  if arg_items.len() as u32 != builtin.arity() {
    return invalid_args(heap, Some(target), args);
  }

  let mut deps = heap.nil();
  let mut resolved = Vec::with_capacity(arg_items.len());
  let mut signal_conditions = Vec::new();

  for (position, &raw_arg) in arg_items.iter().enumerate() {
    if builtin.arg_is_strict(position) {
      let (value, step_deps) = evaluate(heap, raw_arg, state)?;
      deps = dependency::union(heap, deps, step_deps)?;
      if let Term::Signal { conditions } = heap.get(value).clone() {
        signal_conditions.push(conditions);
      }
      resolved.push(value);
    } else {
      resolved.push(raw_arg);
    }
  }

  if !signal_conditions.is_empty() {
    let mut unioned = heap.nil();
    for conditions in signal_conditions {
      unioned = dependency::union(heap, unioned, conditions)?;
    }
    let signal = heap.create_signal(unioned)?;
    return Ok((signal, deps));
  }

  evaluate_builtin_body(heap, builtin, &resolved, state, deps)
}

#[derive(Clone, Copy)]
enum Number {
  Int(i64),
  Float(f64),
}

fn as_number(heap: &Heap, id: TermId) -> Option<Number> {
  match heap.get(id) {
    Term::Int(value) => Some(Number::Int(*value)),
    Term::Float(value) => Some(Number::Float(value.0)),
    _ => None,
  }
}

fn type_error(heap: &mut Heap, expected_tag: Tag, received: TermId, deps: DependencySet) -> HeapResult<(TermId, DependencySet)> {
  let condition = heap.create_condition(Condition::TypeError { expected_tag, received })?;
  let signal = heap.create_signal(condition)?;
  Ok((signal, deps))
}

fn evaluate_builtin_body(
  heap: &mut Heap,
  builtin: Builtin,
  resolved: &[TermId],
  state: TermId,
  deps: DependencySet,
) -> HeapResult<(TermId, DependencySet)> {
  use Builtin::*;

  let numeric = |heap: &mut Heap, a: TermId, b: TermId, int_op: fn(i64, i64) -> i64, float_op: fn(f64, f64) -> f64| {
    match (as_number(heap, a), as_number(heap, b)) {
      (Some(Number::Int(x)), Some(Number::Int(y))) => heap.create_int(int_op(x, y)),
      (Some(x), Some(y)) => heap.create_float(float_op(number_as_f64(x), number_as_f64(y))),
      _ => unreachable!("arity/type checked by caller"),
    }
  };

  match builtin {
    Add | Subtract | Multiply | Divide | Modulo => {
      let (a, b) = (resolved[0], resolved[1]);
      match (as_number(heap, a), as_number(heap, b)) {
        (Some(_), Some(_)) => {
          let value = match builtin {
            Add => numeric(heap, a, b, |x, y| x.wrapping_add(y), |x, y| x + y)?,
            Subtract => numeric(heap, a, b, |x, y| x.wrapping_sub(y), |x, y| x - y)?,
            Multiply => numeric(heap, a, b, |x, y| x.wrapping_mul(y), |x, y| x * y)?,
            Divide => numeric(heap, a, b, |x, y| if y == 0 { 0 } else { x / y }, |x, y| x / y)?,
            Modulo => numeric(heap, a, b, |x, y| if y == 0 { 0 } else { x % y }, |x, y| x % y)?,
            _ => unreachable!(),
          };
          Ok((value, deps))
        }
        (None, _) => type_error(heap, Tag::Int, a, deps),
        (_, None) => type_error(heap, Tag::Int, b, deps),
      }
    }

    Negate => match as_number(heap, resolved[0]) {
      Some(Number::Int(x)) => Ok((heap.create_int(-x)?, deps)),
      Some(Number::Float(x)) => Ok((heap.create_float(-x)?, deps)),
      None => type_error(heap, Tag::Int, resolved[0], deps),
    },

    Not => Ok((heap.create_boolean(!heap.is_truthy(resolved[0]))?, deps)),
    And => Ok((heap.create_boolean(heap.is_truthy(resolved[0]) && heap.is_truthy(resolved[1]))?, deps)),
    Or => Ok((heap.create_boolean(heap.is_truthy(resolved[0]) || heap.is_truthy(resolved[1]))?, deps)),

    Equal => Ok((heap.create_boolean(heap.term_eq(resolved[0], resolved[1]))?, deps)),
    NotEqual => Ok((heap.create_boolean(!heap.term_eq(resolved[0], resolved[1]))?, deps)),

    LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
      match (as_number(heap, resolved[0]), as_number(heap, resolved[1])) {
        (Some(x), Some(y)) => {
          let (x, y) = (number_as_f64(x), number_as_f64(y));
          let result = match builtin {
            LessThan => x < y,
            LessThanOrEqual => x <= y,
            GreaterThan => x > y,
            GreaterThanOrEqual => x >= y,
            _ => unreachable!(),
          };
          Ok((heap.create_boolean(result)?, deps))
        }
        (None, _) => type_error(heap, Tag::Int, resolved[0], deps),
        (_, None) => type_error(heap, Tag::Int, resolved[1], deps),
      }
    }

    If => {
      let branch = if heap.is_truthy(resolved[0]) { resolved[1] } else { resolved[2] };
      let (value, step_deps) = evaluate(heap, branch, state)?;
      Ok((value, dependency::union(heap, deps, step_deps)?))
    }

    Length => match heap.get(resolved[0]).clone() {
      Term::List(items) => Ok((heap.create_int(items.len() as i64)?, deps)),
      Term::Str(bytes) => Ok((heap.create_int(bytes.len() as i64)?, deps)),
      Term::Hashmap(data) | Term::Hashset(data) => Ok((heap.create_int(data.num_entries as i64)?, deps)),
      Term::Tree { length, .. } => Ok((heap.create_int(length as i64)?, deps)),
      _ => type_error(heap, Tag::List, resolved[0], deps),
    },

    Get => match heap.hashmap_get(resolved[0], resolved[1]) {
      Some(value) => Ok((value, deps)),
      None => Ok((heap.nil(), deps)),
    },

    Has => Ok((heap.create_boolean(heap.hashmap_has(resolved[0], resolved[1]))?, deps)),

    Keys | Values => match heap.get(resolved[0]).clone() {
      Term::Hashmap(data) | Term::Hashset(data) => {
        let items: Vec<TermId> = data.entries().map(|(k, v)| if matches!(builtin, Keys) { k } else { v }).collect();
        Ok((heap.create_list(&items)?, deps))
      }
      _ => type_error(heap, Tag::Hashmap, resolved[0], deps),
    },

    Concat => match (heap.get(resolved[0]).clone(), heap.get(resolved[1]).clone()) {
      (Term::List(a), Term::List(b)) => {
        let mut combined = a.to_vec();
        combined.extend(b.iter());
        Ok((heap.create_list(&combined)?, deps))
      }
      (Term::Str(a), Term::Str(b)) => {
        let mut combined = a.to_vec();
        combined.extend(b.iter());
        Ok((heap.create_string(&combined)?, deps))
      }
      _ => type_error(heap, Tag::List, resolved[0], deps),
    },
  }
}

fn number_as_f64(number: Number) -> f64 {
  match number {
    Number::Int(value) => value as f64,
    Number::Float(value) => value,
  }
}
