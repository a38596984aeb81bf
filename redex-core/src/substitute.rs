/*!

Substitution (§4.2, §4.4): replacing `Variable` terms by de Bruijn index, either as a pure scope-shift
(`variables == NIL`) or as an instantiation of a prefix of the surrounding scope with concrete values.

Containers short-circuit to "no change" when none of their children changed, which is what preserves
structural sharing — a `Let` whose initializer doesn't mention any of the substituted variables reuses the
same body handle rather than rebuilding an identical copy.

The source represents "no change" with the same sentinel used for "absent," which we can't do here without
ambiguity: a variable can legitimately be replaced *by* the literal `Nil` term, and that must be
distinguishable from "nothing changed." We use `Option<TermId>` instead — `None` for no change, `Some(id)`
for a freshly built (or substituted-in) term, which is exactly the idiomatic Rust reading of "no change."

Both modes walk the same recursion (`go`), parameterized by [`Mode`] and a `cutoff`: the number of binders
(`Lambda`/`Let`) crossed since this particular walk began. `cutoff` is what separates a variable bound
*within* the term currently being walked (leave alone) from one that's free relative to it (act on). For
substitution, `cutoff` doubles as "how many of the outermost bound variables `variables` replaces," which is
the scope_offset the call was seeded with, growing as the walk descends; for a pure shift, `cutoff` starts at
0 and only grows from binders crossed during the shift itself, while the shift amount stays constant — this
separation is what keeps splicing a replacement value's own internal binders from being corrupted by the
shift meant only for its free variables.

*/

use std::rc::Rc;

use crate::{
  error::HeapResult,
  heap::{Heap, TermId},
  term::{condition::Condition, hashmap::HashmapData, iterator::IterKind, Term},
};

#[derive(Clone, Copy)]
enum Mode {
  /// Replace the outermost `count` bound variables with entries from this list.
  Substitute(TermId),
  /// Add this amount to every free variable's index; don't touch locally bound ones.
  Shift(u32),
}

pub fn substitute(heap: &mut Heap, term: TermId, variables: TermId, scope_offset: u32) -> HeapResult<Option<TermId>> {
  if variables.is_nil() {
    go(heap, term, Mode::Shift(scope_offset), 0)
  } else {
    go(heap, term, Mode::Substitute(variables), scope_offset)
  }
}

fn go(heap: &mut Heap, term: TermId, mode: Mode, cutoff: u32) -> HeapResult<Option<TermId>> {
  match heap.get(term).clone() {
    Term::Variable { stack_offset } => substitute_variable(heap, stack_offset, mode, cutoff),

    Term::List(items) => substitute_list(heap, &items, mode, cutoff),

    Term::Record { keys, values } => {
      let new_keys = go(heap, keys, mode, cutoff)?;
      let new_values = go(heap, values, mode, cutoff)?;
      rebuild_if_changed(new_keys, new_values, |k, v| heap.create_record(k, v), keys, values)
    }

    Term::Tree { left, right, .. } => {
      let new_left = go(heap, left, mode, cutoff)?;
      let new_right = go(heap, right, mode, cutoff)?;
      rebuild_if_changed(new_left, new_right, |l, r| heap.create_tree(l, r), left, right)
    }

    Term::Hashmap(data) => substitute_hashmap(heap, data, mode, cutoff, false),
    Term::Hashset(data) => substitute_hashmap(heap, data, mode, cutoff, true),

    Term::Condition(condition) => substitute_condition(heap, condition, mode, cutoff),

    Term::Signal { conditions } => match go(heap, conditions, mode, cutoff)? {
      Some(new_conditions) => heap.create_signal(new_conditions).map(Some),
      None => Ok(None),
    },

    Term::Effect { condition } => match go(heap, condition, mode, cutoff)? {
      Some(new_condition) => heap.create_effect(new_condition).map(Some),
      None => Ok(None),
    },

    Term::Lambda { num_args, body } => match go(heap, body, mode, cutoff + num_args)? {
      Some(new_body) => heap.create_lambda(num_args, new_body).map(Some),
      None => Ok(None),
    },

    Term::Partial { target, bound_args } => {
      let new_target = go(heap, target, mode, cutoff)?;
      let new_args = go(heap, bound_args, mode, cutoff)?;
      rebuild_if_changed(new_target, new_args, |t, a| heap.create_partial(t, a), target, bound_args)
    }

    Term::Constructor { keys } => match go(heap, keys, mode, cutoff)? {
      Some(new_keys) => heap.create_constructor(new_keys).map(Some),
      None => Ok(None),
    },

    Term::Let { initializer, body } => {
      let new_init = go(heap, initializer, mode, cutoff)?;
      let new_body = go(heap, body, mode, cutoff + 1)?;
      rebuild_if_changed(new_init, new_body, |i, b| heap.create_let(i, b), initializer, body)
    }

    Term::Application { target, args, .. } => {
      let new_target = go(heap, target, mode, cutoff)?;
      let new_args = go(heap, args, mode, cutoff)?;
      rebuild_if_changed(new_target, new_args, |t, a| heap.create_application(t, a), target, args)
    }

    Term::LazyResult { value, dependencies } => {
      let new_value = go(heap, value, mode, cutoff)?;
      let new_deps = go(heap, dependencies, mode, cutoff)?;
      rebuild_if_changed(new_value, new_deps, |v, d| heap.create_lazy_result(v, d), value, dependencies)
    }

    Term::Iterator(kind) => substitute_iter_kind(heap, kind, mode, cutoff),

    // Atomic terms (Nil, Boolean, Int, Float, String, Symbol, Timestamp, Builtin, Compiled) have no
    // children and are unaffected by substitution.
    _ => Ok(None),
  }
}

fn substitute_variable(heap: &mut Heap, stack_offset: u32, mode: Mode, cutoff: u32) -> HeapResult<Option<TermId>> {
  match mode {
    Mode::Shift(shift_by) => {
      if shift_by == 0 || stack_offset < cutoff {
        Ok(None)
      } else {
        heap.create_variable(stack_offset + shift_by).map(Some)
      }
    }

    Mode::Substitute(variables) => {
      let replacements = heap.list_items(variables).expect("substitute's `variables` argument must be a List");
      let count = replacements.len() as u32;

      if stack_offset < cutoff {
        Ok(None)
      } else if stack_offset < cutoff + count {
        let index = (count - 1 - (stack_offset - cutoff)) as usize;
        let replacement = replacements[index];
        // The replacement is spliced in at depth `cutoff`: its own free variables need to be shifted by
        // `cutoff` to account for the binders crossed between scope 0 and the splice point, but its own
        // internal binders must not shift — hence a fresh `Shift` walk starting at cutoff 0, not a
        // continuation of this one.
        match go(heap, replacement, Mode::Shift(cutoff), 0)? {
          Some(shifted) => Ok(Some(shifted)),
          None => Ok(Some(replacement)),
        }
      } else if count == 0 {
        Ok(None)
      } else {
        heap.create_variable(stack_offset - count).map(Some)
      }
    }
  }
}

fn substitute_list(heap: &mut Heap, items: &Rc<[TermId]>, mode: Mode, cutoff: u32) -> HeapResult<Option<TermId>> {
  let mut changed = false;
  let mut rebuilt = Vec::with_capacity(items.len());
  for &item in items.iter() {
    match go(heap, item, mode, cutoff)? {
      Some(new_item) => {
        changed = true;
        rebuilt.push(new_item);
      }
      None => rebuilt.push(item),
    }
  }
  if changed {
    heap.create_list(&rebuilt).map(Some)
  } else {
    Ok(None)
  }
}

fn substitute_hashmap(
  heap: &mut Heap,
  data: HashmapData,
  mode: Mode,
  cutoff: u32,
  is_set: bool,
) -> HeapResult<Option<TermId>> {
  let mut changed = false;
  let mut rebuilt = Vec::with_capacity(data.num_entries as usize);
  for (key, value) in data.entries() {
    let new_key = go(heap, key, mode, cutoff)?;
    let new_value = go(heap, value, mode, cutoff)?;
    changed |= new_key.is_some() || new_value.is_some();
    rebuilt.push((new_key.unwrap_or(key), new_value.unwrap_or(value)));
  }
  if !changed {
    return Ok(None);
  }
  // Collisions introduced by substitution collapse last-write-wins, which is exactly what
  // `HashmapData::from_entries` does by construction (§4.4).
  let data = HashmapData::from_entries(heap, &rebuilt);
  let term = if is_set { Term::Hashset(data) } else { Term::Hashmap(data) };
  heap.alloc(term).map(Some)
}

fn substitute_condition(heap: &mut Heap, condition: Condition, mode: Mode, cutoff: u32) -> HeapResult<Option<TermId>> {
  let rebuilt = match condition {
    Condition::Pending | Condition::InvalidPointer => None,
    Condition::Custom { effect_type, payload, token } => {
      let e = go(heap, effect_type, mode, cutoff)?;
      let p = go(heap, payload, mode, cutoff)?;
      let t = go(heap, token, mode, cutoff)?;
      (e.is_some() || p.is_some() || t.is_some()).then(|| Condition::Custom {
        effect_type: e.unwrap_or(effect_type),
        payload: p.unwrap_or(payload),
        token: t.unwrap_or(token),
      })
    }
    Condition::Error { payload } => go(heap, payload, mode, cutoff)?.map(|p| Condition::Error { payload: p }),
    Condition::TypeError { expected_tag, received } => go(heap, received, mode, cutoff)?
        .map(|r| Condition::TypeError { expected_tag, received: r }),
    Condition::InvalidFunctionTarget { target } => go(heap, target, mode, cutoff)?
        .map(|t| Condition::InvalidFunctionTarget { target: t }),
    Condition::InvalidFunctionArgs { target, args } => {
      let t = target.map(|t| go(heap, t, mode, cutoff)).transpose()?.flatten();
      let a = go(heap, args, mode, cutoff)?;
      (t.is_some() || a.is_some()).then(|| Condition::InvalidFunctionArgs {
        target: t.or(target),
        args: a.unwrap_or(args),
      })
    }
  };
  match rebuilt {
    Some(new_condition) => heap.create_condition(new_condition).map(Some),
    None => Ok(None),
  }
}

fn substitute_iter_kind(heap: &mut Heap, kind: IterKind, mode: Mode, cutoff: u32) -> HeapResult<Option<TermId>> {
  let sub = |heap: &mut Heap, id: TermId| go(heap, id, mode, cutoff);

  let rebuilt = match kind {
    IterKind::Empty | IterKind::Range { .. } | IterKind::Integers { .. } => None,
    IterKind::Once(value) => sub(heap, value)?.map(IterKind::Once),
    IterKind::Repeat(value) => sub(heap, value)?.map(IterKind::Repeat),
    IterKind::Map { source, func } => {
      let s = sub(heap, source)?;
      let f = sub(heap, func)?;
      (s.is_some() || f.is_some()).then(|| IterKind::Map { source: s.unwrap_or(source), func: f.unwrap_or(func) })
    }
    IterKind::Filter { source, func } => {
      let s = sub(heap, source)?;
      let f = sub(heap, func)?;
      (s.is_some() || f.is_some()).then(|| IterKind::Filter { source: s.unwrap_or(source), func: f.unwrap_or(func) })
    }
    IterKind::Flatten { source } => sub(heap, source)?.map(|s| IterKind::Flatten { source: s }),
    IterKind::Zip { left, right } => {
      let l = sub(heap, left)?;
      let r = sub(heap, right)?;
      (l.is_some() || r.is_some()).then(|| IterKind::Zip { left: l.unwrap_or(left), right: r.unwrap_or(right) })
    }
    IterKind::Skip { source, count } => sub(heap, source)?.map(|s| IterKind::Skip { source: s, count }),
    IterKind::Take { source, count } => sub(heap, source)?.map(|s| IterKind::Take { source: s, count }),
    IterKind::Intersperse { source, separator } => {
      let s = sub(heap, source)?;
      let sep = sub(heap, separator)?;
      (s.is_some() || sep.is_some()).then(|| IterKind::Intersperse {
        source: s.unwrap_or(source),
        separator: sep.unwrap_or(separator),
      })
    }
    IterKind::Evaluate { source } => sub(heap, source)?.map(|s| IterKind::Evaluate { source: s }),
    IterKind::IndexedAccessor { target, index } => {
      sub(heap, target)?.map(|t| IterKind::IndexedAccessor { target: t, index })
    }
    IterKind::HashmapKeys { map } => sub(heap, map)?.map(|m| IterKind::HashmapKeys { map: m }),
    IterKind::HashmapValues { map } => sub(heap, map)?.map(|m| IterKind::HashmapValues { map: m }),
  };

  match rebuilt {
    Some(new_kind) => heap.create_iterator(new_kind).map(Some),
    None => Ok(None),
  }
}

/// Rebuilds a two-child node only if at least one side changed, falling back to the original handle on
/// the unchanged side.
fn rebuild_if_changed(
  left: Option<TermId>,
  right: Option<TermId>,
  build: impl FnOnce(TermId, TermId) -> HeapResult<TermId>,
  original_left: TermId,
  original_right: TermId,
) -> HeapResult<Option<TermId>> {
  if left.is_none() && right.is_none() {
    return Ok(None);
  }
  build(left.unwrap_or(original_left), right.unwrap_or(original_right)).map(Some)
}
