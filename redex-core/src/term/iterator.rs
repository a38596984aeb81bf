/*!

The iterator protocol: a uniform lazy-sequence abstraction shared by list/hashmap traversal, range and
repeat generators, and the transformers (`map`, `filter`, `zip`, ...) built on top of them.

Every variant implements `next(state, host_state) -> (item | END, next_state, dependencies)`. `state` is
opaque to callers; on the first call it is [`IterState::Start`]. We back it with a small recursive enum
rather than a heap cell, per the allowance that implementers may use "a typed per-iterator-variant enum."

*/

use crate::{
  dependency::{self, DependencySet},
  error::HeapResult,
  heap::{Heap, TermId},
  reducer,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IterKind {
  Empty,
  Once(TermId),
  Range { start: i64, end: Option<i64>, step: i64 },
  Repeat(TermId),
  Integers { start: i64 },
  Map { source: TermId, func: TermId },
  Filter { source: TermId, func: TermId },
  Flatten { source: TermId },
  Zip { left: TermId, right: TermId },
  Skip { source: TermId, count: u32 },
  Take { source: TermId, count: u32 },
  Intersperse { source: TermId, separator: TermId },
  Evaluate { source: TermId },
  IndexedAccessor { target: TermId, index: u32 },
  HashmapKeys { map: TermId },
  HashmapValues { map: TermId },
}

impl IterKind {
  /// A cheap upper/exact bound on remaining items, when statically knowable.
  pub fn size_hint(&self, heap: &Heap) -> Option<u32> {
    match self {
      IterKind::Empty => Some(0),
      IterKind::Once(_) => Some(1),
      IterKind::Range { start, end: Some(end), step } if *step != 0 => {
        let span = end - start;
        if (span > 0) == (*step > 0) {
          Some((span / step).unsigned_abs() as u32)
        } else {
          Some(0)
        }
      }
      IterKind::Range { end: None, .. } | IterKind::Repeat(_) | IterKind::Integers { .. } => None,
      IterKind::IndexedAccessor { target, index } => {
        heap.list_len(*target).map(|len| len.saturating_sub(*index))
      }
      IterKind::HashmapKeys { map } | IterKind::HashmapValues { map } => heap.hashmap_len(*map),
      _ => None,
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IterState {
  Start,
  Done,
  Counter(i64),
  Inner(Box<IterState>),
  CounterInner(i64, Box<IterState>),
  PairInner(Box<IterState>, Box<IterState>),
  /// Intersperse's bookkeeping: an item already pulled from `source` and confirmed to exist but not yet
  /// emitted, whether the separator is due before handing it back, and the source state from which it was
  /// pulled.
  Buffered(Option<TermId>, bool, Box<IterState>),
  /// Flatten's bookkeeping: the current inner iterator term (if any), the outer source's state, and that
  /// inner iterator's own state.
  Nested(Option<TermId>, Box<IterState>, Box<IterState>),
}

pub enum IterItem {
  Value(TermId),
  End,
}

/// Advances any iterator term by one step.
pub fn next(heap: &mut Heap, kind: IterKind, state: IterState, host_state: TermId) -> HeapResult<(IterItem, IterState, DependencySet)> {
  if matches!(state, IterState::Done) {
    return Ok((IterItem::End, IterState::Done, heap.nil()));
  }

  match kind {
    IterKind::Empty => Ok((IterItem::End, IterState::Done, heap.nil())),

    IterKind::Once(value) => match state {
      IterState::Start => Ok((IterItem::Value(value), IterState::Done, heap.nil())),
      _ => Ok((IterItem::End, IterState::Done, heap.nil())),
    },

    IterKind::Repeat(value) => Ok((IterItem::Value(value), IterState::Start, heap.nil())),

    IterKind::Range { start, end, step } => {
      let cursor = match state {
        IterState::Start => start,
        IterState::Counter(n) => n,
        _ => return Err(crate::error::HeapError::invariant("malformed Range iterator state")),
      };
      let exhausted = match end {
        Some(limit) if step > 0 => cursor >= limit,
        Some(limit) => cursor <= limit,
        None => false,
      };
      if step == 0 || exhausted {
        return Ok((IterItem::End, IterState::Done, heap.nil()));
      }
      let item = heap.create_int(cursor)?;
      Ok((IterItem::Value(item), IterState::Counter(cursor + step), heap.nil()))
    }

    IterKind::Integers { start } => next(heap, IterKind::Range { start, end: None, step: 1 }, state, host_state),

    IterKind::IndexedAccessor { target, index } => {
      let position = match state {
        IterState::Start => index,
        IterState::Counter(n) => n as u32,
        _ => return Err(crate::error::HeapError::invariant("malformed IndexedAccessor state")),
      };
      match heap.list_item(target, position as usize) {
        Some(item) => Ok((IterItem::Value(item), IterState::Counter(position as i64 + 1), heap.nil())),
        None => Ok((IterItem::End, IterState::Done, heap.nil())),
      }
    }

    IterKind::HashmapKeys { map } => next_hashmap_field(heap, map, state, true),
    IterKind::HashmapValues { map } => next_hashmap_field(heap, map, state, false),

    IterKind::Map { source, func } => {
      let inner_state = unwrap_inner(state);
      let source_kind = heap.iter_kind(source)?;
      let (item, next_inner, deps1) = next(heap, source_kind, inner_state, host_state)?;
      match item {
        IterItem::End => Ok((IterItem::End, IterState::Done, deps1)),
        IterItem::Value(value) => {
          let args = heap.create_list(&[value])?;
          let (applied, deps2) = reducer::apply(heap, func, args, host_state)?;
          let (evaluated, deps3) = reducer::evaluate(heap, applied, host_state)?;
          let deps = dependency::union3(heap, deps1, deps2, deps3)?;
          Ok((IterItem::Value(evaluated), IterState::Inner(Box::new(next_inner)), deps))
        }
      }
    }

    IterKind::Filter { source, func } => {
      let mut inner_state = unwrap_inner(state);
      let source_kind = heap.iter_kind(source)?;
      let mut accumulated = heap.nil();
      loop {
        let (item, next_inner, step_deps) = next(heap, source_kind, inner_state, host_state)?;
        accumulated = dependency::union(heap, accumulated, step_deps)?;
        match item {
          IterItem::End => return Ok((IterItem::End, IterState::Done, accumulated)),
          IterItem::Value(value) => {
            let args = heap.create_list(&[value])?;
            let (applied, deps2) = reducer::apply(heap, func, args, host_state)?;
            let (predicate, deps3) = reducer::evaluate(heap, applied, host_state)?;
            accumulated = dependency::union3(heap, accumulated, deps2, deps3)?;
            if heap.is_truthy(predicate) {
              return Ok((IterItem::Value(value), IterState::Inner(Box::new(next_inner)), accumulated));
            }
            inner_state = next_inner;
          }
        }
      }
    }

    IterKind::Skip { source, count } => {
      let (skipped, mut inner_state) = match state {
        IterState::Start => (0u32, IterState::Start),
        IterState::CounterInner(n, inner) => (n as u32, *inner),
        _ => return Err(crate::error::HeapError::invariant("malformed Skip state")),
      };
      let source_kind = heap.iter_kind(source)?;
      let mut accumulated = heap.nil();
      let mut remaining = count.saturating_sub(skipped);
      while remaining > 0 {
        let (item, next_inner, step_deps) = next(heap, source_kind, inner_state, host_state)?;
        accumulated = dependency::union(heap, accumulated, step_deps)?;
        inner_state = next_inner;
        match item {
          IterItem::End => return Ok((IterItem::End, IterState::Done, accumulated)),
          IterItem::Value(_) => remaining -= 1,
        }
      }
      let (item, next_inner, step_deps) = next(heap, source_kind, inner_state, host_state)?;
      accumulated = dependency::union(heap, accumulated, step_deps)?;
      match item {
        IterItem::End => Ok((IterItem::End, IterState::Done, accumulated)),
        IterItem::Value(value) => {
          Ok((IterItem::Value(value), IterState::CounterInner(count as i64, Box::new(next_inner)), accumulated))
        }
      }
    }

    IterKind::Take { source, count } => {
      let (taken, inner_state) = match state {
        IterState::Start => (0u32, IterState::Start),
        IterState::CounterInner(n, inner) => (n as u32, *inner),
        _ => return Err(crate::error::HeapError::invariant("malformed Take state")),
      };
      if taken >= count {
        return Ok((IterItem::End, IterState::Done, heap.nil()));
      }
      let source_kind = heap.iter_kind(source)?;
      let (item, next_inner, deps) = next(heap, source_kind, inner_state, host_state)?;
      match item {
        IterItem::End => Ok((IterItem::End, IterState::Done, deps)),
        IterItem::Value(value) => {
          Ok((IterItem::Value(value), IterState::CounterInner(taken as i64 + 1, Box::new(next_inner)), deps))
        }
      }
    }

    IterKind::Zip { left, right } => {
      let (left_state, right_state) = match state {
        IterState::Start => (IterState::Start, IterState::Start),
        IterState::PairInner(l, r) => (*l, *r),
        _ => return Err(crate::error::HeapError::invariant("malformed Zip state")),
      };
      let left_kind = heap.iter_kind(left)?;
      let right_kind = heap.iter_kind(right)?;
      let (left_item, left_next, deps1) = next(heap, left_kind, left_state, host_state)?;
      let (right_item, right_next, deps2) = next(heap, right_kind, right_state, host_state)?;
      let deps = dependency::union(heap, deps1, deps2)?;
      match (left_item, right_item) {
        (IterItem::Value(l), IterItem::Value(r)) => {
          let pair = heap.create_list(&[l, r])?;
          Ok((IterItem::Value(pair), IterState::PairInner(Box::new(left_next), Box::new(right_next)), deps))
        }
        _ => Ok((IterItem::End, IterState::Done, deps)),
      }
    }

    IterKind::Intersperse { source, separator } => {
      let (pending, separator_due, inner_state) = match state {
        IterState::Start => (None, false, IterState::Start),
        IterState::Buffered(pending, separator_due, inner) => (pending, separator_due, *inner),
        _ => return Err(crate::error::HeapError::invariant("malformed Intersperse state")),
      };

      if separator_due {
        let pending_value = pending.expect("separator_due implies a value was already pulled");
        return Ok((
          IterItem::Value(separator),
          IterState::Buffered(Some(pending_value), false, Box::new(inner_state)),
          heap.nil(),
        ));
      }

      let source_kind = heap.iter_kind(source)?;

      // Either `pending` already holds the value to emit this call (its separator was just emitted), or
      // this is the first call and we need to pull it fresh.
      let (value, after_value, mut deps) = match pending {
        Some(value) => (value, inner_state, heap.nil()),
        None => match next(heap, source_kind, inner_state, host_state)? {
          (IterItem::End, _, deps) => return Ok((IterItem::End, IterState::Done, deps)),
          (IterItem::Value(value), after_value, deps) => (value, after_value, deps),
        },
      };

      // Peek one item ahead to know whether a separator (and a further item) follows `value`, which is
      // what keeps this combinator from emitting a trailing separator after the last item.
      let (peeked, after_peek, peek_deps) = next(heap, source_kind, after_value, host_state)?;
      deps = dependency::union(heap, deps, peek_deps)?;
      match peeked {
        IterItem::End => Ok((IterItem::Value(value), IterState::Done, deps)),
        IterItem::Value(next_value) => Ok((
          IterItem::Value(value),
          IterState::Buffered(Some(next_value), true, Box::new(after_peek)),
          deps,
        )),
      }
    }

    IterKind::Evaluate { source } => {
      let inner_state = unwrap_inner(state);
      let source_kind = heap.iter_kind(source)?;
      let (item, next_inner, deps1) = next(heap, source_kind, inner_state, host_state)?;
      match item {
        IterItem::End => Ok((IterItem::End, IterState::Done, deps1)),
        IterItem::Value(value) => {
          let (evaluated, deps2) = reducer::evaluate(heap, value, host_state)?;
          let deps = dependency::union(heap, deps1, deps2)?;
          Ok((IterItem::Value(evaluated), IterState::Inner(Box::new(next_inner)), deps))
        }
      }
    }

    IterKind::Flatten { source } => {
      let (mut current_inner_iter, outer_state, inner_state) = match state {
        IterState::Start => (None, IterState::Start, IterState::Start),
        IterState::Nested(cur, outer, inner) => (cur, *outer, *inner),
        _ => return Err(crate::error::HeapError::invariant("malformed Flatten state")),
      };
      let source_kind = heap.iter_kind(source)?;
      let mut outer_state = outer_state;
      let mut inner_state = inner_state;
      let mut accumulated = heap.nil();

      loop {
        if current_inner_iter.is_none() {
          let (item, next_outer, step_deps) = next(heap, source_kind, outer_state, host_state)?;
          accumulated = dependency::union(heap, accumulated, step_deps)?;
          outer_state = next_outer;
          match item {
            IterItem::End => return Ok((IterItem::End, IterState::Done, accumulated)),
            IterItem::Value(inner_iter_term) => {
              current_inner_iter = Some(inner_iter_term);
              inner_state = IterState::Start;
            }
          }
        }

        let inner_iter_term = current_inner_iter.expect("just ensured Some above");
        let inner_kind = heap.iter_kind(inner_iter_term)?;
        let (item, next_inner, step_deps) = next(heap, inner_kind, inner_state, host_state)?;
        accumulated = dependency::union(heap, accumulated, step_deps)?;
        match item {
          IterItem::End => {
            current_inner_iter = None;
            continue;
          }
          IterItem::Value(value) => {
            let next_state = IterState::Nested(Some(inner_iter_term), Box::new(outer_state), Box::new(next_inner));
            return Ok((IterItem::Value(value), next_state, accumulated));
          }
        }
      }
    }
  }
}

fn unwrap_inner(state: IterState) -> IterState {
  match state {
    IterState::Start => IterState::Start,
    IterState::Inner(inner) => *inner,
    other => other,
  }
}

fn next_hashmap_field(heap: &mut Heap, map: TermId, state: IterState, want_keys: bool) -> HeapResult<(IterItem, IterState, DependencySet)> {
  let start_index = match state {
    IterState::Start => 0usize,
    IterState::Counter(n) => n as usize,
    _ => return Err(crate::error::HeapError::invariant("malformed hashmap iterator state")),
  };
  match heap.hashmap_entry_at(map, start_index, want_keys) {
    Some((field, next_index)) => Ok((IterItem::Value(field), IterState::Counter(next_index as i64), heap.nil())),
    None => Ok((IterItem::End, IterState::Done, heap.nil())),
  }
}
