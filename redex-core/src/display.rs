/*!

`display(t) -> string` and `format(t) -> string` (§6): heap-aware text rendering, dispatched by [`Tag`] the
same way every other capability in [`crate::term`] is. Unlike [`crate::json::to_json`] this never fails —
every variant has *some* rendering, even if it's only useful for debugging (`Condition`, `Signal`, ...).

These render through a plain recursive writer rather than [`crate::Formattable`]: `Formattable::repr` takes
only `&self`, but every interesting rendering here needs `&Heap` to follow child `TermId`s, so the macro-based
`Display`/`Debug` machinery doesn't apply to terms themselves.

*/

use std::fmt::{self, Write};

use crate::{
  format::{FormatStyle, Formattable},
  heap::{Heap, TermId},
  term::{condition::Condition, iterator::IterKind, Term},
};

/// `format(t)`: the `Debug`-style rendering, with structure (container boundaries, variant names) visible.
pub fn format(heap: &Heap, id: TermId) -> String {
  let mut out = String::new();
  let _ = write_term(&mut out, heap, id, FormatStyle::Debug);
  out
}

/// `display(t)`: the terse, human-facing rendering.
pub fn display(heap: &Heap, id: TermId) -> String {
  let mut out = String::new();
  let _ = write_term(&mut out, heap, id, FormatStyle::Default);
  out
}

fn write_term(out: &mut dyn Write, heap: &Heap, id: TermId, style: FormatStyle) -> fmt::Result {
  match heap.get(id) {
    Term::Nil => write!(out, "nil"),
    Term::Boolean(value) => write!(out, "{value}"),
    Term::Int(value) => write!(out, "{value}"),
    Term::Float(value) => write!(out, "{}", value.0),
    Term::Str(bytes) => match std::str::from_utf8(bytes) {
      Ok(text) if style == FormatStyle::Default => write!(out, "{text}"),
      Ok(text) => write!(out, "{text:?}"),
      Err(_) => write!(out, "{bytes:?}"),
    },
    Term::Symbol(value) => write!(out, "#{value}"),
    Term::Timestamp(millis) => write!(out, "@{millis}"),

    Term::List(items) => {
      write!(out, "[")?;
      write_joined(out, heap, items.iter().copied(), style)?;
      write!(out, "]")
    }

    Term::Record { keys, values } => {
      let keys = heap.list_items(*keys);
      let values = heap.list_items(*values);
      write!(out, "{{")?;
      if let (Some(keys), Some(values)) = (keys, values) {
        for (index, (&key, &value)) in keys.iter().zip(values.iter()).enumerate() {
          if index > 0 {
            write!(out, ", ")?;
          }
          write_term(out, heap, key, style)?;
          write!(out, ": ")?;
          write_term(out, heap, value, style)?;
        }
      }
      write!(out, "}}")
    }

    Term::Tree { left, right, length, .. } => {
      if style == FormatStyle::Debug {
        write!(out, "Tree[len={length}](")?;
        write_term(out, heap, *left, style)?;
        write!(out, ", ")?;
        write_term(out, heap, *right, style)?;
        write!(out, ")")
      } else {
        write_term(out, heap, *left, style)?;
        write!(out, " ++ ")?;
        write_term(out, heap, *right, style)
      }
    }

    Term::Hashmap(data) | Term::Hashset(data) => {
      let is_set = matches!(heap.get(id), Term::Hashset(_));
      write!(out, "{}{{", if is_set { "#" } else { "" })?;
      for (index, (key, value)) in data.entries().enumerate() {
        if index > 0 {
          write!(out, ", ")?;
        }
        write_term(out, heap, key, style)?;
        if !is_set {
          write!(out, ": ")?;
          write_term(out, heap, value, style)?;
        }
      }
      write!(out, "}}")
    }

    Term::Condition(condition) => write_condition(out, heap, condition, style),

    Term::Signal { conditions } => {
      write!(out, "Signal(")?;
      write_term(out, heap, *conditions, style)?;
      write!(out, ")")
    }

    Term::Effect { condition } => {
      write!(out, "Effect(")?;
      write_term(out, heap, *condition, style)?;
      write!(out, ")")
    }

    Term::Builtin(builtin) => builtin.repr(out, style),

    Term::Compiled { target_id, num_args } => write!(out, "<compiled #{target_id}/{num_args}>"),

    Term::Lambda { num_args, body } => {
      write!(out, "\\{num_args} -> ")?;
      write_term(out, heap, *body, style)
    }

    Term::Partial { target, bound_args } => {
      write_term(out, heap, *target, style)?;
      write!(out, "(")?;
      if let Some(items) = heap.list_items(*bound_args) {
        write_joined(out, heap, items.iter().copied(), style)?;
      }
      write!(out, ", ..)")
    }

    Term::Constructor { keys } => {
      write!(out, "Constructor(")?;
      if let Some(items) = heap.list_items(*keys) {
        write_joined(out, heap, items.iter().copied(), style)?;
      }
      write!(out, ")")
    }

    Term::Variable { stack_offset } => write!(out, "${stack_offset}"),

    Term::Let { initializer, body } => {
      write!(out, "let ")?;
      write_term(out, heap, *initializer, style)?;
      write!(out, " in ")?;
      write_term(out, heap, *body, style)
    }

    Term::Application { target, args, .. } => {
      write_term(out, heap, *target, style)?;
      write!(out, "(")?;
      if let Some(items) = heap.list_items(*args) {
        write_joined(out, heap, items.iter().copied(), style)?;
      }
      write!(out, ")")
    }

    Term::LazyResult { value, .. } => write_term(out, heap, *value, style),

    Term::Iterator(kind) => write!(out, "<iterator {}>", iter_kind_name(kind)),
  }
}

fn write_joined(out: &mut dyn Write, heap: &Heap, items: impl Iterator<Item = TermId>, style: FormatStyle) -> fmt::Result {
  for (index, item) in items.enumerate() {
    if index > 0 {
      write!(out, ", ")?;
    }
    write_term(out, heap, item, style)?;
  }
  Ok(())
}

fn write_condition(out: &mut dyn Write, heap: &Heap, condition: &Condition, style: FormatStyle) -> fmt::Result {
  match condition {
    Condition::Pending => write!(out, "Pending"),
    Condition::InvalidPointer => write!(out, "InvalidPointer"),
    Condition::Custom { effect_type, payload, token } => {
      write!(out, "Custom(")?;
      write_term(out, heap, *effect_type, style)?;
      write!(out, ", ")?;
      write_term(out, heap, *payload, style)?;
      write!(out, ", ")?;
      write_term(out, heap, *token, style)?;
      write!(out, ")")
    }
    Condition::Error { payload } => {
      write!(out, "Error(")?;
      write_term(out, heap, *payload, style)?;
      write!(out, ")")
    }
    Condition::TypeError { expected_tag, received } => {
      write!(out, "TypeError(expected=")?;
      expected_tag.repr(out, style)?;
      write!(out, ", received=")?;
      write_term(out, heap, *received, style)?;
      write!(out, ")")
    }
    Condition::InvalidFunctionTarget { target } => {
      write!(out, "InvalidFunctionTarget(")?;
      write_term(out, heap, *target, style)?;
      write!(out, ")")
    }
    Condition::InvalidFunctionArgs { target, args } => {
      write!(out, "InvalidFunctionArgs(target=")?;
      match target {
        Some(target) => write_term(out, heap, *target, style)?,
        None => write!(out, "nil")?,
      }
      write!(out, ", args=")?;
      write_term(out, heap, *args, style)?;
      write!(out, ")")
    }
  }
}

fn iter_kind_name(kind: &IterKind) -> &'static str {
  match kind {
    IterKind::Empty => "empty",
    IterKind::Once(_) => "once",
    IterKind::Range { .. } => "range",
    IterKind::Repeat(_) => "repeat",
    IterKind::Integers { .. } => "integers",
    IterKind::Map { .. } => "map",
    IterKind::Filter { .. } => "filter",
    IterKind::Flatten { .. } => "flatten",
    IterKind::Zip { .. } => "zip",
    IterKind::Skip { .. } => "skip",
    IterKind::Take { .. } => "take",
    IterKind::Intersperse { .. } => "intersperse",
    IterKind::Evaluate { .. } => "evaluate",
    IterKind::IndexedAccessor { .. } => "indexed_accessor",
    IterKind::HashmapKeys { .. } => "hashmap_keys",
    IterKind::HashmapValues { .. } => "hashmap_values",
  }
}
