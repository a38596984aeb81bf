/*!

The term model: a tagged union of every node kind that can appear in the expression graph, plus the
per-variant capabilities (`is_atomic`, `arity`, ...) that don't need heap access to answer. Capabilities that
do need heap access — `evaluate`, `apply`, `substitute`, `hash`, `equals`, `to_json`, display/debug — are
implemented as free functions taking `&Heap`/`&mut Heap` in their respective modules ([`crate::heap`],
[`crate::reducer`], [`crate::substitute`], [`crate::json`]), dispatched by matching on [`Tag`]/[`Term`]. This
mirrors a tag-to-function table without requiring trait objects or unsafe vtable tricks.

*/

use std::{cell::Cell, rc::Rc};

use ordered_float::OrderedFloat;

use crate::{
  builtin::Builtin,
  heap::TermId,
  term::{condition::Condition, hashmap::HashmapData, iterator::IterKind},
};

pub mod condition;
pub mod hashmap;
pub mod iterator;

/// The discriminant of a [`Term`]. Used for `isX` queries, `TypeError.expected_tag`, and dispatch tables
/// that are naturally expressed as a `match` over the tag rather than the full payload.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
  Nil,
  Boolean,
  Int,
  Float,
  String,
  Symbol,
  Timestamp,
  List,
  Record,
  Tree,
  Hashmap,
  Hashset,
  Condition,
  Signal,
  Effect,
  Builtin,
  Compiled,
  Lambda,
  Partial,
  Constructor,
  Variable,
  Let,
  Application,
  LazyResult,
  Iterator,
}

impl Tag {
  fn name(self) -> &'static str {
    match self {
      Tag::Nil => "Nil",
      Tag::Boolean => "Boolean",
      Tag::Int => "Int",
      Tag::Float => "Float",
      Tag::String => "String",
      Tag::Symbol => "Symbol",
      Tag::Timestamp => "Timestamp",
      Tag::List => "List",
      Tag::Record => "Record",
      Tag::Tree => "Tree",
      Tag::Hashmap => "Hashmap",
      Tag::Hashset => "Hashset",
      Tag::Condition => "Condition",
      Tag::Signal => "Signal",
      Tag::Effect => "Effect",
      Tag::Builtin => "Builtin",
      Tag::Compiled => "Compiled",
      Tag::Lambda => "Lambda",
      Tag::Partial => "Partial",
      Tag::Constructor => "Constructor",
      Tag::Variable => "Variable",
      Tag::Let => "Let",
      Tag::Application => "Application",
      Tag::LazyResult => "LazyResult",
      Tag::Iterator => "Iterator",
    }
  }
}

impl crate::format::Formattable for Tag {
  fn repr(&self, out: &mut dyn std::fmt::Write, style: crate::format::FormatStyle) -> std::fmt::Result {
    match style {
      crate::format::FormatStyle::Debug => write!(out, "Tag::{}", self.name()),
      _ => write!(out, "{}", self.name()),
    }
  }
}

crate::impl_display_debug_for_formattable!(Tag);

/// The in-place mutable memoization cell carried by every `Application` term. `value == TermId::NIL` means
/// "nothing cached"; the sentinel `-1` hashes from the source are modeled as `None` here since the hash
/// type is unsigned.
#[derive(Clone, Copy, Debug)]
pub struct ApplicationCache {
  pub value: TermId,
  pub dependencies: TermId,
  pub overall_state_hash: Option<u64>,
  pub minimal_state_hash: Option<u64>,
}

impl Default for ApplicationCache {
  fn default() -> Self {
    ApplicationCache {
      value: TermId::NIL,
      dependencies: TermId::NIL,
      overall_state_hash: None,
      minimal_state_hash: None,
    }
  }
}

#[derive(Clone, Debug)]
pub enum Term {
  Nil,
  Boolean(bool),
  Int(i64),
  Float(OrderedFloat<f64>),
  Str(Rc<[u8]>),
  Symbol(u32),
  Timestamp(i64),
  List(Rc<[TermId]>),
  Record { keys: TermId, values: TermId },
  Tree { left: TermId, right: TermId, length: u32, depth: u32 },
  Hashmap(HashmapData),
  Hashset(HashmapData),
  Condition(Condition),
  Signal { conditions: TermId },
  Effect { condition: TermId },
  Builtin(Builtin),
  Compiled { target_id: u32, num_args: u32 },
  Lambda { num_args: u32, body: TermId },
  Partial { target: TermId, bound_args: TermId },
  Constructor { keys: TermId },
  Variable { stack_offset: u32 },
  Let { initializer: TermId, body: TermId },
  Application { target: TermId, args: TermId, cache: Cell<ApplicationCache> },
  LazyResult { value: TermId, dependencies: TermId },
  Iterator(IterKind),
}

impl Term {
  pub fn tag(&self) -> Tag {
    match self {
      Term::Nil => Tag::Nil,
      Term::Boolean(_) => Tag::Boolean,
      Term::Int(_) => Tag::Int,
      Term::Float(_) => Tag::Float,
      Term::Str(_) => Tag::String,
      Term::Symbol(_) => Tag::Symbol,
      Term::Timestamp(_) => Tag::Timestamp,
      Term::List(_) => Tag::List,
      Term::Record { .. } => Tag::Record,
      Term::Tree { .. } => Tag::Tree,
      Term::Hashmap(_) => Tag::Hashmap,
      Term::Hashset(_) => Tag::Hashset,
      Term::Condition(_) => Tag::Condition,
      Term::Signal { .. } => Tag::Signal,
      Term::Effect { .. } => Tag::Effect,
      Term::Builtin(_) => Tag::Builtin,
      Term::Compiled { .. } => Tag::Compiled,
      Term::Lambda { .. } => Tag::Lambda,
      Term::Partial { .. } => Tag::Partial,
      Term::Constructor { .. } => Tag::Constructor,
      Term::Variable { .. } => Tag::Variable,
      Term::Let { .. } => Tag::Let,
      Term::Application { .. } => Tag::Application,
      Term::LazyResult { .. } => Tag::LazyResult,
      Term::Iterator(_) => Tag::Iterator,
    }
  }

  /// Terms with no subterms to recurse into and no evaluation rule beyond self-return.
  pub fn is_atomic(&self) -> bool {
    matches!(
      self,
      Term::Nil
        | Term::Boolean(_)
        | Term::Int(_)
        | Term::Float(_)
        | Term::Str(_)
        | Term::Symbol(_)
        | Term::Timestamp(_)
        | Term::Builtin(_)
        | Term::Compiled { .. }
        | Term::Variable { .. }
    )
  }

  /// `(n, is_variadic)`. Only callable tags have a meaningful arity; everything else is `(0, false)`.
  pub fn arity(&self) -> (u32, bool) {
    match self {
      Term::Lambda { num_args, .. } => (*num_args, false),
      Term::Compiled { num_args, .. } => (*num_args, false),
      Term::Builtin(builtin) => (builtin.arity(), false),
      Term::Constructor { keys: _ } => (0, false), // resolved against the keys list at call time; see apply()
      Term::Partial { .. } => (0, false), // target arity minus bound args; computed with heap access
      _ => (0, false),
    }
  }
}
