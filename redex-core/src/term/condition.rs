/*!

A `Condition` is a typed effect key: a value describing *what* state is being requested, not the state
itself. Conditions are the leaves of a [`dependency set`](crate::dependency), and `Signal` terms carry a
tree of them to describe what went wrong.

*/

use crate::{heap::TermId, term::Tag};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
  /// A user-defined effect: `(effect_type, payload, token)` identify what is being asked for.
  Custom { effect_type: TermId, payload: TermId, token: TermId },
  /// Placeholder for an effect the host has not yet resolved.
  Pending,
  /// User-raised error carrying an arbitrary payload term.
  Error { payload: TermId },
  /// A strict argument position received a term of the wrong tag.
  TypeError { expected_tag: Tag, received: TermId },
  /// Application of a non-callable term.
  InvalidFunctionTarget { target: TermId },
  /// Wrong arity, or no matching overload. `target` is `None` when the target itself was never resolved.
  InvalidFunctionArgs { target: Option<TermId>, args: TermId },
  /// Defensive: a sentinel/placeholder location was dereferenced.
  InvalidPointer,
}

impl Condition {
  /// The [`Tag`] this condition would report as its own if wrapped in a `TypeError.expected_tag` context
  /// — i.e. every condition is tagged `Condition` at the term level regardless of kind.
  pub fn tag(&self) -> Tag {
    Tag::Condition
  }
}
