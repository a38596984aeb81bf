/*!

Errors that can arise from the heap itself (allocation failure) as opposed to errors that arise from
evaluating a term graph, which never panic or return `Result` — they surface in-band as `Signal` terms
(see [`term::condition::Condition`](crate::term::condition::Condition)).

*/

use std::fmt;

use simple_error::SimpleError;

pub type HeapResult<T> = Result<T, HeapError>;

#[derive(Debug)]
pub enum HeapError {
  /// The arena would exceed its configured capacity.
  OutOfMemory { requested: usize, capacity: usize },
  /// An internal invariant was violated; wraps a short diagnostic message.
  Invariant(SimpleError),
}

impl HeapError {
  pub(crate) fn invariant<M: Into<String>>(message: M) -> HeapError {
    HeapError::Invariant(SimpleError::new(message.into()))
  }
}

impl fmt::Display for HeapError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      HeapError::OutOfMemory { requested, capacity } => {
        write!(f, "out of memory: requested {} terms, capacity is {}", requested, capacity)
      }
      HeapError::Invariant(inner) => write!(f, "heap invariant violated: {}", inner),
    }
  }
}

impl std::error::Error for HeapError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      HeapError::Invariant(inner) => Some(inner),
      HeapError::OutOfMemory { .. } => None,
    }
  }
}
