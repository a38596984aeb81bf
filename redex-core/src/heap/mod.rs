/*!

The term heap: a linear, append-only arena of [`Term`] records. Allocation returns a stable [`TermId`]
handle; there is no tracing collector — a session's terms simply live until the `Heap` is dropped. Hash and
equality are the two capabilities every other module leans on, so they live here rather than being
spread out per-variant: `hash` is a cheap array lookup (every term's structural hash is computed once, at
allocation time), and `equals` is a recursive structural comparison with the documented Hashmap/Tree
caveats (§3.2/§9 in the design notes carried into [`DESIGN.md`](../../../DESIGN.md)).

*/

mod singletons;

use std::rc::Rc;

use ordered_float::OrderedFloat;
use redex_abs::{
  hash::{combine, hash_bytes, hash_u64, HashType},
  log,
};

use crate::{
  builtin::Builtin,
  error::{HeapError, HeapResult},
  term::{condition::Condition, hashmap::HashmapData, iterator::IterKind, ApplicationCache, Tag, Term},
};

use singletons::Singletons;

/// A stable handle into a [`Heap`]. `TermId::NIL` is the sentinel "absent" value and also happens to be
/// the handle of the interned `Nil` term, so "no value" and "the unit value" share a representation, as
/// they do throughout the host API's use of `NIL`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TermId(u32);

impl TermId {
  pub const NIL: TermId = TermId(0);

  #[inline(always)]
  pub(crate) fn index(self) -> usize {
    self.0 as usize
  }

  #[inline(always)]
  pub fn is_nil(self) -> bool {
    self == TermId::NIL
  }
}

impl std::fmt::Debug for TermId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "TermId({})", self.0)
  }
}

/// Alias kept for call sites that want to talk about "the sentinel absent handle" rather than a handle to
/// the `Nil` term specifically; they are the same value (see [`TermId`]).
pub const NIL: TermId = TermId::NIL;

/// An externally linked function backing a `Compiled` term. The host ABI itself is unspecified (§6); this
/// is just a concrete, minimal seam a host can register against.
pub type NativeFn = Box<dyn Fn(&mut Heap, &[TermId], TermId) -> HeapResult<(TermId, crate::dependency::DependencySet)>>;

pub struct Heap {
  terms: Vec<Term>,
  hashes: Vec<HashType>,
  singletons: Singletons,
  capacity: usize,
  compiled_fns: std::collections::HashMap<u32, NativeFn>,
}

impl Heap {
  /// Builds a fresh, independent arena with its own singletons. Nested or concurrent evaluation sessions
  /// must each get their own `Heap` — they never share one (§5).
  pub fn new() -> Heap {
    Heap::with_capacity(1 << 20)
  }

  pub fn with_capacity(capacity: usize) -> Heap {
    let mut terms = Vec::new();
    let mut hashes = Vec::new();
    let singletons = Singletons::bootstrap(&mut |term| push_term(&mut terms, &mut hashes, term));
    log::debug!(capacity, singleton_count = terms.len(), "heap initialized");
    Heap { terms, hashes, singletons, capacity, compiled_fns: std::collections::HashMap::new() }
  }

  /// Registers the function a `Compiled { target_id, .. }` term calls into. Replaces any previous
  /// registration for the same `target_id`.
  pub fn register_compiled(&mut self, target_id: u32, native: NativeFn) {
    self.compiled_fns.insert(target_id, native);
  }

  /// Removes the registered function so it can be called without holding a borrow of `self`, and handed
  /// back afterward with [`Heap::restore_compiled_fn`].
  pub(crate) fn take_compiled_fn(&mut self, target_id: u32) -> Option<NativeFn> {
    self.compiled_fns.remove(&target_id)
  }

  pub(crate) fn restore_compiled_fn(&mut self, target_id: u32, native: NativeFn) {
    self.compiled_fns.insert(target_id, native);
  }

  pub fn len(&self) -> usize {
    self.terms.len()
  }

  pub fn is_empty(&self) -> bool {
    self.terms.is_empty()
  }

  pub(crate) fn alloc(&mut self, term: Term) -> HeapResult<TermId> {
    if self.terms.len() >= self.capacity {
      return Err(HeapError::OutOfMemory { requested: self.terms.len() + 1, capacity: self.capacity });
    }
    Ok(push_term(&mut self.terms, &mut self.hashes, term))
  }

  #[inline(always)]
  pub(crate) fn get(&self, id: TermId) -> &Term {
    &self.terms[id.index()]
  }

  /// Structural hash. O(1): every term's hash is computed once, at allocation time.
  #[inline(always)]
  pub fn hash(&self, id: TermId) -> HashType {
    self.hashes[id.index()]
  }

  /// Structural equality, with the documented Hashmap probabilistic relaxation. Identity is always
  /// checked first, which is what makes singleton interning observably "pointer-equal iff semantically
  /// equal" (§3.2).
  pub fn term_eq(&self, a: TermId, b: TermId) -> bool {
    if a == b {
      return true;
    }
    if self.hash(a) != self.hash(b) {
      return false;
    }
    match (self.get(a), self.get(b)) {
      (Term::Nil, Term::Nil) => true,
      (Term::Boolean(x), Term::Boolean(y)) => x == y,
      (Term::Int(x), Term::Int(y)) => x == y,
      (Term::Float(x), Term::Float(y)) => x.0 == y.0 || (x.0.is_nan() && y.0.is_nan()),
      (Term::Str(x), Term::Str(y)) => x == y,
      (Term::Symbol(x), Term::Symbol(y)) => x == y,
      (Term::Timestamp(x), Term::Timestamp(y)) => x == y,
      (Term::List(x), Term::List(y)) => {
        x.len() == y.len() && x.iter().zip(y.iter()).all(|(&xi, &yi)| self.term_eq(xi, yi))
      }
      (Term::Record { keys: k1, values: v1 }, Term::Record { keys: k2, values: v2 }) => {
        self.term_eq(*k1, *k2) && self.term_eq(*v1, *v2)
      }
      (
        Term::Tree { left: l1, right: r1, length: len1, depth: d1 },
        Term::Tree { left: l2, right: r2, length: len2, depth: d2 },
      ) => {
        len1 == len2 && d1 == d2 && self.term_eq(*l1, *l2) && self.term_eq(*r1, *r2)
      }
      (Term::Hashmap(x), Term::Hashmap(y)) | (Term::Hashset(x), Term::Hashset(y)) => {
        x.probably_equals(self.hash(a), y, self.hash(b))
      }
      (Term::Condition(x), Term::Condition(y)) => self.condition_eq(x, y),
      (Term::Signal { conditions: c1 }, Term::Signal { conditions: c2 }) => self.term_eq(*c1, *c2),
      (Term::Effect { condition: c1 }, Term::Effect { condition: c2 }) => self.term_eq(*c1, *c2),
      (Term::Builtin(x), Term::Builtin(y)) => x == y,
      (
        Term::Compiled { target_id: t1, num_args: n1 },
        Term::Compiled { target_id: t2, num_args: n2 },
      ) => t1 == t2 && n1 == n2,
      (Term::Lambda { num_args: n1, body: b1 }, Term::Lambda { num_args: n2, body: b2 }) => {
        n1 == n2 && self.term_eq(*b1, *b2)
      }
      (
        Term::Partial { target: t1, bound_args: a1 },
        Term::Partial { target: t2, bound_args: a2 },
      ) => self.term_eq(*t1, *t2) && self.term_eq(*a1, *a2),
      (Term::Constructor { keys: k1 }, Term::Constructor { keys: k2 }) => self.term_eq(*k1, *k2),
      (Term::Variable { stack_offset: o1 }, Term::Variable { stack_offset: o2 }) => o1 == o2,
      (Term::Let { initializer: i1, body: b1 }, Term::Let { initializer: i2, body: b2 }) => {
        self.term_eq(*i1, *i2) && self.term_eq(*b1, *b2)
      }
      (
        Term::Application { target: t1, args: a1, .. },
        Term::Application { target: t2, args: a2, .. },
      ) => self.term_eq(*t1, *t2) && self.term_eq(*a1, *a2),
      (
        Term::LazyResult { value: v1, dependencies: d1 },
        Term::LazyResult { value: v2, dependencies: d2 },
      ) => self.term_eq(*v1, *v2) && self.term_eq(*d1, *d2),
      (Term::Iterator(x), Term::Iterator(y)) => x == y,
      _ => false,
    }
  }

  fn condition_eq(&self, a: &Condition, b: &Condition) -> bool {
    match (a, b) {
      (Condition::Pending, Condition::Pending) => true,
      (Condition::InvalidPointer, Condition::InvalidPointer) => true,
      (Condition::Error { payload: p1 }, Condition::Error { payload: p2 }) => self.term_eq(*p1, *p2),
      (
        Condition::Custom { effect_type: e1, payload: p1, token: tk1 },
        Condition::Custom { effect_type: e2, payload: p2, token: tk2 },
      ) => self.term_eq(*e1, *e2) && self.term_eq(*p1, *p2) && self.term_eq(*tk1, *tk2),
      (
        Condition::TypeError { expected_tag: e1, received: r1 },
        Condition::TypeError { expected_tag: e2, received: r2 },
      ) => e1 == e2 && self.term_eq(*r1, *r2),
      (Condition::InvalidFunctionTarget { target: t1 }, Condition::InvalidFunctionTarget { target: t2 }) => {
        self.term_eq(*t1, *t2)
      }
      (
        Condition::InvalidFunctionArgs { target: t1, args: a1 },
        Condition::InvalidFunctionArgs { target: t2, args: a2 },
      ) => self.term_eq(*a1, *a2) && option_term_eq(self, *t1, *t2),
      _ => false,
    }
  }

  // region Low-level constructors shared by the reducer, substitution, iterator, and JSON modules.
  // Host-facing names and the remaining constructors live in `api`.

  pub fn nil(&self) -> TermId {
    TermId::NIL
  }

  pub fn create_boolean(&mut self, value: bool) -> HeapResult<TermId> {
    self.alloc(Term::Boolean(value))
  }

  pub fn create_int(&mut self, value: i64) -> HeapResult<TermId> {
    if let Some(id) = self.singletons.small_int(value) {
      return Ok(id);
    }
    self.alloc(Term::Int(value))
  }

  pub fn create_float(&mut self, value: f64) -> HeapResult<TermId> {
    self.alloc(Term::Float(OrderedFloat(value)))
  }

  pub fn create_string(&mut self, bytes: &[u8]) -> HeapResult<TermId> {
    if bytes.is_empty() {
      return Ok(self.singletons.empty_string);
    }
    self.alloc(Term::Str(Rc::from(bytes)))
  }

  pub fn create_symbol(&mut self, id: u32) -> HeapResult<TermId> {
    self.alloc(Term::Symbol(id))
  }

  pub fn create_timestamp(&mut self, millis: i64) -> HeapResult<TermId> {
    self.alloc(Term::Timestamp(millis))
  }

  pub fn empty_list(&self) -> TermId {
    self.singletons.empty_list
  }

  pub fn create_list(&mut self, items: &[TermId]) -> HeapResult<TermId> {
    if items.is_empty() {
      return Ok(self.singletons.empty_list);
    }
    self.alloc(Term::List(Rc::from(items)))
  }

  pub fn create_record(&mut self, keys: TermId, values: TermId) -> HeapResult<TermId> {
    self.alloc(Term::Record { keys, values })
  }

  pub fn create_tree(&mut self, left: TermId, right: TermId) -> HeapResult<TermId> {
    if left.is_nil() {
      return Ok(right);
    }
    if right.is_nil() {
      return Ok(left);
    }
    let (left_len, left_depth) = self.tree_shape(left);
    let (right_len, right_depth) = self.tree_shape(right);
    self.alloc(Term::Tree {
      left,
      right,
      length: left_len + right_len,
      depth: left_depth.max(right_depth) + 1,
    })
  }

  fn tree_shape(&self, id: TermId) -> (u32, u32) {
    match self.get(id) {
      Term::Tree { length, depth, .. } => (*length, *depth),
      _ => (1, 0),
    }
  }

  pub fn empty_hashmap(&self) -> TermId {
    self.singletons.empty_hashmap
  }

  pub fn empty_hashset(&self) -> TermId {
    self.singletons.empty_hashset
  }

  pub fn create_hashmap(&mut self, entries: &[(TermId, TermId)]) -> HeapResult<TermId> {
    if entries.is_empty() {
      return Ok(self.singletons.empty_hashmap);
    }
    let data = HashmapData::from_entries(self, entries);
    self.alloc(Term::Hashmap(data))
  }

  pub fn create_hashset(&mut self, items: &[TermId]) -> HeapResult<TermId> {
    if items.is_empty() {
      return Ok(self.singletons.empty_hashset);
    }
    let entries: Vec<(TermId, TermId)> = items.iter().map(|&item| (item, TermId::NIL)).collect();
    let data = HashmapData::from_entries(self, &entries);
    self.alloc(Term::Hashset(data))
  }

  pub fn hashmap_insert(&mut self, map: TermId, key: TermId, value: TermId) -> HeapResult<TermId> {
    let data = match self.get(map) {
      Term::Hashmap(data) => data.clone(),
      _ => return Err(HeapError::invariant("hashmap_insert on a non-Hashmap term")),
    };
    let updated = data.insert(self, key, value);
    self.alloc(Term::Hashmap(updated))
  }

  pub fn pending_condition(&self) -> TermId {
    self.singletons.pending_condition
  }

  pub fn invalid_pointer_condition(&self) -> TermId {
    self.singletons.invalid_pointer_condition
  }

  pub fn create_condition(&mut self, condition: Condition) -> HeapResult<TermId> {
    match condition {
      Condition::Pending => Ok(self.singletons.pending_condition),
      Condition::InvalidPointer => Ok(self.singletons.invalid_pointer_condition),
      other => self.alloc(Term::Condition(other)),
    }
  }

  pub fn create_signal(&mut self, conditions: TermId) -> HeapResult<TermId> {
    self.alloc(Term::Signal { conditions })
  }

  pub fn create_effect(&mut self, condition: TermId) -> HeapResult<TermId> {
    self.alloc(Term::Effect { condition })
  }

  pub fn create_builtin(&mut self, builtin: Builtin) -> HeapResult<TermId> {
    self.alloc(Term::Builtin(builtin))
  }

  pub fn create_compiled(&mut self, target_id: u32, num_args: u32) -> HeapResult<TermId> {
    self.alloc(Term::Compiled { target_id, num_args })
  }

  pub fn create_lambda(&mut self, num_args: u32, body: TermId) -> HeapResult<TermId> {
    self.alloc(Term::Lambda { num_args, body })
  }

  pub fn create_partial(&mut self, target: TermId, bound_args: TermId) -> HeapResult<TermId> {
    self.alloc(Term::Partial { target, bound_args })
  }

  pub fn create_constructor(&mut self, keys: TermId) -> HeapResult<TermId> {
    self.alloc(Term::Constructor { keys })
  }

  pub fn create_variable(&mut self, stack_offset: u32) -> HeapResult<TermId> {
    if let Some(id) = self.singletons.small_variable(stack_offset) {
      return Ok(id);
    }
    self.alloc(Term::Variable { stack_offset })
  }

  pub fn create_let(&mut self, initializer: TermId, body: TermId) -> HeapResult<TermId> {
    self.alloc(Term::Let { initializer, body })
  }

  pub fn create_application(&mut self, target: TermId, args: TermId) -> HeapResult<TermId> {
    self.alloc(Term::Application { target, args, cache: std::cell::Cell::new(Default::default()) })
  }

  pub fn create_lazy_result(&mut self, value: TermId, dependencies: TermId) -> HeapResult<TermId> {
    self.alloc(Term::LazyResult { value, dependencies })
  }

  pub fn create_iterator(&mut self, kind: IterKind) -> HeapResult<TermId> {
    self.alloc(Term::Iterator(kind))
  }

  // endregion

  // region Accessors used by the iterator protocol and reducer without re-deriving a capability dispatch.

  pub fn tag(&self, id: TermId) -> Tag {
    self.get(id).tag()
  }

  pub fn is_truthy(&self, id: TermId) -> bool {
    match self.get(id) {
      Term::Nil => false,
      Term::Boolean(value) => *value,
      _ => true,
    }
  }

  pub fn list_len(&self, id: TermId) -> Option<u32> {
    match self.get(id) {
      Term::List(items) => Some(items.len() as u32),
      _ => None,
    }
  }

  pub fn list_item(&self, id: TermId, index: usize) -> Option<TermId> {
    match self.get(id) {
      Term::List(items) => items.get(index).copied(),
      _ => None,
    }
  }

  pub fn list_items(&self, id: TermId) -> Option<Rc<[TermId]>> {
    match self.get(id) {
      Term::List(items) => Some(items.clone()),
      _ => None,
    }
  }

  pub fn hashmap_len(&self, id: TermId) -> Option<u32> {
    match self.get(id) {
      Term::Hashmap(data) | Term::Hashset(data) => Some(data.num_entries),
      _ => None,
    }
  }

  pub fn hashmap_get(&self, id: TermId, key: TermId) -> Option<TermId> {
    match self.get(id) {
      Term::Hashmap(data) | Term::Hashset(data) => data.get(self, key),
      _ => None,
    }
  }

  pub fn hashmap_has(&self, id: TermId, key: TermId) -> bool {
    self.hashmap_get(id, key).is_some()
  }

  /// The `index`-th occupied bucket's key (or value) at or after `start_bucket`, scanning bucket order.
  /// Returns `(field, next_start_bucket)`, where `next_start_bucket` resumes the scan just past this entry.
  pub fn hashmap_entry_at(&self, id: TermId, start_bucket: usize, want_key: bool) -> Option<(TermId, usize)> {
    let data = match self.get(id) {
      Term::Hashmap(data) | Term::Hashset(data) => data,
      _ => return None,
    };
    for (offset, bucket) in data.buckets.iter().enumerate().skip(start_bucket) {
      if let crate::term::hashmap::Bucket::Occupied(key, value) = bucket {
        let field = if want_key { *key } else { *value };
        return Some((field, offset + 1));
      }
    }
    None
  }

  pub fn iter_kind(&self, id: TermId) -> HeapResult<IterKind> {
    match self.get(id) {
      Term::Iterator(kind) => Ok(*kind),
      _ => Err(HeapError::invariant("expected an Iterator term")),
    }
  }

  // endregion

  // region Application cache access. `cache` is mutated through a shared reference (`Cell::set`), so
  // these take `&self` even though they have a visible side effect — the same tradeoff the source makes
  // with its single mutable field on an otherwise-immutable term.

  pub(crate) fn application_parts(&self, id: TermId) -> HeapResult<(TermId, TermId, ApplicationCache)> {
    match self.get(id) {
      Term::Application { target, args, cache } => Ok((*target, *args, cache.get())),
      _ => Err(HeapError::invariant("application_parts called on a non-Application term")),
    }
  }

  pub(crate) fn set_application_cache(&self, id: TermId, cache: ApplicationCache) {
    if let Term::Application { cache: cell, .. } = self.get(id) {
      cell.set(cache);
    }
  }

  // endregion
}

impl Default for Heap {
  fn default() -> Self {
    Heap::new()
  }
}

fn option_term_eq(heap: &Heap, a: Option<TermId>, b: Option<TermId>) -> bool {
  match (a, b) {
    (None, None) => true,
    (Some(x), Some(y)) => heap.term_eq(x, y),
    _ => false,
  }
}

/// Computes the structural hash of a freshly constructed term. Takes the raw hash table rather than
/// `&Heap` so it can run while the owning `Heap` is mid-allocation (see `Heap::alloc`).
fn structural_hash(term: &Term, hashes: &[HashType]) -> HashType {
  let child = |id: TermId| hashes[id.index()];
  match term {
    Term::Nil => hash_bytes(b"Nil"),
    Term::Boolean(value) => combine(hash_bytes(b"Boolean"), hash_u64(*value as u64)),
    Term::Int(value) => combine(hash_bytes(b"Int"), hash_u64(*value as u64)),
    Term::Float(value) => {
      let bits = if value.0.is_nan() { f64::NAN.to_bits() } else { value.0.to_bits() };
      combine(hash_bytes(b"Float"), hash_u64(bits))
    }
    Term::Str(bytes) => combine(hash_bytes(b"String"), hash_bytes(bytes)),
    Term::Symbol(id) => combine(hash_bytes(b"Symbol"), hash_u64(*id as u64)),
    Term::Timestamp(millis) => combine(hash_bytes(b"Timestamp"), hash_u64(*millis as u64)),
    Term::List(items) => {
      let mut acc = hash_bytes(b"List");
      for &item in items.iter() {
        acc = combine(acc, child(item));
      }
      acc
    }
    Term::Record { keys, values } => combine(combine(hash_bytes(b"Record"), child(*keys)), child(*values)),
    Term::Tree { length, depth, .. } => {
      combine(combine(hash_bytes(b"Tree"), hash_u64(*length as u64)), hash_u64(*depth as u64))
    }
    Term::Hashmap(data) => combine(hash_bytes(b"Hashmap"), data.order_sensitive_hash(hashes)),
    Term::Hashset(data) => combine(hash_bytes(b"Hashset"), data.order_sensitive_hash(hashes)),
    Term::Condition(condition) => combine(hash_bytes(b"Condition"), condition_hash(condition, hashes)),
    Term::Signal { conditions } => combine(hash_bytes(b"Signal"), child(*conditions)),
    Term::Effect { condition } => combine(hash_bytes(b"Effect"), child(*condition)),
    Term::Builtin(builtin) => combine(hash_bytes(b"Builtin"), hash_u64(*builtin as u64)),
    Term::Compiled { target_id, num_args } => {
      combine(combine(hash_bytes(b"Compiled"), hash_u64(*target_id as u64)), hash_u64(*num_args as u64))
    }
    Term::Lambda { num_args, body } => combine(combine(hash_bytes(b"Lambda"), hash_u64(*num_args as u64)), child(*body)),
    Term::Partial { target, bound_args } => combine(combine(hash_bytes(b"Partial"), child(*target)), child(*bound_args)),
    Term::Constructor { keys } => combine(hash_bytes(b"Constructor"), child(*keys)),
    Term::Variable { stack_offset } => combine(hash_bytes(b"Variable"), hash_u64(*stack_offset as u64)),
    Term::Let { initializer, body } => combine(combine(hash_bytes(b"Let"), child(*initializer)), child(*body)),
    Term::Application { target, args, .. } => combine(combine(hash_bytes(b"Application"), child(*target)), child(*args)),
    Term::LazyResult { value, dependencies } => {
      combine(combine(hash_bytes(b"LazyResult"), child(*value)), child(*dependencies))
    }
    Term::Iterator(kind) => combine(hash_bytes(b"Iterator"), iter_kind_hash(kind, hashes)),
  }
}

fn condition_hash(condition: &Condition, hashes: &[HashType]) -> HashType {
  let child = |id: TermId| hashes[id.index()];
  match condition {
    Condition::Custom { effect_type, payload, token } => {
      combine(combine(combine(hash_bytes(b"Custom"), child(*effect_type)), child(*payload)), child(*token))
    }
    Condition::Pending => hash_bytes(b"Pending"),
    Condition::Error { payload } => combine(hash_bytes(b"Error"), child(*payload)),
    Condition::TypeError { expected_tag, received } => {
      combine(combine(hash_bytes(b"TypeError"), hash_u64(*expected_tag as u64)), child(*received))
    }
    Condition::InvalidFunctionTarget { target } => combine(hash_bytes(b"InvalidFunctionTarget"), child(*target)),
    Condition::InvalidFunctionArgs { target, args } => {
      let target_hash = target.map(child).unwrap_or(0);
      combine(combine(hash_bytes(b"InvalidFunctionArgs"), target_hash), child(*args))
    }
    Condition::InvalidPointer => hash_bytes(b"InvalidPointer"),
  }
}

fn iter_kind_hash(kind: &IterKind, hashes: &[HashType]) -> HashType {
  let child = |id: TermId| hashes[id.index()];
  match kind {
    IterKind::Empty => hash_bytes(b"Empty"),
    IterKind::Once(value) => combine(hash_bytes(b"Once"), child(*value)),
    IterKind::Range { start, end, step } => combine(
      combine(hash_bytes(b"Range"), hash_u64(*start as u64)),
      combine(hash_u64(end.unwrap_or(i64::MAX) as u64), hash_u64(*step as u64)),
    ),
    IterKind::Repeat(value) => combine(hash_bytes(b"Repeat"), child(*value)),
    IterKind::Integers { start } => combine(hash_bytes(b"Integers"), hash_u64(*start as u64)),
    IterKind::Map { source, func } => combine(combine(hash_bytes(b"Map"), child(*source)), child(*func)),
    IterKind::Filter { source, func } => combine(combine(hash_bytes(b"Filter"), child(*source)), child(*func)),
    IterKind::Flatten { source } => combine(hash_bytes(b"Flatten"), child(*source)),
    IterKind::Zip { left, right } => combine(combine(hash_bytes(b"Zip"), child(*left)), child(*right)),
    IterKind::Skip { source, count } => combine(combine(hash_bytes(b"Skip"), child(*source)), hash_u64(*count as u64)),
    IterKind::Take { source, count } => combine(combine(hash_bytes(b"Take"), child(*source)), hash_u64(*count as u64)),
    IterKind::Intersperse { source, separator } => {
      combine(combine(hash_bytes(b"Intersperse"), child(*source)), child(*separator))
    }
    IterKind::Evaluate { source } => combine(hash_bytes(b"Evaluate"), child(*source)),
    IterKind::IndexedAccessor { target, index } => {
      combine(combine(hash_bytes(b"IndexedAccessor"), child(*target)), hash_u64(*index as u64))
    }
    IterKind::HashmapKeys { map } => combine(hash_bytes(b"HashmapKeys"), child(*map)),
    IterKind::HashmapValues { map } => combine(hash_bytes(b"HashmapValues"), child(*map)),
  }
}

fn push_term(terms: &mut Vec<Term>, hashes: &mut Vec<HashType>, term: Term) -> TermId {
  let hash = structural_hash(&term, hashes);
  let id = TermId(terms.len() as u32);
  terms.push(term);
  hashes.push(hash);
  id
}
