/*!

`toJson(t) -> string|null` (§4.2, §6, §9). Only the variants with an obvious JSON rendering implement it;
everything else falls back to the documented default `to_json → (fail, offset)`, which we surface as `Ok(None)`
rather than an error — a host asking "can this be serialized" is a query, not a broken invariant.

NaN and infinite floats have no JSON representation; the source emits `null` for them, and we keep that
rather than tightening it, since `to_json` is already fallible and a host checking for `None` already has to
handle "not representable" — collapsing "this float" into the same bucket adds no new failure mode.

*/

use crate::{
  heap::{Heap, TermId},
  term::Term,
};

/// Renders `id` as a JSON string, or `None` if `id`'s variant (or something it contains) has no JSON form.
pub fn to_json(heap: &Heap, id: TermId) -> Option<String> {
  let value = to_json_value(heap, id)?;
  serde_json::to_string(&value).ok()
}

fn to_json_value(heap: &Heap, id: TermId) -> Option<serde_json::Value> {
  match heap.get(id) {
    Term::Nil => Some(serde_json::Value::Null),
    Term::Boolean(value) => Some(serde_json::Value::Bool(*value)),
    Term::Int(value) => Some(serde_json::Value::Number((*value).into())),
    Term::Float(value) => match serde_json::Number::from_f64(value.0) {
      Some(number) => Some(serde_json::Value::Number(number)),
      None => Some(serde_json::Value::Null),
    },
    Term::Str(bytes) => {
      let text = std::str::from_utf8(bytes).ok()?;
      Some(serde_json::Value::String(text.to_owned()))
    }
    Term::List(items) => {
      let mut array = Vec::with_capacity(items.len());
      for &item in items.iter() {
        array.push(to_json_value(heap, item)?);
      }
      Some(serde_json::Value::Array(array))
    }
    Term::Record { keys, values } => record_to_json(heap, *keys, *values),
    Term::Hashmap(data) => {
      let mut object = serde_json::Map::with_capacity(data.num_entries as usize);
      for (key, value) in data.entries() {
        let key = json_object_key(heap, key)?;
        object.insert(key, to_json_value(heap, value)?);
      }
      Some(serde_json::Value::Object(object))
    }
    // Trees, hashsets, conditions, signals, effects, callables, and variables have no JSON form.
    _ => None,
  }
}

fn record_to_json(heap: &Heap, keys: TermId, values: TermId) -> Option<serde_json::Value> {
  let keys = heap.list_items(keys)?;
  let values = heap.list_items(values)?;
  if keys.len() != values.len() {
    return None;
  }
  let mut object = serde_json::Map::with_capacity(keys.len());
  for (&key, &value) in keys.iter().zip(values.iter()) {
    let key = json_object_key(heap, key)?;
    object.insert(key, to_json_value(heap, value)?);
  }
  Some(serde_json::Value::Object(object))
}

/// JSON object keys must be strings; a `Symbol` key is rendered by its numeric id the way a `Record`'s
/// constructor-derived keys already are.
fn json_object_key(heap: &Heap, key: TermId) -> Option<String> {
  match heap.get(key) {
    Term::Str(bytes) => std::str::from_utf8(bytes).ok().map(str::to_owned),
    Term::Symbol(id) => Some(id.to_string()),
    Term::Int(value) => Some(value.to_string()),
    _ => None,
  }
}
