//! Record shaping: field projection and first-item selection.

use super::{FirstItemParams, ProjectParams};
use crate::value::{copy_path, is_truthy};
use serde_json::{Map, Value};

fn pick(record: &Value, fields: &[String]) -> Map<String, Value> {
    let mut picked = Map::new();
    for field in fields {
        copy_path(record, &mut picked, field);
    }
    picked
}

/// Keep only the named fields (dot paths allowed) of one record or of each
/// record in a sequence.
///
/// With `remove_empty`, records that project to nothing are dropped; a single
/// record input then yields `{}` rather than disappearing.
pub fn project(input: Value, params: &ProjectParams) -> Value {
    match input {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| pick(item, &params.fields))
                .filter(|picked| !params.remove_empty || !picked.is_empty())
                .map(Value::Object)
                .collect(),
        ),
        single => Value::Object(pick(&single, &params.fields)),
    }
}

/// First element of a sequence, or the record itself; `default` when that is falsy
pub fn first_item(input: Value, params: &FirstItemParams) -> Value {
    let candidate = match input {
        Value::Array(items) => items.into_iter().next(),
        single => Some(single),
    };
    match candidate {
        Some(value) if is_truthy(Some(&value)) => value,
        _ => params.default.clone(),
    }
}
