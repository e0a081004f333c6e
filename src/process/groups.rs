//! Sequence and group shaping: grouping by date label, truncation,
//! deduplication and sorting (flat or within each group's `items`).

use super::{expect_array, DedupParams, LimitParams, SortOrder, SortParams};
use crate::error::ProcessError;
use crate::value::{get_path, is_truthy};
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Fold a flat labeled sequence into `{date, items}` groups.
///
/// A record with a truthy `date` opens a new group and loses its `date` field;
/// unlabeled records join the current group. Unlabeled records before the first
/// label are collected into a leading group whose `date` is null.
pub fn group_by_date(input: Value) -> Result<Value, ProcessError> {
    let events = expect_array("GroupByDate", input)?;
    let mut groups: Vec<(Value, Vec<Value>)> = Vec::new();

    for mut event in events {
        let label = match &mut event {
            Value::Object(record) if is_truthy(record.get("date")) => record.remove("date"),
            _ => None,
        };
        match (label, groups.last_mut()) {
            (Some(date), _) => groups.push((date, vec![event])),
            (None, Some((_, items))) => items.push(event),
            (None, None) => groups.push((Value::Null, vec![event])),
        }
    }

    Ok(Value::Array(
        groups
            .into_iter()
            .map(|(date, items)| json!({ "date": date, "items": items }))
            .collect(),
    ))
}

pub fn limit(input: Value, params: &LimitParams) -> Result<Value, ProcessError> {
    let mut items = expect_array("Limit", input)?;
    items.truncate(params.size);
    Ok(Value::Array(items))
}

fn field<'a>(item: &'a Value, name: Option<&str>) -> Option<&'a Value> {
    name.and_then(|name| item.get(name))
}

/// Keep one record per `dedupField` value: the one whose `priorityField` value
/// comes earliest in `priorityValues`. Unlisted values rank last; ties go to
/// the first occurrence. Survivors keep their relative order.
pub fn remove_duplicates(input: Value, params: &DedupParams) -> Result<Value, ProcessError> {
    let items = expect_array("RemoveDuplicates", input)?;
    Ok(Value::Array(dedup(items, params)))
}

fn dedup(items: Vec<Value>, params: &DedupParams) -> Vec<Value> {
    let rank = |item: &Value| {
        field(item, params.priority_field.as_deref())
            .and_then(|value| params.priority_values.iter().position(|p| p == value))
            .unwrap_or(usize::MAX)
    };
    // Value is not Hash; its canonical JSON text stands in as the group key.
    let key = |item: &Value| field(item, params.dedup_field.as_deref()).map(Value::to_string);

    let mut survivors: HashMap<Option<String>, (usize, usize)> = HashMap::new();
    for (index, item) in items.iter().enumerate() {
        let candidate = (rank(item), index);
        survivors
            .entry(key(item))
            .and_modify(|best| {
                if candidate.0 < best.0 {
                    *best = candidate;
                }
            })
            .or_insert(candidate);
    }

    items
        .into_iter()
        .enumerate()
        .filter(|(index, item)| {
            survivors
                .get(&key(item))
                .map(|(_, keep)| keep == index)
                .unwrap_or(false)
        })
        .map(|(_, item)| item)
        .collect()
}

/// Rewrite the `items` of every group that has a non-empty `items` array
fn map_group_items<F>(action: &'static str, input: Value, f: F) -> Result<Value, ProcessError>
where
    F: Fn(Vec<Value>) -> Vec<Value>,
{
    let groups = expect_array(action, input)?;
    Ok(Value::Array(
        groups
            .into_iter()
            .map(|mut group| {
                if let Some(Value::Array(items)) = group.get_mut("items") {
                    if !items.is_empty() {
                        let taken = std::mem::take(items);
                        *items = f(taken);
                    }
                }
                group
            })
            .collect(),
    ))
}

pub fn remove_duplicates_from_groups(
    input: Value,
    params: &DedupParams,
) -> Result<Value, ProcessError> {
    map_group_items("RemoveDuplicatesFromGroups", input, |items| {
        dedup(items, params)
    })
}

/// Type rank used to order mixed values: numbers, strings, booleans,
/// composites, then null, then missing.
fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        Some(Value::Number(_)) => 0,
        Some(Value::String(_)) => 1,
        Some(Value::Bool(_)) => 2,
        Some(Value::Array(_)) | Some(Value::Object(_)) => 3,
        Some(Value::Null) => 4,
        None => 5,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn sort_items(mut items: Vec<Value>, params: &SortParams) -> Vec<Value> {
    if params.fields.is_empty() {
        return items;
    }
    items.sort_by(|a, b| {
        params
            .fields
            .iter()
            .enumerate()
            .map(|(i, path)| {
                let order = compare_values(get_path(a, path), get_path(b, path));
                match params.orders.get(i).copied().unwrap_or_default() {
                    SortOrder::Asc => order,
                    SortOrder::Desc => order.reverse(),
                }
            })
            .find(|order| order.is_ne())
            .unwrap_or(Ordering::Equal)
    });
    items
}

/// Stable multi-key sort; keys are dot paths, orders default to ascending
pub fn sort(input: Value, params: &SortParams) -> Result<Value, ProcessError> {
    let items = expect_array("Sort", input)?;
    Ok(Value::Array(sort_items(items, params)))
}

pub fn sort_each_group(input: Value, params: &SortParams) -> Result<Value, ProcessError> {
    map_group_items("SortEachGroup", input, |items| sort_items(items, params))
}
