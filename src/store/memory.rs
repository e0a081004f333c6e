//! In-memory content store, loadable from a JSON fixture.
//!
//! Fixture shape: `{"items": [{"id": "...", "type": "...", "TS": 1503072614411, ...}]}`.
//! Field lookups (`type`, `TS`, `featured`, `items`) check the record first and
//! then its `Data` payload.

use super::{item_envelope, items_envelope, limit_param, ContentStore};
use crate::error::StoreError;
use crate::query::Params;
use crate::value::is_truthy;
use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use rand::seq::SliceRandom;
use serde_json::Value;
use std::cmp::Ordering;
use std::path::Path;
use tracing::debug;

/// Read-mostly store of records keyed by id
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<IndexMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a fixture value
    pub fn from_value(fixture: Value) -> Result<Self, StoreError> {
        let store = Self::new();
        store.load(fixture)?;
        Ok(store)
    }

    /// Build a store from a fixture file
    pub fn from_fixture(path: &Path) -> Result<Self, StoreError> {
        let contents = std::fs::read_to_string(path)?;
        let fixture: Value = serde_json::from_str(&contents)?;
        Self::from_value(fixture)
    }

    /// Replace the store contents with a fixture
    pub fn load(&self, fixture: Value) -> Result<(), StoreError> {
        let records = match fixture {
            Value::Object(mut map) => match map.remove("items") {
                Some(Value::Array(records)) => records,
                _ => {
                    return Err(StoreError::Backend(
                        "fixture must contain an \"items\" array".to_string(),
                    ))
                }
            },
            Value::Array(records) => records,
            _ => {
                return Err(StoreError::Backend(
                    "fixture must be an object or an array".to_string(),
                ))
            }
        };

        let mut items = IndexMap::with_capacity(records.len());
        for record in records {
            let id = record
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| StoreError::Backend("fixture record without string id".to_string()))?
                .to_string();
            items.insert(id, record);
        }
        debug!(item_count = items.len(), "Loaded content store fixture");
        *self.items.write() = items;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    fn of_type(&self, item_type: &str) -> Vec<Value> {
        let mut records: Vec<Value> = self
            .items
            .read()
            .values()
            .filter(|record| field(record, "type").and_then(Value::as_str) == Some(item_type))
            .cloned()
            .collect();
        records.sort_by(newest_first);
        records
    }
}

/// Look up a field on the record, falling back to its `Data` payload
fn field<'a>(record: &'a Value, name: &str) -> Option<&'a Value> {
    record
        .get(name)
        .or_else(|| record.get("Data").and_then(|data| data.get(name)))
}

fn newest_first(a: &Value, b: &Value) -> Ordering {
    let ts = |record: &Value| field(record, "TS").and_then(Value::as_f64).unwrap_or(0.0);
    ts(b).partial_cmp(&ts(a)).unwrap_or(Ordering::Equal)
}

fn truncate(mut records: Vec<Value>, params: &Params) -> Result<Vec<Value>, StoreError> {
    if let Some(limit) = limit_param(params)? {
        records.truncate(limit);
    }
    Ok(records)
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn get(&self, id: &str, _params: &Params) -> Result<Value, StoreError> {
        self.items
            .read()
            .get(id)
            .cloned()
            .map(item_envelope)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn list_by_type(&self, item_type: &str, params: &Params) -> Result<Value, StoreError> {
        Ok(items_envelope(truncate(self.of_type(item_type), params)?))
    }

    async fn featured_by_type(
        &self,
        item_type: &str,
        params: &Params,
    ) -> Result<Value, StoreError> {
        let featured = self
            .of_type(item_type)
            .into_iter()
            .filter(|record| is_truthy(field(record, "featured")))
            .collect();
        Ok(items_envelope(truncate(featured, params)?))
    }

    async fn highlighted_list(&self, list_id: &str, params: &Params) -> Result<Value, StoreError> {
        let items = self.items.read();
        let list = items
            .get(list_id)
            .ok_or_else(|| StoreError::ListNotFound(list_id.to_string()))?;
        let ids = field(list, "items")
            .and_then(Value::as_array)
            .ok_or_else(|| StoreError::ListNotFound(list_id.to_string()))?;
        let records = ids
            .iter()
            .filter_map(Value::as_str)
            .filter_map(|id| items.get(id).cloned())
            .collect();
        drop(items);
        Ok(items_envelope(truncate(records, params)?))
    }

    async fn random_list(&self, item_type: &str, params: &Params) -> Result<Value, StoreError> {
        let candidates = self.of_type(item_type);
        let amount = limit_param(params)?.unwrap_or(candidates.len());
        let picked = candidates
            .choose_multiple(&mut rand::thread_rng(), amount)
            .cloned()
            .collect();
        Ok(items_envelope(picked))
    }
}
