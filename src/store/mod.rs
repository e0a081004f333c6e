//! Content store
//!
//! The content store is the backend that `{cms}` directives are resolved against.
//! Stores reply with an envelope: `{"Item": record}` for single lookups and
//! `{"Items": [record, ...]}` for lists, where each record may wrap its payload
//! in a `Data` field.

pub mod memory;

pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::query::Params;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Content store interface
///
/// Every operation receives the resolved target (an id or a type) and the
/// effective directive parameters.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Single item lookup by id
    async fn get(&self, id: &str, params: &Params) -> Result<Value, StoreError>;

    /// Items of a type, most recent first
    async fn list_by_type(&self, item_type: &str, params: &Params) -> Result<Value, StoreError>;

    /// Featured items of a type, most recent first
    async fn featured_by_type(&self, item_type: &str, params: &Params)
        -> Result<Value, StoreError>;

    /// Items referenced by a curated list record
    async fn highlighted_list(&self, list_id: &str, params: &Params) -> Result<Value, StoreError>;

    /// Random selection of items of a type
    async fn random_list(&self, item_type: &str, params: &Params) -> Result<Value, StoreError>;
}

/// Wrap a single record into an `Item` envelope
pub fn item_envelope(record: Value) -> Value {
    json!({ "Item": record })
}

/// Wrap records into an `Items` envelope
pub fn items_envelope(records: Vec<Value>) -> Value {
    json!({ "Items": records })
}

/// Read the `limit` parameter, if any
pub fn limit_param(params: &Params) -> Result<Option<usize>, StoreError> {
    match params.get("limit") {
        Some(Some(value)) => value
            .parse::<usize>()
            .map(Some)
            .map_err(|_| StoreError::InvalidParam {
                name: "limit".to_string(),
                value: value.clone(),
            }),
        _ => Ok(None),
    }
}
