//! Backend dispatcher: merges parameters, resolves the target and routes a
//! parsed directive to the content store or a generator.

use super::directive::{Params, Query};
use crate::error::QueryError;
use crate::generators::TimelineGenerator;
use crate::store::ContentStore;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Combine caller params with directive params.
///
/// Directive params win key by key. When both sides carry a numeric `limit` the
/// smaller one is used: the directive sets a ceiling the caller may only tighten.
pub fn merge_params(extra: Option<&Params>, directive: &Params) -> Params {
    let mut merged = extra.cloned().unwrap_or_default();
    for (key, value) in directive {
        merged.insert(key.clone(), value.clone());
    }

    let numeric = |params: Option<&Params>| {
        params
            .and_then(|p| p.get("limit"))
            .and_then(|v| v.as_deref())
            .and_then(|v| v.trim().parse::<i64>().ok())
    };
    if let (Some(caller), Some(ceiling)) = (numeric(extra), numeric(Some(directive))) {
        merged.insert("limit".to_string(), Some(caller.min(ceiling).to_string()));
    }
    merged
}

/// Routes directives to registered backends
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn ContentStore>,
    timeline: TimelineGenerator,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn ContentStore>, timeline: TimelineGenerator) -> Self {
        Self { store, timeline }
    }

    /// Parse and execute a directive string with optional caller params
    pub async fn execute(&self, directive: &str, extra: Option<&Params>) -> Result<Value, QueryError> {
        let query = Query::parse(directive)?;
        self.dispatch(query, extra).await
    }

    /// Execute an already parsed directive
    pub async fn dispatch(&self, query: Query, extra: Option<&Params>) -> Result<Value, QueryError> {
        let params = merge_params(extra, &query.params);
        let target = query.target.clone().or_else(|| {
            params
                .get("target")
                .cloned()
                .flatten()
                .filter(|t| !t.is_empty())
        });
        debug!(
            module = %query.module,
            action = %query.action,
            target = ?target,
            params = ?params,
            "Decoded query"
        );

        let require_target = || {
            target.as_deref().ok_or_else(|| QueryError::MissingTarget {
                action: query.action.clone(),
            })
        };

        match query.module.as_str() {
            "cms" => match query.action.as_str() {
                "get" => Ok(self.store.get(require_target()?, &params).await?),
                "list" => Ok(self.store.list_by_type(require_target()?, &params).await?),
                "featured" => Ok(self
                    .store
                    .featured_by_type(require_target()?, &params)
                    .await?),
                "highlight" => Ok(self
                    .store
                    .highlighted_list(require_target()?, &params)
                    .await?),
                "random" => Ok(self.store.random_list(require_target()?, &params).await?),
                _ => Err(unknown_action(&query)),
            },
            "gen" => match query.action.as_str() {
                "timeline" => self.timeline.timeline(require_target()?, &params),
                _ => Err(unknown_action(&query)),
            },
            other => Err(QueryError::UnknownModule(other.to_string())),
        }
    }
}

fn unknown_action(query: &Query) -> QueryError {
    QueryError::UnknownAction {
        module: query.module.clone(),
        action: query.action.clone(),
    }
}
