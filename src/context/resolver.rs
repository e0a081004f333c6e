//! Recursive context resolver
//!
//! Walks a classified template, fans out one future per directive node and
//! splices each result back at its original position. Directive failures are
//! contained at the node: the node resolves to its `_default` (or null) and the
//! rest of the tree is unaffected.

use super::template::{DirectiveNode, TemplateNode};
use crate::dates::{DateContext, DateSettings};
use crate::error::{QueryError, ResolveError};
use crate::process::run_chain;
use crate::query::{Dispatcher, Params};
use futures::future::{join_all, BoxFuture, FutureExt};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Upper bound for a single directive's backend call; none by default
    pub directive_timeout: Option<Duration>,
}

/// Resolves context templates against a dispatcher
#[derive(Clone)]
pub struct Resolver {
    dispatcher: Dispatcher,
    dates: DateSettings,
    options: ResolverOptions,
}

impl Resolver {
    pub fn new(dispatcher: Dispatcher, dates: DateSettings) -> Self {
        Self {
            dispatcher,
            dates,
            options: ResolverOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolve a template into a tree of the same shape.
    ///
    /// Only a template nested too deeply to schedule fails; every
    /// directive-level error, malformed `_process` included, becomes that
    /// node's fallback value.
    pub async fn resolve(&self, template: &Value, extra: Option<&Params>) -> Result<Value, ResolveError> {
        let node = TemplateNode::classify(template)?;
        debug!(directives = node.directive_count(), "Resolving template");
        let ctx = self.dates.context();
        Ok(self.resolve_node(node, extra, ctx).await)
    }

    fn resolve_node<'a>(
        &'a self,
        node: TemplateNode,
        extra: Option<&'a Params>,
        ctx: DateContext,
    ) -> BoxFuture<'a, Value> {
        async move {
            match node {
                TemplateNode::Directive(directive) => self.resolve_directive(directive, extra, ctx).await,
                TemplateNode::Literal(value) | TemplateNode::Scalar(value) => value,
                TemplateNode::Sequence(items) => Value::Array(items),
                TemplateNode::Container(entries) => {
                    let (keys, children): (Vec<String>, Vec<TemplateNode>) = entries.into_iter().unzip();
                    let values = join_all(
                        children
                            .into_iter()
                            .map(|child| self.resolve_node(child, extra, ctx)),
                    )
                    .await;
                    Value::Object(keys.into_iter().zip(values).collect::<Map<String, Value>>())
                }
            }
        }
        .boxed()
    }

    async fn resolve_directive(
        &self,
        directive: DirectiveNode,
        extra: Option<&Params>,
        ctx: DateContext,
    ) -> Value {
        match self.run_directive(&directive, extra, &ctx).await {
            Ok(value) => {
                debug!(query = %directive.query, "Final result ready");
                value
            }
            Err(err) => {
                warn!(
                    query = %directive.query,
                    error = %err,
                    has_default = directive.default.is_some(),
                    "Query failed, using fallback"
                );
                directive.default.unwrap_or(Value::Null)
            }
        }
    }

    async fn run_directive(
        &self,
        directive: &DirectiveNode,
        extra: Option<&Params>,
        ctx: &DateContext,
    ) -> Result<Value, QueryError> {
        let query = directive
            .query
            .as_str()
            .ok_or_else(|| QueryError::Parse(directive.query.to_string()))?;

        let pending = self.dispatcher.execute(query, extra);
        let result = match self.options.directive_timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .map_err(|_| QueryError::Timeout(limit))??,
            None => pending.await?,
        };

        Ok(run_chain(&directive.process, unwrap_envelope(result), ctx)?)
    }
}

/// Strip the store's response envelope.
///
/// `{Item: {Data: r}}` and `{Item: r}` yield `r`; `{Items: [...]}` yields the
/// list with each element's `Data` unwrapped when present; anything else is
/// returned as is.
pub fn unwrap_envelope(result: Value) -> Value {
    fn unwrap_data(record: Value) -> Value {
        match record {
            Value::Object(mut map) if map.contains_key("Data") => {
                map.remove("Data").unwrap_or(Value::Null)
            }
            other => other,
        }
    }

    match result {
        Value::Object(mut map) if map.contains_key("Item") => {
            unwrap_data(map.remove("Item").unwrap_or(Value::Null))
        }
        Value::Object(mut map) if map.contains_key("Items") => {
            match map.remove("Items").unwrap_or(Value::Null) {
                Value::Array(items) => Value::Array(items.into_iter().map(unwrap_data).collect()),
                other => other,
            }
        }
        other => other,
    }
}
