//! Template classification
//!
//! A context template is plain JSON. Before resolution it is classified into a
//! typed [`TemplateNode`] tree. A tree nested too deeply to schedule is
//! reported up front, before any backend call is made; everything else about a
//! directive node, `_process` included, is checked when that node runs.

use crate::error::ResolveError;
use serde_json::Value;

pub const QUERY_KEY: &str = "_query";
pub const PROCESS_KEY: &str = "_process";
pub const DEFAULT_KEY: &str = "_default";
pub const DATA_KEY: &str = "_data";

/// Deepest container nesting accepted, matching serde_json's parse limit
pub const MAX_DEPTH: usize = 128;

/// A node that fetches its value through a query directive
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveNode {
    /// The `_query` value; anything but a string fails at parse time
    pub query: Value,
    /// Transform specs in declared order, unvalidated; a bad entry fails the
    /// node when it runs
    pub process: Vec<Value>,
    /// Fallback used when any step fails
    pub default: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    Directive(DirectiveNode),
    Literal(Value),
    /// Entries in template order
    Container(Vec<(String, TemplateNode)>),
    /// Arrays are not searched for directives
    Sequence(Vec<Value>),
    Scalar(Value),
}

impl TemplateNode {
    /// Classify a whole template. `_query` takes priority over `_data`.
    pub fn classify(template: &Value) -> Result<Self, ResolveError> {
        Self::classify_at(template, "$", 0)
    }

    fn classify_at(value: &Value, path: &str, depth: usize) -> Result<Self, ResolveError> {
        let map = match value {
            Value::Object(map) => map,
            Value::Array(items) => return Ok(TemplateNode::Sequence(items.clone())),
            scalar => return Ok(TemplateNode::Scalar(scalar.clone())),
        };

        if let Some(query) = map.get(QUERY_KEY) {
            let process = match map.get(PROCESS_KEY) {
                Some(Value::Array(specs)) => specs.clone(),
                Some(spec) => vec![spec.clone()],
                None => Vec::new(),
            };
            return Ok(TemplateNode::Directive(DirectiveNode {
                query: query.clone(),
                process,
                default: map.get(DEFAULT_KEY).cloned(),
            }));
        }

        if let Some(data) = map.get(DATA_KEY) {
            return Ok(TemplateNode::Literal(data.clone()));
        }

        if depth >= MAX_DEPTH {
            return Err(ResolveError::InvalidTemplate {
                path: path.to_string(),
                reason: format!("containers nested deeper than {} levels", MAX_DEPTH),
            });
        }

        map.iter()
            .map(|(key, child)| {
                let child_path = format!("{}.{}", path, key);
                Ok((key.clone(), Self::classify_at(child, &child_path, depth + 1)?))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(TemplateNode::Container)
    }

    /// Number of directive nodes in the tree
    pub fn directive_count(&self) -> usize {
        match self {
            TemplateNode::Directive(_) => 1,
            TemplateNode::Container(entries) => {
                entries.iter().map(|(_, node)| node.directive_count()).sum()
            }
            _ => 0,
        }
    }
}
