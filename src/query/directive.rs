//! Directive parser for URL-like queries.
//!
//! E.g. `{cms}/list/article?limit=5&featured`

use crate::error::QueryError;
use indexmap::IndexMap;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Ordered directive parameters. A bare `key` (no `=`) maps to `None`.
pub type Params = IndexMap<String, Option<String>>;

fn directive_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\{(\w+)\}/(\w+)(?:/([^/?]+))?(?:\?(.*))?$").expect("directive regex is valid")
    })
}

/// A parsed query directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub module: String,
    pub action: String,
    pub target: Option<String>,
    pub params: Params,
}

impl Query {
    /// Parse a directive string.
    pub fn parse(input: &str) -> Result<Self, QueryError> {
        if input.is_empty() {
            return Err(QueryError::Parse(input.to_string()));
        }
        let captures = directive_regex()
            .captures(input)
            .ok_or_else(|| QueryError::Parse(input.to_string()))?;

        Ok(Query {
            module: captures[1].to_string(),
            action: captures[2].to_string(),
            target: captures.get(3).map(|m| m.as_str().to_string()),
            params: captures
                .get(4)
                .map(|m| split_params(m.as_str()))
                .unwrap_or_default(),
        })
    }

    /// Parse an optional directive; a missing directive is a parse error.
    pub fn parse_opt(input: Option<&str>) -> Result<Self, QueryError> {
        match input {
            Some(input) => Self::parse(input),
            None => Err(QueryError::Parse(String::new())),
        }
    }
}

/// Split `key=value&key2&...` into ordered params.
pub fn split_params(params: &str) -> Params {
    let mut out = Params::new();
    if params.is_empty() {
        return out;
    }
    for pair in params.split('&') {
        match pair.split_once('=') {
            Some((key, value)) => {
                out.insert(key.trim().to_string(), Some(value.trim().to_string()));
            }
            None => {
                out.insert(pair.trim().to_string(), None);
            }
        }
    }
    out
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}/{}", self.module, self.action)?;
        if let Some(target) = &self.target {
            write!(f, "/{}", target)?;
        }
        for (i, (key, value)) in self.params.iter().enumerate() {
            f.write_str(if i == 0 { "?" } else { "&" })?;
            match value {
                Some(value) => write!(f, "{}={}", key, value)?,
                None => f.write_str(key)?,
            }
        }
        Ok(())
    }
}
