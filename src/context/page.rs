//! Page context preparation
//!
//! A page context combines the site-wide `global` template and one page
//! template, both resolved with the same caller parameters, plus the base URLs
//! views need to build links.

use super::resolver::Resolver;
use crate::error::{ApiError, ResolveError};
use crate::query::Params;
use serde_json::{json, Map, Value};
use std::path::{Component, Path, PathBuf};
use tracing::info;

/// Values copied verbatim into the page context
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageOptions {
    /// Full URL without a trailing slash; empty and `.` are acceptable
    pub static_url: String,
    pub base_url: String,
    pub php_url: String,
    /// Request parameters, forwarded to every directive
    pub query: Option<Params>,
}

pub struct PageContext;

impl PageContext {
    /// Resolve `global` and `page` concurrently and assemble
    /// `{STATIC, BASE, PHP, query, global, page}`.
    pub async fn prepare(
        resolver: &Resolver,
        global: &Value,
        page: &Value,
        options: &PageOptions,
    ) -> Result<Value, ResolveError> {
        let extra = options.query.as_ref();
        let (global, page) = futures::future::try_join(
            resolver.resolve(global, extra),
            resolver.resolve(page, extra),
        )
        .await?;

        Ok(json!({
            "STATIC": options.static_url,
            "BASE": options.base_url,
            "PHP": options.php_url,
            "query": params_value(options.query.as_ref()),
            "global": global,
            "page": page,
        }))
    }
}

fn params_value(params: Option<&Params>) -> Value {
    match params {
        Some(params) => Value::Object(
            params
                .iter()
                .map(|(k, v)| (k.clone(), v.clone().map(Value::String).unwrap_or(Value::Null)))
                .collect::<Map<String, Value>>(),
        ),
        None => Value::Null,
    }
}

/// Reads context templates from `<context_dir>/global.json` and
/// `<context_dir>/pages/<name>.json`
#[derive(Debug, Clone)]
pub struct TemplateLoader {
    context_dir: PathBuf,
}

impl TemplateLoader {
    pub fn new(context_dir: impl Into<PathBuf>) -> Self {
        Self {
            context_dir: context_dir.into(),
        }
    }

    pub fn context_dir(&self) -> &Path {
        &self.context_dir
    }

    pub async fn global(&self) -> Result<Value, ApiError> {
        read_template(&self.context_dir.join("global.json")).await
    }

    /// Page names are relative paths under `pages/`; `..` and absolute paths are refused
    pub async fn page(&self, name: &str) -> Result<Value, ApiError> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        let path = self.context_dir.join("pages").join(format!("{}.json", name));
        if name.is_empty() || escapes {
            return Err(ApiError::TemplateNotFound(path));
        }
        read_template(&path).await
    }

    /// Load both templates for `name` and prepare the page context
    pub async fn prepare(
        &self,
        resolver: &Resolver,
        name: &str,
        options: &PageOptions,
    ) -> Result<Value, ApiError> {
        info!(page = name, "Start prepare context");
        let (global, page) = futures::future::try_join(self.global(), self.page(name)).await?;
        let context = PageContext::prepare(resolver, &global, &page, options).await?;
        info!(page = name, "Context ready");
        Ok(context)
    }
}

async fn read_template(path: &Path) -> Result<Value, ApiError> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::TemplateNotFound(path.to_path_buf()));
        }
        Err(err) => return Err(err.into()),
    };
    serde_json::from_str(&text).map_err(|source| ApiError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}
