//! CLI route: builds the store, dispatcher and resolver from configuration and
//! dispatches each command to them.

use crate::cli::output::to_pretty_json;
use crate::cli::parse::Commands;
use crate::config::{ConfigLoader, TrellisConfig};
use crate::context::{Resolver, TemplateLoader};
use crate::error::ApiError;
use crate::generators::TimelineGenerator;
use crate::query::{Dispatcher, Params, Query};
use crate::store::MemoryStore;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything a command needs, loaded once per invocation
pub struct RunContext {
    workspace_root: PathBuf,
    config: TrellisConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = ConfigLoader::load_with_file(&workspace_root, config_path.as_deref())?;
        Ok(Self {
            workspace_root,
            config,
        })
    }

    pub fn from_config(workspace_root: PathBuf, config: TrellisConfig) -> Self {
        Self {
            workspace_root,
            config,
        }
    }

    pub fn config(&self) -> &TrellisConfig {
        &self.config
    }

    /// Run a command and return its printable output
    pub async fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Resolve {
                template,
                store,
                params,
            } => {
                let template = read_json(template)?;
                let resolver = self.resolver(store.as_deref())?;
                let extra = to_params(params);
                let resolved = resolver.resolve(&template, extra.as_ref()).await?;
                Ok(to_pretty_json(&resolved))
            }
            Commands::Page {
                name,
                store,
                params,
            } => {
                let resolver = self.resolver(store.as_deref())?;
                let loader = TemplateLoader::new(self.config.context_path(&self.workspace_root));
                let options = self.config.page_options(to_params(params));
                let context = loader.prepare(&resolver, name, &options).await?;
                Ok(to_pretty_json(&context))
            }
            Commands::Parse { directive } => {
                let query = Query::parse(directive)?;
                Ok(to_pretty_json(&describe_query(&query)))
            }
            Commands::Config => toml::to_string_pretty(&self.config)
                .map_err(|e| ApiError::ConfigError(format!("Cannot render configuration: {}", e))),
        }
    }

    fn resolver(&self, store_override: Option<&Path>) -> Result<Resolver, ApiError> {
        let store = self.open_store(store_override)?;
        let dates = self.config.date_settings();
        let dispatcher = Dispatcher::new(store, TimelineGenerator::new(dates));
        Ok(Resolver::new(dispatcher, dates).with_options(self.config.resolver_options()))
    }

    fn open_store(&self, store_override: Option<&Path>) -> Result<Arc<MemoryStore>, ApiError> {
        let fixture = store_override
            .map(Path::to_path_buf)
            .or_else(|| self.config.fixture_path(&self.workspace_root));
        match fixture {
            Some(path) => {
                let store = MemoryStore::from_fixture(&path)?;
                info!(fixture = %path.display(), items = store.len(), "Content store loaded");
                Ok(Arc::new(store))
            }
            None => {
                warn!("No store fixture configured; every cms directive will fall back");
                Ok(Arc::new(MemoryStore::new()))
            }
        }
    }
}

fn read_json(path: &Path) -> Result<Value, ApiError> {
    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ApiError::TemplateNotFound(path.to_path_buf()),
        _ => ApiError::IoError(e),
    })?;
    serde_json::from_str(&text).map_err(|source| ApiError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}

fn to_params(pairs: &[(String, Option<String>)]) -> Option<Params> {
    if pairs.is_empty() {
        return None;
    }
    Some(pairs.iter().cloned().collect())
}

fn describe_query(query: &Query) -> Value {
    json!({
        "module": query.module,
        "action": query.action,
        "target": query.target,
        "params": query.params,
        "canonical": query.to_string(),
    })
}
