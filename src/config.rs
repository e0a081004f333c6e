//! Configuration System
//!
//! Layered configuration for template locations, page URLs, the date reference
//! timezone, resolver limits and the content store fixture. Sources, lowest to
//! highest precedence: built-in defaults, the global user file, workspace files
//! (`config/config.toml`, then `config/{TRELLIS_ENV}.toml`), and `TRELLIS__*`
//! environment variables.

use crate::context::{PageOptions, ResolverOptions};
use crate::dates::{Clock, DateContext, DateSettings};
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::query::Params;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod merge;
mod sources;

/// UTC-6, the reference timezone content dates are displayed in by default
pub const DEFAULT_UTC_OFFSET_MINUTES: i64 = -360;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrellisConfig {
    /// Directory holding `global.json` and `pages/<name>.json`
    #[serde(default = "default_context_dir")]
    pub context_dir: PathBuf,

    #[serde(default)]
    pub urls: UrlConfig,

    #[serde(default)]
    pub dates: DateConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Base URLs copied into every page context
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UrlConfig {
    #[serde(default)]
    pub static_url: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub php_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateConfig {
    /// Reference timezone as minutes east of UTC
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i64,
}

impl Default for DateConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: default_utc_offset_minutes(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Per-directive backend timeout; unset means no timeout
    #[serde(default)]
    pub directive_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON fixture loaded into the in-memory store
    #[serde(default)]
    pub fixture: Option<PathBuf>,
}

fn default_context_dir() -> PathBuf {
    PathBuf::from("context")
}

fn default_utc_offset_minutes() -> i64 {
    DEFAULT_UTC_OFFSET_MINUTES
}

impl Default for TrellisConfig {
    fn default() -> Self {
        Self {
            context_dir: default_context_dir(),
            urls: UrlConfig::default(),
            dates: DateConfig::default(),
            resolver: ResolverConfig::default(),
            store: StoreConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Path(String, String),
    Url(String, String),
    Dates(String),
    Resolver(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Path(name, msg) => write!(f, "Path '{}': {}", name, msg),
            ValidationError::Url(name, msg) => write!(f, "URL '{}': {}", name, msg),
            ValidationError::Dates(msg) => write!(f, "Dates: {}", msg),
            ValidationError::Resolver(msg) => write!(f, "Resolver: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl TrellisConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.context_dir.as_os_str().is_empty() {
            errors.push(ValidationError::Path(
                "context_dir".to_string(),
                "cannot be empty".to_string(),
            ));
        }

        for (name, url) in [
            ("static_url", &self.urls.static_url),
            ("base_url", &self.urls.base_url),
            ("php_url", &self.urls.php_url),
        ] {
            if url.len() > 1 && url.ends_with('/') {
                errors.push(ValidationError::Url(
                    name.to_string(),
                    format!("{:?} must not end with '/'", url),
                ));
            }
        }

        if self.utc_offset().is_none() {
            errors.push(ValidationError::Dates(format!(
                "utc_offset_minutes {} is out of range (must be within ±1439)",
                self.dates.utc_offset_minutes
            )));
        }

        if self.resolver.directive_timeout_ms == Some(0) {
            errors.push(ValidationError::Resolver(
                "directive_timeout_ms must be greater than zero".to_string(),
            ));
        }

        if let Err(e) = crate::logging::validate_config(&self.logging) {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn utc_offset(&self) -> Option<chrono::FixedOffset> {
        i32::try_from(self.dates.utc_offset_minutes)
            .ok()
            .and_then(DateContext::offset_from_minutes)
    }

    /// Reference timezone with the system clock
    pub fn date_settings(&self) -> DateSettings {
        let offset = self.utc_offset().unwrap_or(DateSettings::default().offset);
        DateSettings::new(offset, Clock::System)
    }

    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            directive_timeout: self.resolver.directive_timeout_ms.map(Duration::from_millis),
        }
    }

    /// Page context options carrying the configured URLs and the request params
    pub fn page_options(&self, query: Option<Params>) -> PageOptions {
        PageOptions {
            static_url: self.urls.static_url.clone(),
            base_url: self.urls.base_url.clone(),
            php_url: self.urls.php_url.clone(),
            query,
        }
    }

    pub fn context_path(&self, workspace_root: &Path) -> PathBuf {
        workspace_root.join(&self.context_dir)
    }

    pub fn fixture_path(&self, workspace_root: &Path) -> Option<PathBuf> {
        self.store.fixture.as_ref().map(|p| workspace_root.join(p))
    }
}

/// Builds a [`TrellisConfig`] from all layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace
    pub fn load(workspace_root: &Path) -> Result<TrellisConfig, ApiError> {
        Self::load_with_file(workspace_root, None)
    }

    /// Load configuration, using `file` in place of the workspace config files when given
    pub fn load_with_file(
        workspace_root: &Path,
        file: Option<&Path>,
    ) -> Result<TrellisConfig, ApiError> {
        let builder = merge::merge_policy::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = match file {
            Some(path) => sources::workspace_file::add_file_to_builder(builder, path)?,
            None => sources::workspace_file::add_to_builder(builder, workspace_root)?,
        };
        let builder = sources::environment::add_to_builder(builder);

        let config: TrellisConfig = builder.build()?.try_deserialize()?;
        config.validate().map_err(|errors| {
            ApiError::ConfigError(
                errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        })?;
        Ok(config)
    }

    /// Path of the global user config file, if a home directory is known
    pub fn xdg_config_path() -> Option<PathBuf> {
        sources::global_file::global_config_path()
    }
}
