//! Merge rules: defaults first, each later source overrides earlier ones key by key.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with the built-in defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("context_dir", "context")?
        .set_default("dates.utc_offset_minutes", crate::config::DEFAULT_UTC_OFFSET_MINUTES)
}
