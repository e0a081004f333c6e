//! Environment source: TRELLIS__SECTION__KEY=value (double underscore separates levels)

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("TRELLIS")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}
