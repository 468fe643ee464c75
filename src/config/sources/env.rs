//! Environment source: SCAFFOLD__ENGINE__CHECKPOINT_PATH and friends.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub const ENV_PREFIX: &str = "SCAFFOLD";
pub const ENV_SEPARATOR: &str = "__";

/// Add environment overrides; they take precedence over every file.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    )
}
