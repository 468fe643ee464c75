//! Single entry point for loading configuration.

use super::merge::merge_policy;
use super::sources::{env, global_file, workspace_file};
use super::ScaffoldConfig;
use config::{ConfigError, File};
use std::path::{Path, PathBuf};

/// Loads `ScaffoldConfig` from the layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, then the global file, then `<workspace_root>/scaffold.toml`,
    /// then `SCAFFOLD__*` environment variables.
    pub fn load(workspace_root: &Path) -> Result<ScaffoldConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = env::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// Defaults overlaid with exactly one explicit file, which must exist.
    pub fn load_from_file(path: &Path) -> Result<ScaffoldConfig, ConfigError> {
        merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true))
            .build()?
            .try_deserialize()
    }

    /// Where the global config file is looked up.
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
