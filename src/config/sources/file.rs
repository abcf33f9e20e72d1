//! Router config file source (TOML).

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::Path;
use tracing::warn;

/// Add `path` to the builder. A missing file is tolerated with a warning.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if !path.exists() {
        warn!(
            config_path = %path.display(),
            "Router configuration file not found, using defaults"
        );
        return Ok(builder);
    }
    Ok(builder.add_source(File::from(path).required(true)))
}
