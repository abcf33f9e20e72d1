//! Merge rules: defaults first, then file, then environment.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("main_entry_point", "main")?
        .set_default("multi_context", true)?
        .set_default("back.debounce_ms", 400)?
        .set_default("back.pop_threshold", 2)
}
