//! Configuration System
//!
//! Router policy settings: which entry point hosts the main context, whether
//! entry points get their own contexts, the back-navigation constants and
//! logging. Loaded from defaults, an optional TOML file and `NAVRELAY__*`
//! environment overrides, in that order.

use crate::error::RouterError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod merge;
mod sources;

pub use sources::environment::ENV_PREFIX;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Entry point whose context is the main one
    #[serde(default = "default_main_entry_point")]
    pub main_entry_point: String,

    /// One context per entry point; when false every page shares the main context
    #[serde(default = "default_true")]
    pub multi_context: bool,

    /// Back-navigation policy
    #[serde(default)]
    pub back: BackConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Back-navigation policy constants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackConfig {
    /// Presses closer together than this are treated as one
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Front-most stacks at or below this depth delegate to the host
    #[serde(default = "default_pop_threshold")]
    pub pop_threshold: usize,
}

fn default_main_entry_point() -> String {
    "main".to_string()
}

fn default_true() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    400
}

fn default_pop_threshold() -> usize {
    2
}

impl Default for BackConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            pop_threshold: default_pop_threshold(),
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            main_entry_point: default_main_entry_point(),
            multi_context: default_true(),
            back: BackConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MainEntryPoint(String),
    Back(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MainEntryPoint(msg) => write!(f, "main_entry_point: {}", msg),
            ValidationError::Back(msg) => write!(f, "back: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl RouterConfig {
    /// Load configuration: defaults, then `path` if given, then environment.
    pub fn load(path: Option<&Path>) -> Result<Self, RouterError> {
        let mut builder = merge::merge_policy::builder_with_defaults()?;
        if let Some(path) = path {
            builder = sources::file::add_to_builder(builder, path)?;
        }
        builder = sources::environment::add_to_builder(builder)?;

        let config: RouterConfig = builder.build()?.try_deserialize()?;
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            RouterError::Config(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(config)
    }

    /// Render as TOML, in the layout [`RouterConfig::load`] reads.
    pub fn to_toml(&self) -> Result<String, RouterError> {
        toml::to_string_pretty(self).map_err(|e| RouterError::Config(e.to_string()))
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.main_entry_point.trim().is_empty() {
            errors.push(ValidationError::MainEntryPoint(
                "cannot be empty".to_string(),
            ));
        }
        if self.back.pop_threshold == 0 {
            errors.push(ValidationError::Back(
                "pop_threshold must be at least 1".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
