//! Configuration management.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `TREEMERGE__<SECTION>__<KEY>` environment variables.
//!
//! # Example
//!
//! ```
//! use treemerge_kernel::infrastructure::config::Settings;
//!
//! let settings = Settings::new().expect("Failed to load configuration");
//! assert!(settings.execution.max_concurrent >= 1);
//! ```

pub mod diff;
pub mod execution;
pub mod merge;
pub mod telemetry;

pub use diff::{ComparisonMethod, DiffSettings};
pub use execution::{ExecutionSettings, ExecutionStrategyKind};
pub use merge::MergeSettings;
pub use telemetry::TelemetrySettings;

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const ENV_PREFIX: &str = "TREEMERGE";

/// Top-level configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    /// Execution strategy settings.
    #[serde(default)]
    pub execution: ExecutionSettings,
    /// Diff phase settings.
    #[serde(default)]
    pub diff: DiffSettings,
    /// Merge phase settings.
    #[serde(default)]
    pub merge: MergeSettings,
    /// Logging settings.
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Loads defaults overridden by environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be built or deserialized.
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(None, environment())
    }

    /// Loads defaults, then `path`, then environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or invalid, or deserialization fails.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load(Some(path.as_ref()), environment())
    }

    fn load(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("execution.strategy", "parallel")?
            .set_default("execution.max_concurrent", 4)?
            .set_default("telemetry.log_level", "info")?;
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let mut settings: Self = builder.add_source(env).build()?.try_deserialize()?;
        settings.execution.max_concurrent = settings.execution.max_concurrent.max(1);
        Ok(settings)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}
