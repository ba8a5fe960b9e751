//! Tracing subscriber setup.

use anyhow::{Context, Result};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use super::config::TelemetrySettings;

/// Builder for setting up logging.
#[derive(Debug, Clone)]
pub struct TelemetryBuilder {
    log_level: String,
    json: bool,
}

impl Default for TelemetryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryBuilder {
    /// Human-readable output at `info`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }

    /// Takes level and format from `settings`.
    #[must_use]
    pub fn from_settings(settings: &TelemetrySettings) -> Self {
        Self {
            log_level: settings.log_level.clone(),
            json: settings.json,
        }
    }

    /// Filter used when `RUST_LOG` is not set.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Emit JSON lines.
    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level))
    }

    /// Installs the global subscriber.
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed.
    pub fn init(self) -> Result<()> {
        let fmt_layer = if self.json {
            fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .boxed()
        } else {
            fmt::layer()
                .with_target(false)
                .with_span_events(FmtSpan::CLOSE)
                .boxed()
        };

        Registry::default()
            .with(self.filter())
            .with(fmt_layer)
            .try_init()
            .context("Failed to init subscriber")?;

        Ok(())
    }
}
