//! Comparison settings.

use serde::Deserialize;
use textdiff::InternOptions;

/// How the equality processor compares files of equal size.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMethod {
    /// Compare bytes.
    #[default]
    Content,
    /// Trust equal size plus equal modification time.
    SizeAndTime,
}

/// Diff phase settings.
#[derive(Debug, Deserialize, Clone)]
pub struct DiffSettings {
    /// Compare lines case-insensitively (default: false)
    #[serde(default)]
    pub ignore_case: bool,

    /// Ignore all whitespace inside lines (default: false)
    #[serde(default)]
    pub ignore_whitespace: bool,

    /// Equality check for files of equal size (default: content)
    #[serde(default)]
    pub comparison: ComparisonMethod,

    /// Bytes inspected when sniffing for binary content (default: 8000)
    #[serde(default = "default_binary_probe_bytes")]
    pub binary_probe_bytes: usize,
}

impl DiffSettings {
    /// Line normalisation for the intern table.
    #[must_use]
    pub const fn intern_options(&self) -> InternOptions {
        InternOptions {
            ignore_case: self.ignore_case,
            ignore_whitespace: self.ignore_whitespace,
        }
    }
}

impl Default for DiffSettings {
    fn default() -> Self {
        Self {
            ignore_case: false,
            ignore_whitespace: false,
            comparison: ComparisonMethod::default(),
            binary_probe_bytes: default_binary_probe_bytes(),
        }
    }
}

fn default_binary_probe_bytes() -> usize {
    8000
}
