//! Execution strategy settings.

use serde::Deserialize;

/// Strategy used for the diff and merge phases.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategyKind {
    /// One node at a time on the calling thread.
    Serial,
    /// One chain per node on a bounded worker pool.
    #[default]
    Parallel,
}

/// Execution settings.
#[derive(Debug, Deserialize, Clone)]
pub struct ExecutionSettings {
    /// Strategy for the diff and merge phases (default: parallel)
    #[serde(default)]
    pub strategy: ExecutionStrategyKind,

    /// Maximum number of node chains running at once (default: 4)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            strategy: ExecutionStrategyKind::default(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

fn default_max_concurrent() -> usize {
    4
}
