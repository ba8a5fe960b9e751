//! Merge output settings.

use std::path::PathBuf;

use serde::Deserialize;

/// Merge phase settings.
#[derive(Debug, Deserialize, Clone)]
pub struct MergeSettings {
    /// Output directory; the local tree is merged in place when unset.
    pub output_dir: Option<PathBuf>,

    /// Ask about unresolved chunks before merging (default: false)
    #[serde(default)]
    pub interactive: bool,

    /// Label on the local side of conflict markers (default: "local")
    #[serde(default = "default_local_label")]
    pub local_label: String,

    /// Label on the remote side of conflict markers (default: "remote")
    #[serde(default = "default_remote_label")]
    pub remote_label: String,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            output_dir: None,
            interactive: false,
            local_label: default_local_label(),
            remote_label: default_remote_label(),
        }
    }
}

fn default_local_label() -> String {
    "local".to_string()
}

fn default_remote_label() -> String {
    "remote".to_string()
}
