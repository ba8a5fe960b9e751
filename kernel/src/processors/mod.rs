//! Built-in processors.
//!
//! | Phase | Priority | Processor |
//! |---|---|---|
//! | Diff | 10 | [`FileTypeProcessor`] |
//! | Diff | 20 | [`EqualityProcessor`] |
//! | Diff | 30 | [`TextDiffProcessor`] |
//! | Interactive | 10 | [`InteractiveProcessor`] |
//! | Merge | 10 | [`MergeProcessor`] |

pub mod equality;
pub mod file_type;
pub mod interactive;
pub mod merge;
pub mod text_diff;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::ProcessError;
use crate::infrastructure::config::Settings;
use crate::pipeline::Processor;

pub use equality::EqualityProcessor;
pub use file_type::FileTypeProcessor;
pub use interactive::{ConflictRequest, ConflictResolver, ConsoleResolver, InteractiveProcessor};
pub use merge::MergeProcessor;
pub use text_diff::TextDiffProcessor;

/// The built-in processors configured by `settings`.
///
/// The interactive processor is included when a resolver is given, or when
/// `merge.interactive` is set, in which case it prompts on stdin/stdout.
#[must_use]
pub fn default_processors(
    settings: &Settings,
    resolver: Option<Arc<dyn ConflictResolver>>,
) -> Vec<Arc<dyn Processor>> {
    let mut processors: Vec<Arc<dyn Processor>> = vec![
        Arc::new(FileTypeProcessor::new(settings.diff.binary_probe_bytes)),
        Arc::new(EqualityProcessor::new(settings.diff.comparison)),
        Arc::new(TextDiffProcessor::new(settings.diff.intern_options())),
        Arc::new(MergeProcessor::new(
            settings.merge.local_label.clone(),
            settings.merge.remote_label.clone(),
        )),
    ];
    let resolver = resolver.or_else(|| {
        settings
            .merge
            .interactive
            .then(|| Arc::new(ConsoleResolver::stdio()) as Arc<dyn ConflictResolver>)
    });
    if let Some(resolver) = resolver {
        processors.push(Arc::new(InteractiveProcessor::new(resolver)));
    }
    processors
}

pub(crate) fn read_text(path: &Path) -> Result<String, ProcessError> {
    fs::read_to_string(path).map_err(|e| ProcessError::io(path, e))
}
