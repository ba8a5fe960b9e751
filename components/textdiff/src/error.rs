//! Error types for the diff algorithms.

use thiserror::Error;

/// Errors raised by the diff and merge algorithms.
///
/// Every variant except [`DiffError::Parse`] signals malformed input diffs or a bug;
/// none of them is recoverable by retrying.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiffError {
    /// The merge loop made no progress over its inputs.
    #[error("diff3 algorithm invariant broken: no progress at local chunk {local_index}, remote chunk {remote_index}")]
    Stalled {
        /// Index of the next unconsumed base→local chunk.
        local_index: usize,
        /// Index of the next unconsumed base→remote chunk.
        remote_index: usize,
    },

    /// A chunk could not be placed consistently with the running deltas.
    #[error("diff3 algorithm invariant broken at base line {base_line}: {reason}")]
    InvariantBroken {
        /// Base line of the offending chunk.
        base_line: usize,
        /// What went wrong.
        reason: &'static str,
    },

    /// Input chunks are not ordered by base line.
    #[error("diff chunks out of order: chunk at base line {next} follows chunk at {previous}")]
    UnorderedInput {
        /// Base start of the chunk emitted before.
        previous: usize,
        /// Base start of the offending chunk.
        next: usize,
    },

    /// The textual debug form could not be parsed.
    #[error("invalid diff item text: {0}")]
    Parse(String),
}
