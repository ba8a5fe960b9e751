//! Per-node processing errors.

use std::io;
use std::path::{Path, PathBuf};

use textdiff::{DiffError, Location};
use thiserror::Error;

/// Error raised by a processor while working on one node.
///
/// These never escape the node: the pipeline stores them in the node state and
/// marks the node as failed, other nodes keep going.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// A processor needed a file the node does not have.
    #[error("{location} file reference missing")]
    MissingFile {
        /// Role of the missing file.
        location: Location,
    },

    /// The node has no file in any location.
    #[error("node has no files in any location")]
    NoFiles,

    /// The node has no output path to merge into.
    #[error("node has no merge target")]
    NoMergeTarget,

    /// The merge phase found no comparison result on the node.
    #[error("node was not compared before merging")]
    NotCompared,

    /// The diff algorithms rejected their input.
    #[error(transparent)]
    Diff(#[from] DiffError),

    /// The conflict resolver could not produce an answer.
    #[error("conflict resolver failed: {0}")]
    Resolver(String),

    /// A processor panicked; the panic was contained to this node.
    #[error("processor {processor} panicked: {message}")]
    Panicked {
        /// Name of the processor.
        processor: &'static str,
        /// Panic payload, when it was a string.
        message: String,
    },
}

impl ProcessError {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProcessError::io("/tmp/x.txt", io::Error::other("disk gone"));
        assert!(err.to_string().contains("/tmp/x.txt"));
        assert!(err.to_string().contains("disk gone"));

        let err = ProcessError::MissingFile {
            location: Location::Remote,
        };
        assert_eq!(err.to_string(), "remote file reference missing");
    }

    #[test]
    fn test_diff_error_converts() {
        let err: ProcessError = DiffError::Stalled {
            local_index: 1,
            remote_index: 2,
        }
        .into();
        assert!(matches!(err, ProcessError::Diff(_)));
        assert!(err.to_string().contains("invariant broken"));
    }
}
