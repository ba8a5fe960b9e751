//! Tree node and its mutable state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use textdiff::{Diff3Item, DiffItem, DifferencesStatus, Location, Locations, Resolution};

use crate::error::ProcessError;

/// Shared handle to a node. Each node is locked on its own so per-node
/// processor chains can run on any worker thread.
pub type NodeRef = Arc<RwLock<Node>>;

/// Number of files taking part in the comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareMode {
    /// Local against remote.
    TwoWay,
    /// Local and remote against a common base.
    ThreeWay,
}

impl CompareMode {
    /// Locations a node may occupy in this mode.
    #[must_use]
    pub const fn locations(self) -> Locations {
        match self {
            Self::TwoWay => Locations::LOCAL_REMOTE,
            Self::ThreeWay => Locations::all(),
        }
    }
}

/// Progress of a node through the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// Not looked at yet.
    #[default]
    Pending,
    /// The diff phase finished.
    Compared,
    /// Output was written without conflicts.
    Merged,
    /// Output was written but contains unresolved conflicts.
    Conflicted,
    /// A processor failed; see [`NodeState::error`].
    Error,
}

/// What the file type sniffing found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentKind {
    /// Not sniffed yet, or a directory.
    #[default]
    Unknown,
    /// Every present file looks like text.
    Text,
    /// At least one present file contains binary data.
    Binary,
}

/// Line diff results attached to a text file node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DiffPayload {
    /// Nothing computed (files equal, or a side is missing).
    #[default]
    Empty,
    /// Local→remote chunks.
    TwoWay(Vec<DiffItem>),
    /// Base/local/remote chunks.
    ThreeWay(Vec<Diff3Item>),
}

impl DiffPayload {
    /// Number of chunks that still need a decision.
    #[must_use]
    pub fn unresolved(&self) -> usize {
        match self {
            Self::Empty | Self::TwoWay(_) => 0,
            Self::ThreeWay(items) => items
                .iter()
                .filter(|i| i.resolution() == Resolution::Unresolved)
                .count(),
        }
    }
}

/// Shape of a node.
#[derive(Debug)]
pub enum NodeKind {
    /// A directory and its children.
    Directory(Vec<NodeRef>),
    /// A text file with its diff payload.
    DiffFile(DiffPayload),
    /// A file compared as a whole (binary, or not sniffed yet).
    PlainFile,
}

/// Mutable slot written by processors.
#[derive(Debug, Default)]
pub struct NodeState {
    /// Pipeline progress.
    pub status: NodeStatus,
    /// How the node's files relate, once compared.
    pub differences: Option<DifferencesStatus>,
    /// The error that put the node into [`NodeStatus::Error`].
    pub error: Option<ProcessError>,
    /// Result of file type sniffing.
    pub content: ContentKind,
}

/// One entry of the compared trees.
#[derive(Debug)]
pub struct Node {
    name: String,
    relative_path: PathBuf,
    mode: CompareMode,
    locations: Locations,
    files: [Option<PathBuf>; 3],
    target: Option<PathBuf>,
    /// Status, differences and captured error.
    pub state: NodeState,
    /// Directory children or file payload.
    pub kind: NodeKind,
}

impl Node {
    pub(crate) fn new(
        relative_path: PathBuf,
        mode: CompareMode,
        locations: Locations,
        files: [Option<PathBuf>; 3],
        target: Option<PathBuf>,
        kind: NodeKind,
    ) -> Self {
        let name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            relative_path,
            mode,
            locations,
            files,
            target,
            state: NodeState::default(),
            kind,
        }
    }

    /// Final path component; empty for the tree root.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path relative to the compared roots.
    #[must_use]
    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    /// Comparison mode of the tree this node belongs to.
    #[must_use]
    pub const fn mode(&self) -> CompareMode {
        self.mode
    }

    /// File reference in `location`, if the node exists there.
    #[must_use]
    pub fn file(&self, location: Location) -> Option<&Path> {
        self.files[location.index()].as_deref()
    }

    /// Like [`Node::file`] but a missing file is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::MissingFile`] if the node is absent in `location`.
    pub fn require_file(&self, location: Location) -> Result<&Path, ProcessError> {
        self.file(location)
            .ok_or(ProcessError::MissingFile { location })
    }

    /// Locations the node exists in.
    ///
    /// A location can be listed without a file reference when its root was
    /// never configured; [`Node::require_file`] reports those as missing.
    #[must_use]
    pub const fn locations(&self) -> Locations {
        self.locations
    }

    /// Where the merge phase writes this node.
    #[must_use]
    pub fn target(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    /// True for directory nodes.
    #[must_use]
    pub const fn is_directory(&self) -> bool {
        matches!(self.kind, NodeKind::Directory(_))
    }

    /// Handles to the children of a directory; empty for files.
    #[must_use]
    pub fn children(&self) -> Vec<NodeRef> {
        match &self.kind {
            NodeKind::Directory(children) => children.clone(),
            NodeKind::DiffFile(_) | NodeKind::PlainFile => Vec::new(),
        }
    }

    /// Line diff payload, if this is a text file node.
    #[must_use]
    pub const fn payload(&self) -> Option<&DiffPayload> {
        match &self.kind {
            NodeKind::DiffFile(payload) => Some(payload),
            NodeKind::Directory(_) | NodeKind::PlainFile => None,
        }
    }

    /// Records a failure and flags the node.
    pub fn mark_error(&mut self, error: ProcessError) {
        self.state.status = NodeStatus::Error;
        self.state.error = Some(error);
    }

    /// Clears everything processors wrote so the node can be processed again.
    pub fn reset(&mut self) {
        self.state = NodeState::default();
        if matches!(self.kind, NodeKind::DiffFile(_)) {
            self.kind = NodeKind::PlainFile;
        }
    }
}
