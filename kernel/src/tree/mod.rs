//! Node tree handed to the pipeline by the directory crawler.
//!
//! Every node sits behind its own lock so the parallel strategy can run one
//! processor chain per node without any tree-wide synchronisation.

mod builder;
mod node;

use std::path::{Path, PathBuf};

use serde::Serialize;
use textdiff::Location;

pub use builder::TreeBuilder;
pub use node::{
    CompareMode, ContentKind, DiffPayload, Node, NodeKind, NodeRef, NodeState, NodeStatus,
};

/// A compared set of directory trees.
#[derive(Debug)]
pub struct NodeTree {
    mode: CompareMode,
    roots: [Option<PathBuf>; 3],
    output_root: Option<PathBuf>,
    root: NodeRef,
}

impl NodeTree {
    /// Comparison mode of every node in the tree.
    #[must_use]
    pub const fn mode(&self) -> CompareMode {
        self.mode
    }

    /// Root directory of the given side, if one was configured.
    #[must_use]
    pub fn root_path(&self, location: Location) -> Option<&Path> {
        self.roots[location.index()].as_deref()
    }

    /// Directory the merge phase writes into.
    #[must_use]
    pub fn output_root(&self) -> Option<&Path> {
        self.output_root.as_deref()
    }

    /// The root node.
    #[must_use]
    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    /// All nodes, depth-first pre-order, root first.
    #[must_use]
    pub fn walk(&self) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut stack = vec![self.root.clone()];
        while let Some(node) = stack.pop() {
            let children = node.read().children();
            stack.extend(children.into_iter().rev());
            out.push(node);
        }
        out
    }

    /// Looks a node up by its path relative to the roots.
    #[must_use]
    pub fn find(&self, relative_path: impl AsRef<Path>) -> Option<NodeRef> {
        let wanted = relative_path.as_ref();
        self.walk()
            .into_iter()
            .find(|node| node.read().relative_path() == wanted)
    }

    /// Clears processor results on every node so the tree can be processed again.
    pub fn reset(&self) {
        for node in self.walk() {
            node.write().reset();
        }
    }

    /// Per-status node counts.
    #[must_use]
    pub fn summary(&self) -> TreeSummary {
        let mut summary = TreeSummary::default();
        for node in self.walk() {
            let node = node.read();
            summary.total += 1;
            match node.state.status {
                NodeStatus::Pending => summary.pending += 1,
                NodeStatus::Compared => summary.compared += 1,
                NodeStatus::Merged => summary.merged += 1,
                NodeStatus::Conflicted => summary.conflicted += 1,
                NodeStatus::Error => summary.failed += 1,
            }
        }
        summary
    }
}

/// Node counts by status, as shown after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TreeSummary {
    /// Every node including the root.
    pub total: usize,
    /// Nodes no phase touched.
    pub pending: usize,
    /// Nodes that finished the diff phase.
    pub compared: usize,
    /// Nodes merged cleanly.
    pub merged: usize,
    /// Nodes written with conflict markers or left unresolved.
    pub conflicted: usize,
    /// Nodes in error.
    pub failed: usize,
}
