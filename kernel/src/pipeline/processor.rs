//! The processor contract.

use crate::error::ProcessError;
use crate::tree::Node;

use super::descriptor::ProcessorDescriptor;

/// One step of a phase, applied to every node of a tree.
///
/// The pipeline holds the node's write lock for the duration of the call. A
/// returned error marks only this node as failed and skips the rest of its chain.
pub trait Processor: Send + Sync {
    /// Registration metadata.
    fn descriptor(&self) -> ProcessorDescriptor;

    /// Handles a directory node. Does nothing by default.
    ///
    /// # Errors
    ///
    /// Any [`ProcessError`]; it is recorded on the node.
    fn process_directory(&self, _node: &mut Node) -> Result<(), ProcessError> {
        Ok(())
    }

    /// Handles a file node. Does nothing by default.
    ///
    /// # Errors
    ///
    /// Any [`ProcessError`]; it is recorded on the node.
    fn process_file(&self, _node: &mut Node) -> Result<(), ProcessError> {
        Ok(())
    }

    /// Dispatches on the node shape.
    ///
    /// # Errors
    ///
    /// Whatever the shape-specific method returns.
    fn process(&self, node: &mut Node) -> Result<(), ProcessError> {
        if node.is_directory() {
            self.process_directory(node)
        } else {
            self.process_file(node)
        }
    }
}
