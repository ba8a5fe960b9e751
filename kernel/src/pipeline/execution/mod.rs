//! Execution strategies.
//!
//! A strategy receives one processor chain per node and runs it. Within a chain
//! the processors run strictly in order on the same node; across nodes the
//! parallel strategy gives no ordering guarantee.

mod parallel;
mod serial;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use crate::error::ProcessError;
use crate::tree::{NodeRef, NodeStatus};

use super::registry::Chain;

pub use parallel::ParallelExecutor;
pub use serial::SerialExecutor;

/// Cooperative cancellation shared by a pipeline and its strategies.
///
/// Checked between chain links; a running processor is never interrupted.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Creates a flag that is not set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clears the flag so new work can be scheduled.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// How one node's chain ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOutcome {
    /// Every processor ran.
    Completed,
    /// A processor failed and the node was marked as such.
    Failed,
    /// The node was already in error; nothing ran.
    Skipped,
    /// Cancellation stopped the chain before its end.
    Cancelled,
}

/// Chain outcomes collected by [`ExecutionStrategy::wait`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainTally {
    /// Chains that ran to the end.
    pub completed: usize,
    /// Chains that stopped on an error.
    pub failed: usize,
    /// Chains skipped because their node had already failed.
    pub skipped: usize,
    /// Chains cut short by cancellation.
    pub cancelled: usize,
}

impl ChainTally {
    pub(crate) fn record(&mut self, outcome: ChainOutcome) {
        match outcome {
            ChainOutcome::Completed => self.completed += 1,
            ChainOutcome::Failed => self.failed += 1,
            ChainOutcome::Skipped => self.skipped += 1,
            ChainOutcome::Cancelled => self.cancelled += 1,
        }
    }
}

/// Runs processor chains for nodes.
pub trait ExecutionStrategy: Send + Sync {
    /// Schedules `chain` on `node`.
    fn submit(&self, node: NodeRef, chain: Chain);

    /// Blocks until every submitted chain has finished and returns their tally.
    fn wait(&self) -> ChainTally;

    /// Requests cooperative cancellation.
    fn cancel(&self);

    /// Returns true once cancellation was requested.
    fn is_cancelled(&self) -> bool;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Runs `chain` on `node`, containing failures to the node.
pub(crate) fn run_chain(node: &NodeRef, chain: &Chain, cancellation: &CancellationFlag) -> ChainOutcome {
    if cancellation.is_cancelled() {
        return ChainOutcome::Cancelled;
    }
    let mut node = node.write();
    if node.state.status == NodeStatus::Error {
        return ChainOutcome::Skipped;
    }
    for processor in chain.iter() {
        if cancellation.is_cancelled() {
            return ChainOutcome::Cancelled;
        }
        let name = processor.descriptor().name;
        let result = panic::catch_unwind(AssertUnwindSafe(|| processor.process(&mut node)));
        let error = match result {
            Ok(Ok(())) => {
                debug!(processor = name, path = %node.relative_path().display(), "Processor finished");
                continue;
            }
            Ok(Err(err)) => err,
            Err(payload) => ProcessError::Panicked {
                processor: name,
                message: panic_message(payload.as_ref()),
            },
        };
        warn!(
            processor = name,
            path = %node.relative_path().display(),
            error = %error,
            "Node failed"
        );
        node.mark_error(error);
        return ChainOutcome::Failed;
    }
    ChainOutcome::Completed
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
