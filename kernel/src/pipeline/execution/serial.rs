//! Single-threaded strategy.

use parking_lot::Mutex;

use crate::pipeline::registry::Chain;
use crate::tree::NodeRef;

use super::{CancellationFlag, ChainTally, ExecutionStrategy, run_chain};

/// Runs each chain on the calling thread as soon as it is submitted.
///
/// Submission order is execution order, so a pre-order submission gives a
/// depth-first pre-order traversal.
#[derive(Debug, Default)]
pub struct SerialExecutor {
    cancellation: CancellationFlag,
    tally: Mutex<ChainTally>,
}

impl SerialExecutor {
    /// Creates an executor observing `cancellation`.
    #[must_use]
    pub fn new(cancellation: CancellationFlag) -> Self {
        Self {
            cancellation,
            tally: Mutex::new(ChainTally::default()),
        }
    }
}

impl ExecutionStrategy for SerialExecutor {
    fn submit(&self, node: NodeRef, chain: Chain) {
        let outcome = run_chain(&node, &chain, &self.cancellation);
        self.tally.lock().record(outcome);
    }

    fn wait(&self) -> ChainTally {
        std::mem::take(&mut *self.tally.lock())
    }

    fn cancel(&self) {
        self.cancellation.cancel();
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    fn name(&self) -> &'static str {
        "serial"
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use super::*;
    use crate::pipeline::execution::tests::{Recorder, sample_tree};
    use crate::pipeline::processor::Processor;
    use crate::tree::NodeStatus;

    #[test]
    fn test_serial_runs_in_preorder_and_isolates_failures() {
        let tree = sample_tree();
        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let chain: Chain = vec![
            Arc::new(Recorder {
                name: "first",
                priority: 1,
                log: log.clone(),
                fail_on: Some("bad"),
                panic_on: None,
            }) as Arc<dyn Processor>,
            Arc::new(Recorder {
                name: "second",
                priority: 2,
                log: log.clone(),
                fail_on: None,
                panic_on: None,
            }),
        ]
        .into();

        let executor = SerialExecutor::default();
        for node in tree.walk() {
            executor.submit(node, chain.clone());
        }
        let tally = executor.wait();
        assert_eq!(tally.completed, 6);
        assert_eq!(tally.failed, 1);

        let second: Vec<PathBuf> = log
            .lock()
            .iter()
            .filter(|(name, _)| *name == "second")
            .map(|(_, path)| path.clone())
            .collect();
        assert_eq!(
            second,
            ["", "a", "a/one.txt", "a/two.txt", "b", "c.txt"]
                .map(PathBuf::from)
                .to_vec()
        );
        let bad = tree.find("b/bad.txt").unwrap();
        assert_eq!(bad.read().state.status, NodeStatus::Error);

        // The tally is drained by wait.
        assert_eq!(executor.wait(), ChainTally::default());
    }

    #[test]
    fn test_serial_cancel_stops_scheduling() {
        let tree = sample_tree();
        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let chain: Chain = vec![Arc::new(Recorder {
            name: "only",
            priority: 1,
            log: log.clone(),
            fail_on: None,
            panic_on: None,
        }) as Arc<dyn Processor>]
        .into();

        let executor = SerialExecutor::default();
        let mut nodes = tree.walk().into_iter();
        executor.submit(nodes.next().unwrap(), chain.clone());
        executor.cancel();
        assert!(executor.is_cancelled());
        for node in nodes {
            executor.submit(node, chain.clone());
        }
        let tally = executor.wait();
        assert_eq!(tally.completed, 1);
        assert_eq!(tally.cancelled, 6);
        assert_eq!(log.lock().len(), 1);
    }
}
