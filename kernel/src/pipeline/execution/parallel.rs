//! Worker-pool strategy on a tokio runtime.

use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

use crate::pipeline::registry::Chain;
use crate::tree::NodeRef;

use super::{CancellationFlag, ChainOutcome, ChainTally, ExecutionStrategy, run_chain};

/// Runs one chain per node on a bounded pool.
///
/// Chains run on the runtime's blocking pool because processors do synchronous
/// file I/O; the semaphore caps how many run at once. A node's chain never runs
/// on two workers, chains of different nodes run in any order.
pub struct ParallelExecutor {
    runtime: Runtime,
    semaphore: Arc<Semaphore>,
    tasks: Mutex<JoinSet<ChainOutcome>>,
    cancellation: CancellationFlag,
    max_concurrent: usize,
}

impl std::fmt::Debug for ParallelExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallelExecutor")
            .field("max_concurrent", &self.max_concurrent)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl ParallelExecutor {
    /// Creates a pool running at most `max_concurrent` chains at a time.
    ///
    /// # Errors
    ///
    /// Returns an error if the tokio runtime cannot be started.
    pub fn new(max_concurrent: usize, cancellation: CancellationFlag) -> io::Result<Self> {
        let max_concurrent = max_concurrent.max(1);
        let runtime = Builder::new_multi_thread()
            .worker_threads(max_concurrent.min(4))
            .max_blocking_threads(max_concurrent)
            .thread_name("treemerge-worker")
            .enable_all()
            .build()?;
        Ok(Self {
            runtime,
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            tasks: Mutex::new(JoinSet::new()),
            cancellation,
            max_concurrent,
        })
    }

    /// Upper bound on concurrently running chains.
    #[must_use]
    pub const fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}

impl ExecutionStrategy for ParallelExecutor {
    fn submit(&self, node: NodeRef, chain: Chain) {
        let semaphore = self.semaphore.clone();
        let cancellation = self.cancellation.clone();
        self.tasks.lock().spawn_on(
            async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return ChainOutcome::Cancelled;
                };
                let worker = tokio::task::spawn_blocking(move || {
                    run_chain(&node, &chain, &cancellation)
                });
                match worker.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!(error = %e, "Chain worker did not finish");
                        ChainOutcome::Failed
                    }
                }
            },
            self.runtime.handle(),
        );
    }

    fn wait(&self) -> ChainTally {
        let mut tasks = std::mem::take(&mut *self.tasks.lock());
        self.runtime.block_on(async move {
            let mut tally = ChainTally::default();
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(outcome) => tally.record(outcome),
                    Err(e) => {
                        warn!(error = %e, "Chain task did not finish");
                        tally.record(ChainOutcome::Failed);
                    }
                }
            }
            tally
        })
    }

    fn cancel(&self) {
        self.cancellation.cancel();
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    fn name(&self) -> &'static str {
        "parallel"
    }
}
