//! Phase-ordered processor pipeline.
//!
//! Processors are registered explicitly with a [`ProcessorDescriptor`]. Each
//! phase builds one ordered chain per tree mode and hands it, node by node, to
//! the configured [`ExecutionStrategy`]. The interactive phase always runs on
//! the serial strategy since it talks to a console in order.

pub mod descriptor;
pub mod execution;
pub mod processor;
pub mod registry;

use std::io;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::infrastructure::config::{ExecutionStrategyKind, Settings};
use crate::processors::{ConflictResolver, default_processors};
use crate::tree::NodeTree;

pub use descriptor::{ModeSet, Phase, ProcessorDescriptor};
pub use execution::{
    CancellationFlag, ChainOutcome, ChainTally, ExecutionStrategy, ParallelExecutor,
    SerialExecutor,
};
pub use processor::Processor;
pub use registry::{Chain, ProcessorRegistry, RegistrationError};

/// Errors raised while building a pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A processor could not be registered.
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    /// The worker pool could not be started.
    #[error("failed to start worker pool: {0}")]
    Runtime(#[from] io::Error),
}

/// Outcome of one phase over a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseReport {
    /// Phase that ran.
    pub phase: Phase,
    /// Nodes whose chain ran to the end.
    pub completed: usize,
    /// Nodes that failed during this phase.
    pub failed: usize,
    /// Nodes skipped because an earlier phase had failed them.
    pub skipped: usize,
    /// Nodes not finished because of cancellation.
    pub cancelled: usize,
}

impl PhaseReport {
    fn new(phase: Phase, tally: ChainTally) -> Self {
        Self {
            phase,
            completed: tally.completed,
            failed: tally.failed,
            skipped: tally.skipped,
            cancelled: tally.cancelled,
        }
    }
}

/// Registered processors plus the strategies that run them.
pub struct Pipeline {
    registry: ProcessorRegistry,
    strategy: Box<dyn ExecutionStrategy>,
    interactive: SerialExecutor,
    cancellation: CancellationFlag,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("registry", &self.registry)
            .field("strategy", &self.strategy.name())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Starts an empty builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Builds a pipeline with the built-in processors configured by `settings`.
    ///
    /// `resolver` is consulted by the interactive phase; without one that phase
    /// has no processor.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if registration or the worker pool fails.
    pub fn from_settings(
        settings: &Settings,
        resolver: Option<Arc<dyn ConflictResolver>>,
    ) -> Result<Self, PipelineError> {
        let mut builder = Self::builder().settings(settings);
        for processor in default_processors(settings, resolver) {
            builder = builder.register(processor)?;
        }
        builder.build()
    }

    /// Runs the diff phase.
    pub fn run_diff(&self, tree: &NodeTree) -> PhaseReport {
        self.run_phase(tree, Phase::Diff, self.strategy.as_ref())
    }

    /// Runs the interactive phase, always serially.
    pub fn run_interactive(&self, tree: &NodeTree) -> PhaseReport {
        self.run_phase(tree, Phase::Interactive, &self.interactive)
    }

    /// Runs the merge phase.
    pub fn run_merge(&self, tree: &NodeTree) -> PhaseReport {
        self.run_phase(tree, Phase::Merge, self.strategy.as_ref())
    }

    /// Runs every phase in order and stops early once cancelled.
    pub fn run_all(&self, tree: &NodeTree) -> Vec<PhaseReport> {
        let phases: [fn(&Self, &NodeTree) -> PhaseReport; 3] =
            [Self::run_diff, Self::run_interactive, Self::run_merge];
        let mut reports = Vec::with_capacity(phases.len());
        for run in phases {
            if self.cancellation.is_cancelled() {
                break;
            }
            reports.push(run(self, tree));
        }
        reports
    }

    /// Requests cooperative cancellation of the running and future phases.
    pub fn cancel(&self) {
        self.strategy.cancel();
    }

    /// Handle to the cancellation flag, for cancelling from another thread.
    #[must_use]
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancellation.clone()
    }

    /// Clears processor results on `tree` and the cancellation flag.
    pub fn reset(&self, tree: &NodeTree) {
        tree.reset();
        self.cancellation.reset();
    }

    /// Strategy running the diff and merge phases.
    #[must_use]
    pub fn strategy(&self) -> &dyn ExecutionStrategy {
        self.strategy.as_ref()
    }

    /// The processor registry.
    #[must_use]
    pub const fn registry(&self) -> &ProcessorRegistry {
        &self.registry
    }

    fn run_phase(
        &self,
        tree: &NodeTree,
        phase: Phase,
        strategy: &dyn ExecutionStrategy,
    ) -> PhaseReport {
        let start = Instant::now();
        let chain = self.registry.chain(phase, tree.mode());
        let nodes = tree.walk();
        if !chain.is_empty() {
            for node in nodes {
                strategy.submit(node, chain.clone());
            }
        }
        let report = PhaseReport::new(phase, strategy.wait());
        info!(
            phase = %phase,
            strategy = strategy.name(),
            processors = chain.len(),
            completed = report.completed,
            failed = report.failed,
            skipped = report.skipped,
            cancelled = report.cancelled,
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Phase finished"
        );
        report
    }
}

/// Collects processors and the execution settings for a [`Pipeline`].
#[derive(Debug)]
pub struct PipelineBuilder {
    registry: ProcessorRegistry,
    strategy: ExecutionStrategyKind,
    max_concurrent: usize,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self {
            registry: ProcessorRegistry::new(),
            strategy: ExecutionStrategyKind::Serial,
            max_concurrent: 1,
        }
    }
}

impl PipelineBuilder {
    /// Adds a processor.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::PriorityCollision`] if its slot is taken.
    pub fn register(mut self, processor: Arc<dyn Processor>) -> Result<Self, RegistrationError> {
        self.registry.register(processor)?;
        Ok(self)
    }

    /// Selects the strategy for the diff and merge phases.
    #[must_use]
    pub fn strategy(mut self, strategy: ExecutionStrategyKind, max_concurrent: usize) -> Self {
        self.strategy = strategy;
        self.max_concurrent = max_concurrent;
        self
    }

    /// Takes the strategy from `settings`.
    #[must_use]
    pub fn settings(self, settings: &Settings) -> Self {
        self.strategy(settings.execution.strategy, settings.execution.max_concurrent)
    }

    /// Finishes the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Runtime`] if the worker pool cannot start.
    pub fn build(self) -> Result<Pipeline, PipelineError> {
        let cancellation = CancellationFlag::new();
        let strategy: Box<dyn ExecutionStrategy> = match self.strategy {
            ExecutionStrategyKind::Serial => Box::new(SerialExecutor::new(cancellation.clone())),
            ExecutionStrategyKind::Parallel => Box::new(ParallelExecutor::new(
                self.max_concurrent,
                cancellation.clone(),
            )?),
        };
        Ok(Pipeline {
            registry: self.registry,
            strategy,
            interactive: SerialExecutor::new(cancellation.clone()),
            cancellation,
        })
    }
}
