//! Processor registration.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::tree::CompareMode;

use super::descriptor::Phase;
use super::processor::Processor;

/// Errors raised while setting up the pipeline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// Two processors claim the same `(phase, priority)` slot.
    #[error("priority collision in {phase} phase at {priority}: {incoming} conflicts with {existing}")]
    PriorityCollision {
        /// Phase of both processors.
        phase: Phase,
        /// Shared priority.
        priority: u32,
        /// Processor already registered.
        existing: &'static str,
        /// Processor being added.
        incoming: &'static str,
    },
}

/// Ordered per-node processor list for one phase.
pub type Chain = Arc<[Arc<dyn Processor>]>;

/// Processors keyed by `(phase, priority)`.
///
/// Built once before any traversal and read-only afterwards.
#[derive(Default)]
pub struct ProcessorRegistry {
    slots: BTreeMap<(Phase, u32), Arc<dyn Processor>>,
}

impl std::fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.slots.values().map(|p| p.descriptor()))
            .finish()
    }
}

impl ProcessorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a processor.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::PriorityCollision`] if the slot is taken.
    pub fn register(&mut self, processor: Arc<dyn Processor>) -> Result<(), RegistrationError> {
        let descriptor = processor.descriptor();
        let key = (descriptor.phase, descriptor.priority);
        if let Some(existing) = self.slots.get(&key) {
            return Err(RegistrationError::PriorityCollision {
                phase: descriptor.phase,
                priority: descriptor.priority,
                existing: existing.descriptor().name,
                incoming: descriptor.name,
            });
        }
        tracing::debug!(
            processor = descriptor.name,
            phase = %descriptor.phase,
            priority = descriptor.priority,
            "Registered processor"
        );
        self.slots.insert(key, processor);
        Ok(())
    }

    /// Processors of `phase` applicable to `mode`, lowest priority first.
    #[must_use]
    pub fn chain(&self, phase: Phase, mode: CompareMode) -> Chain {
        self.slots
            .range((phase, u32::MIN)..=(phase, u32::MAX))
            .map(|(_, p)| p)
            .filter(|p| p.descriptor().modes.contains(mode.into()))
            .cloned()
            .collect()
    }

    /// Number of registered processors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::descriptor::{ModeSet, ProcessorDescriptor};

    struct Named(ProcessorDescriptor);

    impl Processor for Named {
        fn descriptor(&self) -> ProcessorDescriptor {
            self.0
        }
    }

    fn named(name: &'static str, phase: Phase, priority: u32) -> Arc<dyn Processor> {
        Arc::new(Named(ProcessorDescriptor::new(name, phase, priority)))
    }

    #[test]
    fn test_collision_is_rejected() {
        let mut registry = ProcessorRegistry::new();
        registry.register(named("first", Phase::Diff, 10)).unwrap();
        let err = registry.register(named("second", Phase::Diff, 10)).unwrap_err();
        assert_eq!(
            err,
            RegistrationError::PriorityCollision {
                phase: Phase::Diff,
                priority: 10,
                existing: "first",
                incoming: "second",
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_same_priority_in_other_phase_is_fine() {
        let mut registry = ProcessorRegistry::new();
        registry.register(named("a", Phase::Diff, 10)).unwrap();
        registry.register(named("b", Phase::Merge, 10)).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_chain_is_ordered_and_filtered() {
        let mut registry = ProcessorRegistry::new();
        registry.register(named("late", Phase::Diff, 30)).unwrap();
        registry.register(named("early", Phase::Diff, 10)).unwrap();
        registry.register(named("merge", Phase::Merge, 1)).unwrap();
        registry
            .register(Arc::new(Named(
                ProcessorDescriptor::new("three", Phase::Diff, 20).with_modes(ModeSet::THREE_WAY),
            )))
            .unwrap();

        let names = |mode| {
            registry
                .chain(Phase::Diff, mode)
                .iter()
                .map(|p| p.descriptor().name)
                .collect::<Vec<_>>()
        };
        assert_eq!(names(CompareMode::ThreeWay), ["early", "three", "late"]);
        assert_eq!(names(CompareMode::TwoWay), ["early", "late"]);
    }
}
