//! Registration metadata attached to each processor.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tree::CompareMode;

/// Ordered pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Classify and compare files.
    Diff,
    /// Ask the user about unresolved chunks.
    Interactive,
    /// Write merged output.
    Merge,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Diff => "diff",
            Self::Interactive => "interactive",
            Self::Merge => "merge",
        })
    }
}

bitflags::bitflags! {
    /// Comparison modes a processor applies to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModeSet: u8 {
        /// Two-way comparisons.
        const TWO_WAY = 1 << 0;
        /// Three-way comparisons.
        const THREE_WAY = 1 << 1;
        /// Both modes.
        const BOTH = Self::TWO_WAY.bits() | Self::THREE_WAY.bits();
    }
}

impl From<CompareMode> for ModeSet {
    fn from(mode: CompareMode) -> Self {
        match mode {
            CompareMode::TwoWay => Self::TWO_WAY,
            CompareMode::ThreeWay => Self::THREE_WAY,
        }
    }
}

/// Phase, priority and modes of a processor.
///
/// Processors of one phase run in ascending priority order on each node; two
/// processors may not share a `(phase, priority)` slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorDescriptor {
    /// Name used in logs and errors.
    pub name: &'static str,
    /// Stage the processor belongs to.
    pub phase: Phase,
    /// Position within the phase, lowest first.
    pub priority: u32,
    /// Modes the processor applies to.
    pub modes: ModeSet,
}

impl ProcessorDescriptor {
    /// Describes a processor that applies to both modes.
    #[must_use]
    pub const fn new(name: &'static str, phase: Phase, priority: u32) -> Self {
        Self {
            name,
            phase,
            priority,
            modes: ModeSet::BOTH,
        }
    }

    /// Restricts the processor to `modes`.
    #[must_use]
    pub const fn with_modes(mut self, modes: ModeSet) -> Self {
        self.modes = modes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order() {
        assert!(Phase::Diff < Phase::Interactive);
        assert!(Phase::Interactive < Phase::Merge);
        assert_eq!(Phase::Merge.to_string(), "merge");
    }

    #[test]
    fn test_mode_set() {
        assert!(ModeSet::BOTH.contains(CompareMode::TwoWay.into()));
        assert!(!ModeSet::THREE_WAY.contains(CompareMode::TwoWay.into()));
        assert_eq!(ModeSet::BOTH, ModeSet::all());
        let d = ProcessorDescriptor::new("x", Phase::Diff, 5).with_modes(ModeSet::TWO_WAY);
        assert!(d.modes.contains(CompareMode::TwoWay.into()));
        assert!(!d.modes.contains(CompareMode::ThreeWay.into()));
    }
}
