//! Output side of the three-way merge.
//!
//! Keeps the emitted chunks together with the running local/remote deltas and
//! folds a new chunk into its predecessor when the two share base lines.

use tracing::trace;

use crate::diff::{Diff3Item, DifferencesStatus, PreferredAction};
use crate::error::DiffError;

/// A chunk before its position in the untouched files is known.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Pending {
    pub base_start: usize,
    pub base_affected: usize,
    /// Net lines added (positive) or removed on the local side.
    pub local_delta: isize,
    /// Net lines added (positive) or removed on the remote side.
    pub remote_delta: isize,
    pub status: DifferencesStatus,
}

#[derive(Debug, Default)]
pub(crate) struct ChunkAccumulator {
    items: Vec<Diff3Item>,
    local_delta: isize,
    remote_delta: isize,
}

#[allow(clippy::cast_possible_wrap)]
fn delta(affected: usize, base_affected: usize) -> isize {
    affected as isize - base_affected as isize
}

impl ChunkAccumulator {
    /// Offset of local line numbers relative to base ones before the next chunk.
    pub(crate) const fn local_delta(&self) -> isize {
        self.local_delta
    }

    /// Offset of remote line numbers relative to base ones before the next chunk.
    pub(crate) const fn remote_delta(&self) -> isize {
        self.remote_delta
    }

    /// Appends a chunk, retracting and extending earlier chunks it overlaps.
    pub(crate) fn push(&mut self, mut chunk: Pending) -> Result<(), DiffError> {
        while let Some(previous) = self.items.last().copied() {
            if chunk.base_start < previous.base_start {
                return Err(DiffError::UnorderedInput {
                    previous: previous.base_start,
                    next: chunk.base_start,
                });
            }
            let touches =
                chunk.base_start < previous.base_end() || chunk.base_start == previous.base_start;
            if !touches {
                break;
            }
            trace!(
                base_start = previous.base_start,
                next_start = chunk.base_start,
                "retracting overlapped diff3 chunk"
            );
            self.retract();
            let end = previous.base_end().max(chunk.base_start + chunk.base_affected);
            chunk = Pending {
                base_start: previous.base_start,
                base_affected: end - previous.base_start,
                local_delta: delta(previous.local_affected, previous.base_affected)
                    + chunk.local_delta,
                remote_delta: delta(previous.remote_affected, previous.base_affected)
                    + chunk.remote_delta,
                status: DifferencesStatus::AllDifferent,
            };
        }
        let item = self.place(chunk)?;
        self.local_delta += delta(item.local_affected, item.base_affected);
        self.remote_delta += delta(item.remote_affected, item.base_affected);
        self.items.push(item);
        Ok(())
    }

    pub(crate) fn finish(self) -> Vec<Diff3Item> {
        self.items
    }

    fn retract(&mut self) {
        if let Some(item) = self.items.pop() {
            self.local_delta -= delta(item.local_affected, item.base_affected);
            self.remote_delta -= delta(item.remote_affected, item.base_affected);
        }
    }

    /// Projects a pending chunk into local and remote coordinates.
    fn place(&self, chunk: Pending) -> Result<Diff3Item, DiffError> {
        let broken = || DiffError::InvariantBroken {
            base_line: chunk.base_start,
            reason: "chunk projects to a negative line position or length",
        };
        let start = |delta: isize| chunk.base_start.checked_add_signed(delta).ok_or_else(broken);
        let affected =
            |delta: isize| chunk.base_affected.checked_add_signed(delta).ok_or_else(broken);
        Ok(Diff3Item {
            base_start: chunk.base_start,
            local_start: start(self.local_delta)?,
            remote_start: start(self.remote_delta)?,
            base_affected: chunk.base_affected,
            local_affected: affected(chunk.local_delta)?,
            remote_affected: affected(chunk.remote_delta)?,
            status: chunk.status,
            preferred_action: PreferredAction::Default,
        })
    }
}
