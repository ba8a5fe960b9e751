//! Three-way merge algorithm.
use crate::diff::three_way::accumulator::{ChunkAccumulator, Pending};
use crate::diff::{Diff3Item, DiffItem, DifferencesStatus, LineHash};
use crate::error::DiffError;

/// Merges `diff_base_local` and `diff_base_remote` into three-way chunks.
///
/// Both diffs must come from [`line_diff`](crate::line_diff) against the same base,
/// with the base as the first argument. `local` and `remote` are the interned lines
/// of the two changed files and are only read to tell an identical change on both
/// sides from a conflicting one.
///
/// The output is ordered by base line, never overlaps in base coordinates and,
/// together with the unchanged lines between chunks, covers the whole base.
///
/// # Errors
///
/// Returns [`DiffError::UnorderedInput`] or [`DiffError::InvariantBroken`] when the
/// input diffs are not ordered, non-overlapping chunks of the same base, and
/// [`DiffError::Stalled`] if the merge loop stops making progress.
pub fn diff3_merge(
    diff_base_local: &[DiffItem],
    diff_base_remote: &[DiffItem],
    local: &[LineHash],
    remote: &[LineHash],
) -> Result<Vec<Diff3Item>, DiffError> {
    let mut output = ChunkAccumulator::default();
    let (mut li, mut ri) = (0, 0);
    while li < diff_base_local.len() || ri < diff_base_remote.len() {
        let before = (li, ri);
        match (diff_base_local.get(li), diff_base_remote.get(ri)) {
            (Some(l), Some(r)) if ends_before(l, r) => {
                output.push(local_only(l))?;
                li += 1;
            }
            (Some(l), Some(r)) if ends_before(r, l) => {
                output.push(remote_only(r))?;
                ri += 1;
            }
            (Some(l), Some(r)) => {
                output.push(both_sides(l, r, local, remote))?;
                li += 1;
                ri += 1;
            }
            (Some(l), None) => {
                output.push(local_only(l))?;
                li += 1;
            }
            (None, Some(r)) => {
                output.push(remote_only(r))?;
                ri += 1;
            }
            (None, None) => {}
        }
        if (li, ri) == before {
            return Err(DiffError::Stalled {
                local_index: li,
                remote_index: ri,
            });
        }
    }
    Ok(output.finish())
}

/// True when `first` starts strictly earlier and ends no later than `second` starts.
///
/// Base ranges are read from the first-sequence side of each two-way chunk.
fn ends_before(first: &DiffItem, second: &DiffItem) -> bool {
    first.local_start < second.local_start && first.local_end() <= second.local_start
}

#[allow(clippy::cast_possible_wrap)]
fn net(item: &DiffItem) -> isize {
    item.remote_affected as isize - item.local_affected as isize
}

/// A change made only on the local side; remote keeps the base lines.
fn local_only(item: &DiffItem) -> Pending {
    Pending {
        base_start: item.local_start,
        base_affected: item.local_affected,
        local_delta: net(item),
        remote_delta: 0,
        status: DifferencesStatus::BaseRemoteSame,
    }
}

/// A change made only on the remote side; local keeps the base lines.
fn remote_only(item: &DiffItem) -> Pending {
    Pending {
        base_start: item.local_start,
        base_affected: item.local_affected,
        local_delta: 0,
        remote_delta: net(item),
        status: DifferencesStatus::BaseLocalSame,
    }
}

/// Both sides changed lines at the same place: same edit or conflict.
fn both_sides(l: &DiffItem, r: &DiffItem, local: &[LineHash], remote: &[LineHash]) -> Pending {
    let start = l.local_start.min(r.local_start);
    let end = l.local_end().max(r.local_end());
    let same_shape = l.local_start == r.local_start
        && l.local_affected == r.local_affected
        && l.remote_affected == r.remote_affected;
    let status = if same_shape
        && local.get(l.remote_start..l.remote_end()) == remote.get(r.remote_start..r.remote_end())
    {
        DifferencesStatus::LocalRemoteSame
    } else {
        DifferencesStatus::AllDifferent
    };
    Pending {
        base_start: start,
        base_affected: end - start,
        local_delta: net(l),
        remote_delta: net(r),
        status,
    }
}
