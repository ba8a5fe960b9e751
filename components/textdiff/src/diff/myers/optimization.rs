//! Pre- and post-processing around the Myers search.
//!
//! Stripping the common prefix and suffix shrinks the edit graph without changing
//! the minimal edit distance; coalescing folds the raw edit script into chunks.

use crate::diff::myers::algorithm::EditOp;
use crate::diff::{DiffItem, LineHash};

/// Lengths of the longest common prefix and, after it, the longest common suffix.
pub(crate) fn common_affixes(local: &[LineHash], remote: &[LineHash]) -> (usize, usize) {
    let prefix = local
        .iter()
        .zip(remote)
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = local[prefix..]
        .iter()
        .rev()
        .zip(remote[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();
    (prefix, suffix)
}

/// Folds an edit script into maximal change chunks.
///
/// A chunk only ends at a kept line, so a run of deletions and insertions
/// always becomes one [`DiffItem`]. `offset` is the number of common prefix
/// lines stripped before the script was computed.
pub(crate) fn collect_chunks(script: &[EditOp], offset: usize) -> Vec<DiffItem> {
    let (mut items, mut local, mut remote) = (Vec::new(), offset, offset);
    let mut current: Option<DiffItem> = None;
    for edit in script {
        match edit {
            EditOp::Keep => {
                if let Some(item) = current.take() {
                    items.push(item);
                }
                local += 1;
                remote += 1;
            }
            EditOp::Delete => {
                current
                    .get_or_insert_with(|| DiffItem::new(local, 0, remote, 0))
                    .local_affected += 1;
                local += 1;
            }
            EditOp::Insert => {
                current
                    .get_or_insert_with(|| DiffItem::new(local, 0, remote, 0))
                    .remote_affected += 1;
                remote += 1;
            }
        }
    }
    if let Some(item) = current {
        items.push(item);
    }
    items
}
