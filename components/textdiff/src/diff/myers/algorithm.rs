//! Myers diff algorithm.
use crate::diff::myers::optimization::{collect_chunks, common_affixes};
use crate::diff::{DiffItem, LineHash};

/// Computes the minimal edit script turning `local` into `remote`.
///
/// Returned chunks are ordered, non-overlapping and maximal: two chunks are always
/// separated by at least one unchanged line. Replacing each chunk's local lines with
/// its remote lines, and copying everything else, reconstructs `remote`.
#[must_use]
pub fn line_diff(local: &[LineHash], remote: &[LineHash]) -> Vec<DiffItem> {
    let (prefix, suffix) = common_affixes(local, remote);
    let local_core = &local[prefix..local.len() - suffix];
    let remote_core = &remote[prefix..remote.len() - suffix];
    collect_chunks(&compute_ses(local_core, remote_core), prefix)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EditOp {
    Insert,
    Delete,
    Keep,
}

/// Furthest-reaching x per diagonal, captured at the start of one round.
struct Snapshot {
    lowest_k: isize,
    reach: Vec<isize>,
}

impl Snapshot {
    fn at(&self, k: isize) -> isize {
        self.reach[k.abs_diff(self.lowest_k)]
    }
}

fn diagonal(offset: usize, k: isize) -> usize {
    offset.wrapping_add_signed(k)
}

fn moves_down(k: isize, d: isize, below: isize, above: isize) -> bool {
    k == -d || (k != d && below < above)
}

#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub(crate) fn compute_ses(base: &[LineHash], target: &[LineHash]) -> Vec<EditOp> {
    let (n, m) = (base.len(), target.len());
    if n == 0 {
        return vec![EditOp::Insert; m];
    }
    if m == 0 {
        return vec![EditOp::Delete; n];
    }
    let max_d = n + m;
    let offset = max_d + 1;
    let mut v: Vec<isize> = vec![0; 2 * max_d + 3];
    let mut trace: Vec<Snapshot> = Vec::new();
    'outer: for d in 0..=max_d {
        trace.push(Snapshot {
            lowest_k: -(d as isize) - 1,
            reach: v[offset - d - 1..=offset + d + 1].to_vec(),
        });
        let d = d as isize;
        for k in (-d..=d).step_by(2) {
            let below = v[diagonal(offset, k - 1)];
            let above = v[diagonal(offset, k + 1)];
            let mut x = if moves_down(k, d, below, above) {
                above
            } else {
                below + 1
            };
            let mut y = x - k;
            while x < n as isize && y < m as isize && base[x as usize] == target[y as usize] {
                x += 1;
                y += 1;
            }
            v[diagonal(offset, k)] = x;
            if x >= n as isize && y >= m as isize {
                break 'outer;
            }
        }
    }
    backtrack(n, m, &trace)
}

#[allow(clippy::cast_possible_wrap)]
fn backtrack(n: usize, m: usize, trace: &[Snapshot]) -> Vec<EditOp> {
    let (mut edits, mut x, mut y) = (Vec::with_capacity(n + m), n as isize, m as isize);
    for (d, v) in trace.iter().enumerate().rev() {
        if d == 0 {
            while x > 0 && y > 0 {
                edits.push(EditOp::Keep);
                x -= 1;
                y -= 1;
            }
            break;
        }
        let (d, k) = (d as isize, x - y);
        let prev_k = if moves_down(k, d, v.at(k - 1), v.at(k + 1)) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = v.at(prev_k);
        let prev_y = prev_x - prev_k;
        while x > prev_x && y > prev_y {
            edits.push(EditOp::Keep);
            x -= 1;
            y -= 1;
        }
        edits.push(if x > prev_x {
            EditOp::Delete
        } else {
            EditOp::Insert
        });
        x = prev_x;
        y = prev_y;
    }
    edits.reverse();
    edits
}
