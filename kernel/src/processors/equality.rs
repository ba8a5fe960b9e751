//! Whole-file equality via [`ThreeWayState`] probes.

use std::fs::{self, File, Metadata};
use std::io::{self, BufReader, Read};
use std::path::Path;

use textdiff::{DifferencesStatus, Location, Locations, Pair, ThreeWayState};
use tracing::trace;

use crate::error::ProcessError;
use crate::infrastructure::config::ComparisonMethod;
use crate::pipeline::{Phase, Processor, ProcessorDescriptor};
use crate::tree::{CompareMode, Node, NodeStatus};

const BLOCK_SIZE: usize = 64 * 1024;

/// Works out which of a node's files are equal and records the status.
///
/// Sizes are compared first; pairs that survive are then compared by content
/// or by modification time. Each probe only ever rules pairs out, and the
/// surviving set is recalculated before every check.
#[derive(Debug, Clone)]
pub struct EqualityProcessor {
    method: ComparisonMethod,
}

impl EqualityProcessor {
    /// Compares equal-sized files with `method`.
    #[must_use]
    pub const fn new(method: ComparisonMethod) -> Self {
        Self { method }
    }

    fn probe_pair(
        &self,
        node: &Node,
        metadata: &[Option<Metadata>; 3],
        pair: Pair,
    ) -> Result<bool, ProcessError> {
        let (a, b) = pair.members();
        let (Some(meta_a), Some(meta_b)) = (&metadata[a.index()], &metadata[b.index()]) else {
            return Ok(true);
        };
        match self.method {
            ComparisonMethod::Content => {
                let path_a = node.require_file(a)?;
                let path_b = node.require_file(b)?;
                Ok(!same_content(path_a, path_b)?)
            }
            ComparisonMethod::SizeAndTime => {
                let time_a = meta_a.modified().ok();
                let time_b = meta_b.modified().ok();
                Ok(time_a.is_none() || time_a != time_b)
            }
        }
    }
}

fn status(mode: CompareMode, state: &ThreeWayState, present: Locations) -> DifferencesStatus {
    match mode {
        CompareMode::ThreeWay => state.differences_status(present),
        CompareMode::TwoWay => state.two_way_status(),
    }
}

fn seeded(present: Locations) -> ThreeWayState {
    let mut state = ThreeWayState::new();
    for location in present.members() {
        state.add_possibility(location);
    }
    state.seed_combinations();
    state
}

impl Processor for EqualityProcessor {
    fn descriptor(&self) -> ProcessorDescriptor {
        ProcessorDescriptor::new("equality", Phase::Diff, 20)
    }

    fn process_directory(&self, node: &mut Node) -> Result<(), ProcessError> {
        let present = node.locations();
        let state = seeded(present);
        node.state.differences = Some(status(node.mode(), &state, present));
        node.state.status = NodeStatus::Compared;
        Ok(())
    }

    fn process_file(&self, node: &mut Node) -> Result<(), ProcessError> {
        let present = node.locations();
        if present.is_empty() {
            return Err(ProcessError::NoFiles);
        }
        let mut state = seeded(present);

        let metadata = Location::ALL.map(|l| node.file(l).map(fs::metadata));
        let metadata: [Option<Metadata>; 3] = {
            let mut out = [None, None, None];
            for (location, entry) in Location::ALL.into_iter().zip(metadata) {
                if let Some(result) = entry {
                    let path = node.require_file(location)?;
                    out[location.index()] = Some(result.map_err(|e| ProcessError::io(path, e))?);
                }
            }
            out
        };

        for pair in Pair::ALL {
            if state.needs_probe(pair) {
                let (a, b) = pair.members();
                let size = |l: Location| metadata[l.index()].as_ref().map(Metadata::len);
                state.check_combination(pair, size(a) != size(b));
            }
        }

        state.derive_possible_files();
        for pair in Pair::ALL {
            if state.needs_probe(pair) {
                let different = self.probe_pair(node, &metadata, pair)?;
                state.check_combination(pair, different);
            }
        }
        state.derive_possible_files();

        let differences = status(node.mode(), &state, present);
        trace!(
            path = %node.relative_path().display(),
            ?differences,
            remaining = state.remaining_combinations().pairs().count(),
            "Equality computed"
        );
        node.state.differences = Some(differences);
        node.state.status = NodeStatus::Compared;
        Ok(())
    }
}

fn same_content(a: &Path, b: &Path) -> Result<bool, ProcessError> {
    let open = |p: &Path| File::open(p).map(BufReader::new).map_err(|e| ProcessError::io(p, e));
    let mut reader_a = open(a)?;
    let mut reader_b = open(b)?;
    let mut block_a = vec![0u8; BLOCK_SIZE];
    let mut block_b = vec![0u8; BLOCK_SIZE];
    loop {
        let read_a = fill(&mut reader_a, &mut block_a).map_err(|e| ProcessError::io(a, e))?;
        let read_b = fill(&mut reader_b, &mut block_b).map_err(|e| ProcessError::io(b, e))?;
        if read_a != read_b || block_a[..read_a] != block_b[..read_b] {
            return Ok(false);
        }
        if read_a == 0 {
            return Ok(true);
        }
    }
}

/// Reads until `buf` is full or the reader is exhausted.
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
