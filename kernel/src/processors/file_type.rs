//! Text/binary sniffing.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::ProcessError;
use crate::pipeline::{Phase, Processor, ProcessorDescriptor};
use crate::tree::{ContentKind, DiffPayload, Node, NodeKind};

/// Marks file nodes as text or binary by looking for NUL bytes near the start.
///
/// Text nodes become [`NodeKind::DiffFile`] so the line diff picks them up.
#[derive(Debug, Clone)]
pub struct FileTypeProcessor {
    probe_bytes: usize,
}

impl FileTypeProcessor {
    /// Inspects the first `probe_bytes` bytes of each file.
    #[must_use]
    pub const fn new(probe_bytes: usize) -> Self {
        Self { probe_bytes }
    }

    fn is_binary(&self, path: &Path) -> Result<bool, ProcessError> {
        let file = File::open(path).map_err(|e| ProcessError::io(path, e))?;
        let mut head = Vec::with_capacity(self.probe_bytes.min(64 * 1024));
        file.take(u64::try_from(self.probe_bytes).unwrap_or(u64::MAX))
            .read_to_end(&mut head)
            .map_err(|e| ProcessError::io(path, e))?;
        Ok(head.contains(&0))
    }
}

impl Processor for FileTypeProcessor {
    fn descriptor(&self) -> ProcessorDescriptor {
        ProcessorDescriptor::new("file-type", Phase::Diff, 10)
    }

    fn process_file(&self, node: &mut Node) -> Result<(), ProcessError> {
        let present = node.locations();
        if present.is_empty() {
            return Err(ProcessError::NoFiles);
        }
        let mut binary = false;
        for location in present.members() {
            if let Some(path) = node.file(location) {
                if self.is_binary(path)? {
                    binary = true;
                    break;
                }
            }
        }
        if binary {
            node.state.content = ContentKind::Binary;
            node.kind = NodeKind::PlainFile;
        } else {
            node.state.content = ContentKind::Text;
            node.kind = NodeKind::DiffFile(DiffPayload::Empty);
        }
        Ok(())
    }
}
