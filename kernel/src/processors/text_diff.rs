//! Line diff of text files.

use textdiff::{DifferencesStatus, InternOptions, LineInterner, Location, diff3_merge, line_diff};

use crate::error::ProcessError;
use crate::pipeline::{Phase, Processor, ProcessorDescriptor};
use crate::tree::{CompareMode, DiffPayload, Node, NodeKind};

use super::read_text;

/// Computes line-level chunks for text files that differ.
///
/// Each node gets its own intern table, so concurrent nodes share nothing. A
/// missing base is diffed as an empty file; nodes missing local or remote keep
/// an empty payload and are merged as whole files.
#[derive(Debug, Clone, Default)]
pub struct TextDiffProcessor {
    options: InternOptions,
}

impl TextDiffProcessor {
    /// Interns lines with `options`.
    #[must_use]
    pub const fn new(options: InternOptions) -> Self {
        Self { options }
    }
}

impl Processor for TextDiffProcessor {
    fn descriptor(&self) -> ProcessorDescriptor {
        ProcessorDescriptor::new("text-diff", Phase::Diff, 30)
    }

    fn process_file(&self, node: &mut Node) -> Result<(), ProcessError> {
        if !matches!(node.kind, NodeKind::DiffFile(_)) {
            return Ok(());
        }
        if node.state.differences == Some(DifferencesStatus::AllSame) {
            return Ok(());
        }
        let (Some(local_path), Some(remote_path)) =
            (node.file(Location::Local), node.file(Location::Remote))
        else {
            return Ok(());
        };

        let mut interner = LineInterner::with_options(self.options);
        let local = interner.intern_text(&read_text(local_path)?);
        let remote = interner.intern_text(&read_text(remote_path)?);

        let payload = match node.mode() {
            CompareMode::TwoWay => DiffPayload::TwoWay(line_diff(&local, &remote)),
            CompareMode::ThreeWay => {
                let base_text = match node.file(Location::Base) {
                    Some(path) => read_text(path)?,
                    None => String::new(),
                };
                let base = interner.intern_text(&base_text);
                DiffPayload::ThreeWay(diff3_merge(
                    &line_diff(&base, &local),
                    &line_diff(&base, &remote),
                    &local,
                    &remote,
                )?)
            }
        };
        node.kind = NodeKind::DiffFile(payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use textdiff::{Locations, format_items};

    use super::*;
    use crate::tree::{NodeRef, NodeTree, TreeBuilder};

    fn three_way(base: Option<&str>, local: &str, remote: &str) -> (NodeTree, [tempfile::TempDir; 3]) {
        let dirs = [(); 3].map(|()| tempfile::tempdir().unwrap());
        let mut present = Locations::LOCAL_REMOTE;
        if let Some(base) = base {
            fs::write(dirs[0].path().join("f.txt"), base).unwrap();
            present |= Locations::BASE;
        }
        fs::write(dirs[1].path().join("f.txt"), local).unwrap();
        fs::write(dirs[2].path().join("f.txt"), remote).unwrap();
        let tree = TreeBuilder::new(CompareMode::ThreeWay)
            .root(Location::Base, dirs[0].path())
            .root(Location::Local, dirs[1].path())
            .root(Location::Remote, dirs[2].path())
            .file("f.txt", present)
            .build();
        (tree, dirs)
    }

    fn run(processor: &TextDiffProcessor, node: &NodeRef) -> String {
        {
            let mut node = node.write();
            node.kind = NodeKind::DiffFile(DiffPayload::Empty);
            processor.process(&mut node).unwrap();
        }
        match node.read().payload() {
            Some(DiffPayload::ThreeWay(items)) => format_items(items),
            Some(DiffPayload::TwoWay(items)) => format_items(items),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_three_way_payload() {
        let (tree, _dirs) = three_way(Some("a\nb\nc\n"), "a\nB\nc\n", "a\nb\nc\nd\n");
        let node = tree.find("f.txt").unwrap();
        assert_eq!(
            run(&TextDiffProcessor::default(), &node),
            "1.1.1^1.1.1#3.3.3^0.0.1"
        );
    }

    #[test]
    fn test_missing_base_is_empty() {
        let (tree, _dirs) = three_way(None, "x\ny\n", "x\nz\n");
        let node = tree.find("f.txt").unwrap();
        // Both sides added the whole file differently.
        assert_eq!(run(&TextDiffProcessor::default(), &node), "0.0.0^0.2.2!!");
    }

    #[test]
    fn test_normalisation_hides_case_changes() {
        let (tree, _dirs) = three_way(Some("Hello\nWorld\n"), "hello\nworld\n", "HELLO\nWORLD\n");
        let node = tree.find("f.txt").unwrap();
        let processor = TextDiffProcessor::new(InternOptions {
            ignore_case: true,
            ignore_whitespace: false,
        });
        assert_eq!(run(&processor, &node), "");
    }

    #[test]
    fn test_skips_equal_and_plain_nodes() {
        let (tree, _dirs) = three_way(Some("a\n"), "a\n", "b\n");
        let node = tree.find("f.txt").unwrap();
        let processor = TextDiffProcessor::default();

        processor.process(&mut node.write()).unwrap();
        assert!(matches!(node.read().kind, NodeKind::PlainFile));

        {
            let mut node = node.write();
            node.kind = NodeKind::DiffFile(DiffPayload::Empty);
            node.state.differences = Some(DifferencesStatus::AllSame);
            processor.process(&mut node).unwrap();
        }
        assert_eq!(node.read().payload(), Some(&DiffPayload::Empty));
    }

    #[test]
    fn test_two_way_payload() {
        let local = tempfile::tempdir().unwrap();
        let remote = tempfile::tempdir().unwrap();
        fs::write(local.path().join("f"), "a\nb\nc\nd\n").unwrap();
        fs::write(remote.path().join("f"), "a\nb\nc\nx\ny\nd\n").unwrap();
        let tree = TreeBuilder::new(CompareMode::TwoWay)
            .root(Location::Local, local.path())
            .root(Location::Remote, remote.path())
            .file("f", Locations::LOCAL_REMOTE)
            .build();
        let node = tree.find("f").unwrap();
        assert_eq!(run(&TextDiffProcessor::default(), &node), "3.3^0.2");
    }
}
