//! Writing merged output.

use std::fs;
use std::io;
use std::path::Path;

use textdiff::{
    Diff3Item, DiffError, DiffItem, DifferencesStatus, Location, Resolution, split_lines,
};
use tracing::debug;

use crate::error::ProcessError;
use crate::pipeline::{Phase, Processor, ProcessorDescriptor};
use crate::tree::{CompareMode, DiffPayload, Node, NodeStatus};

use super::read_text;

/// Materialises the merge result of each node at its target path.
///
/// Text files with a line diff are rebuilt chunk by chunk; unresolved conflicts
/// are written between git-style markers and leave the node
/// [`NodeStatus::Conflicted`]. Everything else is decided per file from the
/// node's differences: the side that changed wins, a missing winner deletes.
#[derive(Debug, Clone)]
pub struct MergeProcessor {
    local_label: String,
    remote_label: String,
}

impl Default for MergeProcessor {
    fn default() -> Self {
        Self::new("local", "remote")
    }
}

impl MergeProcessor {
    /// Uses the given labels on conflict markers.
    #[must_use]
    pub fn new(local_label: impl Into<String>, remote_label: impl Into<String>) -> Self {
        Self {
            local_label: local_label.into(),
            remote_label: remote_label.into(),
        }
    }

    fn merge_three_way(
        &self,
        node: &Node,
        items: &[Diff3Item],
    ) -> Result<(String, usize), ProcessError> {
        let base_text = optional_text(node, Location::Base)?;
        let local_text = read_text(node.require_file(Location::Local)?)?;
        let remote_text = read_text(node.require_file(Location::Remote)?)?;
        let base = split_lines(&base_text);
        let local = split_lines(&local_text);
        let remote = split_lines(&remote_text);

        let mut out = MergedText::new(&local_text, &remote_text);
        let mut conflicts = 0;
        let mut position = 0;
        for item in items {
            out.extend(lines(
                &local,
                position,
                item.local_start.saturating_sub(position),
                item.base_start,
            )?);
            let side = |location: Location| {
                let (start, len) = item.span(location);
                let file = match location {
                    Location::Base => &base,
                    Location::Local => &local,
                    Location::Remote => &remote,
                };
                lines(file, start, len, item.base_start)
            };
            match item.resolution() {
                Resolution::Take(location) => out.extend(side(location)?),
                Resolution::LocalThenRemote => {
                    out.extend(side(Location::Local)?);
                    out.extend(side(Location::Remote)?);
                }
                Resolution::Unresolved => {
                    conflicts += 1;
                    out.line(&format!("<<<<<<< {}", self.local_label));
                    out.extend(side(Location::Local)?);
                    out.line("||||||| base");
                    out.extend(side(Location::Base)?);
                    out.line("=======");
                    out.extend(side(Location::Remote)?);
                    out.line(&format!(">>>>>>> {}", self.remote_label));
                }
            }
            position = item.local_end();
        }
        out.extend(lines(
            &local,
            position,
            local.len().saturating_sub(position),
            base.len(),
        )?);
        if let Some(last) = items.last().filter(|i| i.local_end() >= local.len()) {
            match last.resolution() {
                Resolution::Take(location) => out.ends_like(match location {
                    Location::Base => &base_text,
                    Location::Local => &local_text,
                    Location::Remote => &remote_text,
                }),
                Resolution::LocalThenRemote if last.remote_affected > 0 => {
                    out.ends_like(&remote_text);
                }
                Resolution::LocalThenRemote => out.ends_like(&local_text),
                Resolution::Unresolved => out.ends_like("\n"),
            }
        }
        Ok((out.finish(), conflicts))
    }

    fn merge_two_way(node: &Node, items: &[DiffItem]) -> Result<String, ProcessError> {
        let local_text = read_text(node.require_file(Location::Local)?)?;
        let remote_text = read_text(node.require_file(Location::Remote)?)?;
        let local = split_lines(&local_text);
        let remote = split_lines(&remote_text);

        let mut out = MergedText::new(&local_text, &remote_text);
        let mut position = 0;
        for item in items {
            let anchor = item.local_start;
            out.extend(lines(
                &local,
                position,
                item.local_start.saturating_sub(position),
                anchor,
            )?);
            let local_side = lines(&local, item.local_start, item.local_affected, anchor)?;
            let remote_side = lines(&remote, item.remote_start, item.remote_affected, anchor)?;
            match item.resolution() {
                Resolution::Take(Location::Remote) => out.extend(remote_side),
                Resolution::LocalThenRemote => {
                    out.extend(local_side);
                    out.extend(remote_side);
                }
                // No base in two-way mode; anything else keeps local.
                Resolution::Take(_) | Resolution::Unresolved => out.extend(local_side),
            }
            position = item.local_end();
        }
        out.extend(lines(
            &local,
            position,
            local.len().saturating_sub(position),
            local.len(),
        )?);
        if let Some(last) = items.last().filter(|i| i.local_end() >= local.len()) {
            match last.resolution() {
                Resolution::Take(Location::Remote) => out.ends_like(&remote_text),
                Resolution::LocalThenRemote if last.remote_affected > 0 => {
                    out.ends_like(&remote_text);
                }
                _ => {}
            }
        }
        Ok(out.finish())
    }
}

fn optional_text(node: &Node, location: Location) -> Result<String, ProcessError> {
    match node.file(location) {
        Some(path) => read_text(path),
        None => Ok(String::new()),
    }
}

/// Lines `start..start + len`, or an error naming `anchor` if out of range.
fn lines<'a>(
    file: &'a [&'a str],
    start: usize,
    len: usize,
    anchor: usize,
) -> Result<&'a [&'a str], ProcessError> {
    file.get(start..start + len).ok_or(ProcessError::Diff(DiffError::InvariantBroken {
        base_line: anchor,
        reason: "chunk lies outside the file",
    }))
}

/// Output buffer keeping the line ending style of the inputs.
///
/// The trailing newline follows local unless the last chunk reaches the end of
/// the file, in which case it follows the side that chunk was taken from.
struct MergedText {
    text: String,
    newline: &'static str,
    trailing: bool,
}

impl MergedText {
    fn new(local: &str, remote: &str) -> Self {
        let reference = if local.is_empty() { remote } else { local };
        Self {
            text: String::with_capacity(local.len().max(remote.len())),
            newline: if reference.contains("\r\n") { "\r\n" } else { "\n" },
            trailing: reference.is_empty() || reference.ends_with('\n'),
        }
    }

    fn ends_like(&mut self, source: &str) {
        self.trailing = source.is_empty() || source.ends_with('\n');
    }

    fn line(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push_str(self.newline);
    }

    fn extend(&mut self, lines: &[&str]) {
        for line in lines {
            self.line(line);
        }
    }

    fn finish(mut self) -> String {
        if !self.trailing && self.text.ends_with(self.newline) {
            self.text.truncate(self.text.len() - self.newline.len());
        }
        self.text
    }
}

/// Side whose copy of the file wins when it is merged as a whole.
fn whole_file_winner(mode: CompareMode, differences: DifferencesStatus) -> (Location, bool) {
    match (mode, differences) {
        (CompareMode::ThreeWay, DifferencesStatus::BaseLocalSame) => (Location::Remote, false),
        (CompareMode::ThreeWay, DifferencesStatus::AllDifferent) => (Location::Local, true),
        _ => (Location::Local, false),
    }
}

fn write_output(target: &Path, text: &str) -> Result<(), ProcessError> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| ProcessError::io(parent, e))?;
    }
    fs::write(target, text).map_err(|e| ProcessError::io(target, e))
}

fn copy_file(source: &Path, target: &Path) -> Result<(), ProcessError> {
    if source == target {
        return Ok(());
    }
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| ProcessError::io(parent, e))?;
    }
    fs::copy(source, target)
        .map(|_| ())
        .map_err(|e| ProcessError::io(source, e))
}

fn remove_file(target: &Path) -> Result<(), ProcessError> {
    match fs::remove_file(target) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(ProcessError::io(target, e)),
        _ => Ok(()),
    }
}

impl Processor for MergeProcessor {
    fn descriptor(&self) -> ProcessorDescriptor {
        ProcessorDescriptor::new("merge", Phase::Merge, 10)
    }

    fn process_directory(&self, node: &mut Node) -> Result<(), ProcessError> {
        let differences = node.state.differences.ok_or(ProcessError::NotCompared)?;
        let target = node.target().ok_or(ProcessError::NoMergeTarget)?;
        let (winner, _) = whole_file_winner(node.mode(), differences);
        if node.file(winner).is_some() {
            fs::create_dir_all(target).map_err(|e| ProcessError::io(target, e))?;
        }
        node.state.status = NodeStatus::Merged;
        Ok(())
    }

    fn process_file(&self, node: &mut Node) -> Result<(), ProcessError> {
        let differences = node.state.differences.ok_or(ProcessError::NotCompared)?;
        let target = node
            .target()
            .ok_or(ProcessError::NoMergeTarget)?
            .to_path_buf();

        let conflicted = match node.payload() {
            Some(DiffPayload::ThreeWay(items)) if !items.is_empty() => {
                let (text, conflicts) = self.merge_three_way(node, items)?;
                write_output(&target, &text)?;
                conflicts > 0
            }
            Some(DiffPayload::TwoWay(items)) if !items.is_empty() => {
                let text = Self::merge_two_way(node, items)?;
                write_output(&target, &text)?;
                false
            }
            // No line chunks: files equal line by line may still differ in
            // their line endings, so the side that changed wins as a whole.
            Some(_) | None => {
                let (winner, conflicted) = whole_file_winner(node.mode(), differences);
                match node.file(winner) {
                    Some(source) => copy_file(source, &target)?,
                    None => remove_file(&target)?,
                }
                conflicted
            }
        };

        debug!(path = %node.relative_path().display(), conflicted, "Merged");
        node.state.status = if conflicted {
            NodeStatus::Conflicted
        } else {
            NodeStatus::Merged
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;
    use textdiff::{Locations, PreferredAction};

    use super::*;
    use crate::infrastructure::config::ComparisonMethod;
    use crate::pipeline::Processor;
    use crate::processors::{EqualityProcessor, FileTypeProcessor, TextDiffProcessor};
    use crate::tree::{NodeKind, NodeRef, NodeTree, TreeBuilder};

    struct Fixture {
        roots: [TempDir; 3],
        out: TempDir,
        tree: NodeTree,
    }

    fn fixture(mode: CompareMode, texts: [Option<&[u8]>; 3]) -> Fixture {
        let roots = [(); 3].map(|()| tempfile::tempdir().unwrap());
        let out = tempfile::tempdir().unwrap();
        let mut present = Locations::empty();
        for (location, text) in Location::ALL.into_iter().zip(texts) {
            if let Some(text) = text {
                fs::write(roots[location.index()].path().join("f.txt"), text).unwrap();
                present |= location.flag();
            }
        }
        let tree = TreeBuilder::new(mode)
            .root(Location::Base, roots[0].path())
            .root(Location::Local, roots[1].path())
            .root(Location::Remote, roots[2].path())
            .output_root(out.path().join("merged"))
            .file("f.txt", present)
            .build();
        Fixture { roots, out, tree }
    }

    fn diff_chain() -> Vec<Arc<dyn Processor>> {
        vec![
            Arc::new(FileTypeProcessor::new(8000)),
            Arc::new(EqualityProcessor::new(ComparisonMethod::Content)),
            Arc::new(TextDiffProcessor::default()),
        ]
    }

    fn diff(node: &NodeRef) {
        let mut node = node.write();
        for processor in diff_chain() {
            processor.process(&mut node).unwrap();
        }
    }

    fn merge(fixture: &Fixture) -> (NodeStatus, Option<String>) {
        let node = fixture.tree.find("f.txt").unwrap();
        MergeProcessor::default().process(&mut node.write()).unwrap();
        let status = node.read().state.status;
        let output = fs::read_to_string(fixture.out.path().join("merged/f.txt")).ok();
        (status, output)
    }

    fn merged(texts: [Option<&str>; 3]) -> (NodeStatus, Option<String>) {
        let fixture = fixture(CompareMode::ThreeWay, texts.map(|t| t.map(str::as_bytes)));
        diff(&fixture.tree.find("f.txt").unwrap());
        merge(&fixture)
    }

    #[test]
    fn test_disjoint_edits_merge_cleanly() {
        let (status, output) = merged([Some("a\nb\nc\n"), Some("a\nB\nc\n"), Some("a\nb\nc\nd\n")]);
        assert_eq!(status, NodeStatus::Merged);
        assert_eq!(output.as_deref(), Some("a\nB\nc\nd\n"));
    }

    #[test]
    fn test_conflict_writes_markers() {
        let (status, output) = merged([Some("k\nx\nk\n"), Some("k\ny\nk\n"), Some("k\nz\nk\n")]);
        assert_eq!(status, NodeStatus::Conflicted);
        assert_eq!(
            output.as_deref(),
            Some("k\n<<<<<<< local\ny\n||||||| base\nx\n=======\nz\n>>>>>>> remote\nk\n")
        );
    }

    #[test]
    fn test_preferred_action_resolves_conflict() {
        let fixture = fixture(
            CompareMode::ThreeWay,
            [Some("x\n".as_bytes()), Some("y\n".as_bytes()), Some("z\n".as_bytes())],
        );
        let node = fixture.tree.find("f.txt").unwrap();
        diff(&node);
        {
            let mut node = node.write();
            let NodeKind::DiffFile(DiffPayload::ThreeWay(items)) = &mut node.kind else {
                panic!("expected a three-way payload");
            };
            assert_eq!(items.len(), 1);
            items[0].preferred_action = PreferredAction::LocalThenRemote;
        }
        assert_eq!(
            merge(&fixture),
            (NodeStatus::Merged, Some("y\nz\n".to_string()))
        );
    }

    #[test]
    fn test_line_endings_are_kept() {
        let (status, output) = merged([Some("a\r\nb"), Some("a\r\nb"), Some("a\r\nB")]);
        assert_eq!(status, NodeStatus::Merged);
        assert_eq!(output.as_deref(), Some("a\r\nB"));
    }

    #[test]
    fn test_line_ending_only_change_is_taken() {
        let (status, output) = merged([Some("a\nb\n"), Some("a\nb\n"), Some("a\nb")]);
        assert_eq!(status, NodeStatus::Merged);
        assert_eq!(output.as_deref(), Some("a\nb"));

        let (status, output) = merged([Some("a\nb\n"), Some("a\nb\n"), Some("a\r\nb\r\n")]);
        assert_eq!(status, NodeStatus::Merged);
        assert_eq!(output.as_deref(), Some("a\r\nb\r\n"));

        let (status, output) = merged([Some("a\nb"), Some("a\nb\n"), Some("a\nb")]);
        assert_eq!(status, NodeStatus::Merged);
        assert_eq!(output.as_deref(), Some("a\nb\n"));
    }

    #[test]
    fn test_trailing_newline_follows_last_chunk() {
        let (status, output) = merged([Some("a\nb\nc"), Some("A\nb\nc"), Some("a\nb\nc\nd\n")]);
        assert_eq!(status, NodeStatus::Merged);
        assert_eq!(output.as_deref(), Some("A\nb\nc\nd\n"));

        // Local edits away from the end keep local's missing final newline.
        let (_, output) = merged([Some("a\nb\nc\n"), Some("a\nB\nc"), Some("a\nb\nc\n")]);
        assert_eq!(output.as_deref(), Some("a\nB\nc"));
    }

    #[test]
    fn test_whole_file_decisions() {
        // Remote deleted an untouched file.
        let (status, output) = merged([Some("a\n"), Some("a\n"), None]);
        assert_eq!((status, output), (NodeStatus::Merged, None));

        // Remote added a file.
        let (status, output) = merged([None, None, Some("new\n")]);
        assert_eq!(status, NodeStatus::Merged);
        assert_eq!(output.as_deref(), Some("new\n"));

        // Local changed a file remote deleted.
        let (status, output) = merged([Some("a\n"), Some("b\n"), None]);
        assert_eq!(status, NodeStatus::Conflicted);
        assert_eq!(output.as_deref(), Some("b\n"));
    }

    #[test]
    fn test_binary_conflict_keeps_local() {
        let fixture = fixture(
            CompareMode::ThreeWay,
            [Some(&[0u8, 1][..]), Some(&[0u8, 2][..]), Some(&[0u8, 3][..])],
        );
        diff(&fixture.tree.find("f.txt").unwrap());
        let (status, _) = merge(&fixture);
        assert_eq!(status, NodeStatus::Conflicted);
        assert_eq!(
            fs::read(fixture.out.path().join("merged/f.txt")).unwrap(),
            [0, 2]
        );
    }

    #[test]
    fn test_two_way_applies_remote_choice() {
        let fixture = fixture(
            CompareMode::TwoWay,
            [None, Some("a\nb\n".as_bytes()), Some("a\nc\n".as_bytes())],
        );
        let node = fixture.tree.find("f.txt").unwrap();
        diff(&node);
        assert_eq!(
            merge(&fixture),
            (NodeStatus::Merged, Some("a\nb\n".to_string()))
        );

        {
            let mut node = node.write();
            let NodeKind::DiffFile(DiffPayload::TwoWay(items)) = &mut node.kind else {
                panic!("expected a two-way payload");
            };
            items[0].preferred_action = PreferredAction::Remote;
        }
        assert_eq!(
            merge(&fixture),
            (NodeStatus::Merged, Some("a\nc\n".to_string()))
        );
        // Inputs are untouched.
        assert_eq!(
            fs::read_to_string(fixture.roots[1].path().join("f.txt")).unwrap(),
            "a\nb\n"
        );
    }

    #[test]
    fn test_two_way_remote_tail_keeps_its_newline() {
        let fixture = fixture(
            CompareMode::TwoWay,
            [None, Some("a\nb".as_bytes()), Some("a\nb\nc\n".as_bytes())],
        );
        let node = fixture.tree.find("f.txt").unwrap();
        diff(&node);
        {
            let mut node = node.write();
            let NodeKind::DiffFile(DiffPayload::TwoWay(items)) = &mut node.kind else {
                panic!("expected a two-way payload");
            };
            for item in items.iter_mut() {
                item.preferred_action = PreferredAction::Remote;
            }
        }
        assert_eq!(
            merge(&fixture),
            (NodeStatus::Merged, Some("a\nb\nc\n".to_string()))
        );
    }

    #[test]
    fn test_requires_comparison() {
        let fixture = fixture(CompareMode::TwoWay, [None, Some("a\n".as_bytes()), Some("a\n".as_bytes())]);
        let node = fixture.tree.find("f.txt").unwrap();
        let err = MergeProcessor::default()
            .process(&mut node.write())
            .unwrap_err();
        assert!(matches!(err, ProcessError::NotCompared));
    }
}
