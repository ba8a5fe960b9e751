//! Tree assembly from a list of entries or from the file system.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use textdiff::{Location, Locations};
use walkdir::WalkDir;

use super::NodeTree;
use super::node::{CompareMode, Node, NodeKind, NodeRef};

#[derive(Debug, Clone, Copy, Default)]
struct Entry {
    directory: bool,
    locations: Locations,
}

/// Builds a [`NodeTree`] from roots and relative entries.
///
/// Parent directories of declared entries are created implicitly and exist
/// wherever one of their descendants does.
#[derive(Debug)]
pub struct TreeBuilder {
    mode: CompareMode,
    roots: [Option<PathBuf>; 3],
    output_root: Option<PathBuf>,
    entries: BTreeMap<PathBuf, Entry>,
}

impl TreeBuilder {
    /// Starts an empty tree.
    #[must_use]
    pub fn new(mode: CompareMode) -> Self {
        Self {
            mode,
            roots: [None, None, None],
            output_root: None,
            entries: BTreeMap::new(),
        }
    }

    /// Sets the root directory of one side. The base root is ignored in two-way mode.
    #[must_use]
    pub fn root(mut self, location: Location, path: impl Into<PathBuf>) -> Self {
        if self.mode.locations().contains(location.flag()) {
            self.roots[location.index()] = Some(path.into());
        }
        self
    }

    /// Sets where merged output goes. Defaults to the local root.
    #[must_use]
    pub fn output_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_root = Some(path.into());
        self
    }

    /// Declares a file present in `locations`.
    #[must_use]
    pub fn file(mut self, relative_path: impl Into<PathBuf>, locations: Locations) -> Self {
        self.add(relative_path.into(), false, locations);
        self
    }

    /// Declares a directory present in `locations`.
    #[must_use]
    pub fn directory(mut self, relative_path: impl Into<PathBuf>, locations: Locations) -> Self {
        self.add(relative_path.into(), true, locations);
        self
    }

    /// Adds every entry found below the configured roots.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error hit while listing a directory.
    pub fn scan(mut self) -> io::Result<Self> {
        for location in self.mode.locations().members() {
            let Some(root) = self.roots[location.index()].clone() else {
                continue;
            };
            for entry in WalkDir::new(&root).min_depth(1).sort_by_file_name() {
                let entry = entry?;
                if let Ok(relative) = entry.path().strip_prefix(&root) {
                    self.add(
                        relative.to_path_buf(),
                        entry.file_type().is_dir(),
                        location.flag(),
                    );
                }
            }
        }
        Ok(self)
    }

    fn add(&mut self, path: PathBuf, directory: bool, locations: Locations) {
        let locations = locations & self.mode.locations();
        let entry = self.entries.entry(path.clone()).or_default();
        entry.directory |= directory;
        entry.locations |= locations;
        let mut parent = path.parent();
        while let Some(dir) = parent.filter(|p| !p.as_os_str().is_empty()) {
            let entry = self.entries.entry(dir.to_path_buf()).or_default();
            entry.directory = true;
            entry.locations |= locations;
            parent = dir.parent();
        }
    }

    /// Finishes the tree.
    #[must_use]
    pub fn build(self) -> NodeTree {
        let output_root = self
            .output_root
            .clone()
            .or_else(|| self.roots[Location::Local.index()].clone());
        let root_files = self.roots.clone();
        let root_locations = Location::ALL
            .into_iter()
            .filter(|l| self.roots[l.index()].is_some())
            .collect();
        let root = self.build_dir(
            Path::new(""),
            root_locations,
            root_files,
            output_root.clone(),
        );
        NodeTree {
            mode: self.mode,
            roots: self.roots,
            output_root,
            root,
        }
    }

    fn build_dir(
        &self,
        relative: &Path,
        locations: Locations,
        files: [Option<PathBuf>; 3],
        target: Option<PathBuf>,
    ) -> NodeRef {
        let children = self
            .entries
            .iter()
            .filter(|(path, _)| path.parent() == Some(relative))
            .map(|(path, entry)| {
                let files = self.files_for(path, entry.locations);
                let target = self.target_for(path);
                if entry.directory {
                    self.build_dir(path, entry.locations, files, target)
                } else {
                    Arc::new(RwLock::new(Node::new(
                        path.clone(),
                        self.mode,
                        entry.locations,
                        files,
                        target,
                        NodeKind::PlainFile,
                    )))
                }
            })
            .collect();
        Arc::new(RwLock::new(Node::new(
            relative.to_path_buf(),
            self.mode,
            locations,
            files,
            target,
            NodeKind::Directory(children),
        )))
    }

    fn files_for(&self, path: &Path, locations: Locations) -> [Option<PathBuf>; 3] {
        Location::ALL.map(|location| {
            if !locations.contains(location.flag()) {
                return None;
            }
            self.roots[location.index()]
                .as_ref()
                .map(|root| root.join(path))
        })
    }

    fn target_for(&self, path: &Path) -> Option<PathBuf> {
        self.output_root
            .as_ref()
            .or(self.roots[Location::Local.index()].as_ref())
            .map(|root| root.join(path))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::error::ProcessError;

    #[test]
    fn test_implicit_parents_take_child_locations() {
        let tree = TreeBuilder::new(CompareMode::ThreeWay)
            .root(Location::Base, "/b")
            .root(Location::Local, "/l")
            .file("a/b/c.txt", Locations::REMOTE)
            .file("a/d.txt", Locations::LOCAL)
            .build();

        let dir = tree.find("a").unwrap();
        let dir = dir.read();
        assert!(dir.is_directory());
        assert!(dir.locations().contains(Locations::LOCAL));
        assert!(dir.locations().contains(Locations::REMOTE));
        // No remote root configured, so no remote file reference.
        assert!(dir.file(Location::Remote).is_none());
        assert_eq!(dir.file(Location::Local), Some(Path::new("/l/a")));
        assert_eq!(dir.target(), Some(Path::new("/l/a")));
    }

    #[test]
    fn test_presence_survives_missing_root() {
        let tree = TreeBuilder::new(CompareMode::TwoWay)
            .root(Location::Local, "/l")
            .file("only_remote.txt", Locations::REMOTE)
            .build();

        let node = tree.find("only_remote.txt").unwrap();
        let node = node.read();
        assert_eq!(node.locations(), Locations::REMOTE);
        assert!(matches!(
            node.require_file(Location::Remote),
            Err(ProcessError::MissingFile { location: Location::Remote })
        ));
        assert_eq!(tree.root().read().locations(), Locations::LOCAL);
    }

    #[test]
    fn test_two_way_ignores_base() {
        let tree = TreeBuilder::new(CompareMode::TwoWay)
            .root(Location::Base, "/b")
            .root(Location::Local, "/l")
            .root(Location::Remote, "/r")
            .output_root("/out")
            .file("x", Locations::all())
            .build();
        assert!(tree.root_path(Location::Base).is_none());
        let node = tree.find("x").unwrap();
        let node = node.read();
        assert_eq!(node.locations(), Locations::LOCAL_REMOTE);
        assert_eq!(node.target(), Some(Path::new("/out/x")));
    }

    #[test]
    fn test_scan_reads_disk() {
        let local = tempfile::tempdir().unwrap();
        let remote = tempfile::tempdir().unwrap();
        fs::create_dir(local.path().join("docs")).unwrap();
        fs::write(local.path().join("docs/a.md"), "a").unwrap();
        fs::write(remote.path().join("b.md"), "b").unwrap();

        let tree = TreeBuilder::new(CompareMode::TwoWay)
            .root(Location::Local, local.path())
            .root(Location::Remote, remote.path())
            .scan()
            .unwrap()
            .build();

        assert_eq!(tree.walk().len(), 4);
        let b = tree.find("b.md").unwrap();
        assert_eq!(b.read().locations(), Locations::REMOTE);
        assert!(tree.find("docs").unwrap().read().is_directory());
    }
}
