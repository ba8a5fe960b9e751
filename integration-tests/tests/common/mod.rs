//! Shared test utilities for integration tests.
//!
//! Provides on-disk base/local/remote trees in a temporary directory and
//! helpers to build node trees and inspect merge output.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::TempDir;
use textdiff::Location;
use treemerge_kernel::infrastructure::config::{ExecutionStrategyKind, Settings};
use treemerge_kernel::tree::{CompareMode, NodeStatus, NodeTree, TreeBuilder};

/// Three input trees plus an output directory under one temporary root.
pub struct MergeFixture {
    /// Temporary directory holding everything.
    pub temp_dir: TempDir,
}

impl MergeFixture {
    /// Creates empty base, local and remote trees.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        for location in Location::ALL {
            fs::create_dir_all(temp_dir.path().join(location.to_string()))?;
        }
        Ok(Self { temp_dir })
    }

    /// Root of one input tree.
    pub fn root(&self, location: Location) -> PathBuf {
        self.temp_dir.path().join(location.to_string())
    }

    /// Directory merged output goes to.
    pub fn output(&self) -> PathBuf {
        self.temp_dir.path().join("out")
    }

    /// Writes a file into one input tree, creating parents.
    pub fn write(&self, location: Location, relative: &str, contents: impl AsRef<[u8]>) -> Result<()> {
        let path = self.root(location).join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
        Ok(())
    }

    /// Writes the same file into several trees.
    pub fn write_all(&self, locations: &[Location], relative: &str, contents: &str) -> Result<()> {
        for location in locations {
            self.write(*location, relative, contents)?;
        }
        Ok(())
    }

    /// Reads a merged file.
    pub fn read_output(&self, relative: &str) -> Result<String> {
        Ok(fs::read_to_string(self.output().join(relative))?)
    }

    /// Scans the input trees into a node tree merging into [`Self::output`].
    pub fn tree(&self, mode: CompareMode) -> Result<NodeTree> {
        let mut builder = TreeBuilder::new(mode)
            .root(Location::Local, self.root(Location::Local))
            .root(Location::Remote, self.root(Location::Remote))
            .output_root(self.output());
        if mode == CompareMode::ThreeWay {
            builder = builder.root(Location::Base, self.root(Location::Base));
        }
        Ok(builder.scan()?.build())
    }
}

/// Settings with the given strategy and defaults otherwise.
pub fn settings(strategy: ExecutionStrategyKind) -> Settings {
    let mut settings = Settings::default();
    settings.execution.strategy = strategy;
    settings.execution.max_concurrent = 4;
    settings
}

/// Status of the node at `relative`.
pub fn status_of(tree: &NodeTree, relative: &str) -> NodeStatus {
    tree.find(relative)
        .map(|node| node.read().state.status)
        .unwrap_or_else(|| panic!("no node at {relative}"))
}

/// Every file below `dir` with its bytes, keyed by relative path.
pub fn snapshot(dir: &Path) -> Result<BTreeMap<PathBuf, Vec<u8>>> {
    let mut files = BTreeMap::new();
    collect(dir, Path::new(""), &mut files)?;
    Ok(files)
}

fn collect(root: &Path, relative: &Path, files: &mut BTreeMap<PathBuf, Vec<u8>>) -> Result<()> {
    for entry in fs::read_dir(root.join(relative))? {
        let entry = entry?;
        let path = relative.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            collect(root, &path, files)?;
        } else {
            files.insert(path.clone(), fs::read(root.join(&path))?);
        }
    }
    Ok(())
}

/// Populates a small project exercising every kind of change.
///
/// | file | change |
/// |---|---|
/// | `README.md` | remote appended a line |
/// | `src/lib.rs` | local and remote edited different lines |
/// | `src/conflict.rs` | both edited the same line differently |
/// | `docs/removed.md` | remote deleted, local untouched |
/// | `local_only.txt` | added locally |
/// | `remote_only.txt` | added remotely |
/// | `assets/logo.bin` | identical binary |
pub fn populate_project(fixture: &MergeFixture) -> Result<()> {
    use Location::{Base, Local, Remote};

    fixture.write(Base, "README.md", "# Project\n")?;
    fixture.write(Local, "README.md", "# Project\n")?;
    fixture.write(Remote, "README.md", "# Project\n\nRemote notes.\n")?;

    let lib = "fn one() {}\nfn two() {}\nfn three() {}\nfn four() {}\nfn five() {}\nfn six() {}\n";
    fixture.write(Base, "src/lib.rs", lib)?;
    fixture.write(Local, "src/lib.rs", lib.replace("fn two() {}", "fn two() { local }"))?;
    fixture.write(Remote, "src/lib.rs", lib.replace("fn five() {}", "fn five() { remote }"))?;

    fixture.write(Base, "src/conflict.rs", "a\nvalue = 1\nb\n")?;
    fixture.write(Local, "src/conflict.rs", "a\nvalue = 2\nb\n")?;
    fixture.write(Remote, "src/conflict.rs", "a\nvalue = 3\nb\n")?;

    fixture.write_all(&[Base, Local], "docs/removed.md", "old docs\n")?;
    fixture.write(Local, "local_only.txt", "mine\n")?;
    fixture.write(Remote, "remote_only.txt", "theirs\n")?;
    for location in Location::ALL {
        fixture.write(location, "assets/logo.bin", [0x89, b'P', b'N', b'G', 0, 0, 1])?;
    }
    Ok(())
}
