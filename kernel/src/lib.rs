//! Treemerge kernel - directory tree comparison and merging.
//!
//! This crate wires the line algorithms from `textdiff` into a processor
//! pipeline over a tree of files: a diff phase classifies and compares every
//! node, an optional interactive phase collects conflict decisions, and a merge
//! phase writes the result.
//!
//! ```no_run
//! use textdiff::Location;
//! use treemerge_kernel::infrastructure::config::Settings;
//! use treemerge_kernel::pipeline::Pipeline;
//! use treemerge_kernel::tree::{CompareMode, TreeBuilder};
//!
//! # fn main() -> anyhow::Result<()> {
//! let settings = Settings::new()?;
//! let tree = TreeBuilder::new(CompareMode::ThreeWay)
//!     .root(Location::Base, "base")
//!     .root(Location::Local, "local")
//!     .root(Location::Remote, "remote")
//!     .scan()?
//!     .build();
//! let pipeline = Pipeline::from_settings(&settings, None)?;
//! pipeline.run_all(&tree);
//! println!("{}", serde_json::to_string(&tree.summary())?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Per-node processing errors.
pub mod error;
/// Infrastructure components (config, telemetry).
pub mod infrastructure;
/// Processor registry, execution strategies and the pipeline facade.
pub mod pipeline;
/// Built-in processors.
pub mod processors;
/// Node tree handed over by the crawler.
pub mod tree;

pub use error::ProcessError;
