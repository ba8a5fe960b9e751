//! Line-level diff and merge primitives.
//!
//! The crate is free of I/O and global state:
//! - [`LineInterner`] turns lines into small integer ids shared across the files
//!   of one comparison.
//! - [`line_diff`] computes the minimal two-way edit script as [`DiffItem`] chunks.
//! - [`diff3_merge`] combines two diffs against a common base into [`Diff3Item`]
//!   chunks with conflict classification.
//! - [`ThreeWayState`] narrows which of base, local and remote can still be equal
//!   while cheap probes accumulate evidence.
//!
//! # Example
//!
//! ```
//! use textdiff::{LineInterner, diff3_merge, format_items, line_diff};
//!
//! let mut interner = LineInterner::new();
//! let base = interner.intern_text("a\nb\nc\n");
//! let local = interner.intern_text("a\nB\nc\n");
//! let remote = interner.intern_text("a\nb\nc\nd\n");
//!
//! let merged = diff3_merge(
//!     &line_diff(&base, &local),
//!     &line_diff(&base, &remote),
//!     &local,
//!     &remote,
//! )
//! .unwrap();
//! assert_eq!(format_items(&merged), "1.1.1^1.1.1#3.3.3^0.0.1");
//! ```

pub mod diff;
pub mod equality;
pub mod error;
pub mod format;
pub mod intern;

pub use diff::myers::line_diff;
pub use diff::three_way::diff3_merge;
pub use diff::{Diff3Item, DiffItem, DifferencesStatus, LineHash, PreferredAction, Resolution};
pub use equality::{Combinations, Location, Locations, Pair, ThreeWayState};
pub use error::DiffError;
pub use format::{format_items, parse_diff3_items, parse_diff_items};
pub use intern::{InternOptions, LineInterner, split_lines};
