//! Three-way chunk merge.
//!
//! Two diffs against a common base (base→local and base→remote) are walked
//! together in base coordinates and turned into [`Diff3Item`](crate::Diff3Item)s
//! that classify which sides changed each region.
//!
//! # Example
//!
//! ```
//! use textdiff::{DifferencesStatus, diff3_merge, line_diff};
//!
//! let base = [1, 2, 3];
//! let local = [1, 5, 3];
//! let remote = [1, 6, 3];
//!
//! let items = diff3_merge(
//!     &line_diff(&base, &local),
//!     &line_diff(&base, &remote),
//!     &local,
//!     &remote,
//! )
//! .unwrap();
//! assert_eq!(items.len(), 1);
//! assert_eq!(items[0].status, DifferencesStatus::AllDifferent);
//! ```

mod accumulator;
pub mod algorithm;

pub use algorithm::diff3_merge;
