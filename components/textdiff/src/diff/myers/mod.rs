//! Myers diff over interned line sequences.
//!
//! Myers' algorithm finds a shortest edit script in O(N·D) time, where N is the
//! combined length of both sequences and D the number of differing lines. It is
//! fastest when the inputs are similar, which is the common case for file merges.

pub mod algorithm;
pub mod optimization;

pub use algorithm::line_diff;
