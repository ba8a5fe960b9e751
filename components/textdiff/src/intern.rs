//! Line interning.
//!
//! Every distinct line text maps to a small integer so the diff algorithms only
//! compare integers. The table keys on the full (normalised) text, so two lines
//! share an id exactly when their texts are equal.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::diff::LineHash;

/// Normalisation applied to a line before it is interned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InternOptions {
    /// Compare lines case-insensitively.
    pub ignore_case: bool,
    /// Drop all whitespace before comparing.
    pub ignore_whitespace: bool,
}

/// Caller-owned line intern table.
///
/// One table must be used for all the files that take part in a single comparison,
/// otherwise equal lines in different files would receive different ids.
#[derive(Debug, Default)]
pub struct LineInterner {
    ids: HashMap<String, LineHash>,
    options: InternOptions,
}

impl LineInterner {
    /// Creates an empty table that compares lines verbatim.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table with the given normalisation.
    #[must_use]
    pub fn with_options(options: InternOptions) -> Self {
        Self {
            ids: HashMap::new(),
            options,
        }
    }

    /// Returns the id for `line`, allocating a new one on first sight.
    pub fn intern(&mut self, line: &str) -> LineHash {
        let key = self.normalise(line);
        if let Some(id) = self.ids.get(key.as_ref()) {
            return *id;
        }
        let id: LineHash = self.ids.len();
        self.ids.insert(key.into_owned(), id);
        id
    }

    /// Interns every line of a pre-split sequence.
    pub fn intern_lines<S: AsRef<str>>(&mut self, lines: &[S]) -> Vec<LineHash> {
        lines.iter().map(|line| self.intern(line.as_ref())).collect()
    }

    /// Splits `text` into lines and interns them.
    pub fn intern_text(&mut self, text: &str) -> Vec<LineHash> {
        split_lines(text)
            .into_iter()
            .map(|line| self.intern(line))
            .collect()
    }

    /// Number of distinct lines seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if nothing was interned yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn normalise<'a>(&self, line: &'a str) -> Cow<'a, str> {
        let mut line = Cow::Borrowed(line);
        if self.options.ignore_whitespace {
            line = Cow::Owned(line.chars().filter(|c| !c.is_whitespace()).collect());
        }
        if self.options.ignore_case {
            line = Cow::Owned(line.to_lowercase());
        }
        line
    }
}

/// Splits text into lines, accepting both `\n` and `\r\n` terminators.
///
/// A trailing terminator does not produce an empty last line.
#[must_use]
pub fn split_lines(text: &str) -> Vec<&str> {
    text.lines().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_lines_share_ids_across_files() {
        let mut interner = LineInterner::new();
        let a = interner.intern_text("alpha\nbeta\ngamma\n");
        let b = interner.intern_text("gamma\nalpha\n");

        assert_eq!(a, vec![0, 1, 2]);
        assert_eq!(b, vec![2, 0]);
        assert_eq!(interner.len(), 3);
    }

    #[test]
    fn test_ids_are_dense_table_indices() {
        let mut interner = LineInterner::new();
        let lines: Vec<String> = (0..5_000).map(|i| format!("line {i}")).collect();
        let ids = interner.intern_lines(&lines);
        assert_eq!(ids, (0..5_000).collect::<Vec<LineHash>>());
        assert_eq!(interner.intern("line 4999"), 4_999);
    }

    #[test]
    fn test_crlf_and_lf_lines_match() {
        let mut interner = LineInterner::new();
        let unix = interner.intern_text("one\ntwo\n");
        let dos = interner.intern_text("one\r\ntwo\r\n");
        assert_eq!(unix, dos);
    }

    #[test]
    fn test_ignore_case_and_whitespace() {
        let mut interner = LineInterner::with_options(InternOptions {
            ignore_case: true,
            ignore_whitespace: true,
        });
        let a = interner.intern("  Hello World");
        let b = interner.intern("helloworld\t");
        assert_eq!(a, b);

        let mut strict = LineInterner::new();
        assert_ne!(strict.intern("Hello"), strict.intern("hello"));
    }

    #[test]
    fn test_split_lines_edge_cases() {
        assert!(split_lines("").is_empty());
        assert_eq!(split_lines("a"), vec!["a"]);
        assert_eq!(split_lines("a\n\n"), vec!["a", ""]);
    }
}
