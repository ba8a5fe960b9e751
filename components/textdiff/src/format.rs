//! Compact textual form of diff chunks.
//!
//! A chunk is written as `<start>.<start>[.<start>]^<len>.<len>[.<len>]`, positions
//! first and lengths second, in local/remote (two-way) or base/local/remote
//! (three-way) order. Conflicting three-way chunks carry a trailing `!!`.
//! Chunks are joined with `#`. Test fixtures depend on this exact layout.

use std::fmt;
use std::str::FromStr;

use crate::diff::{Diff3Item, DiffItem, DifferencesStatus, PreferredAction};
use crate::error::DiffError;

const CONFLICT_MARK: &str = "!!";

impl fmt::Display for DiffItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}^{}.{}",
            self.local_start, self.remote_start, self.local_affected, self.remote_affected
        )
    }
}

impl fmt::Display for Diff3Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}^{}.{}.{}",
            self.base_start,
            self.local_start,
            self.remote_start,
            self.base_affected,
            self.local_affected,
            self.remote_affected
        )?;
        if self.is_conflict() {
            f.write_str(CONFLICT_MARK)?;
        }
        Ok(())
    }
}

/// Joins chunks into their `#`-separated textual form.
#[must_use]
pub fn format_items<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("#")
}

fn numbers<const N: usize>(part: &str, whole: &str) -> Result<[usize; N], DiffError> {
    let mut values = [0; N];
    let mut fields = part.split('.');
    for value in &mut values {
        *value = fields
            .next()
            .and_then(|field| field.parse().ok())
            .ok_or_else(|| DiffError::Parse(whole.to_string()))?;
    }
    if fields.next().is_some() {
        return Err(DiffError::Parse(whole.to_string()));
    }
    Ok(values)
}

fn halves(s: &str) -> Result<(&str, &str), DiffError> {
    s.split_once('^')
        .ok_or_else(|| DiffError::Parse(s.to_string()))
}

impl FromStr for DiffItem {
    type Err = DiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (starts, lens) = halves(s)?;
        let [local_start, remote_start] = numbers::<2>(starts, s)?;
        let [local_affected, remote_affected] = numbers::<2>(lens, s)?;
        Ok(Self::new(local_start, local_affected, remote_start, remote_affected))
    }
}

/// Parsed three-way chunks only know whether they conflict; non-conflicting ones
/// come back as [`DifferencesStatus::BaseRemoteSame`] placeholders.
impl FromStr for Diff3Item {
    type Err = DiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (body, status) = match s.strip_suffix(CONFLICT_MARK) {
            Some(body) => (body, DifferencesStatus::AllDifferent),
            None => (s, DifferencesStatus::BaseRemoteSame),
        };
        let (starts, lens) = halves(body)?;
        let [base_start, local_start, remote_start] = numbers::<3>(starts, s)?;
        let [base_affected, local_affected, remote_affected] = numbers::<3>(lens, s)?;
        Ok(Self {
            base_start,
            local_start,
            remote_start,
            base_affected,
            local_affected,
            remote_affected,
            status,
            preferred_action: PreferredAction::Default,
        })
    }
}

fn parse_all<T: FromStr<Err = DiffError>>(text: &str) -> Result<Vec<T>, DiffError> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split('#').map(str::parse).collect()
}

/// Parses `#`-joined two-way chunks.
///
/// # Errors
///
/// Returns [`DiffError::Parse`] on malformed input.
pub fn parse_diff_items(text: &str) -> Result<Vec<DiffItem>, DiffError> {
    parse_all(text)
}

/// Parses `#`-joined three-way chunks.
///
/// # Errors
///
/// Returns [`DiffError::Parse`] on malformed input.
pub fn parse_diff3_items(text: &str) -> Result<Vec<Diff3Item>, DiffError> {
    parse_all(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_way_form() {
        let items = [DiffItem::new(3, 0, 3, 2), DiffItem::new(9, 1, 11, 1)];
        assert_eq!(format_items(&items), "3.3^0.2#9.11^1.1");
    }

    #[test]
    fn test_conflict_suffix() {
        let parsed = parse_diff3_items("2.2.2^1.3.0!!#4.6.3^3.3.3").unwrap();
        assert!(parsed[0].is_conflict());
        assert!(!parsed[1].is_conflict());
        assert_eq!(parsed[1].local_start, 6);
        assert_eq!(format_items(&parsed), "2.2.2^1.3.0!!#4.6.3^3.3.3");
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(format_items::<DiffItem>(&[]), "");
        assert!(parse_diff_items("").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_text_is_rejected() {
        assert!(matches!(
            parse_diff_items("3.3^0"),
            Err(DiffError::Parse(_))
        ));
        assert!(parse_diff3_items("1.2.3.4^0.0.0").is_err());
        assert!(parse_diff_items("a.b^c.d").is_err());
        assert!(parse_diff_items("3.3-0.2").is_err());
    }
}
