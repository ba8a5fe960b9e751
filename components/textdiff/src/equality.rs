//! Incremental equality narrowing across up to three files.
//!
//! [`ThreeWayState`] starts from the files that exist and assumes every pair of
//! them may be equal. Each comparison probe (size, bytes, timestamps, ...) can only
//! disprove equality for a pair, so the surviving set shrinks monotonically and the
//! final answer does not depend on probe order.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::diff::DifferencesStatus;

/// Role of a file in a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Location {
    /// Common ancestor.
    Base,
    /// Our version.
    Local,
    /// Their version.
    Remote,
}

impl Location {
    /// All roles in base, local, remote order.
    pub const ALL: [Self; 3] = [Self::Base, Self::Local, Self::Remote];

    /// The single-member set holding this role.
    #[must_use]
    pub const fn flag(self) -> Locations {
        match self {
            Self::Base => Locations::BASE,
            Self::Local => Locations::LOCAL,
            Self::Remote => Locations::REMOTE,
        }
    }

    /// Position of this role in per-location arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Base => 0,
            Self::Local => 1,
            Self::Remote => 2,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Base => "base",
            Self::Local => "local",
            Self::Remote => "remote",
        })
    }
}

bitflags::bitflags! {
    /// Set of [`Location`]s.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Locations: u8 {
        /// The base file.
        const BASE = 1 << 0;
        /// The local file.
        const LOCAL = 1 << 1;
        /// The remote file.
        const REMOTE = 1 << 2;
        /// Local and remote, the roles of a two-way comparison.
        const LOCAL_REMOTE = Self::LOCAL.bits() | Self::REMOTE.bits();
    }
}

impl Default for Locations {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Location> for Locations {
    fn from(location: Location) -> Self {
        location.flag()
    }
}

impl FromIterator<Location> for Locations {
    fn from_iter<I: IntoIterator<Item = Location>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), |set, l| set | l.flag())
    }
}

impl Locations {
    /// Members in base, local, remote order.
    pub fn members(self) -> impl Iterator<Item = Location> {
        Location::ALL.into_iter().filter(move |l| self.contains(l.flag()))
    }
}

/// A pair of files whose equality is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pair {
    /// Base and local.
    BaseLocal,
    /// Base and remote.
    BaseRemote,
    /// Local and remote.
    LocalRemote,
}

impl Pair {
    /// All pairs.
    pub const ALL: [Self; 3] = [Self::BaseLocal, Self::BaseRemote, Self::LocalRemote];

    /// The two files of the pair.
    #[must_use]
    pub const fn members(self) -> (Location, Location) {
        match self {
            Self::BaseLocal => (Location::Base, Location::Local),
            Self::BaseRemote => (Location::Base, Location::Remote),
            Self::LocalRemote => (Location::Local, Location::Remote),
        }
    }

    /// The single-member set holding this pair.
    #[must_use]
    pub const fn flag(self) -> Combinations {
        match self {
            Self::BaseLocal => Combinations::BASE_LOCAL,
            Self::BaseRemote => Combinations::BASE_REMOTE,
            Self::LocalRemote => Combinations::LOCAL_REMOTE,
        }
    }
}

bitflags::bitflags! {
    /// Set of [`Pair`]s.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Combinations: u8 {
        /// Base and local may be equal.
        const BASE_LOCAL = 1 << 0;
        /// Base and remote may be equal.
        const BASE_REMOTE = 1 << 1;
        /// Local and remote may be equal.
        const LOCAL_REMOTE = 1 << 2;
    }
}

impl Default for Combinations {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Pair> for Combinations {
    fn from(pair: Pair) -> Self {
        pair.flag()
    }
}

impl Combinations {
    /// Members in base-local, base-remote, local-remote order.
    pub fn pairs(self) -> impl Iterator<Item = Pair> {
        Pair::ALL.into_iter().filter(move |p| self.contains(p.flag()))
    }
}

/// Narrowing state for one node. Not shared across threads.
#[derive(Debug, Clone, Default)]
pub struct ThreeWayState {
    possible_files: Locations,
    possible_combinations: Combinations,
    seeded: bool,
}

impl ThreeWayState {
    /// Creates a state with no files.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `location` as present. Ignored once combinations are seeded.
    pub fn add_possibility(&mut self, location: Location) {
        if !self.seeded {
            self.possible_files |= location.flag();
        }
    }

    /// Derives the pair bits from the present files and freezes presence.
    pub fn seed_combinations(&mut self) {
        if self.seeded {
            return;
        }
        self.seeded = true;
        for pair in Pair::ALL {
            let (a, b) = pair.members();
            if self.possible_files.contains(a.flag() | b.flag()) {
                self.possible_combinations |= pair.flag();
            }
        }
    }

    /// Returns true while `pair` has not been proven different.
    #[must_use]
    pub const fn needs_probe(&self, pair: Pair) -> bool {
        self.possible_combinations.contains(pair.flag())
    }

    /// Clears `pair` when a probe proved it different. Never sets a bit.
    pub fn check_combination(&mut self, pair: Pair, is_different: bool) {
        if is_different {
            self.possible_combinations.remove(pair.flag());
        }
    }

    /// Recomputes which files still take part in at least one possible equality.
    pub fn derive_possible_files(&mut self) {
        self.possible_files = self.same_files();
    }

    /// Pairs that may still be equal.
    #[must_use]
    pub const fn remaining_combinations(&self) -> Combinations {
        self.possible_combinations
    }

    /// Files that still support at least one equality relation.
    #[must_use]
    pub fn same_files(&self) -> Locations {
        self.possible_combinations
            .pairs()
            .flat_map(|pair| {
                let (a, b) = pair.members();
                [a, b]
            })
            .collect()
    }

    /// Files currently considered possible.
    #[must_use]
    pub const fn possible_files(&self) -> Locations {
        self.possible_files
    }

    /// Three-way status of a node, treating two absent files as equal.
    ///
    /// `present` lists the files that exist; a pair counts as equal when both of its
    /// files are absent, or both are present and the pair survived every probe.
    /// Inconsistent survivors (two pairs without the third) collapse to
    /// [`DifferencesStatus::AllDifferent`].
    #[must_use]
    pub fn differences_status(&self, present: Locations) -> DifferencesStatus {
        let same = |pair: Pair| {
            let (a, b) = pair.members();
            match (present.contains(a.flag()), present.contains(b.flag())) {
                (false, false) => true,
                (true, true) => self.possible_combinations.contains(pair.flag()),
                _ => false,
            }
        };
        match (
            same(Pair::BaseLocal),
            same(Pair::BaseRemote),
            same(Pair::LocalRemote),
        ) {
            (true, true, true) => DifferencesStatus::AllSame,
            (true, false, false) => DifferencesStatus::BaseLocalSame,
            (false, true, false) => DifferencesStatus::BaseRemoteSame,
            (false, false, true) => DifferencesStatus::LocalRemoteSame,
            _ => DifferencesStatus::AllDifferent,
        }
    }

    /// Two-way status: `AllSame` when local and remote both exist and may be equal.
    #[must_use]
    pub const fn two_way_status(&self) -> DifferencesStatus {
        if self.possible_combinations.contains(Combinations::LOCAL_REMOTE) {
            DifferencesStatus::AllSame
        } else {
            DifferencesStatus::AllDifferent
        }
    }
}
