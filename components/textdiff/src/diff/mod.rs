//! Chunk types shared by the two-way and three-way algorithms.

pub mod myers;
pub mod three_way;

use serde::{Deserialize, Serialize};

use crate::equality::Location;

/// Interned id of one line. Equal ids mean equal (normalised) line text.
///
/// Ids are table indices, so a table never runs out of distinct ids.
pub type LineHash = usize;

/// How the files of a chunk, or of a whole node, relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DifferencesStatus {
    /// Every present file is identical. Never carried by a [`Diff3Item`].
    AllSame,
    /// Base and local agree; only remote changed.
    BaseLocalSame,
    /// Base and remote agree; only local changed.
    BaseRemoteSame,
    /// Local and remote made the same change.
    LocalRemoteSame,
    /// Local and remote changed the same region differently.
    AllDifferent,
}

/// Resolution chosen for a chunk, usually by the interactive phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PreferredAction {
    /// Use the default resolution for the chunk's status.
    #[default]
    Default,
    /// Keep the local lines.
    Local,
    /// Take the remote lines.
    Remote,
    /// Restore the base lines.
    Base,
    /// Keep the local lines followed by the remote lines.
    LocalThenRemote,
}

/// Concrete source of the lines a merge writes for one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Copy the chunk's lines from one file.
    Take(Location),
    /// Copy the local lines, then the remote lines.
    LocalThenRemote,
    /// No automatic answer; the chunk is a conflict.
    Unresolved,
}

impl PreferredAction {
    /// Maps an explicit preference to a resolution, `None` for [`PreferredAction::Default`].
    #[must_use]
    pub const fn explicit(self) -> Option<Resolution> {
        match self {
            Self::Default => None,
            Self::Local => Some(Resolution::Take(Location::Local)),
            Self::Remote => Some(Resolution::Take(Location::Remote)),
            Self::Base => Some(Resolution::Take(Location::Base)),
            Self::LocalThenRemote => Some(Resolution::LocalThenRemote),
        }
    }
}

/// One two-way change chunk.
///
/// Lines `local_start..local_start + local_affected` of the first sequence are replaced
/// by lines `remote_start..remote_start + remote_affected` of the second one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffItem {
    /// First changed line in the local (first) sequence, 0-based.
    pub local_start: usize,
    /// Number of local lines replaced.
    pub local_affected: usize,
    /// First changed line in the remote (second) sequence, 0-based.
    pub remote_start: usize,
    /// Number of remote lines inserted in their place.
    pub remote_affected: usize,
    /// Resolution selected for this chunk.
    #[serde(default)]
    pub preferred_action: PreferredAction,
}

impl DiffItem {
    /// Creates a chunk with the default action.
    #[must_use]
    pub const fn new(
        local_start: usize,
        local_affected: usize,
        remote_start: usize,
        remote_affected: usize,
    ) -> Self {
        Self {
            local_start,
            local_affected,
            remote_start,
            remote_affected,
            preferred_action: PreferredAction::Default,
        }
    }

    /// Exclusive end of the chunk in the local sequence.
    #[must_use]
    pub const fn local_end(&self) -> usize {
        self.local_start + self.local_affected
    }

    /// Exclusive end of the chunk in the remote sequence.
    #[must_use]
    pub const fn remote_end(&self) -> usize {
        self.remote_start + self.remote_affected
    }

    /// Two-way chunks keep the local side unless told otherwise.
    #[must_use]
    pub const fn resolution(&self) -> Resolution {
        match self.preferred_action.explicit() {
            Some(resolution) => resolution,
            None => Resolution::Take(Location::Local),
        }
    }
}

/// One three-way change chunk, positioned in all three files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diff3Item {
    /// First base line covered by the chunk.
    pub base_start: usize,
    /// Matching first line in the local file.
    pub local_start: usize,
    /// Matching first line in the remote file.
    pub remote_start: usize,
    /// Number of base lines covered.
    pub base_affected: usize,
    /// Number of local lines standing in for them.
    pub local_affected: usize,
    /// Number of remote lines standing in for them.
    pub remote_affected: usize,
    /// Which sides agree inside the chunk.
    pub status: DifferencesStatus,
    /// Resolution selected for this chunk.
    #[serde(default)]
    pub preferred_action: PreferredAction,
}

impl Diff3Item {
    /// Exclusive end of the chunk in base coordinates.
    #[must_use]
    pub const fn base_end(&self) -> usize {
        self.base_start + self.base_affected
    }

    /// Exclusive end of the chunk in local coordinates.
    #[must_use]
    pub const fn local_end(&self) -> usize {
        self.local_start + self.local_affected
    }

    /// Exclusive end of the chunk in remote coordinates.
    #[must_use]
    pub const fn remote_end(&self) -> usize {
        self.remote_start + self.remote_affected
    }

    /// True for chunks where both sides changed the region differently.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.status == DifferencesStatus::AllDifferent
    }

    /// Start and length of the chunk in the given file.
    #[must_use]
    pub const fn span(&self, location: Location) -> (usize, usize) {
        match location {
            Location::Base => (self.base_start, self.base_affected),
            Location::Local => (self.local_start, self.local_affected),
            Location::Remote => (self.remote_start, self.remote_affected),
        }
    }

    /// The explicit preference if any, otherwise the default for the chunk status.
    #[must_use]
    pub const fn resolution(&self) -> Resolution {
        if let Some(resolution) = self.preferred_action.explicit() {
            return resolution;
        }
        match self.status {
            DifferencesStatus::BaseLocalSame => Resolution::Take(Location::Remote),
            DifferencesStatus::AllSame
            | DifferencesStatus::BaseRemoteSame
            | DifferencesStatus::LocalRemoteSame => Resolution::Take(Location::Local),
            DifferencesStatus::AllDifferent => Resolution::Unresolved,
        }
    }
}
