//! Version strategy types

use serde::{Deserialize, Serialize};

/// Type of version bump, ordered `None < Patch < Minor < Major`
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BumpType {
    /// No bump needed
    #[default]
    None,
    /// Patch version bump (bug fixes)
    Patch,
    /// Minor version bump (new features)
    Minor,
    /// Major version bump (breaking changes)
    Major,
}

impl BumpType {
    /// Get the higher priority bump type
    pub fn max(self, other: Self) -> Self {
        std::cmp::max(self, other)
    }

    /// Whether this bump changes the version
    pub fn is_bump(&self) -> bool {
        *self != Self::None
    }
}

impl std::fmt::Display for BumpType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Major => write!(f, "major"),
            Self::Minor => write!(f, "minor"),
            Self::Patch => write!(f, "patch"),
            Self::None => write!(f, "none"),
        }
    }
}
