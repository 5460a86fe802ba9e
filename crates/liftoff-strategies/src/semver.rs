//! SemVer version strategy

use liftoff_core::error::{Result, VersionError};
use semver::{BuildMetadata, Prerelease, Version};

use crate::types::BumpType;

/// Prerelease identifier used for release candidates
pub const RC_IDENTIFIER: &str = "rc";

/// Semantic Versioning strategy
///
/// Follows the SemVer 2.0.0 specification: https://semver.org/
#[derive(Debug, Clone)]
pub struct SemVerStrategy {
    /// Prerelease identifier for candidates
    pub prerelease_identifier: String,
}

impl SemVerStrategy {
    /// Create a new SemVer strategy
    pub fn new() -> Self {
        Self {
            prerelease_identifier: RC_IDENTIFIER.to_string(),
        }
    }

    /// Parse a version string, accepting a leading `v`
    pub fn parse(&self, version: &str) -> Result<Version> {
        let version = version.strip_prefix('v').unwrap_or(version);
        Version::parse(version)
            .map_err(|e| VersionError::ParseFailed(version.to_string(), e.to_string()).into())
    }

    /// Apply a bump. `None` returns the version unchanged.
    ///
    /// Bumping increments the named field, zeroes the lower ones, and clears
    /// prerelease and build metadata.
    pub fn bump(&self, current: &Version, bump: BumpType) -> Result<Version> {
        let mut next = current.clone();
        let overflow = |field: &'static str| VersionError::Overflow {
            version: current.to_string(),
            field,
        };

        match bump {
            BumpType::Major => {
                next.major = next.major.checked_add(1).ok_or_else(|| overflow("major"))?;
                next.minor = 0;
                next.patch = 0;
            }
            BumpType::Minor => {
                next.minor = next.minor.checked_add(1).ok_or_else(|| overflow("minor"))?;
                next.patch = 0;
            }
            BumpType::Patch => {
                next.patch = next.patch.checked_add(1).ok_or_else(|| overflow("patch"))?;
            }
            BumpType::None => return Ok(next),
        }

        next.pre = Prerelease::EMPTY;
        next.build = BuildMetadata::EMPTY;
        Ok(next)
    }

    /// Replace any prerelease suffix with `-<identifier>.<ordinal>`
    pub fn with_prerelease(&self, version: &Version, ordinal: u64) -> Result<Version> {
        let mut next = version.clone();
        let pre = format!("{}.{}", self.prerelease_identifier, ordinal);
        next.pre = Prerelease::new(&pre).map_err(|e| VersionError::InvalidFormat(e.to_string()))?;
        next.build = BuildMetadata::EMPTY;
        Ok(next)
    }

    /// Next version for a bump, optionally as a numbered candidate
    pub fn next_version(
        &self,
        current: &Version,
        bump: BumpType,
        prerelease: Option<u64>,
    ) -> Result<Version> {
        let next = self.bump(current, bump)?;
        match prerelease {
            Some(ordinal) => self.with_prerelease(&next, ordinal),
            None => Ok(next),
        }
    }

    /// Candidate ordinal of a version built from `base`, if it is one
    pub fn prerelease_ordinal(&self, version: &Version, base: &Version) -> Option<u64> {
        if (version.major, version.minor, version.patch) != (base.major, base.minor, base.patch) {
            return None;
        }
        let pre = version.pre.as_str();
        let (identifier, ordinal) = pre.rsplit_once('.')?;
        if identifier != self.prerelease_identifier {
            return None;
        }
        ordinal.parse().ok()
    }
}

impl Default for SemVerStrategy {
    fn default() -> Self {
        Self::new()
    }
}

/// Next version using the default strategy
pub fn next_version(current: &Version, bump: BumpType, prerelease: Option<u64>) -> Result<Version> {
    SemVerStrategy::new().next_version(current, bump, prerelease)
}

#[cfg(test)]
mod tests {
    use super::*;
    use liftoff_core::LiftoffError;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_parse_with_v_prefix() {
        let strategy = SemVerStrategy::new();
        assert_eq!(strategy.parse("v1.2.3").unwrap(), v("1.2.3"));
        assert!(strategy.parse("1.2").is_err());
    }

    #[test]
    fn test_next_version_bumps() {
        let current = v("1.2.3");
        assert_eq!(next_version(&current, BumpType::Major, None).unwrap(), v("2.0.0"));
        assert_eq!(next_version(&current, BumpType::Minor, None).unwrap(), v("1.3.0"));
        assert_eq!(next_version(&current, BumpType::Patch, None).unwrap(), v("1.2.4"));
        assert_eq!(next_version(&current, BumpType::None, None).unwrap(), v("1.2.3"));
    }

    #[test]
    fn test_next_version_prerelease() {
        let next = next_version(&v("1.2.3"), BumpType::Minor, Some(2)).unwrap();
        assert_eq!(next, v("1.3.0-rc.2"));
    }

    #[test]
    fn test_prerelease_is_idempotent() {
        let strategy = SemVerStrategy::new();
        let once = strategy.with_prerelease(&v("1.3.0"), 1).unwrap();
        let twice = strategy.with_prerelease(&once, 1).unwrap();
        assert_eq!(once, twice);
        assert_eq!(twice.to_string(), "1.3.0-rc.1");
    }

    #[test]
    fn test_bump_clears_prerelease() {
        let next = next_version(&v("1.3.0-rc.4"), BumpType::Patch, None).unwrap();
        assert_eq!(next, v("1.3.1"));
    }

    #[test]
    fn test_bump_at_maximum_is_an_error() {
        let strategy = SemVerStrategy::new();
        let current = Version::new(1, u64::MAX, 3);

        let err = strategy.bump(&current, BumpType::Minor).unwrap_err();
        assert!(matches!(
            err,
            LiftoffError::Version(VersionError::Overflow { field: "minor", .. })
        ));
        assert_eq!(strategy.bump(&current, BumpType::Major).unwrap(), v("2.0.0"));
        assert!(next_version(&Version::new(u64::MAX, 0, 0), BumpType::Major, None).is_err());
    }

    #[test]
    fn test_prerelease_ordinal() {
        let strategy = SemVerStrategy::new();
        let base = v("1.3.0");

        assert_eq!(strategy.prerelease_ordinal(&v("1.3.0-rc.3"), &base), Some(3));
        assert_eq!(strategy.prerelease_ordinal(&v("1.3.0"), &base), None);
        assert_eq!(strategy.prerelease_ordinal(&v("1.3.0-beta.1"), &base), None);
        assert_eq!(strategy.prerelease_ordinal(&v("1.4.0-rc.1"), &base), None);
    }
}
