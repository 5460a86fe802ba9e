//! Release manifest: per-package, per-target version bookkeeping
//!
//! The manifest is a JSON object keyed by package path:
//!
//! ```json
//! { "pkg/a": { "latest": "1.1.0", "main": "1.1.0", "canary": "1.2.0-rc.1" } }
//! ```
//!
//! Older manifests map a path straight to a version string. Both shapes are
//! accepted on read and normalized to the per-target shape.

use std::collections::BTreeMap;

use semver::Version;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{JsonIndent, LATEST_KEY};
use crate::error::{Result, VersionError};

/// Versions tracked for a single package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageTargetVersions {
    /// Highest version ever assigned to the package
    pub latest: Version,

    /// Version per release target
    #[serde(flatten)]
    pub targets: BTreeMap<String, Version>,
}

impl PackageTargetVersions {
    /// Create an entry whose only known version is `latest`
    pub fn new(latest: Version) -> Self {
        Self {
            latest,
            targets: BTreeMap::new(),
        }
    }

    /// Version currently assigned to `target`
    pub fn target(&self, target: &str) -> Option<&Version> {
        self.targets.get(target)
    }

    /// Whether `target` lags behind `latest` (a missing target lags)
    pub fn is_behind(&self, target: &str) -> bool {
        self.target(target).map_or(true, |v| *v < self.latest)
    }
}

/// Manifest entry as it may appear on disk
#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Targets(PackageTargetVersions),
    Legacy(Version),
}

/// Mapping from package path to its tracked versions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PackageManifest {
    packages: BTreeMap<String, PackageTargetVersions>,
}

impl PackageManifest {
    /// Create an empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse manifest JSON, normalizing legacy `{path: version}` entries.
    ///
    /// A legacy entry becomes `latest` and is also assigned to `target`, since
    /// a single-lane manifest describes exactly one lane.
    pub fn parse(content: &str, target: &str) -> Result<Self> {
        let raw: BTreeMap<String, RawEntry> = serde_json::from_str(content)?;
        let mut packages = BTreeMap::new();

        for (path, entry) in raw {
            let versions = match entry {
                RawEntry::Targets(versions) => versions,
                RawEntry::Legacy(version) => {
                    debug!(path = %path, version = %version, "normalizing legacy manifest entry");
                    let mut versions = PackageTargetVersions::new(version.clone());
                    versions.targets.insert(target.to_string(), version);
                    versions
                }
            };
            packages.insert(path, versions);
        }

        Ok(Self { packages })
    }

    /// Parse manifest JSON, treating unparsable content as an empty manifest
    pub fn parse_or_empty(content: &str, target: &str) -> Self {
        match Self::parse(content, target) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(error = %e, "release manifest is not valid, treating as empty");
                Self::new()
            }
        }
    }

    /// Serialize with the configured indentation and a trailing newline
    pub fn to_json(&self, indent: JsonIndent) -> Result<String> {
        let indent = indent.as_bytes();
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;

        let mut out = String::from_utf8(buf)
            .map_err(|e| crate::error::LiftoffError::other(e.to_string()))?;
        out.push('\n');
        Ok(out)
    }

    /// Whether the manifest tracks no packages
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Number of tracked packages
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Tracked package paths, in sorted order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    /// Iterate over all entries
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PackageTargetVersions)> {
        self.packages.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entry for a package
    pub fn get(&self, path: &str) -> Option<&PackageTargetVersions> {
        self.packages.get(path)
    }

    /// Insert or replace an entry
    pub fn insert(&mut self, path: impl Into<String>, versions: PackageTargetVersions) {
        self.packages.insert(path.into(), versions);
    }

    /// Version assigned to `target` for `path`
    pub fn target_version(&self, path: &str, target: &str) -> Option<&Version> {
        self.get(path).and_then(|v| v.target(target))
    }

    /// Assign `version` to `target`, raising `latest` when it is exceeded.
    ///
    /// Targets only move forward; assigning an older version is an error.
    pub fn record(&mut self, path: &str, target: &str, version: &Version) -> Result<()> {
        debug_assert_ne!(target, LATEST_KEY);

        let entry = self
            .packages
            .entry(path.to_string())
            .or_insert_with(|| PackageTargetVersions::new(version.clone()));

        if let Some(current) = entry.targets.get(target) {
            if version < current {
                return Err(VersionError::Regression {
                    path: path.to_string(),
                    target: target.to_string(),
                    current: current.to_string(),
                    next: version.to_string(),
                }
                .into());
            }
        }

        entry.targets.insert(target.to_string(), version.clone());
        if *version > entry.latest {
            entry.latest = version.clone();
        }
        Ok(())
    }
}
