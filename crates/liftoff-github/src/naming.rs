//! Deterministic names for tags, releases, titles, and hidden markers
//!
//! Every name is derived from the change set alone so that repeated runs
//! produce the same tag, release, and PR title, and a PR can be rediscovered
//! by title when label lookup fails.

use liftoff_core::types::{is_root_path, PackageChanges};
use semver::Version;
use sha2::{Digest, Sha256};

const TARGET_MARKER_PREFIX: &str = "<!-- liftoff:target=";
const FINGERPRINT_MARKER_PREFIX: &str = "<!-- liftoff:fingerprint=";
const MARKER_SUFFIX: &str = " -->";

/// Prefix shared by every tag of a package
pub fn tag_prefix(path: &str) -> String {
    if is_root_path(path) {
        "v".to_string()
    } else {
        format!("{}-v", path.trim_end_matches('/'))
    }
}

/// Tag for a package version: `<path>-v<version>`, or `v<version>` at the root
pub fn tag_name(path: &str, version: &Version) -> String {
    format!("{}{}", tag_prefix(path), version)
}

/// Release display name: `<path>@<version>`, or `v<version>` at the root
pub fn release_name(path: &str, version: &Version) -> String {
    if is_root_path(path) {
        format!("v{}", version)
    } else {
        format!("{}@{}", path.trim_end_matches('/'), version)
    }
}

/// Split a tag back into package path and version
pub fn parse_tag(tag: &str) -> Option<(String, Version)> {
    if let Some(rest) = tag.strip_prefix('v') {
        if let Ok(version) = Version::parse(rest) {
            return Some((".".to_string(), version));
        }
    }
    let (path, version) = tag.rsplit_once("-v")?;
    let version = Version::parse(version).ok()?;
    if path.is_empty() {
        return None;
    }
    Some((path.to_string(), version))
}

/// Release PR title for a change set
pub fn pr_title(changes: &[PackageChanges], target: &str) -> String {
    match changes {
        [single] if single.is_root() => format!("chore: release {}", single.new_version),
        [single] => format!(
            "chore: release {}@{}",
            single.path.trim_end_matches('/'),
            single.new_version
        ),
        _ => format!("chore: release {}", target),
    }
}

/// Hidden marker naming the release target of a release body
pub fn target_marker(target: &str) -> String {
    format!("{}{}{}", TARGET_MARKER_PREFIX, target, MARKER_SUFFIX)
}

/// Whether a release body belongs to `target`
pub fn has_target_marker(body: &str, target: &str) -> bool {
    body.contains(&target_marker(target))
}

/// Stable digest of a release PR's inputs
pub fn fingerprint(base_sha: &str, changes: &[PackageChanges]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(base_sha.as_bytes());

    for change in changes {
        hasher.update(b"\0");
        hasher.update(change.path.as_bytes());
        hasher.update(b"\0");
        hasher.update(change.release_target.as_bytes());
        hasher.update(b"\0");
        hasher.update(change.new_version.to_string().as_bytes());
        for commit in &change.commits {
            hasher.update(b"\0");
            hasher.update(commit.source_ref.as_bytes());
        }
    }

    format!("{:x}", hasher.finalize())
}

/// Hidden marker carrying a fingerprint
pub fn fingerprint_marker(fingerprint: &str) -> String {
    format!("{}{}{}", FINGERPRINT_MARKER_PREFIX, fingerprint, MARKER_SUFFIX)
}

/// Fingerprint recorded in a PR body, if any
pub fn extract_fingerprint(body: &str) -> Option<&str> {
    let start = body.find(FINGERPRINT_MARKER_PREFIX)? + FINGERPRINT_MARKER_PREFIX.len();
    let rest = &body[start..];
    let end = rest.find(MARKER_SUFFIX)?;
    Some(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use liftoff_core::types::{CommitType, ConventionalCommit};

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn change(path: &str, version: &str) -> PackageChanges {
        PackageChanges {
            path: path.to_string(),
            name: path.to_string(),
            current_version: Some(v("1.0.0")),
            new_version: v(version),
            commits: vec![ConventionalCommit {
                commit_type: CommitType::Feat,
                scope: None,
                breaking: false,
                message: "x".to_string(),
                source_ref: "abc".to_string(),
            }],
            changelog: String::new(),
            release_target: "main".to_string(),
        }
    }

    #[test]
    fn test_tag_and_release_names() {
        assert_eq!(tag_name("pkg/a", &v("1.1.0")), "pkg/a-v1.1.0");
        assert_eq!(tag_name(".", &v("2.0.0")), "v2.0.0");
        assert_eq!(release_name("pkg/a", &v("1.1.0")), "pkg/a@1.1.0");
        assert_eq!(release_name(".", &v("2.0.0-rc.1")), "v2.0.0-rc.1");
    }

    #[test]
    fn test_parse_tag() {
        assert_eq!(parse_tag("pkg/a-v1.1.0"), Some(("pkg/a".to_string(), v("1.1.0"))));
        assert_eq!(
            parse_tag("pkg/my-vue-v0.2.0-rc.3"),
            Some(("pkg/my-vue".to_string(), v("0.2.0-rc.3")))
        );
        assert_eq!(parse_tag("v3.0.0"), Some((".".to_string(), v("3.0.0"))));
        assert_eq!(parse_tag("nightly"), None);
    }

    #[test]
    fn test_pr_titles() {
        assert_eq!(pr_title(&[change("pkg/a", "1.1.0")], "main"), "chore: release pkg/a@1.1.0");
        assert_eq!(pr_title(&[change(".", "0.3.0")], "main"), "chore: release 0.3.0");
        assert_eq!(
            pr_title(&[change("pkg/a", "1.1.0"), change("pkg/b", "2.0.0")], "canary"),
            "chore: release canary"
        );
    }

    #[test]
    fn test_target_marker() {
        let body = format!("notes\n\n{}", target_marker("main"));
        assert!(has_target_marker(&body, "main"));
        assert!(!has_target_marker(&body, "canary"));
    }

    #[test]
    fn test_fingerprint_round_trip() {
        let changes = vec![change("pkg/a", "1.1.0")];
        let fp = fingerprint("base", &changes);

        assert_eq!(fp.len(), 64);
        assert_eq!(fp, fingerprint("base", &changes));
        assert_ne!(fp, fingerprint("other", &changes));

        let body = format!("## Release\n\n{}\n", fingerprint_marker(&fp));
        assert_eq!(extract_fingerprint(&body), Some(fp.as_str()));
        assert_eq!(extract_fingerprint("no marker"), None);
    }
}
