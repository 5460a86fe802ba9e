//! Default configuration values

use super::types::Config;

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "liftoff.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "liftoff.yaml";

/// Default manifest path
pub const DEFAULT_MANIFEST_PATH: &str = "release-manifest.json";

/// Default release target
pub const DEFAULT_TARGET: &str = "main";

/// Reserved manifest key holding the version ceiling
pub const LATEST_KEY: &str = "latest";

/// Default prefix for release branches
pub const DEFAULT_BRANCH_PREFIX: &str = "liftoff/release";

/// Commits scanned when no prior release exists
pub const DEFAULT_LOOKBACK: usize = 50;

/// Label marking a pending release PR
pub const DEFAULT_PENDING_LABEL: &str = "release-me";

/// Label marking a shipped release PR
pub const DEFAULT_RELEASED_LABEL: &str = "released";

/// Label requesting a prerelease
pub const DEFAULT_PRERELEASE_LABEL: &str = "prerelease";

/// Prefix of the label naming a release target
pub const DEFAULT_TARGET_LABEL_PREFIX: &str = "release-target:";

/// Default per-package changelog file
pub const DEFAULT_CHANGELOG_FILE: &str = "CHANGELOG.md";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".liftoff.toml",
        ".liftoff.yaml",
    ]
}

/// Generate default configuration TOML
pub fn default_config_toml() -> String {
    let config = Config::default();
    toml::to_string_pretty(&config).unwrap_or_else(|_| DEFAULT_CONFIG_TEMPLATE.to_string())
}

/// Default configuration template
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# liftoff configuration

[manifest]
path = "release-manifest.json"
indent = 2

[release]
target = "main"
branch_prefix = "liftoff/release"
lookback = 50

[prerelease]
enabled = false
label = "prerelease"

[labels]
pending = "release-me"
released = "released"
target_prefix = "release-target:"

[changelog]
file = "CHANGELOG.md"
include_hashes = true
"#;
