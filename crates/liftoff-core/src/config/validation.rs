//! Configuration validation

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::defaults::LATEST_KEY;
use super::types::{Config, JsonIndent};

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_manifest(config)?;
    validate_target(&config.release.target)?;
    validate_labels(config)?;
    debug!("configuration validation passed");
    Ok(())
}

/// Validate a release target name
pub fn validate_target(target: &str) -> Result<()> {
    if target.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "release.target".to_string(),
            message: "target cannot be empty".to_string(),
        }
        .into());
    }

    if target == LATEST_KEY {
        return Err(ConfigError::ReservedTarget(target.to_string()).into());
    }

    if target.chars().any(|c| c.is_whitespace() || c == ':') {
        return Err(ConfigError::InvalidValue {
            field: "release.target".to_string(),
            message: "target cannot contain whitespace or ':'".to_string(),
        }
        .into());
    }

    Ok(())
}

fn validate_manifest(config: &Config) -> Result<()> {
    if config.manifest.path.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "manifest.path".to_string(),
            message: "manifest path cannot be empty".to_string(),
        }
        .into());
    }

    if let JsonIndent::Spaces(n) = config.manifest.indent {
        if n == 0 || n > 8 {
            return Err(ConfigError::InvalidValue {
                field: "manifest.indent".to_string(),
                message: "must be 'tab' or between 1 and 8 spaces".to_string(),
            }
            .into());
        }
    }

    Ok(())
}

fn validate_labels(config: &Config) -> Result<()> {
    let labels = [
        ("labels.pending", &config.labels.pending),
        ("labels.released", &config.labels.released),
        ("labels.target_prefix", &config.labels.target_prefix),
        ("prerelease.label", &config.prerelease.label),
    ];

    for (field, value) in labels {
        if value.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: field.to_string(),
                message: "label cannot be empty".to_string(),
            }
            .into());
        }
    }

    if config.labels.pending == config.labels.released {
        return Err(ConfigError::InvalidValue {
            field: "labels.released".to_string(),
            message: "must differ from labels.pending".to_string(),
        }
        .into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LiftoffError;

    #[test]
    fn test_validate_default_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_reject_latest_target() {
        let mut config = Config::default();
        config.release.target = "latest".to_string();

        let err = validate_config(&config).unwrap_err();
        assert!(matches!(
            err,
            LiftoffError::Config(ConfigError::ReservedTarget(_))
        ));
    }

    #[test]
    fn test_reject_target_with_colon() {
        assert!(validate_target("release:main").is_err());
        assert!(validate_target("canary").is_ok());
    }

    #[test]
    fn test_reject_wide_indent() {
        let mut config = Config::default();
        config.manifest.indent = JsonIndent::Spaces(12);
        assert!(validate_config(&config).is_err());

        config.manifest.indent = JsonIndent::Tab;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_reject_identical_labels() {
        let mut config = Config::default();
        config.labels.released = config.labels.pending.clone();
        assert!(validate_config(&config).is_err());
    }
}
