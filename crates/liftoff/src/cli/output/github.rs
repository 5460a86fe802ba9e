//! GitHub Actions step outputs and annotations

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use liftoff_core::ReleaseOutput;

/// Message used when a failure carries no text of its own
pub const GENERIC_FAILURE: &str = "liftoff failed with an unexpected error";

/// Step outputs as `(key, value)` pairs.
///
/// `version` is set when exactly one package was released, `versions` (a JSON
/// array of `{path, target, version}`) when several were.
pub fn output_pairs(output: &ReleaseOutput) -> anyhow::Result<Vec<(&'static str, String)>> {
    let mut pairs = vec![("released", output.released.to_string())];
    match output.version() {
        Some(version) => pairs.push(("version", version.to_string())),
        None if output.packages.len() > 1 => pairs.push(("versions", output.versions_json()?)),
        None => {}
    }
    pairs.push(("prerelease", output.prerelease.to_string()));
    if let Some(number) = output.pull_request {
        pairs.push(("pull-request", number.to_string()));
    }
    Ok(pairs)
}

/// Write outputs to `$GITHUB_OUTPUT`, or print them when it is unset
pub fn write_outputs(output: &ReleaseOutput) -> anyhow::Result<()> {
    let pairs = output_pairs(output)?;
    match std::env::var("GITHUB_OUTPUT") {
        Ok(path) if !path.is_empty() => append_outputs(Path::new(&path), &pairs),
        _ => {
            for (key, value) in &pairs {
                println!("{}={}", key, value);
            }
            Ok(())
        }
    }
}

fn append_outputs(path: &Path, pairs: &[(&'static str, String)]) -> anyhow::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    for (key, value) in pairs {
        writeln!(file, "{}={}", key, value)?;
    }
    debug!(path = %path.display(), count = pairs.len(), "wrote step outputs");
    Ok(())
}

/// Workflow command that fails the step with `message`
pub fn error_annotation(message: &str) -> String {
    let message = message.trim();
    let message = if message.is_empty() {
        GENERIC_FAILURE
    } else {
        message
    };
    let escaped = message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A");
    format!("::error::{}", escaped)
}
