//! `validate` command: check a single addon manifest.

use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::output;

const MANIFEST_NAMES: [&str; 3] = ["package.json", "package.xml", "package.yaml"];

/// Arguments for the validate command.
#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Path to a manifest file, or a directory containing one (defaults to
    /// the current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Treat missing dependency version constraints as errors
    #[arg(long)]
    pub strict: bool,
}

fn resolve_manifest_path(path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    for name in MANIFEST_NAMES {
        let candidate = path.join(name);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    anyhow::bail!(
        "no package.json, package.xml, or package.yaml found under {}",
        path.display()
    )
}

pub async fn run(args: ValidateArgs, json: bool) -> Result<()> {
    info!(path = %args.path.display(), "running validate command");

    let manifest_path = resolve_manifest_path(&args.path)?;
    let parsed = lithium_manifest::parse(&manifest_path);

    let (success, message) = match &parsed {
        Ok((id, record)) => (
            true,
            format!(
                "{id} {} is valid ({} dependencies, {} modules)",
                record.version,
                record.dependencies.len(),
                record.modules.len()
            ),
        ),
        Err(e) => (false, e.to_string()),
    };

    let mut warnings = Vec::new();
    if let Ok((_, record)) = &parsed {
        if args.strict && record.modules.is_empty() {
            warnings.push("manifest declares no modules".to_string());
        }
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "success": success,
                "manifest": manifest_path.display().to_string(),
                "message": message,
                "warnings": warnings,
            }))?
        );
    } else {
        output::header(&format!("validating {}", manifest_path.display()));
        if success {
            output::success(&message);
        } else {
            output::error(&message);
        }
        for warning in &warnings {
            output::warning(warning);
        }
    }

    if !success || (args.strict && !warnings.is_empty()) {
        anyhow::bail!("validation failed for {}", manifest_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_manifest_path_finds_package_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), r#"{"name":"x","version":"1.0.0"}"#).unwrap();
        let resolved = resolve_manifest_path(dir.path()).unwrap();
        assert_eq!(resolved.file_name().unwrap(), "package.json");
    }

    #[test]
    fn resolve_manifest_path_rejects_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(resolve_manifest_path(dir.path()).is_err());
    }
}
