//! Domain-specific assertion helpers for addon-tree tests.

use anyhow::{bail, Context, Result};
use std::path::Path;

/// Assert that an addon manifest exists at `addon_dir/package.json` and, if
/// `expected_version` is given, that its `version` field matches.
pub fn assert_manifest_present(addon_dir: &Path, expected_version: Option<&str>) -> Result<()> {
    let manifest_path = addon_dir.join("package.json");
    if !manifest_path.exists() {
        bail!("no package.json found under {}", addon_dir.display());
    }

    if let Some(expected) = expected_version {
        let content = std::fs::read_to_string(&manifest_path)
            .with_context(|| format!("failed to read {}", manifest_path.display()))?;
        let value: serde_json::Value = serde_json::from_str(&content)?;
        let actual = value["version"].as_str().unwrap_or_default();
        if actual != expected {
            bail!("version mismatch for {}: expected {expected}, found {actual}", addon_dir.display());
        }
    }

    Ok(())
}

/// Assert that a build-system marker file (e.g. `CMakeLists.txt`) exists
/// under the given addon directory.
pub fn assert_build_marker_present(addon_dir: &Path, marker: &str) -> Result<()> {
    if !addon_dir.join(marker).exists() {
        bail!("expected build marker `{marker}` under {}", addon_dir.display());
    }
    Ok(())
}
