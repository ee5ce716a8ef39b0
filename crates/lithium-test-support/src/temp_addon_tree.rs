//! Temporary addon tree construction for integration tests.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// A single addon to be materialized under a [`TempAddonTree`].
#[derive(Debug, Clone)]
pub struct AddonSpec {
    pub name: String,
    pub manifest_json: String,
    /// Relative paths, under the addon directory, to create as empty
    /// files — e.g. `"CMakeLists.txt"` to mark a CMake build, or
    /// `"package.json"` sibling artifacts for component loading tests.
    pub extra_files: Vec<String>,
}

impl AddonSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, manifest_json: impl Into<String>) -> Self {
        Self { name: name.into(), manifest_json: manifest_json.into(), extra_files: Vec::new() }
    }

    #[must_use]
    pub fn with_file(mut self, relative_path: impl Into<String>) -> Self {
        self.extra_files.push(relative_path.into());
        self
    }
}

/// A temporary directory populated with one or more addon subdirectories,
/// each carrying a `package.json` manifest. Cleaned up on drop.
#[derive(Debug)]
pub struct TempAddonTree {
    dir: TempDir,
}

impl TempAddonTree {
    #[must_use]
    pub fn builder() -> TempAddonTreeBuilder {
        TempAddonTreeBuilder::default()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    #[must_use]
    pub fn addon_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// Builder for [`TempAddonTree`].
#[derive(Debug, Default)]
pub struct TempAddonTreeBuilder {
    addons: Vec<AddonSpec>,
}

impl TempAddonTreeBuilder {
    #[must_use]
    pub fn with_addon(mut self, addon: AddonSpec) -> Self {
        self.addons.push(addon);
        self
    }

    pub fn build(self) -> Result<TempAddonTree> {
        let dir = tempdir().context("failed to create temp addon tree")?;
        for addon in &self.addons {
            let addon_dir = dir.path().join(&addon.name);
            std::fs::create_dir_all(&addon_dir)
                .with_context(|| format!("failed to create addon dir for {}", addon.name))?;
            std::fs::write(addon_dir.join("package.json"), &addon.manifest_json)
                .with_context(|| format!("failed to write manifest for {}", addon.name))?;
            for extra in &addon.extra_files {
                let path = addon_dir.join(extra);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&path, "")?;
            }
        }
        Ok(TempAddonTree { dir })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Fixtures;

    #[test]
    fn builds_addon_tree_with_manifest_files() {
        let tree = TempAddonTree::builder()
            .with_addon(AddonSpec::new("core", Fixtures::minimal_manifest("core", "1.0.0")))
            .with_addon(
                AddonSpec::new("widgets", Fixtures::minimal_manifest("widgets", "0.2.0"))
                    .with_file("CMakeLists.txt"),
            )
            .build()
            .unwrap();

        assert!(tree.addon_path("core").join("package.json").exists());
        assert!(tree.addon_path("widgets").join("CMakeLists.txt").exists());
    }
}
