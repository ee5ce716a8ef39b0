//! Toolchain registry (C7): discovers, persists, and queries known
//! compilers and build tools.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use lithium_core::{Error, Result};
use lithium_version::Version;
use serde::{Deserialize, Serialize};

/// Whether a [`Toolchain`] is a compiler, a build tool, or unclassified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolchainKind {
    Compiler,
    BuildTool,
    Unknown,
}

/// A discovered or manually-registered toolchain entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Toolchain {
    pub name: String,
    pub compiler: String,
    pub build_tool: String,
    pub version: Version,
    pub path: PathBuf,
    pub kind: ToolchainKind,
}

const WELL_KNOWN_EXECUTABLES: &[(&str, &str, ToolchainKind)] = &[
    ("gcc", "gcc", ToolchainKind::Compiler),
    ("g++", "gcc", ToolchainKind::Compiler),
    ("clang", "clang", ToolchainKind::Compiler),
    ("clang++", "clang", ToolchainKind::Compiler),
    ("cmake", "cmake", ToolchainKind::BuildTool),
    ("meson", "meson", ToolchainKind::BuildTool),
    ("ninja", "ninja", ToolchainKind::BuildTool),
    ("xmake", "xmake", ToolchainKind::BuildTool),
];

/// Registry of known toolchains, unique by `name`.
#[derive(Debug, Default)]
pub struct ToolchainRegistry {
    toolchains: HashMap<String, Toolchain>,
    aliases: HashMap<String, String>,
    default: Option<String>,
}

impl ToolchainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans `search_paths` for the well-known executables, registering
    /// each one found. Entries already present by name are left alone.
    pub fn scan(&mut self, search_paths: &[impl AsRef<Path>]) {
        for dir in search_paths {
            let dir = dir.as_ref();
            let Ok(entries) = std::fs::read_dir(dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let file_name = entry.file_name();
                let Some(file_name) = file_name.to_str() else { continue };
                if let Some((name, group, kind)) = WELL_KNOWN_EXECUTABLES
                    .iter()
                    .find(|(exe, _, _)| *exe == file_name)
                {
                    self.toolchains.entry((*name).to_string()).or_insert_with(|| Toolchain {
                        name: (*name).to_string(),
                        compiler: if *kind == ToolchainKind::Compiler { (*group).to_string() } else { String::new() },
                        build_tool: if *kind == ToolchainKind::BuildTool { (*group).to_string() } else { String::new() },
                        version: Version::new(0, 0, 0),
                        path: entry.path(),
                        kind: *kind,
                    });
                }
            }
        }
    }

    /// Registers or replaces a toolchain by name.
    pub fn register(&mut self, toolchain: Toolchain) {
        self.toolchains.insert(toolchain.name.clone(), toolchain);
    }

    pub fn add_alias(&mut self, alias: &str, name: &str) {
        self.aliases.insert(alias.to_string(), name.to_string());
    }

    /// Queries by primary name, falling back to alias resolution.
    pub fn get(&self, name_or_alias: &str) -> Option<&Toolchain> {
        self.toolchains.get(name_or_alias).or_else(|| {
            self.aliases
                .get(name_or_alias)
                .and_then(|real| self.toolchains.get(real))
        })
    }

    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.toolchains.contains_key(name) {
            return Err(Error::parse("toolchain", name, "no such toolchain registered"));
        }
        self.default = Some(name.to_string());
        Ok(())
    }

    pub fn default_toolchain(&self) -> Option<&Toolchain> {
        self.default.as_ref().and_then(|name| self.toolchains.get(name))
    }

    /// Returns toolchains whose `compiler` or `build_tool` field is a
    /// plausible match for `lang` (case-insensitive substring match).
    pub fn compatible_with(&self, lang: &str) -> Vec<&Toolchain> {
        let lang = lang.to_lowercase();
        self.toolchains
            .values()
            .filter(|t| is_compatible(t, &lang))
            .collect()
    }

    pub fn persist(&self, path: &Path) -> Result<()> {
        let entries: Vec<&Toolchain> = self.toolchains.values().collect();
        let text = serde_json::to_string_pretty(&entries)
            .map_err(|e| Error::parse("toolchain registry", path.display().to_string(), e.to_string()))?;
        std::fs::write(path, text).map_err(|e| Error::io(path.to_path_buf(), e))
    }

    pub fn restore(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path.to_path_buf(), e))?;
        let entries: Vec<Toolchain> = serde_json::from_str(&text)
            .map_err(|e| Error::parse("toolchain registry", path.display().to_string(), e.to_string()))?;
        let mut registry = Self::new();
        for entry in entries {
            registry.register(entry);
        }
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.toolchains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toolchains.is_empty()
    }
}

fn is_compatible(toolchain: &Toolchain, lang: &str) -> bool {
    match lang {
        "c" | "c++" | "cpp" => toolchain.kind == ToolchainKind::Compiler,
        "cmake" => toolchain.build_tool == "cmake",
        "meson" => toolchain.build_tool == "meson",
        "xmake" => toolchain.build_tool == "xmake",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str, kind: ToolchainKind) -> Toolchain {
        Toolchain {
            name: name.to_string(),
            compiler: if kind == ToolchainKind::Compiler { name.to_string() } else { String::new() },
            build_tool: if kind == ToolchainKind::BuildTool { name.to_string() } else { String::new() },
            version: Version::new(1, 0, 0),
            path: PathBuf::from(format!("/usr/bin/{name}")),
            kind,
        }
    }

    #[test]
    fn register_and_get_by_name() {
        let mut registry = ToolchainRegistry::new();
        registry.register(sample("gcc", ToolchainKind::Compiler));
        assert!(registry.get("gcc").is_some());
    }

    #[test]
    fn get_resolves_alias() {
        let mut registry = ToolchainRegistry::new();
        registry.register(sample("gcc", ToolchainKind::Compiler));
        registry.add_alias("cc", "gcc");
        assert_eq!(registry.get("cc").unwrap().name, "gcc");
    }

    #[test]
    fn set_default_requires_existing_toolchain() {
        let mut registry = ToolchainRegistry::new();
        assert!(registry.set_default("missing").is_err());
        registry.register(sample("gcc", ToolchainKind::Compiler));
        assert!(registry.set_default("gcc").is_ok());
        assert_eq!(registry.default_toolchain().unwrap().name, "gcc");
    }

    #[test]
    fn compatible_with_filters_by_kind() {
        let mut registry = ToolchainRegistry::new();
        registry.register(sample("gcc", ToolchainKind::Compiler));
        registry.register(sample("cmake", ToolchainKind::BuildTool));
        let compilers = registry.compatible_with("c++");
        assert_eq!(compilers.len(), 1);
        assert_eq!(compilers[0].name, "gcc");
    }

    #[test]
    fn persist_and_restore_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toolchains.json");
        let mut registry = ToolchainRegistry::new();
        registry.register(sample("gcc", ToolchainKind::Compiler));
        registry.persist(&path).unwrap();

        let restored = ToolchainRegistry::restore(&path).unwrap();
        assert_eq!(restored.len(), 1);
        assert!(restored.get("gcc").is_some());
    }

    #[test]
    fn register_overwrites_by_name() {
        let mut registry = ToolchainRegistry::new();
        registry.register(sample("gcc", ToolchainKind::Compiler));
        let mut updated = sample("gcc", ToolchainKind::Compiler);
        updated.version = Version::new(2, 0, 0);
        registry.register(updated);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("gcc").unwrap().version, Version::new(2, 0, 0));
    }
}
