//! Configuration loader with hierarchical merging.

use crate::env::EnvConfig;
use crate::error::{ConfigError, Result};
use crate::types::{ConfigFile, ResolvedConfig};
use directories::{BaseDirs, ProjectDirs};
use std::path::{Path, PathBuf};

/// Configuration source in hierarchy order. Later sources override earlier
/// ones field-by-field; an absent field at a later layer leaves the
/// earlier layer's value in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigSource {
    Defaults = 0,
    System = 1,
    Global = 2,
    Project = 3,
    Environment = 4,
    Cli = 5,
}

impl ConfigSource {
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Defaults => "built-in defaults",
            Self::System => "system configuration",
            Self::Global => "global configuration",
            Self::Project => "project configuration",
            Self::Environment => "environment variables",
            Self::Cli => "command-line arguments",
        }
    }
}

/// CLI-supplied overrides, applied last.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub addon_path: Option<PathBuf>,
    pub build_jobs: Option<u32>,
    pub no_sandbox: Option<bool>,
    pub no_interaction: Option<bool>,
}

/// Loads and merges configuration across all hierarchy layers.
#[derive(Debug)]
pub struct ConfigLoader {
    project_dir: PathBuf,
}

impl ConfigLoader {
    #[must_use]
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self { project_dir: project_dir.into() }
    }

    #[must_use]
    pub fn system_config_path() -> PathBuf {
        if cfg!(windows) {
            PathBuf::from(r"C:\ProgramData\lithium\config.json")
        } else {
            PathBuf::from("/etc/lithium/config.json")
        }
    }

    #[must_use]
    pub fn global_config_path() -> Option<PathBuf> {
        if let Some(dirs) = ProjectDirs::from("", "", "lithium") {
            return Some(dirs.config_dir().join("config.json"));
        }
        BaseDirs::new().map(|d| d.home_dir().join(".lithium").join("config.json"))
    }

    #[must_use]
    pub fn project_config_path(&self) -> PathBuf {
        self.project_dir.join("lithium.json")
    }

    fn read_file(path: &Path) -> Result<Option<ConfigFile>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let parsed: ConfigFile = lithium_core::from_json(&content).map_err(|e| {
            ConfigError::InvalidJson { path: path.to_path_buf(), message: e.to_string() }
        })?;
        Ok(Some(parsed))
    }

    /// Resolves the full configuration by merging every layer in hierarchy
    /// order: defaults, system, global, project, environment, then CLI.
    pub fn load(&self, cli: &CliOverrides) -> Result<ResolvedConfig> {
        let mut resolved = ResolvedConfig::default();

        if let Some(file) = Self::read_file(&Self::system_config_path())? {
            apply_file(&mut resolved, &file);
        }
        if let Some(path) = Self::global_config_path() {
            if let Some(file) = Self::read_file(&path)? {
                apply_file(&mut resolved, &file);
            }
        }
        if let Some(file) = Self::read_file(&self.project_config_path())? {
            apply_file(&mut resolved, &file);
        }

        apply_env(&mut resolved, &EnvConfig::from_env());
        apply_cli(&mut resolved, cli);

        Ok(resolved)
    }
}

fn apply_file(resolved: &mut ResolvedConfig, file: &ConfigFile) {
    if let Some(v) = &file.addon_path {
        resolved.addon_path = v.clone();
    }
    if let Some(v) = &file.cache_dir {
        resolved.cache_dir = v.clone();
    }
    if !file.toolchain_path.is_empty() {
        resolved.toolchain_path = file.toolchain_path.clone();
    }
    if let Some(v) = file.build_jobs {
        resolved.build_jobs = v;
    }
    if let Some(v) = file.sandbox_time_limit_ms {
        resolved.sandbox_time_limit_ms = v;
    }
    if let Some(v) = file.sandbox_memory_limit_bytes {
        resolved.sandbox_memory_limit_bytes = v;
    }
    if let Some(v) = &file.log {
        resolved.log = v.clone();
    }
    if let Some(v) = file.no_sandbox {
        resolved.no_sandbox = v;
    }
    if let Some(v) = file.no_interaction {
        resolved.no_interaction = v;
    }
}

fn apply_env(resolved: &mut ResolvedConfig, env: &EnvConfig) {
    if let Some(v) = &env.addon_path {
        resolved.addon_path = v.clone();
    }
    if let Some(v) = &env.cache_dir {
        resolved.cache_dir = v.clone();
    }
    if !env.toolchain_path.is_empty() {
        resolved.toolchain_path = env.toolchain_path.clone();
    }
    if let Some(v) = env.build_jobs {
        resolved.build_jobs = v;
    }
    if let Some(v) = env.sandbox_time_limit_ms {
        resolved.sandbox_time_limit_ms = v;
    }
    if let Some(v) = env.sandbox_memory_limit_bytes {
        resolved.sandbox_memory_limit_bytes = v;
    }
    if let Some(v) = &env.log {
        resolved.log = v.clone();
    }
    if let Some(v) = env.no_sandbox {
        resolved.no_sandbox = v;
    }
    if let Some(v) = env.no_interaction {
        resolved.no_interaction = v;
    }
}

fn apply_cli(resolved: &mut ResolvedConfig, cli: &CliOverrides) {
    if let Some(v) = &cli.addon_path {
        resolved.addon_path = v.clone();
    }
    if let Some(v) = cli.build_jobs {
        resolved.build_jobs = v;
    }
    if let Some(v) = cli.no_sandbox {
        resolved.no_sandbox = v;
    }
    if let Some(v) = cli.no_interaction {
        resolved.no_interaction = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_used_when_no_files_exist() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::new(dir.path());
        let resolved = loader.load(&CliOverrides::default()).unwrap();
        assert_eq!(resolved.log, "warn");
        assert_eq!(resolved.addon_path, PathBuf::from("./modules"));
    }

    #[test]
    fn project_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("lithium.json")).unwrap();
        write!(f, r#"{{"build_jobs": 4, "log": "debug"}}"#).unwrap();

        let loader = ConfigLoader::new(dir.path());
        let resolved = loader.load(&CliOverrides::default()).unwrap();
        assert_eq!(resolved.build_jobs, 4);
        assert_eq!(resolved.log, "debug");
    }

    #[test]
    fn cli_overrides_win_over_project_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("lithium.json")).unwrap();
        write!(f, r#"{{"build_jobs": 4}}"#).unwrap();

        let loader = ConfigLoader::new(dir.path());
        let cli = CliOverrides { build_jobs: Some(16), ..Default::default() };
        let resolved = loader.load(&cli).unwrap();
        assert_eq!(resolved.build_jobs, 16);
    }

    #[test]
    fn malformed_project_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("lithium.json"), "{not json").unwrap();

        let loader = ConfigLoader::new(dir.path());
        assert!(loader.load(&CliOverrides::default()).is_err());
    }
}
