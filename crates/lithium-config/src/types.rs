//! Configuration value types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// On-disk configuration file shape, shared by the system, global, and
/// project layers. Every field is optional: an absent field simply does
/// not contribute an override at that layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addon_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub toolchain_path: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_jobs: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox_time_limit_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox_memory_limit_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_sandbox: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_interaction: Option<bool>,
}

/// Fully resolved configuration, after merging defaults, system, global,
/// project, environment, and CLI layers in that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub addon_path: PathBuf,
    pub cache_dir: PathBuf,
    pub toolchain_path: Vec<PathBuf>,
    pub build_jobs: u32,
    pub sandbox_time_limit_ms: u64,
    pub sandbox_memory_limit_bytes: u64,
    pub log: String,
    pub no_sandbox: bool,
    pub no_interaction: bool,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            addon_path: PathBuf::from("./modules"),
            cache_dir: PathBuf::from(".lithium-cache"),
            toolchain_path: default_toolchain_search_paths(),
            build_jobs: num_cpus::get() as u32,
            sandbox_time_limit_ms: 5_000,
            sandbox_memory_limit_bytes: 512 * 1024 * 1024,
            log: "warn".to_string(),
            no_sandbox: false,
            no_interaction: false,
        }
    }
}

#[cfg(unix)]
fn default_toolchain_search_paths() -> Vec<PathBuf> {
    vec![PathBuf::from("/usr/bin"), PathBuf::from("/usr/local/bin"), PathBuf::from("/opt/bin")]
}

#[cfg(windows)]
fn default_toolchain_search_paths() -> Vec<PathBuf> {
    vec![PathBuf::from(r"C:\Program Files"), PathBuf::from(r"C:\Program Files (x86)")]
}
