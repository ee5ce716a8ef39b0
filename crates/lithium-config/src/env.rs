//! `LITHIUM_*` environment variable support.

/// Well-known Lithium environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LithiumEnvVar {
    /// `LITHIUM_HOME` - global configuration/cache directory.
    Home,
    /// `LITHIUM_ADDON_PATH` - root directory addons are scanned from.
    AddonPath,
    /// `LITHIUM_CACHE_DIR` - system-dependency probe cache directory.
    CacheDir,
    /// `LITHIUM_TOOLCHAIN_PATH` - colon-separated toolchain search paths.
    ToolchainPath,
    /// `LITHIUM_BUILD_JOBS` - parallel build job count.
    BuildJobs,
    /// `LITHIUM_SANDBOX_TIME_LIMIT_MS` - default sandbox CPU time budget.
    SandboxTimeLimitMs,
    /// `LITHIUM_SANDBOX_MEMORY_LIMIT_BYTES` - default sandbox memory budget.
    SandboxMemoryLimitBytes,
    /// `LITHIUM_LOG` - `tracing` filter directive.
    Log,
    /// `LITHIUM_NO_SANDBOX` - disables resource limiting for local development.
    NoSandbox,
    /// `LITHIUM_NO_INTERACTION` - suppress interactive prompts.
    NoInteraction,
}

impl LithiumEnvVar {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Home => "LITHIUM_HOME",
            Self::AddonPath => "LITHIUM_ADDON_PATH",
            Self::CacheDir => "LITHIUM_CACHE_DIR",
            Self::ToolchainPath => "LITHIUM_TOOLCHAIN_PATH",
            Self::BuildJobs => "LITHIUM_BUILD_JOBS",
            Self::SandboxTimeLimitMs => "LITHIUM_SANDBOX_TIME_LIMIT_MS",
            Self::SandboxMemoryLimitBytes => "LITHIUM_SANDBOX_MEMORY_LIMIT_BYTES",
            Self::Log => "LITHIUM_LOG",
            Self::NoSandbox => "LITHIUM_NO_SANDBOX",
            Self::NoInteraction => "LITHIUM_NO_INTERACTION",
        }
    }

    #[must_use]
    pub fn get(self) -> Option<String> {
        std::env::var(self.as_str()).ok()
    }

    #[must_use]
    pub fn as_bool(self) -> Option<bool> {
        self.get().map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
    }

    #[must_use]
    pub fn as_u32(self) -> Option<u32> {
        self.get().and_then(|v| v.parse().ok())
    }

    #[must_use]
    pub fn as_u64(self) -> Option<u64> {
        self.get().and_then(|v| v.parse().ok())
    }

    #[must_use]
    pub fn as_paths(self) -> Vec<std::path::PathBuf> {
        self.get()
            .map(|v| std::env::split_paths(&v).collect())
            .unwrap_or_default()
    }
}

/// Snapshot of every recognized environment override, captured once at
/// loader construction so overrides can't change mid-resolution.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub addon_path: Option<std::path::PathBuf>,
    pub cache_dir: Option<std::path::PathBuf>,
    pub toolchain_path: Vec<std::path::PathBuf>,
    pub build_jobs: Option<u32>,
    pub sandbox_time_limit_ms: Option<u64>,
    pub sandbox_memory_limit_bytes: Option<u64>,
    pub log: Option<String>,
    pub no_sandbox: Option<bool>,
    pub no_interaction: Option<bool>,
}

impl EnvConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            addon_path: LithiumEnvVar::AddonPath.get().map(Into::into),
            cache_dir: LithiumEnvVar::CacheDir.get().map(Into::into),
            toolchain_path: LithiumEnvVar::ToolchainPath.as_paths(),
            build_jobs: LithiumEnvVar::BuildJobs.as_u32(),
            sandbox_time_limit_ms: LithiumEnvVar::SandboxTimeLimitMs.as_u64(),
            sandbox_memory_limit_bytes: LithiumEnvVar::SandboxMemoryLimitBytes.as_u64(),
            log: LithiumEnvVar::Log.get(),
            no_sandbox: LithiumEnvVar::NoSandbox.as_bool(),
            no_interaction: LithiumEnvVar::NoInteraction.as_bool(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_bool_recognizes_truthy_values() {
        // SAFETY (test-only): single-threaded test, no concurrent env access.
        unsafe { std::env::set_var("LITHIUM_NO_INTERACTION", "yes") };
        assert_eq!(LithiumEnvVar::NoInteraction.as_bool(), Some(true));
        unsafe { std::env::remove_var("LITHIUM_NO_INTERACTION") };
    }

    #[test]
    fn no_sandbox_reads_its_own_var() {
        unsafe { std::env::set_var("LITHIUM_NO_SANDBOX", "1") };
        assert_eq!(LithiumEnvVar::NoSandbox.as_bool(), Some(true));
        unsafe { std::env::remove_var("LITHIUM_NO_SANDBOX") };
    }

    #[test]
    fn as_paths_splits_on_path_separator() {
        let joined = std::env::join_paths(["/a", "/b"]).unwrap();
        unsafe { std::env::set_var("LITHIUM_TOOLCHAIN_PATH", &joined) };
        let paths = LithiumEnvVar::ToolchainPath.as_paths();
        assert_eq!(paths.len(), 2);
        unsafe { std::env::remove_var("LITHIUM_TOOLCHAIN_PATH") };
    }
}
