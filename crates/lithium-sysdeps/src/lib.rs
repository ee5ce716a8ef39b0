//! Host system package manager detection and dependency installation (C4).
//!
//! Mirrors `DependencyManager` from the original addon subsystem: detect the
//! host distribution family, synthesize platform-specific probe/install/
//! uninstall commands, cache install status across runs, and allow
//! per-dependency install command overrides.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use lithium_core::{Error, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Host platform family, named exactly as `DistroType` in the original
/// addon subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformKind {
    Debian,
    Fedora,
    Arch,
    OpenSUSE,
    Gentoo,
    MacOS,
    Windows,
    Unknown,
}

impl PlatformKind {
    /// Detects the host platform. On Linux this reads `/etc/os-release` and
    /// matches `ID`/`ID_LIKE`; on other platforms it is fixed at compile time.
    pub fn detect() -> Self {
        #[cfg(target_os = "macos")]
        {
            return Self::MacOS;
        }
        #[cfg(target_os = "windows")]
        {
            return Self::Windows;
        }
        #[cfg(target_os = "linux")]
        {
            return Self::detect_linux(Path::new("/etc/os-release"))
                .unwrap_or(Self::Unknown);
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        {
            Self::Unknown
        }
    }

    fn detect_linux(os_release: &Path) -> Option<Self> {
        let text = std::fs::read_to_string(os_release).ok()?;
        Self::parse_os_release(&text)
    }

    fn parse_os_release(text: &str) -> Option<Self> {
        let mut id = String::new();
        let mut id_like = String::new();
        for line in text.lines() {
            if let Some(v) = line.strip_prefix("ID=") {
                id = v.trim_matches('"').to_lowercase();
            } else if let Some(v) = line.strip_prefix("ID_LIKE=") {
                id_like = v.trim_matches('"').to_lowercase();
            }
        }
        let haystack = format!("{id} {id_like}");
        Some(if haystack.contains("debian") || haystack.contains("ubuntu") {
            Self::Debian
        } else if haystack.contains("fedora") || haystack.contains("rhel") {
            Self::Fedora
        } else if haystack.contains("arch") {
            Self::Arch
        } else if haystack.contains("suse") {
            Self::OpenSUSE
        } else if haystack.contains("gentoo") {
            Self::Gentoo
        } else {
            Self::Unknown
        })
    }
}

/// Command-synthesizing table for one platform family, configured once at
/// construction time by [`PlatformKind`].
#[derive(Debug, Clone)]
struct PackageManager {
    probe: fn(&str) -> Vec<String>,
    install: fn(&str) -> Vec<String>,
    uninstall: fn(&str) -> Vec<String>,
}

fn apt_probe(name: &str) -> Vec<String> {
    vec!["dpkg".into(), "-s".into(), name.into()]
}
fn apt_install(name: &str) -> Vec<String> {
    vec!["apt-get".into(), "install".into(), "-y".into(), name.into()]
}
fn apt_uninstall(name: &str) -> Vec<String> {
    vec!["apt-get".into(), "remove".into(), "-y".into(), name.into()]
}

fn dnf_probe(name: &str) -> Vec<String> {
    vec!["rpm".into(), "-q".into(), name.into()]
}
fn dnf_install(name: &str) -> Vec<String> {
    vec!["dnf".into(), "install".into(), "-y".into(), name.into()]
}
fn dnf_uninstall(name: &str) -> Vec<String> {
    vec!["dnf".into(), "remove".into(), "-y".into(), name.into()]
}

fn pacman_probe(name: &str) -> Vec<String> {
    vec!["pacman".into(), "-Q".into(), name.into()]
}
fn pacman_install(name: &str) -> Vec<String> {
    vec!["pacman".into(), "-S".into(), "--noconfirm".into(), name.into()]
}
fn pacman_uninstall(name: &str) -> Vec<String> {
    vec!["pacman".into(), "-R".into(), "--noconfirm".into(), name.into()]
}

fn zypper_probe(name: &str) -> Vec<String> {
    vec!["rpm".into(), "-q".into(), name.into()]
}
fn zypper_install(name: &str) -> Vec<String> {
    vec!["zypper".into(), "install".into(), "-y".into(), name.into()]
}
fn zypper_uninstall(name: &str) -> Vec<String> {
    vec!["zypper".into(), "remove".into(), "-y".into(), name.into()]
}

fn portage_probe(name: &str) -> Vec<String> {
    vec!["equery".into(), "list".into(), name.into()]
}
fn portage_install(name: &str) -> Vec<String> {
    vec!["emerge".into(), name.into()]
}
fn portage_uninstall(name: &str) -> Vec<String> {
    vec!["emerge".into(), "--depclean".into(), name.into()]
}

fn brew_probe(name: &str) -> Vec<String> {
    vec!["brew".into(), "list".into(), name.into()]
}
fn brew_install(name: &str) -> Vec<String> {
    vec!["brew".into(), "install".into(), name.into()]
}
fn brew_uninstall(name: &str) -> Vec<String> {
    vec!["brew".into(), "uninstall".into(), name.into()]
}

fn choco_probe(name: &str) -> Vec<String> {
    vec!["choco".into(), "list".into(), "--local-only".into(), name.into()]
}
fn choco_install(name: &str) -> Vec<String> {
    vec!["choco".into(), "install".into(), "-y".into(), name.into()]
}
fn choco_uninstall(name: &str) -> Vec<String> {
    vec!["choco".into(), "uninstall".into(), "-y".into(), name.into()]
}

fn unknown_probe(_: &str) -> Vec<String> {
    Vec::new()
}

impl PackageManager {
    fn for_platform(kind: PlatformKind) -> Self {
        match kind {
            PlatformKind::Debian => Self { probe: apt_probe, install: apt_install, uninstall: apt_uninstall },
            PlatformKind::Fedora => Self { probe: dnf_probe, install: dnf_install, uninstall: dnf_uninstall },
            PlatformKind::Arch => Self { probe: pacman_probe, install: pacman_install, uninstall: pacman_uninstall },
            PlatformKind::OpenSUSE => Self { probe: zypper_probe, install: zypper_install, uninstall: zypper_uninstall },
            PlatformKind::Gentoo => Self { probe: portage_probe, install: portage_install, uninstall: portage_uninstall },
            PlatformKind::MacOS => Self { probe: brew_probe, install: brew_install, uninstall: brew_uninstall },
            PlatformKind::Windows => Self { probe: choco_probe, install: choco_install, uninstall: choco_uninstall },
            PlatformKind::Unknown => Self { probe: unknown_probe, install: unknown_probe, uninstall: unknown_probe },
        }
    }
}

/// Severity carried alongside progress messages, matching the original's
/// `LogLevel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    installed: HashMap<String, bool>,
}

struct Inner {
    platform: PlatformKind,
    manager: PackageManager,
    cache: HashMap<String, bool>,
    overrides: HashMap<String, Vec<String>>,
    cache_path: PathBuf,
    pending: HashMap<String, watch::Sender<bool>>,
}

/// System dependency manager (C4). One instance owns the install-status
/// cache for a single `dependency_cache.json` file.
pub struct SystemDependencyManager {
    inner: Arc<Mutex<Inner>>,
}

impl std::fmt::Debug for SystemDependencyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("SystemDependencyManager")
            .field("platform", &inner.platform)
            .field("cached", &inner.cache.len())
            .finish()
    }
}

impl SystemDependencyManager {
    /// Creates a manager for the detected platform, loading `cache_path` if
    /// it exists. A corrupt cache file is logged and treated as empty.
    pub fn new(cache_path: impl Into<PathBuf>) -> Self {
        let platform = PlatformKind::detect();
        Self::with_platform(platform, cache_path)
    }

    /// As [`Self::new`] but with an explicit platform, for testing.
    pub fn with_platform(platform: PlatformKind, cache_path: impl Into<PathBuf>) -> Self {
        let cache_path = cache_path.into();
        let cache = load_cache(&cache_path);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                platform,
                manager: PackageManager::for_platform(platform),
                cache,
                overrides: HashMap::new(),
                cache_path,
                pending: HashMap::new(),
            })),
        }
    }

    pub fn detect_platform(&self) -> PlatformKind {
        self.inner.lock().platform
    }

    /// Consults the in-memory cache; on miss, runs the platform probe
    /// command and caches the result.
    pub fn check_installed(&self, dep: &str) -> Result<bool> {
        {
            let inner = self.inner.lock();
            if let Some(cached) = inner.cache.get(dep) {
                return Ok(*cached);
            }
        }
        let probe = {
            let inner = self.inner.lock();
            (inner.manager.probe)(dep)
        };
        let installed = run_probe(&probe);
        let mut inner = self.inner.lock();
        inner.cache.insert(dep.to_string(), installed);
        Ok(installed)
    }

    /// Overrides the install command for `name`.
    pub fn set_custom_install_command(&self, name: &str, cmd: Vec<String>) {
        self.inner.lock().overrides.insert(name.to_string(), cmd);
    }

    /// Runs the platform install command synchronously, blocking the
    /// calling thread until the subprocess exits.
    pub fn install(&self, dep: &str) -> Result<()> {
        let cmd = self.install_command(dep);
        run_command(dep, &cmd)?;
        self.inner.lock().cache.insert(dep.to_string(), true);
        Ok(())
    }

    /// Spawns the install command on a blocking task; completion is
    /// reported through the returned `JoinHandle`. A best-effort
    /// cancellation channel is registered under `dep`'s name so that
    /// [`Self::cancel`] can request early termination.
    pub fn install_async(&self, dep: &str) -> JoinHandle<Result<()>> {
        let cmd = self.install_command(dep);
        let dep_owned = dep.to_string();
        let inner = Arc::clone(&self.inner);
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        inner.lock().pending.insert(dep_owned.clone(), cancel_tx);
        tokio::spawn(async move {
            let dep_for_cmd = dep_owned.clone();
            let result = tokio::select! {
                r = tokio::task::spawn_blocking(move || run_command(&dep_for_cmd, &cmd)) => {
                    r.map_err(|e| Error::subprocess_failure(dep_owned.clone(), -1, e.to_string()))?
                }
                _ = cancel_rx.changed() => {
                    Err(Error::subprocess_failure(dep_owned.clone(), -1, "install cancelled"))
                }
            };
            let mut guard = inner.lock();
            guard.pending.remove(&dep_owned);
            if result.is_ok() {
                guard.cache.insert(dep_owned, true);
            }
            result
        })
    }

    /// Sends a best-effort cancellation signal for an in-flight async
    /// install. Returns `true` if a pending install was found.
    pub fn cancel(&self, name: &str) -> bool {
        let inner = self.inner.lock();
        if let Some(tx) = inner.pending.get(name) {
            let _ = tx.send(true);
            true
        } else {
            false
        }
    }

    /// Symmetric to [`Self::install`].
    pub fn uninstall(&self, name: &str) -> Result<()> {
        let cmd = {
            let inner = self.inner.lock();
            (inner.manager.uninstall)(name)
        };
        run_command(name, &cmd)?;
        self.inner.lock().cache.insert(name.to_string(), false);
        Ok(())
    }

    fn install_command(&self, dep: &str) -> Vec<String> {
        let inner = self.inner.lock();
        inner
            .overrides
            .get(dep)
            .cloned()
            .unwrap_or_else(|| (inner.manager.install)(dep))
    }

    /// Multi-line report enumerating every cached dependency and its
    /// installed status.
    pub fn generate_report(&self) -> String {
        let inner = self.inner.lock();
        let mut names: Vec<&String> = inner.cache.keys().collect();
        names.sort();
        names
            .into_iter()
            .map(|name| {
                let status = if inner.cache[name] { "installed" } else { "missing" };
                format!("{name}: {status}")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Writes the cache back to `cache_path`. Mirrors the original's
    /// save-on-destruction behavior, but made explicit since Rust has no
    /// equivalent of C++ destructor ordering guarantees across threads.
    pub fn save_cache(&self) -> Result<()> {
        let inner = self.inner.lock();
        let file = CacheFile { installed: inner.cache.clone() };
        let text = serde_json::to_string_pretty(&file)
            .map_err(|e| Error::parse("cache", inner.cache_path.display().to_string(), e.to_string()))?;
        std::fs::write(&inner.cache_path, text)
            .map_err(|e| Error::io(inner.cache_path.clone(), e))
    }
}

impl Drop for SystemDependencyManager {
    fn drop(&mut self) {
        if let Err(e) = self.save_cache() {
            tracing::warn!(error = %e, "failed to persist dependency cache on drop");
        }
    }
}

fn load_cache(path: &Path) -> HashMap<String, bool> {
    let Ok(text) = std::fs::read_to_string(path) else {
        return HashMap::new();
    };
    match serde_json::from_str::<CacheFile>(&text) {
        Ok(file) => file.installed,
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "corrupt dependency cache, treating as empty");
            HashMap::new()
        }
    }
}

fn run_probe(cmd: &[String]) -> bool {
    if cmd.is_empty() {
        return false;
    }
    Command::new(&cmd[0])
        .args(&cmd[1..])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn run_command(dep: &str, cmd: &[String]) -> Result<()> {
    if cmd.is_empty() {
        return Err(Error::subprocess_failure(dep, -1, "no command for unknown platform"));
    }
    let output = Command::new(&cmd[0])
        .args(&cmd[1..])
        .output()
        .map_err(|e| Error::subprocess_failure(dep, -1, e.to_string()))?;
    if output.status.success() {
        Ok(())
    } else {
        Err(Error::subprocess_failure(
            dep,
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stderr).into_owned(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_os_release_debian_family() {
        let text = "ID=ubuntu\nID_LIKE=debian\n";
        assert_eq!(PlatformKind::parse_os_release(text), Some(PlatformKind::Debian));
    }

    #[test]
    fn parses_os_release_arch() {
        let text = "ID=arch\n";
        assert_eq!(PlatformKind::parse_os_release(text), Some(PlatformKind::Arch));
    }

    #[test]
    fn parses_os_release_unknown_falls_back() {
        let text = "ID=alpine\n";
        assert_eq!(PlatformKind::parse_os_release(text), Some(PlatformKind::Unknown));
    }

    #[test]
    fn corrupt_cache_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dependency_cache.json");
        std::fs::write(&path, "{ not json").unwrap();
        let cache = load_cache(&path);
        assert!(cache.is_empty());
    }

    #[test]
    fn missing_cache_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dependency_cache.json");
        assert!(load_cache(&path).is_empty());
    }

    #[test]
    fn check_installed_caches_probe_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dependency_cache.json");
        let mgr = SystemDependencyManager::with_platform(PlatformKind::Unknown, &path);
        // Unknown platform's probe command is empty, so the probe always
        // reports not-installed and the miss gets cached.
        assert!(!mgr.check_installed("libfoo").unwrap());
        assert!(!mgr.check_installed("libfoo").unwrap());
    }

    #[test]
    fn generate_report_lists_cached_entries_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dependency_cache.json");
        let mgr = SystemDependencyManager::with_platform(PlatformKind::Unknown, &path);
        mgr.check_installed("zeta").unwrap();
        mgr.check_installed("alpha").unwrap();
        let report = mgr.generate_report();
        let alpha_idx = report.find("alpha").unwrap();
        let zeta_idx = report.find("zeta").unwrap();
        assert!(alpha_idx < zeta_idx);
    }

    #[test]
    fn save_and_reload_round_trips_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dependency_cache.json");
        {
            let mgr = SystemDependencyManager::with_platform(PlatformKind::Unknown, &path);
            mgr.check_installed("libusb").unwrap();
            mgr.save_cache().unwrap();
        }
        let reloaded = load_cache(&path);
        assert_eq!(reloaded.get("libusb"), Some(&false));
    }

    #[test]
    fn cancel_unknown_pending_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dependency_cache.json");
        let mgr = SystemDependencyManager::with_platform(PlatformKind::Unknown, &path);
        assert!(!mgr.cancel("never-started"));
    }

    #[test]
    fn custom_install_command_overrides_platform_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dependency_cache.json");
        let mgr = SystemDependencyManager::with_platform(PlatformKind::Debian, &path);
        mgr.set_custom_install_command("libfoo", vec!["true".into()]);
        assert_eq!(mgr.install_command("libfoo"), vec!["true".to_string()]);
    }

    #[tokio::test]
    async fn install_async_reports_failure_for_unknown_platform() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dependency_cache.json");
        let mgr = SystemDependencyManager::with_platform(PlatformKind::Unknown, &path);
        let handle = mgr.install_async("libfoo");
        let result = handle.await.unwrap();
        assert!(result.is_err());
    }
}
