//! Build-system adapters (C5): one trait, three implementations.
//!
//! Mirrors the original `BuildSystem` abstract class: every operation takes
//! a build directory (plus operation-specific arguments) and returns a
//! [`BuildResult`] rather than propagating process failures as errors —
//! adapters must never let a subprocess failure escape the contract.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Serialize};

/// The build configuration profile, matching the four CMake-style presets
/// named in the manifest schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildType {
    Debug,
    Release,
    RelWithDebInfo,
    MinSizeRel,
}

impl BuildType {
    fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
            Self::RelWithDebInfo => "RelWithDebInfo",
            Self::MinSizeRel => "MinSizeRel",
        }
    }
}

/// Identifies which concrete adapter a [`crate::ProjectRecord`]-like caller
/// should dispatch to. Named `CMake`/`Meson`/`XMake`/`Unknown` to match the
/// original's `platform/{cmake,meson,xmake}.hpp` split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildSystemKind {
    CMake,
    Meson,
    XMake,
    Unknown,
}

/// Outcome of any adapter operation. Exactly `{success, message, exit_code}`
/// as in the original's `BuildResult`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildResult {
    pub success: bool,
    pub message: String,
    pub exit_code: i32,
}

impl BuildResult {
    fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into(), exit_code: 0 }
    }

    fn failed(message: impl Into<String>, exit_code: i32) -> Self {
        Self { success: false, message: message.into(), exit_code }
    }

    /// A failure result for an unsupported or unknown adapter, always
    /// carrying exit code `-1` per the contract.
    pub fn unsupported(op: &str) -> Self {
        Self::failed(format!("{op}: unsupported build system"), -1)
    }
}

/// A small on-disk config file read by `load_config`: `buildType`,
/// `options`, `envVars`. Absence of any key is a hard failure.
#[derive(Debug, Clone, Deserialize)]
struct AdapterConfigFile {
    #[serde(rename = "buildType")]
    build_type: String,
    options: Vec<String>,
    #[serde(rename = "envVars")]
    env_vars: HashMap<String, String>,
}

/// Loaded, typed adapter configuration.
#[derive(Debug, Clone, Default)]
pub struct AdapterConfig {
    pub build_type: Option<BuildType>,
    pub options: Vec<String>,
    pub env_vars: HashMap<String, String>,
}

fn parse_build_type(s: &str) -> Option<BuildType> {
    match s {
        "Debug" => Some(BuildType::Debug),
        "Release" => Some(BuildType::Release),
        "RelWithDebInfo" => Some(BuildType::RelWithDebInfo),
        "MinSizeRel" => Some(BuildType::MinSizeRel),
        _ => None,
    }
}

/// Runs `program` with `args` in `cwd`, capturing stdout/stderr into a
/// single [`BuildResult`]. Never panics; a spawn failure becomes a failed
/// result with exit code `-1`.
fn run(program: &str, args: &[String], cwd: &Path, env: &HashMap<String, String>) -> BuildResult {
    let mut cmd = Command::new(program);
    cmd.args(args).current_dir(cwd);
    for (k, v) in env {
        cmd.env(k, v);
    }
    match cmd.output() {
        Ok(output) => {
            let mut message = String::from_utf8_lossy(&output.stdout).into_owned();
            if !output.stderr.is_empty() {
                message.push('\n');
                message.push_str(&String::from_utf8_lossy(&output.stderr));
            }
            BuildResult {
                success: output.status.success(),
                message,
                exit_code: output.status.code().unwrap_or(-1),
            }
        }
        Err(e) => BuildResult::failed(format!("failed to spawn {program}: {e}"), -1),
    }
}

/// Contract shared by every build-system adapter.
pub trait BuildAdapter {
    fn configure(
        &self,
        source_dir: &Path,
        build_dir: &Path,
        build_type: BuildType,
        options: &[String],
        env_vars: &HashMap<String, String>,
    ) -> BuildResult;

    fn build(&self, build_dir: &Path, jobs: Option<u32>) -> BuildResult;

    fn clean(&self, build_dir: &Path) -> BuildResult;

    fn install(&self, build_dir: &Path, install_dir: &Path) -> BuildResult;

    fn run_tests(&self, build_dir: &Path, test_filters: &[String]) -> BuildResult;

    fn generate_docs(&self, build_dir: &Path, output_dir: &Path) -> BuildResult;

    fn list_targets(&self, build_dir: &Path) -> Result<Vec<String>, BuildResult>;

    fn build_target(&self, build_dir: &Path, target: &str, jobs: Option<u32>) -> BuildResult;

    fn get_cache_variables(&self, build_dir: &Path) -> Vec<(String, String)>;

    fn set_cache_variable(&self, build_dir: &Path, name: &str, value: &str) -> bool;

    /// Reads `path` into an [`AdapterConfig`]. Any missing key is a hard
    /// failure, logged before returning `false`.
    fn load_config(&self, path: &Path) -> bool {
        let Ok(text) = std::fs::read_to_string(path) else {
            tracing::error!(path = %path.display(), "load_config: file not readable");
            return false;
        };
        match serde_json::from_str::<AdapterConfigFile>(&text) {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "load_config: missing required key");
                false
            }
        }
    }
}

fn parse_adapter_config(text: &str) -> Option<AdapterConfig> {
    let file: AdapterConfigFile = serde_json::from_str(text).ok()?;
    Some(AdapterConfig {
        build_type: parse_build_type(&file.build_type),
        options: file.options,
        env_vars: file.env_vars,
    })
}

/// CMake adapter. `clean` is recursive deletion of the build directory
/// rather than a subcommand, per the contract.
#[derive(Debug, Default, Clone, Copy)]
pub struct CMakeAdapter;

impl BuildAdapter for CMakeAdapter {
    fn configure(
        &self,
        source_dir: &Path,
        build_dir: &Path,
        build_type: BuildType,
        options: &[String],
        env_vars: &HashMap<String, String>,
    ) -> BuildResult {
        if let Err(e) = std::fs::create_dir_all(build_dir) {
            return BuildResult::failed(format!("cannot create build dir: {e}"), -1);
        }
        let mut args = vec![
            source_dir.display().to_string(),
            format!("-DCMAKE_BUILD_TYPE={}", build_type.as_str()),
        ];
        args.extend(options.iter().cloned());
        run("cmake", &args, build_dir, env_vars)
    }

    fn build(&self, build_dir: &Path, jobs: Option<u32>) -> BuildResult {
        let mut args = vec!["--build".to_string(), ".".to_string()];
        if let Some(j) = jobs {
            args.push("--parallel".to_string());
            args.push(j.to_string());
        }
        run("cmake", &args, build_dir, &HashMap::new())
    }

    fn clean(&self, build_dir: &Path) -> BuildResult {
        match std::fs::remove_dir_all(build_dir) {
            Ok(()) => BuildResult::ok("build directory removed"),
            Err(e) => BuildResult::failed(format!("clean failed: {e}"), -1),
        }
    }

    fn install(&self, build_dir: &Path, install_dir: &Path) -> BuildResult {
        let args = vec![
            "--install".to_string(),
            ".".to_string(),
            "--prefix".to_string(),
            install_dir.display().to_string(),
        ];
        run("cmake", &args, build_dir, &HashMap::new())
    }

    fn run_tests(&self, build_dir: &Path, test_filters: &[String]) -> BuildResult {
        let mut args = vec![];
        if let Some(first) = test_filters.first() {
            args.push("-R".to_string());
            args.push(first.clone());
        }
        run("ctest", &args, build_dir, &HashMap::new())
    }

    fn generate_docs(&self, build_dir: &Path, output_dir: &Path) -> BuildResult {
        let args = vec!["--target".to_string(), "docs".to_string()];
        let mut env = HashMap::new();
        env.insert("DOC_OUTPUT_DIR".to_string(), output_dir.display().to_string());
        run("cmake", &args, build_dir, &env)
    }

    fn list_targets(&self, build_dir: &Path) -> Result<Vec<String>, BuildResult> {
        let result = run("cmake", &["--build".into(), ".".into(), "--target".into(), "help".into()], build_dir, &HashMap::new());
        if !result.success {
            return Err(result);
        }
        Ok(result
            .message
            .lines()
            .filter_map(|l| l.trim().strip_prefix("... "))
            .map(|s| s.split_whitespace().next().unwrap_or_default().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }

    fn build_target(&self, build_dir: &Path, target: &str, jobs: Option<u32>) -> BuildResult {
        let mut args = vec!["--build".to_string(), ".".to_string(), "--target".to_string(), target.to_string()];
        if let Some(j) = jobs {
            args.push("--parallel".to_string());
            args.push(j.to_string());
        }
        run("cmake", &args, build_dir, &HashMap::new())
    }

    fn get_cache_variables(&self, build_dir: &Path) -> Vec<(String, String)> {
        let cache_path = build_dir.join("CMakeCache.txt");
        let Ok(text) = std::fs::read_to_string(cache_path) else {
            return Vec::new();
        };
        text.lines()
            .filter(|l| !l.starts_with('#') && !l.starts_with("//") && l.contains(':'))
            .filter_map(|l| {
                let (key_type, value) = l.split_once('=')?;
                let key = key_type.split(':').next()?;
                Some((key.to_string(), value.to_string()))
            })
            .collect()
    }

    fn set_cache_variable(&self, build_dir: &Path, name: &str, value: &str) -> bool {
        run("cmake", &[format!("-D{name}={value}"), ".".to_string()], build_dir, &HashMap::new()).success
    }
}

/// Meson adapter.
#[derive(Debug, Default, Clone, Copy)]
pub struct MesonAdapter;

impl BuildAdapter for MesonAdapter {
    fn configure(
        &self,
        source_dir: &Path,
        build_dir: &Path,
        build_type: BuildType,
        options: &[String],
        env_vars: &HashMap<String, String>,
    ) -> BuildResult {
        let mut args = vec![
            "setup".to_string(),
            build_dir.display().to_string(),
            source_dir.display().to_string(),
            format!("--buildtype={}", meson_build_type(build_type)),
        ];
        args.extend(options.iter().cloned());
        run("meson", &args, source_dir, env_vars)
    }

    fn build(&self, build_dir: &Path, jobs: Option<u32>) -> BuildResult {
        let mut args = vec!["compile".to_string(), "-C".to_string(), build_dir.display().to_string()];
        if let Some(j) = jobs {
            args.push("-j".to_string());
            args.push(j.to_string());
        }
        run("meson", &args, build_dir, &HashMap::new())
    }

    fn clean(&self, build_dir: &Path) -> BuildResult {
        run("ninja", &["-C".to_string(), build_dir.display().to_string(), "clean".to_string()], build_dir, &HashMap::new())
    }

    fn install(&self, build_dir: &Path, install_dir: &Path) -> BuildResult {
        let args = vec![
            "install".to_string(),
            "-C".to_string(),
            build_dir.display().to_string(),
            "--destdir".to_string(),
            install_dir.display().to_string(),
        ];
        run("meson", &args, build_dir, &HashMap::new())
    }

    fn run_tests(&self, build_dir: &Path, test_filters: &[String]) -> BuildResult {
        let mut args = vec!["test".to_string(), "-C".to_string(), build_dir.display().to_string()];
        args.extend(test_filters.iter().cloned());
        run("meson", &args, build_dir, &HashMap::new())
    }

    fn generate_docs(&self, build_dir: &Path, _output_dir: &Path) -> BuildResult {
        run("ninja", &["-C".to_string(), build_dir.display().to_string(), "docs".to_string()], build_dir, &HashMap::new())
    }

    fn list_targets(&self, build_dir: &Path) -> Result<Vec<String>, BuildResult> {
        let result = run("meson", &["introspect".to_string(), build_dir.display().to_string(), "--targets".to_string()], build_dir, &HashMap::new());
        if !result.success {
            return Err(result);
        }
        #[derive(Deserialize)]
        struct Target {
            name: String,
        }
        serde_json::from_str::<Vec<Target>>(&result.message)
            .map(|v| v.into_iter().map(|t| t.name).collect())
            .map_err(|e| BuildResult::failed(format!("failed to parse target listing: {e}"), -1))
    }

    fn build_target(&self, build_dir: &Path, target: &str, jobs: Option<u32>) -> BuildResult {
        let mut args = vec!["compile".to_string(), "-C".to_string(), build_dir.display().to_string(), target.to_string()];
        if let Some(j) = jobs {
            args.push("-j".to_string());
            args.push(j.to_string());
        }
        run("meson", &args, build_dir, &HashMap::new())
    }

    fn get_cache_variables(&self, build_dir: &Path) -> Vec<(String, String)> {
        let result = run("meson", &["configure".to_string(), build_dir.display().to_string()], build_dir, &HashMap::new());
        result
            .message
            .lines()
            .filter_map(|l| l.split_once(char::is_whitespace))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect()
    }

    fn set_cache_variable(&self, build_dir: &Path, name: &str, value: &str) -> bool {
        run(
            "meson",
            &["configure".to_string(), build_dir.display().to_string(), format!("-D{name}={value}")],
            build_dir,
            &HashMap::new(),
        )
        .success
    }
}

fn meson_build_type(bt: BuildType) -> &'static str {
    match bt {
        BuildType::Debug => "debug",
        BuildType::Release => "release",
        BuildType::RelWithDebInfo => "debugoptimized",
        BuildType::MinSizeRel => "minsize",
    }
}

/// xmake adapter.
#[derive(Debug, Default, Clone, Copy)]
pub struct XMakeAdapter;

impl BuildAdapter for XMakeAdapter {
    fn configure(
        &self,
        source_dir: &Path,
        build_dir: &Path,
        build_type: BuildType,
        options: &[String],
        env_vars: &HashMap<String, String>,
    ) -> BuildResult {
        let mut args = vec!["config".to_string(), format!("--mode={}", xmake_build_type(build_type)), format!("-o{}", build_dir.display())];
        args.extend(options.iter().cloned());
        run("xmake", &args, source_dir, env_vars)
    }

    fn build(&self, build_dir: &Path, jobs: Option<u32>) -> BuildResult {
        let mut args = vec!["build".to_string()];
        if let Some(j) = jobs {
            args.push("-j".to_string());
            args.push(j.to_string());
        }
        run("xmake", &args, build_dir, &HashMap::new())
    }

    fn clean(&self, build_dir: &Path) -> BuildResult {
        run("xmake", &["clean".to_string()], build_dir, &HashMap::new())
    }

    fn install(&self, build_dir: &Path, install_dir: &Path) -> BuildResult {
        run("xmake", &["install".to_string(), "-o".to_string(), install_dir.display().to_string()], build_dir, &HashMap::new())
    }

    fn run_tests(&self, build_dir: &Path, test_filters: &[String]) -> BuildResult {
        let mut args = vec!["test".to_string()];
        args.extend(test_filters.iter().cloned());
        run("xmake", &args, build_dir, &HashMap::new())
    }

    fn generate_docs(&self, build_dir: &Path, output_dir: &Path) -> BuildResult {
        run("xmake", &["doxygen".to_string(), output_dir.display().to_string()], build_dir, &HashMap::new())
    }

    fn list_targets(&self, build_dir: &Path) -> Result<Vec<String>, BuildResult> {
        let result = run("xmake", &["show".to_string(), "-l".to_string(), "targets".to_string()], build_dir, &HashMap::new());
        if !result.success {
            return Err(result);
        }
        Ok(result.message.lines().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect())
    }

    fn build_target(&self, build_dir: &Path, target: &str, jobs: Option<u32>) -> BuildResult {
        let mut args = vec!["build".to_string(), target.to_string()];
        if let Some(j) = jobs {
            args.push("-j".to_string());
            args.push(j.to_string());
        }
        run("xmake", &args, build_dir, &HashMap::new())
    }

    fn get_cache_variables(&self, build_dir: &Path) -> Vec<(String, String)> {
        let result = run("xmake", &["show".to_string(), "-l".to_string(), "configs".to_string()], build_dir, &HashMap::new());
        result
            .message
            .lines()
            .filter_map(|l| l.split_once('='))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect()
    }

    fn set_cache_variable(&self, build_dir: &Path, name: &str, value: &str) -> bool {
        run("xmake", &["config".to_string(), format!("--{name}={value}")], build_dir, &HashMap::new()).success
    }
}

fn xmake_build_type(bt: BuildType) -> &'static str {
    match bt {
        BuildType::Debug => "debug",
        BuildType::Release => "release",
        BuildType::RelWithDebInfo => "releasedbg",
        BuildType::MinSizeRel => "minsizerel",
    }
}

/// Returns the concrete adapter for `kind`, or `None` for `Unknown`.
pub fn adapter_for(kind: BuildSystemKind) -> Option<Box<dyn BuildAdapter>> {
    match kind {
        BuildSystemKind::CMake => Some(Box::new(CMakeAdapter)),
        BuildSystemKind::Meson => Some(Box::new(MesonAdapter)),
        BuildSystemKind::XMake => Some(Box::new(XMakeAdapter)),
        BuildSystemKind::Unknown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_result_carries_exit_code_minus_one() {
        let r = BuildResult::unsupported("configure");
        assert!(!r.success);
        assert_eq!(r.exit_code, -1);
    }

    #[test]
    fn adapter_for_unknown_is_none() {
        assert!(adapter_for(BuildSystemKind::Unknown).is_none());
    }

    #[test]
    fn adapter_for_known_kinds_returns_adapter() {
        assert!(adapter_for(BuildSystemKind::CMake).is_some());
        assert!(adapter_for(BuildSystemKind::Meson).is_some());
        assert!(adapter_for(BuildSystemKind::XMake).is_some());
    }

    #[test]
    fn cmake_clean_removes_build_dir() {
        let dir = tempfile::tempdir().unwrap();
        let build_dir = dir.path().join("build");
        std::fs::create_dir_all(&build_dir).unwrap();
        let adapter = CMakeAdapter;
        let result = adapter.clean(&build_dir);
        assert!(result.success);
        assert!(!build_dir.exists());
    }

    #[test]
    fn load_config_fails_on_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"buildType": "Debug"}"#).unwrap();
        let adapter = CMakeAdapter;
        assert!(!adapter.load_config(&path));
    }

    #[test]
    fn load_config_succeeds_with_all_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"buildType": "Release", "options": ["-DFOO=1"], "envVars": {"CC": "clang"}}"#,
        )
        .unwrap();
        let adapter = CMakeAdapter;
        assert!(adapter.load_config(&path));
    }

    #[test]
    fn parse_adapter_config_round_trips_values() {
        let text = r#"{"buildType": "Release", "options": ["-O2"], "envVars": {"CC": "clang"}}"#;
        let cfg = parse_adapter_config(text).unwrap();
        assert_eq!(cfg.build_type, Some(BuildType::Release));
        assert_eq!(cfg.options, vec!["-O2".to_string()]);
        assert_eq!(cfg.env_vars.get("CC"), Some(&"clang".to_string()));
    }

    #[test]
    fn meson_build_type_mapping_covers_all_variants() {
        assert_eq!(meson_build_type(BuildType::Debug), "debug");
        assert_eq!(meson_build_type(BuildType::RelWithDebInfo), "debugoptimized");
    }

    #[test]
    fn spawn_failure_never_panics() {
        let dir = tempfile::tempdir().unwrap();
        let result = run("definitely-not-a-real-binary-xyz", &[], dir.path(), &HashMap::new());
        assert!(!result.success);
        assert_eq!(result.exit_code, -1);
    }
}
