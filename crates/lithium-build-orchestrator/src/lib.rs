//! Project discovery and build task orchestration (C6).
//!
//! Holds a mutex-protected list of discovered [`ProjectRecord`]s and an
//! ordered chain of [`BuildTask`]s, mirroring the original's plain
//! "scan, then run tasks in order" orchestration model.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lithium_build_adapters::{adapter_for, BuildResult, BuildSystemKind, BuildType};
use parking_lot::Mutex;
use rayon::prelude::*;

/// A discovered or declared build project.
#[derive(Debug, Clone)]
pub struct ProjectRecord {
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub build_system: BuildSystemKind,
}

/// A zero-argument unit of work in an [`Orchestrator`] task chain.
pub type BuildTask = Box<dyn Fn() -> BuildResult + Send + Sync>;

fn detect_build_system(dir: &Path) -> BuildSystemKind {
    if dir.join("CMakeLists.txt").is_file() {
        BuildSystemKind::CMake
    } else if dir.join("meson.build").is_file() {
        BuildSystemKind::Meson
    } else if dir.join("xmake.lua").is_file() {
        BuildSystemKind::XMake
    } else {
        BuildSystemKind::Unknown
    }
}

/// Orchestrates discovery and sequential execution of builds across many
/// projects.
#[derive(Default)]
pub struct Orchestrator {
    projects: Mutex<Vec<ProjectRecord>>,
    tasks: Mutex<Vec<BuildTask>>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("projects", &self.projects.lock().len())
            .field("tasks", &self.tasks.lock().len())
            .finish()
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concurrently walks `root_dir`, appending a [`ProjectRecord`] for
    /// every subdirectory that carries a known build-system marker file.
    /// Per-directory failures are logged and skipped; the overall scan
    /// always succeeds.
    pub fn scan(&self, root_dir: &Path) {
        let dirs: Vec<PathBuf> = walkdir::WalkDir::new(root_dir)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(e) if e.file_type().is_dir() => Some(e.into_path()),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(error = %e, "scan: failed to read directory entry");
                    None
                }
            })
            .collect();

        let found: Vec<ProjectRecord> = dirs
            .par_iter()
            .filter_map(|dir| {
                let kind = detect_build_system(dir);
                if kind == BuildSystemKind::Unknown {
                    None
                } else {
                    Some(ProjectRecord {
                        source_dir: dir.clone(),
                        build_dir: dir.join("build"),
                        build_system: kind,
                    })
                }
            })
            .collect();

        self.projects.lock().extend(found);
    }

    pub fn add_project(&self, project: ProjectRecord) {
        self.projects.lock().push(project);
    }

    pub fn projects(&self) -> Vec<ProjectRecord> {
        self.projects.lock().clone()
    }

    pub fn configure(
        &self,
        project: &ProjectRecord,
        build_type: BuildType,
        options: &[String],
        env_vars: &std::collections::HashMap<String, String>,
    ) -> BuildResult {
        match adapter_for(project.build_system) {
            Some(adapter) => adapter.configure(&project.source_dir, &project.build_dir, build_type, options, env_vars),
            None => BuildResult::unsupported("configure"),
        }
    }

    pub fn build(&self, project: &ProjectRecord, jobs: Option<u32>) -> BuildResult {
        match adapter_for(project.build_system) {
            Some(adapter) => adapter.build(&project.build_dir, jobs),
            None => BuildResult::unsupported("build"),
        }
    }

    pub fn clean(&self, project: &ProjectRecord) -> BuildResult {
        match adapter_for(project.build_system) {
            Some(adapter) => adapter.clean(&project.build_dir),
            None => BuildResult::unsupported("clean"),
        }
    }

    pub fn install(&self, project: &ProjectRecord, install_dir: &Path) -> BuildResult {
        match adapter_for(project.build_system) {
            Some(adapter) => adapter.install(&project.build_dir, install_dir),
            None => BuildResult::unsupported("install"),
        }
    }

    pub fn run_tests(&self, project: &ProjectRecord, filters: &[String]) -> BuildResult {
        match adapter_for(project.build_system) {
            Some(adapter) => adapter.run_tests(&project.build_dir, filters),
            None => BuildResult::unsupported("run_tests"),
        }
    }

    pub fn generate_docs(&self, project: &ProjectRecord, output_dir: &Path) -> BuildResult {
        match adapter_for(project.build_system) {
            Some(adapter) => adapter.generate_docs(&project.build_dir, output_dir),
            None => BuildResult::unsupported("generate_docs"),
        }
    }

    pub fn add_task(&self, task: BuildTask) {
        self.tasks.lock().push(task);
    }

    pub fn clear_tasks(&self) {
        self.tasks.lock().clear();
    }

    /// Runs every queued task sequentially; on the first failing task,
    /// returns that task's result without running the rest. Returns a
    /// synthetic success if the chain is empty.
    pub fn execute_task_chain(&self) -> BuildResult {
        let tasks = self.tasks.lock();
        for task in tasks.iter() {
            let result = task();
            if !result.success {
                return result;
            }
        }
        BuildResult { success: true, message: String::new(), exit_code: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn write_marker(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), "").unwrap();
    }

    #[test]
    fn scan_detects_cmake_project() {
        let root = tempfile::tempdir().unwrap();
        let proj = root.path().join("foo");
        std::fs::create_dir_all(&proj).unwrap();
        write_marker(&proj, "CMakeLists.txt");

        let orch = Orchestrator::new();
        orch.scan(root.path());
        let projects = orch.projects();
        assert!(projects.iter().any(|p| p.build_system == BuildSystemKind::CMake));
    }

    #[test]
    fn scan_skips_directories_without_markers() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("empty")).unwrap();
        let orch = Orchestrator::new();
        orch.scan(root.path());
        assert!(orch.projects().is_empty());
    }

    #[test]
    fn unknown_build_system_returns_failed_result_with_minus_one() {
        let orch = Orchestrator::new();
        let project = ProjectRecord {
            source_dir: PathBuf::from("/nonexistent"),
            build_dir: PathBuf::from("/nonexistent/build"),
            build_system: BuildSystemKind::Unknown,
        };
        let result = orch.build(&project, None);
        assert!(!result.success);
        assert_eq!(result.exit_code, -1);
    }

    #[test]
    fn execute_task_chain_stops_at_first_failure() {
        let orch = Orchestrator::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let c1 = Arc::clone(&calls);
        orch.add_task(Box::new(move || {
            c1.fetch_add(1, Ordering::SeqCst);
            BuildResult { success: true, message: String::new(), exit_code: 0 }
        }));

        let c2 = Arc::clone(&calls);
        orch.add_task(Box::new(move || {
            c2.fetch_add(1, Ordering::SeqCst);
            BuildResult { success: false, message: "boom".into(), exit_code: 7 }
        }));

        let c3 = Arc::clone(&calls);
        orch.add_task(Box::new(move || {
            c3.fetch_add(1, Ordering::SeqCst);
            BuildResult { success: true, message: String::new(), exit_code: 0 }
        }));

        let result = orch.execute_task_chain();
        assert!(!result.success);
        assert_eq!(result.exit_code, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn execute_task_chain_empty_is_success() {
        let orch = Orchestrator::new();
        let result = orch.execute_task_chain();
        assert!(result.success);
    }

    #[test]
    fn clear_tasks_empties_chain() {
        let orch = Orchestrator::new();
        orch.add_task(Box::new(|| BuildResult { success: true, message: String::new(), exit_code: 0 }));
        orch.clear_tasks();
        assert!(orch.execute_task_chain().success);
    }
}
