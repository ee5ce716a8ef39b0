//! Resource-limited subprocess sandboxing (C10).
//!
//! A single [`Sandbox`] runs one program under a hard CPU-time and
//! resident-memory budget, enforced via `setrlimit` in the child before
//! `exec`. [`MultiSandbox`] manages a keyed set of sandboxes run
//! concurrently, isolating per-sandbox failures.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(unsafe_code)]

use std::collections::HashMap;
use std::io::Read as _;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use lithium_core::Result;
use nix::sys::resource::{setrlimit, Resource};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use rayon::prelude::*;

/// Input configuration for one sandboxed run.
#[derive(Debug, Clone)]
pub struct SandboxSpec {
    pub time_limit_ms: u64,
    pub memory_limit_bytes: u64,
    pub root_dir: Option<PathBuf>,
    pub user_id: Option<u32>,
    pub program_path: PathBuf,
    pub args: Vec<String>,
}

/// How the sandboxed child terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Normal(i32),
    TimeExceeded,
    MemoryExceeded,
    Signaled(i32),
}

/// Result of a finished run.
#[derive(Debug, Clone)]
pub struct SandboxReport {
    pub time_used_ms: u64,
    pub memory_used_bytes: u64,
    pub exit_status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Configured,
    Running,
    Finished,
}

/// A single sandboxed program with one resource budget.
pub struct Sandbox {
    spec: SandboxSpec,
    state: Mutex<State>,
    report: Mutex<Option<SandboxReport>>,
}

impl std::fmt::Debug for Sandbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sandbox")
            .field("program_path", &self.spec.program_path)
            .field("state", &*self.state.lock())
            .finish()
    }
}

impl Sandbox {
    pub fn new(spec: SandboxSpec) -> Self {
        Self { spec, state: Mutex::new(State::Configured), report: Mutex::new(None) }
    }

    /// Runs the child under the configured caps. Idempotent after
    /// `Finished`: subsequent calls return the cached result without
    /// spawning a new child. Returns `true` iff the child exited normally
    /// within both caps.
    pub fn run(&self) -> Result<bool> {
        {
            let mut state = self.state.lock();
            if *state == State::Finished {
                let report = self.report.lock();
                return Ok(matches!(report.as_ref().unwrap().exit_status, ExitStatus::Normal(0)));
            }
            *state = State::Running;
        }

        let report = self.spawn_and_wait();
        let success = matches!(report.exit_status, ExitStatus::Normal(0));
        *self.report.lock() = Some(report);
        *self.state.lock() = State::Finished;
        Ok(success)
    }

    fn spawn_and_wait(&self) -> SandboxReport {
        let mut cmd = Command::new(&self.spec.program_path);
        cmd.args(&self.spec.args);
        cmd.env_clear();
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        if let Some(root) = &self.spec.root_dir {
            cmd.current_dir(root);
        }
        let time_limit_secs = self.spec.time_limit_ms.div_ceil(1000);
        let memory_limit = self.spec.memory_limit_bytes;
        let uid = self.spec.user_id;

        unsafe {
            cmd.pre_exec(move || {
                setrlimit(Resource::RLIMIT_CPU, time_limit_secs, time_limit_secs)
                    .map_err(|e| std::io::Error::from_raw_os_error(e as i32))?;
                setrlimit(Resource::RLIMIT_AS, memory_limit, memory_limit)
                    .map_err(|e| std::io::Error::from_raw_os_error(e as i32))?;
                if let Some(uid) = uid {
                    nix::unistd::setuid(nix::unistd::Uid::from_raw(uid))
                        .map_err(|e| std::io::Error::from_raw_os_error(e as i32))?;
                }
                Ok(())
            });
        }

        let start = Instant::now();
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(error = %e, program = %self.spec.program_path.display(), "failed to spawn sandboxed child");
                return SandboxReport {
                    time_used_ms: 0,
                    memory_used_bytes: 0,
                    exit_status: ExitStatus::Signaled(0),
                    stdout: Vec::new(),
                    stderr: Vec::new(),
                };
            }
        };

        let stdout_reader = child.stdout.take().map(|s| std::thread::spawn(move || read_to_end(s)));
        let stderr_reader = child.stderr.take().map(|s| std::thread::spawn(move || read_to_end(s)));

        let mut report = self.wait_with_deadline(child, start);
        report.stdout = stdout_reader.and_then(|h| h.join().ok()).unwrap_or_default();
        report.stderr = stderr_reader.and_then(|h| h.join().ok()).unwrap_or_default();
        report
    }

    fn wait_with_deadline(&self, mut child: Child, start: Instant) -> SandboxReport {
        let deadline = Duration::from_millis(self.spec.time_limit_ms);
        let pid = Pid::from_raw(child.id() as i32);
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let elapsed = start.elapsed();
                    let exit_status = match status.code() {
                        Some(code) => ExitStatus::Normal(code),
                        None => ExitStatus::Signaled(signal_number(&status)),
                    };
                    return SandboxReport {
                        time_used_ms: elapsed.as_millis() as u64,
                        memory_used_bytes: peak_rss_bytes(),
                        exit_status,
                        stdout: Vec::new(),
                        stderr: Vec::new(),
                    };
                }
                Ok(None) => {
                    if start.elapsed() >= deadline {
                        let _ = kill(pid, Signal::SIGKILL);
                        let _ = child.wait();
                        return SandboxReport {
                            time_used_ms: deadline.as_millis() as u64,
                            memory_used_bytes: peak_rss_bytes(),
                            exit_status: ExitStatus::TimeExceeded,
                            stdout: Vec::new(),
                            stderr: Vec::new(),
                        };
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "error waiting on sandboxed child");
                    return SandboxReport {
                        time_used_ms: 0,
                        memory_used_bytes: 0,
                        exit_status: ExitStatus::Signaled(0),
                        stdout: Vec::new(),
                        stderr: Vec::new(),
                    };
                }
            }
        }
    }

    /// Meaningful only once `Finished`.
    pub fn time_used(&self) -> Option<u64> {
        self.report.lock().as_ref().map(|r| r.time_used_ms)
    }

    /// Meaningful only once `Finished`.
    pub fn memory_used(&self) -> Option<u64> {
        self.report.lock().as_ref().map(|r| r.memory_used_bytes)
    }

    pub fn report(&self) -> Option<SandboxReport> {
        self.report.lock().clone()
    }
}

fn read_to_end<R: std::io::Read>(mut reader: R) -> Vec<u8> {
    let mut buf = Vec::new();
    let _ = reader.read_to_end(&mut buf);
    buf
}

#[cfg(unix)]
fn signal_number(status: &std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().unwrap_or(0)
}

fn peak_rss_bytes() -> u64 {
    nix::sys::resource::getrusage(nix::sys::resource::UsageWho::RUSAGE_CHILDREN)
        .map(|ru| ru.max_rss() as u64 * 1024)
        .unwrap_or(0)
}

/// Keyed set of sandboxes run concurrently.
#[derive(Default)]
pub struct MultiSandbox {
    sandboxes: HashMap<String, Sandbox>,
}

impl std::fmt::Debug for MultiSandbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiSandbox").field("count", &self.sandboxes.len()).finish()
    }
}

impl MultiSandbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, spec: SandboxSpec) {
        self.sandboxes.insert(name.to_string(), Sandbox::new(spec));
    }

    pub fn get(&self, name: &str) -> Option<&Sandbox> {
        self.sandboxes.get(name)
    }

    /// Launches every registered sandbox concurrently and waits for all;
    /// per-sandbox errors are isolated and reported alongside successes.
    pub fn run_all(&self) -> HashMap<String, Result<bool>> {
        self.sandboxes
            .par_iter()
            .map(|(name, sandbox)| (name.clone(), sandbox.run()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(program: &str, args: &[&str]) -> SandboxSpec {
        SandboxSpec {
            time_limit_ms: 5_000,
            memory_limit_bytes: 512 * 1024 * 1024,
            root_dir: None,
            user_id: None,
            program_path: PathBuf::from(program),
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn run_succeeds_for_true() {
        let sandbox = Sandbox::new(spec("/bin/true", &[]));
        assert!(sandbox.run().unwrap());
    }

    #[test]
    fn run_fails_for_false() {
        let sandbox = Sandbox::new(spec("/bin/false", &[]));
        assert!(!sandbox.run().unwrap());
    }

    #[test]
    fn run_is_idempotent_after_finished() {
        let sandbox = Sandbox::new(spec("/bin/true", &[]));
        let first = sandbox.run().unwrap();
        let second = sandbox.run().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn time_and_memory_used_are_none_before_run() {
        let sandbox = Sandbox::new(spec("/bin/true", &[]));
        assert!(sandbox.time_used().is_none());
        assert!(sandbox.memory_used().is_none());
    }

    #[test]
    fn time_used_populated_after_finish() {
        let sandbox = Sandbox::new(spec("/bin/true", &[]));
        sandbox.run().unwrap();
        assert!(sandbox.time_used().is_some());
    }

    #[test]
    fn spawn_failure_is_isolated_not_signaled() {
        let sandbox = Sandbox::new(spec("/definitely/not/a/real/binary", &[]));
        let result = sandbox.run().unwrap();
        assert!(!result);
    }

    #[test]
    fn stdout_and_stderr_are_captured() {
        let sandbox = Sandbox::new(spec("/bin/echo", &["hello"]));
        sandbox.run().unwrap();
        let report = sandbox.report().unwrap();
        assert_eq!(report.stdout, b"hello\n");
        assert!(report.stderr.is_empty());
    }

    #[test]
    fn child_environment_is_cleared() {
        std::env::set_var("LITHIUM_SANDBOX_LEAK_CHECK", "should-not-leak");
        let sandbox = Sandbox::new(spec("/usr/bin/env", &[]));
        sandbox.run().unwrap();
        let report = sandbox.report().unwrap();
        std::env::remove_var("LITHIUM_SANDBOX_LEAK_CHECK");
        assert!(!String::from_utf8_lossy(&report.stdout).contains("LITHIUM_SANDBOX_LEAK_CHECK"));
    }

    #[test]
    fn run_all_isolates_per_sandbox_errors() {
        let mut multi = MultiSandbox::new();
        multi.register("ok", spec("/bin/true", &[]));
        multi.register("bad", spec("/bin/false", &[]));
        let results = multi.run_all();
        assert_eq!(results.len(), 2);
        assert!(*results.get("ok").unwrap().as_ref().unwrap());
        assert!(!*results.get("bad").unwrap().as_ref().unwrap());
    }
}
