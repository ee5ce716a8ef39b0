//! `sandbox` command: run a program under a resource-limited sandbox.

use anyhow::Result;
use clap::Args;
use lithium_sandbox::{Sandbox, SandboxSpec};
use std::path::PathBuf;
use tracing::info;

use crate::output;

/// Arguments for the sandbox command.
#[derive(Args, Debug, Clone)]
pub struct SandboxArgs {
    /// Program to run
    pub program: PathBuf,

    /// Arguments passed to the program
    pub args: Vec<String>,

    /// CPU time limit in milliseconds
    #[arg(long, default_value = "5000")]
    pub time_limit_ms: u64,

    /// Resident memory limit in bytes
    #[arg(long, default_value = "536870912")]
    pub memory_limit_bytes: u64,

    /// Working directory for the sandboxed process
    #[arg(long)]
    pub root_dir: Option<PathBuf>,
}

pub async fn run(args: SandboxArgs, json: bool) -> Result<()> {
    info!(program = %args.program.display(), "running sandbox command");

    let spec = SandboxSpec {
        time_limit_ms: args.time_limit_ms,
        memory_limit_bytes: args.memory_limit_bytes,
        root_dir: args.root_dir,
        user_id: None,
        program_path: args.program.clone(),
        args: args.args.clone(),
    };

    let sandbox = Sandbox::new(spec);
    let succeeded = sandbox.run()?;
    let report = sandbox.report();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "success": succeeded,
                "time_used_ms": report.as_ref().map(|r| r.time_used_ms),
                "memory_used_bytes": report.as_ref().map(|r| r.memory_used_bytes),
                "exit_status": report.as_ref().map(|r| format!("{:?}", r.exit_status)),
                "stdout": report.as_ref().map(|r| String::from_utf8_lossy(&r.stdout).into_owned()),
                "stderr": report.as_ref().map(|r| String::from_utf8_lossy(&r.stderr).into_owned()),
            }))?
        );
    } else {
        output::header(&format!("sandboxing {}", args.program.display()));
        if let Some(report) = &report {
            println!(
                "  time: {}  memory: {}  status: {:?}",
                output::format_duration(std::time::Duration::from_millis(report.time_used_ms)),
                output::format_bytes(report.memory_used_bytes),
                report.exit_status
            );
            if !report.stdout.is_empty() {
                println!("  stdout:\n{}", String::from_utf8_lossy(&report.stdout));
            }
            if !report.stderr.is_empty() {
                println!("  stderr:\n{}", String::from_utf8_lossy(&report.stderr));
            }
        }
        if succeeded {
            output::success("sandboxed run completed");
        } else {
            output::error("sandboxed run failed or exceeded its resource limits");
        }
    }

    if !succeeded {
        anyhow::bail!("sandboxed run of {} did not succeed", args.program.display());
    }
    Ok(())
}
