//! `build` command: configure and build discovered projects.

use anyhow::Result;
use clap::{Args, ValueEnum};
use lithium_build_adapters::BuildType;
use lithium_build_orchestrator::Orchestrator;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

use crate::output;

/// Build configuration profile, mirroring [`BuildType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BuildProfile {
    Debug,
    #[default]
    Release,
    RelWithDebInfo,
    MinSizeRel,
}

impl From<BuildProfile> for BuildType {
    fn from(profile: BuildProfile) -> Self {
        match profile {
            BuildProfile::Debug => Self::Debug,
            BuildProfile::Release => Self::Release,
            BuildProfile::RelWithDebInfo => Self::RelWithDebInfo,
            BuildProfile::MinSizeRel => Self::MinSizeRel,
        }
    }
}

/// Arguments for the build command.
#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Directory to scan for build-system projects (defaults to the current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Build configuration profile
    #[arg(long, value_enum, default_value = "release")]
    pub profile: BuildProfile,

    /// Number of parallel build jobs (defaults to the number of CPUs)
    #[arg(short = 'j', long)]
    pub jobs: Option<u32>,

    /// Extra options passed through to the underlying build system
    #[arg(long = "option", value_name = "OPT")]
    pub options: Vec<String>,

    /// Only configure and build; skip running tests even if present
    #[arg(long)]
    pub no_test: bool,
}

pub async fn run(args: BuildArgs, json: bool) -> Result<()> {
    info!(path = %args.path.display(), "running build command");

    let orchestrator = Orchestrator::new();
    orchestrator.scan(&args.path);
    let projects = orchestrator.projects();

    if projects.is_empty() {
        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "success": true,
                    "projects": [],
                }))?
            );
        } else {
            output::warning("no build-system projects found");
        }
        return Ok(());
    }

    let build_type: BuildType = args.profile.into();
    let env_vars: HashMap<String, String> = HashMap::new();
    let mut results = Vec::new();

    for project in &projects {
        if !json {
            output::header(&format!("building {}", project.source_dir.display()));
        }

        let configure = orchestrator.configure(project, build_type, &args.options, &env_vars);
        if !configure.success {
            results.push((project.source_dir.clone(), configure));
            continue;
        }

        let build = orchestrator.build(project, args.jobs);
        let test = if args.no_test {
            None
        } else {
            Some(orchestrator.run_tests(project, &[]))
        };

        if !json {
            report_step("configure", &configure);
            report_step("build", &build);
            if let Some(test) = &test {
                report_step("test", test);
            }
        }
        results.push((project.source_dir.clone(), build));
    }

    let failed = results.iter().filter(|(_, r)| !r.success).count();

    if json {
        let payload: Vec<_> = results
            .iter()
            .map(|(dir, result)| {
                serde_json::json!({
                    "source_dir": dir.display().to_string(),
                    "success": result.success,
                    "message": result.message,
                    "exit_code": result.exit_code,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "success": failed == 0,
                "projects": payload,
            }))?
        );
    } else if failed == 0 {
        output::success(&format!("built {} project(s)", results.len()));
    } else {
        output::error(&format!("{failed} of {} project(s) failed", results.len()));
    }

    if failed > 0 {
        anyhow::bail!("{failed} build(s) failed");
    }
    Ok(())
}

fn report_step(step: &str, result: &lithium_build_adapters::BuildResult) {
    if result.success {
        output::success(&format!("{step}: {}", result.message));
    } else {
        output::error(&format!("{step}: {}", result.message));
    }
}
