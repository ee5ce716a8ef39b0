//! `scan` command: discover addon manifests and build-system projects.

use anyhow::Result;
use clap::Args;
use lithium_build_orchestrator::Orchestrator;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use crate::discovery::addon_dirs;
use crate::output;

/// Arguments for the scan command.
#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Directory to scan (defaults to the current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, Serialize)]
struct ScanReport {
    addons: Vec<String>,
    projects: Vec<ProjectSummary>,
}

#[derive(Debug, Serialize)]
struct ProjectSummary {
    source_dir: String,
    build_system: String,
}

pub async fn run(args: ScanArgs, json: bool) -> Result<()> {
    info!(path = %args.path.display(), "running scan command");

    let addons = addon_dirs(&args.path)?
        .into_iter()
        .filter_map(|dir| {
            dir.file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .collect::<Vec<_>>();

    let orchestrator = Orchestrator::new();
    orchestrator.scan(&args.path);
    let projects = orchestrator
        .projects()
        .into_iter()
        .map(|p| ProjectSummary {
            source_dir: p.source_dir.display().to_string(),
            build_system: format!("{:?}", p.build_system),
        })
        .collect::<Vec<_>>();

    if json {
        let report = ScanReport { addons, projects };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    output::header(&format!("scanning {}", args.path.display()));
    if addons.is_empty() {
        output::info("no addon manifests found");
    } else {
        println!();
        println!("addons:");
        for addon in &addons {
            output::named(addon, None);
        }
    }

    if !projects.is_empty() {
        println!();
        println!("build projects:");
        for project in &projects {
            println!("  {} ({})", project.source_dir, project.build_system);
        }
    }

    output::success(&format!(
        "found {} addon(s), {} build project(s)",
        addons.len(),
        projects.len()
    ));
    Ok(())
}
