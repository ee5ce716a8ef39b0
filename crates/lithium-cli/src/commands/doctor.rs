//! `doctor` command: check configuration, toolchains, and system dependencies.

use anyhow::Result;
use clap::Args;
use lithium_config::{CliOverrides, ConfigLoader, Severity};
use lithium_graph::DependencyGraph;
use lithium_sysdeps::SystemDependencyManager;
use lithium_toolchain::ToolchainRegistry;
use std::path::PathBuf;
use tracing::info;

use crate::discovery::addon_dirs;
use crate::output;

/// Arguments for the doctor command.
#[derive(Args, Debug, Clone)]
pub struct DoctorArgs {
    /// Project directory to resolve configuration for (defaults to the
    /// current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

pub async fn run(args: DoctorArgs, json: bool) -> Result<()> {
    info!(path = %args.path.display(), "running doctor command");

    let loader = ConfigLoader::new(args.path.clone());
    let config = loader.load(&CliOverrides::default())?;
    let validation = lithium_config::validate(&config);

    let mut registry = ToolchainRegistry::new();
    registry.scan(&config.toolchain_path);
    let toolchain_count = registry.len();

    let dirs = addon_dirs(&args.path).unwrap_or_default();
    let system_deps = DependencyGraph::resolve_system_dependencies(&dirs).unwrap_or_default();
    let sysdeps = SystemDependencyManager::new(config.cache_dir.clone());
    let mut dep_status = Vec::new();
    for name in system_deps.keys() {
        let installed = sysdeps.check_installed(name).unwrap_or(false);
        dep_status.push((name.clone(), installed));
    }
    dep_status.sort();

    let has_errors = validation.has_errors();
    let missing = dep_status.iter().filter(|(_, installed)| !installed).count();

    if json {
        let issues: Vec<_> = validation
            .issues
            .iter()
            .map(|issue| {
                serde_json::json!({
                    "severity": format!("{:?}", issue.severity),
                    "code": issue.code,
                    "field": issue.field,
                    "message": issue.message,
                    "hint": issue.hint,
                })
            })
            .collect();
        let deps: Vec<_> = dep_status
            .iter()
            .map(|(name, installed)| serde_json::json!({"name": name, "installed": installed}))
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "success": !has_errors && missing == 0,
                "toolchains_found": toolchain_count,
                "system_dependencies": deps,
                "issues": issues,
            }))?
        );
    } else {
        output::header("checking configuration, toolchains, and system dependencies");
        println!();
        println!("addon path: {}", config.addon_path.display());
        println!("cache dir: {}", config.cache_dir.display());
        println!("build jobs: {}", config.build_jobs);
        println!("toolchains found: {toolchain_count}");

        if !dep_status.is_empty() {
            println!();
            println!("system dependencies:");
            for (name, installed) in &dep_status {
                if *installed {
                    output::success(name);
                } else {
                    output::error(&format!("{name} (not installed)"));
                }
            }
        }

        println!();
        if validation.issues.is_empty() {
            output::success("configuration is valid");
        } else {
            for issue in &validation.issues {
                let line = match &issue.hint {
                    Some(hint) => format!("{} ({}): {} - {hint}", issue.field, issue.code, issue.message),
                    None => format!("{} ({}): {}", issue.field, issue.code, issue.message),
                };
                match issue.severity {
                    Severity::Error => output::error(&line),
                    Severity::Warning | Severity::Info => output::warning(&line),
                }
            }
        }
    }

    if has_errors || missing > 0 {
        anyhow::bail!(
            "configuration has {} error(s), {missing} system dependency/dependencies missing",
            validation.issues.iter().filter(|i| i.severity == Severity::Error).count()
        );
    }
    Ok(())
}
