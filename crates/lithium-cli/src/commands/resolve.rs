//! `resolve` command: compute the addon dependency load order.

use anyhow::Result;
use clap::Args;
use lithium_graph::DependencyGraph;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use crate::discovery::addon_dirs;
use crate::output;

/// Arguments for the resolve command.
#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Directory containing addon subdirectories (defaults to the current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, Serialize)]
struct ResolveReport {
    order: Vec<String>,
    system_dependencies: std::collections::BTreeMap<String, String>,
}

pub async fn run(args: ResolveArgs, json: bool) -> Result<()> {
    info!(path = %args.path.display(), "running resolve command");

    let dirs = addon_dirs(&args.path)?;
    let order = DependencyGraph::resolve_directories(&dirs)?;
    let system_deps = DependencyGraph::resolve_system_dependencies(&dirs)?;

    if order.is_empty() && !dirs.is_empty() {
        let message = "no resolvable load order (cycle or version conflict detected)";
        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "success": false,
                    "error": message,
                }))?
            );
        } else {
            output::error(message);
        }
        anyhow::bail!(message);
    }

    let system_dependencies = system_deps
        .into_iter()
        .map(|(name, constraint)| (name, constraint.to_string()))
        .collect::<std::collections::BTreeMap<_, _>>();

    if json {
        let report = ResolveReport {
            order,
            system_dependencies,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    output::header(&format!("resolving {}", args.path.display()));
    println!();
    println!("load order:");
    for (i, id) in order.iter().enumerate() {
        println!("  {}. {id}", i + 1);
    }

    if !system_dependencies.is_empty() {
        println!();
        println!("system dependencies:");
        for (name, constraint) in &system_dependencies {
            println!("  {name} {constraint}");
        }
    }

    output::success(&format!("resolved {} addon(s)", order.len()));
    Ok(())
}
