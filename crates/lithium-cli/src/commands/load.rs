//! `load` command: initialize the component manager over an addon root.

use anyhow::Result;
use clap::Args;
use lithium_components::ComponentManager;
use std::path::PathBuf;
use tracing::info;

use crate::output;

/// Arguments for the load command.
#[derive(Args, Debug, Clone)]
pub struct LoadArgs {
    /// Addon root directory (defaults to the current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Load only this single component (`addon::module`) instead of every
    /// discovered component
    #[arg(long)]
    pub component: Option<String>,
}

pub async fn run(args: LoadArgs, json: bool) -> Result<()> {
    info!(path = %args.path.display(), "running load command");

    let manager = ComponentManager::new(args.path.clone());

    if let Some(component) = &args.component {
        manager.scan(&args.path)?;
        manager.load_component(component)?;
    } else {
        manager.initialize()?;
    }

    let loaded = manager.list();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "success": true,
                "loaded": loaded,
            }))?
        );
        return Ok(());
    }

    output::header(&format!("loading {}", args.path.display()));
    println!();
    for component in &loaded {
        let doc = manager.doc(component);
        match doc {
            Some(doc) => println!("  {component} - {doc}"),
            None => println!("  {component}"),
        }
    }
    output::success(&format!("loaded {} component(s)", loaded.len()));
    Ok(())
}
