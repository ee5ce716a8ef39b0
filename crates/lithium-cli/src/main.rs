//! Lithium CLI - operator and CI tooling for the Lithium addon platform.
//!
//! A thin binary over the Lithium crates: it scans directories for addon
//! manifests and build-system projects, resolves dependency order, drives
//! builds through the native build-system adapters, initializes the
//! component manager, and runs programs under the sandbox. The core
//! platform is a library; this binary is one of its consumers.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod commands;
mod discovery;
mod output;

use clap::Parser;
use commands::{Cli, Commands, OutputFormat};
use std::process::ExitCode;
use std::time::Instant;
use tracing::Level;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let start = Instant::now();
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 if cli.quiet => Level::ERROR,
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let json = matches!(cli.format, OutputFormat::Json);
    if json {
        output::json::enable();
    }

    let force_ansi = if cli.ansi {
        Some(true)
    } else if cli.no_ansi {
        Some(false)
    } else {
        None
    };
    output::init(force_ansi, cli.quiet);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to create runtime");

    let result = runtime.block_on(run_command(&cli, json));

    if cli.profile && !json {
        let elapsed = start.elapsed();
        eprintln!("\n[profile] total time: {}", output::format_duration(elapsed));
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::json::print_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run_command(cli: &Cli, json: bool) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Scan(args) => commands::scan::run(args.clone(), json).await,
        Commands::Resolve(args) => commands::resolve::run(args.clone(), json).await,
        Commands::Build(args) => commands::build::run(args.clone(), json).await,
        Commands::Load(args) => commands::load::run(args.clone(), json).await,
        Commands::Sandbox(args) => commands::sandbox::run(args.clone(), json).await,
        Commands::Validate(args) => commands::validate::run(args.clone(), json).await,
        Commands::Doctor(args) => commands::doctor::run(args.clone(), json).await,
    }
}
