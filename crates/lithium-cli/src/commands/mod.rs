//! CLI commands for the Lithium addon platform.

pub mod build;
pub mod doctor;
pub mod load;
pub mod resolve;
pub mod sandbox;
pub mod scan;
pub mod validate;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// lithium - operator and CI tooling for the Lithium addon platform
#[derive(Parser, Debug)]
#[command(name = "lithium")]
#[command(author = "Lithium Contributors")]
#[command(version)]
#[command(about = "Scan, resolve, build, load, and sandbox Lithium addons", long_about = None)]
#[command(propagate_version = true)]
#[command(arg_required_else_help = true)]
#[command(styles = get_styles())]
pub struct Cli {
    /// Do not output any message
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Force ANSI output (colors and formatting)
    #[arg(long, global = true, conflicts_with = "no_ansi")]
    pub ansi: bool,

    /// Disable ANSI output (colors and formatting)
    #[arg(long, global = true)]
    pub no_ansi: bool,

    /// Do not ask any interactive question
    #[arg(short = 'n', long, global = true)]
    pub no_interaction: bool,

    /// Display timing information
    #[arg(long, global = true)]
    pub profile: bool,

    /// Use the specified directory as the addon path (defaults to
    /// `./modules`, overridable via config or `LITHIUM_ADDON_PATH`)
    #[arg(short = 'd', long = "addon-path", global = true, value_name = "DIR")]
    pub addon_path: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Increase the verbosity of messages: -v for info, -vv for debug, -vvv for trace
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discovers addon manifests and build-system projects under a directory
    Scan(scan::ScanArgs),

    /// Parses every manifest under a directory and reports the dependency
    /// load order, or the first cycle/conflict found
    Resolve(resolve::ResolveArgs),

    /// Builds one or more discovered projects via their native build system
    Build(build::BuildArgs),

    /// Initializes the component manager and loads one component (or all)
    Load(load::LoadArgs),

    /// Runs a program under a resource-limited sandbox
    Sandbox(sandbox::SandboxArgs),

    /// Validates an addon manifest
    Validate(validate::ValidateArgs),

    /// Checks system dependencies, toolchains, and configuration for problems
    Doctor(doctor::DoctorArgs),
}

/// Output format for commands that support it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Get clap styles for colored help
const fn get_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Green.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Green.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default())
        .placeholder(clap::builder::styling::AnsiColor::Yellow.on_default())
}
