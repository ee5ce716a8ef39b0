//! Terminal output utilities for the Lithium CLI.
//!
//! Unified styling, progress bars, tables, and interactive prompts with
//! TTY detection, `NO_COLOR` support, and graceful degradation to ASCII
//! when Unicode is not supported.

#![allow(dead_code)]

pub mod json;
pub mod progress;
pub mod prompt;
pub mod table;

use std::io::{IsTerminal, stderr, stdout};
use std::sync::atomic::{AtomicBool, Ordering};

static COLOR_ENABLED: AtomicBool = AtomicBool::new(true);
static UNICODE_ENABLED: AtomicBool = AtomicBool::new(true);

static IS_TTY: std::sync::LazyLock<bool> =
    std::sync::LazyLock::new(|| stdout().is_terminal() && stderr().is_terminal());

static NO_COLOR: std::sync::LazyLock<bool> =
    std::sync::LazyLock::new(|| std::env::var("NO_COLOR").is_ok());

/// Status icon, with an ASCII fallback for non-Unicode terminals.
pub enum Icon {
    Success,
    Warning,
    Error,
    Info,
}

impl Icon {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "✓",
            Self::Warning => "⚠",
            Self::Error => "✗",
            Self::Info => "ℹ",
        }
    }

    pub fn ascii(&self) -> &'static str {
        match self {
            Self::Success => "[ok]",
            Self::Warning => "[warn]",
            Self::Error => "[err]",
            Self::Info => "[i]",
        }
    }
}

/// Initializes output settings based on environment and CLI flags.
pub fn init(force_ansi: Option<bool>, quiet: bool) {
    let colors = match force_ansi {
        Some(true) => true,
        Some(false) => false,
        None => *IS_TTY && !*NO_COLOR,
    };
    COLOR_ENABLED.store(colors, Ordering::Relaxed);

    let unicode = std::env::var("LANG")
        .or_else(|_| std::env::var("LC_ALL"))
        .map(|l| l.contains("UTF") || l.contains("utf"))
        .unwrap_or(cfg!(not(windows)));
    UNICODE_ENABLED.store(unicode && !quiet, Ordering::Relaxed);
}

pub fn colors_enabled() -> bool {
    COLOR_ENABLED.load(Ordering::Relaxed)
}

pub fn unicode_enabled() -> bool {
    UNICODE_ENABLED.load(Ordering::Relaxed)
}

pub fn is_tty() -> bool {
    *IS_TTY
}

pub fn header(text: &str) {
    use owo_colors::OwoColorize;
    if colors_enabled() {
        println!("{} {}", "lithium".cyan().bold(), text.dimmed());
    } else {
        println!("lithium {text}");
    }
}

pub fn success(text: &str) {
    use owo_colors::OwoColorize;
    let icon = if unicode_enabled() { Icon::Success.as_str() } else { Icon::Success.ascii() };
    if colors_enabled() {
        println!("{} {}", icon.green(), text);
    } else {
        println!("{icon} {text}");
    }
}

pub fn warning(text: &str) {
    use owo_colors::OwoColorize;
    let icon = if unicode_enabled() { Icon::Warning.as_str() } else { Icon::Warning.ascii() };
    if colors_enabled() {
        eprintln!("{} {}", icon.yellow(), text.yellow());
    } else {
        eprintln!("{icon} {text}");
    }
}

pub fn error(text: &str) {
    use owo_colors::OwoColorize;
    let icon = if unicode_enabled() { Icon::Error.as_str() } else { Icon::Error.ascii() };
    if colors_enabled() {
        eprintln!("{} {}", icon.red(), text.red());
    } else {
        eprintln!("{icon} {text}");
    }
}

pub fn info(text: &str) {
    use owo_colors::OwoColorize;
    let icon = if unicode_enabled() { Icon::Info.as_str() } else { Icon::Info.ascii() };
    if colors_enabled() {
        println!("{} {}", icon.blue(), text);
    } else {
        println!("{icon} {text}");
    }
}

pub fn debug(text: &str) {
    use owo_colors::OwoColorize;
    if colors_enabled() {
        eprintln!("{}", text.dimmed());
    } else {
        eprintln!("{text}");
    }
}

/// Prints a component or addon name with an optional version.
pub fn named(name: &str, version: Option<&str>) {
    use owo_colors::OwoColorize;
    if colors_enabled() {
        if let Some(v) = version {
            println!("  {} {}", name.green(), v.yellow());
        } else {
            println!("  {}", name.green());
        }
    } else if let Some(v) = version {
        println!("  {name} {v}");
    } else {
        println!("  {name}");
    }
}

pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 0.001 {
        format!("{:.0}us", secs * 1_000_000.0)
    } else if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{secs:.2}s")
    } else {
        let mins = secs / 60.0;
        format!("{mins:.1}m")
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else if bytes < GB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    }
}
