//! Configuration validation with descriptive errors.

use crate::types::ResolvedConfig;

/// Validation severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Validation issue.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: &'static str,
    pub field: String,
    pub message: String,
    pub hint: Option<String>,
}

impl ValidationIssue {
    #[must_use]
    pub fn error(code: &'static str, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { severity: Severity::Error, code, field: field.into(), message: message.into(), hint: None }
    }

    #[must_use]
    pub fn warning(code: &'static str, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { severity: Severity::Warning, code, field: field.into(), message: message.into(), hint: None }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Validation result containing all issues.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Warning)
    }
}

/// Validates a resolved configuration, flagging settings that would make
/// the rest of the workspace misbehave (zero budgets, a nonexistent addon
/// root, an unparseable log level).
#[must_use]
pub fn validate(config: &ResolvedConfig) -> ValidationResult {
    let mut result = ValidationResult::new();

    if config.build_jobs == 0 {
        result.add(
            ValidationIssue::error("config::zero_jobs", "build_jobs", "build_jobs must be at least 1")
                .with_hint("set LITHIUM_BUILD_JOBS or build_jobs in config.json"),
        );
    }

    if config.sandbox_time_limit_ms == 0 {
        result.add(ValidationIssue::error(
            "config::zero_time_limit",
            "sandbox_time_limit_ms",
            "sandbox_time_limit_ms must be at least 1",
        ));
    }

    if config.sandbox_memory_limit_bytes == 0 {
        result.add(ValidationIssue::error(
            "config::zero_memory_limit",
            "sandbox_memory_limit_bytes",
            "sandbox_memory_limit_bytes must be at least 1",
        ));
    }

    if !config.addon_path.exists() {
        result.add(
            ValidationIssue::warning(
                "config::missing_addon_path",
                "addon_path",
                format!("addon path {} does not exist", config.addon_path.display()),
            )
            .with_hint("create the directory or point addon_path elsewhere"),
        );
    }

    if !["trace", "debug", "info", "warn", "error"].contains(&config.log.as_str()) {
        result.add(ValidationIssue::error(
            "config::invalid_log_level",
            "log",
            format!("unrecognized log filter directive `{}`", config.log),
        ));
    }

    result
}
