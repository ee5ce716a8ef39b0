//! JSON output support for machine-readable CLI output.
//!
//! Structured JSON for errors and results, suitable for automation, CI
//! pipelines, and tooling integration.

use lithium_core::Error as CoreError;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

/// Global JSON output mode
static JSON_OUTPUT: AtomicBool = AtomicBool::new(false);

/// Enable JSON output mode.
pub fn enable() {
    JSON_OUTPUT.store(true, Ordering::Relaxed);
}

/// Disable JSON output mode.
pub fn disable() {
    JSON_OUTPUT.store(false, Ordering::Relaxed);
}

/// Check if JSON output is enabled.
pub fn is_enabled() -> bool {
    JSON_OUTPUT.load(Ordering::Relaxed)
}

/// JSON-serializable error structure.
#[derive(Debug, Serialize)]
pub struct JsonError {
    /// Error kind (e.g. "VersionConflict")
    pub kind: String,
    /// The package, component, module, or path the failure concerns
    pub name: String,
    /// Detailed error message
    pub message: String,
}

/// JSON-serializable result structure.
#[derive(Debug, Serialize)]
pub struct JsonResult<T> {
    /// Whether the operation succeeded
    pub success: bool,
    /// The result data (if success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error information (if failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonError>,
}

impl JsonError {
    /// Create a `JsonError` from a core error.
    #[must_use]
    pub fn from_core_error(err: &CoreError) -> Self {
        Self {
            kind: err.kind().as_str().to_string(),
            name: err.offending_name(),
            message: err.to_string(),
        }
    }

    /// Create a `JsonError` from an anyhow error.
    #[must_use]
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        if let Some(core_err) = err.downcast_ref::<CoreError>() {
            return Self::from_core_error(core_err);
        }

        Self {
            kind: "Unknown".to_string(),
            name: String::new(),
            message: err.to_string(),
        }
    }

    /// Print this error as JSON to stderr.
    pub fn print(&self) {
        if let Ok(json) = sonic_rs::to_string_pretty(self) {
            eprintln!("{json}");
        }
    }
}

impl<T: Serialize> JsonResult<T> {
    /// Create a successful result.
    #[must_use]
    pub fn success(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    /// Create a failed result from an error.
    #[must_use]
    pub fn failure(err: &anyhow::Error) -> Self {
        Self { success: false, data: None, error: Some(JsonError::from_anyhow(err)) }
    }

    /// Print this result as JSON to stdout (or stderr for errors).
    pub fn print(&self) {
        if let Ok(json) = sonic_rs::to_string_pretty(self) {
            if self.success {
                println!("{json}");
            } else {
                eprintln!("{json}");
            }
        }
    }
}

/// Print an error in JSON format if enabled, otherwise human-readable.
pub fn print_error(err: &anyhow::Error) {
    if is_enabled() {
        JsonError::from_anyhow(err).print();
    } else {
        super::error(&err.to_string());
    }
}

/// Wrapper to conditionally output success or handle errors.
pub fn handle_result<T: Serialize>(result: Result<T, anyhow::Error>) -> Result<T, anyhow::Error> {
    match result {
        Ok(data) => {
            if is_enabled() {
                JsonResult::success(&data).print();
            }
            Ok(data)
        }
        Err(e) => {
            print_error(&e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_from_core() {
        let err = CoreError::UnknownPackage("example-addon".to_string());
        let json_err = JsonError::from_core_error(&err);

        assert_eq!(json_err.kind, "UnknownPackage");
        assert!(json_err.message.contains("example-addon"));
    }

    #[test]
    fn test_json_result_success() {
        #[derive(Serialize)]
        struct TestData {
            count: usize,
        }

        let result: JsonResult<TestData> = JsonResult::success(TestData { count: 42 });
        assert!(result.success);
        assert!(result.data.is_some());
        assert!(result.error.is_none());
    }

    #[test]
    fn test_json_mode_toggle() {
        disable();
        assert!(!is_enabled());

        enable();
        assert!(is_enabled());

        disable();
        assert!(!is_enabled());
    }
}
