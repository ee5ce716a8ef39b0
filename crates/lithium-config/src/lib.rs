//! Hierarchical configuration loading for the Lithium addon platform.
//!
//! Settings are merged across six layers, in increasing precedence:
//! built-in defaults, `/etc/lithium/config.json`, the user's global config
//! directory, a project-local `lithium.json`, `LITHIUM_*`
//! environment variables, and finally explicit CLI flags.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod env;
pub mod error;
pub mod loader;
pub mod types;
pub mod validate;

pub use env::{EnvConfig, LithiumEnvVar};
pub use error::{ConfigError, Result};
pub use loader::{CliOverrides, ConfigLoader, ConfigSource};
pub use types::{ConfigFile, ResolvedConfig};
pub use validate::{validate, Severity, ValidationIssue, ValidationResult};
