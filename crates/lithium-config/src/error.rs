//! Error types for configuration loading and validation.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration error type with rich diagnostics.
#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    #[diagnostic(code(config::not_found), help("create the file or check the path"))]
    NotFound { path: PathBuf },

    /// Invalid JSON syntax.
    #[error("invalid JSON in {path}: {message}")]
    #[diagnostic(code(config::invalid_json), help("check the file's JSON syntax"))]
    InvalidJson { path: PathBuf, message: String },

    /// A field failed validation.
    #[error("invalid value for `{field}` in {path}: {message}")]
    #[diagnostic(code(config::invalid_field))]
    InvalidField { path: PathBuf, field: String, message: String },

    #[error(transparent)]
    #[diagnostic(code(config::io))]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
