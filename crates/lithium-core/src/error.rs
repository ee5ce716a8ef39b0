//! Error taxonomy shared across the Lithium addon platform.
//!
//! Every public operation in this workspace returns [`Result<T>`] rather than
//! a bare boolean; callers that need a boolean-style API (mirroring the
//! original C++ `bool`-returning methods) map [`Err`] to `false` at the call
//! site and still emit the structured log entry this module's constructors
//! attach context for.

use std::fmt;
use std::path::PathBuf;

/// The kind of failure, independent of the message or context carried with
/// it. Used for log correlation and for callers that branch on failure type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ParseError,
    MissingField,
    VersionConflict,
    Cycle,
    UnknownPackage,
    UnknownComponent,
    UnknownModule,
    Duplicate,
    IoError,
    SubprocessFailure,
    LoadFailure,
    ConstraintSyntax,
    ResourceExceeded,
    PlatformUnsupported,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ParseError => "ParseError",
            Self::MissingField => "MissingField",
            Self::VersionConflict => "VersionConflict",
            Self::Cycle => "Cycle",
            Self::UnknownPackage => "UnknownPackage",
            Self::UnknownComponent => "UnknownComponent",
            Self::UnknownModule => "UnknownModule",
            Self::Duplicate => "Duplicate",
            Self::IoError => "IoError",
            Self::SubprocessFailure => "SubprocessFailure",
            Self::LoadFailure => "LoadFailure",
            Self::ConstraintSyntax => "ConstraintSyntax",
            Self::ResourceExceeded => "ResourceExceeded",
            Self::PlatformUnsupported => "PlatformUnsupported",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The workspace-wide error type.
///
/// Each variant keeps the `name` (package, component, or module id) that the
/// failure concerns, so the logging call site can always produce an
/// `ERROR`-level entry carrying both the kind and the offending name, per the
/// error-handling design's user-visible-failure requirement.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to parse {what} `{name}`: {reason}")]
    Parse {
        what: &'static str,
        name: String,
        reason: String,
    },

    #[error("manifest at {path} is missing required field `{field}`")]
    MissingField { path: PathBuf, field: &'static str },

    #[error("`{to}` version {actual} does not satisfy constraint `{constraint}` required by `{from}`")]
    VersionConflict {
        from: String,
        to: String,
        actual: String,
        constraint: String,
    },

    #[error("dependency cycle detected involving `{node}`")]
    Cycle { node: String },

    #[error("unknown package `{0}`")]
    UnknownPackage(String),

    #[error("unknown component `{0}`")]
    UnknownComponent(String),

    #[error("unknown module `{0}`")]
    UnknownModule(String),

    #[error("`{0}` is already registered")]
    Duplicate(String),

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("subprocess `{command}` exited with code {exit_code}: {message}")]
    SubprocessFailure {
        command: String,
        exit_code: i32,
        message: String,
    },

    #[error("failed to load module `{name}`: {reason}")]
    LoadFailure { name: String, reason: String },

    #[error("malformed constraint `{raw}`")]
    ConstraintSyntax { raw: String },

    #[error("{resource} limit exceeded for `{name}` ({used} > {limit})")]
    ResourceExceeded {
        name: String,
        resource: &'static str,
        used: u64,
        limit: u64,
    },

    #[error("operation `{op}` is not supported on this platform")]
    PlatformUnsupported { op: &'static str },

    #[error("component `{name}` is still depended upon and was not unloaded (forced=false)")]
    InUse { name: String },

    #[error(transparent)]
    Json(#[from] sonic_rs::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse { .. } => ErrorKind::ParseError,
            Self::MissingField { .. } => ErrorKind::MissingField,
            Self::VersionConflict { .. } => ErrorKind::VersionConflict,
            Self::Cycle { .. } => ErrorKind::Cycle,
            Self::UnknownPackage(_) => ErrorKind::UnknownPackage,
            Self::UnknownComponent(_) => ErrorKind::UnknownComponent,
            Self::UnknownModule(_) => ErrorKind::UnknownModule,
            Self::Duplicate(_) | Self::InUse { .. } => ErrorKind::Duplicate,
            Self::Io { .. } => ErrorKind::IoError,
            Self::SubprocessFailure { .. } => ErrorKind::SubprocessFailure,
            Self::LoadFailure { .. } => ErrorKind::LoadFailure,
            Self::ConstraintSyntax { .. } => ErrorKind::ConstraintSyntax,
            Self::ResourceExceeded { .. } => ErrorKind::ResourceExceeded,
            Self::PlatformUnsupported { .. } => ErrorKind::PlatformUnsupported,
            Self::Json(_) => ErrorKind::ParseError,
        }
    }

    /// The name most relevant to this failure (package, component, module,
    /// or path), for log correlation.
    #[must_use]
    pub fn offending_name(&self) -> String {
        match self {
            Self::Parse { name, .. } => name.clone(),
            Self::MissingField { path, .. } => path.display().to_string(),
            Self::VersionConflict { to, .. } => to.clone(),
            Self::Cycle { node } => node.clone(),
            Self::UnknownPackage(n)
            | Self::UnknownComponent(n)
            | Self::UnknownModule(n)
            | Self::Duplicate(n)
            | Self::InUse { name: n } => n.clone(),
            Self::Io { path, .. } => path.display().to_string(),
            Self::SubprocessFailure { command, .. } => command.clone(),
            Self::LoadFailure { name, .. } => name.clone(),
            Self::ConstraintSyntax { raw } => raw.clone(),
            Self::ResourceExceeded { name, .. } => name.clone(),
            Self::PlatformUnsupported { op } => (*op).to_string(),
            Self::Json(_) => String::new(),
        }
    }

    pub fn parse(what: &'static str, name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            what,
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_field(path: impl Into<PathBuf>, field: &'static str) -> Self {
        Self::MissingField {
            path: path.into(),
            field,
        }
    }

    pub fn version_conflict(
        from: impl Into<String>,
        to: impl Into<String>,
        actual: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self::VersionConflict {
            from: from.into(),
            to: to.into(),
            actual: actual.into(),
            constraint: constraint.into(),
        }
    }

    pub fn cycle(node: impl Into<String>) -> Self {
        Self::Cycle { node: node.into() }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn subprocess_failure(
        command: impl Into<String>,
        exit_code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::SubprocessFailure {
            command: command.into(),
            exit_code,
            message: message.into(),
        }
    }

    pub fn load_failure(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LoadFailure {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn constraint_syntax(raw: impl Into<String>) -> Self {
        Self::ConstraintSyntax { raw: raw.into() }
    }

    pub fn resource_exceeded(
        name: impl Into<String>,
        resource: &'static str,
        used: u64,
        limit: u64,
    ) -> Self {
        Self::ResourceExceeded {
            name: name.into(),
            resource,
            used,
            limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let e = Error::cycle("a");
        assert_eq!(e.kind(), ErrorKind::Cycle);
        assert_eq!(e.offending_name(), "a");
    }

    #[test]
    fn in_use_reports_duplicate_kind() {
        let e = Error::InUse { name: "x".into() };
        assert_eq!(e.kind(), ErrorKind::Duplicate);
    }
}
