//! Version, date-version, and constraint parsing for Lithium addons (C1).
//!
//! The grammar here is deliberately narrower than full SemVer: versions are
//! exactly `N.N.N[-pre][+build]`, constraints are exactly one operator from
//! `{^, ~, >, <, >=, <=, =}` followed by a version literal. There is no
//! wildcard, OR, or AND grammar.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

use std::cmp::Ordering;
use std::fmt;

use lithium_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// `{major, minor, patch, prerelease, build}`, parsed from
/// `N.N.N[-pre][+build]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub prerelease: String,
    pub build: String,
}

impl Version {
    #[must_use]
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: String::new(),
            build: String::new(),
        }
    }

    /// Parses `N.N.N[-pre][+build]`. Any deviation — missing component,
    /// non-numeric core, trailing junk — fails with [`Error::Parse`].
    ///
    /// # Errors
    /// Returns an error if `s` does not match the grammar.
    pub fn parse(s: &str) -> Result<Self> {
        let (core_and_pre, build) = match s.split_once('+') {
            Some((a, b)) => (a, b),
            None => (s, ""),
        };
        let (core, prerelease) = match core_and_pre.split_once('-') {
            Some((a, b)) => (a, b),
            None => (core_and_pre, ""),
        };
        let mut parts = core.split('.');
        let (Some(maj), Some(min), Some(pat), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::parse("version", s, "expected N.N.N core"));
        };
        let parse_component = |component: &str| -> Result<u32> {
            if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::parse("version", s, format!("`{component}` is not numeric")));
            }
            component
                .parse::<u32>()
                .map_err(|e| Error::parse("version", s, e.to_string()))
        };
        Ok(Self {
            major: parse_component(maj)?,
            minor: parse_component(min)?,
            patch: parse_component(pat)?,
            prerelease: prerelease.to_string(),
            build: build.to_string(),
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.prerelease.is_empty() {
            write!(f, "-{}", self.prerelease)?;
        }
        if !self.build.is_empty() {
            write!(f, "+{}", self.build)?;
        }
        Ok(())
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.major == other.major
            && self.minor == other.minor
            && self.patch == other.patch
            && self.prerelease == other.prerelease
    }
}
impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (self.prerelease.is_empty(), other.prerelease.is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => self.prerelease.cmp(&other.prerelease),
            })
    }
}

/// `{year, month, day}`, parsed from `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DateVersion {
    pub year: u32,
    pub month: u32,
    pub day: u32,
}

impl DateVersion {
    /// Validates `month ∈ 1..=12` and `day ∈ 1..=31`; no calendar-aware
    /// validation beyond that range.
    ///
    /// # Errors
    /// Returns an error if `s` is not `YYYY-MM-DD` or a component is out of
    /// range.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.split('-');
        let (Some(y), Some(m), Some(d), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::parse("date version", s, "expected YYYY-MM-DD"));
        };
        let year = y
            .parse::<u32>()
            .map_err(|e| Error::parse("date version", s, e.to_string()))?;
        let month = m
            .parse::<u32>()
            .map_err(|e| Error::parse("date version", s, e.to_string()))?;
        let day = d
            .parse::<u32>()
            .map_err(|e| Error::parse("date version", s, e.to_string()))?;
        if !(1..=12).contains(&month) {
            return Err(Error::parse("date version", s, "month out of range"));
        }
        if !(1..=31).contains(&day) {
            return Err(Error::parse("date version", s, "day out of range"));
        }
        Ok(Self { year, month, day })
    }
}

impl fmt::Display for DateVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// An operator-prefixed version constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    Caret(Version),
    Tilde(Version),
    Gt(Version),
    Lt(Version),
    Ge(Version),
    Le(Version),
    Eq(Version),
}

impl Constraint {
    /// Splits the constraint into its 1–2 character operator and version
    /// literal. A malformed constraint fails with
    /// [`ErrorKind::ConstraintSyntax`](lithium_core::ErrorKind::ConstraintSyntax).
    ///
    /// # Errors
    /// Returns an error if the operator is unrecognized or the literal does
    /// not parse as a [`Version`].
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::constraint_syntax(raw));
        }
        let (op, rest) = if let Some(r) = raw.strip_prefix(">=") {
            (">=", r)
        } else if let Some(r) = raw.strip_prefix("<=") {
            ("<=", r)
        } else if let Some(r) = raw.strip_prefix('^') {
            ("^", r)
        } else if let Some(r) = raw.strip_prefix('~') {
            ("~", r)
        } else if let Some(r) = raw.strip_prefix('>') {
            (">", r)
        } else if let Some(r) = raw.strip_prefix('<') {
            ("<", r)
        } else if let Some(r) = raw.strip_prefix('=') {
            ("=", r)
        } else {
            return Err(Error::constraint_syntax(raw));
        };
        let version = Version::parse(rest.trim()).map_err(|_| Error::constraint_syntax(raw))?;
        Ok(match op {
            "^" => Self::Caret(version),
            "~" => Self::Tilde(version),
            ">" => Self::Gt(version),
            "<" => Self::Lt(version),
            ">=" => Self::Ge(version),
            "<=" => Self::Le(version),
            "=" => Self::Eq(version),
            _ => unreachable!(),
        })
    }

    /// `^X.Y.Z`: same major, actual ≥ required. `~X.Y.Z`: same major and
    /// minor, actual ≥ required. Others: direct comparison.
    #[must_use]
    pub fn matches(&self, actual: &Version) -> bool {
        match self {
            Self::Caret(v) => actual.major == v.major && actual >= v,
            Self::Tilde(v) => actual.major == v.major && actual.minor == v.minor && actual >= v,
            Self::Gt(v) => actual > v,
            Self::Lt(v) => actual < v,
            Self::Ge(v) => actual >= v,
            Self::Le(v) => actual <= v,
            Self::Eq(v) => actual == v,
        }
    }

    #[must_use]
    pub fn literal(&self) -> &Version {
        match self {
            Self::Caret(v)
            | Self::Tilde(v)
            | Self::Gt(v)
            | Self::Lt(v)
            | Self::Ge(v)
            | Self::Le(v)
            | Self::Eq(v) => v,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (op, v) = match self {
            Self::Caret(v) => ("^", v),
            Self::Tilde(v) => ("~", v),
            Self::Gt(v) => (">", v),
            Self::Lt(v) => ("<", v),
            Self::Ge(v) => (">=", v),
            Self::Le(v) => ("<=", v),
            Self::Eq(v) => ("=", v),
        };
        write!(f, "{op}{v}")
    }
}

impl Serialize for Constraint {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Constraint {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Parses a version string. Equivalent to [`Version::parse`], provided as a
/// free function to mirror the component contract in the design document.
///
/// # Errors
/// See [`Version::parse`].
pub fn parse_version(s: &str) -> Result<Version> {
    Version::parse(s)
}

/// Parses a date-version string. Equivalent to [`DateVersion::parse`].
///
/// # Errors
/// See [`DateVersion::parse`].
pub fn parse_date_version(s: &str) -> Result<DateVersion> {
    DateVersion::parse(s)
}

#[must_use]
pub fn compare(a: &Version, b: &Version) -> Ordering {
    a.cmp(b)
}

/// Parses `constraint` and evaluates it against `actual`.
///
/// # Errors
/// Returns [`Error::ConstraintSyntax`] if `constraint` cannot be tokenized.
pub fn evaluate(actual: &Version, constraint: &str) -> Result<bool> {
    Ok(Constraint::parse(constraint)?.matches(actual))
}
