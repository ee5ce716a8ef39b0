//! Manifest parsing for Lithium addons (C2).
//!
//! Accepts `package.json`, `package.xml`, or `package.yaml` in an addon
//! directory, all carrying the same logical schema (§6), and produces a
//! uniform [`PackageRecord`]. This crate does not validate transitive graph
//! properties — that is `lithium-graph`'s job.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;
use std::path::Path;

use lithium_core::{Error, Result};
use lithium_version::{Constraint, Version};
use serde::{Deserialize, Serialize};

pub type PackageId = String;

/// A dependency on a referenced component's factory entry point, carried by
/// `main` in the manifest schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentEntryPoint {
    pub m_func_name: String,
    pub m_component_type: String,
}

/// The full on-disk manifest document, before constraint strings are parsed
/// into [`Constraint`]s. JSON and YAML carry the full schema; the XML format
/// (per §6) only carries `name`, `version`, and `dependencies`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestDocument {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub dependencies: HashMap<String, String>,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub main: HashMap<String, ComponentEntryPoint>,
}

fn default_version() -> String {
    "0.0.0".to_string()
}

/// Parsed, typed addon record (§3). `system_deps` holds entries whose
/// manifest key began with `system:` (prefix stripped).
#[derive(Debug, Clone)]
pub struct PackageRecord {
    pub id: PackageId,
    pub version: Version,
    pub dependencies: HashMap<PackageId, Constraint>,
    pub system_deps: HashMap<String, Constraint>,
    pub modules: Vec<String>,
    pub main: HashMap<String, ComponentEntryPoint>,
}

const SYSTEM_PREFIX: &str = "system:";

impl ManifestDocument {
    /// Splits `dependencies` into in-tree and `system:`-prefixed entries and
    /// parses every constraint string, producing the typed [`PackageRecord`].
    ///
    /// # Errors
    /// Fails if `name` is empty or any constraint string is malformed.
    pub fn into_record(self) -> Result<(PackageId, PackageRecord)> {
        if self.name.is_empty() {
            return Err(Error::parse("manifest", "<unnamed>", "missing `name` field"));
        }
        let version = Version::parse(&self.version)?;
        let mut dependencies = HashMap::new();
        let mut system_deps = HashMap::new();
        for (name, constraint_str) in self.dependencies {
            let constraint = Constraint::parse(&constraint_str)?;
            if let Some(stripped) = name.strip_prefix(SYSTEM_PREFIX) {
                system_deps.insert(stripped.to_string(), constraint);
            } else {
                dependencies.insert(name, constraint);
            }
        }
        let id = self.name.clone();
        Ok((
            id.clone(),
            PackageRecord {
                id,
                version,
                dependencies,
                system_deps,
                modules: self.modules,
                main: self.main,
            },
        ))
    }
}

/// XML mirror of [`ManifestDocument`]; XML only carries name/version/depends
/// per §6.
#[derive(Debug, Deserialize)]
#[serde(rename = "package")]
struct XmlPackage {
    name: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(rename = "depend", default)]
    depend: Vec<XmlDepend>,
}

#[derive(Debug, Deserialize)]
struct XmlDepend {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@version", default)]
    version: Option<String>,
}

impl From<XmlPackage> for ManifestDocument {
    fn from(pkg: XmlPackage) -> Self {
        let mut dependencies = HashMap::new();
        for dep in pkg.depend {
            dependencies.insert(dep.name, dep.version.unwrap_or_else(|| "*".to_string()));
        }
        Self {
            name: pkg.name,
            version: pkg.version.unwrap_or_else(default_version),
            dependencies,
            modules: Vec::new(),
            main: HashMap::new(),
        }
    }
}

/// Parses the manifest at `path`, dispatching on filename
/// (`package.json`/`package.xml`/`package.yaml`).
///
/// # Errors
/// Returns an error if the file cannot be read, the format is
/// unrecognized, or the content fails to parse against the schema.
pub fn parse(path: &Path) -> Result<(PackageId, PackageRecord)> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path.to_path_buf(), e))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let document = match file_name {
        "package.json" => parse_json(&text, path)?,
        "package.xml" => parse_xml(&text, path)?,
        "package.yaml" | "package.yml" => parse_yaml(&text, path)?,
        other => {
            return Err(Error::parse(
                "manifest",
                other,
                "unrecognized manifest filename",
            ));
        }
    };
    document.into_record()
}

fn parse_json(text: &str, path: &Path) -> Result<ManifestDocument> {
    serde_json::from_str(text)
        .map_err(|e| Error::parse("manifest", path.display().to_string(), e.to_string()))
}

fn parse_yaml(text: &str, path: &Path) -> Result<ManifestDocument> {
    serde_yaml::from_str(text)
        .map_err(|e| Error::parse("manifest", path.display().to_string(), e.to_string()))
}

fn parse_xml(text: &str, path: &Path) -> Result<ManifestDocument> {
    let pkg: XmlPackage = quick_xml::de::from_str(text)
        .map_err(|e| Error::parse("manifest", path.display().to_string(), e.to_string()))?;
    Ok(pkg.into())
}
