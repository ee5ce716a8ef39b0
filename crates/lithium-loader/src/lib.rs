//! Dynamic module loading (C8).
//!
//! Mirrors the original `ModuleLoader`: a name-keyed table of opened
//! dynamic artifacts behind a reader-writer lock, with typed symbol lookup
//! and factory-backed instance construction. `libloading`'s `Symbol` API is
//! inherently `unsafe`; this is the one crate in the workspace where that
//! lint is relaxed.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(unsafe_code)]

use std::any::Any;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use libloading::{Library, Symbol};
use lithium_core::{Error, Result};
use parking_lot::RwLock;
use serde::Deserialize;

/// Sidecar config read from a module's sibling `.json` file. Any shape is
/// accepted; missing or malformed config degrades to a warning.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModuleConfig {
    #[serde(flatten)]
    pub fields: HashMap<String, serde_json::Value>,
}

/// A loaded dynamic module. Metadata fields (`description`, `version`,
/// `kind`, `author`, `license`) are read from the sidecar config where
/// present and otherwise default to an empty/unknown value.
#[derive(Clone)]
pub struct ModuleHandle {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub version: String,
    pub kind: String,
    pub author: String,
    pub license: String,
    pub source_path: PathBuf,
    pub config_path: Option<PathBuf>,
    pub config: ModuleConfig,
    enabled: bool,
    native_handle: Arc<Library>,
}

impl std::fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("version", &self.version)
            .field("kind", &self.kind)
            .field("source_path", &self.source_path)
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Pulls the well-known metadata fields out of a sidecar config, the way
/// `iterator_modules_dir` reads name/version/author/license/description out
/// of each module's info file. Missing fields default rather than fail the
/// load.
fn extract_metadata(config: &ModuleConfig) -> (String, String, String, String, String) {
    let field = |key: &str, default: &str| {
        config
            .fields
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or(default)
            .to_string()
    };
    (
        field("description", ""),
        field("version", "0.0.0"),
        field("type", "unknown"),
        field("author", ""),
        field("license", ""),
    )
}

#[cfg(target_os = "windows")]
const LIB_EXTENSION: &str = "dll";
#[cfg(target_os = "macos")]
const LIB_EXTENSION: &str = "dylib";
#[cfg(all(unix, not(target_os = "macos")))]
const LIB_EXTENSION: &str = "so";

/// The platform-appropriate dynamic library extension.
pub fn platform_extension() -> &'static str {
    LIB_EXTENSION
}

/// Module table guarded by a reader-writer lock: reads (`has`, `get`,
/// `get_symbol`) proceed in parallel, writes (`load`, `unload`,
/// `enable`/`disable`) are exclusive.
#[derive(Default)]
pub struct ModuleLoader {
    modules: RwLock<HashMap<String, ModuleHandle>>,
    instances: RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for ModuleLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleLoader")
            .field("modules", &self.modules.read().len())
            .finish()
    }
}

impl ModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuses to load if `name` is already present. Opens the dynamic
    /// artifact at `path`; on failure logs and returns `false`. On success,
    /// reads a sibling `.json` config; a missing or malformed config
    /// degrades to a warning rather than failing the load.
    pub fn load(&self, path: &Path, name: &str) -> bool {
        if self.modules.read().contains_key(name) {
            tracing::warn!(name, "module already loaded");
            return false;
        }
        let library = match unsafe { Library::new(path) } {
            Ok(lib) => lib,
            Err(e) => {
                tracing::error!(name, path = %path.display(), error = %e, "failed to open dynamic artifact");
                return false;
            }
        };
        let config_path = path.with_extension("json");
        let config = read_sidecar_config(path);
        let (description, version, kind, author, license) = extract_metadata(&config);
        let handle = ModuleHandle {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            name: name.to_string(),
            description,
            version,
            kind,
            author,
            license,
            source_path: path.to_path_buf(),
            config_path: config_path.exists().then_some(config_path),
            config,
            enabled: true,
            native_handle: Arc::new(library),
        };
        self.modules.write().insert(name.to_string(), handle);
        true
    }

    /// Returns a snapshot of the named module's handle, or `None` if
    /// unknown. Safe to call concurrently with other reads.
    pub fn get(&self, name: &str) -> Option<ModuleHandle> {
        self.modules.read().get(name).cloned()
    }

    /// Closes the artifact; fails if the name is unknown.
    pub fn unload(&self, name: &str) -> Result<()> {
        let mut modules = self.modules.write();
        if modules.remove(name).is_some() {
            Ok(())
        } else {
            Err(Error::parse("module", name, "unknown module"))
        }
    }

    pub fn unload_all(&self) {
        self.modules.write().clear();
    }

    pub fn has(&self, name: &str) -> bool {
        self.modules.read().contains_key(name)
    }

    /// Non-binding symbol lookup: true if `symbol` exists in `name`'s
    /// artifact.
    pub fn has_function(&self, name: &str, symbol: &str) -> bool {
        let modules = self.modules.read();
        let Some(handle) = modules.get(name) else { return false };
        unsafe {
            handle
                .native_handle
                .get::<Symbol<'_, *const ()>>(symbol.as_bytes())
                .is_ok()
        }
    }

    pub fn enable(&self, name: &str) -> bool {
        self.set_enabled(name, true)
    }

    pub fn disable(&self, name: &str) -> bool {
        self.set_enabled(name, false)
    }

    fn set_enabled(&self, name: &str, value: bool) -> bool {
        let mut modules = self.modules.write();
        match modules.get_mut(name) {
            Some(handle) => {
                handle.enabled = value;
                true
            }
            None => false,
        }
    }

    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.modules.read().get(name).map(|h| h.enabled)
    }

    /// Typed symbol lookup, nullable. Caller is responsible for asserting
    /// the correct function-pointer type for `T`.
    ///
    /// # Safety
    /// `T` must exactly match the signature of the named C symbol.
    pub unsafe fn get_symbol<T: Copy>(&self, name: &str, symbol: &str) -> Option<T> {
        let modules = self.modules.read();
        let handle = modules.get(name)?;
        let sym: Symbol<'_, T> = handle.native_handle.get(symbol.as_bytes()).ok()?;
        Some(*sym)
    }

    /// Calls the named factory function with `config`, returning the
    /// constructed instance shared across all callers. The factory is
    /// expected to have signature `extern "C" fn(*const c_char) -> *mut T`,
    /// taking the config serialized as a JSON C string and returning a
    /// heap-allocated `T` the factory produced with `Box::into_raw`. The
    /// first successful call is cached under `name`/`factory_symbol`; later
    /// calls return the same instance without invoking the factory again.
    pub fn get_instance<T>(&self, name: &str, config: &ModuleConfig, factory_symbol: &str) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let cache_key = format!("{name}::{factory_symbol}");
        if let Some(existing) = self.instances.read().get(&cache_key) {
            return existing.clone().downcast::<T>().ok();
        }

        type Factory<T> = unsafe extern "C" fn(*const std::os::raw::c_char) -> *mut T;
        let factory: Factory<T> = unsafe { self.get_symbol(name, factory_symbol)? };

        let config_json = serde_json::to_string(&config.fields).ok()?;
        let config_cstr = std::ffi::CString::new(config_json).ok()?;
        let raw = unsafe { factory(config_cstr.as_ptr()) };
        if raw.is_null() {
            tracing::warn!(name, factory_symbol, "factory returned a null instance");
            return None;
        }
        let instance: Arc<T> = Arc::new(unsafe { *Box::from_raw(raw) });

        let mut instances = self.instances.write();
        let cached = instances
            .entry(cache_key)
            .or_insert_with(|| instance.clone() as Arc<dyn Any + Send + Sync>)
            .clone();
        cached.downcast::<T>().ok()
    }
}

fn read_sidecar_config(lib_path: &Path) -> ModuleConfig {
    let config_path = lib_path.with_extension("json");
    let Ok(text) = std::fs::read_to_string(&config_path) else {
        return ModuleConfig::default();
    };
    match serde_json::from_str(&text) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(path = %config_path.display(), error = %e, "malformed module sidecar config");
            ModuleConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_nonexistent_path_returns_false() {
        let loader = ModuleLoader::new();
        assert!(!loader.load(Path::new("/definitely/not/a/real/module.so"), "ghost"));
    }

    #[test]
    fn unload_unknown_module_is_an_error() {
        let loader = ModuleLoader::new();
        assert!(loader.unload("nope").is_err());
    }

    #[test]
    fn enable_disable_unknown_module_returns_false() {
        let loader = ModuleLoader::new();
        assert!(!loader.enable("nope"));
        assert!(!loader.disable("nope"));
        assert!(loader.is_enabled("nope").is_none());
    }

    #[test]
    fn has_function_on_unknown_module_is_false() {
        let loader = ModuleLoader::new();
        assert!(!loader.has_function("nope", "factory"));
    }

    #[test]
    fn sidecar_config_missing_degrades_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let lib_path = dir.path().join("mod.so");
        let config = read_sidecar_config(&lib_path);
        assert!(config.fields.is_empty());
    }

    #[test]
    fn sidecar_config_malformed_degrades_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let lib_path = dir.path().join("mod.so");
        std::fs::write(dir.path().join("mod.json"), "{ not json").unwrap();
        let config = read_sidecar_config(&lib_path);
        assert!(config.fields.is_empty());
    }

    #[test]
    fn sidecar_config_parses_valid_json() {
        let dir = tempfile::tempdir().unwrap();
        let lib_path = dir.path().join("mod.so");
        std::fs::write(dir.path().join("mod.json"), r#"{"flavor": "camera"}"#).unwrap();
        let config = read_sidecar_config(&lib_path);
        assert_eq!(config.fields.get("flavor").unwrap(), "camera");
    }

    #[test]
    fn platform_extension_is_non_empty() {
        assert!(!platform_extension().is_empty());
    }

    #[test]
    fn get_unknown_module_returns_none() {
        let loader = ModuleLoader::new();
        assert!(loader.get("nope").is_none());
    }

    #[test]
    fn get_instance_on_unknown_module_returns_none() {
        let loader = ModuleLoader::new();
        let config = ModuleConfig::default();
        assert!(loader.get_instance::<u32>("nope", &config, "make_thing").is_none());
    }

    #[test]
    fn extract_metadata_reads_known_fields_with_defaults() {
        let mut fields = HashMap::new();
        fields.insert("version".to_string(), serde_json::json!("2.1.0"));
        fields.insert("author".to_string(), serde_json::json!("Stargazer"));
        let config = ModuleConfig { fields };

        let (description, version, kind, author, license) = extract_metadata(&config);
        assert_eq!(description, "");
        assert_eq!(version, "2.1.0");
        assert_eq!(kind, "unknown");
        assert_eq!(author, "Stargazer");
        assert_eq!(license, "");
    }
}
