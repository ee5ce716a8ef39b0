//! Top-level component lifecycle manager (C9).
//!
//! Drives the full addon lifecycle: manifest discovery (C2), dependency
//! resolution (C3), dynamic loading (C8), and ordered
//! `initialize`/`destroy` of component instances. Fields are kept private
//! behind accessor methods, mirroring the original's PIMPL split between
//! `ComponentManager` and `ComponentManagerImpl`.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lithium_core::{Error, Result};
use lithium_graph::DependencyGraph;
use lithium_loader::ModuleLoader;
use lithium_manifest::{PackageId, PackageRecord};
use lithium_version::Version;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

pub type ComponentId = String;

/// `{shared, standalone, executable}` per §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentKind {
    Shared,
    Standalone,
    Executable,
}

/// A declared component within an addon's manifest.
#[derive(Debug, Clone)]
pub struct ComponentEntry {
    pub name: ComponentId,
    pub entry_symbol: String,
    pub kind: ComponentKind,
    pub addon_id: PackageId,
    pub module_path: PathBuf,
    pub dependencies: Vec<ComponentId>,
}

/// A running component instance's lifecycle hooks. Real addons implement
/// this behind their dynamic artifact's factory symbol; this workspace
/// treats the factory as a Rust closure registered ahead of load time
/// (see [`ComponentManager::register_factory`]), since invoking an
/// arbitrary C ABI factory safely requires the addon to agree on a vtable
/// shape out of scope for this crate.
pub trait Component: Send + Sync {
    fn initialize(&mut self, config: &serde_json::Value) -> Result<()>;
    fn destroy(&mut self) -> Result<()>;
    fn doc(&self) -> String {
        String::new()
    }
}

pub type ComponentFactory = Box<dyn Fn() -> Box<dyn Component> + Send + Sync>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockedDependency {
    pub name: ComponentId,
    pub version: Version,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockedComponent {
    pub name: ComponentId,
    pub version: Version,
    pub dependencies: Vec<LockedDependency>,
}

struct LoadedComponent {
    entry: ComponentEntry,
    instance: Box<dyn Component>,
}

/// `check_component`: verifies a dynamic artifact exists at `module_path`
/// (with the platform extension), that a sibling `package.json` manifest
/// exists, and that the named symbol is resolvable once loaded.
pub fn check_component(loader: &ModuleLoader, module_name: &str, module_path: &Path) -> bool {
    let artifact = module_path.with_extension(lithium_loader::platform_extension());
    if !artifact.is_file() {
        return false;
    }
    if !module_path.with_file_name("package.json").is_file() {
        return false;
    }
    if !loader.has(module_name) && !loader.load(&artifact, module_name) {
        return false;
    }
    true
}

struct Inner {
    addon_root: PathBuf,
    graph: DependencyGraph,
    records: HashMap<PackageId, PackageRecord>,
    entries: HashMap<ComponentId, ComponentEntry>,
    factories: HashMap<String, ComponentFactory>,
    loaded: HashMap<ComponentId, LoadedComponent>,
}

/// Top-level component manager for one addon root.
pub struct ComponentManager {
    loader: Arc<ModuleLoader>,
    inner: RwLock<Inner>,
}

impl std::fmt::Debug for ComponentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("ComponentManager")
            .field("addon_root", &inner.addon_root)
            .field("loaded", &inner.loaded.len())
            .finish()
    }
}

impl ComponentManager {
    pub fn new(addon_root: impl Into<PathBuf>) -> Self {
        Self {
            loader: Arc::new(ModuleLoader::new()),
            inner: RwLock::new(Inner {
                addon_root: addon_root.into(),
                graph: DependencyGraph::new(),
                records: HashMap::new(),
                entries: HashMap::new(),
                factories: HashMap::new(),
                loaded: HashMap::new(),
            }),
        }
    }

    /// Registers a component factory under `entry_symbol`, standing in for
    /// a dynamic artifact's exported factory function.
    pub fn register_factory(&self, entry_symbol: &str, factory: ComponentFactory) {
        self.inner.write().factories.insert(entry_symbol.to_string(), factory);
    }

    /// Step 1-2 of `initialize`: enumerates addon subdirectories of
    /// `addon_root`, parses each manifest, and registers the addon and its
    /// declared modules as load candidates. Returns the discovered addon
    /// ids without loading anything.
    pub fn scan(&self, path: &Path) -> Result<Vec<PackageId>> {
        let mut discovered = Vec::new();
        let entries = std::fs::read_dir(path).map_err(|e| Error::io(path.to_path_buf(), e))?;
        let mut inner = self.inner.write();
        for entry in entries.flatten() {
            let dir = entry.path();
            if !dir.is_dir() {
                continue;
            }
            let Some((id, record)) = try_parse_manifest(&dir) else {
                continue;
            };
            inner.graph.add_node(&id, record.version.clone());
            for (dep, constraint) in &record.dependencies {
                if inner.graph.add_edge(&id, dep, constraint.clone()).is_err() {
                    tracing::warn!(addon = %id, dep = %dep, "dependency edge conflict during scan");
                }
            }
            for module in &record.modules {
                let component_id = format!("{id}::{module}");
                inner.entries.insert(
                    component_id.clone(),
                    ComponentEntry {
                        name: component_id,
                        entry_symbol: module.clone(),
                        kind: ComponentKind::Shared,
                        addon_id: id.clone(),
                        module_path: dir.join(module),
                        dependencies: record.dependencies.keys().cloned().collect(),
                    },
                );
            }
            discovered.push(id.clone());
            inner.records.insert(id, record);
        }
        Ok(discovered)
    }

    /// Full initialize algorithm: scan, resolve topological order over the
    /// addon graph (abort on cycle or unsatisfied version), then walk the
    /// order loading, instantiating, and initializing each component.
    pub fn initialize(&self) -> Result<()> {
        let addon_root = self.inner.read().addon_root.clone();
        self.scan(&addon_root)?;
        let order = {
            let inner = self.inner.read();
            if inner.graph.has_cycle() {
                return Err(Error::cycle("addon graph"));
            }
            inner.graph.topological_sort().unwrap_or_default()
        };
        for addon_id in &order {
            let components: Vec<ComponentId> = {
                let inner = self.inner.read();
                inner
                    .entries
                    .values()
                    .filter(|e| &e.addon_id == addon_id)
                    .map(|e| e.name.clone())
                    .collect()
            };
            for component_id in components {
                self.load_component(&component_id)?;
            }
        }
        Ok(())
    }

    /// `load_component`: performs steps 3-5 for a single component. Fails
    /// with [`Error::Cycle`]-free I3 enforcement: every dependency entry
    /// must already be loaded.
    pub fn load_component(&self, name: &ComponentId) -> Result<()> {
        if self.inner.read().loaded.contains_key(name) {
            return Ok(());
        }
        let entry = {
            let inner = self.inner.read();
            inner
                .entries
                .get(name)
                .cloned()
                .ok_or_else(|| Error::parse("component", name.clone(), "unknown component"))?
        };
        // I3: every addon this component depends on must already have at
        // least one of its components loaded.
        {
            let inner = self.inner.read();
            for dep_addon in &entry.dependencies {
                let satisfied = inner
                    .loaded
                    .keys()
                    .any(|loaded| inner.entries.get(loaded).is_some_and(|e| &e.addon_id == dep_addon));
                if !satisfied && inner.records.contains_key(dep_addon) {
                    return Err(Error::parse(
                        "component",
                        name.clone(),
                        format!("dependency addon `{dep_addon}` is not loaded"),
                    ));
                }
            }
        }
        if !self.loader.has(&entry.addon_id) {
            let artifact = entry.module_path.with_extension(lithium_loader::platform_extension());
            if artifact.is_file() {
                self.loader.load(&artifact, &entry.addon_id);
            }
        }
        let factory = self.inner.read().factories.get(&entry.entry_symbol).is_some();
        if !factory {
            return Err(Error::load_failure(name.clone(), "no registered factory for entry symbol"));
        }
        let mut instance = {
            let inner = self.inner.read();
            (inner.factories[&entry.entry_symbol])()
        };
        instance.initialize(&serde_json::Value::Null)?;
        self.inner.write().loaded.insert(name.clone(), LoadedComponent { entry, instance });
        Ok(())
    }

    /// Reverses steps 5->3 for one component; fails with
    /// [`Error::InUse`] if any loaded component still depends on it,
    /// unless `forced` is set.
    pub fn unload_component(&self, name: &ComponentId, forced: bool) -> Result<()> {
        if !forced {
            let still_needed = {
                let inner = self.inner.read();
                inner.loaded.values().any(|c| c.entry.dependencies.iter().any(|d| d == name))
            };
            if still_needed {
                return Err(Error::InUse { name: name.clone() });
            }
        }
        let mut inner = self.inner.write();
        if let Some(mut loaded) = inner.loaded.remove(name) {
            loaded.instance.destroy()?;
            Ok(())
        } else {
            Err(Error::parse("component", name.clone(), "unknown component"))
        }
    }

    /// Unload followed by load; preserves dependents if the new load
    /// succeeds.
    pub fn reload_component(&self, name: &ComponentId) -> Result<()> {
        self.unload_component(name, true)?;
        self.load_component(name)
    }

    /// Reloads every loaded component in topological order.
    pub fn reload_all(&self) -> Result<()> {
        let order = self.inner.read().graph.topological_sort().unwrap_or_default();
        for addon_id in &order {
            let components: Vec<ComponentId> = {
                let inner = self.inner.read();
                inner.loaded.keys().filter(|k| inner.entries.get(*k).is_some_and(|e| &e.addon_id == addon_id)).cloned().collect()
            };
            for component_id in components {
                self.reload_component(&component_id)?;
            }
        }
        Ok(())
    }

    pub fn has(&self, name: &ComponentId) -> bool {
        self.inner.read().loaded.contains_key(name)
    }

    pub fn get_info(&self, addon_id: &PackageId) -> Option<PackageRecord> {
        self.inner.read().records.get(addon_id).cloned()
    }

    pub fn list(&self) -> Vec<ComponentId> {
        self.inner.read().loaded.keys().cloned().collect()
    }

    pub fn doc(&self, name: &ComponentId) -> Option<String> {
        self.inner.read().loaded.get(name).map(|c| c.instance.doc())
    }

    /// `destroy`: reverses `initialize` — calls `destroy()` on each
    /// instance in reverse topological order, unregisters, closes modules.
    pub fn destroy(&self) -> Result<()> {
        let order = self.inner.read().graph.topological_sort().unwrap_or_default();
        for addon_id in order.iter().rev() {
            let components: Vec<ComponentId> = {
                let inner = self.inner.read();
                inner.loaded.keys().filter(|k| inner.entries.get(*k).is_some_and(|e| &e.addon_id == addon_id)).cloned().collect()
            };
            for component_id in components {
                self.unload_component(&component_id, true)?;
            }
        }
        self.loader.unload_all();
        Ok(())
    }

    /// Writes the effective resolved graph and versions to a lockfile,
    /// using a `BTreeMap` for deterministic key ordering.
    pub fn save_package_lock(&self, file: &Path) -> Result<()> {
        let inner = self.inner.read();
        let order = inner.graph.topological_sort().unwrap_or_default();
        let mut locked: BTreeMap<String, LockedComponent> = BTreeMap::new();
        for id in &order {
            let Some(record) = inner.records.get(id) else { continue };
            let dependencies = record
                .dependencies
                .iter()
                .filter_map(|(dep_name, _)| {
                    inner.records.get(dep_name).map(|dep_record| LockedDependency {
                        name: dep_name.clone(),
                        version: dep_record.version.clone(),
                    })
                })
                .collect();
            locked.insert(id.clone(), LockedComponent { name: id.clone(), version: record.version.clone(), dependencies });
        }
        let text = serde_json::to_string_pretty(&locked)
            .map_err(|e| Error::parse("lockfile", file.display().to_string(), e.to_string()))?;
        std::fs::write(file, text).map_err(|e| Error::io(file.to_path_buf(), e))
    }
}

fn try_parse_manifest(dir: &Path) -> Option<(PackageId, PackageRecord)> {
    for candidate in ["package.json", "package.xml", "package.yaml"] {
        let path = dir.join(candidate);
        if path.is_file() {
            return lithium_manifest::parse(&path).ok();
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingComponent {
        log: Arc<AtomicUsize>,
    }

    impl Component for CountingComponent {
        fn initialize(&mut self, _config: &serde_json::Value) -> Result<()> {
            self.log.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn destroy(&mut self) -> Result<()> {
            self.log.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn write_manifest(dir: &Path, name: &str, modules: &[&str]) {
        std::fs::create_dir_all(dir).unwrap();
        let modules_json: Vec<String> = modules.iter().map(|m| format!("\"{m}\"")).collect();
        std::fs::write(
            dir.join("package.json"),
            format!(
                r#"{{"name": "{name}", "version": "1.0.0", "modules": [{}]}}"#,
                modules_json.join(",")
            ),
        )
        .unwrap();
    }

    #[test]
    fn scan_discovers_addon_manifests() {
        let root = tempfile::tempdir().unwrap();
        write_manifest(&root.path().join("scope.focuser"), "scope:focuser", &[]);
        let manager = ComponentManager::new(root.path());
        let discovered = manager.scan(root.path()).unwrap();
        assert_eq!(discovered, vec!["scope:focuser".to_string()]);
    }

    #[test]
    fn load_component_fails_without_registered_factory() {
        let root = tempfile::tempdir().unwrap();
        write_manifest(&root.path().join("scope.focuser"), "scope:focuser", &["driver"]);
        let manager = ComponentManager::new(root.path());
        manager.scan(root.path()).unwrap();
        let result = manager.load_component(&"scope:focuser::driver".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn load_component_succeeds_with_registered_factory() {
        let root = tempfile::tempdir().unwrap();
        write_manifest(&root.path().join("scope.focuser"), "scope:focuser", &["driver"]);
        let manager = ComponentManager::new(root.path());
        manager.scan(root.path()).unwrap();

        let log = Arc::new(AtomicUsize::new(0));
        let log_clone = Arc::clone(&log);
        manager.register_factory("driver", Box::new(move || {
            Box::new(CountingComponent { log: Arc::clone(&log_clone) }) as Box<dyn Component>
        }));

        manager.load_component(&"scope:focuser::driver".to_string()).unwrap();
        assert_eq!(log.load(Ordering::SeqCst), 1);
        assert!(manager.has(&"scope:focuser::driver".to_string()));
    }

    #[test]
    fn unload_component_runs_destroy() {
        let root = tempfile::tempdir().unwrap();
        write_manifest(&root.path().join("scope.focuser"), "scope:focuser", &["driver"]);
        let manager = ComponentManager::new(root.path());
        manager.scan(root.path()).unwrap();

        let log = Arc::new(AtomicUsize::new(0));
        let log_clone = Arc::clone(&log);
        manager.register_factory("driver", Box::new(move || {
            Box::new(CountingComponent { log: Arc::clone(&log_clone) }) as Box<dyn Component>
        }));

        let id = "scope:focuser::driver".to_string();
        manager.load_component(&id).unwrap();
        manager.unload_component(&id, false).unwrap();
        assert_eq!(log.load(Ordering::SeqCst), 0);
        assert!(!manager.has(&id));
    }

    #[test]
    fn save_package_lock_writes_deterministic_json() {
        let root = tempfile::tempdir().unwrap();
        write_manifest(&root.path().join("scope.core"), "scope:core", &[]);
        let manager = ComponentManager::new(root.path());
        manager.scan(root.path()).unwrap();
        let lock_path = root.path().join("package-lock.json");
        manager.save_package_lock(&lock_path).unwrap();
        let text = std::fs::read_to_string(&lock_path).unwrap();
        assert!(text.contains("scope:core"));
    }
}
