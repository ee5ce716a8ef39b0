//! Typed dependency DAG over package identifiers (C3).
//!
//! Unlike a registry-backed resolver, this graph never fetches anything: it
//! is an explicit, caller-populated DAG with cycle detection, topological
//! sort, transitive closure, and a work-stealing parallel traversal.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

use lithium_core::{Error, Result};
use lithium_manifest::PackageId;
use lithium_version::{Constraint, Version};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

#[derive(Debug, Default, Clone)]
struct NodeData {
    version: Option<Version>,
    /// Insertion-ordered outgoing edges: this node's dependencies.
    outgoing: Vec<(PackageId, Constraint)>,
    /// Nodes that depend on this one.
    incoming: HashSet<PackageId>,
}

/// A dependency DAG. Node insertion order is preserved and used as the
/// tie-break in [`DependencyGraph::topological_sort`].
#[derive(Debug, Default)]
pub struct DependencyGraph {
    nodes: HashMap<PackageId, NodeData>,
    insertion_order: Vec<PackageId>,
}

impl DependencyGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node, or updates its version if already present.
    pub fn add_node(&mut self, id: impl Into<PackageId>, version: Version) {
        let id = id.into();
        if !self.nodes.contains_key(&id) {
            self.insertion_order.push(id.clone());
        }
        self.nodes.entry(id).or_default().version = Some(version);
    }

    fn ensure_node(&mut self, id: &PackageId) {
        if !self.nodes.contains_key(id) {
            self.insertion_order.push(id.clone());
            self.nodes.insert(id.clone(), NodeData::default());
        }
    }

    /// Records an edge `from -> to` meaning "`from` depends on `to` under
    /// `constraint`". Fails with [`Error::VersionConflict`] if `to`'s
    /// version is already known and does not satisfy `constraint` (I2).
    ///
    /// # Errors
    /// Returns [`Error::VersionConflict`] per I2.
    pub fn add_edge(
        &mut self,
        from: impl Into<PackageId>,
        to: impl Into<PackageId>,
        constraint: Constraint,
    ) -> Result<()> {
        let from = from.into();
        let to = to.into();
        self.ensure_node(&from);
        self.ensure_node(&to);

        if let Some(version) = self.nodes[&to].version.clone() {
            if !constraint.matches(&version) {
                return Err(Error::version_conflict(
                    &from,
                    &to,
                    version.to_string(),
                    constraint.to_string(),
                ));
            }
        }

        let from_node = self.nodes.get_mut(&from).expect("ensured above");
        if !from_node.outgoing.iter().any(|(id, _)| id == &to) {
            from_node.outgoing.push((to.clone(), constraint));
        }
        self.nodes.get_mut(&to).expect("ensured above").incoming.insert(from);
        Ok(())
    }

    /// Removes a node and every incident edge (I1 is preserved).
    pub fn remove_node(&mut self, id: &str) {
        if self.nodes.remove(id).is_none() {
            return;
        }
        self.insertion_order.retain(|n| n != id);
        for node in self.nodes.values_mut() {
            node.outgoing.retain(|(target, _)| target != id);
            node.incoming.remove(id);
        }
    }

    pub fn remove_edge(&mut self, from: &str, to: &str) {
        if let Some(node) = self.nodes.get_mut(from) {
            node.outgoing.retain(|(target, _)| target != to);
        }
        if let Some(node) = self.nodes.get_mut(to) {
            node.incoming.remove(from);
        }
    }

    #[must_use]
    pub fn has_cycle(&self) -> bool {
        let mut colors: HashMap<&str, Color> = HashMap::new();
        for id in &self.insertion_order {
            colors.insert(id, Color::White);
        }
        for id in &self.insertion_order {
            if colors[id.as_str()] == Color::White && self.visit_has_cycle(id, &mut colors) {
                return true;
            }
        }
        false
    }

    fn visit_has_cycle<'a>(&'a self, id: &'a str, colors: &mut HashMap<&'a str, Color>) -> bool {
        colors.insert(id, Color::Gray);
        if let Some(node) = self.nodes.get(id) {
            for (target, _) in &node.outgoing {
                match colors.get(target.as_str()).copied().unwrap_or(Color::White) {
                    Color::Gray => return true,
                    Color::White => {
                        if self.visit_has_cycle(target, colors) {
                            return true;
                        }
                    }
                    Color::Black => {}
                }
            }
        }
        colors.insert(id, Color::Black);
        false
    }

    /// DFS with white/gray/black coloring, tie-broken by insertion order.
    /// Returns `None` if a cycle exists (P5). On success, the order places
    /// every node after all of its dependencies (dependencies load first),
    /// so for edge `from -> to`, `to` precedes `from` in the result (P4).
    #[must_use]
    pub fn topological_sort(&self) -> Option<Vec<PackageId>> {
        let mut colors: HashMap<&str, Color> = HashMap::new();
        for id in &self.insertion_order {
            colors.insert(id, Color::White);
        }
        let mut order = Vec::with_capacity(self.insertion_order.len());
        for id in &self.insertion_order {
            if colors[id.as_str()] == Color::White
                && !self.visit_topo(id, &mut colors, &mut order)
            {
                return None;
            }
        }
        Some(order)
    }

    fn visit_topo<'a>(
        &'a self,
        id: &'a str,
        colors: &mut HashMap<&'a str, Color>,
        order: &mut Vec<PackageId>,
    ) -> bool {
        colors.insert(id, Color::Gray);
        if let Some(node) = self.nodes.get(id) {
            for (target, _) in &node.outgoing {
                match colors.get(target.as_str()).copied().unwrap_or(Color::White) {
                    Color::Gray => return false,
                    Color::White => {
                        if !self.visit_topo(target, colors, order) {
                            return false;
                        }
                    }
                    Color::Black => {}
                }
            }
        }
        colors.insert(id, Color::Black);
        order.push(id.to_string());
        true
    }

    #[must_use]
    pub fn direct_dependencies(&self, id: &str) -> HashSet<PackageId> {
        self.nodes
            .get(id)
            .map(|n| n.outgoing.iter().map(|(t, _)| t.clone()).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn direct_dependents(&self, id: &str) -> HashSet<PackageId> {
        self.nodes.get(id).map(|n| n.incoming.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn transitive_dependencies(&self, id: &str) -> HashSet<PackageId> {
        let mut seen = HashSet::new();
        let mut stack = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                for (target, _) in &node.outgoing {
                    if seen.insert(target.clone()) {
                        stack.push(target.clone());
                    }
                }
            }
        }
        seen.remove(id);
        seen
    }

    /// Invokes `f(id)` for every node, guaranteeing no node runs until all
    /// of its dependencies (outgoing targets) have completed. `workers`
    /// controls the rayon pool size; `1` is a legal, fully sequential
    /// choice.
    ///
    /// # Errors
    /// Returns an error if building the worker pool fails, or propagates
    /// the first panic-free error `f` returns after every already-started
    /// node finishes.
    pub fn traverse_in_parallel<F>(&self, workers: usize, f: F) -> Result<()>
    where
        F: Fn(&PackageId) -> Result<()> + Send + Sync,
    {
        let total = self.insertion_order.len();
        if total == 0 {
            return Ok(());
        }

        struct State {
            pending: HashMap<PackageId, usize>,
            ready: VecDeque<PackageId>,
            completed: usize,
            first_error: Option<Error>,
        }

        let mut pending = HashMap::new();
        let mut ready = VecDeque::new();
        for id in &self.insertion_order {
            let count = self.nodes[id].outgoing.len();
            pending.insert(id.clone(), count);
            if count == 0 {
                ready.push_back(id.clone());
            }
        }

        let state = Arc::new(Mutex::new(State {
            pending,
            ready,
            completed: 0,
            first_error: None,
        }));

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .build()
            .map_err(|e| Error::parse("graph", "traverse_in_parallel", e.to_string()))?;

        pool.scope(|scope| {
            for _ in 0..workers.max(1) {
                let state = Arc::clone(&state);
                let f = &f;
                scope.spawn(move |_| loop {
                    let id = {
                        let mut guard = state.lock().expect("state mutex poisoned");
                        if guard.completed >= total {
                            return;
                        }
                        match guard.ready.pop_front() {
                            Some(id) => id,
                            None => {
                                drop(guard);
                                std::thread::yield_now();
                                continue;
                            }
                        }
                    };

                    let result = f(&id);

                    let mut guard = state.lock().expect("state mutex poisoned");
                    guard.completed += 1;
                    if let Err(e) = result {
                        if guard.first_error.is_none() {
                            guard.first_error = Some(e);
                        }
                    }
                    if let Some(node) = self.nodes.get(&id) {
                        for dependent in &node.incoming {
                            if let Some(remaining) = guard.pending.get_mut(dependent) {
                                *remaining -= 1;
                                if *remaining == 0 {
                                    guard.ready.push_back(dependent.clone());
                                }
                            }
                        }
                    }
                });
            }
        });

        let mut guard = state.lock().expect("state mutex poisoned");
        guard.first_error.take().map_or(Ok(()), Err)
    }

    /// Parses every manifest in `dirs`, registers nodes and edges, and
    /// returns the topological load order, deduplicated. Returns an empty
    /// list if a cycle or version conflict is detected.
    ///
    /// # Errors
    /// Propagates manifest parse errors (malformed manifests are fatal,
    /// distinct from the cycle/conflict empty-list behavior).
    pub fn resolve_directories(dirs: &[impl AsRef<Path>]) -> Result<Vec<PackageId>> {
        let mut graph = Self::new();
        let mut records = Vec::new();
        for dir in dirs {
            let (id, record) = parse_manifest_in_dir(dir.as_ref())?;
            graph.add_node(id.clone(), record.version.clone());
            records.push(record);
        }
        for record in &records {
            for (dep_name, constraint) in &record.dependencies {
                if graph.add_edge(&record.id, dep_name, constraint.clone()).is_err() {
                    return Ok(Vec::new());
                }
            }
        }
        Ok(graph.topological_sort().unwrap_or_default())
    }

    /// Joins `system:`-prefixed requirements across every manifest in
    /// `dirs`. When the same logical dependency is requested by more than
    /// one manifest, the last one parsed wins (deliberate choice; see
    /// DESIGN.md).
    ///
    /// # Errors
    /// Propagates manifest parse errors.
    pub fn resolve_system_dependencies(
        dirs: &[impl AsRef<Path>],
    ) -> Result<HashMap<String, Constraint>> {
        let mut joined = HashMap::new();
        for dir in dirs {
            let (_, record) = parse_manifest_in_dir(dir.as_ref())?;
            for (name, constraint) in record.system_deps {
                joined.insert(name, constraint);
            }
        }
        Ok(joined)
    }
}

fn parse_manifest_in_dir(dir: &Path) -> Result<(PackageId, lithium_manifest::PackageRecord)> {
    for candidate in ["package.json", "package.xml", "package.yaml"] {
        let path = dir.join(candidate);
        if path.exists() {
            return lithium_manifest::parse(&path);
        }
    }
    Err(Error::parse(
        "manifest",
        dir.display().to_string(),
        "no package.json/xml/yaml found",
    ))
}
