// Dependency Tracking
//
// Tracks dependencies between files for incremental compilation.

use crate::ngtsc::file_system::AbsoluteFsPath;
use indexmap::{IndexMap, IndexSet};
use std::collections::{HashSet, VecDeque};

#[derive(Debug, Clone, Default)]
struct FileNode {
    depends_on: IndexSet<AbsoluteFsPath>,
    uses_resources: IndexSet<AbsoluteFsPath>,
    failed_analysis: bool,
}

/// File dependency graph of one build.
///
/// Records which source files a file depends on and which resources (templates, styles)
/// it uses, so the next build can work out which files are affected by a change.
#[derive(Debug, Clone, Default)]
pub struct FileDependencyGraph {
    nodes: IndexMap<AbsoluteFsPath, FileNode>,
}

impl FileDependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `from` depends on `on`.
    pub fn add_dependency(&mut self, from: &AbsoluteFsPath, on: &AbsoluteFsPath) {
        self.node_for(from).depends_on.insert(on.clone());
    }

    /// Record that `from` uses the resource file `resource`.
    pub fn add_resource_dependency(&mut self, from: &AbsoluteFsPath, resource: &AbsoluteFsPath) {
        self.node_for(from).uses_resources.insert(resource.clone());
    }

    /// Record that the dependencies of `file` could not be determined. Such a file is
    /// treated as changed by the next build.
    pub fn record_dependency_analysis_failure(&mut self, file: &AbsoluteFsPath) {
        self.node_for(file).failed_analysis = true;
    }

    pub fn get_dependencies(&self, file: &AbsoluteFsPath) -> Vec<AbsoluteFsPath> {
        self.nodes
            .get(file)
            .map(|node| node.depends_on.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn get_resource_dependencies(&self, file: &AbsoluteFsPath) -> Vec<AbsoluteFsPath> {
        self.nodes
            .get(file)
            .map(|node| node.uses_resources.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, file: &AbsoluteFsPath) -> bool {
        self.nodes.contains_key(file)
    }

    pub fn files(&self) -> impl Iterator<Item = &AbsoluteFsPath> {
        self.nodes.keys()
    }

    /// All files that depend on `file`, directly or through other files.
    pub fn get_transitive_dependents(&self, file: &AbsoluteFsPath) -> HashSet<AbsoluteFsPath> {
        let mut seeds = HashSet::new();
        seeds.insert(file.clone());
        let mut dependents = self.propagate_to_dependents(seeds);
        dependents.remove(file);
        dependents
    }

    /// Fold the physical changes since the `previous` build into this (empty) graph.
    ///
    /// Returns the files of `previous` that are logically changed: changed or deleted
    /// themselves, depending on such a file directly or transitively, using a changed
    /// resource, or whose dependency analysis failed last time. Nodes of every other
    /// surviving file are copied over so that this graph starts from the known
    /// dependencies.
    pub fn update_with_physical_changes(
        &mut self,
        previous: &FileDependencyGraph,
        changed_ts_paths: &HashSet<AbsoluteFsPath>,
        deleted_ts_paths: &HashSet<AbsoluteFsPath>,
        changed_resources: &HashSet<AbsoluteFsPath>,
    ) -> HashSet<AbsoluteFsPath> {
        let directly_changed: HashSet<AbsoluteFsPath> = previous
            .nodes
            .iter()
            .filter(|(path, node)| {
                node.failed_analysis
                    || changed_ts_paths.contains(*path)
                    || deleted_ts_paths.contains(*path)
                    || node
                        .depends_on
                        .iter()
                        .any(|dep| changed_ts_paths.contains(dep) || deleted_ts_paths.contains(dep))
                    || node
                        .uses_resources
                        .iter()
                        .any(|resource| changed_resources.contains(resource))
            })
            .map(|(path, _)| path.clone())
            .collect();

        let mut seeds = directly_changed;
        seeds.extend(changed_ts_paths.iter().cloned());
        seeds.extend(deleted_ts_paths.iter().cloned());
        let mut logically_changed = previous.propagate_to_dependents(seeds);
        logically_changed.retain(|path| previous.nodes.contains_key(path));

        for (path, node) in &previous.nodes {
            if logically_changed.contains(path) || deleted_ts_paths.contains(path) {
                continue;
            }
            self.nodes.insert(
                path.clone(),
                FileNode {
                    depends_on: node.depends_on.clone(),
                    uses_resources: node.uses_resources.clone(),
                    failed_analysis: false,
                },
            );
        }

        tracing::debug!(
            logically_changed = logically_changed.len(),
            carried_over = self.nodes.len(),
            "dependency graph updated with physical changes"
        );
        logically_changed
    }

    /// Closure of `seeds` under the "is depended on by" relation.
    fn propagate_to_dependents(&self, seeds: HashSet<AbsoluteFsPath>) -> HashSet<AbsoluteFsPath> {
        let mut visited = seeds.clone();
        let mut queue: VecDeque<AbsoluteFsPath> = seeds.into_iter().collect();

        while let Some(current) = queue.pop_front() {
            for (path, node) in &self.nodes {
                if node.depends_on.contains(&current) && visited.insert(path.clone()) {
                    queue.push_back(path.clone());
                }
            }
        }

        visited
    }

    fn node_for(&mut self, file: &AbsoluteFsPath) -> &mut FileNode {
        self.nodes.entry(file.clone()).or_default()
    }
}
