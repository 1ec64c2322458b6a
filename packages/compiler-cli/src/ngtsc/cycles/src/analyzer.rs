use crate::ngtsc::cycles::src::imports::ImportGraph;
use crate::ngtsc::file_system::AbsoluteFsPath;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

/// Analyzes a `ts::Program` for cycles.
pub struct CycleAnalyzer {
    import_graph: ImportGraph,
    /// Memo of the most recent `from`. Replaced when `from` changes and dropped when a
    /// synthetic import is recorded.
    cached_results: RefCell<Option<CycleResults>>,
}

impl CycleAnalyzer {
    pub fn new(import_graph: ImportGraph) -> Self {
        Self {
            import_graph,
            cached_results: RefCell::new(None),
        }
    }

    pub fn import_graph(&self) -> &ImportGraph {
        &self.import_graph
    }

    /// Check for a cycle to be created in the program by adding an import between `from`
    /// and `to`.
    ///
    /// Returns a `Cycle` object if an import between `from` and `to` would create a
    /// cycle; `None` if no cycle would be created.
    pub fn would_create_cycle(&self, from: &AbsoluteFsPath, to: &AbsoluteFsPath) -> Option<Cycle> {
        let mut cache = self.cached_results.borrow_mut();
        let reuse = matches!(&*cache, Some(results) if &results.from == from);
        if !reuse {
            *cache = Some(CycleResults::new(from.clone()));
        }
        let results = cache.as_mut()?;

        // Import of 'from' -> 'to' is illegal if an edge 'to' -> 'from' already exists.
        if results.would_be_cyclic(to, &self.import_graph) {
            tracing::debug!(%from, %to, "import would create a cycle");
            Some(Cycle::new(&self.import_graph, from.clone(), to.clone()))
        } else {
            None
        }
    }

    /// Record a synthetic import from `from` to `to`.
    ///
    /// This is an import that doesn't exist in the program but will be considered as part
    /// of the import graph for the purpose of detecting cycles.
    pub fn record_synthetic_import(&self, from: &AbsoluteFsPath, to: &AbsoluteFsPath) {
        self.cached_results.replace(None);
        self.import_graph.add_synthetic_import(from, to);
    }
}

/// Represents an import cycle between `from` and `to` in the program.
#[derive(Debug, Clone, PartialEq)]
pub struct Cycle {
    pub from: AbsoluteFsPath,
    pub to: AbsoluteFsPath,
    path: Vec<AbsoluteFsPath>,
}

impl Cycle {
    fn new(import_graph: &ImportGraph, from: AbsoluteFsPath, to: AbsoluteFsPath) -> Self {
        let path = std::iter::once(from.clone())
            .chain(import_graph.find_path(&to, &from).unwrap_or_default())
            .collect();
        Self { from, to, path }
    }

    /// The files in the cycle, starting and ending with `from`.
    pub fn get_path(&self) -> &[AbsoluteFsPath] {
        &self.path
    }
}

#[derive(Clone, Copy, PartialEq)]
enum CycleState {
    Cyclic,
    Acyclic,
}

/// Per-`from` memo of which files can reach `from`.
struct CycleResults {
    from: AbsoluteFsPath,
    results: HashMap<AbsoluteFsPath, CycleState>,
}

impl CycleResults {
    fn new(from: AbsoluteFsPath) -> Self {
        Self {
            from,
            results: HashMap::new(),
        }
    }

    fn would_be_cyclic(&mut self, sf: &AbsoluteFsPath, graph: &ImportGraph) -> bool {
        let mut visited = HashSet::new();
        let cyclic = self.search(sf, graph, &mut visited);
        if !cyclic {
            // The search exhausted everything reachable from `sf`, so none of it reaches
            // `from`.
            for file in visited {
                self.results.insert(file, CycleState::Acyclic);
            }
        }
        cyclic
    }

    fn search(
        &mut self,
        sf: &AbsoluteFsPath,
        graph: &ImportGraph,
        visited: &mut HashSet<AbsoluteFsPath>,
    ) -> bool {
        match self.results.get(sf) {
            Some(CycleState::Cyclic) => return true,
            Some(CycleState::Acyclic) => return false,
            None => {}
        }
        if sf == &self.from {
            return true;
        }
        if !visited.insert(sf.clone()) {
            return false;
        }

        for imported in graph.imports_of(sf) {
            if self.search(&imported, graph, visited) {
                // Only files on the path found are known to reach `from`; other visited
                // files stay undecided.
                self.results.insert(sf.clone(), CycleState::Cyclic);
                return true;
            }
        }
        false
    }
}
