// Semantic Graph
//
// Represents the semantic dependency graph between symbols and compares it against the
// graph of the previous build.

use super::api::{SemanticReference, SemanticSymbol};
use crate::ngtsc::file_system::AbsoluteFsPath;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::Arc;

/// All symbols of one build, grouped by declaring file.
#[derive(Debug, Clone, Default)]
pub struct SemanticDepGraph {
    files: IndexMap<AbsoluteFsPath, IndexMap<String, SemanticSymbol>>,
}

impl SemanticDepGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `symbol`. A later registration with the same identity replaces the
    /// earlier one.
    pub fn register_symbol(&mut self, symbol: SemanticSymbol) {
        self.files
            .entry(symbol.path.clone())
            .or_default()
            .insert(symbol.identifier.clone(), symbol);
    }

    pub fn get_symbol_by_name(&self, path: &AbsoluteFsPath, identifier: &str) -> Option<&SemanticSymbol> {
        self.files.get(path)?.get(identifier)
    }

    /// Finds the symbol in this graph that represents the same declaration as `symbol`.
    pub fn get_equivalent_symbol(&self, symbol: &SemanticSymbol) -> Option<&SemanticSymbol> {
        self.get_symbol_by_name(&symbol.path, &symbol.identifier)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &SemanticSymbol> {
        self.files.values().flat_map(|symbols| symbols.values())
    }

    pub fn files(&self) -> impl Iterator<Item = &AbsoluteFsPath> {
        self.files.keys()
    }

    pub fn len(&self) -> usize {
        self.files.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Files whose output must be regenerated, plus the graph to carry into the next build.
#[derive(Debug, Clone, Default)]
pub struct SemanticGraphChanges {
    pub needs_emit: HashSet<AbsoluteFsPath>,
    pub needs_type_check_emit: HashSet<AbsoluteFsPath>,
    pub new_graph: SemanticDepGraph,
}

/// Collects the symbols of the current build and, once analysis is done, compares them
/// with the previous build's graph.
pub struct SemanticDepGraphUpdater {
    prior_graph: Option<Arc<SemanticDepGraph>>,
    new_graph: SemanticDepGraph,
}

impl SemanticDepGraphUpdater {
    pub fn new(prior_graph: Option<Arc<SemanticDepGraph>>) -> Self {
        Self {
            prior_graph,
            new_graph: SemanticDepGraph::new(),
        }
    }

    pub fn register_symbol(&mut self, symbol: SemanticSymbol) {
        self.new_graph.register_symbol(symbol);
    }

    pub fn finalize(self) -> SemanticGraphChanges {
        let Some(prior_graph) = self.prior_graph else {
            // Without a prior graph there is nothing to compare against; the caller treats
            // every file as needing emit anyway.
            return SemanticGraphChanges {
                new_graph: self.new_graph,
                ..Default::default()
            };
        };

        let needs_emit = determine_invalidated_files(&self.new_graph, &prior_graph);
        let needs_type_check_emit =
            determine_invalidated_type_check_files(&self.new_graph, &prior_graph);
        tracing::debug!(
            needs_emit = needs_emit.len(),
            needs_type_check_emit = needs_type_check_emit.len(),
            "semantic graph compared with prior build"
        );

        SemanticGraphChanges {
            needs_emit,
            needs_type_check_emit,
            new_graph: self.new_graph,
        }
    }
}

fn determine_invalidated_files(
    new_graph: &SemanticDepGraph,
    prior_graph: &SemanticDepGraph,
) -> HashSet<AbsoluteFsPath> {
    let public_api_affected: HashSet<SemanticReference> = new_graph
        .symbols()
        .filter(|symbol| match prior_graph.get_equivalent_symbol(symbol) {
            Some(previous) => symbol.is_public_api_affected(previous),
            None => true,
        })
        .map(SemanticSymbol::reference)
        .collect();

    new_graph
        .symbols()
        .filter(|symbol| match prior_graph.get_equivalent_symbol(symbol) {
            Some(previous) => symbol.is_emit_affected(previous, &public_api_affected),
            None => true,
        })
        .map(|symbol| symbol.path.clone())
        .collect()
}

fn determine_invalidated_type_check_files(
    new_graph: &SemanticDepGraph,
    prior_graph: &SemanticDepGraph,
) -> HashSet<AbsoluteFsPath> {
    let type_check_api_affected: HashSet<SemanticReference> = new_graph
        .symbols()
        .filter(|symbol| match prior_graph.get_equivalent_symbol(symbol) {
            Some(previous) => symbol.is_type_check_api_affected(previous),
            None => true,
        })
        .map(SemanticSymbol::reference)
        .collect();

    new_graph
        .symbols()
        .filter(|symbol| match prior_graph.get_equivalent_symbol(symbol) {
            Some(previous) => {
                symbol.is_type_check_block_affected(previous, &type_check_api_affected)
            }
            None => true,
        })
        .map(|symbol| symbol.path.clone())
        .collect()
}
