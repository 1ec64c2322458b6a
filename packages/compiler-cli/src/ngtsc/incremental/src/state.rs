// Incremental State
//
// The snapshot one compilation leaves behind for the next.

use super::api::FileVersions;
use super::dependency_tracking::FileDependencyGraph;
use crate::ngtsc::file_system::AbsoluteFsPath;
use crate::ngtsc::incremental::semantic_graph::SemanticDepGraph;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementalStateKind {
    Fresh,
    Delta,
    Analyzed,
}

impl IncrementalStateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IncrementalStateKind::Fresh => "Fresh",
            IncrementalStateKind::Delta => "Delta",
            IncrementalStateKind::Analyzed => "Analyzed",
        }
    }
}

impl fmt::Display for IncrementalStateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of an incremental compilation.
///
/// States are shared through `Arc`: building a new state never mutates an old one, so a
/// snapshot handed out earlier stays valid for inspection.
pub enum IncrementalState<A, T> {
    /// No usable prior build.
    Fresh,
    /// Changes accumulated on top of the last analyzed build that have not been folded
    /// into a new analysis yet.
    Delta(Arc<DeltaIncrementalState<A, T>>),
    /// A complete, queryable snapshot.
    Analyzed(Arc<AnalyzedIncrementalState<A, T>>),
}

impl<A, T> IncrementalState<A, T> {
    pub fn kind(&self) -> IncrementalStateKind {
        match self {
            IncrementalState::Fresh => IncrementalStateKind::Fresh,
            IncrementalState::Delta(_) => IncrementalStateKind::Delta,
            IncrementalState::Analyzed(_) => IncrementalStateKind::Analyzed,
        }
    }

    /// The last analyzed snapshot reachable from this state.
    pub fn last_analyzed(&self) -> Option<&Arc<AnalyzedIncrementalState<A, T>>> {
        match self {
            IncrementalState::Fresh => None,
            IncrementalState::Delta(delta) => Some(&delta.last_analyzed_state),
            IncrementalState::Analyzed(analyzed) => Some(analyzed),
        }
    }
}

impl<A, T> Clone for IncrementalState<A, T> {
    fn clone(&self) -> Self {
        match self {
            IncrementalState::Fresh => IncrementalState::Fresh,
            IncrementalState::Delta(delta) => IncrementalState::Delta(Arc::clone(delta)),
            IncrementalState::Analyzed(analyzed) => {
                IncrementalState::Analyzed(Arc::clone(analyzed))
            }
        }
    }
}

impl<A, T> fmt::Debug for IncrementalState<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IncrementalState::{}", self.kind())
    }
}

/// Everything the next build may reuse.
pub struct AnalyzedIncrementalState<A, T> {
    pub versions: Option<FileVersions>,
    /// Dependencies recorded during this build.
    pub dep_graph: FileDependencyGraph,
    pub semantic_dep_graph: Arc<SemanticDepGraph>,
    /// Analysis results per source file.
    pub prior_analysis: HashMap<AbsoluteFsPath, A>,
    /// Type-checking results per source file, once type-checking completed.
    pub type_check_results: Option<HashMap<AbsoluteFsPath, T>>,
    /// Files whose emit output is up to date.
    pub emitted: HashSet<AbsoluteFsPath>,
}

impl<A: Clone, T: Clone> Clone for AnalyzedIncrementalState<A, T> {
    fn clone(&self) -> Self {
        Self {
            versions: self.versions.clone(),
            dep_graph: self.dep_graph.clone(),
            semantic_dep_graph: Arc::clone(&self.semantic_dep_graph),
            prior_analysis: self.prior_analysis.clone(),
            type_check_results: self.type_check_results.clone(),
            emitted: self.emitted.clone(),
        }
    }
}

/// Physical changes not yet folded into an analysis.
pub struct DeltaIncrementalState<A, T> {
    pub physically_changed_ts_files: HashSet<AbsoluteFsPath>,
    pub changed_resource_files: HashSet<AbsoluteFsPath>,
    pub last_analyzed_state: Arc<AnalyzedIncrementalState<A, T>>,
}
