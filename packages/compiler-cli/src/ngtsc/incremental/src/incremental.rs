// Incremental Compilation
//
// Drives one compilation's transitions through the incremental states and answers reuse
// questions about the previous build.

use super::api::{FileVersions, IncrementalBuild, IncrementalError, ReusableTypeCheckData};
use super::dependency_tracking::FileDependencyGraph;
use super::state::{AnalyzedIncrementalState, DeltaIncrementalState, IncrementalState};
use crate::ngtsc::file_system::AbsoluteFsPath;
use crate::ngtsc::incremental::semantic_graph::SemanticDepGraphUpdater;
use crate::ngtsc::shims::is_shim;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use ts::Program;

const ANALYSIS: &str = "Analysis";
const TYPE_CHECK_AND_EMIT: &str = "TypeCheckAndEmit";

enum Phase {
    /// Analysis is running; semantic symbols are being collected.
    Analysis {
        semantic_dep_graph_updater: SemanticDepGraphUpdater,
    },
    /// Analysis completed; type-checking and emit may reuse prior results.
    TypeCheckAndEmit {
        needs_emit: HashSet<AbsoluteFsPath>,
        needs_type_check_emit: HashSet<AbsoluteFsPath>,
    },
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Analysis { .. } => ANALYSIS,
            Phase::TypeCheckAndEmit { .. } => TYPE_CHECK_AND_EMIT,
        }
    }
}

/// What the current compilation knows about the build it continues from.
struct IncrementalStep<A, T> {
    prior_state: Arc<AnalyzedIncrementalState<A, T>>,
    logically_changed_ts_files: HashSet<AbsoluteFsPath>,
}

/// Manages the incremental portion of one compilation.
///
/// `A` is the per-file analysis record, `T` the per-file type-checking data.
pub struct IncrementalCompilation<A, T> {
    phase: Phase,
    state: IncrementalState<A, T>,
    dep_graph: FileDependencyGraph,
    versions: Option<FileVersions>,
    step: Option<IncrementalStep<A, T>>,
}

impl<A: Clone, T: ReusableTypeCheckData> IncrementalCompilation<A, T> {
    fn new(
        state: IncrementalState<A, T>,
        dep_graph: FileDependencyGraph,
        versions: Option<FileVersions>,
        step: Option<IncrementalStep<A, T>>,
    ) -> Self {
        let prior_graph = step
            .as_ref()
            .map(|step| Arc::clone(&step.prior_state.semantic_dep_graph));
        Self {
            phase: Phase::Analysis {
                semantic_dep_graph_updater: SemanticDepGraphUpdater::new(prior_graph),
            },
            state,
            dep_graph,
            versions,
            step,
        }
    }

    /// Begin a compilation with no prior state.
    pub fn fresh(versions: Option<FileVersions>) -> Self {
        tracing::debug!("starting fresh incremental compilation");
        Self::new(IncrementalState::Fresh, FileDependencyGraph::new(), versions, None)
    }

    /// Begin a compilation that continues from `old_state`, given the files that changed
    /// physically since then.
    ///
    /// A change to any declaration file cannot be bounded, so it falls back to `fresh`.
    pub fn incremental(
        old_state: &IncrementalState<A, T>,
        new_versions: Option<FileVersions>,
        changed_ts_files: impl IntoIterator<Item = AbsoluteFsPath>,
        deleted_ts_files: impl IntoIterator<Item = AbsoluteFsPath>,
        changed_resources: impl IntoIterator<Item = AbsoluteFsPath>,
    ) -> Self {
        let (prior_analysis, mut physically_changed, mut changed_resource_files) =
            match old_state {
                IncrementalState::Fresh => return Self::fresh(new_versions),
                IncrementalState::Analyzed(analyzed) => {
                    (Arc::clone(analyzed), HashSet::new(), HashSet::new())
                }
                IncrementalState::Delta(delta) => (
                    Arc::clone(&delta.last_analyzed_state),
                    delta.physically_changed_ts_files.clone(),
                    delta.changed_resource_files.clone(),
                ),
            };

        let deleted: HashSet<AbsoluteFsPath> = deleted_ts_files.into_iter().collect();
        physically_changed.extend(changed_ts_files);
        changed_resource_files.extend(changed_resources);

        if physically_changed
            .iter()
            .chain(deleted.iter())
            .any(|path| path.as_str().ends_with(".d.ts"))
        {
            tracing::debug!("declaration file changed, falling back to a fresh compilation");
            return Self::fresh(new_versions);
        }
        for path in &deleted {
            physically_changed.remove(path);
        }

        let mut dep_graph = FileDependencyGraph::new();
        let mut logically_changed = dep_graph.update_with_physical_changes(
            &prior_analysis.dep_graph,
            &physically_changed,
            &deleted,
            &changed_resource_files,
        );
        logically_changed.extend(physically_changed.iter().cloned());
        logically_changed.extend(deleted.iter().cloned());

        tracing::debug!(
            physically_changed = physically_changed.len(),
            logically_changed = logically_changed.len(),
            "starting incremental compilation"
        );

        let state = IncrementalState::Delta(Arc::new(DeltaIncrementalState {
            physically_changed_ts_files: physically_changed,
            changed_resource_files,
            last_analyzed_state: Arc::clone(&prior_analysis),
        }));
        Self::new(
            state,
            dep_graph,
            new_versions,
            Some(IncrementalStep {
                prior_state: prior_analysis,
                logically_changed_ts_files: logically_changed,
            }),
        )
    }

    /// Like `incremental`, but works out the physical changes by comparing `old_program`
    /// with `program`. Versions are compared when both builds have one for a file,
    /// otherwise file texts are. Shim files are ignored.
    pub fn incremental_from_programs(
        program: &Program,
        new_versions: Option<FileVersions>,
        old_program: &Program,
        old_state: &IncrementalState<A, T>,
        modified_resource_files: Option<&HashSet<AbsoluteFsPath>>,
    ) -> Self {
        let old_versions = old_state
            .last_analyzed()
            .and_then(|analyzed| analyzed.versions.as_ref());

        let mut changed = Vec::new();
        for sf in program.get_source_files() {
            if is_shim(&sf.file_name) {
                continue;
            }
            let path = AbsoluteFsPath::from(sf.file_name.as_str());
            let Some(old_sf) = old_program.get_source_file(&sf.file_name) else {
                changed.push(path);
                continue;
            };
            let old_version = old_versions.and_then(|versions| versions.get(&path));
            let new_version = new_versions.as_ref().and_then(|versions| versions.get(&path));
            let unchanged = match (old_version, new_version) {
                (Some(old), Some(new)) => old == new,
                _ => Arc::ptr_eq(&old_sf.text, &sf.text) || old_sf.text == sf.text,
            };
            if !unchanged {
                changed.push(path);
            }
        }

        let deleted: Vec<AbsoluteFsPath> = old_program
            .get_source_files()
            .filter(|sf| !is_shim(&sf.file_name) && !program.has_file(&sf.file_name))
            .map(|sf| AbsoluteFsPath::from(sf.file_name.as_str()))
            .collect();

        let resources = modified_resource_files.cloned().unwrap_or_default();
        Self::incremental(old_state, new_versions, changed, deleted, resources)
    }

    pub fn state(&self) -> &IncrementalState<A, T> {
        &self.state
    }

    /// Dependencies recorded for the current compilation.
    pub fn dep_graph(&self) -> &FileDependencyGraph {
        &self.dep_graph
    }

    pub fn dep_graph_mut(&mut self) -> Result<&mut FileDependencyGraph, IncrementalError> {
        self.expect_phase(ANALYSIS, "dep_graph_mut")?;
        Ok(&mut self.dep_graph)
    }

    pub fn semantic_dep_graph_updater(
        &mut self,
    ) -> Result<&mut SemanticDepGraphUpdater, IncrementalError> {
        match &mut self.phase {
            Phase::Analysis {
                semantic_dep_graph_updater,
            } => Ok(semantic_dep_graph_updater),
            phase => Err(IncrementalError::InvalidPhase {
                operation: "semantic_dep_graph_updater",
                expected: ANALYSIS,
                actual: phase.name(),
            }),
        }
    }

    /// Whether `file` must be analyzed again in this compilation.
    pub fn is_logically_changed(&self, file: &AbsoluteFsPath) -> bool {
        match &self.step {
            Some(step) => step.logically_changed_ts_files.contains(file),
            None => true,
        }
    }

    /// Transition to the analyzed state once analysis of the whole program succeeded.
    ///
    /// `analysis` holds the records produced by this compilation; records of files that
    /// were not logically changed are carried forward from the prior build.
    pub fn record_successful_analysis(
        &mut self,
        analysis: HashMap<AbsoluteFsPath, A>,
    ) -> Result<(), IncrementalError> {
        let placeholder = Phase::TypeCheckAndEmit {
            needs_emit: HashSet::new(),
            needs_type_check_emit: HashSet::new(),
        };
        let changes = match std::mem::replace(&mut self.phase, placeholder) {
            Phase::Analysis {
                semantic_dep_graph_updater,
            } => semantic_dep_graph_updater.finalize(),
            phase => {
                let actual = phase.name();
                self.phase = phase;
                return Err(IncrementalError::InvalidPhase {
                    operation: "record_successful_analysis",
                    expected: ANALYSIS,
                    actual,
                });
            }
        };

        let mut emitted = HashSet::new();
        let mut prior_analysis = HashMap::new();
        if let Some(step) = &self.step {
            emitted = step
                .prior_state
                .emitted
                .iter()
                .filter(|path| {
                    !step.logically_changed_ts_files.contains(*path)
                        && !changes.needs_emit.contains(*path)
                })
                .cloned()
                .collect();
            prior_analysis = step
                .prior_state
                .prior_analysis
                .iter()
                .filter(|(path, _)| !step.logically_changed_ts_files.contains(*path))
                .map(|(path, record)| (path.clone(), record.clone()))
                .collect();
        }
        prior_analysis.extend(analysis);

        tracing::debug!(
            analyzed_files = prior_analysis.len(),
            needs_emit = changes.needs_emit.len(),
            "recorded successful analysis"
        );

        self.state = IncrementalState::Analyzed(Arc::new(AnalyzedIncrementalState {
            versions: self.versions.clone(),
            dep_graph: self.dep_graph.clone(),
            semantic_dep_graph: Arc::new(changes.new_graph),
            prior_analysis,
            type_check_results: None,
            emitted,
        }));
        self.phase = Phase::TypeCheckAndEmit {
            needs_emit: changes.needs_emit,
            needs_type_check_emit: changes.needs_type_check_emit,
        };
        Ok(())
    }

    pub fn record_successful_type_check(
        &mut self,
        results: HashMap<AbsoluteFsPath, T>,
    ) -> Result<(), IncrementalError> {
        let analyzed = self.analyzed_state_mut("record_successful_type_check")?;
        analyzed.type_check_results = Some(results);
        Ok(())
    }

    pub fn record_successful_emit(&mut self, file: &AbsoluteFsPath) -> Result<(), IncrementalError> {
        let analyzed = self.analyzed_state_mut("record_successful_emit")?;
        analyzed.emitted.insert(file.clone());
        Ok(())
    }

    /// Whether the emit output of the prior build for `file` is still valid.
    pub fn safe_to_skip_emit(&self, file: &AbsoluteFsPath) -> Result<bool, IncrementalError> {
        let Some(step) = &self.step else {
            return Ok(false);
        };
        if step.logically_changed_ts_files.contains(file) {
            return Ok(false);
        }
        match &self.phase {
            Phase::TypeCheckAndEmit { needs_emit, .. } => {
                Ok(!needs_emit.contains(file) && step.prior_state.emitted.contains(file))
            }
            phase => Err(IncrementalError::InvalidPhase {
                operation: "safe_to_skip_emit",
                expected: TYPE_CHECK_AND_EMIT,
                actual: phase.name(),
            }),
        }
    }

    fn prior_had_inlines(&self, step: &IncrementalStep<A, T>, file: &AbsoluteFsPath) -> bool {
        step.prior_state
            .type_check_results
            .as_ref()
            .and_then(|results| results.get(file))
            .is_some_and(ReusableTypeCheckData::has_inlines)
    }

    fn expect_phase(&self, expected: &'static str, operation: &'static str) -> Result<(), IncrementalError> {
        if self.phase.name() == expected {
            Ok(())
        } else {
            Err(IncrementalError::InvalidPhase {
                operation,
                expected,
                actual: self.phase.name(),
            })
        }
    }

    fn analyzed_state_mut(
        &mut self,
        operation: &'static str,
    ) -> Result<&mut AnalyzedIncrementalState<A, T>, IncrementalError> {
        let actual = self.phase.name();
        match &mut self.state {
            IncrementalState::Analyzed(analyzed) => Ok(Arc::make_mut(analyzed)),
            _ => Err(IncrementalError::InvalidPhase {
                operation,
                expected: TYPE_CHECK_AND_EMIT,
                actual,
            }),
        }
    }
}

impl<A: Clone, T: ReusableTypeCheckData> IncrementalBuild<A, T> for IncrementalCompilation<A, T> {
    fn prior_analysis_for(&self, file: &AbsoluteFsPath) -> Option<&A> {
        let step = self.step.as_ref()?;
        if step.logically_changed_ts_files.contains(file) || self.prior_had_inlines(step, file) {
            return None;
        }
        step.prior_state.prior_analysis.get(file)
    }

    fn prior_type_checking_results_for(
        &self,
        file: &AbsoluteFsPath,
    ) -> Result<Option<&T>, IncrementalError> {
        let needs_type_check_emit = match &self.phase {
            Phase::TypeCheckAndEmit {
                needs_type_check_emit,
                ..
            } => needs_type_check_emit,
            phase => {
                return Err(IncrementalError::InvalidPhase {
                    operation: "prior_type_checking_results_for",
                    expected: TYPE_CHECK_AND_EMIT,
                    actual: phase.name(),
                })
            }
        };
        let Some(step) = &self.step else {
            return Ok(None);
        };
        if step.logically_changed_ts_files.contains(file) || needs_type_check_emit.contains(file) {
            return Ok(None);
        }
        Ok(step
            .prior_state
            .type_check_results
            .as_ref()
            .and_then(|results| results.get(file))
            .filter(|results| !results.has_inlines()))
    }
}
