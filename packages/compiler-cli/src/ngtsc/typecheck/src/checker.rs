// Template Type Checker
//
// Runs whole type-checking passes: generates blocks for every registered component,
// swaps the resulting texts into the program, asks the host checker about each of them
// and maps what it reports back onto the templates.

use std::collections::HashMap;
use std::sync::Arc;

use angular_compiler::core::SchemaMetadata;
use angular_compiler::expression_parser::ast::{AbsoluteSourceSpan, AST};
use angular_compiler::parse_util::{ParseSourceFile, ParseSourceSpan};
use angular_compiler::render3::r3_ast::{NodeId, R3Node};
use angular_compiler::render3::view::t2_api::BoundTarget;
use angular_compiler::render3::view::t2_binder::R3TargetBinder;
use indexmap::IndexMap;
use rayon::prelude::*;
use ts::{HostTypeChecker, Program};

use super::completion::CompletionEngine;
use super::context::{FileTypeCheckingData, InliningMode, TemplateInput, TypeCheckContextImpl};
use super::diagnostics::{find_template_location, should_report_diagnostic, translate_diagnostic};
use super::reference_emitter::{LocalOrImportEmitter, ReferenceEmitter};
use super::template_symbol_builder::{HostTypes, SymbolBuilder, TcbPlacement};
use super::ts_ast::TcbDecl;
use crate::ngtsc::cycles::CycleAnalyzer;
use crate::ngtsc::file_system::AbsoluteFsPath;
use crate::ngtsc::incremental::IncrementalBuild;
use crate::ngtsc::logging::{Logger, NullLogger};
use crate::ngtsc::program_driver::{FileUpdate, ProgramDriver, UpdateMode};
use crate::ngtsc::reflection::{ClassDeclaration, ClassRef};
use crate::ngtsc::shims::get_original_file;
use crate::ngtsc::typecheck::api::{
    DirectiveRef, GlobalCompletion, PipeMeta, TcbLocation, TemplateDiagnostic, TemplateId, TemplateNode,
    TemplateSymbol, TemplateTypeChecker, TypeCheckError, TypeCheckingConfig,
};

/// A component and everything its template is checked against.
#[derive(Debug, Clone)]
pub struct ComponentRegistration {
    pub class: ClassDeclaration,
    pub nodes: Vec<R3Node>,
    /// Directives in the component's compilation scope.
    pub directives: Vec<DirectiveRef>,
    pub pipes: IndexMap<String, PipeMeta>,
    pub schemas: Vec<SchemaMetadata>,
    pub template_file: Arc<ParseSourceFile>,
}

impl ComponentRegistration {
    pub fn new(class: ClassDeclaration, nodes: Vec<R3Node>, template_file: Arc<ParseSourceFile>) -> Self {
        Self {
            class,
            nodes,
            directives: Vec::new(),
            pipes: IndexMap::new(),
            schemas: Vec::new(),
            template_file,
        }
    }

    pub fn with_directives(mut self, directives: Vec<DirectiveRef>) -> Self {
        self.directives = directives;
        self
    }

    pub fn with_pipes(mut self, pipes: Vec<PipeMeta>) -> Self {
        self.pipes = pipes.into_iter().map(|pipe| (pipe.name.clone(), pipe)).collect();
        self
    }

    pub fn with_schemas(mut self, schemas: Vec<SchemaMetadata>) -> Self {
        self.schemas = schemas;
        self
    }
}

pub struct TemplateTypeCheckerImpl<D: ProgramDriver> {
    driver: D,
    /// The program before any synthesized text was applied.
    original: Program,
    host: Box<dyn HostTypeChecker>,
    config: TypeCheckingConfig,
    emitter: Arc<dyn ReferenceEmitter + Send + Sync>,
    logger: Arc<dyn Logger>,
    cycle_analyzer: Option<CycleAnalyzer>,
    components: IndexMap<ClassRef, ComponentRegistration>,
    results: IndexMap<AbsoluteFsPath, FileTypeCheckingData>,
    diagnostics: IndexMap<AbsoluteFsPath, Vec<TemplateDiagnostic>>,
}

impl<D: ProgramDriver> TemplateTypeCheckerImpl<D> {
    pub fn new(driver: D, host: impl HostTypeChecker + 'static, config: TypeCheckingConfig) -> Self {
        let original = driver.get_program().clone();
        Self {
            driver,
            original,
            host: Box::new(host),
            config,
            emitter: Arc::new(LocalOrImportEmitter),
            logger: Arc::new(NullLogger),
            cycle_analyzer: None,
            components: IndexMap::new(),
            results: IndexMap::new(),
            diagnostics: IndexMap::new(),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_emitter(mut self, emitter: Arc<dyn ReferenceEmitter + Send + Sync>) -> Self {
        self.emitter = emitter;
        self
    }

    pub fn with_cycle_analyzer(mut self, analyzer: CycleAnalyzer) -> Self {
        self.cycle_analyzer = Some(analyzer);
        self
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn register_component(&mut self, registration: ComponentRegistration) {
        self.components
            .insert(registration.class.class_ref.clone(), registration);
    }

    /// Checks every registered component from scratch.
    ///
    /// Most problems end up as diagnostics of the component they belong to, but an error
    /// aborts the whole pass and keeps the previous pass's results. In particular a
    /// [`TypeCheckError::UnemittableReference`], such as a directive class that is not
    /// exported and so cannot be named from the shim, fails every component registered
    /// with the checker rather than only the one using the directive.
    pub fn run(&mut self) -> Result<(), TypeCheckError> {
        self.run_pass(|_| Ok(None))
    }

    /// Checks every registered component, reusing the previous build's results for files
    /// the build allows. Errors abort the pass the same way as in [`Self::run`].
    pub fn run_incremental<A, B>(&mut self, build: &B) -> Result<(), TypeCheckError>
    where
        B: IncrementalBuild<A, FileTypeCheckingData> + ?Sized,
    {
        self.run_pass(|file| Ok(build.prior_type_checking_results_for(file)?.cloned()))
    }

    fn run_pass(
        &mut self,
        mut prior_for: impl FnMut(&AbsoluteFsPath) -> Result<Option<FileTypeCheckingData>, TypeCheckError>,
    ) -> Result<(), TypeCheckError> {
        let inlining = if self.driver.supports_inline_operations() {
            InliningMode::InlineOps
        } else {
            InliningMode::Error
        };
        let mut ctx = TypeCheckContextImpl::new(self.config.clone(), self.emitter.clone(), inlining);
        if let Some(analyzer) = &self.cycle_analyzer {
            ctx = ctx.with_cycle_analyzer(analyzer);
        }

        let mut by_file: IndexMap<&AbsoluteFsPath, Vec<&ComponentRegistration>> = IndexMap::new();
        for registration in self.components.values() {
            by_file
                .entry(&registration.class.class_ref.file)
                .or_default()
                .push(registration);
        }

        let mut reused = 0;
        for (file, registrations) in by_file {
            if let Some(prior) = prior_for(file)? {
                reused += 1;
                ctx.reuse_file(file.clone(), prior);
                continue;
            }
            for registration in registrations {
                let bound = R3TargetBinder::from_directives(registration.directives.iter().cloned())
                    .bind(&registration.nodes);
                ctx.add_template(
                    &registration.class,
                    TemplateInput {
                        nodes: &registration.nodes,
                        bound_target: &bound,
                        pipes: &registration.pipes,
                        schemas: &registration.schemas,
                        template_file: registration.template_file.clone(),
                    },
                )?;
            }
        }

        let updates = ctx.finalize(&self.original)?;
        let results = ctx.into_results();
        let updates = updates
            .into_iter()
            .map(|(path, text)| {
                let update = match get_original_file(path.as_str()) {
                    Some(original) => FileUpdate::for_shim(text, original),
                    None => FileUpdate::new(text),
                };
                (path, update)
            })
            .collect();
        self.driver.update_files(updates, UpdateMode::Complete);

        let diagnostics = check_files(self.driver.get_program(), self.host.as_ref(), &results)?;
        let total: usize = diagnostics.values().map(Vec::len).sum();
        tracing::info!(files = results.len(), reused, diagnostics = total, "type-checking pass complete");
        self.logger.debug(&format!(
            "Type-checked {} file(s), {} reused, {} template diagnostic(s)",
            results.len(),
            reused,
            total
        ));

        self.results = results;
        self.diagnostics = diagnostics;
        Ok(())
    }

    /// Runs `query` against the block last generated for `component`, with the
    /// component's template bound again.
    fn with_block<R>(
        &self,
        component: &ClassRef,
        query: impl FnOnce(BlockQuery<'_>) -> Option<R>,
    ) -> Option<R> {
        let registration = self.components.get(component)?;
        let data = self.results.get(&component.file)?;
        let template = data.template_of(component)?;
        let block = template.block.as_deref()?;
        let (file, block_start) = data.block_of(template)?;
        let bound = R3TargetBinder::from_directives(registration.directives.iter().cloned()).bind(&registration.nodes);
        let program = self.driver.get_program();
        let types = program.get_source_file(file.path.as_str()).map(|source_file| HostTypes {
            host: self.host.as_ref(),
            program,
            file: source_file,
        });
        query(BlockQuery {
            block,
            placement: TcbPlacement {
                path: &file.path,
                is_shim: !template.inline,
                block_start,
            },
            bound: &bound,
            nodes: &registration.nodes,
            types,
        })
    }

    /// This pass's per-file results, for handing to the incremental build.
    pub fn type_checking_results(&self) -> HashMap<AbsoluteFsPath, FileTypeCheckingData> {
        self.results
            .iter()
            .map(|(file, data)| (file.clone(), data.clone()))
            .collect()
    }
}

/// One component's block and what is needed to interpret it.
struct BlockQuery<'q> {
    block: &'q TcbDecl,
    placement: TcbPlacement<'q>,
    bound: &'q dyn BoundTarget<DirectiveRef>,
    nodes: &'q [R3Node],
    types: Option<HostTypes<'q>>,
}

/// Runs the host checker over every synthesized text and merges its translated
/// diagnostics with those found while generating.
fn check_files(
    program: &Program,
    host: &dyn HostTypeChecker,
    results: &IndexMap<AbsoluteFsPath, FileTypeCheckingData>,
) -> Result<IndexMap<AbsoluteFsPath, Vec<TemplateDiagnostic>>, TypeCheckError> {
    let jobs: Vec<_> = results
        .iter()
        .flat_map(|(file, data)| data.synthesized_files().map(move |synthesized| (file, data, synthesized)))
        .collect();

    let checked: Vec<Result<(AbsoluteFsPath, Vec<TemplateDiagnostic>), TypeCheckError>> = jobs
        .par_iter()
        .map(|(file, data, synthesized)| {
            let source_file = program
                .get_source_file(synthesized.path.as_str())
                .ok_or_else(|| TypeCheckError::MissingSourceFile(synthesized.path.clone()))?;
            let raw = host.get_semantic_diagnostics(program, source_file)?;
            tracing::trace!(file = %synthesized.path, raw = raw.len(), "host diagnostics");
            let translated = raw
                .iter()
                .filter(|diagnostic| should_report_diagnostic(diagnostic))
                .filter_map(|diagnostic| {
                    translate_diagnostic(diagnostic, &synthesized.text, &synthesized.map, &data.source_manager)
                })
                .collect();
            Ok(((*file).clone(), translated))
        })
        .collect();

    let mut diagnostics: IndexMap<AbsoluteFsPath, Vec<TemplateDiagnostic>> = results
        .iter()
        .map(|(file, data)| (file.clone(), data.generation_diagnostics.clone()))
        .collect();
    for entry in checked {
        let (file, translated) = entry?;
        diagnostics.entry(file).or_default().extend(translated);
    }
    Ok(diagnostics)
}

impl<D: ProgramDriver> TemplateTypeChecker for TemplateTypeCheckerImpl<D> {
    fn get_diagnostics_for_file(&self, file: &AbsoluteFsPath) -> Vec<TemplateDiagnostic> {
        self.diagnostics.get(file).cloned().unwrap_or_default()
    }

    fn get_diagnostics_for_component(&self, component: &ClassRef) -> Vec<TemplateDiagnostic> {
        let Some(template) = self
            .results
            .get(&component.file)
            .and_then(|data| data.template_of(component))
        else {
            return Vec::new();
        };
        self.get_diagnostics_for_file(&component.file)
            .into_iter()
            .filter(|diagnostic| diagnostic.template_id == template.template_id)
            .collect()
    }

    fn get_all_diagnostics(&self) -> Vec<TemplateDiagnostic> {
        self.diagnostics.values().flatten().cloned().collect()
    }

    fn get_template(&self, component: &ClassRef) -> Option<&[R3Node]> {
        self.components.get(component).map(|registration| registration.nodes.as_slice())
    }

    fn get_symbol_of_node(&self, node: TemplateNode<'_>, component: &ClassRef) -> Option<TemplateSymbol> {
        self.with_block(component, |query| {
            let mut builder = SymbolBuilder::new(query.block, query.placement, query.bound, query.nodes);
            if let Some(types) = query.types {
                builder = builder.with_types(types);
            }
            builder.get_symbol(node)
        })
    }

    fn get_global_completions(
        &self,
        context: Option<NodeId>,
        component: &ClassRef,
        node: &AST,
    ) -> Option<GlobalCompletion> {
        self.with_block(component, |query| {
            CompletionEngine::new(query.block, query.placement).get_global_completions(query.nodes, context, node)
        })
    }

    fn get_expression_completion_location(&self, expr: &AST, component: &ClassRef) -> Option<TcbLocation> {
        self.with_block(component, |query| {
            CompletionEngine::new(query.block, query.placement).get_expression_completion_location(expr)
        })
    }

    fn get_template_mapping_at_tcb_location(&self, location: &TcbLocation) -> Option<(TemplateId, ParseSourceSpan)> {
        self.results.values().find_map(|data| {
            let file = data.synthesized_files().find(|file| file.path == location.tcb_path)?;
            find_template_location(location.position_in_file, &file.text, &file.map, &data.source_manager)
        })
    }

    fn get_template_span(&self, component: &ClassRef, span: AbsoluteSourceSpan) -> Option<(TemplateId, ParseSourceSpan)> {
        let data = self.results.get(&component.file)?;
        let template = data.template_of(component)?;
        let parse_span = data
            .source_manager
            .to_parse_source_span(&template.template_id, span.start, span.end)?;
        Some((template.template_id.clone(), parse_span))
    }
}
