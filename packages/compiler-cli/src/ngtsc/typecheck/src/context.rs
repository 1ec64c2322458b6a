// TypeCheck Context
//
// Collects the type check blocks of one type-checking pass. Each block goes either into
// the `.ngtypecheck.ts` shim of its component's file or, when the shim cannot name
// everything the block needs, directly into the component's file. Code spliced into
// original files is kept as offset-tagged operations and applied in `finalize`.

use std::sync::Arc;

use angular_compiler::core::SchemaMetadata;
use angular_compiler::parse_util::ParseSourceFile;
use angular_compiler::render3::r3_ast::R3Node;
use angular_compiler::render3::view::t2_api::BoundTarget;
use angular_compiler::schema::{DomElementSchemaRegistry, ElementSchemaRegistry};
use indexmap::{IndexMap, IndexSet};
use ts::Program;

use super::comments::read_template_id;
use super::dom::RegistryDomSchemaChecker;
use super::environment::Environment;
use super::oob::{OutOfBandDiagnosticRecorder, OutOfBandDiagnosticRecorderImpl};
use super::reference_emitter::ReferenceEmitter;
use super::source::TemplateSourceManager;
use super::tcb_util::{
    can_inline_into, requires_inline_type_check_block, requires_inline_type_ctor,
    TcbInliningRequirement,
};
use super::ts_ast::{Printer, SyntheticSourceMap, TcbDecl};
use super::type_check_block::{
    generate_type_check_block, TcbGenericContextBehavior, TypeCheckBlockMetadata,
};
use super::type_check_file::TypeCheckFile;
use super::type_constructor::generate_inline_type_ctor;
use crate::ngtsc::cycles::CycleAnalyzer;
use crate::ngtsc::file_system::AbsoluteFsPath;
use crate::ngtsc::incremental::ReusableTypeCheckData;
use crate::ngtsc::reflection::{ClassDeclaration, ClassRef};
use crate::ngtsc::shims::{make_shim_file_name, ShimType};
use crate::ngtsc::typecheck::api::{
    DirectiveRef, PipeMeta, TemplateDiagnostic, TemplateId, TypeCheckError,
    TypeCheckableDirectiveMeta, TypeCheckingConfig,
};

/// Whether code may be spliced into original source files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InliningMode {
    InlineOps,
    /// Inlining is unavailable; components that need it are reported instead.
    Error,
}

/// A component template handed to `add_template`, already bound.
pub struct TemplateInput<'a> {
    pub nodes: &'a [R3Node],
    pub bound_target: &'a dyn BoundTarget<DirectiveRef>,
    pub pipes: &'a IndexMap<String, PipeMeta>,
    pub schemas: &'a [SchemaMetadata],
    pub template_file: Arc<ParseSourceFile>,
}

/// Where the block of one template ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateData {
    pub component: ClassRef,
    pub template_id: TemplateId,
    /// Spliced into the component's file rather than placed in the shim.
    pub inline: bool,
    /// The generated block; `None` when generation was refused for the template.
    pub block: Option<Arc<TcbDecl>>,
}

/// Text produced by a pass, with the positions of its commented nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedFile {
    pub path: AbsoluteFsPath,
    pub text: String,
    pub map: SyntheticSourceMap,
}

/// Everything one pass produced for one original file.
#[derive(Debug, Clone)]
pub struct FileTypeCheckingData {
    pub has_inlines: bool,
    pub source_manager: TemplateSourceManager,
    pub templates: IndexMap<TemplateId, TemplateData>,
    pub shim: Option<SynthesizedFile>,
    /// The original file with inline code spliced in.
    pub inline: Option<SynthesizedFile>,
    /// Out-of-band and DOM schema diagnostics found while generating.
    pub generation_diagnostics: Vec<TemplateDiagnostic>,
}

impl FileTypeCheckingData {
    /// The texts the host has to check for this file.
    pub fn synthesized_files(&self) -> impl Iterator<Item = &SynthesizedFile> {
        self.shim.iter().chain(self.inline.iter())
    }

    pub fn template_of(&self, component: &ClassRef) -> Option<&TemplateData> {
        self.templates.values().find(|t| &t.component == component)
    }

    /// The synthesized file holding the block of `template` and the offset the block
    /// starts at.
    pub fn block_of(&self, template: &TemplateData) -> Option<(&SynthesizedFile, usize)> {
        let file = if template.inline { self.inline.as_ref() } else { self.shim.as_ref() }?;
        let range = file
            .map
            .tcbs
            .iter()
            .find(|range| read_template_id(&file.text, range.start).as_ref() == Some(&template.template_id))?;
        Some((file, range.start))
    }
}

impl ReusableTypeCheckData for FileTypeCheckingData {
    fn has_inlines(&self) -> bool {
        self.has_inlines
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InlineOpKind {
    /// `static ngTypeCtor`, placed just before the class's closing brace.
    TypeCtor,
    /// A block placed right after the component class.
    Tcb,
}

#[derive(Debug, Clone)]
struct InlineOp {
    offset: usize,
    kind: InlineOpKind,
    text: String,
    /// Positions relative to the start of `text`.
    map: SyntheticSourceMap,
}

struct PendingFile {
    has_inlines: bool,
    source_manager: TemplateSourceManager,
    templates: IndexMap<TemplateId, TemplateData>,
    shim: Option<TypeCheckFile>,
    /// Imports and declarations of code spliced into the original file.
    inline_env: Option<Environment>,
    ops: Vec<InlineOp>,
    dom: RegistryDomSchemaChecker,
    oob: OutOfBandDiagnosticRecorderImpl,
}

impl PendingFile {
    fn new(registry: Arc<dyn ElementSchemaRegistry + Send + Sync>) -> Self {
        Self {
            has_inlines: false,
            source_manager: TemplateSourceManager::new(),
            templates: IndexMap::new(),
            shim: None,
            inline_env: None,
            ops: Vec::new(),
            dom: RegistryDomSchemaChecker::new(registry),
            oob: OutOfBandDiagnosticRecorderImpl::new(),
        }
    }
}

enum Placement {
    Shim(TcbGenericContextBehavior),
    Inline,
}

pub struct TypeCheckContextImpl<'a> {
    config: TypeCheckingConfig,
    emitter: Arc<dyn ReferenceEmitter + Send + Sync>,
    inlining: InliningMode,
    cycle_analyzer: Option<&'a CycleAnalyzer>,
    registry: Arc<dyn ElementSchemaRegistry + Send + Sync>,
    files: IndexMap<AbsoluteFsPath, PendingFile>,
    inline_type_ctors: IndexSet<ClassRef>,
    finished: IndexMap<AbsoluteFsPath, FileTypeCheckingData>,
}

impl<'a> TypeCheckContextImpl<'a> {
    pub fn new(
        config: TypeCheckingConfig,
        emitter: Arc<dyn ReferenceEmitter + Send + Sync>,
        inlining: InliningMode,
    ) -> Self {
        Self {
            config,
            emitter,
            inlining,
            cycle_analyzer: None,
            registry: Arc::new(DomElementSchemaRegistry::new()),
            files: IndexMap::new(),
            inline_type_ctors: IndexSet::new(),
            finished: IndexMap::new(),
        }
    }

    /// Checks inline code against import cycles and records the imports it adds.
    pub fn with_cycle_analyzer(mut self, analyzer: &'a CycleAnalyzer) -> Self {
        self.cycle_analyzer = Some(analyzer);
        self
    }

    pub fn with_schema_registry(mut self, registry: Arc<dyn ElementSchemaRegistry + Send + Sync>) -> Self {
        self.registry = registry;
        self
    }

    fn pending_file(&mut self, file: &AbsoluteFsPath) -> &mut PendingFile {
        let registry = &self.registry;
        self.files
            .entry(file.clone())
            .or_insert_with(|| PendingFile::new(registry.clone()))
    }

    /// Carries a previous pass's results for `file` over unchanged.
    pub fn reuse_file(&mut self, file: AbsoluteFsPath, data: FileTypeCheckingData) {
        tracing::debug!(%file, "reusing type-checking results");
        self.finished.insert(file, data);
    }

    /// Generates the block of `component`'s template. Returns the template's id even when
    /// the block could not be generated; the reason is then among the file's diagnostics.
    pub fn add_template(
        &mut self,
        component: &ClassDeclaration,
        template: TemplateInput<'_>,
    ) -> Result<TemplateId, TypeCheckError> {
        let file = component.class_ref.file.clone();
        let shim_path = make_shim_file_name(&file, ShimType::TypeCheck);
        let pending = self.pending_file(&file);
        let template_id = pending.source_manager.capture_source(template.template_file.clone());
        pending.templates.insert(
            template_id.clone(),
            TemplateData {
                component: component.class_ref.clone(),
                template_id: template_id.clone(),
                inline: false,
                block: None,
            },
        );

        if self.config.use_inline_type_constructors {
            let mut missing = Vec::new();
            for dir in template.bound_target.get_used_directives() {
                let class = dir.class_ref();
                if self.inline_type_ctors.contains(class)
                    || !requires_inline_type_ctor(&dir, &shim_path, self.emitter.as_ref())
                {
                    continue;
                }
                if self.inlining == InliningMode::InlineOps && can_inline_into(class, &self.config) {
                    self.add_inline_type_ctor(&dir)?;
                } else {
                    missing.push(class.clone());
                }
            }
            if !missing.is_empty() {
                self.pending_file(&file).oob.requires_inline_type_constructors(
                    &template_id,
                    &component.class_ref,
                    &missing,
                );
                return Ok(template_id);
            }
        }

        let used_pipe_names = template.bound_target.get_used_pipes();
        let used_pipes: Vec<&PipeMeta> = used_pipe_names
            .iter()
            .filter_map(|name| template.pipes.get(name))
            .collect();
        let requirement =
            requires_inline_type_check_block(component, &shim_path, &used_pipes, self.emitter.as_ref());

        let placement = match requirement {
            TcbInliningRequirement::MustInline if self.inlining == InliningMode::Error => {
                self.pending_file(&file)
                    .oob
                    .requires_inline_tcb(&template_id, &component.class_ref);
                return Ok(template_id);
            }
            TcbInliningRequirement::MustInline => {
                self.record_inline_imports(&file, template.bound_target, &used_pipes);
                Placement::Inline
            }
            TcbInliningRequirement::ShouldInlineForGenericBounds => {
                if self.inlining == InliningMode::InlineOps
                    && !self.inlining_creates_cycle(&file, template.bound_target, &used_pipes)
                {
                    self.record_inline_imports(&file, template.bound_target, &used_pipes);
                    Placement::Inline
                } else {
                    Placement::Shim(TcbGenericContextBehavior::FallbackToAny)
                }
            }
            TcbInliningRequirement::None => Placement::Shim(TcbGenericContextBehavior::UseEmitter),
        };

        let config = self.config.clone();
        let emitter = self.emitter.clone();
        let inline_ctors: Vec<ClassRef> = self.inline_type_ctors.iter().cloned().collect();
        let fn_name = format!("_{}", template_id);
        let meta = TypeCheckBlockMetadata {
            id: template_id.clone(),
            nodes: template.nodes,
            bound_target: template.bound_target,
            pipes: template.pipes,
            schemas: template.schemas,
            template_file: &template.template_file,
        };

        let PendingFile {
            has_inlines,
            templates,
            shim,
            inline_env,
            ops,
            dom,
            oob,
            ..
        } = self.pending_file(&file);

        match placement {
            Placement::Shim(behavior) => {
                let shim = shim.get_or_insert_with(|| TypeCheckFile::new(shim_path, config, emitter));
                let env = shim.env_mut();
                for class in inline_ctors {
                    env.register_inline_type_ctor(class);
                }
                let tcb = generate_type_check_block(env, component, &fn_name, &meta, dom, oob, behavior)?;
                if let Some(data) = templates.get_mut(&template_id) {
                    data.block = Some(Arc::new(tcb.clone()));
                }
                shim.add_tcb(tcb);
            }
            Placement::Inline => {
                let env = inline_env.get_or_insert_with(|| Environment::new(config, file.clone(), emitter));
                for class in inline_ctors {
                    env.register_inline_type_ctor(class);
                }
                let tcb = generate_type_check_block(
                    env,
                    component,
                    &fn_name,
                    &meta,
                    dom,
                    oob,
                    TcbGenericContextBehavior::CopyClassNodes,
                )?;
                let mut printer = Printer::new();
                printer.write_raw("\n");
                printer.print_tcb(&tcb);
                let (text, map) = printer.finish();
                ops.push(InlineOp {
                    offset: component.class_ref.node_end,
                    kind: InlineOpKind::Tcb,
                    text,
                    map,
                });
                *has_inlines = true;
                if let Some(data) = templates.get_mut(&template_id) {
                    data.inline = true;
                    data.block = Some(Arc::new(tcb));
                }
            }
        }
        tracing::debug!(
            template = %template_id,
            component = %component.class_ref.name,
            ?requirement,
            "added template"
        );
        Ok(template_id)
    }

    fn add_inline_type_ctor(&mut self, dir: &TypeCheckableDirectiveMeta) -> Result<(), TypeCheckError> {
        let class = dir.class_ref().clone();
        let config = self.config.clone();
        let emitter = self.emitter.clone();
        let pending = self.pending_file(&class.file);
        let env = pending
            .inline_env
            .get_or_insert_with(|| Environment::new(config, class.file.clone(), emitter));
        let method = generate_inline_type_ctor(env, dir)?;
        let mut printer = Printer::new();
        printer.write_raw("\n  ");
        printer.print_method(&method);
        printer.write_raw("\n");
        let (text, _) = printer.finish();
        pending.ops.push(InlineOp {
            offset: class.node_end.saturating_sub(1),
            kind: InlineOpKind::TypeCtor,
            text,
            map: SyntheticSourceMap::default(),
        });
        pending.has_inlines = true;
        tracing::trace!(directive = %dir.name, "added inline type constructor");
        self.inline_type_ctors.insert(class);
        Ok(())
    }

    /// Files an inline block in `file` would import from.
    fn inline_dependencies(
        file: &AbsoluteFsPath,
        bound_target: &dyn BoundTarget<DirectiveRef>,
        used_pipes: &[&PipeMeta],
    ) -> IndexSet<AbsoluteFsPath> {
        bound_target
            .get_used_directives()
            .iter()
            .map(|dir| dir.class_ref().file.clone())
            .chain(used_pipes.iter().map(|pipe| pipe.class_ref.file.clone()))
            .filter(|dep| dep != file)
            .collect()
    }

    fn inlining_creates_cycle(
        &self,
        file: &AbsoluteFsPath,
        bound_target: &dyn BoundTarget<DirectiveRef>,
        used_pipes: &[&PipeMeta],
    ) -> bool {
        let Some(analyzer) = self.cycle_analyzer else {
            return false;
        };
        Self::inline_dependencies(file, bound_target, used_pipes)
            .iter()
            .any(|dep| analyzer.would_create_cycle(file, dep).is_some())
    }

    fn record_inline_imports(
        &self,
        file: &AbsoluteFsPath,
        bound_target: &dyn BoundTarget<DirectiveRef>,
        used_pipes: &[&PipeMeta],
    ) {
        if let Some(analyzer) = self.cycle_analyzer {
            for dep in Self::inline_dependencies(file, bound_target, used_pipes) {
                analyzer.record_synthetic_import(file, &dep);
            }
        }
    }

    /// Renders every shim and splices inline code into its original file. `program` holds
    /// the original texts. Returns the new text of every file that changed.
    pub fn finalize(&mut self, program: &Program) -> Result<IndexMap<AbsoluteFsPath, String>, TypeCheckError> {
        for (path, pending) in std::mem::take(&mut self.files) {
            let mut generation_diagnostics = pending.dom.into_diagnostics();
            generation_diagnostics.extend(pending.oob.into_diagnostics());

            let inline = if pending.ops.is_empty() {
                None
            } else {
                let original = program
                    .get_source_file(path.as_str())
                    .ok_or_else(|| TypeCheckError::MissingSourceFile(path.clone()))?;
                let imports = pending
                    .inline_env
                    .as_ref()
                    .map(|env| env.imports().render())
                    .unwrap_or_default();
                let (text, map) = splice_inline_ops(&path, original.text(), &imports, pending.ops)?;
                Some(SynthesizedFile {
                    path: path.clone(),
                    text,
                    map,
                })
            };
            let shim = pending.shim.map(|shim| {
                let (text, map) = shim.render();
                SynthesizedFile {
                    path: shim.file_name().clone(),
                    text,
                    map,
                }
            });

            self.finished.insert(
                path,
                FileTypeCheckingData {
                    has_inlines: pending.has_inlines,
                    source_manager: pending.source_manager,
                    templates: pending.templates,
                    shim,
                    inline,
                    generation_diagnostics,
                },
            );
        }

        let updates: IndexMap<AbsoluteFsPath, String> = self
            .finished
            .values()
            .flat_map(|data| data.synthesized_files())
            .map(|file| (file.path.clone(), file.text.clone()))
            .collect();
        tracing::debug!(files = updates.len(), "finalized type-checking context");
        Ok(updates)
    }

    /// The per-file results; complete once `finalize` has run.
    pub fn into_results(self) -> IndexMap<AbsoluteFsPath, FileTypeCheckingData> {
        self.finished
    }
}

/// Applies `ops` to `original` in ascending offset order, with `imports` in front.
fn splice_inline_ops(
    file: &AbsoluteFsPath,
    original: &str,
    imports: &str,
    mut ops: Vec<InlineOp>,
) -> Result<(String, SyntheticSourceMap), TypeCheckError> {
    ops.sort_by_key(|op| op.offset);
    if let Some(pair) = ops.windows(2).find(|pair| pair[0].offset == pair[1].offset) {
        return Err(TypeCheckError::OverlappingInlineOps {
            file: file.clone(),
            offset: pair[1].offset,
        });
    }

    let extra: usize = ops.iter().map(|op| op.text.len()).sum();
    let mut out = String::with_capacity(imports.len() + original.len() + extra);
    let mut map = SyntheticSourceMap::default();
    out.push_str(imports);
    let mut cursor = 0;
    for op in ops {
        let segment = original
            .get(cursor..op.offset)
            .ok_or_else(|| TypeCheckError::InvalidInlineOffset {
                file: file.clone(),
                offset: op.offset,
            })?;
        out.push_str(segment);
        map.extend(op.map.shifted(out.len()));
        tracing::trace!(%file, offset = op.offset, kind = ?op.kind, "splicing inline operation");
        out.push_str(&op.text);
        cursor = op.offset;
    }
    out.push_str(&original[cursor..]);
    Ok((out, map))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(offset: usize, kind: InlineOpKind, text: &str) -> InlineOp {
        InlineOp {
            offset,
            kind,
            text: text.to_string(),
            map: SyntheticSourceMap::default(),
        }
    }

    #[test]
    fn test_ops_are_spliced_in_ascending_offset_order() {
        let original = "class A {}\nclass B {}\n";
        let ops = vec![
            op(21, InlineOpKind::Tcb, "/*b*/"),
            op(9, InlineOpKind::TypeCtor, " ctor "),
        ];
        let (text, _) = splice_inline_ops(&AbsoluteFsPath::from("/a.ts"), original, "import x;\n", ops).unwrap();
        assert_eq!(text, "import x;\nclass A { ctor }\nclass B {}/*b*/\n");
    }

    #[test]
    fn test_ops_at_the_same_offset_overlap() {
        let ops = vec![op(3, InlineOpKind::Tcb, "a"), op(3, InlineOpKind::Tcb, "b")];
        let err = splice_inline_ops(&AbsoluteFsPath::from("/a.ts"), "abcdef", "", ops).unwrap_err();
        assert!(matches!(err, TypeCheckError::OverlappingInlineOps { offset: 3, .. }));
    }

    #[test]
    fn test_offset_past_the_end_is_rejected() {
        let ops = vec![op(99, InlineOpKind::Tcb, "a")];
        let err = splice_inline_ops(&AbsoluteFsPath::from("/a.ts"), "abc", "", ops).unwrap_err();
        assert!(matches!(err, TypeCheckError::InvalidInlineOffset { offset: 99, .. }));
    }
}
