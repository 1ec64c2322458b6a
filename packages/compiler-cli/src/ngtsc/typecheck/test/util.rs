use std::sync::Arc;

use angular_compiler::parse_util::ParseSourceFile;
use angular_compiler::render3::r3_ast::R3Node;
use angular_compiler::render3::view::t2_binder::R3TargetBinder;
use indexmap::IndexMap;

use crate::ngtsc::diagnostics::{ng_error_code, ErrorCode};
use crate::ngtsc::file_system::AbsoluteFsPath;
use crate::ngtsc::reflection::{ClassDeclaration, ClassRef};
use crate::ngtsc::typecheck::api::{
    DirectiveRef, PipeMeta, TemplateDiagnostic, TemplateId, TypeCheckableDirectiveMeta, TypeCheckingConfig,
};
use crate::ngtsc::typecheck::src::dom::RegistryDomSchemaChecker;
use crate::ngtsc::typecheck::src::oob::OutOfBandDiagnosticRecorderImpl;
use crate::ngtsc::typecheck::src::reference_emitter::LocalOrImportEmitter;
use crate::ngtsc::typecheck::src::type_check_block::{
    generate_type_check_block, TcbGenericContextBehavior, TypeCheckBlockMetadata,
};
use crate::ngtsc::typecheck::src::type_check_file::TypeCheckFile;

pub const COMPONENT_FILE: &str = "/app/cmp.ts";
pub const SHIM_FILE: &str = "/app/cmp.ngtypecheck.ts";

pub fn component() -> ClassDeclaration {
    ClassDeclaration::new(ClassRef::new("AppCmp", COMPONENT_FILE))
}

/// A component directive declared in `/app/<file>.ts`.
pub fn component_dir(name: &str, file: &str, selector: &str) -> TypeCheckableDirectiveMeta {
    let class = ClassDeclaration::new(ClassRef::new(name, format!("/app/{}.ts", file)));
    TypeCheckableDirectiveMeta::component(class, selector)
}

pub fn directive(name: &str, file: &str, selector: &str) -> TypeCheckableDirectiveMeta {
    let class = ClassDeclaration::new(ClassRef::new(name, format!("/app/{}.ts", file)));
    TypeCheckableDirectiveMeta::directive(class, selector)
}

pub fn pipe(name: &str, class: &str) -> PipeMeta {
    PipeMeta::new(name, ClassRef::new(class, format!("/app/{}.ts", name)))
}

pub fn code(error: ErrorCode) -> i32 {
    ng_error_code(error)
}

pub struct TcbOutput {
    pub text: String,
    pub diagnostics: Vec<TemplateDiagnostic>,
}

/// Generates the block of `AppCmp` for `nodes` and renders it into its shim.
pub fn type_check(
    nodes: &[R3Node],
    file: &Arc<ParseSourceFile>,
    directives: Vec<DirectiveRef>,
    pipes: Vec<PipeMeta>,
    config: TypeCheckingConfig,
) -> TcbOutput {
    let bound = R3TargetBinder::from_directives(directives).bind(nodes);
    let pipes: IndexMap<String, PipeMeta> = pipes.into_iter().map(|p| (p.name.clone(), p)).collect();
    let meta = TypeCheckBlockMetadata {
        id: TemplateId::new(1),
        nodes,
        bound_target: &bound,
        pipes: &pipes,
        schemas: &[],
        template_file: file,
    };
    let mut shim = TypeCheckFile::new(AbsoluteFsPath::from(SHIM_FILE), config, Arc::new(LocalOrImportEmitter));
    let mut dom = RegistryDomSchemaChecker::default();
    let mut oob = OutOfBandDiagnosticRecorderImpl::new();
    let tcb = generate_type_check_block(
        shim.env_mut(),
        &component(),
        "_tcb1",
        &meta,
        &mut dom,
        &mut oob,
        TcbGenericContextBehavior::UseEmitter,
    )
    .unwrap();
    shim.add_tcb(tcb);
    let (text, _) = shim.render();

    let mut diagnostics = dom.into_diagnostics();
    diagnostics.extend(oob.into_diagnostics());
    TcbOutput { text, diagnostics }
}
