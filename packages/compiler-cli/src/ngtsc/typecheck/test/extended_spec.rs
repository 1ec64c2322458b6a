use angular_compiler::expression_parser::ast::AST;
use angular_compiler::render3::r3_ast::R3Node;
use angular_compiler::testing::TemplateBuilder;
use ts::{CompilerOptions, Diagnostic, DiagnosticCategory, HostType, HostTypeChecker, Program, SourceFile, TypeFlags};

use crate::ngtsc::diagnostics::ErrorCode;
use crate::ngtsc::program_driver::{InMemoryProgramDriver, ProgramDriver};
use crate::ngtsc::reflection::{ClassDeclaration, ClassRef};
use crate::ngtsc::typecheck::api::{TemplateDiagnostic, TypeCheckingConfig};
use crate::ngtsc::typecheck::extended::{
    DiagnosticCategoryLabel, ExtendedDiagnosticsOptions, ExtendedTemplateCheckerImpl, ALL_DIAGNOSTIC_FACTORIES,
};
use crate::ngtsc::typecheck::src::checker::{ComponentRegistration, TemplateTypeCheckerImpl};
use crate::ngtsc::typecheck::test::util::{code, COMPONENT_FILE};

const EXPORTED_CMP: &str = "export class AppCmp {\n}\n";

/// Answers type queries with the type registered for the queried text.
struct TypesByText(Vec<(&'static str, HostType)>);

impl HostTypeChecker for TypesByText {
    fn get_semantic_diagnostics(&self, _program: &Program, _sf: &SourceFile) -> anyhow::Result<Vec<Diagnostic>> {
        Ok(Vec::new())
    }

    fn get_type_at_range(&self, _program: &Program, sf: &SourceFile, start: usize, end: usize) -> Option<HostType> {
        let text = sf.text().get(start..end)?;
        self.0.iter().find(|(at, _)| *at == text).map(|(_, ty)| ty.clone())
    }
}

fn app_cmp() -> ClassRef {
    ClassRef::new("AppCmp", COMPONENT_FILE)
}

/// Type-checks `nodes` as the template of `AppCmp` and runs every extended check on it.
fn extended_diagnostics(
    nodes: Vec<R3Node>,
    b: &TemplateBuilder,
    options: CompilerOptions,
    host: TypesByText,
    extended: &ExtendedDiagnosticsOptions,
) -> Vec<TemplateDiagnostic> {
    let program = Program::new(options, [SourceFile::new(COMPONENT_FILE, EXPORTED_CMP)]);
    let driver = InMemoryProgramDriver::new(program).with_inline_support(true);
    let mut checker = TemplateTypeCheckerImpl::new(driver, host, TypeCheckingConfig::default());
    checker.register_component(ComponentRegistration::new(
        ClassDeclaration::new(app_cmp()),
        nodes,
        b.file().clone(),
    ));
    checker.run().unwrap();

    let options = checker.driver().get_program().get_compiler_options().clone();
    let extended = ExtendedTemplateCheckerImpl::new(&checker, ALL_DIAGNOSTIC_FACTORIES, &options, extended);
    extended.get_diagnostics_for_component(&app_cmp())
}

fn strict() -> CompilerOptions {
    CompilerOptions {
        strict: Some(true),
        ..CompilerOptions::default()
    }
}

mod invalid_banana_in_box {
    use super::*;

    fn banana() -> (Vec<R3Node>, TemplateBuilder) {
        let template = r#"<div ([value])="go()"></div>"#;
        let mut b = TemplateBuilder::new(template);
        let mut div = b.element("div", template);
        let handler = b.call(b.ident("go"), Vec::new());
        div.outputs.push(b.output("[value]", handler, r#"([value])="go()""#));
        (vec![R3Node::Element(div)], b)
    }

    #[test]
    fn should_report_parentheses_outside_the_brackets() {
        let (nodes, b) = banana();
        let diagnostics = extended_diagnostics(
            nodes,
            &b,
            CompilerOptions::default(),
            TypesByText(Vec::new()),
            &ExtendedDiagnosticsOptions::default(),
        );

        assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
        let diag = &diagnostics[0];
        assert_eq!(diag.code, code(ErrorCode::InvalidBananaInBox));
        assert_eq!(diag.category, DiagnosticCategory::Warning);
        assert_eq!((diag.start, diag.length), (5, r#"([value])="go()""#.len()));
        assert!(
            diag.message
                .starts_with(r#"In the two-way binding syntax the parentheses should be inside the brackets, ex. '[(value)]="go()"'."#),
            "{}",
            diag.message
        );
    }

    #[test]
    fn should_follow_the_configured_category() {
        let (nodes, b) = banana();
        let as_error: ExtendedDiagnosticsOptions =
            serde_json::from_str(r#"{"checks": {"invalidBananaInBox": "error"}}"#).unwrap();
        let diagnostics = extended_diagnostics(
            nodes.clone(),
            &b,
            CompilerOptions::default(),
            TypesByText(Vec::new()),
            &as_error,
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].category, DiagnosticCategory::Error);

        let suppressed = ExtendedDiagnosticsOptions {
            default_category: Some(DiagnosticCategoryLabel::Suppress),
            ..ExtendedDiagnosticsOptions::default()
        };
        let diagnostics =
            extended_diagnostics(nodes, &b, CompilerOptions::default(), TypesByText(Vec::new()), &suppressed);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    }

    #[test]
    fn should_ignore_well_formed_bindings() {
        let template = r#"<div (value)="go()"></div>"#;
        let mut b = TemplateBuilder::new(template);
        let mut div = b.element("div", template);
        let handler = b.call(b.ident("go"), Vec::new());
        div.outputs.push(b.output("value", handler, r#"(value)="go()""#));
        let diagnostics = extended_diagnostics(
            vec![R3Node::Element(div)],
            &b,
            CompilerOptions::default(),
            TypesByText(Vec::new()),
            &ExtendedDiagnosticsOptions::default(),
        );
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    }
}

mod nullish_coalescing_not_nullable {
    use super::*;

    fn host() -> TypesByText {
        TypesByText(vec![
            ("this.user", HostType::new("string", TypeFlags::STRING)),
            (
                "this.maybe",
                HostType::new("string | undefined", TypeFlags::UNION | TypeFlags::STRING | TypeFlags::UNDEFINED),
            ),
            ("this.loose", HostType::new("any", TypeFlags::ANY)),
        ])
    }

    /// `{{ <name> ?? 'x' }}` for each of `names`, in order.
    fn coalescing(names: &[&str]) -> (Vec<R3Node>, TemplateBuilder) {
        let template: String = names.iter().map(|name| format!("{{{{ {} ?? 'x' }}}}", name)).collect();
        let mut b = TemplateBuilder::new(&template);
        let mut nodes = Vec::new();
        for name in names {
            let snippet = format!("{{{{ {} ?? 'x' }}}}", name);
            let left = b.ident_after(&snippet, name);
            let right = AST::string("x", b.offset_after(&snippet, "'x'"));
            let text = b.bound_text(AST::binary("??", left, right), &snippet);
            nodes.push(text);
        }
        (nodes, b)
    }

    #[test]
    fn should_report_left_sides_that_cannot_be_nullish() {
        let (nodes, b) = coalescing(&["user", "maybe", "loose"]);
        let diagnostics =
            extended_diagnostics(nodes, &b, strict(), host(), &ExtendedDiagnosticsOptions::default());

        assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
        let diag = &diagnostics[0];
        assert_eq!(diag.code, code(ErrorCode::NullishCoalescingNotNullable));
        assert_eq!((diag.start, diag.length), (3, "user ?? 'x'".len()));
        assert!(diag.message.starts_with("The left side of this nullish coalescing operation"));
    }

    #[test]
    fn should_only_run_with_strict_null_checks() {
        let (nodes, b) = coalescing(&["user"]);
        let diagnostics = extended_diagnostics(
            nodes.clone(),
            &b,
            CompilerOptions::default(),
            host(),
            &ExtendedDiagnosticsOptions::default(),
        );
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);

        let loose_nulls = CompilerOptions {
            strict: Some(true),
            strict_null_checks: Some(false),
            ..CompilerOptions::default()
        };
        let diagnostics =
            extended_diagnostics(nodes, &b, loose_nulls, host(), &ExtendedDiagnosticsOptions::default());
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    }

    #[test]
    fn should_skip_template_locals() {
        let template = "<input #ref>{{ ref ?? 'x' }}";
        let mut b = TemplateBuilder::new(template);
        let mut input = b.element("input", "<input #ref>");
        input.references.push(b.reference("ref", "", "#ref"));
        let left = b.ident_after("{{", "ref");
        let right = AST::string("x", b.offset("'x'"));
        let text = b.bound_text(AST::binary("??", left, right), "{{ ref ?? 'x' }}");
        // Even a non-nullable type does not make a reference read an expression.
        let host = TypesByText(vec![("_t2", HostType::new("HTMLInputElement", TypeFlags::OBJECT))]);

        let diagnostics = extended_diagnostics(
            vec![R3Node::Element(input), text],
            &b,
            strict(),
            host,
            &ExtendedDiagnosticsOptions::default(),
        );
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    }
}
