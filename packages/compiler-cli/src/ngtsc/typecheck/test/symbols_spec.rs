use std::sync::Arc;

use angular_compiler::expression_parser::ast::AST;
use angular_compiler::render3::r3_ast::R3Node;
use angular_compiler::render3::view::t2_api::ReferenceTarget;
use angular_compiler::testing::TemplateBuilder;
use ts::{CompilerOptions, Diagnostic, HostType, HostTypeChecker, Program, SourceFile, TypeFlags};

use crate::ngtsc::program_driver::{InMemoryProgramDriver, ProgramDriver};
use crate::ngtsc::reflection::{ClassDeclaration, ClassRef};
use crate::ngtsc::typecheck::api::{
    BindingTarget, CompletionKind, DirectiveRef, TcbLocation, TemplateNode, TemplateSymbol, TemplateTypeChecker,
    TypeCheckingConfig,
};
use crate::ngtsc::typecheck::src::checker::{ComponentRegistration, TemplateTypeCheckerImpl};
use crate::ngtsc::typecheck::test::util::{directive, COMPONENT_FILE, SHIM_FILE};

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

fn checker_for(
    nodes: Vec<R3Node>,
    b: &TemplateBuilder,
    directives: Vec<DirectiveRef>,
    host: TypesByText,
    config: TypeCheckingConfig,
) -> TemplateTypeCheckerImpl<InMemoryProgramDriver> {
    let program = Program::new(CompilerOptions::default(), [SourceFile::new(COMPONENT_FILE, EXPORTED_CMP)]);
    let driver = InMemoryProgramDriver::new(program).with_inline_support(true);
    let mut checker = TemplateTypeCheckerImpl::new(driver, host, config);
    checker.register_component(
        ComponentRegistration::new(ClassDeclaration::new(app_cmp()), nodes, b.file().clone())
            .with_directives(directives),
    );
    checker.run().unwrap();
    checker
}

fn shim_text(checker: &TemplateTypeCheckerImpl<InMemoryProgramDriver>) -> String {
    checker
        .driver()
        .get_program()
        .get_source_file(SHIM_FILE)
        .unwrap()
        .text()
        .to_string()
}

fn text_at(text: &str, location: &TcbLocation) -> String {
    text[location.position_in_file..].chars().take(16).collect()
}

#[test]
fn should_resolve_component_reads_with_their_host_type() {
    let template = "{{ user }}";
    let mut b = TemplateBuilder::new(template);
    let read = b.ident("user");
    let text = b.bound_text(read.clone(), template);
    let string = HostType::new("string", TypeFlags::STRING);
    let checker = checker_for(
        vec![text],
        &b,
        Vec::new(),
        TypesByText(vec![("this.user", string.clone())]),
        TypeCheckingConfig::default(),
    );

    let symbol = checker
        .get_symbol_of_node(TemplateNode::Expression(&read), &app_cmp())
        .unwrap();
    let TemplateSymbol::Expression { ty, tcb_location } = symbol else {
        panic!("expected an expression symbol, got {:?}", symbol);
    };
    assert_eq!(ty, Some(string));
    assert!(tcb_location.is_shim_file);
    assert_eq!(tcb_location.tcb_path.as_str(), SHIM_FILE);
    assert!(text_at(&shim_text(&checker), &tcb_location).starts_with("user"));

    let (template_id, span) = checker.get_template_mapping_at_tcb_location(&tcb_location).unwrap();
    assert_eq!(template_id.as_str(), "tcb1");
    assert_eq!(span.text(), "user");
    assert_eq!(span.start.offset, 3);

    let unknown = ClassRef::new("Unknown", COMPONENT_FILE);
    assert!(checker.get_symbol_of_node(TemplateNode::Expression(&read), &unknown).is_none());
}

#[test]
fn should_resolve_directives_inputs_and_references() {
    let template = r#"<div dir #d="dir" [value]="user"></div>{{ d }}"#;
    let mut b = TemplateBuilder::new(template);
    let mut div = b.element("div", r#"<div dir #d="dir" [value]="user"></div>"#);
    div.attributes.push(b.text_attribute("dir", "", "dir"));
    div.references.push(b.reference("d", "dir", "#d=\"dir\""));
    let value = b.ident_after("[value]", "user");
    div.inputs.push(b.input("value", value, "[value]=\"user\""));
    let read = b.ident_after("{{", "d");
    let text = b.bound_text(read.clone(), "{{ d }}");
    let dir: DirectiveRef = Arc::new(directive("Dir", "dir", "[dir]").with_input("value").with_export_as("dir"));
    let checker = checker_for(
        vec![R3Node::Element(div.clone()), text],
        &b,
        vec![dir],
        TypesByText(Vec::new()),
        TypeCheckingConfig::default(),
    );
    let shim = shim_text(&checker);

    let element = checker
        .get_symbol_of_node(TemplateNode::Element(&div), &app_cmp())
        .unwrap();
    let TemplateSymbol::Element {
        node,
        tcb_location,
        directives,
        ..
    } = element
    else {
        panic!("expected an element symbol, got {:?}", element);
    };
    assert_eq!(node, div.id);
    assert!(text_at(&shim, &tcb_location).starts_with("_t"));
    assert_eq!(directives.len(), 1);
    assert_eq!(directives[0].directive.name, "Dir");
    assert!(text_at(&shim, &directives[0].tcb_location).starts_with("_t"));

    let input = checker
        .get_symbol_of_node(TemplateNode::BoundAttribute(&div.inputs[0]), &app_cmp())
        .unwrap();
    let TemplateSymbol::Input { bindings } = input else {
        panic!("expected an input symbol, got {:?}", input);
    };
    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings[0].target, BindingTarget::Directive(directives[0].clone()));
    assert!(text_at(&shim, &bindings[0].tcb_location).starts_with("value"));

    let reference = checker
        .get_symbol_of_node(TemplateNode::Reference(&div.references[0]), &app_cmp())
        .unwrap();
    let TemplateSymbol::Reference {
        name,
        target,
        target_location,
        ..
    } = &reference
    else {
        panic!("expected a reference symbol, got {:?}", reference);
    };
    assert_eq!(name, "d");
    assert!(matches!(target, ReferenceTarget::DirectiveOnNode { node, .. } if *node == div.id));
    assert_eq!(target_location, &directives[0].tcb_location);

    // A read of the reference is answered with the reference itself.
    let read_symbol = checker.get_symbol_of_node(TemplateNode::Expression(&read), &app_cmp());
    assert_eq!(read_symbol, Some(reference));
}

#[test]
fn should_resolve_dom_event_listeners() {
    let template = r#"<button (click)="go()"></button>"#;
    let mut b = TemplateBuilder::new(template);
    let mut button = b.element("button", template);
    let handler = b.call(b.ident("go"), Vec::new());
    button.outputs.push(b.output("click", handler, r#"(click)="go()""#));
    let checker = checker_for(
        vec![R3Node::Element(button.clone())],
        &b,
        Vec::new(),
        TypesByText(Vec::new()),
        TypeCheckingConfig::default(),
    );

    let output = checker
        .get_symbol_of_node(TemplateNode::BoundEvent(&button.outputs[0]), &app_cmp())
        .unwrap();
    let TemplateSymbol::Output { bindings } = output else {
        panic!("expected an output symbol, got {:?}", output);
    };
    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings[0].target, BindingTarget::Element(button.id));
    assert!(text_at(&shim_text(&checker), &bindings[0].tcb_location).starts_with("addEventListener"));
}

#[test]
fn should_resolve_template_variables_and_their_reads() {
    let template = "<ng-template let-item>{{ item }}</ng-template>";
    let mut b = TemplateBuilder::new(template);
    let mut tpl = b.template(template);
    tpl.tag_name = Some("ng-template".to_string());
    tpl.variables.push(b.variable("item", "$implicit", "let-item"));
    let read = b.ident_after("{{", "item");
    tpl.children.push(b.bound_text(read.clone(), "{{ item }}"));
    let checker = checker_for(
        vec![R3Node::Template(tpl.clone())],
        &b,
        Vec::new(),
        TypesByText(Vec::new()),
        TypeCheckingConfig::default(),
    );
    let shim = shim_text(&checker);

    let variable = checker
        .get_symbol_of_node(TemplateNode::Variable(&tpl.variables[0]), &app_cmp())
        .unwrap();
    let TemplateSymbol::Variable {
        name,
        initializer_location,
        local_var_location,
        ..
    } = &variable
    else {
        panic!("expected a variable symbol, got {:?}", variable);
    };
    assert_eq!(name, "item");
    assert!(text_at(&shim, initializer_location).starts_with("$implicit"));
    assert!(text_at(&shim, local_var_location).starts_with("_t"));

    let read_symbol = checker.get_symbol_of_node(TemplateNode::Expression(&read), &app_cmp());
    assert_eq!(read_symbol, Some(variable));

    let template_symbol = checker.get_symbol_of_node(TemplateNode::Template(&tpl), &app_cmp());
    assert!(matches!(template_symbol, Some(TemplateSymbol::Template { directives, .. }) if directives.is_empty()));
}

#[test]
fn should_offer_completions_only_with_the_template_type_checker_enabled() {
    let template = "<input #ref>{{ us }}";
    let mut b = TemplateBuilder::new(template);
    let mut input = b.element("input", "<input #ref>");
    input.references.push(b.reference("ref", "", "#ref"));
    let read = b.ident("us");
    let text = b.bound_text(read.clone(), "{{ us }}");
    let nodes = vec![R3Node::Element(input), text];
    let config = TypeCheckingConfig {
        enable_template_type_checker: true,
        ..TypeCheckingConfig::default()
    };

    let checker = checker_for(nodes.clone(), &b, Vec::new(), TypesByText(Vec::new()), config);
    let shim = shim_text(&checker);
    let completion = checker.get_global_completions(None, &app_cmp(), &read).unwrap();
    assert!(
        shim[..completion.component_context.position_in_file].ends_with("this."),
        "{}",
        shim
    );
    assert_eq!(completion.template_context.len(), 1);
    assert_eq!(completion.template_context["ref"].kind, CompletionKind::Reference);
    let node_context = completion.node_context.unwrap();
    assert!(text_at(&shim, &node_context).starts_with("this.us"));

    let member = checker.get_expression_completion_location(&read, &app_cmp()).unwrap();
    assert!(text_at(&shim, &member).starts_with("us"));
    assert!(checker
        .get_expression_completion_location(&AST::empty(0), &app_cmp())
        .is_none());

    let plain = checker_for(nodes, &b, Vec::new(), TypesByText(Vec::new()), TypeCheckingConfig::default());
    assert!(plain.get_global_completions(None, &app_cmp(), &read).is_none());
}
