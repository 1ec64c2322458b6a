use std::sync::Arc;

use angular_compiler::render3::r3_ast::R3Node;
use angular_compiler::testing::TemplateBuilder;

use crate::ngtsc::diagnostics::ErrorCode;
use crate::ngtsc::typecheck::api::{InputFlags, TemplateGuardType, TypeCheckingConfig};
use crate::ngtsc::typecheck::test::util::{code, component_dir, directive, pipe, type_check};

mod reference_tests {
    use super::*;

    #[test]
    fn should_report_missing_reference_target_and_keep_checking() {
        let template = r#"<div #user="missing" [title]="user.name"></div>"#;
        let mut b = TemplateBuilder::new(template);
        let mut div = b.element("div", template);
        div.references.push(b.reference("user", "missing", "#user=\"missing\""));
        let value = b.prop(b.ident_after("[title]", "user"), "name");
        div.inputs.push(b.input("title", value, "[title]=\"user.name\""));
        let file = b.file().clone();

        let out = type_check(&[R3Node::Element(div)], &file, Vec::new(), Vec::new(), TypeCheckingConfig::default());

        assert_eq!(out.diagnostics.len(), 1, "{:?}", out.diagnostics);
        let diag = &out.diagnostics[0];
        assert_eq!(diag.code, code(ErrorCode::MissingReferenceTarget));
        assert_eq!(diag.message, "No directive found with exportAs 'missing'.");
        assert_eq!(diag.start, template.find("#user").unwrap());
        // The reference becomes an untyped placeholder that the binding still reads.
        assert!(out.text.contains("null as any"), "{}", out.text);
        assert!(out.text.contains(".name"), "{}", out.text);
    }

    #[test]
    fn should_type_element_references_as_the_element() {
        let template = r#"<input #box><span>{{ box.value }}</span>"#;
        let mut b = TemplateBuilder::new(template);
        let mut input = b.element("input", "<input #box>");
        input.references.push(b.reference("box", "", "#box"));
        let mut span = b.element("span", "<span>{{ box.value }}</span>");
        let read = b.prop(b.ident_after("{{", "box"), "value");
        span.children.push(b.bound_text(read, "{{ box.value }}"));
        let file = b.file().clone();

        let out = type_check(
            &[R3Node::Element(input), R3Node::Element(span)],
            &file,
            Vec::new(),
            Vec::new(),
            TypeCheckingConfig::default(),
        );

        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        assert!(out.text.contains("document.createElement(\"input\")"), "{}", out.text);
    }
}

mod variable_tests {
    use super::*;

    #[test]
    fn should_report_duplicate_variable_once_with_first_declaration() {
        let template = r#"<ng-template let-item let-item="index"></ng-template>"#;
        let mut b = TemplateBuilder::new(template);
        let mut tmpl = b.template(template);
        tmpl.variables.push(b.nth_variable("item", "", "let-item", 0));
        tmpl.variables.push(b.nth_variable("item", "index", "let-item", 1));
        let file = b.file().clone();

        let out = type_check(&[R3Node::Template(tmpl)], &file, Vec::new(), Vec::new(), TypeCheckingConfig::default());

        assert_eq!(out.diagnostics.len(), 1, "{:?}", out.diagnostics);
        let diag = &out.diagnostics[0];
        assert_eq!(diag.code, code(ErrorCode::DuplicateVariableDeclaration));
        assert_eq!(diag.start, template.rfind("let-item").unwrap());
        assert_eq!(diag.related_information.len(), 1);
        assert_eq!(diag.related_information[0].start, template.find("let-item").unwrap());
        assert_eq!(
            diag.related_information[0].text,
            "The variable 'item' was first declared here."
        );
    }
}

mod binding_tests {
    use super::*;

    #[test]
    fn should_report_split_two_way_binding_to_element_event() {
        let template = r#"<app-c [(x)]="value"></app-c>"#;
        let mut b = TemplateBuilder::new(template);
        let mut el = b.element("app-c", template);
        let (input, output) = b.two_way("x", "value", "[(x)]=\"value\"");
        el.inputs.push(input);
        el.outputs.push(output);
        let file = b.file().clone();
        let dir = Arc::new(component_dir("CCmp", "c", "app-c").with_input("x"));

        let out = type_check(&[R3Node::Element(el)], &file, vec![dir], Vec::new(), TypeCheckingConfig::default());

        let split: Vec<_> = out
            .diagnostics
            .iter()
            .filter(|d| d.code == code(ErrorCode::SplitTwoWayBinding))
            .collect();
        assert_eq!(split.len(), 1, "{:?}", out.diagnostics);
        let related = &split[0].related_information;
        assert_eq!(related.len(), 2);
        assert_eq!(related[0].text, "The property half of the binding is to the 'CCmp' component.");
        assert!(related[1].text.contains("native event called 'x' on the <app-c> DOM element"));
        assert_eq!(split[0].start, template.find('x').unwrap());
    }

    #[test]
    fn should_assign_bound_inputs_to_the_directive() {
        let template = r#"<app-c [name]="title"></app-c>"#;
        let mut b = TemplateBuilder::new(template);
        let mut el = b.element("app-c", template);
        el.inputs.push(b.input("name", b.ident("title"), "[name]=\"title\""));
        let file = b.file().clone();
        let dir = Arc::new(component_dir("CCmp", "c", "app-c").with_input("name"));

        let strict = type_check(
            &[R3Node::Element(el.clone())],
            &file,
            vec![dir.clone()],
            Vec::new(),
            TypeCheckingConfig::default(),
        );
        assert!(strict.diagnostics.is_empty(), "{:?}", strict.diagnostics);
        assert!(strict.text.contains("var _t1"), "{}", strict.text);
        assert!(strict.text.contains("i1.CCmp"), "{}", strict.text);
        assert!(strict.text.contains(".name"), "{}", strict.text);

        let loose = type_check(
            &[R3Node::Element(el)],
            &file,
            vec![dir],
            Vec::new(),
            TypeCheckingConfig {
                check_type_of_input_bindings: false,
                ..TypeCheckingConfig::default()
            },
        );
        assert!(loose.text.contains(" as any"), "{}", loose.text);
    }

    #[test]
    fn should_report_missing_required_inputs() {
        let template = r#"<app-c></app-c>"#;
        let mut b = TemplateBuilder::new(template);
        let el = b.element("app-c", template);
        let file = b.file().clone();
        let dir = Arc::new(
            component_dir("CCmp", "c", "app-c")
                .with_input_flags("name", "name", InputFlags::REQUIRED)
                .with_input_flags("size", "size", InputFlags::REQUIRED)
                .with_input("optional"),
        );

        let out = type_check(&[R3Node::Element(el)], &file, vec![dir], Vec::new(), TypeCheckingConfig::default());

        assert_eq!(out.diagnostics.len(), 1, "{:?}", out.diagnostics);
        assert_eq!(out.diagnostics[0].code, code(ErrorCode::MissingRequiredInputs));
        assert_eq!(
            out.diagnostics[0].message,
            "Required inputs 'name', 'size' from component CCmp must be specified."
        );
        assert_eq!(out.diagnostics[0].start, 0);
    }

    #[test]
    fn should_narrow_template_bodies_with_binding_guards() {
        let template = r#"<ng-template [ngIf]="show"><span>{{ show }}</span></ng-template>"#;
        let mut b = TemplateBuilder::new(template);
        let mut tmpl = b.template(template);
        tmpl.inputs.push(b.input("ngIf", b.ident("show"), "[ngIf]=\"show\""));
        let mut span = b.element("span", "<span>{{ show }}</span>");
        span.children.push(b.bound_text(b.ident_after("{{", "show"), "{{ show }}"));
        tmpl.children.push(R3Node::Element(span));
        let file = b.file().clone();
        let ng_if = Arc::new(
            directive("NgIf", "ng_if", "[ngIf]")
                .structural()
                .with_input("ngIf")
                .with_template_guard("ngIf", TemplateGuardType::Binding),
        );

        let out = type_check(&[R3Node::Template(tmpl)], &file, vec![ng_if], Vec::new(), TypeCheckingConfig::default());

        assert!(out.text.contains("if (this.show"), "{}", out.text);
    }
}

mod pipe_tests {
    use super::*;

    #[test]
    fn should_call_transform_on_known_pipes() {
        let template = "{{ name | upper }}";
        let mut b = TemplateBuilder::new(template);
        let expr = b.pipe(b.ident("name"), "upper", Vec::new());
        let text = b.bound_text(expr, template);
        let file = b.file().clone();

        let out = type_check(&[text], &file, Vec::new(), vec![pipe("upper", "UpperPipe")], TypeCheckingConfig::default());

        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        assert!(out.text.contains("var _pipe1: i1.UpperPipe = null!;"), "{}", out.text);
        assert!(out.text.contains("_pipe1.transform("), "{}", out.text);
    }

    #[test]
    fn should_report_each_usage_of_a_missing_pipe() {
        let template = "{{ a | nope }} {{ b | nope }}";
        let mut b = TemplateBuilder::new(template);
        let first = b.pipe(b.ident("a"), "nope", Vec::new());
        let first = b.bound_text(first, "{{ a | nope }}");
        let second = b.pipe(b.ident_after("}}", "b"), "nope", Vec::new());
        let second = b.bound_text(second, "{{ b | nope }}");
        let file = b.file().clone();

        let out = type_check(&[first, second], &file, Vec::new(), Vec::new(), TypeCheckingConfig::default());

        let missing: Vec<usize> = out
            .diagnostics
            .iter()
            .filter(|d| d.code == code(ErrorCode::MissingPipe))
            .map(|d| d.start)
            .collect();
        assert_eq!(missing, vec![template.find("nope").unwrap(), template.rfind("nope").unwrap()]);
        assert_eq!(out.diagnostics[0].message, "No pipe found with name 'nope'.");
    }
}
