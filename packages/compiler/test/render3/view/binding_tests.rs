//! Binding Tests
//!
//! Directive matching, reference resolution and expression targets of `R3TargetBinder`.

use angular_compiler::expression_parser::AST;
use angular_compiler::render3::r3_ast::{R3Node, TemplateAttr};
use angular_compiler::render3::view::t2_api::{
    BoundTarget, ConsumerOfBinding, DirectiveMeta, InputOutputPropertySet, ReferenceTarget,
    TemplateEntity,
};
use angular_compiler::render3::view::t2_binder::R3TargetBinder;
use angular_compiler::testing::TemplateBuilder;
use std::collections::HashSet;

/// A `InputOutputPropertySet` which only uses an identity mapping for fields and properties.
#[derive(Debug, Clone, Default, PartialEq)]
struct IdentityInputMapping {
    names: HashSet<String>,
}

impl IdentityInputMapping {
    fn new(names: &[&str]) -> Self {
        IdentityInputMapping {
            names: names.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl InputOutputPropertySet for IdentityInputMapping {
    fn has_binding_property_name(&self, property_name: &str) -> bool {
        self.names.contains(property_name)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct TestDirectiveMeta {
    name: String,
    selector: String,
    export_as: Vec<String>,
    inputs: IdentityInputMapping,
    outputs: IdentityInputMapping,
    is_component: bool,
    is_structural: bool,
}

impl DirectiveMeta for TestDirectiveMeta {
    fn name(&self) -> &str {
        &self.name
    }
    fn selector(&self) -> Option<&str> {
        Some(&self.selector)
    }
    fn is_component(&self) -> bool {
        self.is_component
    }
    fn inputs(&self) -> &dyn InputOutputPropertySet {
        &self.inputs
    }
    fn outputs(&self) -> &dyn InputOutputPropertySet {
        &self.outputs
    }
    fn export_as(&self) -> &[String] {
        &self.export_as
    }
    fn is_structural(&self) -> bool {
        self.is_structural
    }
}

fn dir(name: &str, selector: &str) -> TestDirectiveMeta {
    TestDirectiveMeta {
        name: name.to_string(),
        selector: selector.to_string(),
        export_as: vec![],
        inputs: IdentityInputMapping::default(),
        outputs: IdentityInputMapping::default(),
        is_component: false,
        is_structural: false,
    }
}

fn binder() -> R3TargetBinder<TestDirectiveMeta> {
    let mut ng_for = dir("NgFor", "[ngFor][ngForOf]");
    ng_for.inputs = IdentityInputMapping::new(&["ngForOf"]);
    ng_for.is_structural = true;

    let mut model = dir("NgModel", "[ngModel]");
    model.inputs = IdentityInputMapping::new(&["ngModel"]);
    model.outputs = IdentityInputMapping::new(&["ngModelChange"]);
    model.export_as = vec!["ngModel".to_string()];

    let mut cmp = dir("UserCmp", "user-cmp");
    cmp.is_component = true;
    cmp.inputs = IdentityInputMapping::new(&["user"]);

    R3TargetBinder::from_directives(vec![ng_for, model, cmp])
}

#[test]
fn should_match_directives_and_record_binding_consumers() {
    let tpl = r#"<input [ngModel]="name" [value]="name" (ngModelChange)="save()" (blur)="save()">"#;
    let mut b = TemplateBuilder::new(tpl);
    let mut input = b.element("input", tpl);
    let name = b.ident("name");
    let model_input = b.input("ngModel", name, r#"[ngModel]="name""#);
    let value = b.ident_after("[value]", "name");
    let value_input = b.input("value", value, r#"[value]="name""#);
    let save = b.call(b.ident("save"), vec![]);
    let change = b.output("ngModelChange", save, r#"(ngModelChange)="save()""#);
    let save2 = b.call(b.ident_after("(blur)", "save"), vec![]);
    let blur = b.output("blur", save2, r#"(blur)="save()""#);
    let (model_id, value_id, change_id, blur_id) = (model_input.id, value_input.id, change.id, blur.id);
    input.inputs = vec![model_input, value_input];
    input.outputs = vec![change, blur];
    let input_id = input.id;

    let bound = binder().bind(&[R3Node::Element(input)]);

    let directives = bound.get_directives_of_node(input_id).unwrap();
    assert_eq!(directives.iter().map(|d| d.name()).collect::<Vec<_>>(), vec!["NgModel"]);
    assert!(matches!(
        bound.get_consumer_of_binding(model_id),
        Some(ConsumerOfBinding::Directive(d)) if d.name == "NgModel"
    ));
    assert_eq!(bound.get_consumer_of_binding(value_id), Some(&ConsumerOfBinding::Element(input_id)));
    assert!(matches!(
        bound.get_consumer_of_binding(change_id),
        Some(ConsumerOfBinding::Directive(_))
    ));
    assert_eq!(bound.get_consumer_of_binding(blur_id), Some(&ConsumerOfBinding::Element(input_id)));
    assert_eq!(bound.get_used_directives().len(), 1);
}

#[test]
fn should_resolve_references_to_components_elements_and_export_names() {
    let tpl = r#"<user-cmp #cmp></user-cmp><input ngModel #model="ngModel" #el><div #bad="missing"></div>"#;
    let mut b = TemplateBuilder::new(tpl);
    let mut cmp = b.element("user-cmp", "<user-cmp #cmp></user-cmp>");
    let cmp_ref = b.reference("cmp", "", "#cmp");
    let cmp_ref_id = cmp_ref.id;
    cmp.references.push(cmp_ref);

    let mut input = b.element("input", r#"<input ngModel #model="ngModel" #el>"#);
    input.attributes.push(b.text_attribute("ngModel", "", "ngModel"));
    let model_ref = b.reference("model", "ngModel", r#"#model="ngModel""#);
    let el_ref = b.reference("el", "", "#el");
    let (model_ref_id, el_ref_id) = (model_ref.id, el_ref.id);
    input.references = vec![model_ref, el_ref];

    let mut div = b.element("div", r#"<div #bad="missing"></div>"#);
    let bad = b.reference("bad", "missing", r#"#bad="missing""#);
    let bad_id = bad.id;
    div.references.push(bad);

    let (cmp_id, input_id) = (cmp.id, input.id);
    let bound = binder().bind(&[R3Node::Element(cmp), R3Node::Element(input), R3Node::Element(div)]);

    match bound.get_reference_target(cmp_ref_id) {
        Some(ReferenceTarget::DirectiveOnNode { directive, node }) => {
            assert_eq!(directive.name, "UserCmp");
            assert_eq!(*node, cmp_id);
        }
        other => panic!("unexpected target {:?}", other),
    }
    assert!(matches!(
        bound.get_reference_target(model_ref_id),
        Some(ReferenceTarget::DirectiveOnNode { directive, .. }) if directive.name == "NgModel"
    ));
    assert_eq!(bound.get_reference_target(el_ref_id), Some(&ReferenceTarget::Element(input_id)));
    assert!(bound.get_reference_target(bad_id).is_none());
}

#[test]
fn should_resolve_expression_targets_through_template_scopes() {
    let tpl = r#"<ng-template ngFor let-item [ngForOf]="items" #tpl><span>{{ item }} {{ tpl }} {{ other }}</span></ng-template>"#;
    let mut b = TemplateBuilder::new(tpl);
    let mut tmpl = b.template(tpl);
    tmpl.attributes.push(b.text_attribute("ngFor", "", "ngFor"));
    let item = b.variable("item", "$implicit", "let-item");
    let item_id = item.id;
    tmpl.variables.push(item);
    let items = b.ident("items");
    let items_expr_span = items.source_span();
    let of = b.input("ngForOf", items, r#"[ngForOf]="items""#);
    tmpl.inputs.push(of);
    let tpl_ref = b.reference("tpl", "", "#tpl");
    let tpl_ref_id = tpl_ref.id;
    tmpl.references.push(tpl_ref);

    let mut span = b.element("span", "<span>");
    let item_read = b.ident_after("<span>", "item");
    let tpl_read = b.ident_after("{{ tpl", "tpl");
    let other_read = b.ident("other");
    let (item_span, tpl_span, other_span) =
        (item_read.source_span(), tpl_read.source_span(), other_read.source_span());
    span.children.push(b.bound_text(item_read, "{{ item }}"));
    span.children.push(b.bound_text(tpl_read, "{{ tpl }}"));
    span.children.push(b.bound_text(other_read, "{{ other }}"));
    tmpl.children.push(R3Node::Element(span));
    let tmpl_id = tmpl.id;

    let bound = binder().bind(&[R3Node::Template(tmpl)]);

    let target = |start: usize, end: usize, name: &str| {
        let expr = AST::ident(name, start);
        assert_eq!(expr.source_span().end, end);
        bound.get_expression_target(&expr)
    };
    assert_eq!(target(item_span.start, item_span.end, "item"), Some(TemplateEntity::Variable(item_id)));
    assert_eq!(target(tpl_span.start, tpl_span.end, "tpl"), Some(TemplateEntity::Reference(tpl_ref_id)));
    assert_eq!(target(other_span.start, other_span.end, "other"), None);
    assert_eq!(target(items_expr_span.start, items_expr_span.end, "items"), None);

    assert_eq!(bound.get_definition_node_of_symbol(TemplateEntity::Variable(item_id)), Some(tmpl_id));
    assert_eq!(bound.get_definition_node_of_symbol(TemplateEntity::Reference(tpl_ref_id)), None);
    assert_eq!(bound.get_nesting_level(Some(tmpl_id)), 1);
    assert_eq!(bound.get_nesting_level(None), 0);
    assert_eq!(
        bound.get_directives_of_node(tmpl_id).unwrap()[0].name(),
        "NgFor"
    );
}

#[test]
fn should_collect_used_pipes_in_order() {
    let tpl = "{{ a | date }} {{ b | async | date }}";
    let mut b = TemplateBuilder::new(tpl);
    let a = b.ident("a");
    let a_piped = b.pipe(a, "date", vec![]);
    let b_read = b.ident("b");
    let b_async = b.pipe(b_read, "async", vec![]);
    let b_piped = b.pipe(b_async, "date", vec![]);
    let first = b.bound_text(a_piped, "{{ a | date }}");
    let second = b.bound_text(b_piped, "{{ b | async | date }}");

    let bound = binder().bind(&[first, second]);
    assert_eq!(bound.get_used_pipes(), vec!["date".to_string(), "async".to_string()]);
}

#[test]
fn should_match_structural_template_attrs() {
    let tpl = r#"<div *ngFor="let x of xs"></div>"#;
    let mut b = TemplateBuilder::new(tpl);
    let mut tmpl = b.template(tpl);
    tmpl.template_attrs.push(TemplateAttr::Text(b.text_attribute("ngFor", "", "ngFor")));
    let xs = b.ident("xs");
    b.template_attr(&mut tmpl, "ngForOf", xs, "of xs");
    let tmpl_id = tmpl.id;
    let bound = binder().bind(&[R3Node::Template(tmpl)]);
    assert_eq!(bound.get_directives_of_node(tmpl_id).map(|d| d.len()), Some(1));
}
