// Completion Engine
//
// Finds where completions for a template expression can be asked of the host: the
// component context anchor every root scope carries, and the synthesized node of the
// expression itself.

use angular_compiler::expression_parser::ast::AST;
use angular_compiler::render3::r3_ast::{NodeId, R3Node, Reference, Template};
use indexmap::IndexMap;

use super::comments::{find_first_matching_node, ExpressionIdentifier, FindOptions};
use super::template_symbol_builder::TcbPlacement;
use super::ts_ast::{Expr, ExprKind, Printer, TcbDecl};
use crate::ngtsc::typecheck::api::{CompletionKind, GlobalCompletion, TcbLocation, TemplateEntityCompletion};

pub struct CompletionEngine<'a> {
    tcb: &'a TcbDecl,
    placement: TcbPlacement<'a>,
    component_context: Option<TcbLocation>,
}

impl<'a> CompletionEngine<'a> {
    pub fn new(tcb: &'a TcbDecl, placement: TcbPlacement<'a>) -> Self {
        let anchor = find_first_matching_node(
            &tcb.body,
            &FindOptions {
                with_expression_identifier: Some(ExpressionIdentifier::ComponentCompletion),
                filter: Some(is_property),
                ..FindOptions::default()
            },
        );
        // The anchor is `this.` with an empty name; completions go right after the dot.
        let component_context = anchor
            .and_then(|node| Printer::locate(tcb, node))
            .map(|(_, end)| placement.location(end));
        Self {
            tcb,
            placement,
            component_context,
        }
    }

    /// Completions for an expression with no explicit receiver, e.g. `{{ fo| }}`, inside
    /// `context`, or the root template when `None`. Nothing is offered when the block
    /// carries no component context anchor.
    pub fn get_global_completions(
        &self,
        nodes: &[R3Node],
        context: Option<NodeId>,
        node: &AST,
    ) -> Option<GlobalCompletion> {
        let component_context = self.component_context.clone()?;
        let mut template_context = IndexMap::new();
        if !collect_scope(nodes, context, &mut template_context) {
            return None;
        }
        let node_context = match node {
            AST::EmptyExpr(empty) => self.locate_first(&FindOptions {
                with_span: Some(empty.source_span),
                ..FindOptions::default()
            }),
            AST::PropertyRead(read) if read.receiver.is_implicit_receiver() => self.locate_first(&FindOptions {
                with_span: Some(read.source_span),
                filter: Some(is_property),
                ..FindOptions::default()
            }),
            _ => None,
        };
        Some(GlobalCompletion {
            component_context,
            template_context,
            node_context,
        })
    }

    /// Where members of the receiver of `expr`, a property read or write, complete.
    pub fn get_expression_completion_location(&self, expr: &AST) -> Option<TcbLocation> {
        let span = match expr {
            AST::PropertyRead(read) => read.source_span,
            AST::SafePropertyRead(read) => read.source_span,
            AST::PropertyWrite(write) => write.source_span,
            _ => return None,
        };
        let node = find_first_matching_node(
            &self.tcb.body,
            &FindOptions {
                with_span: Some(span),
                ..FindOptions::default()
            },
        )?;
        let access = completable_access(node)?;
        let (_, end) = Printer::locate(self.tcb, access)?;
        let name_len = match &access.kind {
            ExprKind::Property { name, .. } => name.len(),
            _ => 0,
        };
        Some(self.placement.location(end - name_len))
    }

    fn locate_first(&self, opts: &FindOptions) -> Option<TcbLocation> {
        let node = find_first_matching_node(&self.tcb.body, opts)?;
        let (start, _) = Printer::locate(self.tcb, node)?;
        Some(self.placement.location(start))
    }
}

fn is_property(expr: &Expr) -> bool {
    matches!(expr.kind, ExprKind::Property { .. })
}

/// The property access inside a translated read or write.
fn completable_access(expr: &Expr) -> Option<&Expr> {
    match &expr.kind {
        ExprKind::Property { .. } => Some(expr),
        ExprKind::Paren(inner) | ExprKind::NonNull(inner) => completable_access(inner),
        ExprKind::Binary { left, op, .. } if op == "=" => completable_access(left),
        // Loose safe navigation: `null as any ? a!.b : undefined`.
        ExprKind::Conditional { when_true, .. } => completable_access(when_true),
        _ => None,
    }
}

/// Adds the entities in scope at `context` to `out`, outer scopes first. Returns `false`
/// when `context` is not a template of `nodes`.
fn collect_scope(
    nodes: &[R3Node],
    context: Option<NodeId>,
    out: &mut IndexMap<String, TemplateEntityCompletion>,
) -> bool {
    for reference in level_references(nodes) {
        out.insert(
            reference.name.clone(),
            TemplateEntityCompletion {
                kind: CompletionKind::Reference,
                span: (reference.source_span.start.offset, reference.source_span.end.offset),
            },
        );
    }
    let Some(context) = context else {
        return true;
    };
    for template in level_templates(nodes) {
        let mut inner = out.clone();
        for variable in &template.variables {
            inner.insert(
                variable.name.clone(),
                TemplateEntityCompletion {
                    kind: CompletionKind::Variable,
                    span: (variable.source_span.start.offset, variable.source_span.end.offset),
                },
            );
        }
        let target = if template.id == context { None } else { Some(context) };
        if collect_scope(&template.children, target, &mut inner) {
            *out = inner;
            return true;
        }
    }
    false
}

/// References declared in the scope of `nodes`, which includes references on nested
/// templates but not inside them.
fn level_references(nodes: &[R3Node]) -> Vec<&Reference> {
    let mut out = Vec::new();
    for node in nodes {
        match node {
            R3Node::Element(element) => {
                out.extend(&element.references);
                out.extend(level_references(&element.children));
            }
            R3Node::Template(template) => out.extend(&template.references),
            _ => {}
        }
    }
    out
}

fn level_templates(nodes: &[R3Node]) -> Vec<&Template> {
    let mut out = Vec::new();
    for node in nodes {
        match node {
            R3Node::Element(element) => out.extend(level_templates(&element.children)),
            R3Node::Template(template) => out.push(template),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use angular_compiler::testing::TemplateBuilder;

    use super::*;

    #[test]
    fn test_inner_scopes_see_outer_references_and_shadow_them() {
        let template = r#"<input #a><ng-template let-a let-b><span #c></span></ng-template>"#;
        let mut b = TemplateBuilder::new(template);
        let mut input = b.element("input", "<input #a>");
        input.references.push(b.reference("a", "", "#a"));
        let mut span = b.element("span", r#"<span #c></span>"#);
        span.references.push(b.reference("c", "", "#c"));
        let mut tpl = b.template(r#"<ng-template let-a let-b><span #c></span></ng-template>"#);
        tpl.variables.push(b.variable("a", "$implicit", "let-a"));
        tpl.variables.push(b.variable("b", "$implicit", "let-b"));
        tpl.children.push(R3Node::Element(span));
        let tpl_id = tpl.id;
        let nodes = vec![R3Node::Element(input), R3Node::Template(tpl)];

        let mut root = IndexMap::new();
        assert!(collect_scope(&nodes, None, &mut root));
        assert_eq!(root.keys().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(root["a"].kind, CompletionKind::Reference);

        let mut inner = IndexMap::new();
        assert!(collect_scope(&nodes, Some(tpl_id), &mut inner));
        assert_eq!(inner.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(inner["a"].kind, CompletionKind::Variable);
        assert_eq!(inner["c"].kind, CompletionKind::Reference);

        let mut missing = IndexMap::new();
        assert!(!collect_scope(&nodes, Some(NodeId(999)), &mut missing));
    }

    #[test]
    fn test_completable_access_sees_through_writes_and_loose_navigation() {
        let write = Expr::this().prop("name").assign(Expr::string("x")).paren();
        assert!(matches!(&completable_access(&write).unwrap().kind, ExprKind::Property { name, .. } if name == "name"));

        let loose = Expr::new(ExprKind::Conditional {
            condition: Box::new(Expr::null_as_any()),
            when_true: Box::new(Expr::this().non_null().prop("user")),
            when_false: Box::new(Expr::new(ExprKind::Undefined)),
        })
        .paren();
        assert!(matches!(&completable_access(&loose).unwrap().kind, ExprKind::Property { name, .. } if name == "user"));
        assert!(completable_access(&Expr::string("x")).is_none());
    }
}
