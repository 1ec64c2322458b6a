// Template Symbol Builder
//
// Answers what a template node turned into inside its type check block. The synthesized
// nodes are found again through the span and tag comments they were generated with.

use angular_compiler::expression_parser::ast::{AbsoluteSourceSpan, AST};
use angular_compiler::parse_util::ParseSourceSpan;
use angular_compiler::render3::r3_ast::{
    BoundAttribute, BoundEvent, Element, NodeId, R3Node, Reference, Template, TemplateAttr, Variable,
};
use angular_compiler::render3::view::t2_api::{BoundTarget, ConsumerOfBinding, ReferenceTarget, TemplateEntity};
use ts::{HostType, HostTypeChecker, Program, SourceFile};

use super::comments::{find_all_matching_nodes, find_first_matching_node, ExpressionIdentifier, FindOptions};
use super::ts_ast::{Expr, ExprKind, Printer, Stmt, TcbDecl};
use crate::ngtsc::file_system::AbsoluteFsPath;
use crate::ngtsc::typecheck::api::{
    BindingSymbol, BindingTarget, DirectiveRef, DirectiveSymbol, TcbLocation, TemplateNode, TemplateSymbol,
};

/// Where a type check block was printed.
#[derive(Debug, Clone, Copy)]
pub struct TcbPlacement<'a> {
    pub path: &'a AbsoluteFsPath,
    pub is_shim: bool,
    /// Offset of the block's `/*tcbN*/` comment in the file.
    pub block_start: usize,
}

impl TcbPlacement<'_> {
    pub fn location(&self, offset_in_block: usize) -> TcbLocation {
        TcbLocation {
            tcb_path: self.path.clone(),
            is_shim_file: self.is_shim,
            position_in_file: self.block_start + offset_in_block,
        }
    }
}

/// Type queries against the file a block was printed into.
#[derive(Clone, Copy)]
pub struct HostTypes<'a> {
    pub host: &'a dyn HostTypeChecker,
    pub program: &'a Program,
    pub file: &'a SourceFile,
}

pub struct SymbolBuilder<'a> {
    tcb: &'a TcbDecl,
    placement: TcbPlacement<'a>,
    bound: &'a dyn BoundTarget<DirectiveRef>,
    nodes: &'a [R3Node],
    types: Option<HostTypes<'a>>,
}

impl<'a> SymbolBuilder<'a> {
    pub fn new(
        tcb: &'a TcbDecl,
        placement: TcbPlacement<'a>,
        bound: &'a dyn BoundTarget<DirectiveRef>,
        nodes: &'a [R3Node],
    ) -> Self {
        Self {
            tcb,
            placement,
            bound,
            nodes,
            types: None,
        }
    }

    pub fn with_types(mut self, types: HostTypes<'a>) -> Self {
        self.types = Some(types);
        self
    }

    pub fn get_symbol(&self, node: TemplateNode<'_>) -> Option<TemplateSymbol> {
        match node {
            TemplateNode::Element(element) => self.element_symbol(element),
            TemplateNode::Template(template) => self.template_symbol(template),
            TemplateNode::BoundAttribute(binding) => self.input_symbol(binding),
            TemplateNode::BoundEvent(event) => self.output_symbol(event),
            TemplateNode::Reference(reference) => self.reference_symbol(reference),
            TemplateNode::Variable(variable) => self.variable_symbol(variable),
            TemplateNode::BoundText(text) => self.expression_symbol(&text.value),
            TemplateNode::Expression(ast) => self.expression_symbol(ast),
            // Static attributes are assigned as plain strings and carry no binding id.
            TemplateNode::TextAttribute(_) => None,
        }
    }

    fn element_symbol(&self, element: &Element) -> Option<TemplateSymbol> {
        let init = find_first_matching_node(
            &self.tcb.body,
            &FindOptions {
                with_span: Some(absolute(&element.start_source_span)),
                filter: Some(is_create_element),
                ..FindOptions::default()
            },
        )?;
        let name = declared_name(&self.tcb.body, init)?;
        let (start, end) = Printer::locate(self.tcb, name)?;
        Some(TemplateSymbol::Element {
            node: element.id,
            ty: self.type_at(start, end),
            tcb_location: self.placement.location(start),
            directives: self.directives_of_host(element.id, &element.start_source_span),
        })
    }

    fn template_symbol(&self, template: &Template) -> Option<TemplateSymbol> {
        Some(TemplateSymbol::Template {
            node: template.id,
            directives: self.directives_of_host(template.id, &template.start_source_span),
        })
    }

    /// Directive instance locals declared for the element or template `host`.
    fn directives_of_host(&self, host: NodeId, start_span: &ParseSourceSpan) -> Vec<DirectiveSymbol> {
        let locals = find_all_matching_nodes(
            &self.tcb.body,
            &FindOptions {
                with_span: Some(absolute(start_span)),
                with_expression_identifier: Some(ExpressionIdentifier::DirectiveInstance),
                filter: Some(is_identifier),
            },
        );
        let matched = self.bound.get_directives_of_node(host).unwrap_or_default();
        locals
            .into_iter()
            .filter_map(|local| self.directive_symbol_of_local(local, matched))
            .collect()
    }

    fn directive_symbol_of_local(&self, local: &Expr, matched: &[DirectiveRef]) -> Option<DirectiveSymbol> {
        let ExprKind::Identifier(name) = &local.kind else {
            return None;
        };
        let class = self.tcb.directive_locals.get(name)?;
        let directive = matched.iter().find(|dir| dir.class_ref() == class)?;
        let (start, end) = Printer::locate(self.tcb, local)?;
        Some(DirectiveSymbol {
            directive: directive.clone(),
            ty: self.type_at(start, end),
            tcb_location: self.placement.location(start),
        })
    }

    /// The declaration of the directive local called `name`.
    fn directive_local_named(&self, name: &str, host: NodeId) -> Option<DirectiveSymbol> {
        let matched = self.bound.get_directives_of_node(host).unwrap_or_default();
        find_all_matching_nodes(
            &self.tcb.body,
            &FindOptions {
                with_expression_identifier: Some(ExpressionIdentifier::DirectiveInstance),
                filter: Some(is_identifier),
                ..FindOptions::default()
            },
        )
        .into_iter()
        .find(|local| matches!(&local.kind, ExprKind::Identifier(n) if n == name))
        .and_then(|local| self.directive_symbol_of_local(local, matched))
    }

    fn input_symbol(&self, binding: &BoundAttribute) -> Option<TemplateSymbol> {
        let consumer = self.bound.get_consumer_of_binding(binding.id)?;
        let dir = match consumer {
            ConsumerOfBinding::Element(host) | ConsumerOfBinding::Template(host) => {
                return self.dom_binding_symbol(*host);
            }
            ConsumerOfBinding::Directive(dir) => dir,
        };
        let host = self.host_of_binding(binding.id)?;
        let targets = find_all_matching_nodes(
            &self.tcb.body,
            &FindOptions {
                with_span: Some(absolute(&binding.key_span)),
                filter: Some(is_access),
                ..FindOptions::default()
            },
        );
        let bindings: Vec<BindingSymbol> = targets
            .into_iter()
            .filter_map(|target| {
                let ExprKind::Identifier(local) = &access_object(target)?.kind else {
                    return None;
                };
                let symbol = self.directive_local_named(local, host)?;
                if symbol.directive.class_ref() != dir.class_ref() {
                    return None;
                }
                let (start, end) = Printer::locate(self.tcb, target)?;
                Some(BindingSymbol {
                    target: BindingTarget::Directive(symbol),
                    ty: self.type_at(start, end),
                    tcb_location: self.placement.location(self.access_position(target, start, end)),
                })
            })
            .collect();
        if bindings.is_empty() {
            None
        } else {
            Some(TemplateSymbol::Input { bindings })
        }
    }

    fn dom_binding_symbol(&self, host: NodeId) -> Option<TemplateSymbol> {
        let symbol = match find_host(self.nodes, host)? {
            HostNode::Element(element) => self.element_symbol(element)?,
            HostNode::Template(template) => self.template_symbol(template)?,
        };
        Some(TemplateSymbol::DomBinding { host: Box::new(symbol) })
    }

    fn output_symbol(&self, event: &BoundEvent) -> Option<TemplateSymbol> {
        let consumer = self.bound.get_consumer_of_binding(event.id)?;
        let accesses = find_all_matching_nodes(
            &self.tcb.body,
            &FindOptions {
                with_span: Some(absolute(&event.key_span)),
                filter: Some(is_access),
                ..FindOptions::default()
            },
        );
        let bindings: Vec<BindingSymbol> = match consumer {
            ConsumerOfBinding::Element(host) | ConsumerOfBinding::Template(host) => accesses
                .into_iter()
                .filter(|access| matches!(&access.kind, ExprKind::Property { name, .. } if name == "addEventListener"))
                .filter_map(|access| {
                    let (start, end) = Printer::locate(self.tcb, access)?;
                    let target = match consumer {
                        ConsumerOfBinding::Template(_) => BindingTarget::Template(*host),
                        _ => BindingTarget::Element(*host),
                    };
                    Some(BindingSymbol {
                        target,
                        ty: self.type_at(start, end),
                        tcb_location: self.placement.location(self.access_position(access, start, end)),
                    })
                })
                .collect(),
            ConsumerOfBinding::Directive(dir) => {
                let host = self.host_of_binding(event.id)?;
                let fields: Vec<String> = dir
                    .outputs
                    .get_by_binding_property_name(&event.name)
                    .into_iter()
                    .map(|mapping| mapping.class_property_name.clone())
                    .collect();
                accesses
                    .into_iter()
                    .filter_map(|access| {
                        let ExprKind::Element { object, index, .. } = &access.kind else {
                            return None;
                        };
                        let (ExprKind::Identifier(local), ExprKind::StringLit(field)) = (&object.kind, &index.kind)
                        else {
                            return None;
                        };
                        if !fields.contains(field) {
                            return None;
                        }
                        let symbol = self.directive_local_named(local, host)?;
                        let (start, end) = Printer::locate(self.tcb, access)?;
                        Some(BindingSymbol {
                            target: BindingTarget::Directive(symbol),
                            ty: self.type_at(start, end),
                            tcb_location: self.placement.location(self.access_position(access, start, end)),
                        })
                    })
                    .collect()
            }
        };
        if bindings.is_empty() {
            None
        } else {
            Some(TemplateSymbol::Output { bindings })
        }
    }

    fn reference_symbol(&self, reference: &Reference) -> Option<TemplateSymbol> {
        let target = self.bound.get_reference_target(reference.id)?.clone();
        let name = find_first_matching_node(
            &self.tcb.body,
            &FindOptions {
                with_span: Some(absolute(&reference.key_span)),
                filter: Some(is_identifier),
                ..FindOptions::default()
            },
        )?;
        let init = initializer_of(&self.tcb.body, name)?;
        let (start, end) = Printer::locate(self.tcb, name)?;

        let target_location = match &target {
            ReferenceTarget::Template(_) => {
                let (init_start, _) = Printer::locate(self.tcb, init)?;
                self.placement.location(init_start)
            }
            ReferenceTarget::Element(_) | ReferenceTarget::DirectiveOnNode { .. } => {
                let local = referenced_local(init)?;
                let declared = declaration_named(&self.tcb.body, local)?;
                let (declared_start, _) = Printer::locate(self.tcb, declared)?;
                self.placement.location(declared_start)
            }
        };

        Some(TemplateSymbol::Reference {
            name: reference.name.clone(),
            target,
            ty: self.type_at(start, end),
            target_location,
            reference_var_location: self.placement.location(start),
        })
    }

    fn variable_symbol(&self, variable: &Variable) -> Option<TemplateSymbol> {
        let name = find_first_matching_node(
            &self.tcb.body,
            &FindOptions {
                with_span: Some(absolute(&variable.key_span)),
                filter: Some(is_identifier),
                ..FindOptions::default()
            },
        )?;
        let init = initializer_of(&self.tcb.body, name)?;
        let (start, end) = Printer::locate(self.tcb, name)?;
        let (init_start, init_end) = Printer::locate(self.tcb, init)?;
        Some(TemplateSymbol::Variable {
            name: variable.name.clone(),
            ty: self.type_at(start, end),
            initializer_location: self.placement.location(self.access_position(init, init_start, init_end)),
            local_var_location: self.placement.location(start),
        })
    }

    fn expression_symbol(&self, ast: &AST) -> Option<TemplateSymbol> {
        if let Some(entity) = self.bound.get_expression_target(ast) {
            return match find_entity(self.nodes, entity)? {
                EntityNode::Reference(reference) => self.reference_symbol(reference),
                EntityNode::Variable(variable) => self.variable_symbol(variable),
            };
        }

        if let AST::BindingPipe(pipe) = ast {
            let method = find_first_matching_node(
                &self.tcb.body,
                &FindOptions {
                    with_span: Some(pipe.name_span),
                    filter: Some(is_access),
                    ..FindOptions::default()
                },
            )?;
            let (start, end) = Printer::locate(self.tcb, method)?;
            return Some(TemplateSymbol::Pipe {
                name: pipe.name.clone(),
                ty: self.type_at(start, end),
                tcb_location: self.placement.location(self.access_position(method, start, end)),
            });
        }

        let span = match ast {
            AST::PropertyWrite(write) => write.name_span,
            _ => ast.source_span(),
        };
        let node = match ast {
            AST::PropertyRead(_) => self.find_by_span(span, Some(is_access)).or_else(|| self.find_by_span(span, None)),
            _ => self.find_by_span(span, None),
        }?;
        let node = unwrap_parens(node);
        let (start, end) = Printer::locate(self.tcb, node)?;
        Some(TemplateSymbol::Expression {
            ty: self.type_at(start, end),
            tcb_location: self.placement.location(self.access_position(node, start, end)),
        })
    }

    fn find_by_span(&self, span: AbsoluteSourceSpan, filter: Option<fn(&Expr) -> bool>) -> Option<&'a Expr> {
        find_first_matching_node(
            &self.tcb.body,
            &FindOptions {
                with_span: Some(span),
                filter,
                ..FindOptions::default()
            },
        )
    }

    /// Property accesses are located at their name, element accesses at their index.
    fn access_position(&self, node: &Expr, start: usize, end: usize) -> usize {
        match &node.kind {
            ExprKind::Property { name, .. } => end.saturating_sub(name.len()),
            ExprKind::Element { index, .. } => Printer::locate(self.tcb, index).map_or(start, |(at, _)| at),
            _ => start,
        }
    }

    fn host_of_binding(&self, binding: NodeId) -> Option<NodeId> {
        host_of_binding(self.nodes, binding)
    }

    fn type_at(&self, start: usize, end: usize) -> Option<HostType> {
        let types = self.types?;
        let base = self.placement.block_start;
        types
            .host
            .get_type_at_range(types.program, types.file, base + start, base + end)
    }
}

fn absolute(span: &ParseSourceSpan) -> AbsoluteSourceSpan {
    AbsoluteSourceSpan::new(span.start.offset, span.end.offset)
}

fn is_create_element(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Call { callee, .. } => {
            matches!(&callee.kind, ExprKind::Property { name, .. } if name == "createElement")
        }
        _ => false,
    }
}

fn is_identifier(expr: &Expr) -> bool {
    matches!(expr.kind, ExprKind::Identifier(_))
}

fn is_access(expr: &Expr) -> bool {
    matches!(expr.kind, ExprKind::Property { .. } | ExprKind::Element { .. })
}

fn access_object(expr: &Expr) -> Option<&Expr> {
    match &expr.kind {
        ExprKind::Property { object, .. } | ExprKind::Element { object, .. } => Some(object),
        _ => None,
    }
}

fn unwrap_parens(mut expr: &Expr) -> &Expr {
    while let ExprKind::Paren(inner) = &expr.kind {
        expr = inner;
    }
    expr
}

/// The local a reference initializer reads, e.g. `_t1` in `(_t1 as any)`.
fn referenced_local(init: &Expr) -> Option<&str> {
    match &init.kind {
        ExprKind::Identifier(name) => Some(name),
        ExprKind::Paren(inner) | ExprKind::NonNull(inner) => referenced_local(inner),
        ExprKind::AsType { expr, .. } => referenced_local(expr),
        _ => None,
    }
}

fn for_each_var<'s>(stmts: &'s [Stmt], f: &mut dyn FnMut(&'s Expr, Option<&'s Expr>)) {
    for stmt in stmts {
        match stmt {
            Stmt::Var { name, init, .. } => f(name, init.as_ref()),
            Stmt::If { then, .. } => for_each_var(then, f),
            Stmt::Block(inner) => for_each_var(inner, f),
            Stmt::Expr(_) | Stmt::Return(_) => {}
        }
    }
}

/// The name a `var` statement declares with `init` as its initializer.
fn declared_name<'s>(stmts: &'s [Stmt], init: &Expr) -> Option<&'s Expr> {
    let mut found = None;
    for_each_var(stmts, &mut |name, value| {
        if found.is_none() && value.is_some_and(|value| std::ptr::eq(value, init)) {
            found = Some(name);
        }
    });
    found
}

fn initializer_of<'s>(stmts: &'s [Stmt], name: &Expr) -> Option<&'s Expr> {
    let mut found = None;
    for_each_var(stmts, &mut |declared, value| {
        if found.is_none() && std::ptr::eq(declared, name) {
            found = value;
        }
    });
    found
}

fn declaration_named<'s>(stmts: &'s [Stmt], local: &str) -> Option<&'s Expr> {
    let mut found = None;
    for_each_var(stmts, &mut |declared, _| {
        if found.is_none() && matches!(&declared.kind, ExprKind::Identifier(name) if name == local) {
            found = Some(declared);
        }
    });
    found
}

enum HostNode<'n> {
    Element(&'n Element),
    Template(&'n Template),
}

enum EntityNode<'n> {
    Reference(&'n Reference),
    Variable(&'n Variable),
}

fn find_host(nodes: &[R3Node], id: NodeId) -> Option<HostNode<'_>> {
    nodes.iter().find_map(|node| match node {
        R3Node::Element(element) if element.id == id => Some(HostNode::Element(element)),
        R3Node::Element(element) => find_host(&element.children, id),
        R3Node::Template(template) if template.id == id => Some(HostNode::Template(template)),
        R3Node::Template(template) => find_host(&template.children, id),
        _ => None,
    })
}

fn find_entity(nodes: &[R3Node], entity: TemplateEntity) -> Option<EntityNode<'_>> {
    nodes.iter().find_map(|node| {
        let (references, variables, children): (&[Reference], &[Variable], &[R3Node]) = match node {
            R3Node::Element(element) => (&element.references, &[], &element.children),
            R3Node::Template(template) => (&template.references, &template.variables, &template.children),
            _ => return None,
        };
        let own = match entity {
            TemplateEntity::Reference(id) => references.iter().find(|r| r.id == id).map(EntityNode::Reference),
            TemplateEntity::Variable(id) => variables.iter().find(|v| v.id == id).map(EntityNode::Variable),
        };
        own.or_else(|| find_entity(children, entity))
    })
}

/// The element or template a bound attribute or event sits on.
fn host_of_binding(nodes: &[R3Node], binding: NodeId) -> Option<NodeId> {
    nodes.iter().find_map(|node| match node {
        R3Node::Element(element) => {
            let own = element.inputs.iter().any(|b| b.id == binding) || element.outputs.iter().any(|e| e.id == binding);
            if own {
                Some(element.id)
            } else {
                host_of_binding(&element.children, binding)
            }
        }
        R3Node::Template(template) => {
            let own = template.inputs.iter().any(|b| b.id == binding)
                || template.outputs.iter().any(|e| e.id == binding)
                || template
                    .template_attrs
                    .iter()
                    .any(|attr| matches!(attr, TemplateAttr::Bound(b) if b.id == binding));
            if own {
                Some(template.id)
            } else {
                host_of_binding(&template.children, binding)
            }
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ngtsc::typecheck::src::ts_ast::TypeNode;

    #[test]
    fn test_reference_initializers_resolve_to_their_local() {
        let init = Expr::ident("_t1").as_type(TypeNode::any()).paren();
        assert_eq!(referenced_local(&init), Some("_t1"));
        assert_eq!(referenced_local(&Expr::null_as_any()), None);
    }

    #[test]
    fn test_declarations_are_found_inside_nested_blocks() {
        let stmts = vec![
            Stmt::var(Expr::ident("_t1"), Expr::null_as_any()),
            Stmt::If {
                condition: Expr::ident("_t1"),
                then: vec![Stmt::Block(vec![Stmt::var(Expr::ident("_t2"), Expr::ident("_t1"))])],
            },
        ];
        let declared = declaration_named(&stmts, "_t2").unwrap();
        let init = initializer_of(&stmts, declared).unwrap();
        assert_eq!(init, &Expr::ident("_t1"));
        assert!(std::ptr::eq(declared_name(&stmts, init).unwrap(), declared));
        assert!(declaration_named(&stmts, "_t3").is_none());
    }
}
