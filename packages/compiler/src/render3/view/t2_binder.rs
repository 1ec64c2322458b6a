//! Render3 T2 Binder
//!
//! Matches directives against a template and resolves every local the template
//! declares. The result is an immutable `R3BoundTarget`.
//!
//! Binding happens in three passes over the template:
//! 1. scopes: collect references and variables per template scope,
//! 2. directives: match selectors, resolve reference targets and binding consumers,
//! 3. expressions: resolve implicit-receiver reads against the scope chain and collect
//!    pipe usage.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};

use crate::directive_matching::{CssSelector, SelectorMatcher};
use crate::expression_parser::ast::{AbsoluteSourceSpan, BindingType, AST};
use crate::render3::r3_ast::{BoundText, DirectiveHost, NodeId, R3Node, Template};

use super::t2_api::{
    BoundTarget, ConsumerOfBinding, DirectiveMeta, ReferenceTarget, TemplateEntity,
};

/// Binds templates against a fixed set of directives.
pub struct R3TargetBinder<D> {
    matcher: SelectorMatcher<D>,
}

impl<D: DirectiveMeta + Clone> R3TargetBinder<D> {
    pub fn new(matcher: SelectorMatcher<D>) -> Self {
        R3TargetBinder { matcher }
    }

    /// Builds a binder from directives, parsing each one's selector. Directives without
    /// a selector (or with an unparsable one) never match.
    pub fn from_directives(directives: impl IntoIterator<Item = D>) -> Self {
        let mut matcher = SelectorMatcher::new();
        for dir in directives {
            if let Some(Ok(selectors)) = dir.selector().map(CssSelector::parse) {
                matcher.add_selectables(selectors, dir);
            }
        }
        R3TargetBinder { matcher }
    }

    pub fn bind(&self, nodes: &[R3Node]) -> R3BoundTarget<D> {
        let mut bound = R3BoundTarget::default();

        let mut scopes = ScopeTree::default();
        let root = scopes.push(None, None);
        scopes.collect(root, nodes, &mut bound);

        self.bind_directives(nodes, &mut bound);

        let mut expressions = ExpressionBinder {
            scopes: &scopes,
            bound: &mut bound,
        };
        expressions.bind_nodes(root, nodes);

        bound
    }

    fn bind_directives(&self, nodes: &[R3Node], bound: &mut R3BoundTarget<D>) {
        for node in nodes {
            match node {
                R3Node::Element(el) => {
                    self.bind_host(DirectiveHost::Element(el), bound);
                    self.bind_directives(&el.children, bound);
                }
                R3Node::Template(tmpl) => {
                    self.bind_host(DirectiveHost::Template(tmpl), bound);
                    self.bind_directives(&tmpl.children, bound);
                }
                R3Node::Text(_) | R3Node::BoundText(_) | R3Node::Icu(_) => {}
            }
        }
    }

    fn bind_host(&self, host: DirectiveHost<'_>, bound: &mut R3BoundTarget<D>) {
        let selector = css_selector_for(host);
        let directives: Vec<D> = self.matcher.match_node(&selector).into_iter().cloned().collect();

        for dir in &directives {
            if !bound.used_directives.iter().any(|d| d.name() == dir.name()) {
                bound.used_directives.push(dir.clone());
            }
        }

        let host_consumer = |id: NodeId| match host {
            DirectiveHost::Element(_) => ConsumerOfBinding::Element(id),
            DirectiveHost::Template(_) => ConsumerOfBinding::Template(id),
        };

        for reference in host.references() {
            let target = if reference.value.trim().is_empty() {
                match directives.iter().find(|d| d.is_component()) {
                    Some(cmp) => Some(ReferenceTarget::DirectiveOnNode {
                        directive: cmp.clone(),
                        node: host.id(),
                    }),
                    None => Some(match host {
                        DirectiveHost::Element(_) => ReferenceTarget::Element(host.id()),
                        DirectiveHost::Template(_) => ReferenceTarget::Template(host.id()),
                    }),
                }
            } else {
                directives
                    .iter()
                    .find(|d| d.export_as().iter().any(|name| *name == reference.value))
                    .map(|dir| ReferenceTarget::DirectiveOnNode {
                        directive: dir.clone(),
                        node: host.id(),
                    })
            };
            if let Some(target) = target {
                bound.references.insert(reference.id, target);
            }
        }

        for input in host.inputs().iter().chain(host.bound_template_attrs()) {
            let consumer = directives
                .iter()
                .find(|d| d.inputs().has_binding_property_name(&input.name))
                .map(|d| ConsumerOfBinding::Directive(d.clone()))
                .unwrap_or_else(|| host_consumer(host.id()));
            bound.bindings.insert(input.id, consumer);
        }

        for output in host.outputs() {
            let consumer = directives
                .iter()
                .find(|d| d.outputs().has_binding_property_name(&output.name))
                .map(|d| ConsumerOfBinding::Directive(d.clone()))
                .unwrap_or_else(|| host_consumer(host.id()));
            bound.bindings.insert(output.id, consumer);
        }

        bound.directives.insert(host.id(), directives);
    }
}

/// Builds the selector a node presents to directive matching: its tag plus every
/// attribute name (static, bound property or event).
fn css_selector_for(host: DirectiveHost<'_>) -> CssSelector {
    let mut selector = CssSelector::new();
    selector.set_element(host.tag_name());
    for attr in host.attributes().iter().chain(host.text_template_attrs()) {
        selector.add_attribute(&attr.name, &attr.value);
        if attr.name == "class" {
            for class_name in attr.value.split_whitespace() {
                selector.add_class_name(class_name);
            }
        }
    }
    for input in host.inputs().iter().chain(host.bound_template_attrs()) {
        if matches!(input.type_, BindingType::Property | BindingType::TwoWay) {
            selector.add_attribute(&input.name, "");
        }
    }
    for output in host.outputs() {
        selector.add_attribute(&output.name, "");
    }
    selector
}

#[derive(Debug)]
struct BindingScope {
    parent: Option<usize>,
    template: Option<NodeId>,
    entities: IndexMap<String, TemplateEntity>,
}

#[derive(Debug, Default)]
struct ScopeTree {
    scopes: Vec<BindingScope>,
    by_template: HashMap<NodeId, usize>,
}

impl ScopeTree {
    fn push(&mut self, parent: Option<usize>, template: Option<NodeId>) -> usize {
        self.scopes.push(BindingScope {
            parent,
            template,
            entities: IndexMap::new(),
        });
        let idx = self.scopes.len() - 1;
        if let Some(template) = template {
            self.by_template.insert(template, idx);
        }
        idx
    }

    /// Declares `name` in `scope` unless it is already declared there. The first
    /// declaration wins.
    fn declare<D>(
        &mut self,
        scope: usize,
        name: &str,
        entity: TemplateEntity,
        bound: &mut R3BoundTarget<D>,
    ) {
        let template = self.scopes[scope].template;
        bound.symbols.insert(entity, template);
        self.scopes[scope]
            .entities
            .entry(name.to_string())
            .or_insert(entity);
    }

    fn collect<D>(&mut self, scope: usize, nodes: &[R3Node], bound: &mut R3BoundTarget<D>) {
        for node in nodes {
            match node {
                R3Node::Element(el) => {
                    for reference in &el.references {
                        self.declare(scope, &reference.name, TemplateEntity::Reference(reference.id), bound);
                    }
                    self.collect(scope, &el.children, bound);
                }
                R3Node::Template(tmpl) => {
                    for reference in &tmpl.references {
                        self.declare(scope, &reference.name, TemplateEntity::Reference(reference.id), bound);
                    }
                    let child = self.push(Some(scope), Some(tmpl.id));
                    let level = bound.nesting_level(self.scopes[scope].template) + 1;
                    bound.nesting.insert(tmpl.id, level);
                    for variable in &tmpl.variables {
                        self.declare(child, &variable.name, TemplateEntity::Variable(variable.id), bound);
                    }
                    self.collect(child, &tmpl.children, bound);
                }
                R3Node::Text(_) | R3Node::BoundText(_) | R3Node::Icu(_) => {}
            }
        }
    }

    fn lookup(&self, mut scope: usize, name: &str) -> Option<TemplateEntity> {
        loop {
            let data = &self.scopes[scope];
            if let Some(entity) = data.entities.get(name) {
                return Some(*entity);
            }
            scope = data.parent?;
        }
    }
}

struct ExpressionBinder<'s, 'b, D> {
    scopes: &'s ScopeTree,
    bound: &'b mut R3BoundTarget<D>,
}

impl<D> ExpressionBinder<'_, '_, D> {
    fn bind_nodes(&mut self, scope: usize, nodes: &[R3Node]) {
        for node in nodes {
            match node {
                R3Node::Element(el) => {
                    let host = DirectiveHost::Element(el);
                    self.bind_host(scope, host);
                    self.bind_nodes(scope, &el.children);
                }
                R3Node::Template(tmpl) => self.bind_template(scope, tmpl),
                R3Node::BoundText(text) => self.bind_text(scope, text),
                R3Node::Icu(icu) => {
                    for var in icu.vars.values() {
                        self.bind_text(scope, var);
                    }
                }
                R3Node::Text(_) => {}
            }
        }
    }

    fn bind_template(&mut self, scope: usize, tmpl: &Template) {
        // Bindings on the template itself are evaluated in the enclosing scope.
        self.bind_host(scope, DirectiveHost::Template(tmpl));
        let inner = self.scopes.by_template.get(&tmpl.id).copied().unwrap_or(scope);
        self.bind_nodes(inner, &tmpl.children);
    }

    fn bind_host(&mut self, scope: usize, host: DirectiveHost<'_>) {
        for input in host.inputs().iter().chain(host.bound_template_attrs()) {
            self.bind_expression(scope, &input.value);
        }
        for output in host.outputs() {
            self.bind_expression(scope, &output.handler);
        }
    }

    fn bind_text(&mut self, scope: usize, text: &BoundText) {
        self.bind_expression(scope, &text.value);
    }

    fn bind_expression(&mut self, scope: usize, ast: &AST) {
        ast.walk(&mut |node| {
            let (name, span) = match node {
                AST::PropertyRead(read) if matches!(*read.receiver, AST::ImplicitReceiver(_)) => {
                    (&read.name, read.source_span)
                }
                AST::SafePropertyRead(read) if matches!(*read.receiver, AST::ImplicitReceiver(_)) => {
                    (&read.name, read.source_span)
                }
                AST::PropertyWrite(write) if matches!(*write.receiver, AST::ImplicitReceiver(_)) => {
                    (&write.name, write.source_span)
                }
                AST::BindingPipe(pipe) => {
                    self.bound.used_pipes.insert(pipe.name.clone());
                    return;
                }
                _ => return,
            };
            if let Some(entity) = self.scopes.lookup(scope, name) {
                self.bound.expressions.insert(span, entity);
            }
        });
    }
}

/// Immutable result of binding a template.
#[derive(Debug, Clone)]
pub struct R3BoundTarget<D> {
    directives: HashMap<NodeId, Vec<D>>,
    references: HashMap<NodeId, ReferenceTarget<D>>,
    bindings: HashMap<NodeId, ConsumerOfBinding<D>>,
    expressions: HashMap<AbsoluteSourceSpan, TemplateEntity>,
    symbols: HashMap<TemplateEntity, Option<NodeId>>,
    nesting: HashMap<NodeId, usize>,
    used_directives: Vec<D>,
    used_pipes: IndexSet<String>,
}

impl<D> Default for R3BoundTarget<D> {
    fn default() -> Self {
        R3BoundTarget {
            directives: HashMap::new(),
            references: HashMap::new(),
            bindings: HashMap::new(),
            expressions: HashMap::new(),
            symbols: HashMap::new(),
            nesting: HashMap::new(),
            used_directives: Vec::new(),
            used_pipes: IndexSet::new(),
        }
    }
}

impl<D> R3BoundTarget<D> {
    fn nesting_level(&self, template: Option<NodeId>) -> usize {
        template
            .and_then(|t| self.nesting.get(&t).copied())
            .unwrap_or(0)
    }
}

impl<D: DirectiveMeta + Clone> BoundTarget<D> for R3BoundTarget<D> {
    fn get_directives_of_node(&self, node: NodeId) -> Option<&[D]> {
        self.directives.get(&node).map(|d| d.as_slice())
    }

    fn get_reference_target(&self, reference: NodeId) -> Option<&ReferenceTarget<D>> {
        self.references.get(&reference)
    }

    fn get_consumer_of_binding(&self, binding: NodeId) -> Option<&ConsumerOfBinding<D>> {
        self.bindings.get(&binding)
    }

    fn get_expression_target(&self, expr: &AST) -> Option<TemplateEntity> {
        match expr {
            AST::PropertyRead(_) | AST::SafePropertyRead(_) | AST::PropertyWrite(_) => {
                self.expressions.get(&expr.source_span()).copied()
            }
            _ => None,
        }
    }

    fn get_definition_node_of_symbol(&self, symbol: TemplateEntity) -> Option<NodeId> {
        self.symbols.get(&symbol).copied().flatten()
    }

    fn get_nesting_level(&self, template: Option<NodeId>) -> usize {
        self.nesting_level(template)
    }

    fn get_used_directives(&self) -> Vec<D> {
        self.used_directives.clone()
    }

    fn get_used_pipes(&self) -> Vec<String> {
        self.used_pipes.iter().cloned().collect()
    }
}
