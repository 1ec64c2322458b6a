// Type Check Block Generation
//
// A type check block (TCB) is a function whose body mirrors a component template:
// elements become `document.createElement` calls, directives become typed locals, and
// every binding becomes an assignment that the host checker can validate.
//
// Work is queued as operations per scope and executed lazily. Resolving a node that has
// not been processed yet runs its operation out of order; an operation that is already
// running resolves to its circular fallback instead, which breaks reference cycles.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use angular_compiler::core::SchemaMetadata;
use angular_compiler::expression_parser::ast::{AbsoluteSourceSpan, BindingType, ParsedEventType, AST};
use angular_compiler::parse_util::{ParseSourceFile, ParseSourceSpan};
use angular_compiler::render3::r3_ast::{
    BoundAttribute, BoundEvent, BoundText, DirectiveHost, Element, IcuPlaceholder, NodeId, R3Node,
    Reference, Template, Variable,
};
use angular_compiler::render3::view::t2_api::{
    BoundTarget, ConsumerOfBinding, ReferenceTarget, TemplateEntity,
};
use indexmap::IndexMap;

use super::comments::{
    add_expression_identifier, add_parse_span_info, mark_ignore_diagnostics, Comment,
    ExpressionIdentifier,
};
use super::dom::DomSchemaChecker;
use super::environment::{Environment, ANGULAR_CORE};
use super::expression::{tcb_expression, wrap_for_diagnostics, ExpressionScope, TranslationMode, EVENT_PARAMETER};
use super::oob::{OutOfBandDiagnosticRecorder, OutputConsumer};
use super::tcb_util::requires_inline_type_ctor;
use super::ts_ast::{Comments, Expr, ExprKind, ObjectProperty, Param, Stmt, TcbDecl, TypeNode, TypeParamDecl};
use crate::ngtsc::reflection::{ClassDeclaration, ClassRef};
use crate::ngtsc::typecheck::api::{
    DirectiveRef, InputFlags, PipeMeta, PropertyMapping, TemplateGuardType, TemplateId, TypeCheckError,
    TypeCheckingConfig,
};

/// How the component's generic parameters appear on the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcbGenericContextBehavior {
    /// Reproduce the parameters through the environment's reference emitter.
    UseEmitter,
    /// Copy the parameters verbatim; only valid inside the component's own file.
    CopyClassNodes,
    /// Instantiate every parameter with `any`.
    FallbackToAny,
}

/// Everything about one component template that a block is generated from.
pub struct TypeCheckBlockMetadata<'a> {
    pub id: TemplateId,
    pub nodes: &'a [R3Node],
    pub bound_target: &'a dyn BoundTarget<DirectiveRef>,
    /// Pipes available to the template, by name.
    pub pipes: &'a IndexMap<String, PipeMeta>,
    pub schemas: &'a [SchemaMetadata],
    pub template_file: &'a Arc<ParseSourceFile>,
}

/// Generates the block `fn_name` for `component`.
pub fn generate_type_check_block(
    env: &mut Environment,
    component: &ClassDeclaration,
    fn_name: &str,
    meta: &TypeCheckBlockMetadata<'_>,
    dom: &mut dyn DomSchemaChecker,
    oob: &mut dyn OutOfBandDiagnosticRecorder,
    generic_behavior: TcbGenericContextBehavior,
) -> Result<TcbDecl, TypeCheckError> {
    let behavior = if env.config().use_context_generic_type {
        generic_behavior
    } else {
        TcbGenericContextBehavior::FallbackToAny
    };
    let (type_params, this_args) = context_type_params(env, component, behavior);
    let this_type = env.reference_type(&component.class_ref, this_args)?;

    let mut tcb = Tcb::new(env, meta, dom, oob);
    let root = tcb.build_scope(None, None, meta.nodes, None);
    let body = tcb.render(root)?;
    tracing::debug!(
        template = %meta.id,
        component = %component.class_ref.name,
        executed_ops = tcb.executed_ops,
        "generated type check block"
    );

    Ok(TcbDecl {
        id: meta.id.clone(),
        fn_name: fn_name.to_string(),
        type_params,
        this_type,
        body,
        directive_locals: tcb.directive_locals,
    })
}

fn context_type_params(
    env: &mut Environment,
    component: &ClassDeclaration,
    behavior: TcbGenericContextBehavior,
) -> (Vec<TypeParamDecl>, Vec<TypeNode>) {
    if !component.is_generic() {
        return (Vec::new(), Vec::new());
    }
    let any_args = || vec![TypeNode::any(); component.type_parameters().len()];
    let params = match behavior {
        TcbGenericContextBehavior::UseEmitter => env.emit_type_parameters(component),
        TcbGenericContextBehavior::CopyClassNodes => Some(
            component
                .type_parameters()
                .iter()
                .map(|p| TypeParamDecl {
                    name: p.name.clone(),
                    constraint: p.bound.as_ref().map(|b| TypeNode::Raw(b.text.clone())),
                })
                .collect(),
        ),
        TcbGenericContextBehavior::FallbackToAny => None,
    };
    match params {
        Some(params) => {
            let args = params
                .iter()
                .map(|p| TypeNode::reference(p.name.clone(), Vec::new()))
                .collect();
            (params, args)
        }
        None => (Vec::new(), any_args()),
    }
}

type ScopeId = usize;

/// A unit of deferred synthesis.
#[derive(Debug, Clone)]
enum TcbOp<'t> {
    /// `var _tN = document.createElement("tag");`
    Element(&'t Element),
    /// `var _tN = null! as any;`, the context of an embedded template.
    TemplateContext,
    /// `var _tN = ctx.value;`
    Variable {
        template: &'t Template,
        variable: &'t Variable,
    },
    /// Guards of a template and its body in a child scope.
    TemplateBody(&'t Template),
    /// `var _tN = null! as Dir;`, with `any` for every type parameter when `any_params`.
    DirectiveType {
        host: DirectiveHost<'t>,
        dir: DirectiveRef,
        any_params: bool,
    },
    /// `var _tN = _ctorK({ ...inputs });`, inferring the directive's type arguments.
    DirectiveCtor {
        host: DirectiveHost<'t>,
        dir: DirectiveRef,
    },
    /// `var _tN = _ctorK(null!);`
    DirectiveCtorCircularFallback { dir: DirectiveRef },
    DirectiveInputs {
        host: DirectiveHost<'t>,
        dir: DirectiveRef,
    },
    DirectiveOutputs {
        host: DirectiveHost<'t>,
        dir: DirectiveRef,
    },
    /// Bindings to DOM properties, i.e. not claimed by any directive.
    UnclaimedInputs {
        element: &'t Element,
        claimed: HashSet<String>,
    },
    UnclaimedOutputs {
        element: &'t Element,
        claimed: HashSet<String>,
    },
    DomSchemaCheck {
        element: &'t Element,
        check_element: bool,
        claimed: HashSet<String>,
    },
    /// `"" + expr;`
    TextInterpolation(&'t BoundText),
    Reference {
        reference: &'t Reference,
        target: ReferenceTarget<DirectiveRef>,
    },
    /// Stand-in for a reference without a target: `var _tN = null! as any;`
    InvalidReference,
    /// `this.;`, where completions of the component context are requested.
    ComponentContextCompletion,
}

impl<'t> TcbOp<'t> {
    /// Optional ops only produce locals for other ops; they run when something resolves
    /// them, or when unreferenced locals are checked too.
    fn is_optional(&self) -> bool {
        matches!(
            self,
            TcbOp::TemplateContext
                | TcbOp::DirectiveType { .. }
                | TcbOp::DirectiveCtor { .. }
                | TcbOp::DirectiveCtorCircularFallback { .. }
                | TcbOp::Reference { .. }
                | TcbOp::InvalidReference
        )
    }

    /// What the op's slot holds while the op runs.
    fn circular_fallback(&self) -> OpSlot<'t> {
        match self {
            TcbOp::DirectiveCtor { dir, .. } => OpSlot::Op(TcbOp::DirectiveCtorCircularFallback { dir: dir.clone() }),
            _ => OpSlot::Expr(Expr::null_non_null()),
        }
    }
}

#[derive(Debug, Clone)]
enum OpSlot<'t> {
    Op(TcbOp<'t>),
    /// The op ran and produced this local.
    Expr(Expr),
    /// The op ran and produced nothing.
    Empty,
}

/// Something a scope can be asked to resolve.
#[derive(Debug, Clone, Copy)]
enum Target<'a> {
    Element(NodeId),
    TemplateContext(NodeId),
    Directive(NodeId, &'a ClassRef),
    Reference(NodeId),
    Variable(NodeId),
}

impl Target<'_> {
    fn describe(&self) -> String {
        match self {
            Target::Element(id) => format!("element #{}", id.0),
            Target::TemplateContext(id) => format!("template context #{}", id.0),
            Target::Directive(id, class) => format!("directive {} on #{}", class.name, id.0),
            Target::Reference(id) => format!("reference #{}", id.0),
            Target::Variable(id) => format!("variable #{}", id.0),
        }
    }
}

#[derive(Debug, Default)]
struct Scope<'t> {
    parent: Option<ScopeId>,
    /// Narrowing condition of this scope alone; see `Tcb::scope_guard`.
    guard: Option<Expr>,
    ops: Vec<OpSlot<'t>>,
    element_ops: HashMap<NodeId, usize>,
    directive_ops: HashMap<NodeId, IndexMap<ClassRef, usize>>,
    reference_ops: HashMap<NodeId, usize>,
    template_ctx_ops: HashMap<NodeId, usize>,
    variable_ops: HashMap<NodeId, usize>,
    statements: Vec<Stmt>,
}

impl Scope<'_> {
    fn lookup(&self, target: &Target<'_>) -> Option<usize> {
        match target {
            Target::Element(id) => self.element_ops.get(id).copied(),
            Target::TemplateContext(id) => self.template_ctx_ops.get(id).copied(),
            Target::Directive(id, class) => self.directive_ops.get(id)?.get(*class).copied(),
            Target::Reference(id) => self.reference_ops.get(id).copied(),
            Target::Variable(id) => self.variable_ops.get(id).copied(),
        }
    }
}

struct Tcb<'t, 'c> {
    env: &'c mut Environment,
    meta: &'c TypeCheckBlockMetadata<'t>,
    dom: &'c mut dyn DomSchemaChecker,
    oob: &'c mut dyn OutOfBandDiagnosticRecorder,
    config: TypeCheckingConfig,
    scopes: Vec<Scope<'t>>,
    variables: HashMap<NodeId, &'t Variable>,
    directive_locals: IndexMap<String, ClassRef>,
    next_id: usize,
    executed_ops: usize,
}

impl<'t, 'c> Tcb<'t, 'c> {
    fn new(
        env: &'c mut Environment,
        meta: &'c TypeCheckBlockMetadata<'t>,
        dom: &'c mut dyn DomSchemaChecker,
        oob: &'c mut dyn OutOfBandDiagnosticRecorder,
    ) -> Self {
        let config = env.config().clone();
        Self {
            env,
            meta,
            dom,
            oob,
            config,
            scopes: Vec::new(),
            variables: HashMap::new(),
            directive_locals: IndexMap::new(),
            next_id: 1,
            executed_ops: 0,
        }
    }

    fn allocate_id(&mut self) -> String {
        let id = format!("_t{}", self.next_id);
        self.next_id += 1;
        id
    }

    fn push_op(&mut self, scope: ScopeId, op: TcbOp<'t>) -> usize {
        let ops = &mut self.scopes[scope].ops;
        ops.push(OpSlot::Op(op));
        ops.len() - 1
    }

    fn add_statement(&mut self, scope: ScopeId, stmt: Stmt) {
        self.scopes[scope].statements.push(stmt);
    }

    fn bound(&self) -> &'t dyn BoundTarget<DirectiveRef> {
        self.meta.bound_target
    }

    fn parse_span(&self, span: AbsoluteSourceSpan) -> ParseSourceSpan {
        ParseSourceSpan::from_offsets(self.meta.template_file, span.start, span.end)
    }

    // Scope construction

    /// Builds the scope of the root template (`template` is `None`) or of an embedded
    /// template's body, queueing one op per unit of work.
    fn build_scope(
        &mut self,
        parent: Option<ScopeId>,
        template: Option<&'t Template>,
        children: &'t [R3Node],
        guard: Option<Expr>,
    ) -> ScopeId {
        self.scopes.push(Scope {
            parent,
            guard,
            ..Scope::default()
        });
        let scope = self.scopes.len() - 1;

        if parent.is_none() && self.config.enable_template_type_checker {
            self.push_op(scope, TcbOp::ComponentContextCompletion);
        }

        if let Some(template) = template {
            let mut first_decls: IndexMap<&str, &'t Variable> = IndexMap::new();
            for variable in &template.variables {
                match first_decls.get(variable.name.as_str()) {
                    Some(first) => self.oob.duplicate_template_var(&self.meta.id, variable, first),
                    None => {
                        first_decls.insert(variable.name.as_str(), variable);
                    }
                }
                self.variables.insert(variable.id, variable);
                let index = self.push_op(scope, TcbOp::Variable { template, variable });
                self.scopes[scope].variable_ops.insert(variable.id, index);
            }
        }

        for node in children {
            self.append_node(scope, node);
        }
        scope
    }

    fn append_node(&mut self, scope: ScopeId, node: &'t R3Node) {
        match node {
            R3Node::Element(element) => {
                let index = self.push_op(scope, TcbOp::Element(element));
                self.scopes[scope].element_ops.insert(element.id, index);
                let host = DirectiveHost::Element(element);
                self.append_directives_and_inputs(scope, host);
                self.append_outputs(scope, host);
                for child in &element.children {
                    self.append_node(scope, child);
                }
                self.append_references(scope, host);
            }
            R3Node::Template(template) => {
                let host = DirectiveHost::Template(template);
                self.append_directives_and_inputs(scope, host);
                self.append_outputs(scope, host);
                let ctx = self.push_op(scope, TcbOp::TemplateContext);
                self.scopes[scope].template_ctx_ops.insert(template.id, ctx);
                if self.config.check_template_bodies {
                    self.push_op(scope, TcbOp::TemplateBody(template));
                } else {
                    self.append_deep_schema_checks(scope, &template.children);
                }
                self.append_references(scope, host);
            }
            R3Node::BoundText(text) => {
                self.push_op(scope, TcbOp::TextInterpolation(text));
            }
            R3Node::Icu(icu) => {
                for text in icu.vars.values() {
                    self.push_op(scope, TcbOp::TextInterpolation(text));
                }
                for placeholder in icu.placeholders.values() {
                    if let IcuPlaceholder::BoundText(text) = placeholder {
                        self.push_op(scope, TcbOp::TextInterpolation(text));
                    }
                }
            }
            R3Node::Text(_) => {}
        }
    }

    fn append_directives_and_inputs(&mut self, scope: ScopeId, host: DirectiveHost<'t>) {
        let directives = self.bound().get_directives_of_node(host.id()).unwrap_or(&[]);
        if directives.is_empty() {
            if let DirectiveHost::Element(element) = host {
                self.push_op(
                    scope,
                    TcbOp::UnclaimedInputs {
                        element,
                        claimed: HashSet::new(),
                    },
                );
                self.push_op(
                    scope,
                    TcbOp::DomSchemaCheck {
                        element,
                        check_element: true,
                        claimed: HashSet::new(),
                    },
                );
            }
            return;
        }

        let mut dir_ops = IndexMap::new();
        for dir in directives {
            let op = if !dir.is_generic() {
                TcbOp::DirectiveType {
                    host,
                    dir: dir.clone(),
                    any_params: false,
                }
            } else if self.config.use_inline_type_constructors
                || !requires_inline_type_ctor(dir, self.env.context_file(), self.env.emitter())
            {
                TcbOp::DirectiveCtor { host, dir: dir.clone() }
            } else {
                TcbOp::DirectiveType {
                    host,
                    dir: dir.clone(),
                    any_params: true,
                }
            };
            let index = self.push_op(scope, op);
            dir_ops.insert(dir.class_ref().clone(), index);
        }
        self.scopes[scope].directive_ops.insert(host.id(), dir_ops);

        for dir in directives {
            self.push_op(scope, TcbOp::DirectiveInputs { host, dir: dir.clone() });
        }

        if let DirectiveHost::Element(element) = host {
            let claimed: HashSet<String> = directives
                .iter()
                .flat_map(|dir| dir.inputs.binding_property_names().map(str::to_string))
                .collect();
            self.push_op(
                scope,
                TcbOp::UnclaimedInputs {
                    element,
                    claimed: claimed.clone(),
                },
            );
            // A matched element may be a component or a custom element; only its
            // properties are checked against the schema.
            self.push_op(
                scope,
                TcbOp::DomSchemaCheck {
                    element,
                    check_element: false,
                    claimed,
                },
            );
        }
    }

    fn append_outputs(&mut self, scope: ScopeId, host: DirectiveHost<'t>) {
        let directives = self.bound().get_directives_of_node(host.id()).unwrap_or(&[]);
        let mut claimed = HashSet::new();
        for dir in directives {
            claimed.extend(dir.outputs.binding_property_names().map(str::to_string));
            self.push_op(scope, TcbOp::DirectiveOutputs { host, dir: dir.clone() });
        }
        if let DirectiveHost::Element(element) = host {
            self.push_op(scope, TcbOp::UnclaimedOutputs { element, claimed });
        }
    }

    fn append_references(&mut self, scope: ScopeId, host: DirectiveHost<'t>) {
        for reference in host.references() {
            let op = match self.bound().get_reference_target(reference.id) {
                Some(target) => TcbOp::Reference {
                    reference,
                    target: target.clone(),
                },
                None => {
                    self.oob.missing_reference_target(&self.meta.id, reference);
                    TcbOp::InvalidReference
                }
            };
            let index = self.push_op(scope, op);
            self.scopes[scope].reference_ops.insert(reference.id, index);
        }
    }

    /// Schema checks for elements inside a template body that is not checked otherwise.
    fn append_deep_schema_checks(&mut self, scope: ScopeId, nodes: &'t [R3Node]) {
        for node in nodes {
            match node {
                R3Node::Element(element) => {
                    let directives = self.bound().get_directives_of_node(element.id).unwrap_or(&[]);
                    let claimed = directives
                        .iter()
                        .flat_map(|dir| dir.inputs.binding_property_names().map(str::to_string))
                        .collect();
                    self.push_op(
                        scope,
                        TcbOp::DomSchemaCheck {
                            element,
                            check_element: directives.is_empty(),
                            claimed,
                        },
                    );
                    self.append_deep_schema_checks(scope, &element.children);
                }
                R3Node::Template(template) => self.append_deep_schema_checks(scope, &template.children),
                _ => {}
            }
        }
    }

    // Execution

    /// Runs every queued op of `scope` and hands back its statements.
    fn render(&mut self, scope: ScopeId) -> Result<Vec<Stmt>, TypeCheckError> {
        let skip_optional = !self.config.check_unreferenced_locals;
        let mut index = 0;
        while index < self.scopes[scope].ops.len() {
            self.execute_op(scope, index, skip_optional)?;
            index += 1;
        }
        Ok(std::mem::take(&mut self.scopes[scope].statements))
    }

    fn execute_op(&mut self, scope: ScopeId, index: usize, skip_optional: bool) -> Result<Option<Expr>, TypeCheckError> {
        let op = match std::mem::replace(&mut self.scopes[scope].ops[index], OpSlot::Empty) {
            OpSlot::Op(op) => op,
            done => {
                let result = match &done {
                    OpSlot::Expr(expr) => Some(expr.clone()),
                    _ => None,
                };
                self.scopes[scope].ops[index] = done;
                return Ok(result);
            }
        };
        if skip_optional && op.is_optional() {
            self.scopes[scope].ops[index] = OpSlot::Op(op);
            return Ok(None);
        }

        // Anything resolving this op while it runs gets the fallback.
        self.scopes[scope].ops[index] = op.circular_fallback();
        let result = self.execute(scope, &op)?;
        self.executed_ops += 1;
        self.scopes[scope].ops[index] = match &result {
            Some(expr) => OpSlot::Expr(expr.clone()),
            None => OpSlot::Empty,
        };
        Ok(result)
    }

    /// The local produced for `target`, looked up in `scope` and then its parents.
    fn resolve(&mut self, scope: ScopeId, target: Target<'_>) -> Result<Expr, TypeCheckError> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(index) = self.scopes[id].lookup(&target) {
                if let Some(expr) = self.execute_op(id, index, false)? {
                    return Ok(expr.without_comments());
                }
                break;
            }
            current = self.scopes[id].parent;
        }
        Err(TypeCheckError::UnresolvedScopeLookup {
            template_id: self.meta.id.clone(),
            target: target.describe(),
        })
    }

    /// The combined guard of `scope` and all of its parents.
    fn scope_guard(&self, scope: ScopeId) -> Option<Expr> {
        let data = &self.scopes[scope];
        let parent = data.parent.and_then(|p| self.scope_guard(p));
        match (parent, &data.guard) {
            (Some(parent), Some(own)) => Some(wrap_for_diagnostics(parent).binary("&&", wrap_for_diagnostics(own.clone()))),
            (Some(parent), None) => Some(parent),
            (None, own) => own.clone(),
        }
    }

    fn expression(&mut self, scope: ScopeId, ast: &AST, mode: TranslationMode) -> Result<Expr, TypeCheckError> {
        let config = self.config.clone();
        let mut scoped = ScopedTcb { tcb: self, scope };
        tcb_expression(ast, &mut scoped, &config, mode)
    }

    /// Loosens a bound expression according to the input-checking configuration.
    fn widen(&self, expr: Expr) -> Expr {
        if !self.config.check_type_of_input_bindings {
            wrap_for_diagnostics(expr).as_any().paren()
        } else if !self.config.strict_null_input_bindings && !expr.is_non_nullable_literal() {
            wrap_for_diagnostics(expr).non_null()
        } else {
            expr
        }
    }

    fn consumed_by(&self, binding: NodeId, dir: &DirectiveRef) -> bool {
        matches!(
            self.bound().get_consumer_of_binding(binding),
            Some(ConsumerOfBinding::Directive(consumer)) if consumer.class_ref() == dir.class_ref()
        )
    }

    fn execute(&mut self, scope: ScopeId, op: &TcbOp<'t>) -> Result<Option<Expr>, TypeCheckError> {
        match op {
            TcbOp::Element(element) => {
                let id = self.allocate_id();
                let init = Expr::ident("document")
                    .prop("createElement")
                    .call(vec![Expr::string(element.name.clone())]);
                let init = add_parse_span_info(init, absolute(&element.start_source_span));
                self.add_statement(scope, Stmt::var(Expr::ident(id.clone()), init));
                Ok(Some(Expr::ident(id)))
            }
            TcbOp::TemplateContext => {
                let id = self.allocate_id();
                self.add_statement(scope, Stmt::var(Expr::ident(id.clone()), Expr::null_as_any()));
                Ok(Some(Expr::ident(id)))
            }
            TcbOp::Variable { template, variable } => self.execute_variable(scope, *template, *variable).map(Some),
            TcbOp::TemplateBody(template) => self.execute_template_body(scope, *template).map(|_| None),
            TcbOp::DirectiveType { host, dir, any_params } => {
                let args = if *any_params || dir.is_generic() {
                    vec![TypeNode::any(); dir.class.type_parameters().len()]
                } else {
                    Vec::new()
                };
                let ty = self.env.reference_type(dir.class_ref(), args)?;
                let id = self.allocate_id();
                self.directive_locals.insert(id.clone(), dir.class_ref().clone());
                let name = directive_local(&id, *host);
                self.add_statement(scope, Stmt::var(name, Expr::null_non_null().as_type(ty)));
                Ok(Some(Expr::ident(id)))
            }
            TcbOp::DirectiveCtor { host, dir } => self.execute_directive_ctor(scope, *host, dir).map(Some),
            TcbOp::DirectiveCtorCircularFallback { dir } => {
                let ctor = self.env.type_ctor_for(dir)?;
                let id = self.allocate_id();
                self.add_statement(
                    scope,
                    Stmt::var(Expr::ident(id.clone()), ctor.call(vec![Expr::null_non_null()])),
                );
                Ok(Some(Expr::ident(id)))
            }
            TcbOp::DirectiveInputs { host, dir } => self.execute_directive_inputs(scope, *host, dir).map(|_| None),
            TcbOp::DirectiveOutputs { host, dir } => self.execute_directive_outputs(scope, *host, dir).map(|_| None),
            TcbOp::UnclaimedInputs { element, claimed } => {
                self.execute_unclaimed_inputs(scope, *element, claimed).map(|_| None)
            }
            TcbOp::UnclaimedOutputs { element, claimed } => {
                self.execute_unclaimed_outputs(scope, *element, claimed).map(|_| None)
            }
            TcbOp::DomSchemaCheck {
                element,
                check_element,
                claimed,
            } => {
                self.execute_dom_schema_check(*element, *check_element, claimed);
                Ok(None)
            }
            TcbOp::TextInterpolation(text) => {
                let expr = self.expression(scope, &text.value, TranslationMode::Binding)?;
                self.add_statement(scope, Stmt::Expr(expr));
                Ok(None)
            }
            TcbOp::Reference { reference, target } => self.execute_reference(scope, *reference, target).map(Some),
            TcbOp::InvalidReference => {
                let id = self.allocate_id();
                self.add_statement(scope, Stmt::var(Expr::ident(id.clone()), Expr::null_as_any()));
                Ok(Some(Expr::ident(id)))
            }
            TcbOp::ComponentContextCompletion => {
                let ctx = add_expression_identifier(
                    mark_ignore_diagnostics(Expr::this().prop("")),
                    ExpressionIdentifier::ComponentCompletion,
                );
                self.add_statement(scope, Stmt::Expr(ctx));
                Ok(None)
            }
        }
    }

    fn execute_variable(
        &mut self,
        scope: ScopeId,
        template: &'t Template,
        variable: &'t Variable,
    ) -> Result<Expr, TypeCheckError> {
        let ctx = self.resolve(scope, Target::TemplateContext(template.id))?;
        let id = self.allocate_id();
        let value = if variable.value.is_empty() {
            "$implicit"
        } else {
            variable.value.as_str()
        };
        let value_span = variable.value_span.as_ref().unwrap_or(&variable.source_span);
        let init = add_parse_span_info(ctx.prop(value), absolute(value_span));
        let name = add_parse_span_info(Expr::ident(id.clone()), absolute(&variable.key_span));
        self.add_statement(scope, Stmt::var(name, init));
        Ok(Expr::ident(id))
    }

    fn execute_template_body(&mut self, scope: ScopeId, template: &'t Template) -> Result<(), TypeCheckError> {
        let host = DirectiveHost::Template(template);
        let directives = self.bound().get_directives_of_node(template.id).unwrap_or(&[]);
        let mut guards = Vec::new();
        for dir in directives {
            let mut instance: Option<Expr> = None;
            for guard in &dir.ng_template_guards {
                let inputs: Vec<&'t BoundAttribute> = host
                    .inputs()
                    .iter()
                    .chain(host.bound_template_attrs())
                    .filter(|input| input.name == guard.input_name && self.consumed_by(input.id, dir))
                    .collect();
                for input in inputs {
                    let expr = self.expression(scope, &input.value, TranslationMode::Binding)?;
                    let guard_expr = match guard.type_ {
                        TemplateGuardType::Binding => expr,
                        TemplateGuardType::Invocation => {
                            let dir_id = match &instance {
                                Some(id) => id.clone(),
                                None => {
                                    let id = self.resolve(scope, Target::Directive(template.id, dir.class_ref()))?;
                                    instance = Some(id.clone());
                                    id
                                }
                            };
                            let guard_fn = self
                                .env
                                .reference(dir.class_ref())?
                                .prop(format!("ngTemplateGuard_{}", guard.input_name));
                            add_parse_span_info(guard_fn.call(vec![dir_id, expr]), absolute(&input.source_span))
                        }
                    };
                    guards.push(wrap_for_diagnostics(guard_expr));
                }
            }

            if dir.has_ng_template_context_guard && self.config.apply_template_context_guards {
                let ctx = self.resolve(scope, Target::TemplateContext(template.id))?;
                let dir_id = match instance {
                    Some(id) => id,
                    None => self.resolve(scope, Target::Directive(template.id, dir.class_ref()))?,
                };
                let guard_fn = self.env.reference(dir.class_ref())?.prop("ngTemplateContextGuard");
                guards.push(add_parse_span_info(
                    guard_fn.call(vec![dir_id, ctx]),
                    absolute(&template.source_span),
                ));
            }
        }

        let guard = guards.into_iter().reduce(|acc, next| acc.binary("&&", next));
        let child = self.build_scope(Some(scope), Some(template), &template.children, guard.clone());
        let statements = self.render(child)?;
        let block = match guard {
            Some(condition) => Stmt::If {
                condition,
                then: statements,
            },
            None => Stmt::Block(statements),
        };
        self.add_statement(scope, block);
        Ok(())
    }

    fn execute_directive_ctor(
        &mut self,
        scope: ScopeId,
        host: DirectiveHost<'t>,
        dir: &DirectiveRef,
    ) -> Result<Expr, TypeCheckError> {
        let mut fields: IndexMap<String, ObjectProperty> = IndexMap::new();
        for binding in host.inputs().iter().chain(host.bound_template_attrs()) {
            if !is_property_binding(binding) || !self.consumed_by(binding.id, dir) {
                continue;
            }
            let expr = self.expression(scope, &binding.value, TranslationMode::Binding)?;
            let expr = self.widen(expr);
            for mapping in dir.inputs.get_by_binding_property_name(&binding.name) {
                if fields.contains_key(&mapping.class_property_name) {
                    continue;
                }
                fields.insert(
                    mapping.class_property_name.clone(),
                    ObjectProperty {
                        key: mapping.class_property_name.clone(),
                        value: expr.clone(),
                        comments: span_comments(&binding.source_span),
                    },
                );
            }
        }
        for attr in host.attributes().iter().chain(host.text_template_attrs()) {
            for mapping in dir.inputs.get_by_binding_property_name(&attr.name) {
                if fields.contains_key(&mapping.class_property_name) {
                    continue;
                }
                fields.insert(
                    mapping.class_property_name.clone(),
                    ObjectProperty {
                        key: mapping.class_property_name.clone(),
                        value: Expr::string(attr.value.clone()),
                        comments: span_comments(&attr.source_span),
                    },
                );
            }
        }
        for mapping in dir.inputs.iter() {
            if !fields.contains_key(&mapping.class_property_name) {
                fields.insert(
                    mapping.class_property_name.clone(),
                    ObjectProperty {
                        key: mapping.class_property_name.clone(),
                        value: Expr::null_as_any(),
                        comments: Comments::new(),
                    },
                );
            }
        }

        let ctor = self.env.type_ctor_for(dir)?;
        let init = ctor.call(vec![Expr::new(ExprKind::ObjectLit(fields.into_values().collect()))]);
        let init = add_parse_span_info(init, absolute(host.source_span()));
        let id = self.allocate_id();
        self.directive_locals.insert(id.clone(), dir.class_ref().clone());
        self.add_statement(scope, Stmt::var(directive_local(&id, host), init));
        Ok(Expr::ident(id))
    }

    fn execute_directive_inputs(
        &mut self,
        scope: ScopeId,
        host: DirectiveHost<'t>,
        dir: &DirectiveRef,
    ) -> Result<(), TypeCheckError> {
        let mut dir_id: Option<Expr> = None;
        let mut bound_names: HashSet<&str> = HashSet::new();

        for binding in host.inputs().iter().chain(host.bound_template_attrs()) {
            if !is_property_binding(binding) || !self.consumed_by(binding.id, dir) {
                continue;
            }
            bound_names.insert(binding.name.as_str());
            let expr = self.expression(scope, &binding.value, TranslationMode::Binding)?;
            let mut assignment = self.widen(expr);
            for mapping in dir.inputs.get_by_binding_property_name(&binding.name) {
                let target = self.input_target(scope, host, dir, &mut dir_id, mapping)?;
                let target = add_parse_span_info(target, absolute(&binding.key_span));
                assignment = target.assign(wrap_for_diagnostics(assignment));
            }
            let assignment = add_parse_span_info(assignment, absolute(&binding.source_span));
            self.add_statement(scope, Stmt::Expr(assignment));
        }

        for attr in host.attributes().iter().chain(host.text_template_attrs()) {
            let mappings = dir.inputs.get_by_binding_property_name(&attr.name);
            if mappings.is_empty() {
                continue;
            }
            bound_names.insert(attr.name.as_str());
            let mut assignment = Expr::string(attr.value.clone());
            for mapping in mappings {
                let target = self.input_target(scope, host, dir, &mut dir_id, mapping)?;
                assignment = target.assign(assignment);
            }
            // Static attributes are always strings; their types are not checked.
            let assignment = mark_ignore_diagnostics(add_parse_span_info(assignment, absolute(&attr.source_span)));
            self.add_statement(scope, Stmt::Expr(assignment));
        }

        let mut missing: Vec<String> = Vec::new();
        for mapping in dir.inputs.iter().filter(|m| m.is_required()) {
            let name = &mapping.binding_property_name;
            if !bound_names.contains(name.as_str()) && !missing.contains(name) {
                missing.push(name.clone());
            }
        }
        if !missing.is_empty() {
            self.oob.missing_required_inputs(
                &self.meta.id,
                host.start_source_span(),
                &dir.name,
                dir.is_component,
                &missing,
            );
        }
        Ok(())
    }

    /// The expression an input binding assigns to.
    fn input_target(
        &mut self,
        scope: ScopeId,
        host: DirectiveHost<'t>,
        dir: &DirectiveRef,
        dir_id: &mut Option<Expr>,
        mapping: &PropertyMapping,
    ) -> Result<Expr, TypeCheckError> {
        let field = mapping.class_property_name.as_str();

        if mapping.flags.contains(InputFlags::COERCED) && !mapping.flags.contains(InputFlags::SIGNAL) {
            let class_name = match self.env.reference_type(dir.class_ref(), Vec::new())? {
                TypeNode::Reference { name, .. } => name,
                _ => dir.name.clone(),
            };
            let id = self.allocate_id();
            self.add_statement(
                scope,
                Stmt::Var {
                    constant: false,
                    name: Expr::ident(id.clone()),
                    ty: Some(TypeNode::Query(format!("{}.ngAcceptInputType_{}", class_name, field))),
                    init: Some(Expr::null_non_null()),
                },
            );
            return Ok(Expr::ident(id));
        }

        let instance = match dir_id {
            Some(id) => id.clone(),
            None => {
                let id = self.resolve(scope, Target::Directive(host.id(), dir.class_ref()))?;
                *dir_id = Some(id.clone());
                id
            }
        };

        if mapping.flags.contains(InputFlags::RESTRICTED)
            && !self.config.honor_access_modifiers_for_input_bindings
        {
            if let ExprKind::Identifier(instance_name) = &instance.kind {
                let ty = TypeNode::IndexedAccess {
                    object: Box::new(TypeNode::Query(instance_name.clone())),
                    index: Box::new(TypeNode::StringLiteral(field.to_string())),
                };
                let id = self.allocate_id();
                self.add_statement(
                    scope,
                    Stmt::Var {
                        constant: false,
                        name: Expr::ident(id.clone()),
                        ty: Some(ty),
                        init: Some(Expr::null_non_null()),
                    },
                );
                return Ok(Expr::ident(id));
            }
        }

        let access = if mapping.needs_string_literal_access() {
            instance.index(Expr::string(field))
        } else {
            instance.prop(field)
        };
        if mapping.flags.contains(InputFlags::SIGNAL) {
            let brand = self
                .env
                .reference_external_symbol(ANGULAR_CORE, "ɵINPUT_SIGNAL_BRAND_WRITE_TYPE");
            return Ok(access.index(brand));
        }
        Ok(access)
    }

    fn execute_directive_outputs(
        &mut self,
        scope: ScopeId,
        host: DirectiveHost<'t>,
        dir: &DirectiveRef,
    ) -> Result<(), TypeCheckError> {
        let mut dir_id: Option<Expr> = None;
        for output in host.outputs() {
            if output.type_ == ParsedEventType::Animation || !self.consumed_by(output.id, dir) {
                continue;
            }
            if self.config.check_type_of_output_events && output.name.ends_with("Change") {
                self.check_split_two_way_binding(host, output);
            }
            let Some(mapping) = dir.outputs.get_by_binding_property_name(&output.name).into_iter().next() else {
                continue;
            };
            let instance = match &dir_id {
                Some(id) => id.clone(),
                None => {
                    let id = self.resolve(scope, Target::Directive(host.id(), dir.class_ref()))?;
                    dir_id = Some(id.clone());
                    id
                }
            };
            let field = add_parse_span_info(
                instance.index(Expr::string(mapping.class_property_name.clone())),
                absolute(&output.key_span),
            );
            if self.config.check_type_of_output_events {
                let handler = self.event_handler(scope, output, None)?;
                let call = add_parse_span_info(field.prop("subscribe").call(vec![handler]), absolute(&output.source_span));
                self.add_statement(scope, Stmt::Expr(call));
            } else {
                self.add_statement(scope, Stmt::Expr(field));
                let handler = self.event_handler(scope, output, Some(TypeNode::any()))?;
                self.add_statement(scope, Stmt::Expr(handler));
            }
        }
        Ok(())
    }

    fn execute_unclaimed_inputs(
        &mut self,
        scope: ScopeId,
        element: &'t Element,
        claimed: &HashSet<String>,
    ) -> Result<(), TypeCheckError> {
        let mut element_id: Option<Expr> = None;
        for binding in &element.inputs {
            let is_property = is_property_binding(binding);
            if is_property && claimed.contains(&binding.name) {
                continue;
            }
            let expr = self.expression(scope, &binding.value, TranslationMode::Binding)?;
            let expr = self.widen(expr);
            if self.config.check_type_of_dom_bindings
                && is_property
                && binding.name != "style"
                && binding.name != "class"
            {
                let target = match &element_id {
                    Some(id) => id.clone(),
                    None => {
                        let id = self.resolve(scope, Target::Element(element.id))?;
                        element_id = Some(id.clone());
                        id
                    }
                };
                let property = target.index(Expr::string(attr_to_prop(&binding.name)));
                let assignment = add_parse_span_info(
                    property.assign(wrap_for_diagnostics(expr)),
                    absolute(&binding.source_span),
                );
                self.add_statement(scope, Stmt::Expr(assignment));
            } else {
                self.add_statement(scope, Stmt::Expr(expr));
            }
        }
        Ok(())
    }

    fn execute_unclaimed_outputs(
        &mut self,
        scope: ScopeId,
        element: &'t Element,
        claimed: &HashSet<String>,
    ) -> Result<(), TypeCheckError> {
        let mut element_id: Option<Expr> = None;
        for output in &element.outputs {
            if claimed.contains(&output.name) {
                continue;
            }
            if self.config.check_type_of_output_events && output.name.ends_with("Change") {
                self.check_split_two_way_binding(DirectiveHost::Element(element), output);
            }
            if output.type_ != ParsedEventType::Animation && self.config.check_type_of_dom_events {
                let handler = self.event_handler(scope, output, None)?;
                let target = match &element_id {
                    Some(id) => id.clone(),
                    None => {
                        let id = self.resolve(scope, Target::Element(element.id))?;
                        element_id = Some(id.clone());
                        id
                    }
                };
                let listener = add_parse_span_info(target.prop("addEventListener"), absolute(&output.key_span));
                let call = listener.call(vec![Expr::string(output.name.clone()), handler]);
                self.add_statement(scope, Stmt::Expr(add_parse_span_info(call, absolute(&output.source_span))));
            } else {
                let handler = self.event_handler(scope, output, Some(TypeNode::any()))?;
                self.add_statement(scope, Stmt::Expr(handler));
            }
        }
        Ok(())
    }

    /// `($event): any => { handler; }`, wrapped in the scope's guard. `$event` is inferred
    /// from the call site unless `param_type` is given.
    fn event_handler(
        &mut self,
        scope: ScopeId,
        event: &BoundEvent,
        param_type: Option<TypeNode>,
    ) -> Result<Expr, TypeCheckError> {
        let handler = self.expression(scope, &event.handler, TranslationMode::Handler)?;
        let mut body = vec![Stmt::Expr(handler)];
        if let Some(guard) = self.scope_guard(scope) {
            body = vec![Stmt::If {
                condition: guard,
                then: body,
            }];
        }
        let mut comments = Comments::new();
        comments.push(Comment::Tag(ExpressionIdentifier::EventParameter));
        Ok(Expr::new(ExprKind::Arrow {
            params: vec![Param {
                name: EVENT_PARAMETER.to_string(),
                ty: param_type,
                comments,
            }],
            ret: Some(TypeNode::any()),
            body,
        }))
    }

    /// Reports `[(x)]` whose property half went to a directive but whose event half did
    /// not go to the same directive.
    fn check_split_two_way_binding(&mut self, host: DirectiveHost<'t>, output: &'t BoundEvent) {
        let Some(input_name) = output.name.strip_suffix("Change") else {
            return;
        };
        let Some(input) = host
            .inputs()
            .iter()
            .find(|i| i.name == input_name && i.type_ == BindingType::TwoWay)
        else {
            return;
        };
        let bound = self.bound();
        let Some(ConsumerOfBinding::Directive(input_consumer)) = bound.get_consumer_of_binding(input.id) else {
            return;
        };
        let output_consumer = match bound.get_consumer_of_binding(output.id) {
            Some(ConsumerOfBinding::Directive(dir)) if dir.class_ref() != input_consumer.class_ref() => {
                OutputConsumer::Directive(dir.class_ref())
            }
            Some(ConsumerOfBinding::Element(_)) | None => match host {
                DirectiveHost::Element(element) => OutputConsumer::Element {
                    tag_name: &element.name,
                    start_source_span: &element.start_source_span,
                },
                DirectiveHost::Template(_) => return,
            },
            _ => return,
        };
        self.oob.split_two_way_binding(
            &self.meta.id,
            input,
            output,
            input_consumer.class_ref(),
            output_consumer,
        );
    }

    fn execute_dom_schema_check(&mut self, element: &'t Element, check_element: bool, claimed: &HashSet<String>) {
        let id = &self.meta.id;
        if check_element {
            self.dom.check_element(id, element, self.meta.schemas);
        }
        for binding in &element.inputs {
            if !is_property_binding(binding) || claimed.contains(&binding.name) {
                continue;
            }
            if binding.name == "style" || binding.name == "class" {
                continue;
            }
            self.dom.check_property(
                id,
                element,
                attr_to_prop(&binding.name),
                &binding.source_span,
                self.meta.schemas,
            );
        }
    }

    fn execute_reference(
        &mut self,
        scope: ScopeId,
        reference: &'t Reference,
        target: &ReferenceTarget<DirectiveRef>,
    ) -> Result<Expr, TypeCheckError> {
        let init = match target {
            ReferenceTarget::Element(node) => {
                let element = self.resolve(scope, Target::Element(*node))?;
                if self.config.check_type_of_dom_references {
                    element
                } else {
                    element.as_any()
                }
            }
            ReferenceTarget::Template(_) => {
                if self.config.check_type_of_non_dom_references {
                    let template_ref =
                        self.env
                            .reference_external_type(ANGULAR_CORE, "TemplateRef", vec![TypeNode::any()]);
                    Expr::null_as_any().as_type(template_ref)
                } else {
                    Expr::null_as_any()
                }
            }
            ReferenceTarget::DirectiveOnNode { directive, node } => {
                let instance = self.resolve(scope, Target::Directive(*node, directive.class_ref()))?;
                if self.config.check_type_of_non_dom_references {
                    instance
                } else {
                    instance.as_any()
                }
            }
        };
        let init = add_parse_span_info(init.paren(), absolute(&reference.source_span));
        let id = self.allocate_id();
        let name = add_parse_span_info(Expr::ident(id.clone()), absolute(&reference.key_span));
        self.add_statement(scope, Stmt::var(name, init));
        Ok(Expr::ident(id))
    }
}

/// Expression translation hooks for one scope.
struct ScopedTcb<'a, 't, 'c> {
    tcb: &'a mut Tcb<'t, 'c>,
    scope: ScopeId,
}

impl ExpressionScope for ScopedTcb<'_, '_, '_> {
    fn expression_target(&self, ast: &AST) -> Option<TemplateEntity> {
        self.tcb.bound().get_expression_target(ast)
    }

    fn resolve_entity(&mut self, entity: TemplateEntity) -> Result<Expr, TypeCheckError> {
        let target = match entity {
            TemplateEntity::Reference(id) => Target::Reference(id),
            TemplateEntity::Variable(id) => Target::Variable(id),
        };
        self.tcb.resolve(self.scope, target)
    }

    fn pipe_instance(&mut self, name: &str, name_span: AbsoluteSourceSpan) -> Result<Option<Expr>, TypeCheckError> {
        match self.tcb.meta.pipes.get(name) {
            Some(pipe) => self.tcb.env.pipe_inst(pipe).map(Some),
            None => {
                let span = self.tcb.parse_span(name_span);
                self.tcb.oob.missing_pipe(&self.tcb.meta.id, name, &span);
                Ok(None)
            }
        }
    }

    fn illegal_assignment(&mut self, span: AbsoluteSourceSpan, variable: NodeId) {
        let Some(target) = self.tcb.variables.get(&variable).copied() else {
            return;
        };
        let span = self.tcb.parse_span(span);
        self.tcb
            .oob
            .illegal_assignment_to_template_var(&self.tcb.meta.id, &span, target);
    }
}

fn absolute(span: &ParseSourceSpan) -> AbsoluteSourceSpan {
    AbsoluteSourceSpan::new(span.start.offset, span.end.offset)
}

fn span_comments(span: &ParseSourceSpan) -> Comments {
    let mut comments = Comments::new();
    comments.push(Comment::Span(absolute(span)));
    comments
}

/// The declared name of a directive local, tagged so tooling can find it.
fn directive_local(id: &str, host: DirectiveHost<'_>) -> Expr {
    add_expression_identifier(
        add_parse_span_info(Expr::ident(id), absolute(host.start_source_span())),
        ExpressionIdentifier::DirectiveInstance,
    )
}

fn is_property_binding(binding: &BoundAttribute) -> bool {
    matches!(binding.type_, BindingType::Property | BindingType::TwoWay)
}

/// DOM property written by a binding to attribute-style `name`.
fn attr_to_prop(name: &str) -> &str {
    match name {
        "class" => "className",
        "for" => "htmlFor",
        "formaction" => "formAction",
        "innerHtml" => "innerHTML",
        "readonly" => "readOnly",
        "tabindex" => "tabIndex",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use angular_compiler::render3::view::t2_binder::R3TargetBinder;
    use angular_compiler::testing::TemplateBuilder;

    use super::*;
    use crate::ngtsc::file_system::AbsoluteFsPath;
    use crate::ngtsc::reflection::{ClassDeclaration, ClassRef};
    use crate::ngtsc::typecheck::api::TypeCheckableDirectiveMeta;
    use crate::ngtsc::typecheck::src::dom::RegistryDomSchemaChecker;
    use crate::ngtsc::typecheck::src::oob::OutOfBandDiagnosticRecorderImpl;
    use crate::ngtsc::typecheck::src::reference_emitter::LocalOrImportEmitter;

    fn env() -> Environment {
        Environment::new(
            TypeCheckingConfig::default(),
            AbsoluteFsPath::from("/app.ngtypecheck.ts"),
            Arc::new(LocalOrImportEmitter),
        )
    }

    #[test]
    fn test_resolving_twice_executes_once() {
        let mut b = TemplateBuilder::new("<div></div>");
        let div = b.element("div", "<div></div>");
        let div_id = div.id;
        let nodes = vec![R3Node::Element(div)];
        let bound = R3TargetBinder::<DirectiveRef>::from_directives(Vec::new()).bind(&nodes);
        let pipes = IndexMap::new();
        let meta = TypeCheckBlockMetadata {
            id: TemplateId::new(1),
            nodes: &nodes,
            bound_target: &bound,
            pipes: &pipes,
            schemas: &[],
            template_file: b.file(),
        };
        let mut env = env();
        let mut dom = RegistryDomSchemaChecker::default();
        let mut oob = OutOfBandDiagnosticRecorderImpl::new();
        let mut tcb = Tcb::new(&mut env, &meta, &mut dom, &mut oob);
        let root = tcb.build_scope(None, None, &nodes, None);

        let first = tcb.resolve(root, Target::Element(div_id)).unwrap();
        let after_first = tcb.executed_ops;
        let second = tcb.resolve(root, Target::Element(div_id)).unwrap();
        assert_eq!(first, second);
        assert_eq!(after_first, 1);
        assert_eq!(tcb.executed_ops, 1);
    }

    #[test]
    fn test_unresolvable_target_is_an_internal_error() {
        let b = TemplateBuilder::new("");
        let nodes: Vec<R3Node> = Vec::new();
        let bound = R3TargetBinder::<DirectiveRef>::from_directives(Vec::new()).bind(&nodes);
        let pipes = IndexMap::new();
        let meta = TypeCheckBlockMetadata {
            id: TemplateId::new(1),
            nodes: &nodes,
            bound_target: &bound,
            pipes: &pipes,
            schemas: &[],
            template_file: b.file(),
        };
        let mut env = env();
        let mut dom = RegistryDomSchemaChecker::default();
        let mut oob = OutOfBandDiagnosticRecorderImpl::new();
        let mut tcb = Tcb::new(&mut env, &meta, &mut dom, &mut oob);
        let root = tcb.build_scope(None, None, &nodes, None);
        let err = tcb.resolve(root, Target::Element(NodeId(42))).unwrap_err();
        assert!(matches!(err, TypeCheckError::UnresolvedScopeLookup { .. }));
    }

    /// Prints the block of `nodes`, bound against `directives`, for `AppCmp`.
    fn generate(
        nodes: &[R3Node],
        file: &Arc<ParseSourceFile>,
        directives: Vec<DirectiveRef>,
        config: TypeCheckingConfig,
    ) -> Result<String, TypeCheckError> {
        let bound = R3TargetBinder::from_directives(directives).bind(nodes);
        let pipes = IndexMap::new();
        let meta = TypeCheckBlockMetadata {
            id: TemplateId::new(1),
            nodes,
            bound_target: &bound,
            pipes: &pipes,
            schemas: &[],
            template_file: file,
        };
        let mut env = Environment::new(
            config,
            AbsoluteFsPath::from("/app.ngtypecheck.ts"),
            Arc::new(LocalOrImportEmitter),
        );
        let component = ClassDeclaration::new(ClassRef::new("AppCmp", "/app.ts"));
        let mut dom = RegistryDomSchemaChecker::default();
        let mut oob = OutOfBandDiagnosticRecorderImpl::new();
        let tcb = generate_type_check_block(
            &mut env,
            &component,
            "_tcb1",
            &meta,
            &mut dom,
            &mut oob,
            TcbGenericContextBehavior::UseEmitter,
        )?;
        let mut printer = super::super::ts_ast::Printer::new();
        printer.print_tcb(&tcb);
        Ok(printer.finish().0)
    }

    fn generic_directive(name: &str, selector: &str, export_as: &str) -> DirectiveRef {
        let class = ClassDeclaration::new(ClassRef::new(name, "/dir.ts")).with_type_parameters(vec![
            crate::ngtsc::reflection::TypeParameter::new("T", None),
        ]);
        Arc::new(
            TypeCheckableDirectiveMeta::directive(class, selector)
                .with_input("value")
                .with_export_as(export_as),
        )
    }

    fn all_locals() -> TypeCheckingConfig {
        TypeCheckingConfig {
            check_unreferenced_locals: true,
            ..TypeCheckingConfig::default()
        }
    }

    #[test]
    fn test_self_referencing_generic_directive_uses_fallback() {
        let template = r#"<div dir #d="dir" [value]="d"></div>"#;
        let mut b = TemplateBuilder::new(template);
        let mut div = b.element("div", template);
        div.attributes.push(b.text_attribute("dir", "", "dir"));
        div.references.push(b.reference("d", "dir", "#d=\"dir\""));
        let value = b.ident_after("[value]", "d");
        div.inputs.push(b.input("value", value, "[value]=\"d\""));
        let nodes = vec![R3Node::Element(div)];

        let text = generate(
            &nodes,
            b.file(),
            vec![generic_directive("GenericDir", "[dir]", "dir")],
            all_locals(),
        )
        .unwrap();

        assert!(text.contains("_ctor1(null!)"), "{}", text);
        assert!(text.contains("_ctor1({ \"value\": "), "{}", text);
    }

    #[test]
    fn test_mutually_referencing_generic_directives_fall_back_once() {
        let template = r#"<div a #ra="a" [value]="rb"></div><div b #rb="b" [value]="ra"></div>"#;
        let first = r#"<div a #ra="a" [value]="rb"></div>"#;
        let second = r#"<div b #rb="b" [value]="ra"></div>"#;
        let mut b = TemplateBuilder::new(template);
        let mut div_a = b.element("div", first);
        div_a.attributes.push(b.text_attribute("a", "", "a"));
        div_a.references.push(b.reference("ra", "a", "#ra=\"a\""));
        let reads_b = b.ident_after("[value]=\"", "rb");
        div_a.inputs.push(b.input("value", reads_b, "[value]=\"rb\""));
        let mut div_b = b.element("div", second);
        div_b.attributes.push(b.text_attribute("b", "", "<div b"));
        div_b.references.push(b.reference("rb", "b", "#rb=\"b\""));
        let reads_a = b.ident_after("[value]=\"ra", "ra");
        div_b.inputs.push(b.input("value", reads_a, "[value]=\"ra\""));
        let nodes = vec![R3Node::Element(div_a), R3Node::Element(div_b)];
        let directives = vec![
            generic_directive("DirA", "[a]", "a"),
            generic_directive("DirB", "[b]", "b"),
        ];

        let text = generate(&nodes, b.file(), directives.clone(), all_locals()).unwrap();

        assert_eq!(text.matches("(null!)").count(), 1, "{}", text);
        assert!(text.contains("_ctor1(null!)"), "{}", text);
        assert!(text.contains("_ctor1({ \"value\": "), "{}", text);
        assert!(text.contains("_ctor2({ \"value\": "), "{}", text);

        // Entered through a reference instead, the cycle ends at the reference.
        assert!(generate(&nodes, b.file(), directives, TypeCheckingConfig::default()).is_ok());
    }

    #[test]
    fn test_unread_locals_are_only_declared_once_resolved() {
        let unread = r#"<div dir #d="dir"></div>"#;
        let mut b = TemplateBuilder::new(unread);
        let mut div = b.element("div", unread);
        div.attributes.push(b.text_attribute("dir", "", "dir "));
        div.references.push(b.reference("d", "dir", "#d=\"dir\""));
        let dir: DirectiveRef = Arc::new(
            TypeCheckableDirectiveMeta::directive(ClassDeclaration::new(ClassRef::new("Dir", "/dir.ts")), "[dir]")
                .with_export_as("dir"),
        );

        let text = generate(&[R3Node::Element(div)], b.file(), vec![dir.clone()], TypeCheckingConfig::default()).unwrap();
        assert_eq!(text.matches("var ").count(), 1, "{}", text);
        assert!(text.contains("document.createElement(\"div\")"), "{}", text);
        assert!(!text.contains("/*T:DIR*/"), "{}", text);

        let read = r#"<div dir #d="dir"></div>{{ d }}"#;
        let mut b = TemplateBuilder::new(read);
        let mut div = b.element("div", unread);
        div.attributes.push(b.text_attribute("dir", "", "dir "));
        div.references.push(b.reference("d", "dir", "#d=\"dir\""));
        let interpolation = b.bound_text(b.ident_after("{{", "d"), "{{ d }}");

        let text = generate(
            &[R3Node::Element(div), interpolation],
            b.file(),
            vec![dir],
            TypeCheckingConfig::default(),
        )
        .unwrap();
        assert_eq!(text.matches("var ").count(), 3, "{}", text);
        assert_eq!(text.matches("/*T:DIR*/").count(), 1, "{}", text);
        assert_eq!(text.matches("null! as ").count(), 1, "{}", text);
    }

    #[test]
    fn test_component_completion_leads_the_root_scope_only() {
        let template = r#"<div></div><ng-template let-item><span></span></ng-template>"#;
        let mut b = TemplateBuilder::new(template);
        let div = b.element("div", "<div></div>");
        let span = b.element("span", "<span></span>");
        let mut tpl = b.template(r#"<ng-template let-item><span></span></ng-template>"#);
        tpl.variables.push(b.variable("item", "$implicit", "let-item"));
        tpl.children.push(R3Node::Element(span));
        let nodes = vec![R3Node::Element(div), R3Node::Template(tpl)];
        let config = TypeCheckingConfig {
            enable_template_type_checker: true,
            ..TypeCheckingConfig::default()
        };

        let text = generate(&nodes, b.file(), Vec::new(), config).unwrap();
        assert_eq!(text.matches("/*T:COMPCOMP*/").count(), 1, "{}", text);
        let anchor = text.find("this. /*D:ignore*/ /*T:COMPCOMP*/").unwrap();
        assert!(anchor < text.find("document.createElement").unwrap(), "{}", text);
        // Unread template variables are still declared.
        assert!(text.contains(".$implicit"), "{}", text);

        let text = generate(&nodes, b.file(), Vec::new(), TypeCheckingConfig::default()).unwrap();
        assert!(!text.contains("COMPCOMP"), "{}", text);
    }
}
