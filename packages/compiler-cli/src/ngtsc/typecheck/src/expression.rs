// Template Expression Translation
//
// Turns template expressions into synthesized TypeScript expressions. Every translated
// node carries the template span it came from so diagnostics can be mapped back.

use angular_compiler::expression_parser::ast::{AbsoluteSourceSpan, LiteralValue, AST};
use angular_compiler::render3::r3_ast::NodeId;
use angular_compiler::render3::view::t2_api::TemplateEntity;

use super::comments::{add_expression_identifier, add_parse_span_info, ExpressionIdentifier};
use super::ts_ast::{Expr, ExprKind, ObjectProperty, TypeNode};
use crate::ngtsc::typecheck::api::{TypeCheckError, TypeCheckingConfig};

/// What the translator needs from the scope an expression is evaluated in.
pub trait ExpressionScope {
    /// The binding graph's verdict for an implicit-receiver read or write.
    fn expression_target(&self, ast: &AST) -> Option<TemplateEntity>;

    /// The local holding a template reference or variable.
    fn resolve_entity(&mut self, entity: TemplateEntity) -> Result<Expr, TypeCheckError>;

    /// The pipe instance registered under `name`, or `None` after reporting it missing.
    fn pipe_instance(&mut self, name: &str, name_span: AbsoluteSourceSpan) -> Result<Option<Expr>, TypeCheckError>;

    /// Reports an assignment to the template variable `variable`.
    fn illegal_assignment(&mut self, span: AbsoluteSourceSpan, variable: NodeId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationMode {
    Binding,
    /// Inside an event handler, where `$event` names the handler's parameter.
    Handler,
}

pub const EVENT_PARAMETER: &str = "$event";

pub struct ExpressionTranslator<'a> {
    scope: &'a mut dyn ExpressionScope,
    config: &'a TypeCheckingConfig,
    mode: TranslationMode,
}

/// Translates `ast` as evaluated in `scope`.
pub fn tcb_expression(
    ast: &AST,
    scope: &mut dyn ExpressionScope,
    config: &TypeCheckingConfig,
    mode: TranslationMode,
) -> Result<Expr, TypeCheckError> {
    ExpressionTranslator { scope, config, mode }.translate(ast)
}

/// Parenthesizes compound expressions so the printed text keeps their grouping when they
/// are used as operands.
pub fn wrap_for_diagnostics(expr: Expr) -> Expr {
    match expr.kind {
        ExprKind::Binary { .. }
        | ExprKind::Conditional { .. }
        | ExprKind::AsType { .. }
        | ExprKind::Comma(_)
        | ExprKind::Arrow { .. } => expr.paren(),
        _ => expr,
    }
}

/// `null as any ? a!.b : undefined`, the loose form of a safe navigation.
fn loose_safe_access(access: Expr) -> Expr {
    Expr::new(ExprKind::Conditional {
        condition: Box::new(Expr::new(ExprKind::Null).as_any()),
        when_true: Box::new(access),
        when_false: Box::new(Expr::new(ExprKind::Undefined)),
    })
    .paren()
}

impl ExpressionTranslator<'_> {
    pub fn translate(&mut self, ast: &AST) -> Result<Expr, TypeCheckError> {
        let span = ast.source_span();
        let expr = match ast {
            AST::EmptyExpr(_) => Expr::new(ExprKind::Undefined),
            // The implicit receiver has no text of its own.
            AST::ImplicitReceiver(_) => return Ok(Expr::this()),
            AST::ThisReceiver(_) => Expr::this(),
            AST::Chain(chain) => {
                let items = chain
                    .expressions
                    .iter()
                    .map(|e| self.translate(e))
                    .collect::<Result<Vec<_>, _>>()?;
                Expr::new(ExprKind::Comma(items)).paren()
            }
            AST::Conditional(cond) => {
                let condition = wrap_for_diagnostics(self.translate(&cond.condition)?);
                let when_true = wrap_for_diagnostics(self.translate(&cond.true_exp)?);
                let when_false = wrap_for_diagnostics(self.translate(&cond.false_exp)?);
                Expr::new(ExprKind::Conditional {
                    condition: Box::new(condition),
                    when_true: Box::new(when_true),
                    when_false: Box::new(when_false),
                })
                .paren()
            }
            AST::PropertyRead(read) => {
                if matches!(*read.receiver, AST::ImplicitReceiver(_)) {
                    if let Some(entity) = self.scope.expression_target(ast) {
                        let local = self.scope.resolve_entity(entity)?;
                        let local = match entity {
                            TemplateEntity::Variable(_) => {
                                add_expression_identifier(local, ExpressionIdentifier::VariableAsExpression)
                            }
                            TemplateEntity::Reference(_) => local,
                        };
                        return Ok(add_parse_span_info(local, read.name_span));
                    }
                    if self.mode == TranslationMode::Handler && read.name == EVENT_PARAMETER {
                        return Ok(add_parse_span_info(Expr::ident(EVENT_PARAMETER), span));
                    }
                }
                self.translate(&read.receiver)?.prop(read.name.clone())
            }
            AST::SafePropertyRead(read) => {
                let receiver = self.translate(&read.receiver)?;
                if self.config.strict_safe_navigation_types {
                    receiver.optional_prop(read.name.clone())
                } else {
                    loose_safe_access(receiver.non_null().prop(read.name.clone()))
                }
            }
            AST::KeyedRead(read) => {
                let receiver = self.translate(&read.receiver)?;
                receiver.index(self.translate(&read.key)?)
            }
            AST::SafeKeyedRead(read) => {
                let receiver = self.translate(&read.receiver)?;
                let key = self.translate(&read.key)?;
                if self.config.strict_safe_navigation_types {
                    Expr::new(ExprKind::Element {
                        object: Box::new(receiver),
                        index: Box::new(key),
                        optional: true,
                    })
                } else {
                    loose_safe_access(receiver.non_null().index(key))
                }
            }
            AST::PropertyWrite(write) => {
                let value = wrap_for_diagnostics(self.translate(&write.value)?);
                if matches!(*write.receiver, AST::ImplicitReceiver(_)) {
                    match self.scope.expression_target(ast) {
                        Some(TemplateEntity::Variable(variable)) => {
                            // Template variables are read-only; only the value is checked.
                            self.scope.illegal_assignment(span, variable);
                            return Ok(add_parse_span_info(value, span));
                        }
                        Some(entity) => {
                            let target = add_parse_span_info(self.scope.resolve_entity(entity)?, write.name_span);
                            return Ok(add_parse_span_info(target.assign(value).paren(), span));
                        }
                        None => {}
                    }
                }
                let target = self.translate(&write.receiver)?.prop(write.name.clone());
                target.assign(value).paren()
            }
            AST::KeyedWrite(write) => {
                let receiver = self.translate(&write.receiver)?;
                let key = self.translate(&write.key)?;
                let value = wrap_for_diagnostics(self.translate(&write.value)?);
                receiver.index(key).assign(value).paren()
            }
            AST::BindingPipe(pipe) => {
                let instance = match self.scope.pipe_instance(&pipe.name, pipe.name_span)? {
                    Some(instance) if self.config.check_type_of_pipes => instance,
                    Some(instance) => instance.as_any().paren(),
                    None => Expr::null_as_any().paren(),
                };
                let method = add_parse_span_info(instance.prop("transform"), pipe.name_span);
                let mut args = vec![wrap_for_diagnostics(self.translate(&pipe.exp)?)];
                for arg in &pipe.args {
                    args.push(wrap_for_diagnostics(self.translate(arg)?));
                }
                method.call(args)
            }
            AST::LiteralPrimitive(literal) => match &literal.value {
                LiteralValue::String(value) => Expr::string(value.clone()),
                LiteralValue::Number(value) => Expr::new(ExprKind::NumberLit(*value)),
                LiteralValue::Boolean(value) => Expr::new(ExprKind::BoolLit(*value)),
                LiteralValue::Null => Expr::new(ExprKind::Null),
                LiteralValue::Undefined => Expr::new(ExprKind::Undefined),
            },
            AST::LiteralArray(array) => {
                let items = array
                    .expressions
                    .iter()
                    .map(|e| self.translate(e))
                    .collect::<Result<Vec<_>, _>>()?;
                Expr::new(ExprKind::ArrayLit(items))
            }
            AST::LiteralMap(map) => {
                let mut props = Vec::with_capacity(map.keys.len());
                for (key, value) in map.keys.iter().zip(&map.values) {
                    props.push(ObjectProperty {
                        key: key.key.clone(),
                        value: self.translate(value)?,
                        comments: Default::default(),
                    });
                }
                Expr::new(ExprKind::ObjectLit(props))
            }
            AST::Interpolation(interpolation) => {
                let mut expr = Expr::string("");
                for part in &interpolation.expressions {
                    expr = expr.binary("+", wrap_for_diagnostics(self.translate(part)?));
                }
                expr
            }
            AST::Binary(binary) => {
                let left = wrap_for_diagnostics(self.translate(&binary.left)?);
                let right = wrap_for_diagnostics(self.translate(&binary.right)?);
                left.binary(&binary.operation, right)
            }
            AST::PrefixNot(not) => Expr::new(ExprKind::Unary {
                op: "!".to_string(),
                operand: Box::new(self.translate(&not.expression)?),
            }),
            AST::Unary(unary) => Expr::new(ExprKind::Unary {
                op: unary.operator.clone(),
                operand: Box::new(self.translate(&unary.expr)?),
            }),
            AST::TypeofExpression(typeof_expr) => Expr::new(ExprKind::Unary {
                op: "typeof ".to_string(),
                operand: Box::new(self.translate(&typeof_expr.expression)?),
            }),
            AST::NonNullAssert(assert) => self.translate(&assert.expression)?.non_null(),
            AST::Call(call) => {
                if let Some(arg) = as_any_cast(&call.receiver, &call.args) {
                    let inner = self.translate(arg)?;
                    return Ok(add_parse_span_info(inner.as_type(TypeNode::any()).paren(), span));
                }
                let callee = self.translate(&call.receiver)?;
                let args = self.translate_args(&call.args)?;
                callee.call(args)
            }
            AST::SafeCall(call) => {
                let callee = self.translate(&call.receiver)?;
                let args = self.translate_args(&call.args)?;
                if self.config.strict_safe_navigation_types {
                    Expr::new(ExprKind::Call {
                        callee: Box::new(callee),
                        args,
                        optional: true,
                    })
                } else {
                    loose_safe_access(callee.non_null().call(args))
                }
            }
        };
        Ok(add_parse_span_info(expr, span))
    }

    fn translate_args(&mut self, args: &[AST]) -> Result<Vec<Expr>, TypeCheckError> {
        args.iter().map(|a| self.translate(a)).collect()
    }
}

/// The argument of a `$any(x)` call made on the component context.
fn as_any_cast<'a>(receiver: &AST, args: &'a [AST]) -> Option<&'a AST> {
    match (receiver, args) {
        (AST::PropertyRead(read), [arg]) if read.name == "$any" && read.receiver.is_implicit_receiver() => Some(arg),
        _ => None,
    }
}
