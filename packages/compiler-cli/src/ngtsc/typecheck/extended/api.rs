// Extended Template Check API

use std::collections::HashMap;

use angular_compiler::expression_parser::ast::{AbsoluteSourceSpan, AST};
use angular_compiler::render3::r3_ast::{R3Node, TemplateAttr};
use serde::{Deserialize, Serialize};
use ts::{CompilerOptions, DiagnosticCategory};

use crate::ngtsc::diagnostics::{ng_error_code, ErrorCode, ExtendedTemplateDiagnosticName};
use crate::ngtsc::reflection::ClassRef;
use crate::ngtsc::typecheck::api::{TemplateDiagnostic, TemplateNode, TemplateTypeChecker};
use crate::ngtsc::typecheck::src::diagnostics::make_template_diagnostic;

/// How the diagnostics of a check are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticCategoryLabel {
    #[default]
    Warning,
    Error,
    /// The check does not run.
    Suppress,
}

impl DiagnosticCategoryLabel {
    pub fn category(self) -> Option<DiagnosticCategory> {
        match self {
            DiagnosticCategoryLabel::Warning => Some(DiagnosticCategory::Warning),
            DiagnosticCategoryLabel::Error => Some(DiagnosticCategory::Error),
            DiagnosticCategoryLabel::Suppress => None,
        }
    }
}

/// The `extendedDiagnostics` section of the compiler options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedDiagnosticsOptions {
    #[serde(default)]
    pub default_category: Option<DiagnosticCategoryLabel>,
    /// Per-check overrides, keyed by check name.
    #[serde(default)]
    pub checks: HashMap<String, DiagnosticCategoryLabel>,
}

impl ExtendedDiagnosticsOptions {
    pub fn category_of(&self, name: ExtendedTemplateDiagnosticName) -> DiagnosticCategoryLabel {
        self.checks
            .get(name.as_str())
            .copied()
            .or(self.default_category)
            .unwrap_or_default()
    }
}

/// What a check sees of the component it runs on.
pub struct TemplateContext<'a> {
    pub checker: &'a dyn TemplateTypeChecker,
    pub component: &'a ClassRef,
    pub category: DiagnosticCategory,
    pub code: ErrorCode,
}

impl TemplateContext<'_> {
    /// A diagnostic of the running check at `span` of the component's template.
    pub fn make_template_diagnostic(&self, span: AbsoluteSourceSpan, message: impl Into<String>) -> Option<TemplateDiagnostic> {
        let (template_id, parse_span) = self.checker.get_template_span(self.component, span)?;
        Some(make_template_diagnostic(
            &template_id,
            &parse_span,
            self.category,
            ng_error_code(self.code),
            message,
            Vec::new(),
        ))
    }
}

pub trait TemplateCheck: Send + Sync {
    fn code(&self) -> ErrorCode;

    fn name(&self) -> ExtendedTemplateDiagnosticName;

    fn visit_node(&self, ctx: &TemplateContext<'_>, node: TemplateNode<'_>) -> Vec<TemplateDiagnostic>;

    /// Offers every node and expression of `template` to [`Self::visit_node`].
    fn run(&self, ctx: &TemplateContext<'_>, template: &[R3Node]) -> Vec<TemplateDiagnostic> {
        let mut diagnostics = Vec::new();
        visit_all(template, &mut |node| diagnostics.extend(self.visit_node(ctx, node)));
        diagnostics
    }
}

pub struct TemplateCheckFactory {
    pub code: ErrorCode,
    pub name: ExtendedTemplateDiagnosticName,
    /// `None` when the check does not apply under `options`.
    pub create: fn(&CompilerOptions) -> Option<Box<dyn TemplateCheck>>,
}

fn visit_all<'n>(nodes: &'n [R3Node], f: &mut dyn FnMut(TemplateNode<'n>)) {
    for node in nodes {
        match node {
            R3Node::Element(element) => {
                f(TemplateNode::Element(element));
                element.attributes.iter().for_each(|attr| f(TemplateNode::TextAttribute(attr)));
                for input in &element.inputs {
                    f(TemplateNode::BoundAttribute(input));
                    visit_ast(&input.value, f);
                }
                for output in &element.outputs {
                    f(TemplateNode::BoundEvent(output));
                    visit_ast(&output.handler, f);
                }
                element.references.iter().for_each(|r| f(TemplateNode::Reference(r)));
                visit_all(&element.children, f);
            }
            R3Node::Template(template) => {
                f(TemplateNode::Template(template));
                template.attributes.iter().for_each(|attr| f(TemplateNode::TextAttribute(attr)));
                // Bindings of a structural directive belong to the element it was written on.
                if template.tag_name.as_deref() == Some("ng-template") {
                    for input in &template.inputs {
                        f(TemplateNode::BoundAttribute(input));
                        visit_ast(&input.value, f);
                    }
                    for output in &template.outputs {
                        f(TemplateNode::BoundEvent(output));
                        visit_ast(&output.handler, f);
                    }
                    for attr in &template.template_attrs {
                        match attr {
                            TemplateAttr::Bound(bound) => {
                                f(TemplateNode::BoundAttribute(bound));
                                visit_ast(&bound.value, f);
                            }
                            TemplateAttr::Text(text) => f(TemplateNode::TextAttribute(text)),
                        }
                    }
                }
                template.variables.iter().for_each(|v| f(TemplateNode::Variable(v)));
                template.references.iter().for_each(|r| f(TemplateNode::Reference(r)));
                visit_all(&template.children, f);
            }
            R3Node::BoundText(text) => {
                f(TemplateNode::BoundText(text));
                visit_ast(&text.value, f);
            }
            R3Node::Text(_) | R3Node::Icu(_) => {}
        }
    }
}

fn visit_ast<'n>(ast: &'n AST, f: &mut dyn FnMut(TemplateNode<'n>)) {
    ast.walk(&mut |node| f(TemplateNode::Expression(node)));
}
