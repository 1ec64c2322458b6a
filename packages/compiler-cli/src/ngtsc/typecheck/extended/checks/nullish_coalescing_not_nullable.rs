// Nullish Coalescing Not Nullable
//
// Flags `a ?? b` when the host says `a` can be neither `null` nor `undefined`.

use angular_compiler::expression_parser::ast::AST;
use ts::CompilerOptions;

use crate::ngtsc::diagnostics::{ErrorCode, ExtendedTemplateDiagnosticName};
use crate::ngtsc::typecheck::api::{TemplateDiagnostic, TemplateNode, TemplateSymbol};
use crate::ngtsc::typecheck::extended::api::{TemplateCheck, TemplateCheckFactory, TemplateContext};

pub struct NullishCoalescingNotNullableCheck;

impl TemplateCheck for NullishCoalescingNotNullableCheck {
    fn code(&self) -> ErrorCode {
        ErrorCode::NullishCoalescingNotNullable
    }

    fn name(&self) -> ExtendedTemplateDiagnosticName {
        ExtendedTemplateDiagnosticName::NullishCoalescingNotNullable
    }

    fn visit_node(&self, ctx: &TemplateContext<'_>, node: TemplateNode<'_>) -> Vec<TemplateDiagnostic> {
        let TemplateNode::Expression(ast) = node else {
            return Vec::new();
        };
        let AST::Binary(binary) = ast else {
            return Vec::new();
        };
        if binary.operation != "??" {
            return Vec::new();
        }
        // Reads of references and variables resolve to their declarations, not to an
        // expression with a type of its own.
        let left = ctx
            .checker
            .get_symbol_of_node(TemplateNode::Expression(&binary.left), ctx.component);
        let Some(TemplateSymbol::Expression { ty: Some(left_type), .. }) = left else {
            return Vec::new();
        };
        if left_type.is_any_or_unknown() || left_type.is_nullable() {
            return Vec::new();
        }
        let whole = ctx.checker.get_symbol_of_node(TemplateNode::Expression(ast), ctx.component);
        if !matches!(whole, Some(TemplateSymbol::Expression { .. })) {
            return Vec::new();
        }
        ctx.make_template_diagnostic(
            binary.source_span,
            "The left side of this nullish coalescing operation does not include 'null' or 'undefined' in its type, therefore the '??' operator can be safely removed.",
        )
        .into_iter()
        .collect()
    }
}

fn create(options: &CompilerOptions) -> Option<Box<dyn TemplateCheck>> {
    let strict_null_checks = options.strict_null_checks.or(options.strict).unwrap_or(false);
    if !strict_null_checks {
        return None;
    }
    Some(Box::new(NullishCoalescingNotNullableCheck))
}

pub const FACTORY: TemplateCheckFactory = TemplateCheckFactory {
    code: ErrorCode::NullishCoalescingNotNullable,
    name: ExtendedTemplateDiagnosticName::NullishCoalescingNotNullable,
    create,
};
