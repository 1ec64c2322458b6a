// Invalid Banana In Box
//
// `([value])="x"` binds an event literally named `[value]`; the two-way syntax is
// `[(value)]="x"`.

use angular_compiler::expression_parser::ast::AbsoluteSourceSpan;
use ts::CompilerOptions;

use crate::ngtsc::diagnostics::{ErrorCode, ExtendedTemplateDiagnosticName};
use crate::ngtsc::typecheck::api::{TemplateDiagnostic, TemplateNode};
use crate::ngtsc::typecheck::extended::api::{TemplateCheck, TemplateCheckFactory, TemplateContext};

pub struct InvalidBananaInBoxCheck;

impl TemplateCheck for InvalidBananaInBoxCheck {
    fn code(&self) -> ErrorCode {
        ErrorCode::InvalidBananaInBox
    }

    fn name(&self) -> ExtendedTemplateDiagnosticName {
        ExtendedTemplateDiagnosticName::InvalidBananaInBox
    }

    fn visit_node(&self, ctx: &TemplateContext<'_>, node: TemplateNode<'_>) -> Vec<TemplateDiagnostic> {
        let TemplateNode::BoundEvent(event) = node else {
            return Vec::new();
        };
        let Some(inner) = event.name.strip_prefix('[').and_then(|name| name.strip_suffix(']')) else {
            return Vec::new();
        };
        let written = event.source_span.text();
        let expected = written.replacen(&format!("({})", event.name), &format!("[({})]", inner), 1);
        let span = AbsoluteSourceSpan::new(event.source_span.start.offset, event.source_span.end.offset);
        ctx.make_template_diagnostic(
            span,
            format!(
                "In the two-way binding syntax the parentheses should be inside the brackets, ex. '{}'.\n        Find more at https://angular.io/guide/two-way-binding",
                expected
            ),
        )
        .into_iter()
        .collect()
    }
}

fn create(_options: &CompilerOptions) -> Option<Box<dyn TemplateCheck>> {
    Some(Box::new(InvalidBananaInBoxCheck))
}

pub const FACTORY: TemplateCheckFactory = TemplateCheckFactory {
    code: ErrorCode::InvalidBananaInBox,
    name: ExtendedTemplateDiagnosticName::InvalidBananaInBox,
    create,
};
