// Out-of-band Diagnostics
//
// Template problems that cannot be expressed as type errors in a type check block and
// are reported directly instead.

use std::collections::HashSet;

use angular_compiler::expression_parser::ast::AbsoluteSourceSpan;
use angular_compiler::parse_util::ParseSourceSpan;
use angular_compiler::render3::r3_ast::{BoundAttribute, BoundEvent, Reference, Variable};
use ts::DiagnosticCategory;

use super::diagnostics::{make_related_information, make_template_diagnostic};
use crate::ngtsc::diagnostics::{ng_error_code, ErrorCode};
use crate::ngtsc::reflection::ClassRef;
use crate::ngtsc::typecheck::api::{TemplateDiagnostic, TemplateId, TemplateRelatedInformation};

/// The target an output half of a two-way binding went to.
#[derive(Debug, Clone, Copy)]
pub enum OutputConsumer<'a> {
    Directive(&'a ClassRef),
    Element {
        tag_name: &'a str,
        start_source_span: &'a ParseSourceSpan,
    },
}

/// Collects out-of-band diagnostics while blocks are generated.
pub trait OutOfBandDiagnosticRecorder {
    fn diagnostics(&self) -> &[TemplateDiagnostic];

    /// `#ref="name"` where no directive on the node is exported as `name`.
    fn missing_reference_target(&mut self, template_id: &TemplateId, reference: &Reference);

    /// A pipe used in the template is not available to the component. Reported once per
    /// pipe usage.
    fn missing_pipe(&mut self, template_id: &TemplateId, name: &str, name_span: &ParseSourceSpan);

    fn illegal_assignment_to_template_var(
        &mut self,
        template_id: &TemplateId,
        assignment_span: &ParseSourceSpan,
        target: &Variable,
    );

    fn duplicate_template_var(&mut self, template_id: &TemplateId, variable: &Variable, first_decl: &Variable);

    fn requires_inline_tcb(&mut self, template_id: &TemplateId, component: &ClassRef);

    fn requires_inline_type_constructors(
        &mut self,
        template_id: &TemplateId,
        component: &ClassRef,
        directives: &[ClassRef],
    );

    fn split_two_way_binding(
        &mut self,
        template_id: &TemplateId,
        input: &BoundAttribute,
        output: &BoundEvent,
        input_consumer: &ClassRef,
        output_consumer: OutputConsumer<'_>,
    );

    fn missing_required_inputs(
        &mut self,
        template_id: &TemplateId,
        element_start_span: &ParseSourceSpan,
        directive_name: &str,
        is_component: bool,
        input_names: &[String],
    );
}

#[derive(Debug, Clone, Default)]
pub struct OutOfBandDiagnosticRecorderImpl {
    diagnostics: Vec<TemplateDiagnostic>,
    recorded_pipes: HashSet<(TemplateId, AbsoluteSourceSpan)>,
}

impl OutOfBandDiagnosticRecorderImpl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_diagnostics(self) -> Vec<TemplateDiagnostic> {
        self.diagnostics
    }

    fn push(
        &mut self,
        template_id: &TemplateId,
        span: &ParseSourceSpan,
        code: ErrorCode,
        message: String,
        related: Vec<TemplateRelatedInformation>,
    ) {
        tracing::trace!(template = %template_id, code = ?code, "out-of-band diagnostic");
        self.diagnostics.push(make_template_diagnostic(
            template_id,
            span,
            DiagnosticCategory::Error,
            ng_error_code(code),
            message,
            related,
        ));
    }
}

/// A diagnostic located on a class name in its TypeScript file.
fn class_diagnostic(
    template_id: &TemplateId,
    class: &ClassRef,
    code: ErrorCode,
    message: String,
    related_information: Vec<TemplateRelatedInformation>,
) -> TemplateDiagnostic {
    TemplateDiagnostic {
        template_id: template_id.clone(),
        file: class.file.as_str().to_string(),
        start: class.name_start,
        length: class.name.len(),
        category: DiagnosticCategory::Error,
        code: ng_error_code(code),
        message,
        related_information,
    }
}

fn class_related_information(class: &ClassRef, text: impl Into<String>) -> TemplateRelatedInformation {
    TemplateRelatedInformation {
        file: class.file.as_str().to_string(),
        start: class.name_start,
        end: class.name_start + class.name.len(),
        text: text.into(),
    }
}

impl OutOfBandDiagnosticRecorder for OutOfBandDiagnosticRecorderImpl {
    fn diagnostics(&self) -> &[TemplateDiagnostic] {
        &self.diagnostics
    }

    fn missing_reference_target(&mut self, template_id: &TemplateId, reference: &Reference) {
        let message = format!("No directive found with exportAs '{}'.", reference.value);
        let span = reference.value_span.as_ref().unwrap_or(&reference.source_span);
        self.push(template_id, span, ErrorCode::MissingReferenceTarget, message, Vec::new());
    }

    fn missing_pipe(&mut self, template_id: &TemplateId, name: &str, name_span: &ParseSourceSpan) {
        let key = (
            template_id.clone(),
            AbsoluteSourceSpan::new(name_span.start.offset, name_span.end.offset),
        );
        if !self.recorded_pipes.insert(key) {
            return;
        }
        let message = format!("No pipe found with name '{}'.", name);
        self.push(template_id, name_span, ErrorCode::MissingPipe, message, Vec::new());
    }

    fn illegal_assignment_to_template_var(
        &mut self,
        template_id: &TemplateId,
        assignment_span: &ParseSourceSpan,
        target: &Variable,
    ) {
        let message = format!(
            "Cannot use variable '{}' as an assignment target. Only properties can be assigned to.",
            target.name
        );
        let declared = target.value_span.as_ref().unwrap_or(&target.source_span);
        let related = vec![make_related_information(
            declared,
            format!("The variable {} is declared here.", target.name),
        )];
        self.push(template_id, assignment_span, ErrorCode::WriteToReadOnlyVariable, message, related);
    }

    fn duplicate_template_var(&mut self, template_id: &TemplateId, variable: &Variable, first_decl: &Variable) {
        let message = format!(
            "Cannot redeclare variable '{}' as it was previously declared elsewhere for the same template.",
            variable.name
        );
        let related = vec![make_related_information(
            &first_decl.source_span,
            format!("The variable '{}' was first declared here.", first_decl.name),
        )];
        self.push(
            template_id,
            &variable.source_span,
            ErrorCode::DuplicateVariableDeclaration,
            message,
            related,
        );
    }

    fn requires_inline_tcb(&mut self, template_id: &TemplateId, component: &ClassRef) {
        let message = "This component requires inline template type-checking, which is not supported by the current environment.".to_string();
        self.diagnostics.push(class_diagnostic(
            template_id,
            component,
            ErrorCode::InlineTcbRequired,
            message,
            Vec::new(),
        ));
    }

    fn requires_inline_type_constructors(
        &mut self,
        template_id: &TemplateId,
        component: &ClassRef,
        directives: &[ClassRef],
    ) {
        let message = if directives.len() > 1 {
            "This component uses directives which require inline type constructors, which are not supported by the current environment."
        } else {
            "This component uses a directive which requires an inline type constructor, which is not supported by the current environment."
        };
        let related = directives
            .iter()
            .map(|dir| class_related_information(dir, "Requires an inline type constructor."))
            .collect();
        self.diagnostics.push(class_diagnostic(
            template_id,
            component,
            ErrorCode::InlineTypeCtorRequired,
            message.to_string(),
            related,
        ));
    }

    fn split_two_way_binding(
        &mut self,
        template_id: &TemplateId,
        input: &BoundAttribute,
        output: &BoundEvent,
        input_consumer: &ClassRef,
        output_consumer: OutputConsumer<'_>,
    ) {
        let message = format!(
            "The property and event halves of the two-way binding '{}' are not bound to the same target.\n            Find more at https://angular.dev/guide/templates/two-way-binding#how-two-way-binding-works",
            input.name
        );
        let mut related = vec![class_related_information(
            input_consumer,
            format!(
                "The property half of the binding is to the '{}' component.",
                input_consumer.name
            ),
        )];
        match output_consumer {
            OutputConsumer::Directive(dir) => related.push(class_related_information(
                dir,
                format!("The event half of the binding is to the '{}' directive.", dir.name),
            )),
            OutputConsumer::Element {
                tag_name,
                start_source_span,
            } => related.push(make_related_information(
                start_source_span,
                format!(
                    "The event half of the binding is to a native event called '{}' on the <{}> DOM element.\n \n Are you missing an output declaration called '{}'?",
                    input.name, tag_name, output.name
                ),
            )),
        }
        self.push(
            template_id,
            &input.key_span,
            ErrorCode::SplitTwoWayBinding,
            message,
            related,
        );
    }

    fn missing_required_inputs(
        &mut self,
        template_id: &TemplateId,
        element_start_span: &ParseSourceSpan,
        directive_name: &str,
        is_component: bool,
        input_names: &[String],
    ) {
        let plural = if input_names.len() == 1 { "" } else { "s" };
        let names = input_names
            .iter()
            .map(|name| format!("'{}'", name))
            .collect::<Vec<_>>()
            .join(", ");
        let kind = if is_component { "component" } else { "directive" };
        let message = format!(
            "Required input{} {} from {} {} must be specified.",
            plural, names, kind, directive_name
        );
        self.push(
            template_id,
            element_start_span,
            ErrorCode::MissingRequiredInputs,
            message,
            Vec::new(),
        );
    }
}
