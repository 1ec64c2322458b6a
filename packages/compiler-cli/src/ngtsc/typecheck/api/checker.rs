// Template Type Checker API
//
// Read side of a completed type-checking pass.

use angular_compiler::expression_parser::ast::{AbsoluteSourceSpan, AST};
use angular_compiler::parse_util::ParseSourceSpan;
use angular_compiler::render3::r3_ast::{NodeId, R3Node};

use super::api::{TemplateDiagnostic, TemplateId};
use super::completion::GlobalCompletion;
use super::symbols::{TcbLocation, TemplateNode, TemplateSymbol};
use crate::ngtsc::file_system::AbsoluteFsPath;
use crate::ngtsc::reflection::ClassRef;

pub trait TemplateTypeChecker {
    /// Diagnostics of every component template declared in `file`.
    fn get_diagnostics_for_file(&self, file: &AbsoluteFsPath) -> Vec<TemplateDiagnostic>;

    /// Diagnostics of one component's template.
    fn get_diagnostics_for_component(&self, component: &ClassRef) -> Vec<TemplateDiagnostic>;

    fn get_all_diagnostics(&self) -> Vec<TemplateDiagnostic>;

    /// The registered template nodes of `component`.
    fn get_template(&self, component: &ClassRef) -> Option<&[R3Node]>;

    /// What `node`, a node of `component`'s template, turned into in the last pass.
    /// Types are filled in when the host answers type queries.
    fn get_symbol_of_node(&self, node: TemplateNode<'_>, component: &ClassRef) -> Option<TemplateSymbol>;

    /// Completions for `node`, an expression without receiver inside the template
    /// `context` (`None` for the root). Requires `enable_template_type_checker`.
    fn get_global_completions(
        &self,
        context: Option<NodeId>,
        component: &ClassRef,
        node: &AST,
    ) -> Option<GlobalCompletion>;

    /// Where members of the receiver of a property read or write complete.
    fn get_expression_completion_location(&self, expr: &AST, component: &ClassRef) -> Option<TcbLocation>;

    /// The template location a position in synthesized code maps back to.
    fn get_template_mapping_at_tcb_location(&self, location: &TcbLocation) -> Option<(TemplateId, ParseSourceSpan)>;

    /// Resolves a span of `component`'s template to a full parse span.
    fn get_template_span(&self, component: &ClassRef, span: AbsoluteSourceSpan) -> Option<(TemplateId, ParseSourceSpan)>;
}
