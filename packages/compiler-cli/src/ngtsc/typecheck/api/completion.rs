// Completion API

use indexmap::IndexMap;

use super::symbols::TcbLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    Reference,
    Variable,
}

/// A template entity in scope at a completion point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateEntityCompletion {
    pub kind: CompletionKind,
    /// Where the entity is declared in the template.
    pub span: (usize, usize),
}

/// Everything that can be completed at an expression with no explicit receiver.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalCompletion {
    /// Where members of the component class can be completed.
    pub component_context: TcbLocation,
    /// References and variables in scope, by name; inner scopes win.
    pub template_context: IndexMap<String, TemplateEntityCompletion>,
    /// The expression being completed, when it made it into the block.
    pub node_context: Option<TcbLocation>,
}
