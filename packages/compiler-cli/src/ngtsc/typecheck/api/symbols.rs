// Template Symbols
//
// What the checker can tell about a template node once its block has been checked: the
// synthesized code the node turned into, where that code sits and the host's type of it.

use angular_compiler::expression_parser::ast::AST;
use angular_compiler::render3::r3_ast::{
    BoundAttribute, BoundEvent, BoundText, Element, NodeId, Reference, Template, TextAttribute, Variable,
};
use angular_compiler::render3::view::t2_api::ReferenceTarget;
use ts::HostType;

use super::api::DirectiveRef;
use crate::ngtsc::file_system::AbsoluteFsPath;

/// A position inside a synthesized file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcbLocation {
    pub tcb_path: AbsoluteFsPath,
    /// `false` when the block was spliced into the component's own file.
    pub is_shim_file: bool,
    pub position_in_file: usize,
}

/// A template node a query is about.
#[derive(Debug, Clone, Copy)]
pub enum TemplateNode<'a> {
    Element(&'a Element),
    Template(&'a Template),
    BoundAttribute(&'a BoundAttribute),
    TextAttribute(&'a TextAttribute),
    BoundEvent(&'a BoundEvent),
    BoundText(&'a BoundText),
    Reference(&'a Reference),
    Variable(&'a Variable),
    Expression(&'a AST),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveSymbol {
    pub directive: DirectiveRef,
    pub ty: Option<HostType>,
    /// The local holding the directive instance.
    pub tcb_location: TcbLocation,
}

/// What a binding writes to or listens on.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingTarget {
    Directive(DirectiveSymbol),
    Element(NodeId),
    Template(NodeId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BindingSymbol {
    pub target: BindingTarget,
    pub ty: Option<HostType>,
    pub tcb_location: TcbLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateSymbol {
    /// Any template expression that is not a read of a reference or variable.
    Expression {
        ty: Option<HostType>,
        tcb_location: TcbLocation,
    },
    Element {
        node: NodeId,
        ty: Option<HostType>,
        tcb_location: TcbLocation,
        directives: Vec<DirectiveSymbol>,
    },
    Template {
        node: NodeId,
        directives: Vec<DirectiveSymbol>,
    },
    Reference {
        name: String,
        target: ReferenceTarget<DirectiveRef>,
        ty: Option<HostType>,
        /// Where the referenced element, template or directive is declared.
        target_location: TcbLocation,
        reference_var_location: TcbLocation,
    },
    Variable {
        name: String,
        ty: Option<HostType>,
        initializer_location: TcbLocation,
        local_var_location: TcbLocation,
    },
    /// Bindings of one attribute to directive inputs.
    Input { bindings: Vec<BindingSymbol> },
    /// Subscriptions of one event to outputs or DOM events.
    Output { bindings: Vec<BindingSymbol> },
    /// A property binding no directive claims.
    DomBinding { host: Box<TemplateSymbol> },
    Pipe {
        name: String,
        ty: Option<HostType>,
        /// The pipe's `transform` access.
        tcb_location: TcbLocation,
    },
}

impl TemplateSymbol {
    /// The host's type of the node, for the kinds that have a single one.
    pub fn ty(&self) -> Option<&HostType> {
        match self {
            TemplateSymbol::Expression { ty, .. }
            | TemplateSymbol::Element { ty, .. }
            | TemplateSymbol::Reference { ty, .. }
            | TemplateSymbol::Variable { ty, .. }
            | TemplateSymbol::Pipe { ty, .. } => ty.as_ref(),
            _ => None,
        }
    }
}
