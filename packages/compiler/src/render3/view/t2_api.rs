//! Render3 T2 API
//!
//! The binding graph: the result of matching directives against a template and resolving
//! references, variables and binding consumers. Template type-checking consumes it and
//! never mutates it.

use crate::expression_parser::ast::AST;
use crate::render3::r3_ast::NodeId;

/// Possible values that a reference can be resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceTarget<DirectiveT> {
    /// The reference names a directive (or component) applied to `node`.
    DirectiveOnNode { directive: DirectiveT, node: NodeId },
    Element(NodeId),
    Template(NodeId),
}

/// Entity that is local to the template and defined within the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateEntity {
    Reference(NodeId),
    Variable(NodeId),
}

/// Consumer of a binding - either a directive or the element/template it sits on.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsumerOfBinding<DirectiveT> {
    Directive(DirectiveT),
    Element(NodeId),
    Template(NodeId),
}

/// A data structure which can indicate whether a given property name is present or not.
pub trait InputOutputPropertySet {
    fn has_binding_property_name(&self, property_name: &str) -> bool;
}

/// Metadata regarding a directive that's needed to match it against template elements.
pub trait DirectiveMeta {
    /// Name of the directive class (used for debugging).
    fn name(&self) -> &str;
    /// The selector for the directive or `None` if there isn't one.
    fn selector(&self) -> Option<&str>;
    /// Whether the directive is a component.
    fn is_component(&self) -> bool;
    /// Set of inputs which this directive claims.
    fn inputs(&self) -> &dyn InputOutputPropertySet;
    /// Set of outputs which this directive claims.
    fn outputs(&self) -> &dyn InputOutputPropertySet;
    /// Names under which the directive is exported, if any.
    fn export_as(&self) -> &[String];
    /// Whether the directive is a structural directive.
    fn is_structural(&self) -> bool;
}

impl<T: DirectiveMeta + ?Sized> DirectiveMeta for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }
    fn selector(&self) -> Option<&str> {
        (**self).selector()
    }
    fn is_component(&self) -> bool {
        (**self).is_component()
    }
    fn inputs(&self) -> &dyn InputOutputPropertySet {
        (**self).inputs()
    }
    fn outputs(&self) -> &dyn InputOutputPropertySet {
        (**self).outputs()
    }
    fn export_as(&self) -> &[String] {
        (**self).export_as()
    }
    fn is_structural(&self) -> bool {
        (**self).is_structural()
    }
}

/// Result of performing the binding operation against a template.
pub trait BoundTarget<DirectiveT: DirectiveMeta> {
    /// For a given element or template, get the set of directives which matched it.
    fn get_directives_of_node(&self, node: NodeId) -> Option<&[DirectiveT]>;

    /// For a given `Reference`, get the reference's target.
    fn get_reference_target(&self, reference: NodeId) -> Option<&ReferenceTarget<DirectiveT>>;

    /// For a given bound attribute or event, get the entity to which the binding is made.
    fn get_consumer_of_binding(&self, binding: NodeId) -> Option<&ConsumerOfBinding<DirectiveT>>;

    /// If the given `AST` expression refers to a `Reference` or `Variable`, return that.
    fn get_expression_target(&self, expr: &AST) -> Option<TemplateEntity>;

    /// Get the template which declared a symbol, or `None` for the root template.
    fn get_definition_node_of_symbol(&self, symbol: TemplateEntity) -> Option<NodeId>;

    /// Get the nesting level of a template, `0` being the root.
    fn get_nesting_level(&self, template: Option<NodeId>) -> usize;

    /// Get a list of all the directives used by the target.
    fn get_used_directives(&self) -> Vec<DirectiveT>;

    /// Get a list of all the pipes used by the target.
    fn get_used_pipes(&self) -> Vec<String>;
}
