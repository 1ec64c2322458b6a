//! Render3 AST
//!
//! Template nodes after parsing. Nodes the binder can be asked about carry a `NodeId`,
//! a caller-assigned index that is unique within one template. Side tables (binding
//! results, type-check scopes) key on that id instead of on node identity.

use crate::expression_parser::ast::{BindingType, ParsedEventType, AST};
use crate::parse_util::ParseSourceSpan;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Base trait for all R3 AST nodes
pub trait Node {
    fn source_span(&self) -> &ParseSourceSpan;
}

/// Text node
#[derive(Debug, Clone)]
pub struct Text {
    pub value: String,
    pub source_span: ParseSourceSpan,
}

/// Bound text node (interpolation)
#[derive(Debug, Clone)]
pub struct BoundText {
    pub id: NodeId,
    pub value: AST,
    pub source_span: ParseSourceSpan,
}

/// Text attribute in the template
#[derive(Debug, Clone)]
pub struct TextAttribute {
    pub name: String,
    pub value: String,
    pub source_span: ParseSourceSpan,
    pub key_span: Option<ParseSourceSpan>,
    pub value_span: Option<ParseSourceSpan>,
}

/// Bound attribute node (`[name]="value"`)
#[derive(Debug, Clone)]
pub struct BoundAttribute {
    pub id: NodeId,
    pub name: String,
    pub type_: BindingType,
    pub value: AST,
    pub unit: Option<String>,
    pub source_span: ParseSourceSpan,
    pub key_span: ParseSourceSpan,
    pub value_span: Option<ParseSourceSpan>,
}

/// Bound event node (`(name)="handler"`)
#[derive(Debug, Clone)]
pub struct BoundEvent {
    pub id: NodeId,
    pub name: String,
    pub type_: ParsedEventType,
    pub handler: AST,
    pub target: Option<String>,
    pub phase: Option<String>,
    pub source_span: ParseSourceSpan,
    pub handler_span: ParseSourceSpan,
    pub key_span: ParseSourceSpan,
}

/// Element node
#[derive(Debug, Clone)]
pub struct Element {
    pub id: NodeId,
    pub name: String,
    pub attributes: Vec<TextAttribute>,
    pub inputs: Vec<BoundAttribute>,
    pub outputs: Vec<BoundEvent>,
    pub children: Vec<R3Node>,
    pub references: Vec<Reference>,
    pub source_span: ParseSourceSpan,
    pub start_source_span: ParseSourceSpan,
    pub end_source_span: Option<ParseSourceSpan>,
}

/// Template attribute (either bound or text), from the micro-syntax of `*dir="..."`
#[derive(Debug, Clone)]
pub enum TemplateAttr {
    Bound(BoundAttribute),
    Text(TextAttribute),
}

/// Structural template (`<ng-template>` or the desugared form of `*dir`)
#[derive(Debug, Clone)]
pub struct Template {
    pub id: NodeId,
    pub tag_name: Option<String>,
    pub attributes: Vec<TextAttribute>,
    pub inputs: Vec<BoundAttribute>,
    pub outputs: Vec<BoundEvent>,
    pub template_attrs: Vec<TemplateAttr>,
    pub children: Vec<R3Node>,
    pub references: Vec<Reference>,
    pub variables: Vec<Variable>,
    pub source_span: ParseSourceSpan,
    pub start_source_span: ParseSourceSpan,
    pub end_source_span: Option<ParseSourceSpan>,
}

/// Template variable (`let-item` / `let item of items`)
#[derive(Debug, Clone)]
pub struct Variable {
    pub id: NodeId,
    pub name: String,
    pub value: String,
    pub source_span: ParseSourceSpan,
    pub key_span: ParseSourceSpan,
    pub value_span: Option<ParseSourceSpan>,
}

/// Local reference (`#name` or `#name="exportAs"`)
#[derive(Debug, Clone)]
pub struct Reference {
    pub id: NodeId,
    pub name: String,
    pub value: String,
    pub source_span: ParseSourceSpan,
    pub key_span: ParseSourceSpan,
    pub value_span: Option<ParseSourceSpan>,
}

/// ICU message node; only its bound variables are type-checked.
#[derive(Debug, Clone)]
pub struct Icu {
    pub vars: IndexMap<String, BoundText>,
    pub placeholders: IndexMap<String, IcuPlaceholder>,
    pub source_span: ParseSourceSpan,
}

#[derive(Debug, Clone)]
pub enum IcuPlaceholder {
    Text(Text),
    BoundText(BoundText),
}

#[derive(Debug, Clone)]
pub enum R3Node {
    Text(Text),
    BoundText(BoundText),
    Element(Element),
    Template(Template),
    Icu(Icu),
}

macro_rules! impl_node {
    ($($ty:ty),*) => {
        $(impl Node for $ty {
            fn source_span(&self) -> &ParseSourceSpan {
                &self.source_span
            }
        })*
    };
}

impl_node!(
    Text,
    BoundText,
    TextAttribute,
    BoundAttribute,
    BoundEvent,
    Element,
    Template,
    Variable,
    Reference,
    Icu
);

impl Node for R3Node {
    fn source_span(&self) -> &ParseSourceSpan {
        match self {
            R3Node::Text(n) => &n.source_span,
            R3Node::BoundText(n) => &n.source_span,
            R3Node::Element(n) => &n.source_span,
            R3Node::Template(n) => &n.source_span,
            R3Node::Icu(n) => &n.source_span,
        }
    }
}

/// A node that directives can be applied to.
#[derive(Debug, Clone, Copy)]
pub enum DirectiveHost<'a> {
    Element(&'a Element),
    Template(&'a Template),
}

impl<'a> DirectiveHost<'a> {
    pub fn id(&self) -> NodeId {
        match self {
            DirectiveHost::Element(el) => el.id,
            DirectiveHost::Template(tmpl) => tmpl.id,
        }
    }

    pub fn inputs(&self) -> &'a [BoundAttribute] {
        match self {
            DirectiveHost::Element(el) => &el.inputs,
            DirectiveHost::Template(tmpl) => &tmpl.inputs,
        }
    }

    pub fn outputs(&self) -> &'a [BoundEvent] {
        match self {
            DirectiveHost::Element(el) => &el.outputs,
            DirectiveHost::Template(tmpl) => &tmpl.outputs,
        }
    }

    pub fn attributes(&self) -> &'a [TextAttribute] {
        match self {
            DirectiveHost::Element(el) => &el.attributes,
            DirectiveHost::Template(tmpl) => &tmpl.attributes,
        }
    }

    pub fn references(&self) -> &'a [Reference] {
        match self {
            DirectiveHost::Element(el) => &el.references,
            DirectiveHost::Template(tmpl) => &tmpl.references,
        }
    }

    /// Bound template attributes of a structural template. Empty for elements.
    pub fn bound_template_attrs(&self) -> impl Iterator<Item = &'a BoundAttribute> + 'a {
        let attrs: &'a [TemplateAttr] = match self {
            DirectiveHost::Element(_) => &[],
            DirectiveHost::Template(tmpl) => &tmpl.template_attrs,
        };
        attrs.iter().filter_map(|attr| match attr {
            TemplateAttr::Bound(bound) => Some(bound),
            TemplateAttr::Text(_) => None,
        })
    }

    pub fn text_template_attrs(&self) -> impl Iterator<Item = &'a TextAttribute> + 'a {
        let attrs: &'a [TemplateAttr] = match self {
            DirectiveHost::Element(_) => &[],
            DirectiveHost::Template(tmpl) => &tmpl.template_attrs,
        };
        attrs.iter().filter_map(|attr| match attr {
            TemplateAttr::Text(text) => Some(text),
            TemplateAttr::Bound(_) => None,
        })
    }

    pub fn source_span(&self) -> &'a ParseSourceSpan {
        match self {
            DirectiveHost::Element(el) => &el.source_span,
            DirectiveHost::Template(tmpl) => &tmpl.source_span,
        }
    }

    pub fn start_source_span(&self) -> &'a ParseSourceSpan {
        match self {
            DirectiveHost::Element(el) => &el.start_source_span,
            DirectiveHost::Template(tmpl) => &tmpl.start_source_span,
        }
    }

    /// Tag name used for selector matching. Templates always match as `ng-template`,
    /// even when desugared from `*dir` on another tag.
    pub fn tag_name(&self) -> &'a str {
        match self {
            DirectiveHost::Element(el) => &el.name,
            DirectiveHost::Template(_) => "ng-template",
        }
    }
}
