// Marker Comments
//
// Type check blocks carry their template locations as trailing `/*...*/` comments. They
// are written when a node is synthesized and read back from the printed text when the
// host type checker reports a diagnostic there.

use std::fmt;

use angular_compiler::expression_parser::ast::AbsoluteSourceSpan;
use once_cell::sync::Lazy;
use regex::Regex;

use super::ts_ast::{Expr, Stmt};
use crate::ngtsc::typecheck::api::TemplateId;

static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*/\*(.*?)\*/").unwrap());
static SPAN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+),(\d+)$").unwrap());

const IGNORE_FOR_DIAGNOSTICS: &str = "D:ignore";

/// Tags that let tooling find particular synthesized nodes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionIdentifier {
    /// The local holding a directive instance.
    DirectiveInstance,
    /// `this.;` statement used for completions of the component context.
    ComponentCompletion,
    /// The `$event` parameter of an event handler.
    EventParameter,
    /// A read of a template variable.
    VariableAsExpression,
}

impl ExpressionIdentifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpressionIdentifier::DirectiveInstance => "DIR",
            ExpressionIdentifier::ComponentCompletion => "COMPCOMP",
            ExpressionIdentifier::EventParameter => "EP",
            ExpressionIdentifier::VariableAsExpression => "VAE",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "DIR" => Some(ExpressionIdentifier::DirectiveInstance),
            "COMPCOMP" => Some(ExpressionIdentifier::ComponentCompletion),
            "EP" => Some(ExpressionIdentifier::EventParameter),
            "VAE" => Some(ExpressionIdentifier::VariableAsExpression),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comment {
    /// Template location of the node.
    Span(AbsoluteSourceSpan),
    Tag(ExpressionIdentifier),
    /// Diagnostics on the node are never reported.
    IgnoreForDiagnostics,
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comment::Span(span) => write!(f, "/*{},{}*/", span.start, span.end),
            Comment::Tag(id) => write!(f, "/*T:{}*/", id.as_str()),
            Comment::IgnoreForDiagnostics => write!(f, "/*{}*/", IGNORE_FOR_DIAGNOSTICS),
        }
    }
}

pub fn add_parse_span_info(expr: Expr, span: AbsoluteSourceSpan) -> Expr {
    expr.with_comment(Comment::Span(span))
}

pub fn add_expression_identifier(expr: Expr, id: ExpressionIdentifier) -> Expr {
    expr.with_comment(Comment::Tag(id))
}

pub fn mark_ignore_diagnostics(expr: Expr) -> Expr {
    expr.with_comment(Comment::IgnoreForDiagnostics)
}

/// Bodies of the consecutive comments in `text[from..to]`.
fn comments_between(text: &str, from: usize, to: usize) -> Vec<&str> {
    let Some(mut rest) = text.get(from..to.min(text.len())) else {
        return Vec::new();
    };
    let mut bodies = Vec::new();
    while let Some(caps) = COMMENT_RE.captures(rest) {
        let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        bodies.push(body.as_str());
        rest = &rest[whole.end()..];
    }
    bodies
}

/// The first span comment in `text[from..to]`.
pub fn read_span_comment(text: &str, from: usize, to: usize) -> Option<AbsoluteSourceSpan> {
    comments_between(text, from, to).into_iter().find_map(|body| {
        let caps = SPAN_RE.captures(body)?;
        let start = caps.get(1)?.as_str().parse().ok()?;
        let end = caps.get(2)?.as_str().parse().ok()?;
        Some(AbsoluteSourceSpan::new(start, end))
    })
}

pub fn has_expression_identifier(text: &str, from: usize, to: usize, id: ExpressionIdentifier) -> bool {
    comments_between(text, from, to)
        .into_iter()
        .any(|body| body.strip_prefix("T:").and_then(ExpressionIdentifier::from_tag) == Some(id))
}

pub fn has_ignore_for_diagnostics_marker(text: &str, from: usize, to: usize) -> bool {
    comments_between(text, from, to)
        .into_iter()
        .any(|body| body == IGNORE_FOR_DIAGNOSTICS)
}

/// Reads the `/*tcbN*/` comment that opens a type check block at `at`.
pub fn read_template_id(text: &str, at: usize) -> Option<TemplateId> {
    comments_between(text, at, text.len())
        .first()
        .and_then(|body| TemplateId::parse(body))
}

/// Criteria for locating synthesized expressions by their markers.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub with_span: Option<AbsoluteSourceSpan>,
    pub with_expression_identifier: Option<ExpressionIdentifier>,
    pub filter: Option<fn(&Expr) -> bool>,
}

impl FindOptions {
    fn matches(&self, expr: &Expr) -> bool {
        if let Some(span) = self.with_span {
            if !expr.comments.contains(&Comment::Span(span)) {
                return false;
            }
        }
        if let Some(id) = self.with_expression_identifier {
            if !expr.comments.contains(&Comment::Tag(id)) {
                return false;
            }
        }
        self.filter.map_or(true, |filter| filter(expr))
    }
}

pub fn find_first_matching_node<'a>(stmts: &'a [Stmt], opts: &FindOptions) -> Option<&'a Expr> {
    find_all_matching_nodes(stmts, opts).into_iter().next()
}

pub fn find_all_matching_nodes<'a>(stmts: &'a [Stmt], opts: &FindOptions) -> Vec<&'a Expr> {
    let mut found = Vec::new();
    for stmt in stmts {
        stmt.walk(&mut |expr| {
            if opts.matches(expr) {
                found.push(expr);
            }
        });
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ngtsc::typecheck::src::ts_ast::ExprKind;

    fn marked(name: &str, start: usize, end: usize) -> Expr {
        add_parse_span_info(Expr::ident(name), AbsoluteSourceSpan::new(start, end))
    }

    #[test]
    fn test_markers_are_read_back_from_text() {
        let text = "_t1 /*3,7*/ /*T:DIR*/;";
        assert_eq!(read_span_comment(text, 3, text.len()), Some(AbsoluteSourceSpan::new(3, 7)));
        assert!(has_expression_identifier(text, 3, text.len(), ExpressionIdentifier::DirectiveInstance));
        assert!(!has_expression_identifier(text, 3, text.len(), ExpressionIdentifier::EventParameter));
        assert!(!has_ignore_for_diagnostics_marker(text, 3, text.len()));
        // Comments after other code do not belong to the node.
        assert_eq!(read_span_comment(text, 0, text.len()), None);
    }

    #[test]
    fn test_find_nodes_by_span_and_tag() {
        let dir = add_expression_identifier(marked("_t1", 0, 4), ExpressionIdentifier::DirectiveInstance);
        let stmts = vec![
            Stmt::var(dir.clone(), Expr::null_as_any()),
            Stmt::If {
                condition: marked("_t2", 5, 9),
                then: vec![Stmt::Expr(marked("_t3", 5, 9))],
            },
        ];

        let by_span = FindOptions {
            with_span: Some(AbsoluteSourceSpan::new(5, 9)),
            ..FindOptions::default()
        };
        let found = find_all_matching_nodes(&stmts, &by_span);
        assert_eq!(found.len(), 2);
        assert_eq!(find_first_matching_node(&stmts, &by_span), Some(&marked("_t2", 5, 9)));

        let by_tag = FindOptions {
            with_expression_identifier: Some(ExpressionIdentifier::DirectiveInstance),
            ..FindOptions::default()
        };
        assert_eq!(find_first_matching_node(&stmts, &by_tag), Some(&dir));

        let none = FindOptions {
            with_span: Some(AbsoluteSourceSpan::new(5, 9)),
            filter: Some(|e: &Expr| matches!(e.kind, ExprKind::This)),
            ..FindOptions::default()
        };
        assert!(find_first_matching_node(&stmts, &none).is_none());
    }
}
