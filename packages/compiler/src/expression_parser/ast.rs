/**
 * Angular Expression AST
 *
 * The expression nodes bindings carry after parsing. Every node records the absolute
 * span it covers in the template source; the binding graph keys expression targets by
 * that span.
 */

use serde::{Deserialize, Serialize};

/// Span relative to the start of the expression text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseSpan {
    pub start: usize,
    pub end: usize,
}

impl ParseSpan {
    pub fn new(start: usize, end: usize) -> Self {
        ParseSpan { start, end }
    }

    pub fn to_absolute(&self, absolute_offset: usize) -> AbsoluteSourceSpan {
        AbsoluteSourceSpan::new(absolute_offset + self.start, absolute_offset + self.end)
    }
}

/// Absolute source span for mapping back to source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AbsoluteSourceSpan {
    pub start: usize,
    pub end: usize,
}

impl AbsoluteSourceSpan {
    pub fn new(start: usize, end: usize) -> Self {
        AbsoluteSourceSpan { start, end }
    }

    pub fn contains(&self, other: &AbsoluteSourceSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Main AST enum containing all node types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AST {
    EmptyExpr(EmptyExpr),
    ImplicitReceiver(ImplicitReceiver),
    ThisReceiver(ThisReceiver),
    Chain(Chain),
    Conditional(Conditional),
    PropertyRead(PropertyRead),
    SafePropertyRead(SafePropertyRead),
    KeyedRead(KeyedRead),
    SafeKeyedRead(SafeKeyedRead),
    BindingPipe(BindingPipe),
    LiteralPrimitive(LiteralPrimitive),
    LiteralArray(LiteralArray),
    LiteralMap(LiteralMap),
    Interpolation(Interpolation),
    Binary(Binary),
    PrefixNot(PrefixNot),
    Unary(Unary),
    TypeofExpression(TypeofExpression),
    NonNullAssert(NonNullAssert),
    Call(Call),
    SafeCall(SafeCall),
    PropertyWrite(PropertyWrite),
    KeyedWrite(KeyedWrite),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmptyExpr {
    pub source_span: AbsoluteSourceSpan,
}

/// Implicit receiver (the component instance, or a template local)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplicitReceiver {
    pub source_span: AbsoluteSourceSpan,
}

/// Explicit `this`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThisReceiver {
    pub source_span: AbsoluteSourceSpan,
}

/// Chain of expressions (e.g., `a; b; c`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    pub source_span: AbsoluteSourceSpan,
    pub expressions: Vec<AST>,
}

/// Ternary conditional (e.g., `condition ? a : b`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditional {
    pub source_span: AbsoluteSourceSpan,
    pub condition: Box<AST>,
    pub true_exp: Box<AST>,
    pub false_exp: Box<AST>,
}

/// Property read (e.g., `obj.property`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRead {
    pub source_span: AbsoluteSourceSpan,
    pub name_span: AbsoluteSourceSpan,
    pub receiver: Box<AST>,
    pub name: String,
}

/// Safe property read (e.g., `obj?.property`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafePropertyRead {
    pub source_span: AbsoluteSourceSpan,
    pub name_span: AbsoluteSourceSpan,
    pub receiver: Box<AST>,
    pub name: String,
}

/// Property write (e.g., `obj.property = value`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyWrite {
    pub source_span: AbsoluteSourceSpan,
    pub name_span: AbsoluteSourceSpan,
    pub receiver: Box<AST>,
    pub name: String,
    pub value: Box<AST>,
}

/// Keyed read (e.g., `obj[key]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedRead {
    pub source_span: AbsoluteSourceSpan,
    pub receiver: Box<AST>,
    pub key: Box<AST>,
}

/// Safe keyed read (e.g., `obj?.[key]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafeKeyedRead {
    pub source_span: AbsoluteSourceSpan,
    pub receiver: Box<AST>,
    pub key: Box<AST>,
}

/// Keyed write (e.g., `obj[key] = value`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedWrite {
    pub source_span: AbsoluteSourceSpan,
    pub receiver: Box<AST>,
    pub key: Box<AST>,
    pub value: Box<AST>,
}

/// Pipe binding (e.g., `value | pipeName:arg1:arg2`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingPipe {
    pub source_span: AbsoluteSourceSpan,
    pub name_span: AbsoluteSourceSpan,
    pub exp: Box<AST>,
    pub name: String,
    pub args: Vec<AST>,
}

/// Literal primitive (string, number, boolean, null, undefined)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralPrimitive {
    pub source_span: AbsoluteSourceSpan,
    pub value: LiteralValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "literalType", content = "value")]
pub enum LiteralValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
    Undefined,
}

/// Array literal (e.g., `[1, 2, 3]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralArray {
    pub source_span: AbsoluteSourceSpan,
    pub expressions: Vec<AST>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralMapKey {
    pub key: String,
    pub quoted: bool,
}

/// Object literal (e.g., `{a: 1, b: 2}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralMap {
    pub source_span: AbsoluteSourceSpan,
    pub keys: Vec<LiteralMapKey>,
    pub values: Vec<AST>,
}

/// Interpolation (`a {{b}} c`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpolation {
    pub source_span: AbsoluteSourceSpan,
    pub strings: Vec<String>,
    pub expressions: Vec<AST>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binary {
    pub source_span: AbsoluteSourceSpan,
    pub operation: String,
    pub left: Box<AST>,
    pub right: Box<AST>,
}

/// Prefix not operator (e.g., `!expr`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefixNot {
    pub source_span: AbsoluteSourceSpan,
    pub expression: Box<AST>,
}

/// Unary operator (e.g., `-expr`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unary {
    pub source_span: AbsoluteSourceSpan,
    pub operator: String,
    pub expr: Box<AST>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeofExpression {
    pub source_span: AbsoluteSourceSpan,
    pub expression: Box<AST>,
}

/// Non-null assertion (e.g., `expr!`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonNullAssert {
    pub source_span: AbsoluteSourceSpan,
    pub expression: Box<AST>,
}

/// Function call (e.g., `fn(a, b)`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub source_span: AbsoluteSourceSpan,
    pub receiver: Box<AST>,
    pub args: Vec<AST>,
}

/// Safe function call (e.g., `fn?.(a, b)`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafeCall {
    pub source_span: AbsoluteSourceSpan,
    pub receiver: Box<AST>,
    pub args: Vec<AST>,
}

/// Event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParsedEventType {
    /// DOM or directive event
    Regular,
    /// Animation specific event
    Animation,
    /// Event side of a two-way binding (e.g. `[(property)]="expression"`)
    TwoWay,
}

/// Binding types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingType {
    Property,
    Attribute,
    Class,
    Style,
    Animation,
    TwoWay,
}

fn abs(start: usize, end: usize) -> AbsoluteSourceSpan {
    AbsoluteSourceSpan::new(start, end)
}

// Helper constructors. Offsets are absolute template offsets.
impl AST {
    pub fn empty(at: usize) -> AST {
        AST::EmptyExpr(EmptyExpr {
            source_span: abs(at, at),
        })
    }

    pub fn implicit_receiver(at: usize) -> AST {
        AST::ImplicitReceiver(ImplicitReceiver {
            source_span: abs(at, at),
        })
    }

    pub fn this_receiver(start: usize, end: usize) -> AST {
        AST::ThisReceiver(ThisReceiver {
            source_span: abs(start, end),
        })
    }

    /// A bare identifier such as `user`, read from the implicit receiver.
    pub fn ident(name: &str, start: usize) -> AST {
        let end = start + name.len();
        AST::PropertyRead(PropertyRead {
            source_span: abs(start, end),
            name_span: abs(start, end),
            receiver: Box::new(AST::implicit_receiver(start)),
            name: name.to_string(),
        })
    }

    /// `receiver.name`, where `name` starts at `name_start`.
    pub fn prop(receiver: AST, name: &str, name_start: usize) -> AST {
        let start = receiver.source_span().start;
        let end = name_start + name.len();
        AST::PropertyRead(PropertyRead {
            source_span: abs(start, end),
            name_span: abs(name_start, end),
            receiver: Box::new(receiver),
            name: name.to_string(),
        })
    }

    pub fn safe_prop(receiver: AST, name: &str, name_start: usize) -> AST {
        let start = receiver.source_span().start;
        let end = name_start + name.len();
        AST::SafePropertyRead(SafePropertyRead {
            source_span: abs(start, end),
            name_span: abs(name_start, end),
            receiver: Box::new(receiver),
            name: name.to_string(),
        })
    }

    /// Assignment `name = value` on the implicit receiver.
    pub fn assign(name: &str, start: usize, value: AST) -> AST {
        let end = value.source_span().end;
        AST::PropertyWrite(PropertyWrite {
            source_span: abs(start, end),
            name_span: abs(start, start + name.len()),
            receiver: Box::new(AST::implicit_receiver(start)),
            name: name.to_string(),
            value: Box::new(value),
        })
    }

    pub fn call(receiver: AST, args: Vec<AST>, end: usize) -> AST {
        let start = receiver.source_span().start;
        AST::Call(Call {
            source_span: abs(start, end),
            receiver: Box::new(receiver),
            args,
        })
    }

    pub fn pipe(exp: AST, name: &str, name_start: usize, args: Vec<AST>) -> AST {
        let start = exp.source_span().start;
        let end = args
            .last()
            .map(|a| a.source_span().end)
            .unwrap_or(name_start + name.len());
        AST::BindingPipe(BindingPipe {
            source_span: abs(start, end),
            name_span: abs(name_start, name_start + name.len()),
            exp: Box::new(exp),
            name: name.to_string(),
            args,
        })
    }

    pub fn string(value: &str, start: usize) -> AST {
        AST::LiteralPrimitive(LiteralPrimitive {
            source_span: abs(start, start + value.len() + 2),
            value: LiteralValue::String(value.to_string()),
        })
    }

    pub fn number(value: f64, start: usize, end: usize) -> AST {
        AST::LiteralPrimitive(LiteralPrimitive {
            source_span: abs(start, end),
            value: LiteralValue::Number(value),
        })
    }

    pub fn boolean(value: bool, start: usize) -> AST {
        let len = if value { 4 } else { 5 };
        AST::LiteralPrimitive(LiteralPrimitive {
            source_span: abs(start, start + len),
            value: LiteralValue::Boolean(value),
        })
    }

    pub fn binary(operation: &str, left: AST, right: AST) -> AST {
        let span = abs(left.source_span().start, right.source_span().end);
        AST::Binary(Binary {
            source_span: span,
            operation: operation.to_string(),
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn interpolation(expressions: Vec<AST>, start: usize, end: usize) -> AST {
        let strings = vec![String::new(); expressions.len() + 1];
        AST::Interpolation(Interpolation {
            source_span: abs(start, end),
            strings,
            expressions,
        })
    }

    pub fn source_span(&self) -> AbsoluteSourceSpan {
        match self {
            AST::EmptyExpr(e) => e.source_span,
            AST::ImplicitReceiver(e) => e.source_span,
            AST::ThisReceiver(e) => e.source_span,
            AST::Chain(e) => e.source_span,
            AST::Conditional(e) => e.source_span,
            AST::PropertyRead(e) => e.source_span,
            AST::SafePropertyRead(e) => e.source_span,
            AST::KeyedRead(e) => e.source_span,
            AST::SafeKeyedRead(e) => e.source_span,
            AST::BindingPipe(e) => e.source_span,
            AST::LiteralPrimitive(e) => e.source_span,
            AST::LiteralArray(e) => e.source_span,
            AST::LiteralMap(e) => e.source_span,
            AST::Interpolation(e) => e.source_span,
            AST::Binary(e) => e.source_span,
            AST::PrefixNot(e) => e.source_span,
            AST::Unary(e) => e.source_span,
            AST::TypeofExpression(e) => e.source_span,
            AST::NonNullAssert(e) => e.source_span,
            AST::Call(e) => e.source_span,
            AST::SafeCall(e) => e.source_span,
            AST::PropertyWrite(e) => e.source_span,
            AST::KeyedWrite(e) => e.source_span,
        }
    }

    /// True for receivers that stand for "the component or a template local", i.e. both
    /// the implicit receiver and an explicit `this`.
    pub fn is_implicit_receiver(&self) -> bool {
        matches!(self, AST::ImplicitReceiver(_) | AST::ThisReceiver(_))
    }

    /// Visits this node and every descendant in evaluation order.
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a AST)) {
        f(self);
        match self {
            AST::EmptyExpr(_)
            | AST::ImplicitReceiver(_)
            | AST::ThisReceiver(_)
            | AST::LiteralPrimitive(_) => {}
            AST::Chain(e) => e.expressions.iter().for_each(|x| x.walk(f)),
            AST::Conditional(e) => {
                e.condition.walk(f);
                e.true_exp.walk(f);
                e.false_exp.walk(f);
            }
            AST::PropertyRead(e) => e.receiver.walk(f),
            AST::SafePropertyRead(e) => e.receiver.walk(f),
            AST::KeyedRead(e) => {
                e.receiver.walk(f);
                e.key.walk(f);
            }
            AST::SafeKeyedRead(e) => {
                e.receiver.walk(f);
                e.key.walk(f);
            }
            AST::BindingPipe(e) => {
                e.exp.walk(f);
                e.args.iter().for_each(|x| x.walk(f));
            }
            AST::LiteralArray(e) => e.expressions.iter().for_each(|x| x.walk(f)),
            AST::LiteralMap(e) => e.values.iter().for_each(|x| x.walk(f)),
            AST::Interpolation(e) => e.expressions.iter().for_each(|x| x.walk(f)),
            AST::Binary(e) => {
                e.left.walk(f);
                e.right.walk(f);
            }
            AST::PrefixNot(e) => e.expression.walk(f),
            AST::Unary(e) => e.expr.walk(f),
            AST::TypeofExpression(e) => e.expression.walk(f),
            AST::NonNullAssert(e) => e.expression.walk(f),
            AST::Call(e) => {
                e.receiver.walk(f);
                e.args.iter().for_each(|x| x.walk(f));
            }
            AST::SafeCall(e) => {
                e.receiver.walk(f);
                e.args.iter().for_each(|x| x.walk(f));
            }
            AST::PropertyWrite(e) => {
                e.receiver.walk(f);
                e.value.walk(f);
            }
            AST::KeyedWrite(e) => {
                e.receiver.walk(f);
                e.key.walk(f);
                e.value.walk(f);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_span() {
        let span = ParseSpan::new(2, 6);
        assert_eq!(span.to_absolute(10), AbsoluteSourceSpan::new(12, 16));
    }

    #[test]
    fn test_prop_spans() {
        // user.name at offset 10
        let ast = AST::prop(AST::ident("user", 10), "name", 15);
        assert_eq!(ast.source_span(), AbsoluteSourceSpan::new(10, 19));
        match &ast {
            AST::PropertyRead(read) => {
                assert_eq!(read.name_span, AbsoluteSourceSpan::new(15, 19));
                assert!(matches!(*read.receiver, AST::PropertyRead(_)));
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_walk_visits_all_nodes() {
        let ast = AST::pipe(AST::ident("a", 0), "upper", 4, vec![AST::ident("b", 10)]);
        let mut names = vec![];
        ast.walk(&mut |node| {
            if let AST::PropertyRead(read) = node {
                names.push(read.name.clone());
            }
        });
        assert_eq!(names, vec!["a", "b"]);
    }
}
