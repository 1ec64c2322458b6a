//! Synthetic TypeScript
//!
//! The small slice of TypeScript that type check blocks are made of, and a printer that
//! records where every commented node ended up in the printed text.

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::comments::Comment;
use crate::ngtsc::reflection::ClassRef;
use crate::ngtsc::typecheck::api::TemplateId;

pub type Comments = SmallVec<[Comment; 2]>;

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    /// Trailing marker comments, printed right after the node.
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Identifier(String),
    This,
    StringLit(String),
    NumberLit(f64),
    BoolLit(bool),
    Null,
    Undefined,
    Property {
        object: Box<Expr>,
        name: String,
        optional: bool,
    },
    Element {
        object: Box<Expr>,
        index: Box<Expr>,
        optional: bool,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        optional: bool,
    },
    Binary {
        left: Box<Expr>,
        op: String,
        right: Box<Expr>,
    },
    /// Prefix operator; `op` includes any trailing space, e.g. `"typeof "`.
    Unary {
        op: String,
        operand: Box<Expr>,
    },
    NonNull(Box<Expr>),
    AsType {
        expr: Box<Expr>,
        ty: TypeNode,
    },
    Paren(Box<Expr>),
    Conditional {
        condition: Box<Expr>,
        when_true: Box<Expr>,
        when_false: Box<Expr>,
    },
    ArrayLit(Vec<Expr>),
    ObjectLit(Vec<ObjectProperty>),
    Comma(Vec<Expr>),
    Arrow {
        params: Vec<Param>,
        ret: Option<TypeNode>,
        body: Vec<Stmt>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectProperty {
    pub key: String,
    pub value: Expr,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Option<TypeNode>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeNode {
    Keyword(&'static str),
    Reference { name: String, args: Vec<TypeNode> },
    StringLiteral(String),
    Union(Vec<TypeNode>),
    Intersection(Vec<TypeNode>),
    Literal(Vec<(String, TypeNode)>),
    /// `typeof a.b`
    Query(String),
    IndexedAccess {
        object: Box<TypeNode>,
        index: Box<TypeNode>,
    },
    Function {
        type_params: Vec<TypeParamDecl>,
        params: Vec<(String, TypeNode)>,
        ret: Box<TypeNode>,
    },
    /// Type text reproduced verbatim.
    Raw(String),
}

impl TypeNode {
    pub fn any() -> Self {
        TypeNode::Keyword("any")
    }

    pub fn reference(name: impl Into<String>, args: Vec<TypeNode>) -> Self {
        TypeNode::Reference {
            name: name.into(),
            args,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeParamDecl {
    pub name: String,
    pub constraint: Option<TypeNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Var {
        constant: bool,
        name: Expr,
        ty: Option<TypeNode>,
        init: Option<Expr>,
    },
    Expr(Expr),
    If {
        condition: Expr,
        then: Vec<Stmt>,
    },
    Block(Vec<Stmt>),
    Return(Expr),
}

/// A type check block: one function per component template.
#[derive(Debug, Clone, PartialEq)]
pub struct TcbDecl {
    pub id: TemplateId,
    pub fn_name: String,
    pub type_params: Vec<TypeParamDecl>,
    pub this_type: TypeNode,
    pub body: Vec<Stmt>,
    /// Class of every directive instance local declared in `body`, by local name.
    pub directive_locals: IndexMap<String, ClassRef>,
}

/// A class member synthesized into an existing class, e.g. an inline type constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub is_static: bool,
    pub name: String,
    pub type_params: Vec<TypeParamDecl>,
    pub params: Vec<(String, TypeNode)>,
    pub ret: TypeNode,
    pub body: Vec<Stmt>,
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Expr {
            kind,
            comments: SmallVec::new(),
        }
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Expr::new(ExprKind::Identifier(name.into()))
    }

    pub fn this() -> Self {
        Expr::new(ExprKind::This)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::new(ExprKind::StringLit(value.into()))
    }

    pub fn prop(self, name: impl Into<String>) -> Self {
        Expr::new(ExprKind::Property {
            object: Box::new(self),
            name: name.into(),
            optional: false,
        })
    }

    pub fn optional_prop(self, name: impl Into<String>) -> Self {
        Expr::new(ExprKind::Property {
            object: Box::new(self),
            name: name.into(),
            optional: true,
        })
    }

    pub fn index(self, index: Expr) -> Self {
        Expr::new(ExprKind::Element {
            object: Box::new(self),
            index: Box::new(index),
            optional: false,
        })
    }

    pub fn call(self, args: Vec<Expr>) -> Self {
        Expr::new(ExprKind::Call {
            callee: Box::new(self),
            args,
            optional: false,
        })
    }

    pub fn binary(self, op: &str, right: Expr) -> Self {
        Expr::new(ExprKind::Binary {
            left: Box::new(self),
            op: op.to_string(),
            right: Box::new(right),
        })
    }

    pub fn assign(self, value: Expr) -> Self {
        self.binary("=", value)
    }

    pub fn non_null(self) -> Self {
        Expr::new(ExprKind::NonNull(Box::new(self)))
    }

    pub fn as_type(self, ty: TypeNode) -> Self {
        Expr::new(ExprKind::AsType {
            expr: Box::new(self),
            ty,
        })
    }

    pub fn as_any(self) -> Self {
        self.as_type(TypeNode::any())
    }

    pub fn paren(self) -> Self {
        Expr::new(ExprKind::Paren(Box::new(self)))
    }

    /// `null!`: a value of any type, left for the host to infer.
    pub fn null_non_null() -> Self {
        Expr::new(ExprKind::Null).non_null()
    }

    /// `null! as any`
    pub fn null_as_any() -> Self {
        Expr::null_non_null().as_any()
    }

    pub fn with_comment(mut self, comment: Comment) -> Self {
        self.comments.push(comment);
        self
    }

    /// Copy without marker comments.
    pub fn without_comments(&self) -> Self {
        Expr {
            kind: self.kind.clone(),
            comments: SmallVec::new(),
        }
    }

    /// True for literals that can never be `null`/`undefined`.
    pub fn is_non_nullable_literal(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::StringLit(_) | ExprKind::NumberLit(_) | ExprKind::BoolLit(_)
        )
    }

    /// Visits this expression and every nested expression, parents first.
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a Expr)) {
        f(self);
        match &self.kind {
            ExprKind::Identifier(_)
            | ExprKind::This
            | ExprKind::StringLit(_)
            | ExprKind::NumberLit(_)
            | ExprKind::BoolLit(_)
            | ExprKind::Null
            | ExprKind::Undefined => {}
            ExprKind::Property { object, .. } => object.walk(f),
            ExprKind::Element { object, index, .. } => {
                object.walk(f);
                index.walk(f);
            }
            ExprKind::Call { callee, args, .. } => {
                callee.walk(f);
                args.iter().for_each(|a| a.walk(f));
            }
            ExprKind::Binary { left, right, .. } => {
                left.walk(f);
                right.walk(f);
            }
            ExprKind::Unary { operand, .. } => operand.walk(f),
            ExprKind::NonNull(e) | ExprKind::Paren(e) => e.walk(f),
            ExprKind::AsType { expr, .. } => expr.walk(f),
            ExprKind::Conditional {
                condition,
                when_true,
                when_false,
            } => {
                condition.walk(f);
                when_true.walk(f);
                when_false.walk(f);
            }
            ExprKind::ArrayLit(items) | ExprKind::Comma(items) => items.iter().for_each(|e| e.walk(f)),
            ExprKind::ObjectLit(props) => props.iter().for_each(|p| p.value.walk(f)),
            ExprKind::Arrow { body, .. } => body.iter().for_each(|s| s.walk(f)),
        }
    }
}

impl Stmt {
    pub fn var(name: Expr, init: Expr) -> Self {
        Stmt::Var {
            constant: false,
            name,
            ty: None,
            init: Some(init),
        }
    }

    /// Visits every expression of the statement, including nested blocks.
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a Expr)) {
        match self {
            Stmt::Var { name, init, .. } => {
                name.walk(f);
                if let Some(init) = init {
                    init.walk(f);
                }
            }
            Stmt::Expr(e) | Stmt::Return(e) => e.walk(f),
            Stmt::If { condition, then } => {
                condition.walk(f);
                then.iter().for_each(|s| s.walk(f));
            }
            Stmt::Block(stmts) => stmts.iter().for_each(|s| s.walk(f)),
        }
    }
}

/// Printed range of a node that carries marker comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedNode {
    pub start: usize,
    pub end: usize,
    /// End of the node's own trailing comments.
    pub comments_end: usize,
}

/// Printed range of a type check block, starting at its `/*tcbN*/` comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcbRange {
    pub start: usize,
    pub end: usize,
}

/// Where commented nodes and blocks sit in one printed file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyntheticSourceMap {
    pub nodes: Vec<MappedNode>,
    pub tcbs: Vec<TcbRange>,
}

impl SyntheticSourceMap {
    /// The same map for text that was moved `offset` bytes to the right.
    pub fn shifted(&self, offset: usize) -> Self {
        SyntheticSourceMap {
            nodes: self
                .nodes
                .iter()
                .map(|n| MappedNode {
                    start: n.start + offset,
                    end: n.end + offset,
                    comments_end: n.comments_end + offset,
                })
                .collect(),
            tcbs: self
                .tcbs
                .iter()
                .map(|t| TcbRange {
                    start: t.start + offset,
                    end: t.end + offset,
                })
                .collect(),
        }
    }

    pub fn extend(&mut self, other: SyntheticSourceMap) {
        self.nodes.extend(other.nodes);
        self.tcbs.extend(other.tcbs);
    }

    pub fn enclosing_tcb(&self, position: usize) -> Option<TcbRange> {
        self.tcbs
            .iter()
            .copied()
            .find(|t| t.start <= position && position < t.end)
    }

    /// Commented nodes whose printed text contains `position`, innermost first.
    pub fn nodes_containing(&self, position: usize) -> Vec<MappedNode> {
        let mut nodes: Vec<MappedNode> = self
            .nodes
            .iter()
            .copied()
            .filter(|n| n.start <= position && position < n.end.max(n.start + 1))
            .collect();
        // Stable: equal ranges keep print order, which puts the inner node first.
        nodes.sort_by_key(|n| n.end - n.start);
        nodes
    }
}

const INDENT: &str = "  ";

/// Prints synthetic nodes and records the source map as it goes.
#[derive(Default)]
pub struct Printer {
    out: String,
    indent: usize,
    map: SyntheticSourceMap,
    /// Address of the node `locate` is looking for.
    target: Option<usize>,
    located: Option<(usize, usize)>,
}

impl Printer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Printed range of `target`, a node inside `tcb`, relative to the start of the
    /// printed block. Own trailing comments are not part of the range.
    pub fn locate(tcb: &TcbDecl, target: &Expr) -> Option<(usize, usize)> {
        let mut printer = Printer {
            target: Some(target as *const Expr as usize),
            ..Printer::default()
        };
        printer.print_tcb(tcb);
        printer.located
    }

    pub fn text(&self) -> &str {
        &self.out
    }

    pub fn finish(self) -> (String, SyntheticSourceMap) {
        (self.out, self.map)
    }

    pub fn write_raw(&mut self, text: &str) {
        self.out.push_str(text);
    }

    pub fn print_tcb(&mut self, tcb: &TcbDecl) {
        let start = self.out.len();
        self.out.push_str(&format!("/*{}*/\n", tcb.id));
        self.out.push_str("function ");
        self.out.push_str(&tcb.fn_name);
        self.print_type_params(&tcb.type_params);
        self.out.push_str("(this: ");
        self.print_type(&tcb.this_type);
        self.out.push_str(") {\n");
        self.print_block_body(&tcb.body);
        self.out.push_str("}\n");
        self.map.tcbs.push(TcbRange {
            start,
            end: self.out.len(),
        });
    }

    pub fn print_method(&mut self, method: &MethodDecl) {
        self.write_indent();
        if method.is_static {
            self.out.push_str("static ");
        }
        self.out.push_str(&method.name);
        self.print_type_params(&method.type_params);
        self.print_params(&method.params);
        self.out.push_str(": ");
        self.print_type(&method.ret);
        self.out.push_str(" { ");
        for stmt in &method.body {
            self.print_inline_stmt(stmt);
        }
        self.out.push('}');
    }

    pub fn print_stmt(&mut self, stmt: &Stmt) {
        self.write_indent();
        match stmt {
            Stmt::If { condition, then } => {
                self.out.push_str("if (");
                self.print_expr(condition);
                self.out.push_str(") {\n");
                self.print_block_body(then);
                self.write_indent();
                self.out.push_str("}\n");
            }
            Stmt::Block(stmts) => {
                self.out.push_str("{\n");
                self.print_block_body(stmts);
                self.write_indent();
                self.out.push_str("}\n");
            }
            _ => {
                self.print_inline_stmt(stmt);
                self.out.push('\n');
            }
        }
    }

    /// Statements that fit on one line, without indentation or newline.
    fn print_inline_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Var {
                constant,
                name,
                ty,
                init,
            } => {
                self.out.push_str(if *constant { "const " } else { "var " });
                self.print_expr(name);
                if let Some(ty) = ty {
                    self.out.push_str(": ");
                    self.print_type(ty);
                }
                if let Some(init) = init {
                    self.out.push_str(" = ");
                    self.print_expr(init);
                }
                self.out.push(';');
            }
            Stmt::Expr(e) => {
                self.print_expr(e);
                self.out.push(';');
            }
            Stmt::Return(e) => {
                self.out.push_str("return ");
                self.print_expr(e);
                self.out.push_str("; ");
            }
            Stmt::If { .. } | Stmt::Block(_) => self.print_stmt(stmt),
        }
    }

    fn print_block_body(&mut self, stmts: &[Stmt]) {
        self.indent += 1;
        for stmt in stmts {
            self.print_stmt(stmt);
        }
        self.indent -= 1;
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
    }

    fn write_comments(&mut self, start: usize, comments: &Comments) {
        if comments.is_empty() {
            return;
        }
        let end = self.out.len();
        for comment in comments {
            self.out.push(' ');
            self.out.push_str(&comment.to_string());
        }
        self.map.nodes.push(MappedNode {
            start,
            end,
            comments_end: self.out.len(),
        });
    }

    pub fn print_expr(&mut self, expr: &Expr) {
        let start = self.out.len();
        match &expr.kind {
            ExprKind::Identifier(name) => self.out.push_str(name),
            ExprKind::This => self.out.push_str("this"),
            ExprKind::StringLit(value) => self.out.push_str(&quote(value)),
            ExprKind::NumberLit(value) => self.out.push_str(&format_number(*value)),
            ExprKind::BoolLit(value) => self.out.push_str(if *value { "true" } else { "false" }),
            ExprKind::Null => self.out.push_str("null"),
            ExprKind::Undefined => self.out.push_str("undefined"),
            ExprKind::Property {
                object,
                name,
                optional,
            } => {
                self.print_operand(object);
                self.out.push_str(if *optional { "?." } else { "." });
                self.out.push_str(name);
            }
            ExprKind::Element {
                object,
                index,
                optional,
            } => {
                self.print_operand(object);
                self.out.push_str(if *optional { "?.[" } else { "[" });
                self.print_expr(index);
                self.out.push(']');
            }
            ExprKind::Call {
                callee,
                args,
                optional,
            } => {
                self.print_operand(callee);
                self.out.push_str(if *optional { "?.(" } else { "(" });
                self.print_list(args);
                self.out.push(')');
            }
            ExprKind::Binary { left, op, right } => {
                self.print_expr(left);
                self.out.push(' ');
                self.out.push_str(op);
                self.out.push(' ');
                self.print_expr(right);
            }
            ExprKind::Unary { op, operand } => {
                self.out.push_str(op);
                self.print_operand(operand);
            }
            ExprKind::NonNull(inner) => {
                self.print_operand(inner);
                self.out.push('!');
            }
            ExprKind::AsType { expr, ty } => {
                self.print_expr(expr);
                self.out.push_str(" as ");
                self.print_type(ty);
            }
            ExprKind::Paren(inner) => {
                self.out.push('(');
                self.print_expr(inner);
                self.out.push(')');
            }
            ExprKind::Conditional {
                condition,
                when_true,
                when_false,
            } => {
                self.print_expr(condition);
                self.out.push_str(" ? ");
                self.print_expr(when_true);
                self.out.push_str(" : ");
                self.print_expr(when_false);
            }
            ExprKind::ArrayLit(items) => {
                self.out.push('[');
                self.print_list(items);
                self.out.push(']');
            }
            ExprKind::ObjectLit(props) => {
                if props.is_empty() {
                    self.out.push_str("{}");
                } else {
                    self.out.push_str("{ ");
                    for (i, prop) in props.iter().enumerate() {
                        if i > 0 {
                            self.out.push_str(", ");
                        }
                        let prop_start = self.out.len();
                        self.out.push_str(&quote(&prop.key));
                        self.out.push_str(": ");
                        self.print_expr(&prop.value);
                        self.write_comments(prop_start, &prop.comments);
                    }
                    self.out.push_str(" }");
                }
            }
            ExprKind::Comma(items) => self.print_list(items),
            ExprKind::Arrow { params, ret, body } => {
                self.out.push('(');
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    let param_start = self.out.len();
                    self.out.push_str(&param.name);
                    if let Some(ty) = &param.ty {
                        self.out.push_str(": ");
                        self.print_type(ty);
                    }
                    self.write_comments(param_start, &param.comments);
                }
                self.out.push(')');
                if let Some(ret) = ret {
                    self.out.push_str(": ");
                    self.print_type(ret);
                }
                self.out.push_str(" => {\n");
                self.print_block_body(body);
                self.write_indent();
                self.out.push('}');
            }
        }
        if self.target == Some(expr as *const Expr as usize) {
            self.located = Some((start, self.out.len()));
        }
        self.write_comments(start, &expr.comments);
    }

    /// Prints an expression in receiver/operand position, parenthesized where the
    /// grammar would otherwise bind it differently.
    fn print_operand(&mut self, expr: &Expr) {
        let needs_parens = expr.comments.is_empty()
            && matches!(
                expr.kind,
                ExprKind::Binary { .. }
                    | ExprKind::Conditional { .. }
                    | ExprKind::AsType { .. }
                    | ExprKind::Arrow { .. }
                    | ExprKind::Unary { .. }
                    | ExprKind::Comma(_)
            );
        if needs_parens {
            self.out.push('(');
            self.print_expr(expr);
            self.out.push(')');
        } else {
            self.print_expr(expr);
        }
    }

    fn print_list(&mut self, items: &[Expr]) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.print_expr(item);
        }
    }

    fn print_params(&mut self, params: &[(String, TypeNode)]) {
        self.out.push('(');
        for (i, (name, ty)) in params.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.out.push_str(name);
            self.out.push_str(": ");
            self.print_type(ty);
        }
        self.out.push(')');
    }

    pub fn print_type_params(&mut self, params: &[TypeParamDecl]) {
        if params.is_empty() {
            return;
        }
        self.out.push('<');
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.out.push_str(&param.name);
            if let Some(constraint) = &param.constraint {
                self.out.push_str(" extends ");
                self.print_type(constraint);
            }
        }
        self.out.push('>');
    }

    pub fn print_type(&mut self, ty: &TypeNode) {
        match ty {
            TypeNode::Keyword(keyword) => self.out.push_str(keyword),
            TypeNode::Reference { name, args } => {
                self.out.push_str(name);
                if !args.is_empty() {
                    self.out.push('<');
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            self.out.push_str(", ");
                        }
                        self.print_type(arg);
                    }
                    self.out.push('>');
                }
            }
            TypeNode::StringLiteral(value) => self.out.push_str(&quote(value)),
            TypeNode::Union(members) => self.print_type_list(members, " | "),
            TypeNode::Intersection(members) => self.print_type_list(members, " & "),
            TypeNode::Literal(members) => {
                if members.is_empty() {
                    self.out.push_str("{}");
                    return;
                }
                self.out.push_str("{ ");
                for (name, member) in members {
                    self.out.push_str(name);
                    self.out.push_str(": ");
                    self.print_type(member);
                    self.out.push_str("; ");
                }
                self.out.push('}');
            }
            TypeNode::Query(path) => {
                self.out.push_str("typeof ");
                self.out.push_str(path);
            }
            TypeNode::IndexedAccess { object, index } => {
                let wrap = matches!(
                    **object,
                    TypeNode::Query(_)
                        | TypeNode::Union(_)
                        | TypeNode::Intersection(_)
                        | TypeNode::Function { .. }
                );
                if wrap {
                    self.out.push('(');
                }
                self.print_type(object);
                if wrap {
                    self.out.push(')');
                }
                self.out.push('[');
                self.print_type(index);
                self.out.push(']');
            }
            TypeNode::Function {
                type_params,
                params,
                ret,
            } => {
                self.print_type_params(type_params);
                self.print_params(params);
                self.out.push_str(" => ");
                self.print_type(ret);
            }
            TypeNode::Raw(text) => self.out.push_str(text),
        }
    }

    fn print_type_list(&mut self, members: &[TypeNode], separator: &str) {
        for (i, member) in members.iter().enumerate() {
            if i > 0 {
                self.out.push_str(separator);
            }
            let wrap = matches!(member, TypeNode::Function { .. } | TypeNode::Union(_));
            if wrap {
                self.out.push('(');
            }
            self.print_type(member);
            if wrap {
                self.out.push(')');
            }
        }
    }
}

/// Double-quoted string literal with JSON escaping, which is valid TypeScript.
fn quote(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}

fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
