/**
 * Expression Parser Module
 *
 * The parsed expression AST consumed by template type-checking. Parsing itself happens
 * upstream.
 */
pub mod ast;

pub use ast::*;
