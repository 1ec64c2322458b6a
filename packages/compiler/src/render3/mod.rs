//! Render3 Module
//!
//! Template AST and the binding APIs built on it.

pub mod r3_ast;
pub mod view;

pub use r3_ast::*;
