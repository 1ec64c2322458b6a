#![deny(clippy::all)]

//! Angular compiler inputs for template type-checking.
//!
//! Holds the template and expression ASTs, source spans, the DOM element schema and the
//! binder which matches directives against a template. Parsing templates is done
//! upstream; everything here consumes already-parsed nodes.

pub mod core;
pub mod directive_matching;
pub mod expression_parser;
pub mod parse_util;
pub mod render3;
pub mod schema;
pub mod testing;
