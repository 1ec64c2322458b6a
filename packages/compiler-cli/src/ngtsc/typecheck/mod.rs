//! Template type-checking: synthesizes type check blocks for component templates, runs
//! the host type checker over them and maps its diagnostics back onto the templates.

pub mod api;
pub mod extended;
pub mod src;

#[cfg(test)]
mod test;

pub use api::*;
pub use src::*;
