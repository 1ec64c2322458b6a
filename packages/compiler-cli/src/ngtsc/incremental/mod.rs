// Incremental Module
//
// Carries analysis and type-checking results from one compilation to the next, and decides
// which files can reuse them.

pub mod semantic_graph;
pub mod src;


pub use src::*;
