// Semantic Graph Source Module

pub mod api;
pub mod graph;
pub mod util;

// Re-exports
pub use api::{SemanticReference, SemanticSymbol};
pub use graph::{SemanticDepGraph, SemanticDepGraphUpdater, SemanticGraphChanges};
pub use util::{hash_fingerprint, references_equal};
