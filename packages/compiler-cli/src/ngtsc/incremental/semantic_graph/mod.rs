// Semantic Dependency Graph
//
// Tracks the public shape of compiled declarations across builds so that a change to one
// declaration re-emits only the files whose output actually depends on it.

pub mod src;

pub use src::*;
