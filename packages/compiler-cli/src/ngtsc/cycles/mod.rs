//! Cycle Analysis
//!
//! Detects whether an added import would close a cycle in the program's import graph.

pub mod src {
    pub mod analyzer;
    pub mod imports;
}

#[cfg(test)]
mod test;

pub use src::analyzer::{Cycle, CycleAnalyzer};
pub use src::imports::ImportGraph;
