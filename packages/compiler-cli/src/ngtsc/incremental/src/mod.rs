// Incremental Source Module

pub mod api;
pub mod dependency_tracking;
pub mod incremental;
pub mod state;
pub mod strategy;

// Re-exports
pub use api::{FileVersions, IncrementalBuild, IncrementalError, ReusableTypeCheckData};
pub use dependency_tracking::FileDependencyGraph;
pub use incremental::IncrementalCompilation;
pub use state::{
    AnalyzedIncrementalState, DeltaIncrementalState, IncrementalState, IncrementalStateKind,
};
pub use strategy::{
    IncrementalBuildStrategy, NoopIncrementalBuildStrategy, TrackedIncrementalBuildStrategy,
};
