// Incremental API
//
// Public API types for incremental compilation.

use crate::ngtsc::file_system::AbsoluteFsPath;
use std::collections::HashMap;
use thiserror::Error;

/// Opaque content versions per file. Versions are only ever compared for equality.
pub type FileVersions = HashMap<AbsoluteFsPath, String>;

/// Per-file type-checking output that can be carried into the next build.
pub trait ReusableTypeCheckData: Clone {
    /// Whether producing this data spliced code into the original source file. Such
    /// results are never reused since the file's text may have shifted since.
    fn has_inlines(&self) -> bool;
}

/// The view of an incremental build that the analysis and type-checking phases consume.
pub trait IncrementalBuild<A, T> {
    /// Analysis results of the previous build for `file`, if they can be reused.
    fn prior_analysis_for(&self, file: &AbsoluteFsPath) -> Option<&A>;

    /// Type-checking results of the previous build for `file`, if they can be reused.
    fn prior_type_checking_results_for(
        &self,
        file: &AbsoluteFsPath,
    ) -> Result<Option<&T>, IncrementalError>;
}

/// Internal invariant violations of the incremental state machine. These are compiler
/// bugs and are never reported as diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IncrementalError {
    #[error("AssertionError: {operation} requires the {expected} phase, but the compilation is in the {actual} phase")]
    InvalidPhase {
        operation: &'static str,
        expected: &'static str,
        actual: &'static str,
    },
}
