// Program Driver API
//
// How type-checking swaps synthesized texts into the program the host checks.

use indexmap::IndexMap;
use ts::Program;

use crate::ngtsc::file_system::AbsoluteFsPath;

/// New text for one file of the program.
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpdate {
    pub new_text: String,
    /// For shims: the original file the shim was generated from.
    pub original_file: Option<AbsoluteFsPath>,
}

impl FileUpdate {
    pub fn new(new_text: impl Into<String>) -> Self {
        Self {
            new_text: new_text.into(),
            original_file: None,
        }
    }

    pub fn for_shim(new_text: impl Into<String>, original_file: AbsoluteFsPath) -> Self {
        Self {
            new_text: new_text.into(),
            original_file: Some(original_file),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Start from the original program and apply the updates.
    Complete,
    /// Apply the updates on top of the current program.
    Incremental,
}

/// Program driver trait.
pub trait ProgramDriver {
    /// Whether synthesized code may be spliced into original source files.
    fn supports_inline_operations(&self) -> bool;

    fn get_program(&self) -> &Program;

    fn update_files(&mut self, contents: IndexMap<AbsoluteFsPath, FileUpdate>, mode: UpdateMode);

    /// Version token of a file, compared for equality only.
    fn get_source_file_version(&self, file: &AbsoluteFsPath) -> Option<String>;
}
