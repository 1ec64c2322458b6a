// In-Memory Program Driver
//
// Keeps the original program and derives a new snapshot for every update.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use ts::Program;

use super::api::{FileUpdate, ProgramDriver, UpdateMode};
use crate::ngtsc::file_system::AbsoluteFsPath;

pub struct InMemoryProgramDriver {
    original: Program,
    current: Program,
    supports_inline: bool,
}

impl InMemoryProgramDriver {
    pub fn new(program: Program) -> Self {
        Self {
            original: program.clone(),
            current: program,
            supports_inline: true,
        }
    }

    pub fn with_inline_support(mut self, supports_inline: bool) -> Self {
        self.supports_inline = supports_inline;
        self
    }

    pub fn original_program(&self) -> &Program {
        &self.original
    }
}

impl ProgramDriver for InMemoryProgramDriver {
    fn supports_inline_operations(&self) -> bool {
        self.supports_inline
    }

    fn get_program(&self) -> &Program {
        &self.current
    }

    fn update_files(&mut self, contents: IndexMap<AbsoluteFsPath, FileUpdate>, mode: UpdateMode) {
        if contents.is_empty() && mode == UpdateMode::Incremental {
            return;
        }
        let base = match mode {
            UpdateMode::Complete => &self.original,
            UpdateMode::Incremental => &self.current,
        };
        tracing::debug!(files = contents.len(), ?mode, "updating program");
        self.current = base.with_updated_files(
            contents
                .into_iter()
                .map(|(path, update)| (path.into_string(), update.new_text)),
        );
    }

    fn get_source_file_version(&self, file: &AbsoluteFsPath) -> Option<String> {
        let sf = self.current.get_source_file(file.as_str())?;
        let mut hasher = DefaultHasher::new();
        sf.text().hash(&mut hasher);
        Some(format!("{:016x}", hasher.finish()))
    }
}
