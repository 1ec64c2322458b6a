use indexmap::IndexMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompilerOptions {
    pub strict: Option<bool>,
    pub strict_null_checks: Option<bool>,
    pub no_implicit_any: Option<bool>,
    pub no_unused_locals: Option<bool>,
    pub no_unused_parameters: Option<bool>,
    pub root_dir: Option<String>,
}

/// A single file of a program. Text is shared so that new programs built from an old one
/// reuse unchanged files without copying.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub file_name: String,
    pub text: Arc<str>,
    pub is_declaration_file: bool,
}

impl SourceFile {
    pub fn new(file_name: impl Into<String>, text: impl Into<Arc<str>>) -> Self {
        let file_name = file_name.into();
        let is_declaration_file = file_name.ends_with(".d.ts");
        Self {
            file_name,
            text: text.into(),
            is_declaration_file,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// An immutable snapshot of the files the host type checker sees. Updating files produces
/// a new `Program`; the old one stays valid.
#[derive(Debug, Clone, Default)]
pub struct Program {
    options: CompilerOptions,
    root_names: Vec<String>,
    files: IndexMap<String, SourceFile>,
}

impl Program {
    pub fn new(options: CompilerOptions, files: impl IntoIterator<Item = SourceFile>) -> Self {
        let files: IndexMap<String, SourceFile> = files
            .into_iter()
            .map(|sf| (sf.file_name.clone(), sf))
            .collect();
        let root_names = files.keys().cloned().collect();
        Self {
            options,
            root_names,
            files,
        }
    }

    pub fn get_compiler_options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn get_root_file_names(&self) -> &[String] {
        &self.root_names
    }

    pub fn get_source_file(&self, file_name: &str) -> Option<&SourceFile> {
        self.files.get(file_name)
    }

    pub fn get_source_files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.values()
    }

    pub fn has_file(&self, file_name: &str) -> bool {
        self.files.contains_key(file_name)
    }

    /// Builds the next program: files in `updates` replace (or add to) the current set,
    /// everything else is carried over unchanged. Root names are not affected by added
    /// files, matching how synthesized files are only reachable through the host.
    pub fn with_updated_files(&self, updates: impl IntoIterator<Item = (String, String)>) -> Program {
        let mut files = self.files.clone();
        for (name, text) in updates {
            files.insert(name.clone(), SourceFile::new(name, text));
        }
        Program {
            options: self.options.clone(),
            root_names: self.root_names.clone(),
            files,
        }
    }
}
