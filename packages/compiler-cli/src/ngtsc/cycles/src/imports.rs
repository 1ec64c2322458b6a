use crate::ngtsc::file_system::{resolve_relative, AbsoluteFsPath};
use indexmap::IndexSet;
use oxc_allocator::Allocator;
use oxc_ast::ast::Statement;
use oxc_parser::Parser;
use oxc_span::SourceType;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use ts::Program;

/// Extensions tried, in order, when resolving a relative module specifier.
const RESOLUTION_CANDIDATES: &[&str] = &["", ".ts", ".d.ts", "/index.ts", "/index.d.ts"];

/// The value-level import graph of a program. Each file's imports are scanned once and
/// kept in source order, so graph searches visit edges deterministically.
pub struct ImportGraph {
    program: Program,
    imports: RefCell<HashMap<AbsoluteFsPath, IndexSet<AbsoluteFsPath>>>,
}

impl ImportGraph {
    pub fn new(program: Program) -> Self {
        Self {
            program,
            imports: RefCell::new(HashMap::new()),
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Files `sf` imports directly, including synthetic imports recorded for it.
    pub fn imports_of(&self, sf: &AbsoluteFsPath) -> IndexSet<AbsoluteFsPath> {
        if let Some(imports) = self.imports.borrow().get(sf) {
            return imports.clone();
        }

        let imports = self.scan_imports(sf);
        self.imports
            .borrow_mut()
            .insert(sf.clone(), imports.clone());
        imports
    }

    fn scan_imports(&self, path: &AbsoluteFsPath) -> IndexSet<AbsoluteFsPath> {
        let mut imports = IndexSet::new();
        let Some(sf) = self.program.get_source_file(path.as_str()) else {
            return imports;
        };

        let allocator = Allocator::default();
        let source_type = SourceType::from_path(path.as_path())
            .unwrap_or_default()
            .with_typescript(true);
        let ret = Parser::new(&allocator, sf.text(), source_type).parse();

        for stmt in &ret.program.body {
            let module_specifier = match stmt {
                Statement::ImportDeclaration(decl) if decl.import_kind.is_value() => {
                    Some(decl.source.value.as_str())
                }
                Statement::ExportNamedDeclaration(decl) if decl.export_kind.is_value() => {
                    decl.source.as_ref().map(|s| s.value.as_str())
                }
                Statement::ExportAllDeclaration(decl) if decl.export_kind.is_value() => {
                    Some(decl.source.value.as_str())
                }
                _ => None,
            };

            if let Some(resolved) = module_specifier.and_then(|s| self.resolve(path, s)) {
                imports.insert(resolved);
            }
        }

        tracing::trace!(file = %path, count = imports.len(), "scanned imports");
        imports
    }

    /// Resolves a relative specifier against the files of the program. Bare specifiers
    /// (packages) never take part in cycles between program files.
    fn resolve(&self, from: &AbsoluteFsPath, specifier: &str) -> Option<AbsoluteFsPath> {
        if !specifier.starts_with('.') {
            return None;
        }
        let base = resolve_relative(from, specifier);
        RESOLUTION_CANDIDATES
            .iter()
            .map(|ext| format!("{}{}", base.as_str(), ext))
            .find(|candidate| self.program.has_file(candidate))
            .map(AbsoluteFsPath::new)
    }

    /// Find an import path from the `start` file to the `end` file.
    ///
    /// This function implements a breadth first search that results in finding the
    /// shortest path between the `start` and `end` points. Among paths of equal length
    /// the one through earlier imports wins.
    pub fn find_path(
        &self,
        start: &AbsoluteFsPath,
        end: &AbsoluteFsPath,
    ) -> Option<Vec<AbsoluteFsPath>> {
        if start == end {
            return Some(vec![start.clone()]);
        }

        let mut found = HashSet::new();
        found.insert(start.clone());
        let mut parents: HashMap<AbsoluteFsPath, AbsoluteFsPath> = HashMap::new();
        let mut queue = VecDeque::new();
        queue.push_back(start.clone());

        while let Some(current) = queue.pop_front() {
            for imported in self.imports_of(&current) {
                if found.contains(&imported) {
                    continue;
                }
                parents.insert(imported.clone(), current.clone());

                if &imported == end {
                    let mut path = vec![imported];
                    while let Some(parent) = path.last().and_then(|last| parents.get(last)) {
                        path.push(parent.clone());
                    }
                    path.reverse();
                    return Some(path);
                }

                found.insert(imported.clone());
                queue.push_back(imported);
            }
        }
        None
    }

    /// Add a record of an import from `sf` to `imported`, that's not present in the original
    /// program but will be remembered by the `ImportGraph`.
    pub fn add_synthetic_import(&self, sf: &AbsoluteFsPath, imported: &AbsoluteFsPath) {
        // Scan first so the real imports are not lost behind the synthetic one.
        self.imports_of(sf);
        self.imports
            .borrow_mut()
            .entry(sf.clone())
            .or_default()
            .insert(imported.clone());
    }
}
