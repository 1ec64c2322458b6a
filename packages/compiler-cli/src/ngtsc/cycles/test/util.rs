use crate::ngtsc::file_system::{basename, AbsoluteFsPath};
use ts::{CompilerOptions, Program, SourceFile};

/// Builds a program from a compact graph description.
///
/// `"a:b,c;b"` declares `/a.ts` importing `./b` and `./c`, and an empty `/b.ts`.
/// A dependency prefixed with `*` is re-exported instead of imported; a trailing `!`
/// makes the import or export type-only.
pub fn create_program_from_graph(graph: &str) -> Program {
    let files = graph.split(';').map(|segment| {
        let (name, deps) = segment.split_once(':').unwrap_or((segment, ""));

        let mut content = String::new();
        for dep in deps.split(',').filter(|d| !d.is_empty()) {
            let is_type_only = dep.ends_with('!');
            let dep = dep.trim_end_matches('!');
            if let Some(sym) = dep.strip_prefix('*') {
                let kw = if is_type_only { "export type" } else { "export" };
                content.push_str(&format!("{} {{{}}} from './{}';\n", kw, sym, sym));
            } else {
                let kw = if is_type_only { "import type" } else { "import" };
                content.push_str(&format!("{} {{{}}} from './{}';\n", kw, dep, dep));
            }
        }
        content.push_str(&format!("export const {} = '{}';\n", name, name));

        SourceFile::new(format!("/{}.ts", name), content)
    });
    Program::new(CompilerOptions::default(), files)
}

pub fn path(name: &str) -> AbsoluteFsPath {
    AbsoluteFsPath::from(format!("/{}.ts", name))
}

pub fn import_path_to_string(path: &[AbsoluteFsPath]) -> String {
    path.iter()
        .map(|p| basename(p.as_str(), Some(".ts")).to_string())
        .collect::<Vec<_>>()
        .join(",")
}
