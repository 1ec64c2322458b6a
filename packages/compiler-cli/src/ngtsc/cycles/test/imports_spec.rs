use crate::ngtsc::cycles::src::imports::ImportGraph;
use crate::ngtsc::cycles::test::util::{create_program_from_graph, import_path_to_string, path};
use ts::{CompilerOptions, Program, SourceFile};

#[test]
fn should_scan_imports_in_source_order() {
    let graph = ImportGraph::new(create_program_from_graph("a:c,b;b;c"));

    let imports: Vec<_> = graph.imports_of(&path("a")).into_iter().collect();
    assert_eq!(import_path_to_string(&imports), "c,b");
}

#[test]
fn should_resolve_index_and_declaration_files() {
    let program = Program::new(
        CompilerOptions::default(),
        vec![
            SourceFile::new(
                "/app/a.ts",
                "import {x} from './lib';\nimport {y} from './types';\nimport {z} from '@angular/core';\n",
            ),
            SourceFile::new("/app/lib/index.ts", "export const x = 1;"),
            SourceFile::new("/app/types.d.ts", "export declare const y: number;"),
        ],
    );
    let graph = ImportGraph::new(program);

    let imports: Vec<String> = graph
        .imports_of(&"/app/a.ts".into())
        .into_iter()
        .map(|p| p.into_string())
        .collect();
    assert_eq!(imports, vec!["/app/lib/index.ts", "/app/types.d.ts"]);
}

#[test]
fn should_find_shortest_path() {
    let graph = ImportGraph::new(create_program_from_graph("a:b;b:c;c;e:f;f"));

    let found = graph.find_path(&path("a"), &path("c")).expect("path a->c");
    assert_eq!(import_path_to_string(&found), "a,b,c");

    assert!(graph.find_path(&path("e"), &path("c")).is_none());

    let found = graph.find_path(&path("b"), &path("c")).expect("path b->c");
    assert_eq!(import_path_to_string(&found), "b,c");
}

#[test]
fn should_find_path_in_circular_graph() {
    let graph = ImportGraph::new(create_program_from_graph("a:b;b:a,c;c:a,d;d"));

    let found = graph.find_path(&path("a"), &path("d")).expect("path a->d");
    assert_eq!(import_path_to_string(&found), "a,b,c,d");
}

#[test]
fn should_prefer_first_import_on_ties() {
    // a reaches d through both b and c in two hops; b is imported first.
    let graph = ImportGraph::new(create_program_from_graph("a:b,c;b:d;c:d;d"));

    let found = graph.find_path(&path("a"), &path("d")).expect("path a->d");
    assert_eq!(import_path_to_string(&found), "a,b,d");
}

#[test]
fn should_remember_synthetic_imports() {
    let graph = ImportGraph::new(create_program_from_graph("a:c;b;c"));

    graph.add_synthetic_import(&path("a"), &path("b"));

    let imports: Vec<_> = graph.imports_of(&path("a")).into_iter().collect();
    assert_eq!(import_path_to_string(&imports), "c,b");
}
