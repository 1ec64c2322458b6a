use super::*;
use crate::ngtsc::file_system::AbsoluteFsPath;
use indoc::indoc;
use ts::{CompilerOptions, Program, SourceFile};

fn program_with(file: &str, text: &str) -> Program {
    Program::new(CompilerOptions::default(), vec![SourceFile::new(file, text)])
}

mod reflection_host_tests {
    use super::*;

    #[test]
    fn should_report_export_status_of_classes() {
        let program = program_with(
            "/app.ts",
            indoc! {"
                export class Exported {}
                class Hidden {}
                class LaterExported {}
                export { LaterExported };
            "},
        );
        let host = TypeScriptReflectionHost::new(&program);
        let classes = host.get_classes_of_file(&AbsoluteFsPath::from("/app.ts"));

        let summary: Vec<(&str, bool)> = classes
            .iter()
            .map(|c| (c.class_ref.name.as_str(), c.class_ref.exported))
            .collect();
        assert_eq!(
            summary,
            vec![("Exported", true), ("Hidden", false), ("LaterExported", true)]
        );
    }

    #[test]
    fn should_record_name_and_end_offsets() {
        let text = "class Cmp {\n  x = 1;\n}\n";
        let program = program_with("/cmp.ts", text);
        let host = TypeScriptReflectionHost::new(&program);
        let decl = host
            .get_class_declaration(&AbsoluteFsPath::from("/cmp.ts"), "Cmp")
            .unwrap();

        assert_eq!(decl.class_ref.name_start, text.find("Cmp").unwrap());
        assert_eq!(&text[decl.class_ref.node_end - 1..decl.class_ref.node_end], "}");
        assert!(!decl.is_generic());
    }

    #[test]
    fn should_classify_references_in_generic_bounds() {
        let program = program_with(
            "/dir.ts",
            indoc! {"
                import { Model as M } from './model';
                import * as lib from 'lib';
                interface Hidden {}
                export interface Shared {}
                export class Dir<T extends M, U extends Array<T>, V extends Hidden | Shared, W extends lib.Thing> {}
            "},
        );
        let host = TypeScriptReflectionHost::new(&program);
        let decl = host
            .get_class_declaration(&AbsoluteFsPath::from("/dir.ts"), "Dir")
            .unwrap();
        let params = decl.type_parameters();
        assert_eq!(params.len(), 4);

        let t = params[0].bound.as_ref().unwrap();
        assert_eq!(t.text, "M");
        assert_eq!(
            t.references[0].origin,
            TypeReferenceOrigin::Imported {
                module: "./model".to_string(),
                imported_name: "Model".to_string()
            }
        );

        let u = params[1].bound.as_ref().unwrap();
        assert_eq!(u.text, "Array<T>");
        assert_eq!(u.references[0].origin, TypeReferenceOrigin::Ambient);
        assert_eq!(u.references[1].origin, TypeReferenceOrigin::TypeParameter);
        assert_eq!(&u.text[u.references[1].start..u.references[1].end], "T");

        let v = params[2].bound.as_ref().unwrap();
        let origins: Vec<_> = v.references.iter().map(|r| r.origin.clone()).collect();
        assert_eq!(
            origins,
            vec![
                TypeReferenceOrigin::Local { exported: false },
                TypeReferenceOrigin::Local { exported: true }
            ]
        );

        let w = params[3].bound.as_ref().unwrap();
        assert_eq!(w.references[0].name, "lib");
        assert_eq!(
            w.references[0].origin,
            TypeReferenceOrigin::Namespace {
                module: "lib".to_string()
            }
        );
    }

    #[test]
    fn should_mark_bounds_with_unwalked_syntax_as_opaque() {
        let program = program_with(
            "/dir.ts",
            "export class Dir<T extends { id: Key }> {}\ninterface Key {}\n",
        );
        let host = TypeScriptReflectionHost::new(&program);
        let decl = host
            .get_class_declaration(&AbsoluteFsPath::from("/dir.ts"), "Dir")
            .unwrap();
        assert!(decl.type_parameters()[0].bound.as_ref().unwrap().opaque);
    }

    #[test]
    fn should_return_nothing_for_unknown_files() {
        let program = program_with("/a.ts", "export class A {}");
        let host = TypeScriptReflectionHost::new(&program);
        assert!(host
            .get_classes_of_file(&AbsoluteFsPath::from("/missing.ts"))
            .is_empty());
    }
}
