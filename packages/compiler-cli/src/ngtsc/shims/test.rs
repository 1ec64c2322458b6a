// Shims Tests

use super::*;
use crate::ngtsc::file_system::AbsoluteFsPath;
use ts::{CompilerOptions, Program, SourceFile};

mod naming_tests {
    use super::*;

    #[test]
    fn should_derive_shim_names_from_original() {
        let original = AbsoluteFsPath::from("/app/cmp.ts");
        assert_eq!(
            make_shim_file_name(&original, ShimType::TypeCheck).as_str(),
            "/app/cmp.ngtypecheck.ts"
        );
        assert_eq!(
            make_shim_file_name(&original, ShimType::Factory).as_str(),
            "/app/cmp.ngfactory.ts"
        );
    }

    #[test]
    fn should_recognize_shims() {
        assert!(is_shim("/app/cmp.ngtypecheck.ts"));
        assert!(is_shim("/app/cmp.ngfactory.ts"));
        assert!(!is_shim("/app/cmp.ts"));
        assert_eq!(shim_type_of("/a.ngfactory.ts"), Some(ShimType::Factory));
    }

    #[test]
    fn should_map_shim_back_to_original() {
        assert_eq!(
            get_original_file("/app/cmp.ngtypecheck.ts"),
            Some(AbsoluteFsPath::from("/app/cmp.ts"))
        );
        assert_eq!(get_original_file("/app/cmp.ts"), None);
    }
}

mod adapter_tests {
    use super::*;

    #[test]
    fn should_generate_shims_for_original_files_only() {
        let program = Program::new(
            CompilerOptions::default(),
            vec![
                SourceFile::new("/app/a.ts", "export class A {}"),
                SourceFile::new("/app/lib.d.ts", "export declare class L {}"),
                SourceFile::new("/app/a.ngtypecheck.ts", ""),
            ],
        );
        let adapter = ShimAdapter::new(ShimType::all().to_vec());
        let shims = adapter.generate(&program);

        let names: Vec<&str> = shims.keys().map(|p| p.as_str()).collect();
        assert_eq!(names, vec!["/app/a.ngtypecheck.ts", "/app/a.ngfactory.ts"]);
        let tc = &shims[&AbsoluteFsPath::from("/app/a.ngtypecheck.ts")];
        assert_eq!(tc.original.as_str(), "/app/a.ts");
        assert!(tc.content.contains("USED_FOR_NG_TYPE_CHECKING"));
    }
}

mod reference_tagger_tests {
    use super::*;

    #[test]
    fn should_tag_originals_until_finalized() {
        let mut tagger = ShimReferenceTagger::new(vec![ShimType::TypeCheck]);
        let mut map = ShimReferenceMap::new();

        tagger.tag(&AbsoluteFsPath::from("/a.ts"), &mut map);
        tagger.tag(&AbsoluteFsPath::from("/a.ngtypecheck.ts"), &mut map);
        tagger.tag(&AbsoluteFsPath::from("/types.d.ts"), &mut map);
        tagger.finalize();
        tagger.tag(&AbsoluteFsPath::from("/b.ts"), &mut map);

        assert_eq!(map.len(), 1);
        assert_eq!(
            map.references_of(&AbsoluteFsPath::from("/a.ts")),
            &[AbsoluteFsPath::from("/a.ngtypecheck.ts")]
        );
        assert!(map.references_of(&AbsoluteFsPath::from("/b.ts")).is_empty());
    }
}
