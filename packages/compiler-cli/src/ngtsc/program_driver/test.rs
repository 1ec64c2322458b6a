// Program Driver Tests

use super::*;
use crate::ngtsc::file_system::AbsoluteFsPath;
use indexmap::IndexMap;
use ts::{CompilerOptions, Program, SourceFile};

fn make_driver() -> InMemoryProgramDriver {
    InMemoryProgramDriver::new(Program::new(
        CompilerOptions::default(),
        vec![
            SourceFile::new("/a.ts", "export class A {}"),
            SourceFile::new("/b.ts", "export class B {}"),
        ],
    ))
}

fn updates(entries: &[(&str, &str)]) -> IndexMap<AbsoluteFsPath, FileUpdate> {
    entries
        .iter()
        .map(|(path, text)| (AbsoluteFsPath::from(*path), FileUpdate::new(*text)))
        .collect()
}

mod in_memory_program_driver_tests {
    use super::*;

    #[test]
    fn should_add_and_replace_files() {
        let mut driver = make_driver();
        driver.update_files(
            updates(&[("/a.ngtypecheck.ts", "function _tcb1() {}"), ("/b.ts", "export class B2 {}")]),
            UpdateMode::Complete,
        );

        let program = driver.get_program();
        assert!(program.has_file("/a.ngtypecheck.ts"));
        assert_eq!(
            program.get_source_file("/b.ts").map(|sf| sf.text()),
            Some("export class B2 {}")
        );
        assert_eq!(
            driver
                .original_program()
                .get_source_file("/b.ts")
                .map(|sf| sf.text()),
            Some("export class B {}")
        );
    }

    #[test]
    fn should_reset_to_original_on_complete_update() {
        let mut driver = make_driver();
        driver.update_files(updates(&[("/b.ts", "changed")]), UpdateMode::Incremental);
        driver.update_files(updates(&[("/x.ts", "")]), UpdateMode::Complete);

        let program = driver.get_program();
        assert_eq!(
            program.get_source_file("/b.ts").map(|sf| sf.text()),
            Some("export class B {}")
        );
        assert!(program.has_file("/x.ts"));
    }

    #[test]
    fn should_change_version_when_text_changes() {
        let mut driver = make_driver();
        let path = AbsoluteFsPath::from("/a.ts");
        let before = driver.get_source_file_version(&path);
        driver.update_files(updates(&[("/a.ts", "export class A2 {}")]), UpdateMode::Incremental);
        let after = driver.get_source_file_version(&path);

        assert!(before.is_some());
        assert_ne!(before, after);
        assert_eq!(driver.get_source_file_version(&AbsoluteFsPath::from("/nope.ts")), None);
    }

    #[test]
    fn should_report_inline_support() {
        assert!(make_driver().supports_inline_operations());
        assert!(!make_driver()
            .with_inline_support(false)
            .supports_inline_operations());
    }
}
