use super::*;

#[test]
fn test_clean_path() {
    assert_eq!(clean_path("/a/./b/../c.ts"), "/a/c.ts");
    assert_eq!(clean_path("a//b"), "a/b");
    assert_eq!(clean_path("C:\\x\\y"), "C:/x/y");
}

#[test]
fn test_dirname_and_basename() {
    assert_eq!(dirname("/app/cmp.ts"), "/app");
    assert_eq!(dirname("/cmp.ts"), "/");
    assert_eq!(basename("/app/cmp.ts", Some(".ts")).as_str(), "cmp");
    assert_eq!(basename("/app/cmp.ts", None).as_str(), "cmp.ts");
}

#[test]
fn test_resolve_relative() {
    let from = AbsoluteFsPath::from("/app/cmp.ts");
    assert_eq!(resolve_relative(&from, "./dir").as_str(), "/app/dir");
    assert_eq!(resolve_relative(&from, "../lib/x").as_str(), "/lib/x");
}

#[test]
fn test_strip_extension() {
    assert_eq!(strip_extension("/a/b.d.ts"), "/a/b");
    assert_eq!(strip_extension("/a/b.ts"), "/a/b");
    assert_eq!(strip_extension("/a/b.js"), "/a/b");
}

#[test]
fn test_relative_import() {
    let from = AbsoluteFsPath::from("/app/cmp.ngtypecheck.ts");
    assert_eq!(
        relative_import(&from, &AbsoluteFsPath::from("/app/dir.ts")),
        "./dir"
    );
    assert_eq!(
        relative_import(&from, &AbsoluteFsPath::from("/lib/shared/dir.ts")),
        "../lib/shared/dir"
    );
}
