use super::*;

#[test]
fn test_error_code_mapping() {
    assert_eq!(ng_error_code(ErrorCode::SchemaInvalidElement), -998001);
    assert_eq!(ng_error_code(ErrorCode::MissingReferenceTarget), -998003);
    assert_eq!(ng_error_code(ErrorCode::InlineTypeCtorRequired), -998901);
    assert!(is_ng_error_code(ng_error_code(ErrorCode::MissingPipe)));
    assert!(!is_ng_error_code(2322));
}

#[test]
fn test_replace_ts_with_ng() {
    let input = "\u{001b}[31mTS-998003: \u{001b}[0mNo directive found with exportAs 'x'.";
    let expected = "\u{001b}[31mNG8003: \u{001b}[0mNo directive found with exportAs 'x'.";
    assert_eq!(replace_ts_with_ng_in_errors(input), expected);
}

#[test]
fn test_make_diagnostic() {
    let related = make_related_information("a.html", 4, 3, "first declared here");
    let diag = make_diagnostic(
        ErrorCode::DuplicateVariableDeclaration,
        "a.html",
        10,
        4,
        "Cannot redeclare variable 'item'.",
        Some(vec![related.clone()]),
        DiagnosticCategory::Error,
    );
    assert_eq!(diag.code, -998006);
    assert_eq!(diag.file.as_deref(), Some("a.html"));
    assert_eq!(diag.related_information, Some(vec![related]));
    assert_eq!(diag.message_text.flatten(), "Cannot redeclare variable 'item'.");
}
