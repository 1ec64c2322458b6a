use super::error_code::ErrorCode;
use super::util::ng_error_code;
use ts::{
    make_diagnostic_chain as ts_make_diagnostic_chain, Diagnostic, DiagnosticCategory,
    DiagnosticMessageChain, DiagnosticRelatedInformation,
};

/// Builds a diagnostic for an Angular error code at a location in `file`.
pub fn make_diagnostic(
    code: ErrorCode,
    file: &str,
    start: usize,
    length: usize,
    message_text: impl Into<DiagnosticMessageChain>,
    related_information: Option<Vec<DiagnosticRelatedInformation>>,
    category: DiagnosticCategory,
) -> Diagnostic {
    Diagnostic {
        category,
        code: ng_error_code(code),
        file: Some(file.to_string()),
        start,
        length,
        message_text: message_text.into(),
        related_information,
    }
}

pub fn make_diagnostic_chain(
    message_text: String,
    next: Option<Vec<DiagnosticMessageChain>>,
) -> DiagnosticMessageChain {
    ts_make_diagnostic_chain(message_text, next)
}

/// A secondary location attached to a diagnostic, e.g. "variable first declared here".
pub fn make_related_information(
    file: &str,
    start: usize,
    length: usize,
    message_text: impl Into<String>,
) -> DiagnosticRelatedInformation {
    DiagnosticRelatedInformation {
        category: DiagnosticCategory::Message,
        code: 0,
        file: Some(file.to_string()),
        start: Some(start),
        length: Some(length),
        message_text: message_text.into(),
    }
}
