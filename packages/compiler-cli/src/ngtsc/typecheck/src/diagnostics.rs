// TypeCheck Diagnostics
//
// Building template diagnostics, and translating the host checker's diagnostics on
// synthesized code back into template locations.

use angular_compiler::parse_util::ParseSourceSpan;
use ts::{Diagnostic, DiagnosticCategory, DiagnosticRelatedInformation};

use super::comments::{has_ignore_for_diagnostics_marker, read_span_comment, read_template_id};
use super::source::TemplateSourceManager;
use super::ts_ast::SyntheticSourceMap;
use crate::ngtsc::typecheck::api::{TemplateDiagnostic, TemplateId, TemplateRelatedInformation};

/// Host codes that synthesized code produces on its own and that say nothing about the
/// template.
const IGNORED_HOST_CODES: &[i32] = &[
    // '{0}' is declared but its value is never read.
    6133,
    // All variables are unused.
    6199,
    // All imports in import declaration are unused.
    6192,
    // All destructured elements are unused.
    6198,
    // Left side of comma operator is unused and has no side effects.
    2695,
    // Parameter '{0}' implicitly has an 'any' type.
    7006,
];

pub fn make_template_diagnostic(
    template_id: &TemplateId,
    span: &ParseSourceSpan,
    category: DiagnosticCategory,
    code: i32,
    message: impl Into<String>,
    related_information: Vec<TemplateRelatedInformation>,
) -> TemplateDiagnostic {
    TemplateDiagnostic {
        template_id: template_id.clone(),
        file: span.start.file.url.clone(),
        start: span.start.offset,
        length: span.len(),
        category,
        code,
        message: message.into(),
        related_information,
    }
}

pub fn make_related_information(span: &ParseSourceSpan, text: impl Into<String>) -> TemplateRelatedInformation {
    TemplateRelatedInformation {
        file: span.start.file.url.clone(),
        start: span.start.offset,
        end: span.end.offset,
        text: text.into(),
    }
}

pub fn should_report_diagnostic(diagnostic: &Diagnostic) -> bool {
    !IGNORED_HOST_CODES.contains(&diagnostic.code)
}

/// Where a position in synthesized text points to in a template.
pub fn find_template_location(
    position: usize,
    text: &str,
    map: &SyntheticSourceMap,
    sources: &TemplateSourceManager,
) -> Option<(TemplateId, ParseSourceSpan)> {
    let tcb = map.enclosing_tcb(position)?;
    let id = read_template_id(text, tcb.start)?;
    for node in map
        .nodes_containing(position)
        .into_iter()
        .filter(|node| tcb.start <= node.start && node.end <= tcb.end)
    {
        if has_ignore_for_diagnostics_marker(text, node.end, node.comments_end) {
            return None;
        }
        if let Some(span) = read_span_comment(text, node.end, node.comments_end) {
            let span = sources.to_parse_source_span(&id, span.start, span.end)?;
            return Some((id, span));
        }
    }
    None
}

fn translate_related_information(
    info: &DiagnosticRelatedInformation,
    diagnostic_file: Option<&str>,
    text: &str,
    map: &SyntheticSourceMap,
    sources: &TemplateSourceManager,
) -> Option<TemplateRelatedInformation> {
    let start = info.start?;
    if info.file.is_some() && info.file.as_deref() == diagnostic_file {
        let (_, span) = find_template_location(start, text, map, sources)?;
        return Some(make_related_information(&span, info.message_text.clone()));
    }
    Some(TemplateRelatedInformation {
        file: info.file.clone()?,
        start,
        end: start + info.length.unwrap_or(0),
        text: info.message_text.clone(),
    })
}

/// Maps a host diagnostic reported on `text` (a shim, or a file with inline blocks) to
/// its template. `None` when the position is not covered by a span marker or sits under
/// an ignore marker.
pub fn translate_diagnostic(
    diagnostic: &Diagnostic,
    text: &str,
    map: &SyntheticSourceMap,
    sources: &TemplateSourceManager,
) -> Option<TemplateDiagnostic> {
    let (id, span) = find_template_location(diagnostic.start, text, map, sources)?;
    let related = diagnostic
        .related_information
        .iter()
        .flatten()
        .filter_map(|info| {
            translate_related_information(info, diagnostic.file.as_deref(), text, map, sources)
        })
        .collect();
    Some(make_template_diagnostic(
        &id,
        &span,
        diagnostic.category,
        diagnostic.code,
        diagnostic.message_text.flatten(),
        related,
    ))
}
