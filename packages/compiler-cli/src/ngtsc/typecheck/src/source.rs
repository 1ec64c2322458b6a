// Template Sources
//
// Keeps the text of every template a file's type check blocks were generated from, so
// offsets read back from marker comments can be turned into template locations.

use std::sync::Arc;

use angular_compiler::parse_util::{ParseLocation, ParseSourceFile, ParseSourceSpan};
use indexmap::IndexMap;
use once_cell::sync::OnceCell;

use super::line_mappings::{compute_line_starts, get_line_and_character_from_position};
use crate::ngtsc::typecheck::api::TemplateId;

/// One template's text, with line starts computed on first use.
#[derive(Debug, Clone)]
pub struct TemplateSource {
    file: Arc<ParseSourceFile>,
    line_starts: OnceCell<Vec<usize>>,
}

impl TemplateSource {
    pub fn new(file: Arc<ParseSourceFile>) -> Self {
        Self {
            file,
            line_starts: OnceCell::new(),
        }
    }

    pub fn file(&self) -> &Arc<ParseSourceFile> {
        &self.file
    }

    pub fn url(&self) -> &str {
        &self.file.url
    }

    pub fn to_parse_source_span(&self, start: usize, end: usize) -> ParseSourceSpan {
        ParseSourceSpan::new(self.location(start), self.location(end))
    }

    fn location(&self, offset: usize) -> ParseLocation {
        let line_starts = self
            .line_starts
            .get_or_init(|| compute_line_starts(&self.file.content));
        let (line, col) = get_line_and_character_from_position(line_starts, offset);
        ParseLocation::new(self.file.clone(), offset, line, col)
    }
}

/// Assigns template ids within one source file and remembers each id's template.
#[derive(Debug, Clone, Default)]
pub struct TemplateSourceManager {
    next_template_id: usize,
    templates: IndexMap<TemplateId, TemplateSource>,
}

impl TemplateSourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capture_source(&mut self, file: Arc<ParseSourceFile>) -> TemplateId {
        self.next_template_id += 1;
        let id = TemplateId::new(self.next_template_id);
        self.templates.insert(id.clone(), TemplateSource::new(file));
        id
    }

    pub fn get_source(&self, id: &TemplateId) -> Option<&TemplateSource> {
        self.templates.get(id)
    }

    pub fn to_parse_source_span(&self, id: &TemplateId, start: usize, end: usize) -> Option<ParseSourceSpan> {
        self.get_source(id)
            .map(|source| source.to_parse_source_span(start, end))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
