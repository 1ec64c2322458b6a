//! Parse Utilities
//!
//! Source files, locations and spans of template text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParseSourceFile {
    pub content: String,
    pub url: String,
}

impl ParseSourceFile {
    pub fn new(content: impl Into<String>, url: impl Into<String>) -> Self {
        ParseSourceFile {
            content: content.into(),
            url: url.into(),
        }
    }

    /// Computes the zero-based line and column of `offset`.
    pub fn line_and_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.content.len());
        let before = &self.content.as_bytes()[..offset];
        let line = before.iter().filter(|&&b| b == b'\n').count();
        let col = match before.iter().rposition(|&b| b == b'\n') {
            Some(nl) => offset - nl - 1,
            None => offset,
        };
        (line, col)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParseLocation {
    pub file: Arc<ParseSourceFile>,
    pub offset: usize,
    pub line: usize,
    pub col: usize,
}

impl ParseLocation {
    pub fn new(file: Arc<ParseSourceFile>, offset: usize, line: usize, col: usize) -> Self {
        ParseLocation {
            file,
            offset,
            line,
            col,
        }
    }

    /// Builds a location for `offset`, deriving line and column from the file content.
    pub fn at(file: Arc<ParseSourceFile>, offset: usize) -> Self {
        let (line, col) = file.line_and_col(offset);
        ParseLocation {
            file,
            offset,
            line,
            col,
        }
    }
}

impl fmt::Display for ParseLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.file.url, self.line, self.col)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParseSourceSpan {
    pub start: ParseLocation,
    pub end: ParseLocation,
    pub details: Option<String>,
}

impl ParseSourceSpan {
    pub fn new(start: ParseLocation, end: ParseLocation) -> Self {
        ParseSourceSpan {
            start,
            end,
            details: None,
        }
    }

    /// Span covering `start..end` of `file`.
    pub fn from_offsets(file: &Arc<ParseSourceFile>, start: usize, end: usize) -> Self {
        ParseSourceSpan::new(
            ParseLocation::at(file.clone(), start),
            ParseLocation::at(file.clone(), end),
        )
    }

    pub fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }

    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The template text the span covers.
    pub fn text(&self) -> &str {
        let content = &self.start.file.content;
        let end = self.end.offset.min(content.len());
        let start = self.start.offset.min(end);
        &content[start..end]
    }
}

impl fmt::Display for ParseSourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseErrorLevel {
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseError {
    pub span: ParseSourceSpan,
    pub msg: String,
    pub level: ParseErrorLevel,
}

impl ParseError {
    pub fn new(span: ParseSourceSpan, msg: String) -> Self {
        ParseError {
            span,
            msg,
            level: ParseErrorLevel::Error,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.msg, self.span.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_line_and_col() {
        let file = ParseSourceFile::new("<div>\n  {{a}}\n</div>", "t.html");
        assert_eq!(file.line_and_col(0), (0, 0));
        assert_eq!(file.line_and_col(8), (1, 2));
        assert_eq!(file.line_and_col(100), (2, 6));
    }

    #[test]
    fn span_text_covers_offsets() {
        let file = Arc::new(ParseSourceFile::new("<b>{{ name }}</b>", "t.html"));
        let span = ParseSourceSpan::from_offsets(&file, 6, 10);
        assert_eq!(span.text(), "name");
        assert_eq!(span.len(), 4);
        assert_eq!(span.start.to_string(), "t.html@0:6");
    }
}
