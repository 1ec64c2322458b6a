//! TypeScript-compatible interfaces and types for the Angular compiler.
//! This crate is the boundary to the host type system: the diagnostic shapes it reports,
//! the in-memory program it checks and the checker capability itself.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod program;
pub mod type_checker;

pub use program::*;
pub use type_checker::*;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Suggestion,
    Message,
}

// --- Diagnostic Structures ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiagnosticMessageChain {
    String(String),
    Chain {
        message_text: String,
        category: DiagnosticCategory,
        code: i32,
        next: Option<Vec<DiagnosticMessageChain>>,
    },
}

impl DiagnosticMessageChain {
    pub fn new(message: impl Into<String>) -> Self {
        Self::String(message.into())
    }

    /// Flattens the chain into a single message, indenting nested entries the way
    /// `ts.flattenDiagnosticMessageText` does.
    pub fn flatten(&self) -> String {
        let mut out = String::new();
        self.flatten_into(&mut out, 0);
        out
    }

    fn flatten_into(&self, out: &mut String, depth: usize) {
        if depth > 0 {
            out.push('\n');
            out.push_str(&"  ".repeat(depth));
        }
        match self {
            DiagnosticMessageChain::String(s) => out.push_str(s),
            DiagnosticMessageChain::Chain {
                message_text, next, ..
            } => {
                out.push_str(message_text);
                for chain in next.iter().flatten() {
                    chain.flatten_into(out, depth + 1);
                }
            }
        }
    }
}

impl From<String> for DiagnosticMessageChain {
    fn from(s: String) -> Self {
        DiagnosticMessageChain::String(s)
    }
}

impl From<&str> for DiagnosticMessageChain {
    fn from(s: &str) -> Self {
        DiagnosticMessageChain::String(s.to_string())
    }
}

impl fmt::Display for DiagnosticMessageChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticMessageChain::String(s) => write!(f, "{}", s),
            DiagnosticMessageChain::Chain { message_text, .. } => write!(f, "{}", message_text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticRelatedInformation {
    pub category: DiagnosticCategory,
    pub code: i32,
    pub file: Option<String>,
    pub start: Option<usize>,
    pub length: Option<usize>,
    pub message_text: String,
}

/// A diagnostic as reported by the host type checker. Positions are offsets into the text
/// of `file` as the host saw it (which for synthesized files is the synthetic text).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: i32,
    pub file: Option<String>,
    pub start: usize,
    pub length: usize,
    pub message_text: DiagnosticMessageChain,
    pub related_information: Option<Vec<DiagnosticRelatedInformation>>,
}

impl Diagnostic {
    pub fn error(file: impl Into<String>, start: usize, length: usize, code: i32, message: impl Into<String>) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            code,
            file: Some(file.into()),
            start,
            length,
            message_text: DiagnosticMessageChain::String(message.into()),
            related_information: None,
        }
    }
}

// --- Utilities ---

pub fn make_diagnostic_chain(
    message_text: String,
    next: Option<Vec<DiagnosticMessageChain>>,
) -> DiagnosticMessageChain {
    DiagnosticMessageChain::Chain {
        category: DiagnosticCategory::Message,
        code: 0,
        message_text,
        next,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_nested_chains() {
        let chain = make_diagnostic_chain(
            "Type 'A' is not assignable to type 'B'.".to_string(),
            Some(vec![DiagnosticMessageChain::new("Property 'x' is missing.")]),
        );
        assert_eq!(
            chain.flatten(),
            "Type 'A' is not assignable to type 'B'.\n  Property 'x' is missing."
        );
        assert_eq!(chain.to_string(), "Type 'A' is not assignable to type 'B'.");
    }

    #[test]
    fn reports_nullable_union_types() {
        let optional = HostType::new("string | undefined", TypeFlags::UNION | TypeFlags::STRING | TypeFlags::UNDEFINED);
        assert!(optional.is_nullable());
        assert!(!optional.is_any_or_unknown());

        let plain = HostType::new("string", TypeFlags::STRING);
        assert!(!plain.is_nullable());
        assert!(HostType::new("any", TypeFlags::ANY).is_any_or_unknown());
    }

    #[test]
    fn closure_hosts_answer_no_type_queries() {
        let host = |_: &Program, _: &SourceFile| -> anyhow::Result<Vec<Diagnostic>> { Ok(Vec::new()) };
        let file = SourceFile::new("/a.ts", "let a = 1;");
        let program = Program::new(CompilerOptions::default(), [file.clone()]);
        assert_eq!(host.get_type_at_range(&program, &file, 4, 5), None);
    }
}
