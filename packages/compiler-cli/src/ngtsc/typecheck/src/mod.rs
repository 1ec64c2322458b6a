// TypeCheck Source Module

pub mod checker;
pub mod comments;
pub mod completion;
pub mod context;
pub mod diagnostics;
pub mod dom;
pub mod environment;
pub mod expression;
pub mod line_mappings;
pub mod oob;
pub mod reference_emitter;
pub mod source;
pub mod tcb_util;
pub mod template_symbol_builder;
pub mod ts_ast;
pub mod type_check_block;
pub mod type_check_file;
pub mod type_constructor;

// Re-exports
pub use checker::{ComponentRegistration, TemplateTypeCheckerImpl};
pub use comments::{
    find_all_matching_nodes, find_first_matching_node, read_span_comment, ExpressionIdentifier,
    FindOptions,
};
pub use completion::CompletionEngine;
pub use context::{
    FileTypeCheckingData, InliningMode, SynthesizedFile, TemplateData, TemplateInput, TypeCheckContextImpl,
};
pub use diagnostics::{should_report_diagnostic, translate_diagnostic};
pub use dom::{DomSchemaChecker, RegistryDomSchemaChecker};
pub use environment::Environment;
pub use oob::{OutOfBandDiagnosticRecorder, OutOfBandDiagnosticRecorderImpl};
pub use reference_emitter::{EmittedReference, LocalOrImportEmitter, ReferenceEmitter};
pub use source::{TemplateSource, TemplateSourceManager};
pub use template_symbol_builder::{HostTypes, SymbolBuilder, TcbPlacement};
pub use tcb_util::{requires_inline_type_check_block, TcbInliningRequirement};
pub use type_check_block::{generate_type_check_block, TcbGenericContextBehavior};
pub use type_check_file::TypeCheckFile;
