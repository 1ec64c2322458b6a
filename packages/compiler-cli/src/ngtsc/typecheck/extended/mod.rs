//! Extended template diagnostics: opinionated checks that run over a template after it
//! has been type-checked and report patterns that are legal but almost certainly wrong.

pub mod api;
pub mod checks;
pub mod extended_template_checker;

pub use api::{
    DiagnosticCategoryLabel, ExtendedDiagnosticsOptions, TemplateCheck, TemplateCheckFactory, TemplateContext,
};
pub use checks::ALL_DIAGNOSTIC_FACTORIES;
pub use extended_template_checker::ExtendedTemplateCheckerImpl;
