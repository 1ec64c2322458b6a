// Extended Template Checker

use ts::{CompilerOptions, DiagnosticCategory};

use super::api::{ExtendedDiagnosticsOptions, TemplateCheck, TemplateCheckFactory, TemplateContext};
use crate::ngtsc::reflection::ClassRef;
use crate::ngtsc::typecheck::api::{TemplateDiagnostic, TemplateTypeChecker};

/// Runs the enabled extended checks over components of a completed type-checking pass.
pub struct ExtendedTemplateCheckerImpl<'a> {
    checker: &'a dyn TemplateTypeChecker,
    checks: Vec<(Box<dyn TemplateCheck>, DiagnosticCategory)>,
}

impl<'a> ExtendedTemplateCheckerImpl<'a> {
    /// Instantiates every check in `factories` that is neither suppressed by `extended`
    /// nor inapplicable under `options`.
    pub fn new(
        checker: &'a dyn TemplateTypeChecker,
        factories: &[TemplateCheckFactory],
        options: &CompilerOptions,
        extended: &ExtendedDiagnosticsOptions,
    ) -> Self {
        let mut checks = Vec::new();
        for factory in factories {
            let Some(category) = extended.category_of(factory.name).category() else {
                tracing::debug!(check = %factory.name, "extended check suppressed");
                continue;
            };
            if let Some(check) = (factory.create)(options) {
                checks.push((check, category));
            }
        }
        Self { checker, checks }
    }

    pub fn get_diagnostics_for_component(&self, component: &ClassRef) -> Vec<TemplateDiagnostic> {
        let Some(template) = self.checker.get_template(component) else {
            return Vec::new();
        };
        let mut diagnostics = Vec::new();
        for (check, category) in &self.checks {
            let ctx = TemplateContext {
                checker: self.checker,
                component,
                category: *category,
                code: check.code(),
            };
            diagnostics.extend(check.run(&ctx, template));
        }
        diagnostics
    }
}
