// DOM Schema Checking
//
// Element names and property bindings that no directive claims are validated against
// the DOM schema.

use std::collections::HashSet;
use std::sync::Arc;

use angular_compiler::core::SchemaMetadata;
use angular_compiler::parse_util::ParseSourceSpan;
use angular_compiler::render3::r3_ast::Element;
use angular_compiler::schema::{DomElementSchemaRegistry, ElementSchemaRegistry};
use ts::DiagnosticCategory;

use super::diagnostics::make_template_diagnostic;
use crate::ngtsc::diagnostics::{ng_error_code, ErrorCode};
use crate::ngtsc::typecheck::api::{TemplateDiagnostic, TemplateId};

pub trait DomSchemaChecker {
    fn diagnostics(&self) -> &[TemplateDiagnostic];

    /// Reports `element` if its tag is not a known DOM element.
    fn check_element(&mut self, template_id: &TemplateId, element: &Element, schemas: &[SchemaMetadata]);

    /// Reports a binding to `name` if it is not a known property of `element`.
    fn check_property(
        &mut self,
        template_id: &TemplateId,
        element: &Element,
        name: &str,
        span: &ParseSourceSpan,
        schemas: &[SchemaMetadata],
    );
}

/// Checks against an `ElementSchemaRegistry`; each element is reported at most once.
#[derive(Clone)]
pub struct RegistryDomSchemaChecker {
    registry: Arc<dyn ElementSchemaRegistry + Send + Sync>,
    diagnostics: Vec<TemplateDiagnostic>,
    reported_elements: HashSet<(TemplateId, usize)>,
}

impl RegistryDomSchemaChecker {
    pub fn new(registry: Arc<dyn ElementSchemaRegistry + Send + Sync>) -> Self {
        Self {
            registry,
            diagnostics: Vec::new(),
            reported_elements: HashSet::new(),
        }
    }

    pub fn into_diagnostics(self) -> Vec<TemplateDiagnostic> {
        self.diagnostics
    }
}

impl Default for RegistryDomSchemaChecker {
    fn default() -> Self {
        Self::new(Arc::new(DomElementSchemaRegistry::new()))
    }
}

impl DomSchemaChecker for RegistryDomSchemaChecker {
    fn diagnostics(&self) -> &[TemplateDiagnostic] {
        &self.diagnostics
    }

    fn check_element(&mut self, template_id: &TemplateId, element: &Element, schemas: &[SchemaMetadata]) {
        let name = element.name.as_str();
        if self.registry.has_element(name, schemas) {
            return;
        }
        if !self
            .reported_elements
            .insert((template_id.clone(), element.start_source_span.start.offset))
        {
            return;
        }

        let mut message = format!("'{}' is not a known element:\n", name);
        message.push_str(&format!(
            "1. If '{}' is an Angular component, then verify that it is included in the '@Component.imports' of this component.\n",
            name
        ));
        if name.contains('-') {
            message.push_str(&format!(
                "2. If '{}' is a Web Component then add 'CUSTOM_ELEMENTS_SCHEMA' to the '@Component.schemas' of this component to suppress this message.",
                name
            ));
        } else {
            message.push_str(
                "2. To allow any element add 'NO_ERRORS_SCHEMA' to the '@Component.schemas' of this component.",
            );
        }
        self.diagnostics.push(make_template_diagnostic(
            template_id,
            &element.start_source_span,
            DiagnosticCategory::Error,
            ng_error_code(ErrorCode::SchemaInvalidElement),
            message,
            Vec::new(),
        ));
    }

    fn check_property(
        &mut self,
        template_id: &TemplateId,
        element: &Element,
        name: &str,
        span: &ParseSourceSpan,
        schemas: &[SchemaMetadata],
    ) {
        if self.registry.has_property(&element.name, name, schemas) {
            return;
        }
        let tag = element.name.as_str();
        let mut message = format!(
            "Can't bind to '{}' since it isn't a known property of '{}'.",
            name, tag
        );
        if tag.starts_with("ng-") {
            message.push_str(&format!(
                "\n1. If '{}' is an Angular directive, then add 'CommonModule' to the '@Component.imports' of this component.\n2. To allow any property add 'NO_ERRORS_SCHEMA' to the '@Component.schemas' of this component.",
                name
            ));
        } else if tag.contains('-') {
            message.push_str(&format!(
                "\n1. If '{tag}' is an Angular component and it has '{name}' input, then verify that it is included in the '@Component.imports' of this component.\n2. If '{tag}' is a Web Component then add 'CUSTOM_ELEMENTS_SCHEMA' to the '@Component.schemas' of this component to suppress this message.\n3. To allow any property add 'NO_ERRORS_SCHEMA' to the '@Component.schemas' of this component.",
            ));
        }
        self.diagnostics.push(make_template_diagnostic(
            template_id,
            span,
            DiagnosticCategory::Error,
            ng_error_code(ErrorCode::SchemaInvalidAttribute),
            message,
            Vec::new(),
        ));
    }
}
