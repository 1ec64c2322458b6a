// TypeCheck API
//
// Public API types for template type-checking.

use std::fmt;
use std::sync::Arc;

use angular_compiler::render3::view::t2_api::{DirectiveMeta, InputOutputPropertySet};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts::DiagnosticCategory;

use crate::ngtsc::file_system::AbsoluteFsPath;
use crate::ngtsc::incremental::IncrementalError;
use crate::ngtsc::reflection::{ClassDeclaration, ClassRef};

/// Identifies one type check block, unique within its component's file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(String);

impl TemplateId {
    pub fn new(index: usize) -> Self {
        TemplateId(format!("tcb{}", index))
    }

    /// Accepts only ids of the `tcbN` shape.
    pub fn parse(text: &str) -> Option<Self> {
        let digits = text.strip_prefix("tcb")?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(TemplateId(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Configuration for type-checking.
///
/// Deserializes from the camelCase option names used in `angularCompilerOptions`; any
/// option left out takes its full-checking default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypeCheckingConfig {
    /// Whether to descend into template bodies (`<ng-template>` children).
    pub check_template_bodies: bool,
    /// Whether input bindings are checked against the directive's input types. When off,
    /// bound expressions are cast to `any`.
    pub check_type_of_input_bindings: bool,
    /// Whether `private`/`protected`/`readonly` inputs are assigned directly, which makes
    /// the host report the access violation.
    pub honor_access_modifiers_for_input_bindings: bool,
    /// Whether `null`/`undefined` flow into inputs unchanged. When off, bindings get a
    /// non-null assertion.
    pub strict_null_input_bindings: bool,
    /// Whether bindings to DOM properties are checked against the element's type.
    pub check_type_of_dom_bindings: bool,
    /// Whether directive outputs are subscribed with the real event type.
    pub check_type_of_output_events: bool,
    /// Whether DOM events infer `$event` from `addEventListener`.
    pub check_type_of_dom_events: bool,
    /// Whether references to DOM elements get the element's type.
    pub check_type_of_dom_references: bool,
    /// Whether references to directives and templates get a precise type.
    pub check_type_of_non_dom_references: bool,
    /// Whether pipe `transform` calls are checked.
    pub check_type_of_pipes: bool,
    /// Whether `a?.b` keeps its `undefined` in the result type.
    pub strict_safe_navigation_types: bool,
    /// Whether `ngTemplateContextGuard` narrows template contexts.
    pub apply_template_context_guards: bool,
    /// Whether the component's generic parameters are reproduced on the block.
    pub use_context_generic_type: bool,
    /// Whether generic directives may get inline type constructors.
    pub use_inline_type_constructors: bool,
    /// Whether locals nobody reads are still declared, so the host checks them too.
    pub check_unreferenced_locals: bool,
    /// Whether blocks carry what the template type checker's symbol and completion
    /// queries need, such as the anchor for component context completions.
    pub enable_template_type_checker: bool,
}

impl Default for TypeCheckingConfig {
    fn default() -> Self {
        Self {
            check_template_bodies: true,
            check_type_of_input_bindings: true,
            honor_access_modifiers_for_input_bindings: true,
            strict_null_input_bindings: true,
            check_type_of_dom_bindings: false,
            check_type_of_output_events: true,
            check_type_of_dom_events: true,
            check_type_of_dom_references: true,
            check_type_of_non_dom_references: true,
            check_type_of_pipes: true,
            strict_safe_navigation_types: true,
            apply_template_context_guards: true,
            use_context_generic_type: true,
            use_inline_type_constructors: true,
            check_unreferenced_locals: false,
            enable_template_type_checker: false,
        }
    }
}

impl TypeCheckingConfig {
    /// The relaxed configuration used when strict template checking is off.
    pub fn basic() -> Self {
        Self {
            check_template_bodies: false,
            check_type_of_input_bindings: false,
            honor_access_modifiers_for_input_bindings: false,
            strict_null_input_bindings: false,
            check_type_of_dom_bindings: false,
            check_type_of_output_events: false,
            check_type_of_dom_events: false,
            check_type_of_dom_references: false,
            check_type_of_non_dom_references: false,
            check_type_of_pipes: false,
            strict_safe_navigation_types: false,
            apply_template_context_guards: false,
            use_context_generic_type: false,
            use_inline_type_constructors: true,
            check_unreferenced_locals: false,
            enable_template_type_checker: false,
        }
    }
}

bitflags! {
    /// Properties of a directive input that change how a binding to it is checked.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InputFlags: u8 {
        const REQUIRED = 1 << 0;
        /// Backed by a signal input; writes go through the signal's write type.
        const SIGNAL = 1 << 1;
        /// Accepts a wider type through a static `ngAcceptInputType_` member.
        const COERCED = 1 << 2;
        /// Declared `private`, `protected` or `readonly`.
        const RESTRICTED = 1 << 3;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyMapping {
    pub class_property_name: String,
    pub binding_property_name: String,
    pub flags: InputFlags,
}

impl PropertyMapping {
    pub fn is_required(&self) -> bool {
        self.flags.contains(InputFlags::REQUIRED)
    }

    /// Whether the class property name has to be accessed with `["..."]`.
    pub fn needs_string_literal_access(&self) -> bool {
        let mut chars = self.class_property_name.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$');
        !(valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$'))
    }
}

/// The inputs or outputs of a directive: class properties and the names templates bind
/// them by, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ClassPropertyMapping {
    mappings: Vec<PropertyMapping>,
}

impl ClassPropertyMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, class_property_name: &str, binding_property_name: &str, flags: InputFlags) {
        self.mappings.push(PropertyMapping {
            class_property_name: class_property_name.to_string(),
            binding_property_name: binding_property_name.to_string(),
            flags,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyMapping> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// All class properties bound by `name`. Several properties may share a binding name.
    pub fn get_by_binding_property_name(&self, name: &str) -> Vec<&PropertyMapping> {
        self.mappings
            .iter()
            .filter(|m| m.binding_property_name == name)
            .collect()
    }

    pub fn get_by_class_property_name(&self, name: &str) -> Option<&PropertyMapping> {
        self.mappings.iter().find(|m| m.class_property_name == name)
    }

    pub fn binding_property_names(&self) -> impl Iterator<Item = &str> {
        self.mappings.iter().map(|m| m.binding_property_name.as_str())
    }
}

impl InputOutputPropertySet for ClassPropertyMapping {
    fn has_binding_property_name(&self, property_name: &str) -> bool {
        self.mappings
            .iter()
            .any(|m| m.binding_property_name == property_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateGuardType {
    /// The bound expression itself narrows: `if (expr) { ... }`.
    Binding,
    /// A static `ngTemplateGuard_input(dir, expr)` type predicate narrows.
    Invocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateGuardMeta {
    pub input_name: String,
    pub type_: TemplateGuardType,
}

/// Everything the type-checker needs to know about a directive or component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeCheckableDirectiveMeta {
    pub name: String,
    pub class: ClassDeclaration,
    pub selector: Option<String>,
    pub is_component: bool,
    pub is_structural: bool,
    pub export_as: Vec<String>,
    pub inputs: ClassPropertyMapping,
    pub outputs: ClassPropertyMapping,
    pub ng_template_guards: Vec<TemplateGuardMeta>,
    pub has_ng_template_context_guard: bool,
}

impl TypeCheckableDirectiveMeta {
    pub fn directive(class: ClassDeclaration, selector: &str) -> Self {
        Self {
            name: class.class_ref.name.clone(),
            class,
            selector: Some(selector.to_string()),
            is_component: false,
            is_structural: false,
            export_as: Vec::new(),
            inputs: ClassPropertyMapping::new(),
            outputs: ClassPropertyMapping::new(),
            ng_template_guards: Vec::new(),
            has_ng_template_context_guard: false,
        }
    }

    pub fn component(class: ClassDeclaration, selector: &str) -> Self {
        Self {
            is_component: true,
            ..Self::directive(class, selector)
        }
    }

    pub fn with_input(self, name: &str) -> Self {
        self.with_input_flags(name, name, InputFlags::empty())
    }

    pub fn with_input_flags(mut self, class_property: &str, binding: &str, flags: InputFlags) -> Self {
        self.inputs.insert(class_property, binding, flags);
        self
    }

    pub fn with_output(mut self, class_property: &str, binding: &str) -> Self {
        self.outputs.insert(class_property, binding, InputFlags::empty());
        self
    }

    pub fn with_export_as(mut self, name: &str) -> Self {
        self.export_as.push(name.to_string());
        self
    }

    pub fn with_template_guard(mut self, input_name: &str, type_: TemplateGuardType) -> Self {
        self.ng_template_guards.push(TemplateGuardMeta {
            input_name: input_name.to_string(),
            type_,
        });
        self
    }

    pub fn with_context_guard(mut self) -> Self {
        self.has_ng_template_context_guard = true;
        self
    }

    pub fn structural(mut self) -> Self {
        self.is_structural = true;
        self
    }

    pub fn class_ref(&self) -> &ClassRef {
        &self.class.class_ref
    }

    pub fn is_generic(&self) -> bool {
        self.class.is_generic()
    }
}

impl DirectiveMeta for TypeCheckableDirectiveMeta {
    fn name(&self) -> &str {
        &self.name
    }
    fn selector(&self) -> Option<&str> {
        self.selector.as_deref()
    }
    fn is_component(&self) -> bool {
        self.is_component
    }
    fn inputs(&self) -> &dyn InputOutputPropertySet {
        &self.inputs
    }
    fn outputs(&self) -> &dyn InputOutputPropertySet {
        &self.outputs
    }
    fn export_as(&self) -> &[String] {
        &self.export_as
    }
    fn is_structural(&self) -> bool {
        self.is_structural
    }
}

/// Directives are shared between the binding graph and every block that uses them.
pub type DirectiveRef = Arc<TypeCheckableDirectiveMeta>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipeMeta {
    pub name: String,
    pub class_ref: ClassRef,
}

impl PipeMeta {
    pub fn new(name: &str, class_ref: ClassRef) -> Self {
        Self {
            name: name.to_string(),
            class_ref,
        }
    }
}

/// A secondary location of a template diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRelatedInformation {
    pub file: String,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// A diagnostic located in a component template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDiagnostic {
    pub template_id: TemplateId,
    /// The template file, or the component's file for diagnostics about the component.
    pub file: String,
    pub start: usize,
    pub length: usize,
    pub category: DiagnosticCategory,
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_information: Vec<TemplateRelatedInformation>,
}

/// Internal failures of type-checking. These abort the compilation attempt; problems in
/// user templates are reported as `TemplateDiagnostic`s instead.
#[derive(Debug, Error)]
pub enum TypeCheckError {
    #[error("AssertionError: could not resolve {target} in the scope of {template_id}")]
    UnresolvedScopeLookup { template_id: TemplateId, target: String },

    #[error("AssertionError: unable to emit a reference to {class} from {context}")]
    UnemittableReference { class: String, context: AbsoluteFsPath },

    #[error("AssertionError: {class} requires an inline type constructor")]
    InlineTypeCtorRequired { class: String },

    #[error("AssertionError: inline operations overlap at offset {offset} of {file}")]
    OverlappingInlineOps { file: AbsoluteFsPath, offset: usize },

    #[error("AssertionError: inline operation at offset {offset} lies outside {file}")]
    InvalidInlineOffset { file: AbsoluteFsPath, offset: usize },

    #[error("AssertionError: {0} is not part of the program")]
    MissingSourceFile(AbsoluteFsPath),

    #[error(transparent)]
    Incremental(#[from] IncrementalError),

    #[error(transparent)]
    Host(#[from] anyhow::Error),
}
