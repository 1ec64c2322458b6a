// TCB Utilities
//
// Decides where a component's type check block and its directives' type constructors can
// be placed.

use super::environment::emit_type_bound;
use super::reference_emitter::ReferenceEmitter;
use crate::ngtsc::file_system::AbsoluteFsPath;
use crate::ngtsc::reflection::{ClassDeclaration, ClassRef};
use crate::ngtsc::typecheck::api::{PipeMeta, TypeCheckableDirectiveMeta, TypeCheckingConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcbInliningRequirement {
    /// The block references something that can only be named from the component's own
    /// file.
    MustInline,
    /// The block could live in the shim, but only with the component's generic bounds
    /// widened to `any`.
    ShouldInlineForGenericBounds,
    None,
}

/// Where the block of `component` has to go when it would otherwise be placed in
/// `shim_file`.
pub fn requires_inline_type_check_block(
    component: &ClassDeclaration,
    shim_file: &AbsoluteFsPath,
    used_pipes: &[&PipeMeta],
    emitter: &dyn ReferenceEmitter,
) -> TcbInliningRequirement {
    if emitter.emit(&component.class_ref, shim_file).is_none() {
        return TcbInliningRequirement::MustInline;
    }
    if used_pipes
        .iter()
        .any(|pipe| emitter.emit(&pipe.class_ref, shim_file).is_none())
    {
        return TcbInliningRequirement::MustInline;
    }
    if !check_if_generic_type_bounds_can_be_emitted(component, shim_file) {
        return TcbInliningRequirement::ShouldInlineForGenericBounds;
    }
    TcbInliningRequirement::None
}

/// Whether every generic bound of `class` can be reproduced in `context`.
pub fn check_if_generic_type_bounds_can_be_emitted(class: &ClassDeclaration, context: &AbsoluteFsPath) -> bool {
    let declaring = &class.class_ref.file;
    class.type_parameters().iter().all(|param| match &param.bound {
        Some(bound) => emit_type_bound(bound, declaring, context, &mut |_| String::from("i")).is_some(),
        None => true,
    })
}

/// Whether `dir` needs an inline `ngTypeCtor` to be constructed from a block in
/// `context`. Only generic directives get type constructors at all.
pub fn requires_inline_type_ctor(
    dir: &TypeCheckableDirectiveMeta,
    context: &AbsoluteFsPath,
    emitter: &dyn ReferenceEmitter,
) -> bool {
    dir.is_generic()
        && (emitter.emit(dir.class_ref(), context).is_none()
            || !check_if_generic_type_bounds_can_be_emitted(&dir.class, context))
}

/// Whether an inline type constructor may be written into `class`'s file.
pub fn can_inline_into(class: &ClassRef, config: &TypeCheckingConfig) -> bool {
    config.use_inline_type_constructors && !class.is_declaration_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ngtsc::reflection::{TypeBound, TypeParameter, TypeReferenceOrigin};
    use crate::ngtsc::typecheck::src::reference_emitter::LocalOrImportEmitter;

    fn shim() -> AbsoluteFsPath {
        AbsoluteFsPath::from("/app.ngtypecheck.ts")
    }

    #[test]
    fn test_unexported_component_must_inline() {
        let cmp = ClassDeclaration::new(ClassRef::new("AppCmp", "/app.ts").unexported());
        assert_eq!(
            requires_inline_type_check_block(&cmp, &shim(), &[], &LocalOrImportEmitter),
            TcbInliningRequirement::MustInline
        );
    }

    #[test]
    fn test_unexported_pipe_must_inline() {
        let cmp = ClassDeclaration::new(ClassRef::new("AppCmp", "/app.ts"));
        let pipe = PipeMeta::new("fmt", ClassRef::new("FmtPipe", "/app.ts").unexported());
        assert_eq!(
            requires_inline_type_check_block(&cmp, &shim(), &[&pipe], &LocalOrImportEmitter),
            TcbInliningRequirement::MustInline
        );
    }

    #[test]
    fn test_private_bound_should_inline() {
        let cmp = ClassDeclaration::new(ClassRef::new("AppCmp", "/app.ts")).with_type_parameters(vec![
            TypeParameter::new(
                "T",
                Some(TypeBound::reference("Secret", TypeReferenceOrigin::Local { exported: false })),
            ),
        ]);
        assert_eq!(
            requires_inline_type_check_block(&cmp, &shim(), &[], &LocalOrImportEmitter),
            TcbInliningRequirement::ShouldInlineForGenericBounds
        );
    }

    #[test]
    fn test_plain_component_goes_to_shim() {
        let cmp = ClassDeclaration::new(ClassRef::new("AppCmp", "/app.ts"));
        assert_eq!(
            requires_inline_type_check_block(&cmp, &shim(), &[], &LocalOrImportEmitter),
            TcbInliningRequirement::None
        );
    }
}
