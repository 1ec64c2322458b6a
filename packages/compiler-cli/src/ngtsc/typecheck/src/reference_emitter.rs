// Reference Emission
//
// Decides how synthesized code in one file refers to a class declared somewhere else.

use crate::ngtsc::file_system::{relative_import, AbsoluteFsPath};
use crate::ngtsc::reflection::ClassRef;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmittedReference {
    /// The class is in scope under `name` already.
    Local(String),
    /// The class has to be imported as `symbol_name` from `module_specifier`.
    Imported {
        module_specifier: String,
        symbol_name: String,
    },
}

pub trait ReferenceEmitter {
    /// How to refer to `class` from code placed in `context`, or `None` if it cannot be
    /// referred to from there at all.
    fn emit(&self, class: &ClassRef, context: &AbsoluteFsPath) -> Option<EmittedReference>;
}

/// Refers to classes in the same file directly, to classes of other modules through
/// their owning module, and to exported classes of the program through relative imports.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalOrImportEmitter;

impl ReferenceEmitter for LocalOrImportEmitter {
    fn emit(&self, class: &ClassRef, context: &AbsoluteFsPath) -> Option<EmittedReference> {
        if &class.file == context {
            return Some(EmittedReference::Local(class.name.clone()));
        }
        if let Some(module) = &class.owning_module {
            return Some(EmittedReference::Imported {
                module_specifier: module.clone(),
                symbol_name: class.name.clone(),
            });
        }
        if class.exported {
            return Some(EmittedReference::Imported {
                module_specifier: relative_import(context, &class.file),
                symbol_name: class.name.clone(),
            });
        }
        None
    }
}
