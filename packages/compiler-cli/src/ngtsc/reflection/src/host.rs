// Reflection Host
//
// The view of class declarations that type-checking needs. Everything is owned, so
// results outlive the parse they came from.

use crate::ngtsc::file_system::AbsoluteFsPath;

/// A class declaration as the type-checker refers to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassRef {
    pub name: String,
    /// File declaring the class.
    pub file: AbsoluteFsPath,
    pub exported: bool,
    /// Module specifier to import the class from when it is not part of the program,
    /// e.g. `@angular/common`.
    pub owning_module: Option<String>,
    /// Offset of the class name in `file`.
    pub name_start: usize,
    /// Offset just past the closing brace of the class body.
    pub node_end: usize,
}

impl ClassRef {
    pub fn new(name: impl Into<String>, file: impl Into<AbsoluteFsPath>) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            exported: true,
            owning_module: None,
            name_start: 0,
            node_end: 0,
        }
    }

    pub fn unexported(mut self) -> Self {
        self.exported = false;
        self
    }

    pub fn with_owning_module(mut self, module: impl Into<String>) -> Self {
        self.owning_module = Some(module.into());
        self
    }

    pub fn with_span(mut self, name_start: usize, node_end: usize) -> Self {
        self.name_start = name_start;
        self.node_end = node_end;
        self
    }

    pub fn is_declaration_file(&self) -> bool {
        self.file.as_str().ends_with(".d.ts")
    }
}

/// Where a type named inside a generic bound comes from, seen from the declaring file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeReferenceOrigin {
    /// Another type parameter of the same class.
    TypeParameter,
    /// Declared in the same file.
    Local { exported: bool },
    /// Brought in by a named or default import.
    Imported { module: String, imported_name: String },
    /// A namespace import, used as the qualifier of `ns.Type`.
    Namespace { module: String },
    /// Not declared or imported by the file (global types such as `Array`).
    Ambient,
}

/// A type name inside a bound, with offsets relative to the bound's text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoundTypeReference {
    pub name: String,
    pub start: usize,
    pub end: usize,
    pub origin: TypeReferenceOrigin,
}

/// The constraint of a type parameter, as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeBound {
    pub text: String,
    pub references: Vec<BoundTypeReference>,
    /// The bound uses type syntax whose references were not collected, so it can only
    /// be reproduced in its own file.
    pub opaque: bool,
}

impl TypeBound {
    /// A bound without type references, e.g. `string` or `"a" | "b"`.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            references: Vec::new(),
            opaque: false,
        }
    }

    /// A bound that is exactly one type name.
    pub fn reference(name: impl Into<String>, origin: TypeReferenceOrigin) -> Self {
        let name = name.into();
        Self {
            references: vec![BoundTypeReference {
                name: name.clone(),
                start: 0,
                end: name.len(),
                origin,
            }],
            text: name,
            opaque: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeParameter {
    pub name: String,
    pub bound: Option<TypeBound>,
}

impl TypeParameter {
    pub fn new(name: impl Into<String>, bound: Option<TypeBound>) -> Self {
        Self {
            name: name.into(),
            bound,
        }
    }
}

/// A class plus its generic signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassDeclaration {
    pub class_ref: ClassRef,
    pub type_parameters: Option<Vec<TypeParameter>>,
}

impl ClassDeclaration {
    pub fn new(class_ref: ClassRef) -> Self {
        Self {
            class_ref,
            type_parameters: None,
        }
    }

    pub fn with_type_parameters(mut self, params: Vec<TypeParameter>) -> Self {
        self.type_parameters = Some(params);
        self
    }

    pub fn is_generic(&self) -> bool {
        self.type_parameters
            .as_ref()
            .is_some_and(|params| !params.is_empty())
    }

    pub fn type_parameters(&self) -> &[TypeParameter] {
        self.type_parameters.as_deref().unwrap_or(&[])
    }
}

pub trait ReflectionHost {
    /// The top-level class `name` declared in `file`.
    fn get_class_declaration(&self, file: &AbsoluteFsPath, name: &str) -> Option<ClassDeclaration>;

    /// Every top-level named class of `file`, in declaration order.
    fn get_classes_of_file(&self, file: &AbsoluteFsPath) -> Vec<ClassDeclaration>;
}
