//! Reflection over the program's TypeScript sources: which classes a file declares,
//! whether they are exported, and what their generic parameters are bounded by.

pub mod src {
    pub mod host;
    pub mod typescript;
}

pub use src::host::{
    BoundTypeReference, ClassDeclaration, ClassRef, ReflectionHost, TypeBound, TypeParameter,
    TypeReferenceOrigin,
};
pub use src::typescript::TypeScriptReflectionHost;

#[cfg(test)]
mod test;
