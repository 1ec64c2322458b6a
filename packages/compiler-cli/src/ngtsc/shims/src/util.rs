// Shim Utilities
//
// Naming rules for shim files.

use crate::ngtsc::file_system::{strip_extension, AbsoluteFsPath};

/// Kinds of shim the compiler synthesizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShimType {
    /// Holds the type check blocks of one original file.
    TypeCheck,
    /// Placeholder module kept for projects that still import factories.
    Factory,
}

impl ShimType {
    pub fn suffix(&self) -> &'static str {
        match self {
            ShimType::TypeCheck => ".ngtypecheck.ts",
            ShimType::Factory => ".ngfactory.ts",
        }
    }

    pub fn all() -> [ShimType; 2] {
        [ShimType::TypeCheck, ShimType::Factory]
    }
}

/// `/app/cmp.ts` becomes `/app/cmp.ngtypecheck.ts` (or the factory equivalent).
pub fn make_shim_file_name(original: &AbsoluteFsPath, shim_type: ShimType) -> AbsoluteFsPath {
    AbsoluteFsPath::new(format!(
        "{}{}",
        strip_extension(original.as_str()),
        shim_type.suffix()
    ))
}

/// Check if a file is a shim.
pub fn is_shim(file_path: &str) -> bool {
    shim_type_of(file_path).is_some()
}

pub fn shim_type_of(file_path: &str) -> Option<ShimType> {
    ShimType::all()
        .into_iter()
        .find(|ty| file_path.ends_with(ty.suffix()))
}

/// Get the original file for a shim.
pub fn get_original_file(shim_path: &str) -> Option<AbsoluteFsPath> {
    let shim_type = shim_type_of(shim_path)?;
    let stem = &shim_path[..shim_path.len() - shim_type.suffix().len()];
    Some(AbsoluteFsPath::new(format!("{}.ts", stem)))
}
