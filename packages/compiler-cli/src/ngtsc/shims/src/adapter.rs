// Shim Adapter
//
// Produces the placeholder text of every shim for the original files of a program.
// Type-checking later replaces the type-check shim's text with the real blocks.

use indexmap::IndexMap;
use ts::Program;

use super::util::{is_shim, make_shim_file_name, ShimType};
use crate::ngtsc::file_system::AbsoluteFsPath;

/// Generated shim file.
#[derive(Debug, Clone, PartialEq)]
pub struct ShimFile {
    pub file_name: AbsoluteFsPath,
    pub original: AbsoluteFsPath,
    pub content: String,
    pub shim_type: ShimType,
}

pub struct ShimAdapter {
    shim_types: Vec<ShimType>,
}

impl ShimAdapter {
    pub fn new(shim_types: Vec<ShimType>) -> Self {
        Self { shim_types }
    }

    /// Shims for every original, non-declaration file of `program`, in program order.
    pub fn generate(&self, program: &Program) -> IndexMap<AbsoluteFsPath, ShimFile> {
        let mut shims = IndexMap::new();
        for sf in program.get_source_files() {
            if sf.is_declaration_file || is_shim(&sf.file_name) {
                continue;
            }
            let original = AbsoluteFsPath::from(sf.file_name.as_str());
            for &shim_type in &self.shim_types {
                let shim = self.generate_shim(&original, shim_type);
                shims.insert(shim.file_name.clone(), shim);
            }
        }
        shims
    }

    pub fn generate_shim(&self, original: &AbsoluteFsPath, shim_type: ShimType) -> ShimFile {
        ShimFile {
            file_name: make_shim_file_name(original, shim_type),
            original: original.clone(),
            content: placeholder_content(shim_type).to_string(),
            shim_type,
        }
    }
}

impl Default for ShimAdapter {
    fn default() -> Self {
        Self::new(vec![ShimType::TypeCheck])
    }
}

fn placeholder_content(shim_type: ShimType) -> &'static str {
    match shim_type {
        ShimType::TypeCheck => "export const USED_FOR_NG_TYPE_CHECKING = true;\n",
        ShimType::Factory => "export const \u{0275}NonEmptyModule = true;\n",
    }
}
