// Reference Tagger
//
// Records which shims belong to which original file. The association lives in an
// explicit side map owned by the caller instead of on the source files themselves.

use indexmap::IndexMap;

use super::util::{is_shim, make_shim_file_name, ShimType};
use crate::ngtsc::file_system::AbsoluteFsPath;

/// Original file -> the shims generated for it.
#[derive(Debug, Clone, Default)]
pub struct ShimReferenceMap {
    references: IndexMap<AbsoluteFsPath, Vec<AbsoluteFsPath>>,
}

impl ShimReferenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn references_of(&self, original: &AbsoluteFsPath) -> &[AbsoluteFsPath] {
        self.references
            .get(original)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_tagged(&self, original: &AbsoluteFsPath) -> bool {
        self.references.contains_key(original)
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

pub struct ShimReferenceTagger {
    shim_types: Vec<ShimType>,
    enabled: bool,
}

impl ShimReferenceTagger {
    pub fn new(shim_types: Vec<ShimType>) -> Self {
        Self {
            shim_types,
            enabled: true,
        }
    }

    /// Tags `original` with references to its shims. Shims themselves, declaration files
    /// and already-tagged files are left alone.
    pub fn tag(&self, original: &AbsoluteFsPath, map: &mut ShimReferenceMap) {
        if !self.enabled
            || is_shim(original.as_str())
            || original.as_str().ends_with(".d.ts")
            || map.is_tagged(original)
        {
            return;
        }
        let shims = self
            .shim_types
            .iter()
            .map(|&ty| make_shim_file_name(original, ty))
            .collect();
        map.references.insert(original.clone(), shims);
    }

    /// Stops tagging. Files seen after program creation are not originals.
    pub fn finalize(&mut self) {
        self.enabled = false;
    }
}
