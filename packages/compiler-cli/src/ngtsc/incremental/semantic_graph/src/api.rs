// Semantic Dependency Graph API
//
// Types for tracking semantic dependencies between symbols.

use super::util::references_equal;
use crate::ngtsc::file_system::AbsoluteFsPath;
use std::collections::HashSet;

/// Identity of a symbol across builds: the file that declares it and its name there.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SemanticReference {
    pub path: AbsoluteFsPath,
    pub identifier: String,
}

impl SemanticReference {
    pub fn new(path: impl Into<AbsoluteFsPath>, identifier: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            identifier: identifier.into(),
        }
    }
}

/// A compiled declaration as seen by the semantic graph.
///
/// The three fingerprints are opaque tokens compared for equality only:
/// * `public_api` changes when consumers of the symbol may compile differently (selector,
///   inputs, outputs, export names).
/// * `emit` changes when the symbol's own compiled output changes.
/// * `type_check_api` changes when templates using the symbol need a new TCB.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SemanticSymbol {
    pub path: AbsoluteFsPath,
    pub identifier: String,
    pub public_api: String,
    pub emit: String,
    pub type_check_api: String,
    /// Symbols whose public API feeds into this symbol's emitted output.
    pub emit_dependencies: Vec<SemanticReference>,
    /// Symbols whose type-check API feeds into this symbol's type-check block.
    pub type_check_dependencies: Vec<SemanticReference>,
}

impl SemanticSymbol {
    pub fn new(path: impl Into<AbsoluteFsPath>, identifier: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            identifier: identifier.into(),
            ..Default::default()
        }
    }

    pub fn with_public_api(mut self, fingerprint: impl Into<String>) -> Self {
        self.public_api = fingerprint.into();
        self
    }

    pub fn with_emit(mut self, fingerprint: impl Into<String>) -> Self {
        self.emit = fingerprint.into();
        self
    }

    pub fn with_type_check_api(mut self, fingerprint: impl Into<String>) -> Self {
        self.type_check_api = fingerprint.into();
        self
    }

    pub fn with_emit_dependency(mut self, dep: SemanticReference) -> Self {
        self.emit_dependencies.push(dep);
        self
    }

    pub fn with_type_check_dependency(mut self, dep: SemanticReference) -> Self {
        self.type_check_dependencies.push(dep);
        self
    }

    pub fn reference(&self) -> SemanticReference {
        SemanticReference::new(self.path.clone(), self.identifier.clone())
    }

    /// Whether a consumer compiled against `previous` may need recompiling against `self`.
    pub fn is_public_api_affected(&self, previous: &SemanticSymbol) -> bool {
        self.public_api != previous.public_api
    }

    /// Whether this symbol's own output differs from `previous`, either directly or
    /// because a symbol it depends on changed its public API.
    pub fn is_emit_affected(
        &self,
        previous: &SemanticSymbol,
        public_api_affected: &HashSet<SemanticReference>,
    ) -> bool {
        self.emit != previous.emit
            || !references_equal(&self.emit_dependencies, &previous.emit_dependencies)
            || self
                .emit_dependencies
                .iter()
                .any(|dep| public_api_affected.contains(dep))
    }

    pub fn is_type_check_api_affected(&self, previous: &SemanticSymbol) -> bool {
        self.type_check_api != previous.type_check_api
    }

    /// Whether the type-check block generated for this symbol must be regenerated.
    pub fn is_type_check_block_affected(
        &self,
        previous: &SemanticSymbol,
        type_check_api_affected: &HashSet<SemanticReference>,
    ) -> bool {
        !references_equal(
            &self.type_check_dependencies,
            &previous.type_check_dependencies,
        ) || self
            .type_check_dependencies
            .iter()
            .any(|dep| type_check_api_affected.contains(dep))
    }
}
