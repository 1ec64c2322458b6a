// Semantic Graph Utilities

use super::api::SemanticReference;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

/// Check if two sets of references are semantically equal (order is irrelevant).
pub fn references_equal(a: &[SemanticReference], b: &[SemanticReference]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let a_set: HashSet<_> = a.iter().collect();
    let b_set: HashSet<_> = b.iter().collect();

    a_set == b_set
}

/// Builds an opaque fingerprint from the parts that make up a symbol's API.
pub fn hash_fingerprint<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = DefaultHasher::new();
    for part in parts {
        part.as_ref().hash(&mut hasher);
    }
    format!("{:016x}", hasher.finish())
}
