//! Element Schema Registry
//!
//! What the DOM knows about elements and their properties.

use crate::core::SchemaMetadata;

pub trait ElementSchemaRegistry {
    /// Check if a property exists on an element
    fn has_property(&self, tag_name: &str, prop_name: &str, schema_metas: &[SchemaMetadata]) -> bool;

    /// Check if an element exists
    fn has_element(&self, tag_name: &str, schema_metas: &[SchemaMetadata]) -> bool;

    /// Maps an attribute name (`class`, `tabindex`) to its DOM property (`className`, `tabIndex`).
    fn get_mapped_prop_name(&self, prop_name: &str) -> String;

    /// Get all known element names
    fn all_known_element_names(&self) -> Vec<String>;
}
