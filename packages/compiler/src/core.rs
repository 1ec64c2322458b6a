//! Core Types
//!
//! Types shared with the framework runtime that template checking needs.

use serde::{Deserialize, Serialize};

/// A schema a component declares to relax DOM checking of its template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaMetadata {
    pub name: String,
}

pub const CUSTOM_ELEMENTS_SCHEMA_NAME: &str = "custom-elements";
pub const NO_ERRORS_SCHEMA_NAME: &str = "no-errors-schema";

/// Allows unknown elements with a `-` in their name and any property on them.
pub fn custom_elements_schema() -> SchemaMetadata {
    SchemaMetadata {
        name: CUSTOM_ELEMENTS_SCHEMA_NAME.to_string(),
    }
}

/// Allows any element and any property.
pub fn no_errors_schema() -> SchemaMetadata {
    SchemaMetadata {
        name: NO_ERRORS_SCHEMA_NAME.to_string(),
    }
}
