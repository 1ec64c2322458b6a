//! Schema Module
//!
//! Element schemas used to validate element names and property bindings.

pub mod dom_element_schema_registry;
pub mod element_schema_registry;

pub use dom_element_schema_registry::*;
pub use element_schema_registry::*;
