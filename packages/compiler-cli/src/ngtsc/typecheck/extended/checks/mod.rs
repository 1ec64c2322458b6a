// Extended Template Checks

pub mod invalid_banana_in_box;
pub mod nullish_coalescing_not_nullable;

use super::api::TemplateCheckFactory;

pub const ALL_DIAGNOSTIC_FACTORIES: &[TemplateCheckFactory] = &[
    invalid_banana_in_box::FACTORY,
    nullish_coalescing_not_nullable::FACTORY,
];
