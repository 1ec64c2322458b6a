mod extended_spec;
mod symbols_spec;
mod type_check_block_spec;
pub mod util;
