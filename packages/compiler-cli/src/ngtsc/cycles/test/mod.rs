mod imports_spec;
pub mod util;
