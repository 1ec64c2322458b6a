pub mod types;
pub mod util;

pub use types::*;
pub use util::*;
