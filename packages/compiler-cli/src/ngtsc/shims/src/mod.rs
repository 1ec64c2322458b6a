//! Shims Source

pub mod adapter;
pub mod reference_tagger;
pub mod util;

pub use adapter::*;
pub use reference_tagger::*;
pub use util::*;
