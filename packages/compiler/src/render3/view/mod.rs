//! Render3 View Module
//!
//! Directive matching results and the binder that produces them.

pub mod t2_api;
pub mod t2_binder;

pub use t2_api::*;
pub use t2_binder::*;
