//! Angular TypeScript Compiler (ngtsc)
//!
//! The template type-checking pipeline and the bookkeeping it relies on.

pub mod file_system;
pub mod logging;

pub mod cycles;
pub mod diagnostics;
pub mod incremental;
pub mod program_driver;
pub mod reflection;
pub mod shims;
pub mod typecheck;
