#![deny(clippy::all)]

/**
 * Angular Compiler CLI - Rust Implementation
 *
 * Template type-checking for Angular components: type check block synthesis,
 * source mapping of host diagnostics and incremental reuse across passes.
 */
pub use angular_compiler as compiler;

pub mod ngtsc;

/// CLI version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
