//! Shims
//!
//! Synthetic files that exist only inside a type-checking session.

pub mod src;

#[cfg(test)]
mod test;

pub use src::*;
