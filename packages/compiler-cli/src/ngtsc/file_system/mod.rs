//! File System Abstraction
//!
//! Only the path types and pure path manipulation survive here: type-checking works on
//! in-memory programs and never touches the disk.

pub mod src;

#[cfg(test)]
mod test;

pub use src::*;
