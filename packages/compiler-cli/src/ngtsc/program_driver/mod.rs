//! Program Driver
//!
//! Swaps synthesized file contents into the program the host type checker sees.

pub mod src {
    pub mod api;
    pub mod in_memory_program_driver;
}

pub use src::api::*;
pub use src::in_memory_program_driver::InMemoryProgramDriver;

#[cfg(test)]
mod test;
