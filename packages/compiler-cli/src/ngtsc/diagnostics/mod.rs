pub mod src {
    pub mod error;
    pub mod error_code;
    pub mod extended_template_diagnostic_name;
    pub mod util;
}

pub use src::error::*;
pub use src::error_code::*;
pub use src::extended_template_diagnostic_name::*;
pub use src::util::*;
pub use ts::{Diagnostic, DiagnosticCategory, DiagnosticMessageChain, DiagnosticRelatedInformation};

#[cfg(test)]
mod test;
