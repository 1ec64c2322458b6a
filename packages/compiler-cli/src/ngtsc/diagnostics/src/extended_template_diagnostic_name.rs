/// Enum holding the name of each extended template diagnostic. The name is used as a user-meaningful
/// value for configuring the diagnostic in the project's options.
///
/// See the corresponding `ErrorCode` for documentation about each specific error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtendedTemplateDiagnosticName {
    InvalidBananaInBox,
    NullishCoalescingNotNullable,
}

impl ExtendedTemplateDiagnosticName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidBananaInBox => "invalidBananaInBox",
            Self::NullishCoalescingNotNullable => "nullishCoalescingNotNullable",
        }
    }
}

impl std::fmt::Display for ExtendedTemplateDiagnosticName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
