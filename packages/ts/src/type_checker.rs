use bitflags::bitflags;

use crate::program::{Program, SourceFile};
use crate::Diagnostic;

/// The host type system. The engine never inspects types itself: it synthesizes source
/// text and asks the host for the semantic diagnostics of each file.
///
/// Implementations must be `Sync`; the orchestrator checks independent files in parallel.
pub trait HostTypeChecker: Sync {
    fn get_semantic_diagnostics(
        &self,
        program: &Program,
        source_file: &SourceFile,
    ) -> anyhow::Result<Vec<Diagnostic>>;

    /// The type of the expression spanning `start..end` of `source_file`. Hosts that
    /// cannot answer type queries keep the default.
    fn get_type_at_range(
        &self,
        _program: &Program,
        _source_file: &SourceFile,
        _start: usize,
        _end: usize,
    ) -> Option<HostType> {
        None
    }
}

bitflags! {
    /// Flags of a host type, numbered as the host numbers them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeFlags: u32 {
        const ANY = 1;
        const UNKNOWN = 1 << 1;
        const STRING = 1 << 2;
        const NUMBER = 1 << 3;
        const BOOLEAN = 1 << 4;
        const ENUM = 1 << 5;
        const BIGINT = 1 << 6;
        const STRING_LITERAL = 1 << 7;
        const NUMBER_LITERAL = 1 << 8;
        const BOOLEAN_LITERAL = 1 << 9;
        const VOID = 1 << 14;
        const UNDEFINED = 1 << 15;
        const NULL = 1 << 16;
        const NEVER = 1 << 17;
        const TYPE_PARAMETER = 1 << 18;
        const OBJECT = 1 << 19;
        const UNION = 1 << 20;
    }
}

/// A type as the host reports it. For a union, `flags` holds the flags of every
/// constituent along with `UNION`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostType {
    pub text: String,
    pub flags: TypeFlags,
}

impl HostType {
    pub fn new(text: impl Into<String>, flags: TypeFlags) -> Self {
        Self {
            text: text.into(),
            flags,
        }
    }

    pub fn is_any_or_unknown(&self) -> bool {
        self.flags.intersects(TypeFlags::ANY | TypeFlags::UNKNOWN)
    }

    /// Whether `null` or `undefined` are among the values of the type.
    pub fn is_nullable(&self) -> bool {
        self.flags
            .intersects(TypeFlags::NULL | TypeFlags::UNDEFINED | TypeFlags::VOID)
    }
}

/// A host checker that reports nothing. Useful when only out-of-band diagnostics matter.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTypeChecker;

impl HostTypeChecker for NoopTypeChecker {
    fn get_semantic_diagnostics(
        &self,
        _program: &Program,
        _source_file: &SourceFile,
    ) -> anyhow::Result<Vec<Diagnostic>> {
        Ok(Vec::new())
    }
}

impl<F> HostTypeChecker for F
where
    F: Fn(&Program, &SourceFile) -> anyhow::Result<Vec<Diagnostic>> + Sync,
{
    fn get_semantic_diagnostics(
        &self,
        program: &Program,
        source_file: &SourceFile,
    ) -> anyhow::Result<Vec<Diagnostic>> {
        self(program, source_file)
    }
}
