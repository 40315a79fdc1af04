//! Space identifiers and allocation origins.

use std::fmt;

/// Identifies a space within the heap.
///
/// Discriminants are dense and ordered; [`SpaceId::ReadOnly`] comes first
/// and every id from [`SpaceId::FIRST_MUTABLE`] to [`SpaceId::LAST_MUTABLE`]
/// names a mutable space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum SpaceId {
    /// Immutable objects shared by every isolate.
    ReadOnly = 0,
    /// Young generation.
    New = 1,
    /// Old generation.
    Old = 2,
    /// Executable code.
    Code = 3,
    /// Objects shared between heaps.
    Shared = 4,
    /// Objects that must not be reachable from untrusted memory.
    Trusted = 5,
    /// Young objects too large for a regular page.
    NewLarge = 6,
    /// Old objects too large for a regular page.
    Large = 7,
    /// Code objects too large for a regular page.
    CodeLarge = 8,
}

impl SpaceId {
    /// Total number of space ids, read-only included.
    pub const COUNT: usize = 9;

    /// First id of the mutable range.
    pub const FIRST_MUTABLE: SpaceId = SpaceId::New;

    /// Last id of the mutable range (inclusive).
    pub const LAST_MUTABLE: SpaceId = SpaceId::CodeLarge;

    /// Every id in ascending order.
    pub const ALL: [SpaceId; Self::COUNT] = [
        SpaceId::ReadOnly,
        SpaceId::New,
        SpaceId::Old,
        SpaceId::Code,
        SpaceId::Shared,
        SpaceId::Trusted,
        SpaceId::NewLarge,
        SpaceId::Large,
        SpaceId::CodeLarge,
    ];

    /// Dense index of this id.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look up an id by dense index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Whether this id is in the mutable range.
    pub fn is_mutable(self) -> bool {
        (Self::FIRST_MUTABLE..=Self::LAST_MUTABLE).contains(&self)
    }

    /// Short lowercase name, used in log output.
    pub fn name(self) -> &'static str {
        match self {
            Self::ReadOnly => "read_only",
            Self::New => "new",
            Self::Old => "old",
            Self::Code => "code",
            Self::Shared => "shared",
            Self::Trusted => "trusted",
            Self::NewLarge => "new_large",
            Self::Large => "large",
            Self::CodeLarge => "code_large",
        }
    }
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Who asked for an allocation.
///
/// Only used for accounting; it never changes how memory is handed out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AllocationOrigin {
    /// The runtime (builtins, C++ slow paths).
    #[default]
    Runtime,
    /// The garbage collector placing evacuated objects.
    Gc,
    /// Inline allocation from generated code.
    GeneratedCode,
}

impl fmt::Display for AllocationOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Runtime => write!(f, "runtime"),
            Self::Gc => write!(f, "gc"),
            Self::GeneratedCode => write!(f, "generated_code"),
        }
    }
}
