//! Heap addresses and alignment arithmetic.
//!
//! An [`Address`] is a plain address-sized integer. The allocator never
//! dereferences it; it only compares, offsets, and hands addresses to the
//! heap, which owns the memory behind them.

use std::fmt;
use std::ops::{Add, Sub};

/// Size of a tagged heap slot in bytes. The default object alignment.
pub const TAGGED_SIZE: usize = 8;

/// Alignment required by double-aligned allocations.
pub const DOUBLE_ALIGNMENT: usize = 8;

/// An address inside the managed heap.
///
/// [`Address::NULL`] is the sentinel for "no address"; linear allocation
/// areas use it to mark themselves as closed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(usize);

impl Address {
    /// The null sentinel.
    pub const NULL: Address = Address(0);

    /// Wrap a raw address value.
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// The raw address value.
    pub const fn raw(self) -> usize {
        self.0
    }

    /// Whether this is the null sentinel.
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Byte distance from `base` up to `self`.
    ///
    /// `base` must not lie above `self`.
    pub fn offset_from(self, base: Address) -> usize {
        debug_assert!(base <= self, "offset_from: {base} lies above {self}");
        self.0 - base.0
    }

    /// Whether the address is a multiple of `alignment` (a power of two).
    pub fn is_aligned(self, alignment: usize) -> bool {
        debug_assert!(alignment.is_power_of_two());
        self.0 & (alignment - 1) == 0
    }
}

impl Add<usize> for Address {
    type Output = Address;

    fn add(self, bytes: usize) -> Address {
        Address(
            self.0
                .checked_add(bytes)
                .expect("address arithmetic overflowed the address space"),
        )
    }
}

impl Sub<Address> for Address {
    type Output = usize;

    fn sub(self, base: Address) -> usize {
        self.offset_from(base)
    }
}

impl From<usize> for Address {
    fn from(raw: usize) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Round `size` down to a multiple of `alignment` (a power of two).
pub fn round_down(size: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    size & !(alignment - 1)
}

/// Round `size` up to a multiple of `alignment` (a power of two).
pub fn round_up(size: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    (size + alignment - 1) & !(alignment - 1)
}

/// Alignment requested for a single allocation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AllocationAlignment {
    /// Object alignment only. Never needs padding.
    #[default]
    TaggedAligned,
    /// Object start must be a multiple of [`DOUBLE_ALIGNMENT`].
    DoubleAligned,
    /// Object start must sit one tagged slot past a double boundary, so
    /// that a double field after a one-slot header ends up aligned.
    DoubleUnaligned,
}

impl AllocationAlignment {
    /// Padding needed in front of an object placed at `address`.
    ///
    /// `object_alignment` is the heap's tagged slot size. When it already
    /// matches [`DOUBLE_ALIGNMENT`] no padding is ever needed.
    pub fn fill_to_align(self, address: Address, object_alignment: usize) -> usize {
        if object_alignment >= DOUBLE_ALIGNMENT {
            return 0;
        }
        let misaligned = address.raw() & (DOUBLE_ALIGNMENT - 1) != 0;
        match self {
            Self::TaggedAligned => 0,
            Self::DoubleAligned if misaligned => object_alignment,
            Self::DoubleUnaligned if !misaligned => object_alignment,
            Self::DoubleAligned | Self::DoubleUnaligned => 0,
        }
    }

    /// Worst-case padding over all possible addresses.
    pub fn max_fill(self, object_alignment: usize) -> usize {
        match self {
            Self::TaggedAligned => 0,
            Self::DoubleAligned | Self::DoubleUnaligned => {
                DOUBLE_ALIGNMENT.saturating_sub(object_alignment)
            }
        }
    }
}
