//! The `[start, top, limit)` triple describing one linear allocation buffer.
//!
//! A [`LinearAllocationArea`] is a plain value. Allocation bumps `top`;
//! `start` marks where observer accounting last caught up; `limit` is the
//! end of the buffer. The null area (all three fields null) means "no
//! buffer". The invariant `start <= top <= limit` is checked after every
//! mutation in debug builds.

use std::fmt;

use heapline_core::Address;

/// Bounds and cursor of one linear allocation buffer.
///
/// Fields are private so that every construction and mutation goes
/// through a checked method.
#[derive(Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct LinearAllocationArea {
    start: Address,
    top: Address,
    limit: Address,
}

impl LinearAllocationArea {
    /// An area with nothing allocated: `start == top`.
    pub fn new(top: Address, limit: Address) -> Self {
        let area = Self {
            start: top,
            top,
            limit,
        };
        area.verify();
        area
    }

    /// An area with an explicit `start`, e.g. one rebuilt from a closed
    /// buffer.
    pub fn with_start(start: Address, top: Address, limit: Address) -> Self {
        let area = Self { start, top, limit };
        area.verify();
        area
    }

    /// The null area.
    pub const fn null() -> Self {
        Self {
            start: Address::NULL,
            top: Address::NULL,
            limit: Address::NULL,
        }
    }

    /// Replace the whole area. `start` becomes `top`.
    pub fn reset(&mut self, top: Address, limit: Address) {
        *self = Self::new(top, limit);
    }

    /// Move `start` up to `top`, marking everything allocated so far as
    /// accounted for.
    pub fn reset_start(&mut self) {
        self.start = self.top;
    }

    /// Whether `bytes` more fit below `limit`.
    #[inline]
    pub fn can_increment_top(&self, bytes: usize) -> bool {
        self.verify();
        self.limit.raw() - self.top.raw() >= bytes
    }

    /// Bump `top` by `bytes` and return the old top.
    ///
    /// The caller must have checked [`can_increment_top`](Self::can_increment_top).
    #[inline]
    pub fn increment_top(&mut self, bytes: usize) -> Address {
        let old_top = self.top;
        self.top = old_top + bytes;
        self.verify();
        old_top
    }

    /// Undo the last allocation if `[new_top, new_top + bytes)` ends
    /// exactly at `top`.
    pub fn decrement_top_if_adjacent(&mut self, new_top: Address, bytes: usize) -> bool {
        if new_top + bytes != self.top {
            return false;
        }
        self.top = new_top;
        if self.start > self.top {
            self.reset_start();
        }
        self.verify();
        true
    }

    /// Absorb `other` when it ends exactly where this area starts.
    ///
    /// On success this area starts at `other`'s start and continues
    /// allocating from `other`'s top; `other` becomes null. Only an
    /// untouched area (`start == top`) can absorb another.
    pub fn merge_if_adjacent(&mut self, other: &mut LinearAllocationArea) -> bool {
        if self.is_null() || other.is_null() || self.start != self.top {
            return false;
        }
        if self.start != other.limit {
            return false;
        }
        self.start = other.start;
        self.top = other.top;
        *other = Self::null();
        self.verify();
        true
    }

    /// Where observer accounting last caught up.
    pub fn start(&self) -> Address {
        self.start
    }

    /// Next free address.
    pub fn top(&self) -> Address {
        self.top
    }

    /// End of the buffer (exclusive).
    pub fn limit(&self) -> Address {
        self.limit
    }

    /// Whether this is the null area.
    pub fn is_null(&self) -> bool {
        self.start.is_null()
    }

    /// Bytes between `start` and `limit`.
    pub fn size(&self) -> usize {
        self.limit - self.start
    }

    /// Bytes allocated since `start`.
    pub fn allocated(&self) -> usize {
        self.top - self.start
    }

    /// Bytes left between `top` and `limit`.
    pub fn remaining(&self) -> usize {
        self.limit - self.top
    }

    /// Check `start <= top <= limit` in debug builds.
    #[inline]
    pub fn verify(&self) {
        debug_assert!(
            self.start <= self.top && self.top <= self.limit,
            "linear allocation area out of order: {self:?}"
        );
    }
}

impl Default for LinearAllocationArea {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Debug for LinearAllocationArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LAA({}, {}, {})", self.start, self.top, self.limit)
    }
}
