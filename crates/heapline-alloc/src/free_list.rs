//! The boundary to the free list that supplies raw regions.
//!
//! How free memory is tracked is up to the heap. The allocation core only
//! needs to ask for a range of at least some size and to hand back the
//! parts of a range it did not use.

use std::ops::Range;

use heapline_core::Address;

/// Supplier of free regions for one space.
pub trait FreeList {
    /// Remove and return a free range holding at least `min_size` bytes.
    ///
    /// Returns `None` when nothing large enough is available; the caller
    /// reports that upward as a failed allocation.
    fn allocate(&mut self, min_size: usize) -> Option<Range<Address>>;

    /// Return `[start, start + size)` to the free list.
    fn free(&mut self, start: Address, size: usize);

    /// Total free bytes.
    fn available(&self) -> usize;
}

impl<F: FreeList + ?Sized> FreeList for Box<F> {
    fn allocate(&mut self, min_size: usize) -> Option<Range<Address>> {
        (**self).allocate(min_size)
    }

    fn free(&mut self, start: Address, size: usize) {
        (**self).free(start, size)
    }

    fn available(&self) -> usize {
        (**self).available()
    }
}
