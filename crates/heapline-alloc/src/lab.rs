//! Scoped local allocation buffers.
//!
//! A [`LocalAllocationBuffer`] owns one [`LinearAllocationArea`] and a
//! shared reference to the heap. Whatever path gives the buffer up (an
//! explicit [`close_and_make_iterable`](LocalAllocationBuffer::close_and_make_iterable),
//! or simply dropping it) first writes a filler over the unused tail so
//! that heap walkers never see uninitialised bytes.
//!
//! Buffers cannot be cloned. [`take`](LocalAllocationBuffer::take) moves
//! the area into a new buffer and leaves the source invalid.

use std::fmt;
use std::mem;

use heapline_core::{Address, AllocationAlignment, HeapContext};

use crate::area::LinearAllocationArea;

/// An owning handle over one linear allocation area.
#[must_use = "dropping a buffer closes it"]
pub struct LocalAllocationBuffer<'h, H: HeapContext + ?Sized> {
    heap: &'h H,
    area: LinearAllocationArea,
}

impl<'h, H: HeapContext + ?Sized> LocalAllocationBuffer<'h, H> {
    /// Take ownership of `area`. No side effects.
    pub fn new(heap: &'h H, area: LinearAllocationArea) -> Self {
        Self { heap, area }
    }

    /// A buffer that owns nothing.
    pub fn invalid(heap: &'h H) -> Self {
        Self::new(heap, LinearAllocationArea::null())
    }

    /// Whether the buffer still owns an area.
    pub fn is_valid(&self) -> bool {
        !self.area.is_null()
    }

    /// The owned area (null once closed).
    pub fn area(&self) -> LinearAllocationArea {
        self.area
    }

    /// The heap this buffer writes fillers into.
    pub fn heap(&self) -> &'h H {
        self.heap
    }

    /// Bump-allocate `size` bytes at `alignment`.
    ///
    /// `size` is rounded up to the object alignment. Returns `None` when
    /// the buffer is invalid or too full; a padding filler is written in
    /// front of the object when the alignment requires one.
    pub fn allocate_aligned(
        &mut self,
        size: usize,
        alignment: AllocationAlignment,
    ) -> Option<Address> {
        if !self.is_valid() {
            return None;
        }
        let object_alignment = self.heap.flags().object_alignment;
        let size = heapline_core::round_up(size, object_alignment);
        let top = self.area.top();
        let filler = alignment.fill_to_align(top, object_alignment);
        if !self.area.can_increment_top(filler + size) {
            return None;
        }
        let start = self.area.increment_top(filler + size);
        if filler > 0 {
            self.heap.create_filler_at(start, filler);
        }
        Some(start + filler)
    }

    /// Give back the most recent allocation if it is `[object, object + size)`.
    pub fn try_free_last(&mut self, object: Address, size: usize) -> bool {
        self.is_valid() && self.area.decrement_top_if_adjacent(object, size)
    }

    /// Absorb `other` if it ends exactly where this buffer starts.
    ///
    /// On success `other` is left invalid and its allocations now belong
    /// to this buffer.
    pub fn try_merge(&mut self, other: &mut LocalAllocationBuffer<'h, H>) -> bool {
        self.area.merge_if_adjacent(&mut other.area)
    }

    /// Write a filler over `[top, limit)`. No-op when invalid.
    pub fn make_iterable(&self) {
        if self.is_valid() && self.area.remaining() > 0 {
            self.heap.create_filler_at(self.area.top(), self.area.remaining());
        }
    }

    /// Fill the tail, give up the area, and return it.
    ///
    /// Returns the null area, with no side effects, when already closed.
    pub fn close_and_make_iterable(&mut self) -> LinearAllocationArea {
        if !self.is_valid() {
            return LinearAllocationArea::null();
        }
        self.make_iterable();
        let closed = mem::replace(&mut self.area, LinearAllocationArea::null());
        tracing::trace!(
            area = ?closed,
            filler = closed.remaining(),
            "local allocation buffer closed"
        );
        closed
    }

    /// Move the area and heap reference into a new buffer, leaving this
    /// one invalid.
    pub fn take(&mut self) -> LocalAllocationBuffer<'h, H> {
        let area = mem::replace(&mut self.area, LinearAllocationArea::null());
        LocalAllocationBuffer {
            heap: self.heap,
            area,
        }
    }

    /// Replace this buffer with `other`, closing whatever this buffer
    /// held first. `other` is left invalid.
    pub fn assign_from(&mut self, other: &mut LocalAllocationBuffer<'h, H>) {
        let _ = self.close_and_make_iterable();
        self.heap = other.heap;
        self.area = mem::replace(&mut other.area, LinearAllocationArea::null());
    }

    /// Hand the area over without filling its tail, e.g. to install it as
    /// a space's live area.
    pub(crate) fn into_area(mut self) -> LinearAllocationArea {
        mem::replace(&mut self.area, LinearAllocationArea::null())
    }
}

impl<H: HeapContext + ?Sized> Drop for LocalAllocationBuffer<'_, H> {
    fn drop(&mut self) {
        let _ = self.close_and_make_iterable();
    }
}

impl<H: HeapContext + ?Sized> fmt::Debug for LocalAllocationBuffer<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalAllocationBuffer")
            .field("area", &self.area)
            .finish_non_exhaustive()
    }
}
