//! A space that allocates by bumping a pointer through a linear area.
//!
//! [`SpaceWithLinearArea`] owns the space's current [`LinearAllocationArea`],
//! its [`AllocationCounter`] and the [`FreeList`] it refills from. The fast
//! path is a bump inside the current area. When that fails the slow path
//! closes the area, carves a new one out of the free list, trims it with
//! [`compute_limit`](crate::limit::compute_limit) and retries.
//!
//! # Sampling
//!
//! While observers are active the area never extends past the next sample,
//! so fast-path bumps cannot skip one. Bytes bumped inside the area are
//! reconciled with [`advance_allocation_observers`](SpaceWithLinearArea::advance_allocation_observers)
//! whenever the area is closed, and the allocation that reaches a sample is
//! reported through [`invoke_allocation_observers`](SpaceWithLinearArea::invoke_allocation_observers).
//!
//! The heap toggles sampling and collection pauses on its own. Around
//! either change it must call [`update_inline_allocation_limit`](SpaceWithLinearArea::update_inline_allocation_limit)
//! once before (bytes bumped so far are settled under the old state) and
//! once after (the area is trimmed for the new one), or free the area.

use std::fmt;
use std::sync::Arc;

use heapline_core::{round_up, Address, AllocationAlignment, AllocationOrigin, HeapContext, SpaceId};

use crate::area::LinearAllocationArea;
use crate::error::AllocationError;
use crate::free_list::FreeList;
use crate::lab::LocalAllocationBuffer;
use crate::limit::{self, LimitInputs, SamplingWindow};
use crate::observer::{AllocationCounter, AllocationObserver, ObserverId};
use crate::stats::AllocationStats;

/// One mutable space backed by a free list.
pub struct SpaceWithLinearArea<F: FreeList> {
    id: SpaceId,
    free_list: F,
    counter: AllocationCounter,
    area: LinearAllocationArea,
    stats: AllocationStats,
}

impl<F: FreeList> SpaceWithLinearArea<F> {
    /// An empty space with no current area.
    pub fn new(id: SpaceId, free_list: F) -> Self {
        debug_assert!(id.is_mutable(), "{id} space is read-only");
        Self {
            id,
            free_list,
            counter: AllocationCounter::new(),
            area: LinearAllocationArea::null(),
            stats: AllocationStats::default(),
        }
    }

    /// Which space this is.
    pub fn id(&self) -> SpaceId {
        self.id
    }

    /// The current linear area. Null between refills.
    pub fn area(&self) -> LinearAllocationArea {
        self.area
    }

    /// Current bump pointer.
    pub fn top(&self) -> Address {
        self.area.top()
    }

    /// End of the current area.
    pub fn limit(&self) -> Address {
        self.area.limit()
    }

    /// Cumulative counters.
    pub fn stats(&self) -> &AllocationStats {
        &self.stats
    }

    /// The observer registry.
    pub fn allocation_counter(&self) -> &AllocationCounter {
        &self.counter
    }

    /// The backing free list.
    pub fn free_list(&self) -> &F {
        &self.free_list
    }

    /// Mutable access to the backing free list, e.g. to add memory after a
    /// collection.
    pub fn free_list_mut(&mut self) -> &mut F {
        &mut self.free_list
    }

    /// Whether observers should see allocations in this space right now.
    pub fn is_sampling_active<H: HeapContext + ?Sized>(&self, heap: &H) -> bool {
        heap.is_sampling_active() && !heap.is_collection_in_progress() && self.counter.is_active()
    }

    /// Limit for a buffer carved from `[start, end)` given this space's
    /// observers and the heap's current phase.
    pub fn compute_limit<H: HeapContext + ?Sized>(
        &self,
        heap: &H,
        start: Address,
        end: Address,
        min_size: usize,
    ) -> Address {
        let mut inputs = LimitInputs::from_heap(heap);
        if self.is_sampling_active(heap) {
            inputs = inputs.with_sampling(SamplingWindow {
                next_bytes: self.counter.next_bytes(),
                lab_start: self.area.start(),
                lab_top: self.area.top(),
            });
        }
        limit::compute_limit(start, end, min_size, &inputs)
    }

    // -- observers ---------------------------------------------------------

    /// Register an observer and shrink the current area to its first sample.
    pub fn add_allocation_observer<H: HeapContext + ?Sized>(
        &mut self,
        heap: &H,
        observer: Arc<dyn AllocationObserver>,
    ) -> ObserverId {
        self.advance_allocation_observers(heap);
        let id = self.counter.add(observer);
        self.update_inline_allocation_limit(heap);
        id
    }

    /// Unregister an observer. Returns `false` if `id` is unknown.
    pub fn remove_allocation_observer<H: HeapContext + ?Sized>(
        &mut self,
        heap: &H,
        id: ObserverId,
    ) -> bool {
        self.advance_allocation_observers(heap);
        self.counter.remove(id)
    }

    /// Suspend sampling. Bytes allocated while paused are never reported.
    pub fn pause_allocation_observers<H: HeapContext + ?Sized>(&mut self, heap: &H) {
        self.advance_allocation_observers(heap);
        self.counter.pause();
    }

    /// Undo one [`pause_allocation_observers`](Self::pause_allocation_observers).
    pub fn resume_allocation_observers<H: HeapContext + ?Sized>(&mut self, heap: &H) {
        self.counter.resume();
        self.mark_lab_start_initialized();
        self.update_inline_allocation_limit(heap);
    }

    /// Report the bytes bumped since the area's start and move the start up
    /// to the top.
    pub fn advance_allocation_observers<H: HeapContext + ?Sized>(&mut self, heap: &H) {
        if self.area.is_null() || self.area.start() == self.area.top() {
            return;
        }
        if self.is_sampling_active(heap) {
            self.counter.advance(self.area.allocated());
        }
        self.mark_lab_start_initialized();
    }

    /// Forget bytes bumped so far: the next advance starts from `top`.
    pub fn mark_lab_start_initialized(&mut self) {
        if !self.area.is_null() {
            self.area.reset_start();
        }
    }

    /// Bytes until the nearest observer fires.
    pub fn next_bytes(&self) -> usize {
        self.counter.next_bytes()
    }

    /// Report an allocation that was reserved outside the fast path.
    ///
    /// `size <= aligned_size <= allocation_size`, and padding is either
    /// absent or took the whole worst case. Observers fire only when the
    /// reserved bytes reach the next sample.
    pub fn invoke_allocation_observers<H: HeapContext + ?Sized>(
        &mut self,
        heap: &H,
        soon_object: Address,
        size: usize,
        aligned_size: usize,
        allocation_size: usize,
    ) {
        debug_assert!(size <= aligned_size && aligned_size <= allocation_size);
        debug_assert!(size == aligned_size || aligned_size == allocation_size);
        if !self.is_sampling_active(heap) {
            return;
        }
        if allocation_size >= self.counter.next_bytes() {
            let fired = self.counter.invoke(soon_object, size, aligned_size, allocation_size);
            if !fired.is_empty() {
                self.stats.observer_steps += 1;
            }
        }
    }

    /// Trim the current area so it stops short of the next sample (or the
    /// stress cap) and return the cut-off tail to the free list.
    pub fn update_inline_allocation_limit<H: HeapContext + ?Sized>(&mut self, heap: &H) {
        if self.area.is_null() {
            return;
        }
        self.advance_allocation_observers(heap);
        let top = self.area.top();
        let limit = self.area.limit();
        let new_limit = self.compute_limit(heap, top, limit, 0);
        if new_limit < limit {
            self.area.reset(top, new_limit);
            self.give_back(heap, new_limit, limit - new_limit);
            tracing::trace!(space = %self.id, %top, %new_limit, "linear allocation area trimmed");
        }
    }

    // -- allocation --------------------------------------------------------

    /// Allocate `size` bytes at `alignment`.
    ///
    /// `size` must be a non-zero multiple of the object alignment.
    pub fn allocate_raw<H: HeapContext + ?Sized>(
        &mut self,
        heap: &H,
        size: usize,
        alignment: AllocationAlignment,
        origin: AllocationOrigin,
    ) -> Result<Address, AllocationError> {
        let flags = heap.flags();
        debug_assert!(
            size > 0 && size % flags.object_alignment == 0,
            "allocation size {size} is not a multiple of {}",
            flags.object_alignment
        );
        if size > flags.max_regular_object_size {
            return Err(AllocationError::SizeTooLarge {
                requested: size,
                max: flags.max_regular_object_size,
            });
        }

        let object = match self.allocate_fast(heap, size, alignment) {
            Some((object, _)) => object,
            None => self.allocate_slow(heap, size, alignment, origin)?,
        };
        self.stats.record_allocation(origin, size);
        Ok(object)
    }

    /// [`allocate_raw`](Self::allocate_raw) for sizes that are not yet
    /// rounded to the object alignment.
    pub fn allocate_raw_force_alignment_for_testing<H: HeapContext + ?Sized>(
        &mut self,
        heap: &H,
        size: usize,
        alignment: AllocationAlignment,
        origin: AllocationOrigin,
    ) -> Result<Address, AllocationError> {
        let size = round_up(size, heap.flags().object_alignment);
        self.allocate_raw(heap, size, alignment, origin)
    }

    /// Bump inside the current area. Returns the object and its padding.
    #[inline]
    fn allocate_fast<H: HeapContext + ?Sized>(
        &mut self,
        heap: &H,
        size: usize,
        alignment: AllocationAlignment,
    ) -> Option<(Address, usize)> {
        if self.area.is_null() {
            return None;
        }
        let filler = alignment.fill_to_align(self.area.top(), heap.flags().object_alignment);
        if !self.area.can_increment_top(filler + size) {
            return None;
        }
        let start = self.area.increment_top(filler + size);
        if filler > 0 {
            heap.create_filler_at(start, filler);
            self.stats.filler_bytes += filler as u64;
        }
        Some((start + filler, filler))
    }

    fn allocate_slow<H: HeapContext + ?Sized>(
        &mut self,
        heap: &H,
        size: usize,
        alignment: AllocationAlignment,
        origin: AllocationOrigin,
    ) -> Result<Address, AllocationError> {
        let allocation_size = size + alignment.max_fill(heap.flags().object_alignment);
        self.refill(heap, allocation_size, origin)?;
        let (object, filler) = self
            .allocate_fast(heap, size, alignment)
            .expect("refilled area holds the request with worst-case padding");
        self.invoke_allocation_observers(heap, object, size, size + filler, allocation_size);
        Ok(object)
    }

    /// Replace the current area with a fresh one of at least `min_size`.
    fn refill<H: HeapContext + ?Sized>(
        &mut self,
        heap: &H,
        min_size: usize,
        origin: AllocationOrigin,
    ) -> Result<(), AllocationError> {
        self.free_linear_allocation_area(heap);
        let (start, limit) = self.carve(heap, min_size)?;
        self.area.reset(start, limit);
        self.stats.refills += 1;
        tracing::trace!(
            space = %self.id,
            %start,
            %limit,
            min_size,
            %origin,
            "linear allocation area refilled"
        );
        Ok(())
    }

    /// Take a range from the free list, trim it and return the tail.
    fn carve<H: HeapContext + ?Sized>(
        &mut self,
        heap: &H,
        min_size: usize,
    ) -> Result<(Address, Address), AllocationError> {
        let Some(range) = self.free_list.allocate(min_size) else {
            tracing::debug!(
                space = %self.id,
                requested = min_size,
                available = self.free_list.available(),
                "free list exhausted"
            );
            return Err(AllocationError::RetryAfterGc {
                space: self.id,
                requested: min_size,
            });
        };
        debug_assert!(range.end - range.start >= min_size, "free list returned a short range");
        let limit = self.compute_limit(heap, range.start, range.end, min_size);
        if limit < range.end {
            self.give_back(heap, limit, range.end - limit);
        }
        Ok((range.start, limit))
    }

    fn give_back<H: HeapContext + ?Sized>(&mut self, heap: &H, start: Address, size: usize) {
        heap.create_filler_at(start, size);
        self.stats.filler_bytes += size as u64;
        self.free_list.free(start, size);
    }

    // -- lifecycle ---------------------------------------------------------

    /// Close the current area: report its bytes, fill the unused tail and
    /// return it to the free list.
    pub fn free_linear_allocation_area<H: HeapContext + ?Sized>(&mut self, heap: &H) {
        if self.area.is_null() {
            return;
        }
        self.advance_allocation_observers(heap);
        let top = self.area.top();
        let limit = self.area.limit();
        self.area = LinearAllocationArea::null();
        if limit > top {
            self.give_back(heap, top, limit - top);
        }
        tracing::trace!(space = %self.id, %top, %limit, "linear allocation area freed");
    }

    /// Carve a scoped buffer of at least `min_size` bytes for a separate
    /// allocator, e.g. a collector thread.
    ///
    /// Allocations made through the buffer are not reported to observers.
    pub fn lease_buffer<'h, H: HeapContext + ?Sized>(
        &mut self,
        heap: &'h H,
        min_size: usize,
    ) -> Result<LocalAllocationBuffer<'h, H>, AllocationError> {
        self.free_linear_allocation_area(heap);
        let (start, limit) = self.carve(heap, min_size)?;
        self.stats.leased_buffers += 1;
        tracing::debug!(space = %self.id, %start, %limit, "buffer leased");
        Ok(LocalAllocationBuffer::new(heap, LinearAllocationArea::new(start, limit)))
    }

    /// Make `buffer`'s area the space's current area. Bytes already
    /// allocated in it are not reported.
    pub fn install_buffer<H: HeapContext + ?Sized>(
        &mut self,
        heap: &H,
        buffer: LocalAllocationBuffer<'_, H>,
    ) {
        self.free_linear_allocation_area(heap);
        let area = buffer.into_area();
        if area.is_null() {
            return;
        }
        self.area = area;
        self.mark_lab_start_initialized();
        self.update_inline_allocation_limit(heap);
    }

    /// Check `start <= top <= limit` in debug builds.
    pub fn verify_top(&self) {
        self.area.verify();
    }
}

impl<F: FreeList> fmt::Debug for SpaceWithLinearArea<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpaceWithLinearArea")
            .field("id", &self.id)
            .field("area", &self.area)
            .field("counter", &self.counter)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
