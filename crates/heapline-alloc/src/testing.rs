//! Minimal heap and free list for this crate's unit tests.
//!
//! Integration tests use the richer mocks in `heapline-test-utils`.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use heapline_core::{Address, HeapContext, HeapFlags};

use crate::free_list::FreeList;

pub(crate) struct TestHeap {
    flags: HeapFlags,
    in_gc: AtomicBool,
    inline_allocation: AtomicBool,
    sampling: AtomicBool,
    fillers: Mutex<Vec<(Address, usize)>>,
}

impl TestHeap {
    pub(crate) fn with_flags(flags: HeapFlags) -> Self {
        Self {
            flags,
            in_gc: AtomicBool::new(false),
            inline_allocation: AtomicBool::new(true),
            sampling: AtomicBool::new(true),
            fillers: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn compressed() -> Self {
        Self::with_flags(HeapFlags {
            object_alignment: 4,
            ..HeapFlags::default()
        })
    }

    pub(crate) fn set_in_gc(&self, value: bool) {
        self.in_gc.store(value, Ordering::Relaxed);
    }

    pub(crate) fn set_inline_allocation(&self, value: bool) {
        self.inline_allocation.store(value, Ordering::Relaxed);
    }

    pub(crate) fn set_sampling(&self, value: bool) {
        self.sampling.store(value, Ordering::Relaxed);
    }

    pub(crate) fn fillers(&self) -> Vec<(Address, usize)> {
        self.fillers.lock().unwrap().clone()
    }
}

impl Default for TestHeap {
    fn default() -> Self {
        Self::with_flags(HeapFlags::default())
    }
}

impl HeapContext for TestHeap {
    fn flags(&self) -> &HeapFlags {
        &self.flags
    }

    fn is_collection_in_progress(&self) -> bool {
        self.in_gc.load(Ordering::Relaxed)
    }

    fn is_inline_allocation_enabled(&self) -> bool {
        self.inline_allocation.load(Ordering::Relaxed)
    }

    fn is_sampling_active(&self) -> bool {
        self.sampling.load(Ordering::Relaxed)
    }

    fn create_filler_at(&self, address: Address, size: usize) {
        self.fillers.lock().unwrap().push((address, size));
    }
}

/// First-fit list of free ranges; no coalescing.
#[derive(Default)]
pub(crate) struct VecFreeList {
    pub(crate) ranges: Vec<Range<Address>>,
}

impl VecFreeList {
    pub(crate) fn with_region(start: usize, size: usize) -> Self {
        let start = Address::new(start);
        Self {
            ranges: vec![start..start + size],
        }
    }
}

impl FreeList for VecFreeList {
    fn allocate(&mut self, min_size: usize) -> Option<Range<Address>> {
        let index = self
            .ranges
            .iter()
            .position(|r| r.end - r.start >= min_size)?;
        Some(self.ranges.remove(index))
    }

    fn free(&mut self, start: Address, size: usize) {
        if size > 0 {
            self.ranges.push(start..start + size);
        }
    }

    fn available(&self) -> usize {
        self.ranges.iter().map(|r| r.end - r.start).sum()
    }
}
