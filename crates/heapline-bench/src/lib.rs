//! Benchmark profiles and utilities for the heapline allocation core.
//!
//! Provides a [`BenchHeap`] that counts fillers instead of logging them, a
//! first-fit [`RegionFreeList`], and prebuilt flag profiles:
//!
//! - [`reference_flags`]: 8-byte objects, inline allocation on
//! - [`stress_flags`]: stress marking with the default 64-byte cap
//! - [`compressed_flags`]: 4-byte objects, exercising alignment padding

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use heapline_alloc::{FreeList, SpaceWithLinearArea};
use heapline_core::{Address, HeapContext, HeapFlags, SpaceId};

/// Base address of every benchmark region.
pub const REGION_BASE: usize = 0x1000_0000;

/// Default flags.
pub fn reference_flags() -> HeapFlags {
    HeapFlags::default()
}

/// Stress marking with the default cap.
pub fn stress_flags() -> HeapFlags {
    HeapFlags::stress()
}

/// Pointer-compressed layout: 4-byte object alignment.
pub fn compressed_flags() -> HeapFlags {
    HeapFlags {
        object_alignment: 4,
        ..HeapFlags::default()
    }
}

/// Heap context for benchmarks. Fillers are counted, not recorded.
pub struct BenchHeap {
    flags: HeapFlags,
    in_gc: AtomicBool,
    filler_bytes: AtomicUsize,
}

impl BenchHeap {
    /// A heap outside any collection pause.
    pub fn new(flags: HeapFlags) -> Self {
        Self {
            flags,
            in_gc: AtomicBool::new(false),
            filler_bytes: AtomicUsize::new(0),
        }
    }

    /// Enter or leave a collection pause.
    pub fn set_in_gc(&self, value: bool) {
        self.in_gc.store(value, Ordering::Relaxed);
    }

    /// Total bytes covered by fillers so far.
    pub fn filler_bytes(&self) -> usize {
        self.filler_bytes.load(Ordering::Relaxed)
    }
}

impl HeapContext for BenchHeap {
    fn flags(&self) -> &HeapFlags {
        &self.flags
    }

    fn is_collection_in_progress(&self) -> bool {
        self.in_gc.load(Ordering::Relaxed)
    }

    fn is_inline_allocation_enabled(&self) -> bool {
        true
    }

    fn is_sampling_active(&self) -> bool {
        true
    }

    fn create_filler_at(&self, _address: Address, size: usize) {
        self.filler_bytes.fetch_add(size, Ordering::Relaxed);
    }
}

/// First-fit list of free ranges.
#[derive(Default)]
pub struct RegionFreeList {
    ranges: Vec<Range<Address>>,
}

impl RegionFreeList {
    /// A list holding `[REGION_BASE, REGION_BASE + size)`.
    pub fn with_region(size: usize) -> Self {
        let start = Address::new(REGION_BASE);
        Self {
            ranges: vec![start..start + size],
        }
    }
}

impl FreeList for RegionFreeList {
    fn allocate(&mut self, min_size: usize) -> Option<Range<Address>> {
        let index = self
            .ranges
            .iter()
            .position(|r| r.end - r.start >= min_size)?;
        Some(self.ranges.swap_remove(index))
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

/// A fresh old-generation space over one region of `size` bytes.
pub fn fresh_space(size: usize) -> SpaceWithLinearArea<RegionFreeList> {
    SpaceWithLinearArea::new(SpaceId::Old, RegionFreeList::with_region(size))
}
