//! Test utilities and mock types for heapline development.
//!
//! Provides a [`MockHeap`] implementing [`HeapContext`] with settable
//! phase flags and a filler log, a [`MockFreeList`] that records every
//! range it hands out or takes back, and observer fixtures in
//! [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, Once};

use heapline_alloc::FreeList;
use heapline_core::{Address, HeapContext, HeapFlags};

/// Mock heap with switchable phase flags.
///
/// Every filler the allocator writes is appended to a log. Inspect it
/// with [`fillers`](MockHeap::fillers).
pub struct MockHeap {
    flags: HeapFlags,
    in_gc: AtomicBool,
    inline_allocation: AtomicBool,
    sampling: AtomicBool,
    fillers: Mutex<Vec<(Address, usize)>>,
}

impl MockHeap {
    pub fn new(flags: HeapFlags) -> Self {
        Self {
            flags,
            in_gc: AtomicBool::new(false),
            inline_allocation: AtomicBool::new(true),
            sampling: AtomicBool::new(true),
            fillers: Mutex::new(Vec::new()),
        }
    }

    pub fn set_in_gc(&self, value: bool) {
        self.in_gc.store(value, Ordering::Relaxed);
    }

    pub fn set_inline_allocation(&self, value: bool) {
        self.inline_allocation.store(value, Ordering::Relaxed);
    }

    pub fn set_sampling(&self, value: bool) {
        self.sampling.store(value, Ordering::Relaxed);
    }

    /// Fillers written so far, in order.
    pub fn fillers(&self) -> Vec<(Address, usize)> {
        self.fillers.lock().unwrap().clone()
    }
}

impl Default for MockHeap {
    fn default() -> Self {
        Self::new(HeapFlags::default())
    }
}

impl HeapContext for MockHeap {
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
        assert!(size > 0, "empty filler at {address}");
        self.fillers.lock().unwrap().push((address, size));
    }
}

/// First-fit free list that never splits or coalesces.
///
/// Keeps a log of handed-out and returned ranges for assertions.
#[derive(Default)]
pub struct MockFreeList {
    ranges: Vec<Range<Address>>,
    pub handed_out: Vec<Range<Address>>,
    pub freed: Vec<Range<Address>>,
}

impl MockFreeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// A list holding one region.
    pub fn with_region(start: usize, size: usize) -> Self {
        let mut list = Self::new();
        list.add_region(Address::new(start), size);
        list
    }

    /// Make `[start, start + size)` available without logging it.
    pub fn add_region(&mut self, start: Address, size: usize) {
        self.ranges.push(start..start + size);
    }
}

impl FreeList for MockFreeList {
    fn allocate(&mut self, min_size: usize) -> Option<Range<Address>> {
        let index = self
            .ranges
            .iter()
            .position(|r| r.end - r.start >= min_size)?;
        let range = self.ranges.remove(index);
        self.handed_out.push(range.clone());
        Some(range)
    }

    fn free(&mut self, start: Address, size: usize) {
        if size == 0 {
            return;
        }
        self.ranges.push(start..start + size);
        self.freed.push(start..start + size);
    }

    fn available(&self) -> usize {
        self.ranges.iter().map(|r| r.end - r.start).sum()
    }
}

/// Parts of `region` covered by neither an object nor a filler.
///
/// A heap is walkable when this is empty for every page in use.
pub fn coverage_gaps(
    region: Range<Address>,
    objects: &[(Address, usize)],
    fillers: &[(Address, usize)],
) -> Vec<Range<Address>> {
    let mut spans: Vec<Range<Address>> = objects
        .iter()
        .chain(fillers)
        .map(|&(start, size)| start..start + size)
        .collect();
    spans.sort_by_key(|r| r.start);

    let mut gaps = Vec::new();
    let mut cursor = region.start;
    for span in spans {
        if span.start > cursor {
            gaps.push(cursor..span.start.min(region.end));
        }
        cursor = cursor.max(span.end);
        if cursor >= region.end {
            break;
        }
    }
    if cursor < region.end {
        gaps.push(cursor..region.end);
    }
    gaps.retain(|g| g.start < g.end);
    gaps
}

/// Install a `tracing` subscriber for tests, honouring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
