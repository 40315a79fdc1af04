//! heapline: the bump-pointer linear allocation core of a garbage-collected
//! heap.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the heapline sub-crates. Most users only need this one dependency.
//!
//! # Quick start
//!
//! ```rust
//! use std::ops::Range;
//! use heapline::prelude::*;
//!
//! // The heap owns memory and phase flags; the allocator only asks.
//! struct Heap {
//!     flags: HeapFlags,
//! }
//!
//! impl HeapContext for Heap {
//!     fn flags(&self) -> &HeapFlags { &self.flags }
//!     fn is_collection_in_progress(&self) -> bool { false }
//!     fn is_inline_allocation_enabled(&self) -> bool { true }
//!     fn is_sampling_active(&self) -> bool { true }
//!     fn create_filler_at(&self, _address: Address, _size: usize) {}
//! }
//!
//! // One free range, handed out whole.
//! struct OneRange(Option<Range<Address>>);
//!
//! impl FreeList for OneRange {
//!     fn allocate(&mut self, min_size: usize) -> Option<Range<Address>> {
//!         let fits = self.0.as_ref().is_some_and(|r| r.end - r.start >= min_size);
//!         if fits { self.0.take() } else { None }
//!     }
//!     fn free(&mut self, start: Address, size: usize) {
//!         self.0 = Some(start..start + size);
//!     }
//!     fn available(&self) -> usize {
//!         self.0.as_ref().map_or(0, |r| r.end - r.start)
//!     }
//! }
//!
//! let heap = Heap { flags: HeapFlags::default() };
//! heap.flags().validate().unwrap();
//!
//! let base = Address::new(0x1000);
//! let mut space = SpaceWithLinearArea::new(SpaceId::Old, OneRange(Some(base..base + 4096)));
//!
//! let a = space
//!     .allocate_raw(&heap, 32, AllocationAlignment::TaggedAligned, AllocationOrigin::Runtime)
//!     .unwrap();
//! let b = space
//!     .allocate_raw(&heap, 16, AllocationAlignment::TaggedAligned, AllocationOrigin::Runtime)
//!     .unwrap();
//! assert_eq!(a, base);
//! assert_eq!(b, base + 32);
//! assert_eq!(space.stats().total_bytes(), 48);
//!
//! // The pure limit policy can be used on its own.
//! let limit = compute_limit(base, base + 500, 16, &LimitInputs::default());
//! assert_eq!(limit, base + 500);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `heapline-core` | Addresses, alignment, space ids, flags, heap traits |
//! | [`alloc`] | `heapline-alloc` | Areas, limit policy, buffers, observers, spaces |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Addresses, alignment, space ids, flags and heap traits (`heapline-core`).
pub use heapline_core as types;

/// Linear allocation areas, the limit policy, scoped buffers, observers and
/// the linear-area space (`heapline-alloc`).
pub use heapline_alloc as alloc;

/// Common imports for typical heapline usage.
///
/// ```rust
/// use heapline::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use heapline_core::{
        Address, AllocationAlignment, AllocationOrigin, HeapContext, HeapFlags, SpaceId,
        SpaceRegistry,
    };

    // Errors
    pub use heapline_alloc::AllocationError;
    pub use heapline_core::ConfigError;

    // Allocation
    pub use heapline_alloc::{
        compute_limit, AllocationObserver, AllocationStep, FreeList, LimitInputs,
        LinearAllocationArea, LocalAllocationBuffer, ObserverId, SpaceIterator, SpaceTable,
        SpaceWithLinearArea,
    };
}
