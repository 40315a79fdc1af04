//! Bump-pointer linear allocation for heapline spaces.
//!
//! A space hands out memory by bumping a `top` pointer through a linear
//! allocation area until it reaches `limit`, then refills from its free
//! list. This crate holds the pieces of that scheme that do not depend on
//! how the heap tracks pages or collects garbage.
//!
//! # Architecture
//!
//! ```text
//! SpaceWithLinearArea (one per mutable space)
//! ├── LinearAllocationArea   start ≤ top ≤ limit, the live area
//! ├── AllocationCounter      observers + byte counters
//! ├── FreeList (trait)       supplies raw ranges
//! └── compute_limit()        trims each new area
//!
//! LocalAllocationBuffer      scoped owner of a leased area; fills its
//!                            tail on close or drop
//! SpaceIterator              ascending walk over populated mutable spaces
//! ```
//!
//! Everything the core reads from its heap goes through
//! [`heapline_core::HeapContext`]; the limit policy itself is a pure
//! function over [`LimitInputs`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod area;
pub mod error;
pub mod free_list;
pub mod iter;
pub mod lab;
pub mod limit;
pub mod observer;
pub mod space;
pub mod stats;

#[cfg(test)]
mod testing;

// Public re-exports for the primary API surface.
pub use area::LinearAllocationArea;
pub use error::AllocationError;
pub use free_list::FreeList;
pub use iter::{SpaceIterator, SpaceTable};
pub use lab::LocalAllocationBuffer;
pub use limit::{compute_limit, LimitInputs, SamplingWindow};
pub use observer::{AllocationCounter, AllocationObserver, AllocationStep, ObserverId};
pub use space::SpaceWithLinearArea;
pub use stats::AllocationStats;
