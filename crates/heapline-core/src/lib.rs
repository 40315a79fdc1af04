//! Core types and traits for the heapline linear allocation core.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the allocator and its heap: addresses and
//! alignment arithmetic, space identifiers, heap-wide flags, and the
//! traits through which the allocator consults its owning heap.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod address;
pub mod config;
pub mod error;
pub mod id;
pub mod traits;

pub use address::{
    round_down, round_up, Address, AllocationAlignment, DOUBLE_ALIGNMENT, TAGGED_SIZE,
};
pub use config::HeapFlags;
pub use error::ConfigError;
pub use id::{AllocationOrigin, SpaceId};
pub use traits::{HeapContext, SpaceRegistry};
