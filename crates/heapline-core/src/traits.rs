//! Traits through which the allocator consults its owning heap.

use crate::address::Address;
use crate::config::HeapFlags;
use crate::id::SpaceId;

/// The heap as seen from the allocation core.
///
/// Every method is a query or a self-contained side effect on heap
/// memory; none of them may call back into the allocator. Filler
/// creation takes `&self` because buffers keep a shared reference to
/// the heap for their whole lifetime.
pub trait HeapContext {
    /// Process-wide allocation flags.
    fn flags(&self) -> &HeapFlags;

    /// Whether a garbage collection pause is running.
    fn is_collection_in_progress(&self) -> bool;

    /// Whether bump-pointer allocation is allowed to hand out slack.
    ///
    /// When false, every allocation must take the slow path.
    fn is_inline_allocation_enabled(&self) -> bool;

    /// Whether allocation observers may fire heap-wide.
    fn is_sampling_active(&self) -> bool;

    /// Write a filler covering `[address, address + size)` so that heap
    /// walkers skip it.
    fn create_filler_at(&self, address: Address, size: usize);
}

/// Lookup of instantiated spaces by id.
///
/// Some configurations omit spaces, so any slot may be absent.
pub trait SpaceRegistry {
    /// The space type stored in each slot.
    type Space: ?Sized;

    /// The space in slot `id`, if instantiated.
    fn space(&self, id: SpaceId) -> Option<&Self::Space>;
}
