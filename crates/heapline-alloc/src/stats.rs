//! Per-space allocation counters.
//!
//! [`AllocationStats`] is updated by the space on every allocation and
//! lifecycle event. It is plain data; telemetry and tests read it.

use heapline_core::AllocationOrigin;

/// Cumulative counters for one linear-area space.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllocationStats {
    /// Bytes allocated on behalf of the runtime.
    pub runtime_bytes: u64,
    /// Bytes allocated by the collector.
    pub gc_bytes: u64,
    /// Bytes allocated for generated code.
    pub generated_code_bytes: u64,
    /// Number of objects allocated through the space.
    pub objects: u64,
    /// Times a new linear area was carved from the free list.
    pub refills: u64,
    /// Bytes covered by fillers: closed tails and alignment padding.
    pub filler_bytes: u64,
    /// Times at least one observer fired.
    pub observer_steps: u64,
    /// Buffers handed out through `lease_buffer`.
    pub leased_buffers: u64,
}

impl AllocationStats {
    /// Record one object of `bytes` for `origin`.
    pub fn record_allocation(&mut self, origin: AllocationOrigin, bytes: usize) {
        let bytes = bytes as u64;
        match origin {
            AllocationOrigin::Runtime => self.runtime_bytes += bytes,
            AllocationOrigin::Gc => self.gc_bytes += bytes,
            AllocationOrigin::GeneratedCode => self.generated_code_bytes += bytes,
        }
        self.objects += 1;
    }

    /// Bytes allocated across all origins.
    pub fn total_bytes(&self) -> u64 {
        self.runtime_bytes + self.gc_bytes + self.generated_code_bytes
    }
}
