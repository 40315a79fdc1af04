//! Heap-wide flags consulted by the allocator.

use crate::address::{DOUBLE_ALIGNMENT, TAGGED_SIZE};
use crate::error::ConfigError;

/// Process-wide allocation flags.
///
/// Owned and toggled by the surrounding heap; the allocator only reads
/// them. Validated once with [`validate`](HeapFlags::validate) when the
/// heap is set up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeapFlags {
    /// Force tiny linear allocation buffers so refill paths run constantly.
    ///
    /// Default: false.
    pub stress_marking: bool,

    /// Upper bound on a buffer's size while `stress_marking` is set.
    ///
    /// Default: 64 bytes. Must be non-zero.
    pub stress_lab_limit: usize,

    /// Object alignment unit in bytes.
    ///
    /// Default: [`TAGGED_SIZE`]. Must be a power of two no larger than
    /// [`DOUBLE_ALIGNMENT`].
    pub object_alignment: usize,

    /// Largest request a linear-area space serves.
    ///
    /// Default: 128 KiB. Must be a multiple of `object_alignment`.
    pub max_regular_object_size: usize,
}

impl HeapFlags {
    /// Default cap on buffer size under stress marking.
    pub const DEFAULT_STRESS_LAB_LIMIT: usize = 64;

    /// Default largest regular object.
    pub const DEFAULT_MAX_REGULAR_OBJECT_SIZE: usize = 128 * 1024;

    /// Default flags with stress marking turned on.
    pub fn stress() -> Self {
        Self {
            stress_marking: true,
            ..Self::default()
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let align = self.object_alignment;
        if !align.is_power_of_two() || align > DOUBLE_ALIGNMENT {
            return Err(ConfigError::InvalidObjectAlignment { value: align });
        }
        if self.stress_lab_limit == 0 {
            return Err(ConfigError::ZeroStressLabLimit);
        }
        if self.max_regular_object_size == 0 || self.max_regular_object_size % align != 0 {
            return Err(ConfigError::InvalidMaxObjectSize {
                value: self.max_regular_object_size,
                alignment: align,
            });
        }
        Ok(())
    }
}

impl Default for HeapFlags {
    fn default() -> Self {
        Self {
            stress_marking: false,
            stress_lab_limit: Self::DEFAULT_STRESS_LAB_LIMIT,
            object_alignment: TAGGED_SIZE,
            max_regular_object_size: Self::DEFAULT_MAX_REGULAR_OBJECT_SIZE,
        }
    }
}
