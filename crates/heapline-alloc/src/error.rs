//! Allocation error types.

use std::error::Error;
use std::fmt;

use heapline_core::SpaceId;

/// Why a space could not serve an allocation request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllocationError {
    /// The free list has no region large enough. The heap is expected to
    /// collect garbage and retry.
    RetryAfterGc {
        /// The space that ran dry.
        space: SpaceId,
        /// Bytes requested, worst-case alignment padding included.
        requested: usize,
    },
    /// The request exceeds the largest regular object and belongs in a
    /// large-object space.
    SizeTooLarge {
        /// Bytes requested.
        requested: usize,
        /// Largest regular object size.
        max: usize,
    },
}

impl fmt::Display for AllocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RetryAfterGc { space, requested } => {
                write!(
                    f,
                    "{space} space exhausted: no free region for {requested} bytes, retry after gc"
                )
            }
            Self::SizeTooLarge { requested, max } => {
                write!(f, "allocation of {requested} bytes exceeds regular object limit {max}")
            }
        }
    }
}

impl Error for AllocationError {}
