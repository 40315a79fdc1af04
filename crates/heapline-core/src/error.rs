//! Error types for heap configuration.

use std::error::Error;
use std::fmt;

/// Errors detected by [`HeapFlags::validate`](crate::HeapFlags::validate).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Object alignment is not a power of two, or exceeds the double
    /// alignment.
    InvalidObjectAlignment {
        /// The configured alignment.
        value: usize,
    },
    /// Stress marking would cap buffers at zero bytes.
    ZeroStressLabLimit,
    /// Maximum regular object size is zero or not a multiple of the
    /// object alignment.
    InvalidMaxObjectSize {
        /// The configured size.
        value: usize,
        /// The object alignment it must be a multiple of.
        alignment: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidObjectAlignment { value } => {
                write!(
                    f,
                    "invalid object alignment {value}: must be a power of two no larger than 8"
                )
            }
            Self::ZeroStressLabLimit => write!(f, "stress LAB limit must be non-zero"),
            Self::InvalidMaxObjectSize { value, alignment } => {
                write!(
                    f,
                    "invalid max regular object size {value}: must be a non-zero multiple of {alignment}"
                )
            }
        }
    }
}

impl Error for ConfigError {}
