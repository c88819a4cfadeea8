//! Error types for bloomgate operations.
//!
//! Every fallible path in this crate is a construction path: a filter either
//! comes into existence fully sized, zeroed, and aligned, or it does not come
//! into existence at all. Insert and query are total functions and have no
//! error surface.
//!
//! # Error Propagation
//!
//! ```
//! use bloomgate::{DynamicBloom, Result};
//!
//! fn build_gate(bits: u32) -> Result<DynamicBloom> {
//!     let filter = DynamicBloom::new(bits, 6)?;
//!     Ok(filter)
//! }
//! # assert!(build_gate(1024).is_ok());
//! ```

use std::fmt;

/// Result type alias for bloomgate operations.
///
/// All fallible operations return [`Result<T>`] where the error type is
/// [`BloomGateError`].
pub type Result<T> = std::result::Result<T, BloomGateError>;

/// Errors that can occur while constructing a filter.
///
/// # Design Notes
/// - `Clone` + `PartialEq` enable testing and error comparison
/// - Variants carry the offending value so callers can report it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BloomGateError {
    /// The allocator could not satisfy the backing-buffer request.
    ///
    /// Allocator exhaustion is fatal to the constructing call: no partially
    /// valid filter is produced and there is no retry logic in this crate.
    AllocationFailed {
        /// Requested buffer size in bytes.
        size: usize,
    },

    /// A probe count of zero was requested.
    ///
    /// A filter that probes zero bits would report every key as present,
    /// which defeats the purpose of the component.
    InvalidProbeCount {
        /// The invalid probe count that was provided.
        count: u32,
    },

    /// A bit capacity of zero was requested.
    InvalidCapacity {
        /// The invalid capacity (in bits) that was provided.
        bits: u32,
    },
}

impl fmt::Display for BloomGateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailed { size } => {
                write!(f, "Failed to allocate {} bytes for filter storage.", size)
            }
            Self::InvalidProbeCount { count } => {
                write!(
                    f,
                    "Invalid probe count: {}. At least one probe is required.",
                    count
                )
            }
            Self::InvalidCapacity { bits } => {
                write!(
                    f,
                    "Invalid filter capacity: {} bits. Capacity must be greater than 0.",
                    bits
                )
            }
        }
    }
}

impl std::error::Error for BloomGateError {}

impl BloomGateError {
    /// Create an `AllocationFailed` error.
    #[must_use]
    pub fn allocation_failed(size: usize) -> Self {
        Self::AllocationFailed { size }
    }

    /// Create an `InvalidProbeCount` error.
    #[must_use]
    pub fn invalid_probe_count(count: u32) -> Self {
        Self::InvalidProbeCount { count }
    }

    /// Create an `InvalidCapacity` error.
    #[must_use]
    pub fn invalid_capacity(bits: u32) -> Self {
        Self::InvalidCapacity { bits }
    }
}
