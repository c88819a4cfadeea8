//! Builder for [`DynamicBloom`] filters.
//!
//! [`DynamicBloom::new`] covers the common case (flat layout, builtin hash,
//! plain heap allocation). The builder exposes the rest of the construction
//! surface: cache-line locality, the probe count, a hasher override, the
//! huge-page threshold, and a custom allocator.
//!
//! # Examples
//!
//! ## Blocked layout with huge pages
//!
//! ```
//! use bloomgate::builder::DynamicBloomBuilder;
//!
//! let filter = DynamicBloomBuilder::new(1 << 20)
//!     .locality(1)
//!     .num_probes(6)
//!     .huge_page_threshold(2 * 1024 * 1024)
//!     .build()
//!     .unwrap();
//!
//! assert!(filter.is_blocked());
//! ```
//!
//! ## Custom hasher
//!
//! ```
//! use bloomgate::builder::DynamicBloomBuilder;
//! use bloomgate::hash::BuiltinHasher;
//!
//! let filter = DynamicBloomBuilder::new(10_000)
//!     .hasher(BuiltinHasher::with_seed(42))
//!     .build()
//!     .unwrap();
//! filter.insert(b"k");
//! assert!(filter.may_contain(b"k"));
//! ```

use crate::alloc::{Allocator, HeapAllocator};
use crate::error::Result;
use crate::filter::DynamicBloom;
use crate::hash::{BloomHasher, DefaultHasher};

/// Default probe count when none is configured.
///
/// Six probes pair well with the ~10 bits/key sizing storage engines
/// typically use for a ~1% false-positive target.
pub const DEFAULT_NUM_PROBES: u32 = 6;

/// Configures and constructs a [`DynamicBloom`].
///
/// The requested capacity is the only required parameter and is taken by
/// [`new`](Self::new); every other knob has a default matching
/// [`DynamicBloom::new`].
pub struct DynamicBloomBuilder {
    total_bits: u32,
    locality: u32,
    num_probes: u32,
    hasher: Box<dyn BloomHasher>,
    huge_page_threshold: usize,
    allocator: Box<dyn Allocator>,
}

impl DynamicBloomBuilder {
    /// Start a builder for a filter of (at least) `total_bits` capacity.
    #[must_use]
    pub fn new(total_bits: u32) -> Self {
        Self {
            total_bits,
            locality: 0,
            num_probes: DEFAULT_NUM_PROBES,
            hasher: Box::new(DefaultHasher::new()),
            huge_page_threshold: 0,
            allocator: Box::new(HeapAllocator),
        }
    }

    /// Select the layout: 0 for flat, any positive value for cache-line
    /// blocking.
    #[must_use]
    pub fn locality(mut self, locality: u32) -> Self {
        self.locality = locality;
        self
    }

    /// Set the number of bits probed per key. Must be at least 1.
    #[must_use]
    pub fn num_probes(mut self, num_probes: u32) -> Self {
        self.num_probes = num_probes;
        self
    }

    /// Override the key hash function.
    #[must_use]
    pub fn hasher(mut self, hasher: impl BloomHasher + 'static) -> Self {
        self.hasher = Box::new(hasher);
        self
    }

    /// Request huge-page backing for buffers of at least `threshold` bytes.
    ///
    /// 0 (the default) disables huge pages entirely. The request is a hint;
    /// see [`crate::alloc`] for the exact semantics.
    #[must_use]
    pub fn huge_page_threshold(mut self, threshold: usize) -> Self {
        self.huge_page_threshold = threshold;
        self
    }

    /// Override the backing-buffer allocator.
    #[must_use]
    pub fn allocator(mut self, allocator: impl Allocator + 'static) -> Self {
        self.allocator = Box::new(allocator);
        self
    }

    /// Size, allocate, and construct the filter.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero capacity or probe count, or when the
    /// allocator cannot provide the backing buffer. Validation happens before
    /// the allocator is touched.
    pub fn build(self) -> Result<DynamicBloom> {
        DynamicBloom::with_config(
            self.total_bits,
            self.locality,
            self.num_probes,
            self.hasher,
            self.huge_page_threshold,
            &*self.allocator,
        )
    }
}

impl std::fmt::Debug for DynamicBloomBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicBloomBuilder")
            .field("total_bits", &self.total_bits)
            .field("locality", &self.locality)
            .field("num_probes", &self.num_probes)
            .field("huge_page_threshold", &self.huge_page_threshold)
            .finish_non_exhaustive()
    }
}
