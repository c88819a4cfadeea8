//! bloomgate: a dynamic Bloom filter for gating expensive storage lookups.
//!
//! A storage engine answering point reads pays for a disk seek every time it
//! checks a table that turns out not to hold the key. `bloomgate` provides the
//! cheap pre-check: a fixed-capacity, probabilistic set-membership filter that
//! answers "is this key definitely absent?" with **zero false negatives** and
//! a tunable false-positive rate.
//!
//! # Quick Start
//!
//! ```
//! use bloomgate::DynamicBloom;
//!
//! // ~10 bits per expected key and 6 probes give roughly a 1% FP rate.
//! let filter = DynamicBloom::new(100_000, 6).unwrap();
//!
//! filter.insert(b"row:42");
//!
//! // Inserted keys are always reported present. Keys never inserted are
//! // usually reported absent; when one is reported present instead, that is
//! // a false positive. There is no wrong "absent".
//! assert!(filter.may_contain(b"row:42"));
//! ```
//!
//! # Cache-Line Locality
//!
//! A large flat filter scatters each key's probes across the whole bit
//! array, costing up to `num_probes` cache misses per operation. The blocked layout
//! confines all of a key's probes to one cache-line-sized block, bounding
//! every insert and query to a single line of memory:
//!
//! ```
//! use bloomgate::builder::DynamicBloomBuilder;
//!
//! let filter = DynamicBloomBuilder::new(1 << 22)
//!     .locality(1)
//!     .num_probes(6)
//!     .build()
//!     .unwrap();
//! assert!(filter.is_blocked());
//! ```
//!
//! # Concurrency
//!
//! `insert` and `may_contain` take `&self` and are safe to call concurrently
//! from any number of threads with no external locking. Bit-setting is an
//! atomic fetch-or, so racing writers cannot lose each other's updates, and
//! bits are monotonic: once set, never cleared.
//!
//! ```
//! use bloomgate::DynamicBloom;
//! use std::sync::Arc;
//!
//! let filter = Arc::new(DynamicBloom::new(64 * 1024, 6).unwrap());
//! let f = Arc::clone(&filter);
//! std::thread::spawn(move || f.insert(b"from-another-thread"))
//!     .join()
//!     .unwrap();
//! ```
//!
//! # What This Crate Does Not Do
//!
//! - **No deletion**: membership is append-only.
//! - **No resizing**: capacity is fixed at construction; build a new filter
//!   to reset.
//! - **No value storage**: this is a membership filter, not a map.
//! - **No parameter policy**: choosing bits-per-key and probe count for a
//!   target false-positive rate is the caller's job.
//!
//! # Capability Seams
//!
//! Two collaborators are injected rather than hard-wired:
//!
//! - [`hash::BloomHasher`]: the 32-bit key hash, defaulting to a fixed
//!   builtin.
//! - [`alloc::Allocator`]: the zeroed backing-buffer provider, defaulting to
//!   the heap with opportunistic huge-page backing on Linux.
//!
//! Allocation diagnostics are emitted through the `log` facade; install any
//! `log`-compatible sink to see them.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Backing-buffer allocation: the `Allocator` capability and heap default.
pub mod alloc;

/// Builder covering the full construction surface.
pub mod builder;

/// Error types and result alias.
pub mod error;

/// The filter itself.
pub mod filter;

/// Key hashing: the `BloomHasher` capability and implementations.
pub mod hash;

/// Probe-position generation shared by insert and query.
pub mod probe;

pub use builder::DynamicBloomBuilder;
pub use error::{BloomGateError, Result};
pub use filter::DynamicBloom;
pub use hash::BloomHasher;

/// Prelude module for convenient imports.
///
/// # Examples
///
/// ```
/// use bloomgate::prelude::*;
///
/// let filter = DynamicBloom::new(1000, 4).unwrap();
/// filter.insert(b"hello");
/// assert!(filter.may_contain(b"hello"));
/// ```
pub mod prelude {
    pub use crate::alloc::{AlignedBuffer, Allocator, HeapAllocator};
    pub use crate::builder::DynamicBloomBuilder;
    pub use crate::error::{BloomGateError, Result};
    pub use crate::filter::DynamicBloom;
    pub use crate::hash::{BloomHasher, BuiltinHasher};

    #[cfg(feature = "xxhash")]
    pub use crate::hash::XxHasher;
}
