//! XXH32 hasher for filter keys.
//!
//! XXHash is a fast non-cryptographic hash family by Yann Collet; the 32-bit
//! variant matches this crate's hash width directly, with no truncation. This
//! module wraps the `xxhash-rust` implementation.
//!
//! # When to Use
//!
//! The builtin hash is adequate for typical storage-engine keys. Prefer XXH32
//! when keys are large (hundreds of bytes and up) or when an externally
//! specified, industry-standard algorithm is required.
//!
//! # Examples
//!
//! ```
//! use bloomgate::hash::{BloomHasher, XxHasher};
//!
//! let hasher = XxHasher::new();
//! let hash = hasher.hash_bytes(b"hello world");
//!
//! // Different seeds produce independent hash functions.
//! let h1 = XxHasher::with_seed(0).hash_bytes(b"test");
//! let h2 = XxHasher::with_seed(1).hash_bytes(b"test");
//! assert_ne!(h1, h2);
//! ```

use super::hasher::BloomHasher;
use xxhash_rust::xxh32::xxh32;

/// XXH32 hasher implementation.
///
/// `Send + Sync` and freely shareable; the seed is the only state.
#[derive(Debug, Clone, Copy)]
pub struct XxHasher {
    seed: u32,
}

impl XxHasher {
    /// Create an XXH32 hasher with seed 0.
    ///
    /// Seed 0 keeps hash values stable across runs and versions.
    #[must_use]
    pub const fn new() -> Self {
        Self { seed: 0 }
    }

    /// Create an XXH32 hasher with an explicit seed.
    #[must_use]
    pub const fn with_seed(seed: u32) -> Self {
        Self { seed }
    }
}

impl Default for XxHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl BloomHasher for XxHasher {
    #[inline]
    fn hash_bytes(&self, bytes: &[u8]) -> u32 {
        xxh32(bytes, self.seed)
    }
}
