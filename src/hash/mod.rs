//! Key hashing for the filter.
//!
//! # Module Structure
//!
//! ```text
//! hash/
//! ├── hasher.rs  - BloomHasher trait and the builtin default hash
//! ├── xxhash.rs  - XXH32 wrapper (optional, feature = "xxhash")
//! └── mod.rs     - This file (public API)
//! ```
//!
//! The filter consumes exactly one method: `hash_bytes(&[u8]) -> u32`.
//! Everything else about probe derivation lives in [`crate::probe`], which
//! synthesizes all probe positions from this single hash computation.

pub mod hasher;

#[cfg(feature = "xxhash")]
pub mod xxhash;

pub use hasher::{BloomHasher, BuiltinHasher};

#[cfg(feature = "xxhash")]
pub use xxhash::XxHasher;

/// Type alias for the hasher used when no override is supplied.
///
/// Gives code a stable name for the default without depending on the
/// specific implementation (currently [`BuiltinHasher`]).
pub type DefaultHasher = BuiltinHasher;
