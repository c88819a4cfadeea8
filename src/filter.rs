//! The dynamic Bloom filter.
//!
//! `DynamicBloom` is a fixed-capacity bit array supporting concurrent insert
//! and concurrent query, used by storage engines to answer "is this key
//! definitely absent?" before paying for a disk read. It never produces a
//! false negative; the false-positive rate follows from the sizing the caller
//! chose.
//!
//! # Two Layouts
//!
//! - **Flat** (`locality = 0`): one contiguous bit array; probes scatter over
//!   the whole range. Best false-positive rate for a given size.
//! - **Blocked** (`locality > 0`): the array is split into cache-line-sized
//!   blocks and each key's probes are confined to one block, so an insert or
//!   query touches at most one cache line. Slightly higher false-positive
//!   variance, much friendlier to the memory subsystem.
//!
//! # Concurrency Model
//!
//! The filter has no threads of its own. `insert` and `may_contain` take
//! `&self` and may be called concurrently from any number of threads without
//! external locking:
//!
//! - bit-set is an atomic `fetch_or`, so concurrent writers cannot lose each
//!   other's bits;
//! - bits are monotonic (never cleared), so readers tolerate any interleaving
//!   and `Relaxed` ordering suffices on both sides.
//!
//! # Examples
//!
//! ```
//! use bloomgate::DynamicBloom;
//!
//! let filter = DynamicBloom::new(8 * 1024, 6).unwrap();
//! filter.insert(b"user:1001");
//!
//! assert!(filter.may_contain(b"user:1001"));
//! ```
//!
//! Shared across threads:
//!
//! ```
//! use bloomgate::DynamicBloom;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let filter = Arc::new(DynamicBloom::new(64 * 1024, 6).unwrap());
//!
//! let handles: Vec<_> = (0..4u32)
//!     .map(|t| {
//!         let f = Arc::clone(&filter);
//!         thread::spawn(move || {
//!             for i in 0..100u32 {
//!                 f.insert(&(t * 1000 + i).to_le_bytes());
//!             }
//!         })
//!     })
//!     .collect();
//! for h in handles {
//!     h.join().unwrap();
//! }
//!
//! assert!(filter.may_contain(&1001u32.to_le_bytes()));
//! ```

use crate::alloc::{AlignedBuffer, Allocator, HeapAllocator};
use crate::error::{BloomGateError, Result};
use crate::hash::{BloomHasher, DefaultHasher};
use crate::probe::{ProbeSequence, CACHE_LINE_BITS, CACHE_LINE_SIZE};
use std::fmt;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU8, Ordering};

// Largest geometries whose bit count still fits in 32 bits after rounding.
// The requested capacity is a hint, so oversized requests clamp here rather
// than fail.
const MAX_FLAT_BITS: u32 = u32::MAX & !7;
const MAX_BLOCKS: u32 = {
    let blocks = u32::MAX / CACHE_LINE_BITS;
    // Keep the clamp odd, matching the block-count invariant.
    if blocks % 2 == 0 {
        blocks - 1
    } else {
        blocks
    }
};

/// A concurrent, fixed-capacity Bloom filter over opaque byte keys.
///
/// Constructed once with a fixed geometry; supports an unbounded number of
/// concurrent [`insert`](Self::insert) and [`may_contain`](Self::may_contain)
/// calls; releases its backing buffer exactly once on drop. There is no
/// resize, clear, or delete; a fresh filter must be constructed to reset
/// state.
///
/// Use [`DynamicBloom::new`] for the default flat configuration, or
/// [`DynamicBloomBuilder`](crate::builder::DynamicBloomBuilder) for the full
/// configuration surface (locality, hasher override, huge pages, custom
/// allocator).
pub struct DynamicBloom {
    /// Logical bit capacity; positive multiple of 8.
    total_bits: u32,
    /// Cache-line blocks; 0 means flat layout. Odd when non-zero.
    num_blocks: u32,
    /// Bits set/tested per key.
    num_probes: u32,
    hasher: Box<dyn BloomHasher>,
    /// Cache-line-aligned origin inside `buf` (equal to the buffer start in
    /// flat mode). Bit offsets are computed from here.
    data: NonNull<AtomicU8>,
    /// Owns the allocation; dropped exactly once with the filter.
    buf: AlignedBuffer,
}

impl DynamicBloom {
    /// Create a flat filter with the builtin hash and heap allocation.
    ///
    /// `total_bits` is rounded up to a multiple of 8. For the blocked layout,
    /// a custom hasher, or huge pages, use
    /// [`DynamicBloomBuilder`](crate::builder::DynamicBloomBuilder).
    ///
    /// # Errors
    ///
    /// Returns an error if `total_bits` or `num_probes` is zero, or if the
    /// backing buffer cannot be allocated.
    ///
    /// # Examples
    ///
    /// ```
    /// use bloomgate::DynamicBloom;
    ///
    /// let filter = DynamicBloom::new(1000, 6).unwrap();
    /// assert_eq!(filter.total_bits(), 1000);
    /// assert!(!filter.is_blocked());
    /// ```
    pub fn new(total_bits: u32, num_probes: u32) -> Result<Self> {
        Self::with_config(
            total_bits,
            0,
            num_probes,
            Box::new(DefaultHasher::new()),
            0,
            &HeapAllocator,
        )
    }

    /// Full constructor; the builder is the public face of this surface.
    pub(crate) fn with_config(
        total_bits_requested: u32,
        locality: u32,
        num_probes: u32,
        hasher: Box<dyn BloomHasher>,
        huge_page_threshold: usize,
        allocator: &dyn Allocator,
    ) -> Result<Self> {
        if num_probes == 0 {
            return Err(BloomGateError::invalid_probe_count(num_probes));
        }
        if total_bits_requested == 0 {
            return Err(BloomGateError::invalid_capacity(total_bits_requested));
        }

        let (total_bits, num_blocks) = if locality > 0 {
            // Round up to whole cache-line blocks, then force the block count
            // odd so block selection by modulo involves more hash bits.
            let line = u64::from(CACHE_LINE_BITS);
            let mut blocks =
                (((u64::from(total_bits_requested) + line - 1) / line) as u32).min(MAX_BLOCKS);
            if blocks % 2 == 0 {
                blocks += 1;
            }
            (blocks * CACHE_LINE_BITS, blocks)
        } else {
            let bits = match total_bits_requested.checked_add(7) {
                Some(n) => n / 8 * 8,
                None => MAX_FLAT_BITS,
            };
            (bits, 0)
        };

        let mut size = (total_bits / 8) as usize;
        if num_blocks > 0 {
            // Room to slide the data origin forward to a cache-line boundary.
            size += CACHE_LINE_SIZE - 1;
        }

        let buf = allocator.allocate_aligned(size, huge_page_threshold)?;

        let raw = buf.as_ptr();
        let offset = if num_blocks > 0 {
            cache_line_offset(raw as usize)
        } else {
            0
        };
        // SAFETY: offset < CACHE_LINE_SIZE and the buffer was over-allocated
        // by CACHE_LINE_SIZE - 1 bytes exactly when offset can be non-zero,
        // so data..data + total_bits/8 stays in bounds.
        let data = unsafe {
            NonNull::new_unchecked(raw.add(offset).cast_mut().cast::<AtomicU8>())
        };

        log::trace!(
            "filter geometry: {} bits, {} blocks, {} probes",
            total_bits,
            num_blocks,
            num_probes
        );

        Ok(Self {
            total_bits,
            num_blocks,
            num_probes,
            hasher,
            data,
            buf,
        })
    }

    /// Record a key as (probably) a member.
    ///
    /// Safe to call concurrently with other inserts and with queries.
    /// Idempotent: re-inserting a key does not change the bit state.
    #[inline]
    pub fn insert(&self, key: &[u8]) {
        self.insert_hash(self.hasher.hash_bytes(key));
    }

    /// [`insert`](Self::insert) for a pre-computed key hash.
    ///
    /// The hash must come from the same hash function the filter queries
    /// with, or membership answers are meaningless.
    #[inline]
    pub fn insert_hash(&self, h: u32) {
        for bitpos in self.probes(h) {
            self.set_bit(bitpos);
        }
    }

    /// Test probable membership.
    ///
    /// `false` means the key is definitely absent (never inserted). `true`
    /// means probably present, with a false-positive probability determined
    /// by the filter's sizing.
    #[inline]
    #[must_use]
    pub fn may_contain(&self, key: &[u8]) -> bool {
        self.may_contain_hash(self.hasher.hash_bytes(key))
    }

    /// [`may_contain`](Self::may_contain) for a pre-computed key hash.
    #[inline]
    #[must_use]
    pub fn may_contain_hash(&self, h: u32) -> bool {
        for bitpos in self.probes(h) {
            if !self.bit_is_set(bitpos) {
                return false;
            }
        }
        true
    }

    /// Hint the CPU to pull a key's cache line into cache ahead of a probe.
    ///
    /// Useful when the caller can overlap the hint with other work before the
    /// actual [`may_contain`](Self::may_contain). No-op in flat mode and on
    /// architectures without a prefetch intrinsic.
    #[inline]
    pub fn prefetch(&self, key: &[u8]) {
        self.prefetch_hash(self.hasher.hash_bytes(key));
    }

    /// [`prefetch`](Self::prefetch) for a pre-computed key hash.
    #[inline]
    pub fn prefetch_hash(&self, h: u32) {
        if self.num_blocks == 0 {
            return;
        }
        let byte = (h % self.num_blocks) as usize * CACHE_LINE_SIZE;
        #[cfg(target_arch = "x86_64")]
        // SAFETY: byte indexes the first byte of a block, which lies within
        // the data region for every block index below num_blocks.
        unsafe {
            use std::arch::x86_64::{_mm_prefetch, _MM_HINT_T0};
            _mm_prefetch(self.data.as_ptr().add(byte).cast::<i8>(), _MM_HINT_T0);
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            let _ = byte;
        }
    }

    /// Logical bit capacity after rounding. Positive multiple of 8.
    #[inline]
    #[must_use]
    pub fn total_bits(&self) -> u32 {
        self.total_bits
    }

    /// Number of bits set/tested per key.
    #[inline]
    #[must_use]
    pub fn num_probes(&self) -> u32 {
        self.num_probes
    }

    /// Number of cache-line blocks; 0 for the flat layout, odd otherwise.
    #[inline]
    #[must_use]
    pub fn num_blocks(&self) -> u32 {
        self.num_blocks
    }

    /// Whether the cache-line-blocked layout is in use.
    #[inline]
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.num_blocks > 0
    }

    /// Bytes of backing memory held by this filter, including any alignment
    /// padding in the blocked layout.
    #[inline]
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.buf.len()
    }

    /// Fraction of bits currently set, in `[0, 1]`.
    ///
    /// O(total_bits / 8). Diagnostic only: concurrent inserts make the
    /// result a snapshot, not an invariant.
    #[must_use]
    pub fn saturation(&self) -> f64 {
        let bytes = (self.total_bits / 8) as usize;
        let mut ones: u64 = 0;
        for i in 0..bytes {
            ones += u64::from(self.byte(i).load(Ordering::Relaxed).count_ones());
        }
        ones as f64 / f64::from(self.total_bits)
    }

    #[inline]
    fn probes(&self, h: u32) -> ProbeSequence {
        if self.num_blocks > 0 {
            ProbeSequence::blocked(h, self.num_probes, self.num_blocks)
        } else {
            ProbeSequence::flat(h, self.num_probes, self.total_bits)
        }
    }

    #[inline]
    fn byte(&self, index: usize) -> &AtomicU8 {
        debug_assert!(index < (self.total_bits / 8) as usize);
        // SAFETY: index < total_bits/8 and the data region holds exactly
        // total_bits/8 addressable bytes starting at the aligned origin.
        unsafe { &*self.data.as_ptr().add(index) }
    }

    #[inline]
    fn set_bit(&self, bitpos: u32) {
        // Relaxed fetch_or: the RMW itself guarantees no sibling bit set by a
        // racing writer is lost; readers only need to observe a monotonically
        // growing bit state.
        self.byte((bitpos / 8) as usize)
            .fetch_or(1 << (bitpos % 8), Ordering::Relaxed);
    }

    #[inline]
    fn bit_is_set(&self, bitpos: u32) -> bool {
        self.byte((bitpos / 8) as usize).load(Ordering::Relaxed) & (1 << (bitpos % 8)) != 0
    }

    #[cfg(test)]
    fn data_addr(&self) -> usize {
        self.data.as_ptr() as usize
    }

    #[cfg(test)]
    fn raw_addr(&self) -> usize {
        self.buf.as_ptr() as usize
    }
}

/// Bytes to advance `addr` to the next cache-line boundary (0 if aligned).
#[inline]
fn cache_line_offset(addr: usize) -> usize {
    let rem = addr % CACHE_LINE_SIZE;
    if rem == 0 {
        0
    } else {
        CACHE_LINE_SIZE - rem
    }
}

impl fmt::Debug for DynamicBloom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicBloom")
            .field("total_bits", &self.total_bits)
            .field("num_blocks", &self.num_blocks)
            .field("num_probes", &self.num_probes)
            .finish_non_exhaustive()
    }
}

// SAFETY: the bit array is reached only through atomic operations, the
// buffer is exclusively owned, and the hasher is Send + Sync by trait bound.
// The raw data pointer grants no unsynchronized mutation.
unsafe impl Send for DynamicBloom {}
unsafe impl Sync for DynamicBloom {}
