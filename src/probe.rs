//! Probe-position generation.
//!
//! One 32-bit key hash is stretched into `k` quasi-independent bit positions
//! by double hashing: a second value `delta` is derived from the hash by a
//! fixed bit rotation, and probe `i` lands at `h + i*delta` reduced into the
//! target range. This costs one real hash computation per key instead of `k`
//! while keeping collision behavior close enough for practical
//! false-positive targets (Kirsch & Mitzenmacher 2006).
//!
//! Insert and query share this single implementation, so the two paths can
//! never disagree about where a key's bits live.
//!
//! # Flat vs. Blocked
//!
//! - **Flat**: probes range over the whole bit array.
//! - **Blocked**: the hash first selects one cache-line-sized block, and all
//!   probes stay inside it. One insert or query then touches at most one
//!   cache line of the backing memory.
//!
//! # Examples
//!
//! ```
//! use bloomgate::probe::ProbeSequence;
//!
//! let probes: Vec<u32> = ProbeSequence::flat(0xdead_beef, 4, 1000).collect();
//! assert_eq!(probes.len(), 4);
//! assert!(probes.iter().all(|&p| p < 1000));
//! ```

/// Cache line size assumed by the blocked layout (bytes).
pub const CACHE_LINE_SIZE: usize = 64;

/// Width of one block in bits.
pub const CACHE_LINE_BITS: u32 = (CACHE_LINE_SIZE * 8) as u32;

// Rotation used to derive the second hash from the first. Must be odd and
// fixed for the filter's lifetime; 17 moves the high half into the low bits
// that the modulo reduction consumes.
const DELTA_ROTATION: u32 = 17;

/// The sequence of bit positions probed for one key.
///
/// Yields exactly the configured number of probes; positions are absolute
/// indices into the filter's bit array.
#[derive(Debug, Clone, Copy)]
pub struct ProbeSequence {
    h: u32,
    delta: u32,
    base: u32,
    range: u32,
    remaining: u32,
}

impl ProbeSequence {
    /// Probe sequence over a flat (unblocked) bit array of `total_bits`.
    #[inline]
    #[must_use]
    pub fn flat(h: u32, num_probes: u32, total_bits: u32) -> Self {
        debug_assert!(total_bits > 0);
        Self {
            h,
            delta: h.rotate_right(DELTA_ROTATION),
            base: 0,
            range: total_bits,
            remaining: num_probes,
        }
    }

    /// Probe sequence confined to one cache-line block.
    ///
    /// The hash selects the block (`h mod num_blocks`); every probe falls in
    /// that block's bit range. `num_blocks` is odd by construction of the
    /// filter, which lets the modulo involve more hash bits than a
    /// power-of-two mask would.
    #[inline]
    #[must_use]
    pub fn blocked(h: u32, num_probes: u32, num_blocks: u32) -> Self {
        debug_assert!(num_blocks > 0);
        let block = h % num_blocks;
        Self {
            h,
            delta: h.rotate_right(DELTA_ROTATION),
            base: block * CACHE_LINE_BITS,
            range: CACHE_LINE_BITS,
            remaining: num_probes,
        }
    }

    /// First bit position of the block this sequence is confined to.
    ///
    /// Zero in flat mode.
    #[inline]
    #[must_use]
    pub fn block_start(&self) -> u32 {
        self.base
    }
}

impl Iterator for ProbeSequence {
    type Item = u32;

    #[inline]
    fn next(&mut self) -> Option<u32> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let bitpos = self.base + self.h % self.range;
        // The running hash accumulates delta each step: probe i sits at
        // h + i*delta without a per-step multiply.
        self.h = self.h.wrapping_add(self.delta);
        Some(bitpos)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for ProbeSequence {}
