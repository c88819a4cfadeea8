//! Backing-buffer allocation for filter storage.
//!
//! The filter does not allocate directly: it asks an [`Allocator`] capability
//! for a zero-initialized buffer and owns the result for its whole lifetime.
//! Modeling the allocator as a trait keeps the filter usable in environments
//! without huge-page support (a plain heap allocator satisfies the contract)
//! and lets tests inject failing allocators to exercise construction errors.
//!
//! # Alignment Contract
//!
//! `allocate_aligned` guarantees machine-word alignment only. Callers that
//! need cache-line alignment (the blocked filter layout) must over-allocate
//! and offset into the buffer themselves. Keeping the contract weak means the
//! offset arithmetic in the filter stays live against any allocator.
//!
//! # Huge Pages
//!
//! When the caller passes a non-zero `huge_page_threshold` and the request is
//! at least that large, [`HeapAllocator`] aligns the allocation to the 2 MiB
//! huge-page size and advises the kernel with `madvise(MADV_HUGEPAGE)` on
//! Linux. The advice is opportunistic: if the kernel declines, the allocation
//! is still valid and the outcome is only logged.

use crate::error::{BloomGateError, Result};
use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::mem;
use std::ptr::NonNull;

/// Size of a transparent huge page on Linux/x86-64 (bytes).
pub const HUGE_PAGE_SIZE: usize = 2 * 1024 * 1024;

/// Capability interface for obtaining filter backing buffers.
///
/// Implementations must return a buffer that is:
/// - at least `size` bytes long,
/// - fully zero-initialized,
/// - exclusively owned by the returned [`AlignedBuffer`].
///
/// # Examples
///
/// ```
/// use bloomgate::alloc::{Allocator, HeapAllocator};
///
/// let buf = HeapAllocator.allocate_aligned(512, 0).unwrap();
/// assert_eq!(buf.len(), 512);
/// ```
pub trait Allocator: Send + Sync {
    /// Allocate a zero-initialized buffer of `size` bytes.
    ///
    /// `huge_page_threshold` of 0 disables huge pages entirely; a non-zero
    /// value requests huge-page backing for allocations of at least that many
    /// bytes. Implementations may ignore the hint.
    ///
    /// # Errors
    ///
    /// Returns [`BloomGateError::AllocationFailed`] if the buffer cannot be
    /// provided. There is no partial success.
    fn allocate_aligned(&self, size: usize, huge_page_threshold: usize) -> Result<AlignedBuffer>;
}

/// An exclusively owned, zero-initialized heap allocation.
///
/// The buffer releases its memory exactly once on drop, through the same
/// layout it was allocated with.
#[derive(Debug)]
pub struct AlignedBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl AlignedBuffer {
    /// Allocate `size` zeroed bytes with the given alignment.
    ///
    /// # Errors
    ///
    /// Returns [`BloomGateError::AllocationFailed`] if the layout is invalid
    /// or the global allocator returns null.
    pub fn zeroed(size: usize, align: usize) -> Result<Self> {
        debug_assert!(size > 0, "buffer size must be positive");
        let layout = Layout::from_size_align(size, align)
            .map_err(|_| BloomGateError::allocation_failed(size))?;

        // SAFETY: layout has non-zero size and a power-of-two alignment.
        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or_else(|| BloomGateError::allocation_failed(size))?;

        Ok(Self { ptr, layout })
    }

    /// Raw pointer to the first byte of the buffer.
    #[inline]
    #[must_use]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// Buffer length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.layout.size()
    }

    /// Whether the buffer is empty (never true for a live buffer).
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layout.size() == 0
    }

    /// Ask the kernel to back this buffer with transparent huge pages.
    ///
    /// Fire-and-forget: the outcome is logged and otherwise ignored. Only
    /// meaningful when the buffer start is huge-page aligned.
    fn advise_huge_pages(&self) {
        #[cfg(target_os = "linux")]
        {
            // SAFETY: the region [ptr, ptr + len) is owned by this buffer and
            // the start address is huge-page aligned by construction.
            let rc = unsafe {
                libc::madvise(
                    self.ptr.as_ptr().cast::<libc::c_void>(),
                    self.layout.size(),
                    libc::MADV_HUGEPAGE,
                )
            };
            if rc == 0 {
                log::debug!(
                    "advised huge pages for {} byte filter buffer",
                    self.layout.size()
                );
            } else {
                log::debug!(
                    "madvise(MADV_HUGEPAGE) declined for {} byte buffer: {}",
                    self.layout.size(),
                    std::io::Error::last_os_error()
                );
            }
        }
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        // SAFETY: ptr was produced by alloc_zeroed with exactly this layout
        // and is deallocated exactly once.
        unsafe {
            dealloc(self.ptr.as_ptr(), self.layout);
        }
    }
}

// SAFETY: the buffer exclusively owns its allocation; transferring or sharing
// the owner across threads cannot alias the memory.
unsafe impl Send for AlignedBuffer {}
unsafe impl Sync for AlignedBuffer {}

/// Default allocator backed by the global heap.
///
/// Honors the huge-page hint on Linux by aligning qualifying allocations to
/// [`HUGE_PAGE_SIZE`] and advising the kernel; elsewhere the hint is ignored.
///
/// # Examples
///
/// ```
/// use bloomgate::alloc::{Allocator, HeapAllocator};
///
/// // Huge pages disabled: word-aligned heap allocation.
/// let buf = HeapAllocator.allocate_aligned(4096, 0).unwrap();
/// assert!(buf.len() >= 4096);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapAllocator;

impl Allocator for HeapAllocator {
    fn allocate_aligned(&self, size: usize, huge_page_threshold: usize) -> Result<AlignedBuffer> {
        let use_huge_pages = huge_page_threshold > 0 && size >= huge_page_threshold;
        let align = if use_huge_pages {
            HUGE_PAGE_SIZE
        } else {
            mem::align_of::<u64>()
        };

        let buf = AlignedBuffer::zeroed(size, align)?;
        log::trace!("allocated {} bytes (align {}) for filter storage", size, align);
        if use_huge_pages {
            buf.advise_huge_pages();
        }
        Ok(buf)
    }
}
