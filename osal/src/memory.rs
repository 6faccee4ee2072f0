//! Heap allocation through the configured back-end's allocator.
//!
//! Mirrors `osal_memory_alloc`/`osal_memory_free`: the free side takes only
//! a pointer, no size. Rust's allocator API needs a [`core::alloc::Layout`]
//! to deallocate, so each allocation is prefixed with a small header
//! recording the layout it was made with — the same trick a C `malloc`
//! implementation plays internally, just made explicit since we sit on top
//! of one rather than being one.

use core::alloc::Layout;
use core::mem::size_of;
use core::ptr::NonNull;

#[cfg(feature = "std")]
use crate::sys::backend;

#[repr(C)]
struct Header {
    size: usize,
    align: usize,
}

const HEADER_LAYOUT: Layout = Layout::new::<Header>();

fn padded_layout(size: usize, align: usize) -> Option<(Layout, usize)> {
    let align = align.max(HEADER_LAYOUT.align());
    let body = Layout::from_size_align(size, align).ok()?;
    HEADER_LAYOUT.extend(body).ok()
}

/// A namespace for the heap allocation operations; never constructed.
///
/// Grouped as a type, like the teacher crate's `PartitionAlloc<P, T>`,
/// rather than as bare free functions, so the public surface reads as one
/// handle-shaped unit alongside [`crate::mutex::Mutex`] and friends.
pub struct Memory {
    _private: (),
}

impl Memory {
    /// Allocate `size` bytes with pointer-width alignment. Returns `None`
    /// on allocation failure (out of memory, zero size, or an
    /// unrepresentable layout), matching `osal_memory_alloc` returning
    /// `NULL`.
    pub fn alloc(size: usize) -> Option<NonNull<u8>> {
        if size == 0 {
            return None;
        }
        let (layout, offset) = padded_layout(size, size_of::<usize>())?;

        // SAFETY: `layout` has non-zero size (the header alone is non-zero).
        let raw = unsafe { raw_alloc(layout) };
        let raw = NonNull::new(raw)?;

        // SAFETY: `raw` is a fresh allocation at least `layout.size()` bytes,
        // and `offset` was computed by `Layout::extend` for this exact shape.
        unsafe {
            raw.as_ptr().cast::<Header>().write(Header {
                size: layout.size(),
                align: layout.align(),
            });
            let body = raw.as_ptr().add(offset);
            Some(NonNull::new_unchecked(body))
        }
    }

    /// Free a pointer previously returned by [`Memory::alloc`]. Freeing a
    /// null-equivalent or already-freed pointer is undefined behavior, same
    /// as `free` — callers own that invariant, same as the contract's
    /// handle-ownership rules everywhere else.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by a prior, not-yet-freed call to
    /// [`Memory::alloc`].
    pub unsafe fn free(ptr: NonNull<u8>) {
        let (_, offset) = padded_layout(1, size_of::<usize>())
            .expect("fixed header/body layout is always representable");
        // SAFETY: caller guarantees `ptr` came from `alloc`, which placed the
        // body exactly `offset` bytes past the header.
        let header_ptr = unsafe { ptr.as_ptr().sub(offset).cast::<Header>() };
        // SAFETY: `header_ptr` points at the `Header` this allocation wrote.
        let header = unsafe { header_ptr.read() };
        let layout = Layout::from_size_align(header.size, header.align)
            .expect("layout round-trips from its own recorded fields");
        // SAFETY: `header_ptr` is the original allocation start, `layout`
        // matches what it was allocated with.
        unsafe { raw_dealloc(header_ptr.cast::<u8>(), layout) };
    }
}

#[cfg(feature = "std")]
unsafe fn raw_alloc(layout: Layout) -> *mut u8 {
    unsafe { backend::alloc(layout) }
}

#[cfg(feature = "std")]
unsafe fn raw_dealloc(ptr: *mut u8, layout: Layout) {
    unsafe { backend::dealloc(ptr, layout) }
}

#[cfg(feature = "psp")]
unsafe fn raw_alloc(layout: Layout) -> *mut u8 {
    unsafe { alloc::alloc::alloc(layout) }
}

#[cfg(feature = "psp")]
unsafe fn raw_dealloc(ptr: *mut u8, layout: Layout) {
    unsafe { alloc::alloc::dealloc(ptr, layout) }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn alloc_then_free_round_trips() {
        let ptr = Memory::alloc(128).expect("allocation should succeed");
        unsafe {
            ptr.as_ptr().write_bytes(0xAB, 128);
            Memory::free(ptr);
        }
    }

    #[test]
    fn zero_size_returns_none() {
        assert!(Memory::alloc(0).is_none());
    }
}
