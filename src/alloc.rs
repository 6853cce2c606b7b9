//! Allocation accounting for memory-reclamation tests.
//!
//! Node lifetime in this tree is driven by explicit ownership transfers: a
//! merge moves the right sibling's entries out before the node is freed, and
//! a root collapse takes the promoted child out of the old root first. The
//! tests in `tests/memory_tests.rs` install [`TrackingAllocator`] as the
//! global allocator and check that allocation and deallocation counts balance
//! across splits, merges, collapses, `clear` and drop — a double free or a
//! cascading free of transferred children would show up as an imbalance (or
//! a crash).
//!
//! Counters are process-global; tests that read them must run on a single
//! thread (`cargo test -- --test-threads=1`) for exact numbers.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};

/// Total number of allocations since the last [`reset_counters`].
pub static ALLOC_COUNT: AtomicUsize = AtomicUsize::new(0);

/// Total number of deallocations since the last [`reset_counters`].
pub static DEALLOC_COUNT: AtomicUsize = AtomicUsize::new(0);

/// Net bytes currently allocated (allocations minus deallocations).
pub static BYTES_IN_USE: AtomicIsize = AtomicIsize::new(0);

/// A [`GlobalAlloc`] wrapper around the system allocator that keeps running
/// totals of allocation activity.
pub struct TrackingAllocator;

unsafe impl GlobalAlloc for TrackingAllocator {
	unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
		ALLOC_COUNT.fetch_add(1, Ordering::Relaxed);
		BYTES_IN_USE.fetch_add(layout.size() as isize, Ordering::Relaxed);
		System.alloc(layout)
	}

	unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
		DEALLOC_COUNT.fetch_add(1, Ordering::Relaxed);
		BYTES_IN_USE.fetch_sub(layout.size() as isize, Ordering::Relaxed);
		System.dealloc(ptr, layout)
	}

	unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
		BYTES_IN_USE.fetch_add(new_size as isize - layout.size() as isize, Ordering::Relaxed);
		System.realloc(ptr, layout, new_size)
	}
}

/// Resets all counters to zero.
pub fn reset_counters() {
	ALLOC_COUNT.store(0, Ordering::Relaxed);
	DEALLOC_COUNT.store(0, Ordering::Relaxed);
	BYTES_IN_USE.store(0, Ordering::Relaxed);
}

/// Allocations minus deallocations since the last reset.
pub fn outstanding_allocations() -> isize {
	let allocs = ALLOC_COUNT.load(Ordering::Relaxed) as isize;
	let deallocs = DEALLOC_COUNT.load(Ordering::Relaxed) as isize;
	allocs - deallocs
}

/// Net bytes currently allocated since the last reset.
pub fn bytes_in_use() -> isize {
	BYTES_IN_USE.load(Ordering::Relaxed)
}
