//! Counting global allocator for leak and footprint tests.
//!
//! The tree owns all of its memory through two vectors, so leaks show up as
//! live bytes that outlast the tree. A test binary installs
//! [`CountingAllocator`] as its global allocator, takes a [`Snapshot`]
//! before building a tree, and compares against a second snapshot after the
//! tree is dropped.
//!
//! ```ignore
//! use redfern::alloc::{self, CountingAllocator};
//!
//! #[global_allocator]
//! static GLOBAL: CountingAllocator = CountingAllocator;
//!
//! #[test]
//! fn tree_releases_everything() {
//!     let before = alloc::snapshot();
//!     {
//!         let tree: redfern::RbTree<u64, String> = (0..1000).map(|i| (i, i.to_string())).collect();
//!         assert_eq!(tree.len(), 1000);
//!     }
//!     alloc::snapshot().since(&before).assert_released(0);
//! }
//! ```
//!
//! Counters are process-wide. Other threads of the test harness allocate
//! too, so tests that measure should run with `--test-threads=1` or accept
//! a tolerance.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};

static ALLOCATIONS: AtomicUsize = AtomicUsize::new(0);
static FREES: AtomicUsize = AtomicUsize::new(0);
static REALLOCATIONS: AtomicUsize = AtomicUsize::new(0);
static LIVE_BYTES: AtomicIsize = AtomicIsize::new(0);
static PEAK_BYTES: AtomicIsize = AtomicIsize::new(0);

/// Global allocator that forwards to [`System`] and counts every call.
pub struct CountingAllocator;

impl CountingAllocator {
	#[inline]
	fn grow(bytes: isize) {
		let live = LIVE_BYTES.fetch_add(bytes, Ordering::Relaxed) + bytes;
		PEAK_BYTES.fetch_max(live, Ordering::Relaxed);
	}
}

// SAFETY: every method forwards the caller's layout and pointer unchanged to
// the system allocator; the counters never influence the returned memory.
unsafe impl GlobalAlloc for CountingAllocator {
	unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
		ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
		Self::grow(layout.size() as isize);
		System.alloc(layout)
	}

	unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
		ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
		Self::grow(layout.size() as isize);
		System.alloc_zeroed(layout)
	}

	unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
		FREES.fetch_add(1, Ordering::Relaxed);
		LIVE_BYTES.fetch_sub(layout.size() as isize, Ordering::Relaxed);
		System.dealloc(ptr, layout)
	}

	unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
		REALLOCATIONS.fetch_add(1, Ordering::Relaxed);
		Self::grow(new_size as isize - layout.size() as isize);
		System.realloc(ptr, layout, new_size)
	}
}

/// Counter values at one point in time, or the difference between two.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Snapshot {
	/// Calls to `alloc` and `alloc_zeroed`.
	pub allocations: usize,
	/// Calls to `dealloc`.
	pub frees: usize,
	/// Calls to `realloc`, which vector growth goes through.
	pub reallocations: usize,
	/// Bytes currently allocated.
	pub live_bytes: isize,
	/// Highest `live_bytes` seen since the last [`reset_peak`].
	pub peak_bytes: isize,
}

/// Reads every counter.
pub fn snapshot() -> Snapshot {
	Snapshot {
		allocations: ALLOCATIONS.load(Ordering::SeqCst),
		frees: FREES.load(Ordering::SeqCst),
		reallocations: REALLOCATIONS.load(Ordering::SeqCst),
		live_bytes: LIVE_BYTES.load(Ordering::SeqCst),
		peak_bytes: PEAK_BYTES.load(Ordering::SeqCst),
	}
}

/// Restarts peak tracking from the current live byte count.
pub fn reset_peak() {
	PEAK_BYTES.store(LIVE_BYTES.load(Ordering::SeqCst), Ordering::SeqCst);
}

impl Snapshot {
	/// Activity between `baseline` and `self`.
	///
	/// `peak_bytes` becomes the peak above the baseline's live bytes.
	pub fn since(&self, baseline: &Snapshot) -> Snapshot {
		Snapshot {
			allocations: self.allocations.wrapping_sub(baseline.allocations),
			frees: self.frees.wrapping_sub(baseline.frees),
			reallocations: self.reallocations.wrapping_sub(baseline.reallocations),
			live_bytes: self.live_bytes - baseline.live_bytes,
			peak_bytes: self.peak_bytes - baseline.live_bytes,
		}
	}

	/// Allocations minus frees.
	pub fn outstanding(&self) -> isize {
		self.allocations as isize - self.frees as isize
	}

	/// Asserts that at most `tolerance_bytes` are still live.
	///
	/// # Panics
	///
	/// Panics with the counter values if more bytes are live.
	pub fn assert_released(&self, tolerance_bytes: usize) {
		if self.live_bytes > tolerance_bytes as isize {
			panic!(
				"memory not released: {} bytes live (tolerance {}), {} allocations, {} frees",
				self.live_bytes, tolerance_bytes, self.allocations, self.frees
			);
		}
	}
}
