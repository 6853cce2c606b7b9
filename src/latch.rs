//! # Node Latch and Traversal Latch Stack
//!
//! This module provides the two concurrency primitives behind the tree's
//! lock-coupling (latch-crabbing) protocol:
//!
//! - [`Latch`], a reader/writer latch that owns the data it protects, and
//! - [`LatchStack`], the per-operation record of every latch a traversal
//!   currently holds.
//!
//! ## Access Modes
//!
//! | Mode      | Blocking?           | Readers share? | Writers excluded? |
//! |-----------|---------------------|----------------|-------------------|
//! | Shared    | Yes                 | Yes            | Yes               |
//! | Exclusive | Yes                 | No             | Yes               |
//! | None      | No (registers only) | —              | —                 |
//!
//! `LatchMode::None` never touches the lock: it records a latch that the
//! caller acquired by other means (the iterator's non-blocking hand-off) so
//! that the stack can release it later alongside the rest of the traversal.
//!
//! ## Why manual lock/unlock instead of guards
//!
//! Latch crabbing holds latches across recursion levels and releases them in
//! an order decided *during* the descent: a node proven safe releases all of
//! its ancestors immediately, while an unsafe node leaves the chain latched
//! for whichever ancestor concludes the structural change. RAII guards tie a
//! latch to a lexical scope and cannot express that, so the stack drives
//! `parking_lot::RawRwLock` directly and tracks what it owes.
//!
//! ## Stack discipline
//!
//! The stack is append-only during the descent; depth 0 is always the
//! tree-level root latch. A cursor (`released_upto`) marks how much of the
//! prefix has already been unlocked:
//!
//! ```text
//! [ tree ][ root ][ inner ][ leaf ]
//!           ^released_upto          (tree latch already released)
//! ```
//!
//! - `release_upto(d)` unlocks everything before depth `d` — "my ancestors
//!   are no longer needed".
//! - `release_from(d)` unlocks depth `d` and everything after it — "the safe
//!   ancestor at depth `d` concludes the operation and drains its tail".
//! - `replace(d, latch)` swaps the latch recorded at depth `d` for another
//!   already-held latch, unlocking the old one. A merge uses this when the
//!   node tracked at `d` is about to be freed and the surviving sibling's
//!   latch must be released in its place.
//!
//! A latch is never released twice: the cursor only moves forward, and every
//! release path goes through it. Releases must name the mode the latch was
//! acquired with; the protocol acquires whole descents in one mode (plus at
//! most one exclusive leaf for `update`), so call sites always know it.

use parking_lot::lock_api::RawRwLock as RawRwLockApi;
use parking_lot::RawRwLock;
use std::cell::UnsafeCell;

// ===========================================================================
// Latch
// ===========================================================================

/// A reader/writer latch owning the data it protects.
///
/// Unlike an `RwLock`, a `Latch` hands out no guards: acquisition and release
/// are separate calls, because the crabbing protocol releases latches at
/// depths decided during the traversal rather than at scope exit. Data access
/// goes through the unsafe [`data`](Latch::data) / [`data_mut`](Latch::data_mut)
/// accessors, whose contract is "the matching latch mode is held".
pub struct Latch<T> {
	lock: RawRwLock,
	data: UnsafeCell<T>,
}

// SAFETY: the latch provides the synchronization for its payload; moving it
// between threads is fine whenever the payload itself can move.
unsafe impl<T: Send> Send for Latch<T> {}
// SAFETY: shared access to the payload is only handed out under the shared
// or exclusive lock.
unsafe impl<T: Send + Sync> Sync for Latch<T> {}

impl<T> Latch<T> {
	/// Creates a new, unlocked latch around `data`.
	#[inline]
	pub fn new(data: T) -> Latch<T> {
		Latch {
			lock: RawRwLock::INIT,
			data: UnsafeCell::new(data),
		}
	}

	/// The raw lock, for registration in a [`LatchStack`].
	#[inline]
	pub(crate) fn raw(&self) -> &RawRwLock {
		&self.lock
	}

	/// Blocks until shared access is available.
	#[inline]
	pub fn lock_shared(&self) {
		self.lock.lock_shared();
	}

	/// Attempts shared access without blocking.
	///
	/// This is the iterator's hand-off primitive: failure is reported to the
	/// caller instead of waiting behind a writer.
	#[inline]
	pub fn try_lock_shared(&self) -> bool {
		self.lock.try_lock_shared()
	}

	/// Blocks until exclusive access is available.
	#[inline]
	pub fn lock_exclusive(&self) {
		self.lock.lock_exclusive();
	}

	/// Releases a shared acquisition.
	///
	/// # Safety
	///
	/// The current context must hold this latch in shared mode.
	#[inline]
	pub unsafe fn unlock_shared(&self) {
		self.lock.unlock_shared();
	}

	/// Releases an exclusive acquisition.
	///
	/// # Safety
	///
	/// The current context must hold this latch in exclusive mode.
	#[inline]
	pub unsafe fn unlock_exclusive(&self) {
		self.lock.unlock_exclusive();
	}

	/// Returns a shared reference to the protected data.
	///
	/// # Safety
	///
	/// The caller must hold this latch in shared or exclusive mode, or
	/// otherwise have exclusive reach over it (e.g. a freshly allocated node
	/// not yet linked into the tree).
	#[inline]
	pub unsafe fn data(&self) -> &T {
		&*self.data.get()
	}

	/// Returns a mutable reference to the protected data.
	///
	/// # Safety
	///
	/// The caller must hold this latch in exclusive mode, or otherwise have
	/// exclusive reach over it.
	#[allow(clippy::mut_from_ref)]
	#[inline]
	pub unsafe fn data_mut(&self) -> &mut T {
		&mut *self.data.get()
	}

	/// Direct access through a unique reference; no locking required.
	#[inline]
	pub fn as_mut(&mut self) -> &mut T {
		self.data.get_mut()
	}
}

// ===========================================================================
// LatchMode
// ===========================================================================

/// How a latch was (or was not) acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchMode {
	/// Register an already-held latch without touching the lock.
	None,
	/// Shared (reader) mode.
	Shared,
	/// Exclusive (writer) mode.
	Exclusive,
}

// ===========================================================================
// LatchStack
// ===========================================================================

/// The ordered set of latches one tree operation currently holds.
///
/// Index 0 is the tree-level root latch; each descent level appends one
/// entry. `released_upto` is the lowest index still held — everything below
/// it has already been unlocked.
///
/// The stack stores raw lock pointers because a traversal outlives any
/// single borrow of the nodes it latched. The protocol keeps them valid: a
/// node is only freed after [`replace`](LatchStack::replace) has evicted its
/// latch from the stack, and every held latch pins its node against
/// deallocation (merges require the victim's exclusive latch).
pub(crate) struct LatchStack {
	latches: Vec<*const RawRwLock>,
	released_upto: usize,
}

impl LatchStack {
	pub(crate) fn new() -> LatchStack {
		LatchStack {
			latches: Vec::new(),
			released_upto: 0,
		}
	}

	/// Number of latches recorded (released or not).
	#[inline]
	pub(crate) fn len(&self) -> usize {
		self.latches.len()
	}

	/// The lowest depth still held.
	#[inline]
	pub(crate) fn released_upto(&self) -> usize {
		self.released_upto
	}

	/// Locks `latch` in `mode` (mode `None` only records it) and appends it.
	///
	/// Returns the depth at which the latch was recorded.
	pub(crate) fn acquire(&mut self, latch: &RawRwLock, mode: LatchMode) -> usize {
		match mode {
			LatchMode::Shared => latch.lock_shared(),
			LatchMode::Exclusive => latch.lock_exclusive(),
			LatchMode::None => {}
		}
		self.latches.push(latch as *const RawRwLock);
		self.latches.len() - 1
	}

	/// Unlocks every latch in `[released_upto, upto)` and advances the cursor.
	///
	/// A no-op when the cursor is already at or past `upto`. `mode` must be
	/// the mode those latches were acquired with.
	pub(crate) fn release_upto(&mut self, upto: usize, mode: LatchMode) {
		if self.released_upto >= upto {
			return;
		}
		assert!(upto <= self.latches.len(), "release beyond the latch stack");
		for idx in self.released_upto..upto {
			// SAFETY: every entry at or above the cursor is held in `mode`,
			// and its lock stays alive while the stack tracks it.
			unsafe { Self::unlock(self.latches[idx], mode) };
		}
		self.released_upto = upto;
	}

	/// Unlocks the latch at `depth` and records `latch` there *without*
	/// acquiring it.
	///
	/// Used when a merge is about to free the node tracked at `depth`: the
	/// surviving sibling's latch (already held by the caller) takes over the
	/// slot so the usual release path unlocks it.
	pub(crate) fn replace(&mut self, depth: usize, latch: &RawRwLock, mode: LatchMode) {
		debug_assert!(depth >= self.released_upto, "replacing a released slot");
		// SAFETY: the slot at `depth` is still held in `mode`.
		unsafe { Self::unlock(self.latches[depth], mode) };
		self.latches[depth] = latch as *const RawRwLock;
	}

	/// Unlocks everything from `depth` through the end of the stack.
	///
	/// This is the safe ancestor draining its tail: the caller must already
	/// have released all of its own ancestors, i.e. the cursor sits exactly
	/// at `depth`.
	pub(crate) fn release_from(&mut self, depth: usize, mode: LatchMode) {
		debug_assert_eq!(self.released_upto, depth, "tail release below an unreleased ancestor");
		for idx in depth..self.latches.len() {
			// SAFETY: as in `release_upto`.
			unsafe { Self::unlock(self.latches[idx], mode) };
		}
		self.released_upto = self.latches.len();
	}

	/// Resets the stack for reuse.
	///
	/// Every latch must have been released already; an operation that leaves
	/// latches behind has violated the protocol.
	pub(crate) fn clear(&mut self) {
		debug_assert_eq!(
			self.released_upto,
			self.latches.len(),
			"clearing a latch stack with held latches"
		);
		self.latches.clear();
		self.released_upto = 0;
	}

	/// # Safety
	///
	/// `latch` must point to a live lock held in `mode` by this context.
	unsafe fn unlock(latch: *const RawRwLock, mode: LatchMode) {
		match mode {
			LatchMode::Shared => (*latch).unlock_shared(),
			LatchMode::Exclusive => (*latch).unlock_exclusive(),
			LatchMode::None => panic!("cannot release a latch in mode None"),
		}
	}
}

// ===========================================================================
// Tests
// ===========================================================================
