//! Iterators for the `GenericTree` data structure.
//!
//! A cursor walks the leaf chain under shared latches. Crossing to the next
//! leaf uses acquire-next-then-release-current: the sibling's latch is taken
//! (non-blocking) *before* the current leaf's latch is dropped, so at least
//! one latch is always held on some node of the scan and no concurrent merge
//! can free the leaf under the cursor.
//!
//! The sibling acquire never blocks. Waiting there while holding the current
//! leaf could hold up a writer that the scan itself is waiting behind, so on
//! contention [`RangeIter::next`] returns
//! [`Error::IteratorContention`](crate::error::Error::IteratorContention)
//! instead. The cursor keeps its position and latches; the caller may retry
//! `next` or drop the iterator, either of which is safe. Note that a writer
//! rebalancing at the boundary may itself be blocked behind the scan's
//! current latch, in which case retrying alone never drains it — dropping
//! the iterator (and restarting the scan) resolves the standoff.

use crate::error::{Error, Result};
use crate::latch::{Latch, LatchMode, LatchStack};
use crate::{GenericTree, Node};

/// Cursor over consecutive leaves, produced by
/// [`GenericTree::range`] and [`GenericTree::scan`].
///
/// Entries come out in ascending key order, with no duplicate keys. The scan
/// is not a snapshot: entries committed ahead of the cursor may be observed
/// and entries removed behind it may be missed.
pub struct RangeIter<'t, K, V, const IC: usize, const LC: usize> {
	tree: &'t GenericTree<K, V, IC, LC>,
	ctx: LatchStack,
	/// The shared-latched leaf under the cursor; `None` once exhausted.
	current: Option<*const Latch<Node<K, V, IC, LC>>>,
	offset: usize,
	hi: Option<K>,
}

impl<'t, K, V, const IC: usize, const LC: usize> RangeIter<'t, K, V, IC, LC> {
	pub(crate) fn new(
		tree: &'t GenericTree<K, V, IC, LC>,
		ctx: LatchStack,
		leaf: *const Latch<Node<K, V, IC, LC>>,
		offset: usize,
		hi: Option<K>,
	) -> RangeIter<'t, K, V, IC, LC> {
		RangeIter {
			tree,
			ctx,
			current: Some(leaf),
			offset,
			hi,
		}
	}

	/// Advances the cursor, returning the next entry.
	///
	/// `Ok(None)` marks the end of the scan; every latch the iterator held
	/// has been released by then. `Err(IteratorContention)` means the
	/// non-blocking hop to the next leaf failed; retrying is allowed.
	#[allow(clippy::should_implement_trait)]
	pub fn next(&mut self) -> Result<Option<(K, V)>>
	where
		K: Clone + Ord,
		V: Clone,
	{
		loop {
			let Some(current) = self.current else {
				return Ok(None);
			};
			// SAFETY: the cursor's leaf is shared-latched through `ctx`.
			let leaf = unsafe { (*current).data() }.as_leaf();

			if self.offset < leaf.len() {
				let key = leaf.keys[self.offset].clone();
				if let Some(hi) = &self.hi {
					if key > *hi {
						self.finish();
						return Ok(None);
					}
				}
				let value = leaf.values[self.offset].clone();
				self.offset += 1;
				return Ok(Some((key, value)));
			}

			let Some(sibling) = leaf.right else {
				self.finish();
				return Ok(None);
			};
			// SAFETY: the current leaf's latch pins its right sibling — the
			// sibling could only be freed by merging into this leaf, which
			// needs this leaf's exclusive latch.
			let sibling_latch = unsafe { sibling.as_ref() };
			if !sibling_latch.try_lock_shared() {
				return Err(Error::IteratorContention);
			}
			// Hand-off: register the already-held sibling latch, then drop
			// everything before it (the current leaf included).
			let depth = self.ctx.acquire(sibling_latch.raw(), LatchMode::None);
			self.ctx.release_upto(depth, LatchMode::Shared);
			self.current = Some(sibling.as_ptr());
			self.offset = 0;
		}
	}

	/// Collects the remaining entries of the scan.
	///
	/// Convenience for tests and single-threaded use; fails on the same
	/// contention condition as [`next`](RangeIter::next).
	pub fn collect_remaining(&mut self) -> Result<Vec<(K, V)>>
	where
		K: Clone + Ord,
		V: Clone,
	{
		let mut out = Vec::new();
		while let Some(entry) = self.next()? {
			out.push(entry);
		}
		Ok(out)
	}

	/// Releases every latch the scan still holds and parks the cursor.
	fn finish(&mut self) {
		let held = self.ctx.len();
		self.ctx.release_upto(held, LatchMode::Shared);
		self.ctx.clear();
		self.current = None;
	}
}

impl<'t, K, V, const IC: usize, const LC: usize> Drop for RangeIter<'t, K, V, IC, LC> {
	fn drop(&mut self) {
		// An abandoned scan still owes its latches.
		let held = self.ctx.len();
		self.ctx.release_upto(held, LatchMode::Shared);
		self.ctx.clear();
		let _ = self.tree;
	}
}
