//! # Ordered Traversal
//!
//! Every step of every iterator here is a successor or predecessor walk over
//! the parent/left/right links. No iterator keeps a stack: its whole state is
//! the pair of nodes at its two ends.
//!
//! ```text
//! successor(x):
//!   x.right != NIL  ──► leftmost node of x.right
//!   otherwise       ──► climb while x is a right child,
//!                       then the parent (NIL past the maximum)
//! ```
use std::iter::FusedIterator;
use std::marker::PhantomData;

use crate::node::{Links, NodeArena, NodeId, NIL};

// ---------------------------------------------------------------------------
// Link Walks
// ---------------------------------------------------------------------------

/// Leftmost node of the subtree rooted at `x`.
#[inline]
pub(crate) fn minimum(links: &[Links], mut x: NodeId) -> NodeId {
	if x.is_nil() {
		return NIL;
	}
	while !links[x.index()].left.is_nil() {
		x = links[x.index()].left;
	}
	x
}

/// Rightmost node of the subtree rooted at `x`.
#[inline]
pub(crate) fn maximum(links: &[Links], mut x: NodeId) -> NodeId {
	if x.is_nil() {
		return NIL;
	}
	while !links[x.index()].right.is_nil() {
		x = links[x.index()].right;
	}
	x
}

/// In-order successor of `x`, or `NIL` when `x` is the maximum.
pub(crate) fn successor(links: &[Links], mut x: NodeId) -> NodeId {
	if x.is_nil() {
		return NIL;
	}
	let right = links[x.index()].right;
	if !right.is_nil() {
		return minimum(links, right);
	}
	let mut parent = links[x.index()].parent;
	while !parent.is_nil() && x == links[parent.index()].right {
		x = parent;
		parent = links[x.index()].parent;
	}
	parent
}

/// In-order predecessor of `x`, or `NIL` when `x` is the minimum.
pub(crate) fn predecessor(links: &[Links], mut x: NodeId) -> NodeId {
	if x.is_nil() {
		return NIL;
	}
	let left = links[x.index()].left;
	if !left.is_nil() {
		return maximum(links, left);
	}
	let mut parent = links[x.index()].parent;
	while !parent.is_nil() && x == links[parent.index()].left {
		x = parent;
		parent = links[x.index()].parent;
	}
	parent
}

impl<K, V> NodeArena<K, V> {
	#[inline]
	pub(crate) fn minimum(&self, x: NodeId) -> NodeId {
		minimum(self.links(), x)
	}

	#[inline]
	pub(crate) fn maximum(&self, x: NodeId) -> NodeId {
		maximum(self.links(), x)
	}

	#[inline]
	pub(crate) fn successor(&self, x: NodeId) -> NodeId {
		successor(self.links(), x)
	}

	#[inline]
	pub(crate) fn predecessor(&self, x: NodeId) -> NodeId {
		predecessor(self.links(), x)
	}
}

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// A position in a tree: one entry, or the end position.
///
/// Handles are plain indices. They stay valid across insertions and across
/// removals of *other* entries, with one exception: removing an entry with
/// two children moves its successor's payload into the removed entry's
/// node, so a handle to that successor goes stale.
/// [`remove_at`](crate::RbTree::remove_at) accounts for this and returns the
/// correct handle to continue from.
///
/// The end position doubles as the position before the first entry:
/// stepping back from [`end`](crate::RbTree::end) yields the last entry, and
/// stepping back from the first entry yields `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(pub(crate) NodeId);

impl Handle {
	pub(crate) const END: Handle = Handle(NIL);

	/// Returns `true` for the end position.
	#[inline]
	pub fn is_end(self) -> bool {
		self.0.is_nil()
	}
}

// ---------------------------------------------------------------------------
// Iterator Ends
// ---------------------------------------------------------------------------

/// The two not-yet-yielded ends of an in-order walk.
///
/// Invariant: either both ends are `NIL`, or `front` precedes or equals
/// `back` in key order.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Ends {
	front: NodeId,
	back: NodeId,
}

impl Ends {
	pub(crate) const EMPTY: Ends = Ends {
		front: NIL,
		back: NIL,
	};

	pub(crate) fn new(front: NodeId, back: NodeId) -> Ends {
		if front.is_nil() || back.is_nil() {
			Ends::EMPTY
		} else {
			Ends {
				front,
				back,
			}
		}
	}

	#[inline]
	fn next(&mut self, links: &[Links]) -> Option<NodeId> {
		let current = self.front;
		if current.is_nil() {
			return None;
		}
		if current == self.back {
			*self = Ends::EMPTY;
		} else {
			self.front = successor(links, current);
		}
		Some(current)
	}

	#[inline]
	fn next_back(&mut self, links: &[Links]) -> Option<NodeId> {
		let current = self.back;
		if current.is_nil() {
			return None;
		}
		if current == self.front {
			*self = Ends::EMPTY;
		} else {
			self.back = predecessor(links, current);
		}
		Some(current)
	}
}

// ---------------------------------------------------------------------------
// Borrowing Iterators
// ---------------------------------------------------------------------------

/// In-order iterator over the entries of a tree.
pub struct Iter<'a, K, V> {
	nodes: &'a NodeArena<K, V>,
	ends: Ends,
	len: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
	pub(crate) fn new(nodes: &'a NodeArena<K, V>, ends: Ends, len: usize) -> Self {
		Iter {
			nodes,
			ends,
			len,
		}
	}
}

impl<K, V> Clone for Iter<'_, K, V> {
	fn clone(&self) -> Self {
		Iter {
			nodes: self.nodes,
			ends: self.ends,
			len: self.len,
		}
	}
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
	type Item = (&'a K, &'a V);

	fn next(&mut self) -> Option<Self::Item> {
		let id = self.ends.next(self.nodes.links())?;
		self.len -= 1;
		let (k, v) = self.nodes.entry(id);
		Some((k, v))
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		(self.len, Some(self.len))
	}
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
	fn next_back(&mut self) -> Option<Self::Item> {
		let id = self.ends.next_back(self.nodes.links())?;
		self.len -= 1;
		let (k, v) = self.nodes.entry(id);
		Some((k, v))
	}
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// In-order iterator over the entries of a tree, with mutable values.
pub struct IterMut<'a, K, V> {
	links: &'a [Links],
	slots: *mut Option<(K, V)>,
	ends: Ends,
	len: usize,
	_marker: PhantomData<&'a mut (K, V)>,
}

impl<'a, K, V> IterMut<'a, K, V> {
	pub(crate) fn new(nodes: &'a mut NodeArena<K, V>, ends: Ends, len: usize) -> Self {
		let (links, slots) = nodes.split_mut();
		IterMut {
			links,
			slots: slots.as_mut_ptr(),
			ends,
			len,
			_marker: PhantomData,
		}
	}

	#[inline]
	fn entry(&mut self, id: NodeId) -> (&'a K, &'a mut V) {
		// SAFETY: `id` came from the link array borrowed alongside `slots`, so
		// it is in bounds. `Ends` yields each node at most once, so no two
		// returned references alias, and the `'a` borrow of the arena keeps
		// the slots alive and otherwise untouched.
		let slot = unsafe { &mut *self.slots.add(id.index()) };
		match slot {
			Some((k, v)) => (&*k, v),
			None => unreachable!("iterator reached empty slot {}", id.index()),
		}
	}
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
	type Item = (&'a K, &'a mut V);

	fn next(&mut self) -> Option<Self::Item> {
		let id = self.ends.next(self.links)?;
		self.len -= 1;
		Some(self.entry(id))
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		(self.len, Some(self.len))
	}
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
	fn next_back(&mut self) -> Option<Self::Item> {
		let id = self.ends.next_back(self.links)?;
		self.len -= 1;
		Some(self.entry(id))
	}
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

// SAFETY: an `IterMut` stands for a `&'a mut` borrow of the arena that only
// hands out `&K` and `&mut V`, so moving it to another thread is sound when
// shared keys and owned values may cross threads.
unsafe impl<K: Sync, V: Send> Send for IterMut<'_, K, V> {}
// SAFETY: `&IterMut` exposes no entry access; sharing it only shares the
// borrowed links and the raw slot pointer, which are read but never written
// through a shared reference.
unsafe impl<K: Sync, V: Sync> Sync for IterMut<'_, K, V> {}

/// Iterator over the keys of a tree, in order.
pub struct Keys<'a, K, V> {
	pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
	type Item = &'a K;

	fn next(&mut self) -> Option<&'a K> {
		self.inner.next().map(|(k, _)| k)
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		self.inner.size_hint()
	}
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
	fn next_back(&mut self) -> Option<Self::Item> {
		self.inner.next_back().map(|(k, _)| k)
	}
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// Iterator over the values of a tree, in key order.
pub struct Values<'a, K, V> {
	pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
	type Item = &'a V;

	fn next(&mut self) -> Option<&'a V> {
		self.inner.next().map(|(_, v)| v)
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		self.inner.size_hint()
	}
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
	fn next_back(&mut self) -> Option<Self::Item> {
		self.inner.next_back().map(|(_, v)| v)
	}
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

/// Iterator over mutable values of a tree, in key order.
pub struct ValuesMut<'a, K, V> {
	pub(crate) inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
	type Item = &'a mut V;

	fn next(&mut self) -> Option<&'a mut V> {
		self.inner.next().map(|(_, v)| v)
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		self.inner.size_hint()
	}
}

impl<K, V> DoubleEndedIterator for ValuesMut<'_, K, V> {
	fn next_back(&mut self) -> Option<Self::Item> {
		self.inner.next_back().map(|(_, v)| v)
	}
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

/// In-order iterator over a sub-range of a tree.
pub struct Range<'a, K, V> {
	nodes: &'a NodeArena<K, V>,
	ends: Ends,
}

impl<'a, K, V> Range<'a, K, V> {
	pub(crate) fn new(nodes: &'a NodeArena<K, V>, ends: Ends) -> Self {
		Range {
			nodes,
			ends,
		}
	}
}

impl<'a, K, V> Iterator for Range<'a, K, V> {
	type Item = (&'a K, &'a V);

	fn next(&mut self) -> Option<Self::Item> {
		let id = self.ends.next(self.nodes.links())?;
		let (k, v) = self.nodes.entry(id);
		Some((k, v))
	}
}

impl<K, V> DoubleEndedIterator for Range<'_, K, V> {
	fn next_back(&mut self) -> Option<Self::Item> {
		let id = self.ends.next_back(self.nodes.links())?;
		let (k, v) = self.nodes.entry(id);
		Some((k, v))
	}
}

impl<K, V> FusedIterator for Range<'_, K, V> {}

// ---------------------------------------------------------------------------
// Owning Iterator
// ---------------------------------------------------------------------------

/// Owning in-order iterator. Entries not yet yielded are dropped with it.
pub struct IntoIter<K, V> {
	nodes: NodeArena<K, V>,
	ends: Ends,
	len: usize,
}

impl<K, V> IntoIter<K, V> {
	pub(crate) fn new(nodes: NodeArena<K, V>, ends: Ends, len: usize) -> Self {
		IntoIter {
			nodes,
			ends,
			len,
		}
	}
}

impl<K, V> Iterator for IntoIter<K, V> {
	type Item = (K, V);

	fn next(&mut self) -> Option<(K, V)> {
		let id = self.ends.next(self.nodes.links())?;
		self.len -= 1;
		self.nodes.take_entry(id)
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		(self.len, Some(self.len))
	}
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
	fn next_back(&mut self) -> Option<(K, V)> {
		let id = self.ends.next_back(self.nodes.links())?;
		self.len -= 1;
		self.nodes.take_entry(id)
	}
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}
