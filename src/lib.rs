//! # Redfern: An Arena-Backed Red-Black Tree
//!
//! This crate provides an ordered associative container built on a classic
//! red-black tree. It stores unique, totally-ordered keys (optionally paired
//! with values) and guarantees O(log n) search, insertion, and removal, with
//! bidirectional in-order traversal in O(1) amortized steps.
//!
//! ## Design Overview
//!
//! The balancing algorithms are the textbook ones (Cormen et al.,
//! *Introduction to Algorithms*, chapter 13), expressed over an arena:
//!
//! **Arena Nodes**: Every node lives in a vector owned by the tree and is
//! addressed by index. Parent links are plain indices, so there is exactly
//! one owner for every node and no reference cycles. Rotations reassign
//! indices rather than move ownership.
//!
//! **Sentinel**: Index `0` is a permanently black, payload-free node that
//! every missing child and the root's parent point at. No link is ever
//! "absent", which keeps every branch of the fixups free of null checks. The
//! sentinel also represents the end position of iteration.
//!
//! **Handles**: A [`Handle`] is a copyable position (a node index or the end
//! position). Handles are the tree's equivalent of bidirectional iterators:
//! [`next`](RbTree::next) and [`prev`](RbTree::prev) step through the tree
//! using only parent/left/right links.
//!
//! ### Tree Structure
//!
//! ```text
//!                    ┌─────────────────┐
//!                    │     RbTree      │  root, leftmost, len, comparator
//!                    └────────┬────────┘
//!                             │ root
//!                             ▼
//!                    ┌─────────────────┐
//!                    │   20 (Black)    │
//!                    └────────┬────────┘
//!                  ┌──────────┴──────────┐
//!                  ▼                     ▼
//!           ┌────────────┐        ┌────────────┐
//!           │  10 (Red)  │        │  30 (Red)  │
//!           └────────────┘        └────────────┘
//!             │       │             │       │
//!             ▼       ▼             ▼       ▼
//!            NIL     NIL           NIL     NIL    <- the one sentinel
//! ```
//!
//! ## Basic Usage
//!
//! ```
//! use redfern::RbTree;
//!
//! let mut tree = RbTree::new();
//!
//! // Insert key-value pairs; duplicates are reported, not inserted
//! let (_, inserted) = tree.insert("key1", "value1");
//! assert!(inserted);
//! let (_, inserted) = tree.insert("key1", "other");
//! assert!(!inserted);
//!
//! tree.insert("key2", "value2");
//! assert_eq!(tree.get("key1"), Some(&"value1"));
//!
//! // Ordered traversal
//! let keys: Vec<_> = tree.keys().copied().collect();
//! assert_eq!(keys, ["key1", "key2"]);
//!
//! // Remove entries
//! assert_eq!(tree.remove("key1"), Some("value1"));
//! ```
//!
//! ## Thread Safety
//!
//! The tree does no internal synchronization. Mutation takes `&mut self`,
//! so sharing across threads requires external locking in the usual way.

use std::borrow::Borrow;
use std::fmt::{self, Write as _};
use std::hash::{Hash, Hasher};
use std::mem;
use std::ops::{Bound, Index, RangeBounds};

use log::debug;
use smallvec::SmallVec;

pub mod alloc;
pub mod compare;
pub mod error;
mod insert;
pub mod iter;
mod node;
mod remove;
mod rotate;
#[cfg(any(test, feature = "test-utils"))]
pub mod util;

pub use compare::{Comparator, Natural};
pub use error::{Error, Result};
pub use iter::{Handle, IntoIter, Iter, IterMut, Keys, Range, Values, ValuesMut};
pub use node::Color;

use insert::Slot;
use iter::Ends;
use node::{NodeArena, NodeId, NIL};

/// Inline stack depth for explicit traversals. Red-black height is at most
/// `2 * log2(n + 1)`, so this covers trees of well over a billion nodes
/// before spilling to the heap.
const STACK_DEPTH: usize = 64;

// ---------------------------------------------------------------------------
// Public Type Aliases
// ---------------------------------------------------------------------------

/// A tree used as an ordered set: keys only.
pub type RbSet<K, C = Natural> = RbTree<K, (), C>;

// ---------------------------------------------------------------------------
// Core Tree Structure
// ---------------------------------------------------------------------------

/// An ordered map backed by a red-black tree.
///
/// # Type Parameters
///
/// - `K`: The key type. Keys are unique under the comparator.
/// - `V`: The value stored with each key. Use `()` (or [`RbSet`]) for a set.
/// - `C`: The [`Comparator`] ordering the keys. Defaults to [`Natural`],
///   which uses `K: Ord`.
///
/// # Internal Structure
///
/// - `nodes`: the arena, sentinel at index 0.
/// - `root`: the root node, or the sentinel when empty.
/// - `leftmost`: cached minimum so that [`begin`](Self::begin) is O(1).
/// - `len`: number of entries, maintained on every insert and removal.
///
/// Invariants after every public operation:
///
/// 1. Every node is red or black.
/// 2. The root is black.
/// 3. The sentinel is black and holds no payload.
/// 4. A red node has two black children.
/// 5. Every path from a node down to the sentinel crosses the same number of
///    black nodes.
/// 6. Keys are in strictly increasing comparator order in-order.
#[derive(Clone)]
pub struct RbTree<K, V = (), C = Natural> {
	nodes: NodeArena<K, V>,
	root: NodeId,
	leftmost: NodeId,
	len: usize,
	cmp: C,
}

impl<K, V, C: Default> Default for RbTree<K, V, C> {
	fn default() -> Self {
		Self::with_comparator(C::default())
	}
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl<K, V> RbTree<K, V> {
	/// Creates an empty tree ordered by `K: Ord`.
	///
	/// # Example
	///
	/// ```
	/// use redfern::RbTree;
	///
	/// let tree: RbTree<i32, &str> = RbTree::new();
	/// assert!(tree.is_empty());
	/// assert!(tree.begin().is_end());
	/// ```
	pub fn new() -> Self {
		Self::with_comparator(Natural)
	}

	/// Creates an empty tree with room for `capacity` entries.
	pub fn with_capacity(capacity: usize) -> Self {
		Self::with_capacity_and_comparator(capacity, Natural)
	}
}

impl<K, V, C> RbTree<K, V, C> {
	/// Creates an empty tree ordered by `cmp`.
	///
	/// # Example
	///
	/// ```
	/// use redfern::{compare::Reverse, RbTree};
	///
	/// let mut tree = RbTree::with_comparator(Reverse);
	/// tree.insert(1, ());
	/// tree.insert(3, ());
	/// tree.insert(2, ());
	///
	/// let keys: Vec<_> = tree.keys().copied().collect();
	/// assert_eq!(keys, [3, 2, 1]);
	/// ```
	pub fn with_comparator(cmp: C) -> Self {
		Self::from_parts(NodeArena::new(), cmp)
	}

	/// Creates an empty tree ordered by `cmp` with room for `capacity` entries.
	pub fn with_capacity_and_comparator(capacity: usize, cmp: C) -> Self {
		Self::from_parts(NodeArena::with_capacity(capacity), cmp)
	}

	fn from_parts(nodes: NodeArena<K, V>, cmp: C) -> Self {
		RbTree {
			nodes,
			root: NIL,
			leftmost: NIL,
			len: 0,
			cmp,
		}
	}

	/// Returns the comparator ordering this tree.
	pub fn comparator(&self) -> &C {
		&self.cmp
	}

	// -----------------------------------------------------------------------
	// Size Operations
	// -----------------------------------------------------------------------

	/// Returns the number of entries in the tree. O(1).
	pub fn len(&self) -> usize {
		self.len
	}

	/// Returns `true` if the tree contains no entries.
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Returns the number of nodes on the longest root-to-leaf path.
	///
	/// An empty tree has height 0. A red-black tree with `n` entries has
	/// height at most `2 * log2(n + 1)`. This walks the whole tree.
	///
	/// # Example
	///
	/// ```
	/// use redfern::RbTree;
	///
	/// let tree: RbTree<u32, ()> = (0..1000).map(|k| (k, ())).collect();
	/// assert!(tree.height() <= 2 * 10);
	/// ```
	pub fn height(&self) -> usize {
		let mut height = 0;
		let mut stack: SmallVec<[(NodeId, usize); STACK_DEPTH]> = SmallVec::new();
		if !self.root.is_nil() {
			stack.push((self.root, 1));
		}
		while let Some((x, depth)) = stack.pop() {
			height = height.max(depth);
			for child in [self.nodes.left(x), self.nodes.right(x)] {
				if !child.is_nil() {
					stack.push((child, depth + 1));
				}
			}
		}
		height
	}

	/// Returns how many entries the tree can hold without reallocating.
	pub fn capacity(&self) -> usize {
		self.nodes.capacity()
	}

	/// Reserves room for at least `additional` more entries.
	pub fn reserve(&mut self, additional: usize) {
		self.nodes.reserve(additional);
	}

	/// Reserves room for at least `additional` more entries, reporting
	/// allocation failure instead of aborting.
	pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
		self.nodes.try_reserve(additional)?;
		Ok(())
	}

	/// Releases unused capacity.
	///
	/// Slots freed by removals in the middle of the arena are kept for reuse;
	/// only trailing free slots and spare capacity are returned.
	pub fn shrink_to_fit(&mut self) {
		debug!("shrinking tree arena, {} live entries, capacity {}", self.len, self.capacity());
		self.nodes.shrink_to_fit();
	}

	/// Removes all entries, dropping each exactly once.
	///
	/// The arena keeps its capacity; all handles become invalid.
	///
	/// # Example
	///
	/// ```
	/// use redfern::RbTree;
	///
	/// let mut tree: RbTree<i32, &str> = RbTree::new();
	/// tree.insert(1, "one");
	/// tree.insert(2, "two");
	/// assert_eq!(tree.len(), 2);
	///
	/// tree.clear();
	/// assert!(tree.is_empty());
	/// assert_eq!(tree.height(), 0);
	/// ```
	pub fn clear(&mut self) {
		debug!("clearing tree with {} entries", self.len);
		self.nodes.clear();
		self.root = NIL;
		self.leftmost = NIL;
		self.len = 0;
	}

	/// Exchanges the contents of two trees in O(1).
	pub fn swap(&mut self, other: &mut Self) {
		mem::swap(self, other);
	}

	// -----------------------------------------------------------------------
	// Handle Navigation
	// -----------------------------------------------------------------------

	/// Handle to the first entry, or [`end`](Self::end) if the tree is empty.
	/// O(1): the minimum is cached.
	pub fn begin(&self) -> Handle {
		Handle(self.leftmost)
	}

	/// The end position: one past the last entry, and one before the first.
	pub fn end(&self) -> Handle {
		Handle::END
	}

	/// Handle to the last entry, or [`end`](Self::end) if the tree is empty.
	pub fn rbegin(&self) -> Handle {
		Handle(self.nodes.maximum(self.root))
	}

	/// The end position of a reverse walk; the same position as
	/// [`end`](Self::end).
	pub fn rend(&self) -> Handle {
		Handle::END
	}

	/// Handle to the entry after `handle`.
	///
	/// Stepping past the last entry yields `end`; stepping from `end` stays
	/// at `end`.
	pub fn next(&self, handle: Handle) -> Handle {
		if self.nodes.get(handle.0).is_none() {
			return Handle::END;
		}
		Handle(self.nodes.successor(handle.0))
	}

	/// Handle to the entry before `handle`.
	///
	/// Stepping back from `end` yields the last entry; stepping back from the
	/// first entry yields `end`.
	///
	/// # Example
	///
	/// ```
	/// use redfern::RbTree;
	///
	/// let tree: RbTree<i32, ()> = [(1, ()), (2, ()), (3, ())].into();
	///
	/// let mut keys = Vec::new();
	/// let mut h = tree.prev(tree.end());
	/// while !h.is_end() {
	///     keys.push(*tree.get_at(h).unwrap().0);
	///     h = tree.prev(h);
	/// }
	/// assert_eq!(keys, [3, 2, 1]);
	/// ```
	pub fn prev(&self, handle: Handle) -> Handle {
		if handle.is_end() {
			return self.rbegin();
		}
		if self.nodes.get(handle.0).is_none() {
			return Handle::END;
		}
		Handle(self.nodes.predecessor(handle.0))
	}

	/// Returns the entry at `handle`, or `None` for `end` or a stale handle.
	pub fn get_at(&self, handle: Handle) -> Option<(&K, &V)> {
		self.nodes.get(handle.0).map(|(k, v)| (k, v))
	}

	/// Returns the entry at `handle` with a mutable value.
	pub fn get_at_mut(&mut self, handle: Handle) -> Option<(&K, &mut V)> {
		self.nodes.get_mut(handle.0).map(|(k, v)| (&*k, v))
	}

	// -----------------------------------------------------------------------
	// Positional Removal
	// -----------------------------------------------------------------------

	/// Removes the entry at `handle`.
	///
	/// Returns the handle of the entry that followed it (or `end`) together
	/// with the removed entry. Continue iterating from the returned handle:
	/// when the removed entry had two children its successor is moved into
	/// its node, so the returned handle may equal `handle`.
	///
	/// # Errors
	///
	/// [`Error::InvalidHandle`] if `handle` is `end` or refers to no entry.
	///
	/// # Example
	///
	/// ```
	/// use redfern::RbTree;
	///
	/// let mut tree: RbTree<i32, ()> = (1..=7).map(|k| (k, ())).collect();
	///
	/// // Remove every even key while walking forward.
	/// let mut h = tree.begin();
	/// while !h.is_end() {
	///     let key = *tree.get_at(h).unwrap().0;
	///     h = if key % 2 == 0 { tree.remove_at(h).unwrap().0 } else { tree.next(h) };
	/// }
	///
	/// let keys: Vec<_> = tree.keys().copied().collect();
	/// assert_eq!(keys, [1, 3, 5, 7]);
	/// ```
	pub fn remove_at(&mut self, handle: Handle) -> Result<(Handle, (K, V))> {
		if self.nodes.get(handle.0).is_none() {
			return Err(Error::InvalidHandle);
		}
		let removed = self.remove_node(handle.0);
		Ok((Handle(removed.next), removed.entry))
	}

	/// Removes the entries in `[first, last)` and returns how many were
	/// removed.
	///
	/// `last` may be `end`. Nothing is removed when `first == last`.
	///
	/// # Errors
	///
	/// [`Error::InvalidHandle`] if `first` refers to no entry (and differs
	/// from `last`), or if `last` is not reachable forward from `first`. The
	/// tree is unchanged on error.
	pub fn remove_range(&mut self, first: Handle, last: Handle) -> Result<usize> {
		if first == last {
			return Ok(0);
		}
		if self.nodes.get(first.0).is_none() {
			return Err(Error::InvalidHandle);
		}
		if !last.is_end() && self.nodes.get(last.0).is_none() {
			return Err(Error::InvalidHandle);
		}

		// Count first, remove second: removals relocate payloads, so `last`
		// itself is not a reliable stop marker once removal starts.
		let mut count = 0;
		let mut x = first.0;
		while x != last.0 {
			if x.is_nil() {
				return Err(Error::InvalidHandle);
			}
			count += 1;
			x = self.nodes.successor(x);
		}

		debug!("removing range of {} entries", count);
		let mut x = first.0;
		for _ in 0..count {
			x = self.remove_node(x).next;
		}
		Ok(count)
	}

	/// Removes and returns the first entry.
	pub fn pop_first(&mut self) -> Option<(K, V)> {
		if self.leftmost.is_nil() {
			return None;
		}
		Some(self.remove_node(self.leftmost).entry)
	}

	/// Removes and returns the last entry.
	pub fn pop_last(&mut self) -> Option<(K, V)> {
		let last = self.nodes.maximum(self.root);
		if last.is_nil() {
			return None;
		}
		Some(self.remove_node(last).entry)
	}

	/// Keeps only the entries for which `f` returns `true`, visiting them in
	/// key order.
	pub fn retain<F>(&mut self, mut f: F)
	where
		F: FnMut(&K, &mut V) -> bool,
	{
		let mut x = self.leftmost;
		while !x.is_nil() {
			let (k, v) = self.nodes.entry_mut(x);
			if f(k, v) {
				x = self.nodes.successor(x);
			} else {
				x = self.remove_node(x).next;
			}
		}
	}

	// -----------------------------------------------------------------------
	// Iteration
	// -----------------------------------------------------------------------

	fn all(&self) -> Ends {
		Ends::new(self.leftmost, self.nodes.maximum(self.root))
	}

	/// Returns an in-order iterator over the entries.
	///
	/// # Example
	///
	/// ```
	/// use redfern::RbTree;
	///
	/// let tree: RbTree<i32, char> = [(2, 'b'), (1, 'a'), (3, 'c')].into();
	///
	/// let forward: Vec<_> = tree.iter().map(|(k, _)| *k).collect();
	/// let backward: Vec<_> = tree.iter().rev().map(|(k, _)| *k).collect();
	/// assert_eq!(forward, [1, 2, 3]);
	/// assert_eq!(backward, [3, 2, 1]);
	/// ```
	pub fn iter(&self) -> Iter<'_, K, V> {
		Iter::new(&self.nodes, self.all(), self.len)
	}

	/// Returns an in-order iterator with mutable access to the values.
	pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
		let ends = self.all();
		IterMut::new(&mut self.nodes, ends, self.len)
	}

	/// Returns an in-order iterator over the keys.
	pub fn keys(&self) -> Keys<'_, K, V> {
		Keys {
			inner: self.iter(),
		}
	}

	/// Returns an iterator over the values, in key order.
	pub fn values(&self) -> Values<'_, K, V> {
		Values {
			inner: self.iter(),
		}
	}

	/// Returns an iterator over mutable values, in key order.
	pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
		ValuesMut {
			inner: self.iter_mut(),
		}
	}

	/// Returns the first entry. O(1).
	pub fn first_key_value(&self) -> Option<(&K, &V)> {
		self.get_at(self.begin())
	}

	/// Returns the last entry.
	pub fn last_key_value(&self) -> Option<(&K, &V)> {
		self.get_at(self.rbegin())
	}

	// -----------------------------------------------------------------------
	// Diagnostics
	// -----------------------------------------------------------------------

	/// Renders the tree structure, one node per line, in pre-order.
	///
	/// Each line is indented two spaces per level and reads
	/// `[L |R ]key:color`. Sentinel children are omitted.
	///
	/// # Example
	///
	/// ```
	/// use redfern::RbTree;
	///
	/// let tree: RbTree<i32, ()> = [(10, ()), (20, ()), (30, ())].into();
	/// assert_eq!(tree.dump(), "20:B\n  L 10:R\n  R 30:R\n");
	/// ```
	pub fn dump(&self) -> String
	where
		K: fmt::Debug,
	{
		let mut out = String::new();
		let mut stack: SmallVec<[(NodeId, usize, &str); STACK_DEPTH]> = SmallVec::new();
		if !self.root.is_nil() {
			stack.push((self.root, 0, ""));
		}
		while let Some((x, depth, tag)) = stack.pop() {
			let _ = writeln!(
				out,
				"{:indent$}{}{:?}:{}",
				"",
				tag,
				self.nodes.key(x),
				self.nodes.color(x).symbol(),
				indent = depth * 2
			);
			let (left, right) = (self.nodes.left(x), self.nodes.right(x));
			if !right.is_nil() {
				stack.push((right, depth + 1, "R "));
			}
			if !left.is_nil() {
				stack.push((left, depth + 1, "L "));
			}
		}
		out
	}
}

// ---------------------------------------------------------------------------
// Insertion
// ---------------------------------------------------------------------------

impl<K, V, C: Comparator<K>> RbTree<K, V, C> {
	/// Inserts a key-value pair if the key is not present.
	///
	/// Returns the handle of the entry with this key and whether it was
	/// inserted. On a duplicate key nothing changes: the stored key and value
	/// are kept and the arguments are dropped. Use [`replace`](Self::replace)
	/// to overwrite.
	///
	/// Aborts on allocation failure, like the standard collections; see
	/// [`try_insert`](Self::try_insert).
	///
	/// # Example
	///
	/// ```
	/// use redfern::RbTree;
	///
	/// let mut tree = RbTree::new();
	/// let (h, inserted) = tree.insert(1, "one");
	/// assert!(inserted);
	///
	/// let (again, inserted) = tree.insert(1, "uno");
	/// assert!(!inserted);
	/// assert_eq!(again, h);
	/// assert_eq!(tree.get(&1), Some(&"one"));
	/// ```
	pub fn insert(&mut self, key: K, value: V) -> (Handle, bool) {
		match self.locate(&key) {
			Slot::Occupied(id) => (Handle(id), false),
			Slot::Vacant {
				parent,
				side,
			} => (Handle(self.attach(parent, side, key, value)), true),
		}
	}

	/// Like [`insert`](Self::insert), but reports allocation failure.
	///
	/// The node is reserved before the tree is touched, so on error the tree
	/// is unchanged.
	pub fn try_insert(&mut self, key: K, value: V) -> Result<(Handle, bool)> {
		match self.locate(&key) {
			Slot::Occupied(id) => Ok((Handle(id), false)),
			Slot::Vacant {
				parent,
				side,
			} => {
				self.nodes.try_reserve_one()?;
				Ok((Handle(self.attach(parent, side, key, value)), true))
			}
		}
	}

	/// Inserts a key-value pair, overwriting the value of an existing entry.
	///
	/// Returns the previous value if the key was present. The stored key is
	/// kept in that case.
	pub fn replace(&mut self, key: K, value: V) -> Option<V> {
		match self.locate(&key) {
			Slot::Occupied(id) => Some(mem::replace(&mut self.nodes.entry_mut(id).1, value)),
			Slot::Vacant {
				parent,
				side,
			} => {
				self.attach(parent, side, key, value);
				None
			}
		}
	}

	/// Returns the value for `key`, inserting `default()` first if absent.
	///
	/// # Example
	///
	/// ```
	/// use redfern::RbTree;
	///
	/// let mut counts: RbTree<char, usize> = RbTree::new();
	/// for c in "hello".chars() {
	///     *counts.get_or_insert_with(c, || 0) += 1;
	/// }
	/// assert_eq!(counts.get(&'l'), Some(&2));
	/// ```
	pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
	where
		F: FnOnce() -> V,
	{
		let id = match self.locate(&key) {
			Slot::Occupied(id) => id,
			Slot::Vacant {
				parent,
				side,
			} => self.attach(parent, side, key, default()),
		};
		&mut self.nodes.entry_mut(id).1
	}
}

// ---------------------------------------------------------------------------
// Lookup and Removal by Key
// ---------------------------------------------------------------------------

impl<K, V, C> RbTree<K, V, C> {
	fn find_node<Q>(&self, key: &Q) -> NodeId
	where
		K: Borrow<Q>,
		Q: ?Sized,
		C: Comparator<Q>,
	{
		let mut x = self.root;
		while !x.is_nil() {
			match self.cmp.compare(key, self.nodes.key(x).borrow()) {
				std::cmp::Ordering::Less => x = self.nodes.left(x),
				std::cmp::Ordering::Greater => x = self.nodes.right(x),
				std::cmp::Ordering::Equal => return x,
			}
		}
		NIL
	}

	/// First node whose key is not less than `key`.
	fn lower_bound_node<Q>(&self, key: &Q) -> NodeId
	where
		K: Borrow<Q>,
		Q: ?Sized,
		C: Comparator<Q>,
	{
		let mut found = NIL;
		let mut x = self.root;
		while !x.is_nil() {
			if self.cmp.less(self.nodes.key(x).borrow(), key) {
				x = self.nodes.right(x);
			} else {
				found = x;
				x = self.nodes.left(x);
			}
		}
		found
	}

	/// First node whose key is greater than `key`.
	fn upper_bound_node<Q>(&self, key: &Q) -> NodeId
	where
		K: Borrow<Q>,
		Q: ?Sized,
		C: Comparator<Q>,
	{
		let mut found = NIL;
		let mut x = self.root;
		while !x.is_nil() {
			if self.cmp.less(key, self.nodes.key(x).borrow()) {
				found = x;
				x = self.nodes.left(x);
			} else {
				x = self.nodes.right(x);
			}
		}
		found
	}

	/// Node before `x`, where the sentinel stands for "past the end".
	fn before(&self, x: NodeId) -> NodeId {
		if x.is_nil() {
			self.nodes.maximum(self.root)
		} else {
			self.nodes.predecessor(x)
		}
	}

	/// Returns the handle of the entry with `key`, or [`end`](Self::end).
	///
	/// Any borrowed form of the key can be used, as long as the comparator
	/// orders it consistently with `K`.
	///
	/// # Example
	///
	/// ```
	/// use redfern::RbTree;
	///
	/// let mut tree: RbTree<String, u32> = RbTree::new();
	/// tree.insert("apple".to_string(), 3);
	///
	/// let h = tree.search("apple");
	/// assert_eq!(tree.get_at(h), Some((&"apple".to_string(), &3)));
	/// assert!(tree.search("pear").is_end());
	/// ```
	pub fn search<Q>(&self, key: &Q) -> Handle
	where
		K: Borrow<Q>,
		Q: ?Sized,
		C: Comparator<Q>,
	{
		Handle(self.find_node(key))
	}

	/// Returns a reference to the value for `key`.
	pub fn get<Q>(&self, key: &Q) -> Option<&V>
	where
		K: Borrow<Q>,
		Q: ?Sized,
		C: Comparator<Q>,
	{
		self.get_key_value(key).map(|(_, v)| v)
	}

	/// Returns the stored key and the value for `key`.
	pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
	where
		K: Borrow<Q>,
		Q: ?Sized,
		C: Comparator<Q>,
	{
		self.get_at(self.search(key))
	}

	/// Returns a mutable reference to the value for `key`.
	pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
	where
		K: Borrow<Q>,
		Q: ?Sized,
		C: Comparator<Q>,
	{
		let handle = self.search(key);
		self.get_at_mut(handle).map(|(_, v)| v)
	}

	/// Returns the value for `key`, or [`Error::KeyNotFound`].
	///
	/// # Example
	///
	/// ```
	/// use redfern::{Error, RbTree};
	///
	/// let tree: RbTree<i32, &str> = [(1, "one")].into();
	/// assert_eq!(*tree.at(&1).unwrap(), "one");
	/// assert!(matches!(tree.at(&2), Err(Error::KeyNotFound)));
	/// ```
	pub fn at<Q>(&self, key: &Q) -> Result<&V>
	where
		K: Borrow<Q>,
		Q: ?Sized,
		C: Comparator<Q>,
	{
		self.get(key).ok_or(Error::KeyNotFound)
	}

	/// Returns the value for `key` mutably, or [`Error::KeyNotFound`].
	pub fn at_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
	where
		K: Borrow<Q>,
		Q: ?Sized,
		C: Comparator<Q>,
	{
		self.get_mut(key).ok_or(Error::KeyNotFound)
	}

	/// Returns `true` if the tree contains `key`.
	pub fn contains_key<Q>(&self, key: &Q) -> bool
	where
		K: Borrow<Q>,
		Q: ?Sized,
		C: Comparator<Q>,
	{
		!self.find_node(key).is_nil()
	}

	/// Number of entries with `key`: 0 or 1, since keys are unique.
	pub fn count<Q>(&self, key: &Q) -> usize
	where
		K: Borrow<Q>,
		Q: ?Sized,
		C: Comparator<Q>,
	{
		usize::from(self.contains_key(key))
	}

	/// Handle to the first entry whose key is not less than `key`, or `end`.
	pub fn lower_bound<Q>(&self, key: &Q) -> Handle
	where
		K: Borrow<Q>,
		Q: ?Sized,
		C: Comparator<Q>,
	{
		Handle(self.lower_bound_node(key))
	}

	/// Handle to the first entry whose key is greater than `key`, or `end`.
	pub fn upper_bound<Q>(&self, key: &Q) -> Handle
	where
		K: Borrow<Q>,
		Q: ?Sized,
		C: Comparator<Q>,
	{
		Handle(self.upper_bound_node(key))
	}

	/// The half-open handle range `[lower_bound, upper_bound)` of entries
	/// equal to `key`. It holds at most one entry.
	///
	/// # Example
	///
	/// ```
	/// use redfern::RbTree;
	///
	/// let tree: RbTree<i32, ()> = [(10, ()), (20, ()), (30, ())].into();
	///
	/// let (lo, hi) = tree.equal_range(&20);
	/// assert_eq!(tree.get_at(lo).map(|(k, _)| *k), Some(20));
	/// assert_eq!(tree.get_at(hi).map(|(k, _)| *k), Some(30));
	///
	/// let (lo, hi) = tree.equal_range(&25);
	/// assert_eq!(lo, hi);
	/// ```
	pub fn equal_range<Q>(&self, key: &Q) -> (Handle, Handle)
	where
		K: Borrow<Q>,
		Q: ?Sized,
		C: Comparator<Q>,
	{
		(self.lower_bound(key), self.upper_bound(key))
	}

	/// Returns an in-order iterator over the entries whose keys fall in
	/// `range`. An inverted range yields nothing.
	///
	/// # Example
	///
	/// ```
	/// use redfern::RbTree;
	///
	/// let tree: RbTree<i32, ()> = (0..10).map(|k| (k, ())).collect();
	///
	/// let keys: Vec<_> = tree.range(3..6).map(|(k, _)| *k).collect();
	/// assert_eq!(keys, [3, 4, 5]);
	///
	/// let keys: Vec<_> = tree.range(7..).rev().map(|(k, _)| *k).collect();
	/// assert_eq!(keys, [9, 8, 7]);
	/// ```
	pub fn range<Q, R>(&self, range: R) -> Range<'_, K, V>
	where
		K: Borrow<Q>,
		Q: ?Sized,
		C: Comparator<Q>,
		R: RangeBounds<Q>,
	{
		let front = match range.start_bound() {
			Bound::Included(key) => self.lower_bound_node(key),
			Bound::Excluded(key) => self.upper_bound_node(key),
			Bound::Unbounded => self.leftmost,
		};
		let back = match range.end_bound() {
			Bound::Included(key) => self.before(self.upper_bound_node(key)),
			Bound::Excluded(key) => self.before(self.lower_bound_node(key)),
			Bound::Unbounded => self.nodes.maximum(self.root),
		};

		let inverted = !front.is_nil()
			&& !back.is_nil()
			&& self.cmp.less(self.nodes.key(back).borrow(), self.nodes.key(front).borrow());
		let ends = if inverted {
			Ends::EMPTY
		} else {
			Ends::new(front, back)
		};
		Range::new(&self.nodes, ends)
	}

	/// Removes `key`, returning its value if it was present.
	///
	/// # Example
	///
	/// ```
	/// use redfern::RbTree;
	///
	/// let mut tree: RbTree<i32, &str> = RbTree::new();
	/// tree.insert(1, "one");
	///
	/// assert_eq!(tree.remove(&1), Some("one"));
	/// assert_eq!(tree.remove(&1), None); // Already removed
	/// ```
	pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
	where
		K: Borrow<Q>,
		Q: ?Sized,
		C: Comparator<Q>,
	{
		self.remove_entry(key).map(|(_, v)| v)
	}

	/// Removes `key`, returning the stored key and value.
	pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
	where
		K: Borrow<Q>,
		Q: ?Sized,
		C: Comparator<Q>,
	{
		let z = self.find_node(key);
		if z.is_nil() {
			return None;
		}
		Some(self.remove_node(z).entry)
	}
}

// ---------------------------------------------------------------------------
// Trait Implementations
// ---------------------------------------------------------------------------

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for RbTree<K, V, C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.iter()).finish()
	}
}

impl<K: PartialEq, V: PartialEq, C> PartialEq for RbTree<K, V, C> {
	fn eq(&self, other: &Self) -> bool {
		self.len == other.len && self.iter().eq(other.iter())
	}
}

impl<K: Eq, V: Eq, C> Eq for RbTree<K, V, C> {}

impl<K: PartialOrd, V: PartialOrd, C> PartialOrd for RbTree<K, V, C> {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		self.iter().partial_cmp(other.iter())
	}
}

impl<K: Ord, V: Ord, C> Ord for RbTree<K, V, C> {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		self.iter().cmp(other.iter())
	}
}

impl<K: Hash, V: Hash, C> Hash for RbTree<K, V, C> {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.len.hash(state);
		for entry in self.iter() {
			entry.hash(state);
		}
	}
}

impl<K, V, C: Comparator<K>> Extend<(K, V)> for RbTree<K, V, C> {
	/// Inserts every pair; pairs whose key is already present are skipped.
	fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
		for (k, v) in iter {
			self.insert(k, v);
		}
	}
}

impl<K, V, C: Comparator<K> + Default> FromIterator<(K, V)> for RbTree<K, V, C> {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut tree = Self::default();
		tree.extend(iter);
		tree
	}
}

impl<K, V, C: Comparator<K> + Default, const N: usize> From<[(K, V); N]> for RbTree<K, V, C> {
	fn from(entries: [(K, V); N]) -> Self {
		entries.into_iter().collect()
	}
}

impl<K, V, Q, C> Index<&Q> for RbTree<K, V, C>
where
	K: Borrow<Q>,
	Q: ?Sized,
	C: Comparator<Q>,
{
	type Output = V;

	/// # Panics
	///
	/// Panics if the key is not present.
	fn index(&self, key: &Q) -> &V {
		match self.get(key) {
			Some(value) => value,
			None => panic!("key not found in tree"),
		}
	}
}

impl<K, V, C> IntoIterator for RbTree<K, V, C> {
	type Item = (K, V);
	type IntoIter = IntoIter<K, V>;

	fn into_iter(self) -> IntoIter<K, V> {
		let ends = self.all();
		IntoIter::new(self.nodes, ends, self.len)
	}
}

impl<'a, K, V, C> IntoIterator for &'a RbTree<K, V, C> {
	type Item = (&'a K, &'a V);
	type IntoIter = Iter<'a, K, V>;

	fn into_iter(self) -> Iter<'a, K, V> {
		self.iter()
	}
}

impl<'a, K, V, C> IntoIterator for &'a mut RbTree<K, V, C> {
	type Item = (&'a K, &'a mut V);
	type IntoIter = IterMut<'a, K, V>;

	fn into_iter(self) -> IterMut<'a, K, V> {
		self.iter_mut()
	}
}

// ===========================================================================
// Test-Only Validation
// ===========================================================================

/// Invariant validation for testing. Compiled into unit tests and with the
/// `test-utils` feature; never called by the tree itself.
#[cfg(any(test, feature = "test-utils"))]
impl<K: fmt::Debug, V, C: Comparator<K>> RbTree<K, V, C> {
	/// Validates every tree invariant. Panics with diagnostic info if one is
	/// violated.
	///
	/// # Invariants Checked
	///
	/// 1. Colors: the sentinel and the root are black
	/// 2. Sentinel: no payload, self-linked, parent reset
	/// 3. Red rule: no red node has a red child
	/// 4. Black height: equal on every path
	/// 5. Ordering: strictly increasing keys in-order
	/// 6. Links: every child's parent link points back at its parent
	/// 7. Bookkeeping: `len`, live slots, free list and cached minimum agree
	pub fn assert_invariants(&self) {
		assert!(self.nodes.is_black(NIL), "sentinel is red");
		assert!(self.nodes.get(NIL).is_none(), "sentinel holds a payload");
		assert!(
			self.nodes.left(NIL).is_nil() && self.nodes.right(NIL).is_nil(),
			"sentinel children are not the sentinel"
		);
		assert!(self.nodes.parent(NIL).is_nil(), "sentinel parent was left dangling");

		if self.root.is_nil() {
			assert_eq!(self.len, 0, "empty tree reports len {}", self.len);
			assert!(self.leftmost.is_nil(), "empty tree caches a minimum");
			return;
		}

		assert!(self.nodes.is_black(self.root), "root {:?} is red", self.nodes.key(self.root));
		assert!(self.nodes.parent(self.root).is_nil(), "root has a parent");

		let mut count = 0;
		self.validate_subtree(self.root, None, None, &mut count);

		assert_eq!(count, self.len, "reachable nodes {} != len {}", count, self.len);
		assert_eq!(
			self.nodes.live_slots(),
			self.len,
			"arena holds {} payloads for len {}",
			self.nodes.live_slots(),
			self.len
		);
		for id in self.nodes.free_list() {
			assert!(self.nodes.get(*id).is_none(), "free slot {} holds a payload", id.index());
		}
		assert_eq!(
			self.leftmost,
			self.nodes.minimum(self.root),
			"cached minimum is stale"
		);
	}

	/// Validates the subtree at `x` and returns its black height (counting
	/// the sentinel, excluding `x`'s own color only through recursion).
	fn validate_subtree(
		&self,
		x: NodeId,
		lower: Option<&K>,
		upper: Option<&K>,
		count: &mut usize,
	) -> usize {
		if x.is_nil() {
			return 1;
		}
		*count += 1;
		let key = self.nodes.key(x);

		if let Some(lower) = lower {
			assert!(self.cmp.less(lower, key), "key {:?} not greater than {:?}", key, lower);
		}
		if let Some(upper) = upper {
			assert!(self.cmp.less(key, upper), "key {:?} not less than {:?}", key, upper);
		}

		let (left, right) = (self.nodes.left(x), self.nodes.right(x));
		for child in [left, right] {
			if !child.is_nil() {
				assert_eq!(self.nodes.parent(child), x, "child of {:?} has a wrong parent link", key);
			}
		}

		if self.nodes.is_red(x) {
			assert!(
				self.nodes.is_black(left) && self.nodes.is_black(right),
				"red node {:?} has a red child",
				key
			);
		}

		let left_height = self.validate_subtree(left, lower, Some(key), count);
		let right_height = self.validate_subtree(right, Some(key), upper, count);
		assert_eq!(
			left_height, right_height,
			"black heights differ under {:?}: {} vs {}",
			key, left_height, right_height
		);

		left_height + usize::from(self.nodes.is_black(x))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::compare::{LessBy, Reverse};

	fn tree_of(keys: impl IntoIterator<Item = i32>) -> RbTree<i32, i32> {
		keys.into_iter().map(|k| (k, k * 10)).collect()
	}

	// -----------------------------------------------------------------------
	// Basic Tree Operation Tests
	// -----------------------------------------------------------------------

	#[test]
	fn basic_insert_and_lookup() {
		let mut tree: RbTree<i32, &str> = RbTree::new();

		assert!(tree.insert(1, "one").1);
		assert!(tree.insert(2, "two").1);
		assert!(tree.insert(3, "three").1);

		tree.assert_invariants();

		assert_eq!(tree.get(&1), Some(&"one"));
		assert_eq!(tree.get(&2), Some(&"two"));
		assert_eq!(tree.get(&3), Some(&"three"));
		assert_eq!(tree.get(&4), None);
	}

	#[test]
	fn duplicate_insert_is_a_no_op() {
		let mut tree: RbTree<i32, &str> = RbTree::new();

		let (first, inserted) = tree.insert(1, "one");
		assert!(inserted);
		let before = tree.dump();

		let (second, inserted) = tree.insert(1, "uno");
		assert!(!inserted);
		assert_eq!(first, second);
		assert_eq!(tree.len(), 1);
		assert_eq!(tree.get(&1), Some(&"one"));
		assert_eq!(tree.dump(), before);

		tree.assert_invariants();
	}

	#[test]
	fn replace_overwrites_value() {
		let mut tree: RbTree<i32, &str> = RbTree::new();

		assert_eq!(tree.replace(1, "one"), None);
		assert_eq!(tree.replace(1, "uno"), Some("one"));
		assert_eq!(tree.get(&1), Some(&"uno"));
		assert_eq!(tree.len(), 1);

		tree.assert_invariants();
	}

	#[test]
	fn remove() {
		let mut tree: RbTree<i32, &str> = RbTree::new();

		tree.insert(1, "one");
		tree.insert(2, "two");

		tree.assert_invariants();

		assert_eq!(tree.remove(&1), Some("one"));
		assert_eq!(tree.get(&1), None);
		assert_eq!(tree.get(&2), Some(&"two"));
		assert!(tree.search(&1).is_end());

		tree.assert_invariants();
	}

	#[test]
	fn remove_entry_returns_key_and_value() {
		let mut tree: RbTree<String, i32> = RbTree::new();
		tree.insert("k".to_string(), 1);
		assert_eq!(tree.remove_entry("k"), Some(("k".to_string(), 1)));
		assert_eq!(tree.remove_entry("k"), None);
	}

	#[test]
	fn len_and_is_empty() {
		let mut tree: RbTree<i32, i32> = RbTree::new();

		assert!(tree.is_empty());
		assert_eq!(tree.len(), 0);

		tree.insert(1, 10);
		assert!(!tree.is_empty());
		assert_eq!(tree.len(), 1);

		tree.insert(2, 20);
		tree.insert(2, 21);
		assert_eq!(tree.len(), 2);

		tree.remove(&1);
		tree.remove(&1);
		assert_eq!(tree.len(), 1);

		tree.assert_invariants();
	}

	// -----------------------------------------------------------------------
	// Concrete Rebalancing Scenarios
	// -----------------------------------------------------------------------

	#[test]
	fn seven_node_tree_remove_root_with_two_children() {
		let mut tree = tree_of([50, 30, 70, 20, 40, 60, 80]);
		assert_eq!(
			tree.dump(),
			"50:B\n  L 30:B\n    L 20:R\n    R 40:R\n  R 70:B\n    L 60:R\n    R 80:R\n"
		);

		assert_eq!(tree.remove(&50), Some(500));
		tree.assert_invariants();

		let keys: Vec<_> = tree.keys().copied().collect();
		assert_eq!(keys, [20, 30, 40, 60, 70, 80]);
		assert_eq!(
			tree.dump(),
			"60:B\n  L 30:B\n    L 20:R\n    R 40:R\n  R 70:B\n    R 80:R\n"
		);
	}

	#[test]
	fn ascending_inserts_stay_balanced() {
		let mut tree: RbTree<i32, ()> = RbTree::new();
		for i in 0..1000 {
			tree.insert(i, ());
		}
		tree.assert_invariants();
		// 2 * log2(1001) < 20
		assert!(tree.height() <= 19, "height {} too large", tree.height());
	}

	// -----------------------------------------------------------------------
	// Handle Tests
	// -----------------------------------------------------------------------

	#[test]
	fn handles_walk_forward_and_back() {
		let tree = tree_of(0..100);

		let mut h = tree.begin();
		for i in 0..100 {
			assert_eq!(tree.get_at(h), Some((&i, &(i * 10))));
			h = tree.next(h);
		}
		assert!(h.is_end());
		assert!(tree.next(h).is_end(), "next(end) stays at end");

		let mut h = tree.rbegin();
		for i in (0..100).rev() {
			assert_eq!(tree.get_at(h).map(|(k, _)| *k), Some(i));
			h = tree.prev(h);
		}
		assert_eq!(h, tree.rend());
	}

	#[test]
	fn begin_and_rbegin_on_empty_tree() {
		let tree: RbTree<i32, i32> = RbTree::new();
		assert!(tree.begin().is_end());
		assert!(tree.rbegin().is_end());
		assert!(tree.prev(tree.end()).is_end());
		assert_eq!(tree.get_at(tree.end()), None);
	}

	#[test]
	fn remove_at_returns_following_entry() {
		let mut tree = tree_of([50, 30, 70, 20, 40, 60, 80]);

		// 50 has two children: 60 moves into its node.
		let h = tree.search(&50);
		let (next, entry) = tree.remove_at(h).unwrap();
		assert_eq!(entry, (50, 500));
		assert_eq!(next, h);
		assert_eq!(tree.get_at(next).map(|(k, _)| *k), Some(60));

		// 80 is the maximum.
		let (next, _) = tree.remove_at(tree.search(&80)).unwrap();
		assert!(next.is_end());

		// 20 is a leaf with a successor above it.
		let (next, _) = tree.remove_at(tree.search(&20)).unwrap();
		assert_eq!(tree.get_at(next).map(|(k, _)| *k), Some(30));
		assert_eq!(tree.begin(), next);

		tree.assert_invariants();
	}

	#[test]
	fn remove_at_rejects_end_and_stale_handles() {
		let mut tree = tree_of([1, 2, 3]);
		assert!(matches!(tree.remove_at(tree.end()), Err(Error::InvalidHandle)));

		let h = tree.search(&3);
		tree.remove_at(h).unwrap();
		assert!(matches!(tree.remove_at(h), Err(Error::InvalidHandle)));
		assert_eq!(tree.len(), 2);
	}

	#[test]
	fn remove_range_middle() {
		let mut tree = tree_of(0..20);
		let removed = tree.remove_range(tree.search(&5), tree.search(&15)).unwrap();
		assert_eq!(removed, 10);
		tree.assert_invariants();

		let keys: Vec<_> = tree.keys().copied().collect();
		let expected: Vec<_> = (0..5).chain(15..20).collect();
		assert_eq!(keys, expected);
	}

	#[test]
	fn remove_range_to_end_and_everything() {
		let mut tree = tree_of(0..50);
		assert_eq!(tree.remove_range(tree.search(&40), tree.end()).unwrap(), 10);
		tree.assert_invariants();
		assert_eq!(tree.last_key_value().map(|(k, _)| *k), Some(39));

		assert_eq!(tree.remove_range(tree.begin(), tree.end()).unwrap(), 40);
		tree.assert_invariants();
		assert!(tree.is_empty());
	}

	#[test]
	fn remove_range_rejects_backwards_range() {
		let mut tree = tree_of(0..10);
		let result = tree.remove_range(tree.search(&7), tree.search(&2));
		assert!(matches!(result, Err(Error::InvalidHandle)));
		assert_eq!(tree.len(), 10);
		assert_eq!(tree.remove_range(tree.search(&3), tree.search(&3)).unwrap(), 0);
	}

	// -----------------------------------------------------------------------
	// Ordered Query Tests
	// -----------------------------------------------------------------------

	#[test]
	fn lower_and_upper_bounds() {
		let tree = tree_of([10, 20, 30, 40]);
		let key_at = |h: Handle| tree.get_at(h).map(|(k, _)| *k);

		assert_eq!(key_at(tree.lower_bound(&20)), Some(20));
		assert_eq!(key_at(tree.upper_bound(&20)), Some(30));
		assert_eq!(key_at(tree.lower_bound(&25)), Some(30));
		assert_eq!(key_at(tree.upper_bound(&25)), Some(30));
		assert_eq!(key_at(tree.lower_bound(&0)), Some(10));
		assert!(tree.lower_bound(&41).is_end());
		assert!(tree.upper_bound(&40).is_end());
	}

	#[test]
	fn range_bounds() {
		let tree = tree_of(0..10);
		let keys = |r: Range<'_, i32, i32>| r.map(|(k, _)| *k).collect::<Vec<_>>();

		assert_eq!(keys(tree.range(2..5)), [2, 3, 4]);
		assert_eq!(keys(tree.range(2..=5)), [2, 3, 4, 5]);
		assert_eq!(keys(tree.range(..3)), [0, 1, 2]);
		assert_eq!(keys(tree.range((Bound::Excluded(7), Bound::Unbounded))), [8, 9]);
		assert_eq!(keys(tree.range(20..30)), Vec::<i32>::new());
		assert_eq!(keys(tree.range(5..5)), Vec::<i32>::new());
		assert_eq!(keys(tree.range((Bound::Excluded(4), Bound::Excluded(5)))), Vec::<i32>::new());
		assert_eq!(keys(tree.range::<i32, _>(..)), (0..10).collect::<Vec<_>>());
	}

	#[test]
	fn first_and_last_entries() {
		let mut tree = tree_of((0..200).rev());
		assert_eq!(tree.first_key_value(), Some((&0, &0)));
		assert_eq!(tree.last_key_value(), Some((&199, &1990)));

		assert_eq!(tree.pop_first(), Some((0, 0)));
		assert_eq!(tree.pop_last(), Some((199, 1990)));
		assert_eq!(tree.first_key_value().map(|(k, _)| *k), Some(1));
		tree.assert_invariants();

		let mut empty: RbTree<i32, i32> = RbTree::new();
		assert_eq!(empty.pop_first(), None);
		assert_eq!(empty.pop_last(), None);
		assert_eq!(empty.first_key_value(), None);
	}

	#[test]
	fn contains_key_with_borrowed_key() {
		let mut tree: RbTree<String, i32> = RbTree::new();
		tree.insert("hello".to_string(), 42);
		tree.insert("world".to_string(), 99);

		assert!(tree.contains_key("hello"));
		assert!(!tree.contains_key("missing"));
		assert_eq!(tree.count("world"), 1);
		assert_eq!(tree.count("missing"), 0);
		assert_eq!(tree["hello"], 42);
	}

	#[test]
	#[should_panic(expected = "key not found")]
	fn index_missing_key_panics() {
		let tree = tree_of([1]);
		let _value = tree[&2];
	}

	#[test]
	fn checked_access() {
		let mut tree = tree_of([1, 2]);
		*tree.at_mut(&2).unwrap() += 1;
		assert_eq!(*tree.at(&2).unwrap(), 21);
		assert!(matches!(tree.at(&3), Err(Error::KeyNotFound)));
		assert!(matches!(tree.at_mut(&3), Err(Error::KeyNotFound)));
	}

	#[test]
	fn get_or_insert_with_inserts_once() {
		let mut tree: RbTree<&str, Vec<u32>> = RbTree::new();
		tree.get_or_insert_with("a", Vec::new).push(1);
		tree.get_or_insert_with("a", || unreachable!()).push(2);
		assert_eq!(tree.get("a"), Some(&vec![1, 2]));
		assert_eq!(tree.len(), 1);
	}

	#[test]
	fn retain_keeps_matching_entries() {
		let mut tree = tree_of(0..100);
		tree.retain(|k, v| {
			*v += 1;
			k % 3 == 0
		});
		tree.assert_invariants();
		let expected: Vec<_> = (0..100).filter(|k| k % 3 == 0).map(|k| (k, k * 10 + 1)).collect();
		let actual: Vec<_> = tree.iter().map(|(k, v)| (*k, *v)).collect();
		assert_eq!(actual, expected);
	}

	// -----------------------------------------------------------------------
	// Whole-Tree Operations
	// -----------------------------------------------------------------------

	#[test]
	fn clear_then_insert() {
		let mut tree: RbTree<i32, &str> = RbTree::new();
		tree.insert(1, "one");
		tree.insert(2, "two");

		tree.clear();
		assert!(tree.is_empty());
		assert_eq!(tree.height(), 0);
		tree.assert_invariants();

		tree.insert(3, "three");
		tree.insert(4, "four");

		assert_eq!(tree.len(), 2);
		assert_eq!(tree.get(&3), Some(&"three"));
		assert_eq!(tree.get(&1), None);
		tree.assert_invariants();
	}

	#[test]
	fn clone_is_independent() {
		let mut original = tree_of(0..50);
		let copy = original.clone();

		original.remove(&10);
		original.insert(100, 0);

		copy.assert_invariants();
		assert_eq!(copy.len(), 50);
		assert!(copy.contains_key(&10));
		assert!(!copy.contains_key(&100));
		assert_ne!(original, copy);
	}

	#[test]
	fn swap_exchanges_contents() {
		let mut a = tree_of(0..3);
		let mut b = tree_of(10..15);
		a.swap(&mut b);
		assert_eq!(a.len(), 5);
		assert_eq!(b.len(), 3);
		assert_eq!(a.first_key_value(), Some((&10, &100)));
		assert_eq!(b.first_key_value(), Some((&0, &0)));
		a.assert_invariants();
		b.assert_invariants();
	}

	#[test]
	fn equality_ignores_shape() {
		let a = tree_of(0..20);
		let b = tree_of((0..20).rev());
		assert_ne!(a.dump(), b.dump());
		assert_eq!(a, b);
	}

	#[test]
	fn ordering_is_lexicographic() {
		let a = tree_of([1, 2, 3]);
		let b = tree_of([1, 2, 4]);
		let c = tree_of([1, 2]);
		assert!(a < b);
		assert!(c < a);
		assert_eq!(a.cmp(&a.clone()), std::cmp::Ordering::Equal);
	}

	#[test]
	fn hash_matches_for_equal_trees() {
		use std::collections::hash_map::DefaultHasher;

		let hash = |tree: &RbTree<i32, i32>| {
			let mut hasher = DefaultHasher::new();
			tree.hash(&mut hasher);
			hasher.finish()
		};
		assert_eq!(hash(&tree_of(0..10)), hash(&tree_of((0..10).rev())));
	}

	#[test]
	fn debug_formats_as_map() {
		let tree = tree_of([2, 1]);
		assert_eq!(format!("{:?}", tree), "{1: 10, 2: 20}");
	}

	#[test]
	fn capacity_management() {
		let mut tree: RbTree<i32, ()> = RbTree::with_capacity(16);
		assert!(tree.capacity() >= 16);

		tree.reserve(100);
		assert!(tree.capacity() >= 100);
		tree.try_reserve(10).unwrap();

		for i in 0..10 {
			tree.insert(i, ());
		}
		for i in 5..10 {
			tree.remove(&i);
		}
		tree.shrink_to_fit();
		tree.assert_invariants();
		assert!(tree.capacity() >= tree.len());

		assert!(tree.try_insert(42, ()).unwrap().1);
		assert!(!tree.try_insert(42, ()).unwrap().1);
		tree.assert_invariants();
	}

	#[test]
	fn try_reserve_overflow_reports_error() {
		let mut tree: RbTree<u64, u64> = RbTree::new();
		assert!(matches!(tree.try_reserve(usize::MAX), Err(Error::Alloc(_))));
		assert!(tree.is_empty());
	}

	#[test]
	fn slots_are_recycled() {
		let mut tree: RbTree<i32, ()> = RbTree::new();
		for i in 0..64 {
			tree.insert(i, ());
		}
		let capacity = tree.capacity();
		for round in 0..10 {
			for i in 0..64 {
				tree.remove(&i);
			}
			for i in 0..64 {
				tree.insert(i + round, ());
			}
		}
		assert_eq!(tree.capacity(), capacity);
		tree.assert_invariants();
	}

	// -----------------------------------------------------------------------
	// Comparator Tests
	// -----------------------------------------------------------------------

	#[test]
	fn reverse_comparator_orders_descending() {
		let mut tree = RbTree::with_comparator(Reverse);
		for k in [5, 1, 9, 3] {
			tree.insert(k, ());
		}
		tree.assert_invariants();
		let keys: Vec<_> = tree.keys().copied().collect();
		assert_eq!(keys, [9, 5, 3, 1]);
		assert_eq!(tree.get_at(tree.lower_bound(&4)).map(|(k, _)| *k), Some(3));
	}

	#[test]
	fn closure_comparator_defines_equality() {
		let mut tree = RbTree::with_comparator(LessBy(|a: &String, b: &String| {
			a.to_lowercase() < b.to_lowercase()
		}));
		assert!(tree.insert("Apple".to_string(), 1).1);
		assert!(!tree.insert("APPLE".to_string(), 2).1);
		assert!(tree.insert("banana".to_string(), 3).1);
		assert_eq!(tree.get(&"apple".to_string()), Some(&1));
		tree.assert_invariants();
	}

	#[test]
	fn set_alias() {
		let mut set: RbSet<&str> = RbSet::new();
		set.insert("b", ());
		set.insert("a", ());
		assert!(set.contains_key("a"));
		assert_eq!(set.keys().copied().collect::<Vec<_>>(), ["a", "b"]);
	}
}
