//! # Node & Sentinel Model
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. Index `0`
//! is reserved for the sentinel: the single black, payload-free node that
//! stands in for every missing child and for the root's parent.
//!
//! ```text
//!                  ┌──────────────┐
//!                  │ root (Black) │
//!                  └──────┬───────┘
//!               ┌─────────┴─────────┐
//!               ▼                   ▼
//!        ┌────────────┐      ┌────────────┐
//!        │   Red      │      │   Black    │
//!        └──┬──────┬──┘      └──┬──────┬──┘
//!           ▼      ▼            ▼      ▼
//!          NIL    NIL          NIL    NIL     <- all the same arena slot 0
//! ```
//!
//! Links and payloads are stored in two parallel vectors. Rotations and
//! fixups only ever touch the links; payloads move only when a removal
//! relocates a successor into the removed entry's node.
//!
//! Freed slots go onto a free list and are reused by later insertions, so a
//! steady insert/remove workload does not grow the arena.

use std::collections::TryReserveError;

/// Color tag of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
	Red,
	Black,
}

impl Color {
	pub(crate) fn symbol(self) -> char {
		match self {
			Color::Red => 'R',
			Color::Black => 'B',
		}
	}
}

/// Which child slot of a parent a node occupies.
///
/// Fixups are written once against a `Side` and its [`opposite`](Side::opposite)
/// so the mirrored cases cannot drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
	Left,
	Right,
}

impl Side {
	#[inline]
	pub(crate) fn opposite(self) -> Side {
		match self {
			Side::Left => Side::Right,
			Side::Right => Side::Left,
		}
	}
}

/// Index of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(usize);

/// The sentinel.
pub(crate) const NIL: NodeId = NodeId(0);

impl NodeId {
	#[inline]
	pub(crate) fn index(self) -> usize {
		self.0
	}

	#[inline]
	pub(crate) fn is_nil(self) -> bool {
		self == NIL
	}
}

/// Structural half of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Links {
	pub(crate) parent: NodeId,
	pub(crate) left: NodeId,
	pub(crate) right: NodeId,
	pub(crate) color: Color,
}

impl Links {
	/// Links of the sentinel, and of every freshly reset slot.
	pub(crate) const NIL: Links = Links {
		parent: NIL,
		left: NIL,
		right: NIL,
		color: Color::Black,
	};

	const fn red_leaf(parent: NodeId) -> Links {
		Links {
			parent,
			left: NIL,
			right: NIL,
			color: Color::Red,
		}
	}
}

/// Owner of every node of one tree, sentinel included.
#[derive(Clone)]
pub(crate) struct NodeArena<K, V> {
	links: Vec<Links>,
	slots: Vec<Option<(K, V)>>,
	free: Vec<NodeId>,
}

impl<K, V> NodeArena<K, V> {
	pub(crate) fn new() -> Self {
		Self::with_capacity(0)
	}

	/// Creates an arena with room for `capacity` nodes besides the sentinel.
	pub(crate) fn with_capacity(capacity: usize) -> Self {
		let mut links = Vec::with_capacity(capacity + 1);
		let mut slots = Vec::with_capacity(capacity + 1);
		links.push(Links::NIL);
		slots.push(None);
		NodeArena {
			links,
			slots,
			free: Vec::new(),
		}
	}

	// -----------------------------------------------------------------------
	// Link access
	// -----------------------------------------------------------------------

	#[inline]
	pub(crate) fn links(&self) -> &[Links] {
		&self.links
	}

	#[inline]
	pub(crate) fn parent(&self, id: NodeId) -> NodeId {
		self.links[id.0].parent
	}

	#[inline]
	pub(crate) fn left(&self, id: NodeId) -> NodeId {
		self.links[id.0].left
	}

	#[inline]
	pub(crate) fn right(&self, id: NodeId) -> NodeId {
		self.links[id.0].right
	}

	#[inline]
	pub(crate) fn child(&self, id: NodeId, side: Side) -> NodeId {
		match side {
			Side::Left => self.left(id),
			Side::Right => self.right(id),
		}
	}

	#[inline]
	pub(crate) fn color(&self, id: NodeId) -> Color {
		self.links[id.0].color
	}

	#[inline]
	pub(crate) fn is_red(&self, id: NodeId) -> bool {
		self.color(id) == Color::Red
	}

	#[inline]
	pub(crate) fn is_black(&self, id: NodeId) -> bool {
		self.color(id) == Color::Black
	}

	/// Side of its parent that `id` hangs from.
	///
	/// For the sentinel acting as a phantom child this relies on the parent
	/// link set by the last transplant; if both children are the sentinel the
	/// answer is `Left`.
	#[inline]
	pub(crate) fn side_of(&self, id: NodeId) -> Side {
		if self.left(self.parent(id)) == id {
			Side::Left
		} else {
			Side::Right
		}
	}

	#[inline]
	pub(crate) fn set_parent(&mut self, id: NodeId, parent: NodeId) {
		self.links[id.0].parent = parent;
	}

	#[inline]
	pub(crate) fn set_left(&mut self, id: NodeId, left: NodeId) {
		self.links[id.0].left = left;
	}

	#[inline]
	pub(crate) fn set_right(&mut self, id: NodeId, right: NodeId) {
		self.links[id.0].right = right;
	}

	#[inline]
	pub(crate) fn set_child(&mut self, id: NodeId, side: Side, child: NodeId) {
		match side {
			Side::Left => self.set_left(id, child),
			Side::Right => self.set_right(id, child),
		}
	}

	#[inline]
	pub(crate) fn set_color(&mut self, id: NodeId, color: Color) {
		debug_assert!(!(id.is_nil() && color == Color::Red), "attempted to paint the sentinel red");
		self.links[id.0].color = color;
	}

	/// Restores the sentinel's parent link after a removal used it as a
	/// phantom child.
	#[inline]
	pub(crate) fn reset_sentinel(&mut self) {
		self.links[NIL.0] = Links::NIL;
	}

	// -----------------------------------------------------------------------
	// Payload access
	// -----------------------------------------------------------------------

	/// Payload of a live node.
	///
	/// Callers only pass ids reached through the tree's links, which never
	/// lead to a vacant slot; the sentinel is filtered out beforehand.
	#[inline]
	pub(crate) fn entry(&self, id: NodeId) -> &(K, V) {
		match &self.slots[id.0] {
			Some(entry) => entry,
			None => unreachable!("payload requested from empty slot {}", id.0),
		}
	}

	#[inline]
	pub(crate) fn entry_mut(&mut self, id: NodeId) -> &mut (K, V) {
		match &mut self.slots[id.0] {
			Some(entry) => entry,
			None => unreachable!("payload requested from empty slot {}", id.0),
		}
	}

	#[inline]
	pub(crate) fn key(&self, id: NodeId) -> &K {
		&self.entry(id).0
	}

	/// Bounds-checked payload lookup for ids that came from outside the tree.
	#[inline]
	pub(crate) fn get(&self, id: NodeId) -> Option<&(K, V)> {
		self.slots.get(id.0).and_then(Option::as_ref)
	}

	#[inline]
	pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut (K, V)> {
		self.slots.get_mut(id.0).and_then(Option::as_mut)
	}

	/// Exchanges the payloads of two nodes, leaving their links untouched.
	#[inline]
	pub(crate) fn swap_entries(&mut self, a: NodeId, b: NodeId) {
		self.slots.swap(a.0, b.0);
	}

	/// Moves a payload out while keeping the node's links readable.
	///
	/// Used by the consuming iterator, which still walks the structure after
	/// taking entries.
	#[inline]
	pub(crate) fn take_entry(&mut self, id: NodeId) -> Option<(K, V)> {
		self.slots.get_mut(id.0).and_then(Option::take)
	}

	/// Split borrow for the mutable iterator: links to navigate, slots to
	/// hand out.
	#[inline]
	pub(crate) fn split_mut(&mut self) -> (&[Links], &mut [Option<(K, V)>]) {
		(&self.links, &mut self.slots)
	}

	// -----------------------------------------------------------------------
	// Allocation
	// -----------------------------------------------------------------------

	/// Allocates a red leaf under `parent`, aborting on allocation failure
	/// like the standard collections do.
	pub(crate) fn alloc(&mut self, parent: NodeId, key: K, value: V) -> NodeId {
		if let Some(id) = self.free.pop() {
			self.links[id.0] = Links::red_leaf(parent);
			self.slots[id.0] = Some((key, value));
			return id;
		}
		let id = NodeId(self.links.len());
		self.links.push(Links::red_leaf(parent));
		self.slots.push(Some((key, value)));
		id
	}

	/// Makes sure the next [`alloc`](Self::alloc) cannot allocate.
	pub(crate) fn try_reserve_one(&mut self) -> Result<(), TryReserveError> {
		if self.free.is_empty() {
			self.links.try_reserve(1)?;
			self.slots.try_reserve(1)?;
		}
		Ok(())
	}

	/// Releases a node, returning its payload.
	///
	/// The node must already be unlinked from the tree.
	pub(crate) fn release(&mut self, id: NodeId) -> (K, V) {
		debug_assert!(!id.is_nil(), "attempted to release the sentinel");
		self.links[id.0] = Links::NIL;
		let entry = match self.slots[id.0].take() {
			Some(entry) => entry,
			None => unreachable!("released empty slot {}", id.0),
		};
		self.free.push(id);
		entry
	}

	/// Destroys every node except the sentinel.
	pub(crate) fn clear(&mut self) {
		self.links.truncate(1);
		self.slots.truncate(1);
		self.free.clear();
		self.reset_sentinel();
	}

	/// Number of nodes the arena can hold without reallocating.
	pub(crate) fn capacity(&self) -> usize {
		self.links.capacity().min(self.slots.capacity()) - 1
	}

	pub(crate) fn reserve(&mut self, additional: usize) {
		let additional = additional.saturating_sub(self.free.len());
		self.links.reserve(additional);
		self.slots.reserve(additional);
	}

	pub(crate) fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
		let additional = additional.saturating_sub(self.free.len());
		self.links.try_reserve(additional)?;
		self.slots.try_reserve(additional)?;
		Ok(())
	}

	/// Drops vacant trailing slots and excess capacity.
	///
	/// Vacant slots in the middle of the arena stay on the free list; node
	/// ids are stable and cannot be compacted without invalidating handles.
	pub(crate) fn shrink_to_fit(&mut self) {
		while self.links.len() > 1 && self.slots.last().is_some_and(Option::is_none) {
			self.links.pop();
			self.slots.pop();
		}
		let end = self.links.len();
		self.free.retain(|id| id.0 < end);
		self.links.shrink_to_fit();
		self.slots.shrink_to_fit();
		self.free.shrink_to_fit();
	}

	/// Number of slots holding a payload.
	#[cfg(any(test, feature = "test-utils"))]
	pub(crate) fn live_slots(&self) -> usize {
		self.slots.iter().filter(|slot| slot.is_some()).count()
	}

	#[cfg(any(test, feature = "test-utils"))]
	pub(crate) fn free_list(&self) -> &[NodeId] {
		&self.free
	}
}
