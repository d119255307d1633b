//! Insertion path: BST descent, node attachment, and the red-red fixup.
//!
//! A new node is always attached red, which can only ever break one rule:
//! a red node with a red parent. The fixup pushes that violation up the
//! tree two levels at a time (red uncle) or removes it with at most two
//! rotations (black uncle).
//!
//! ```text
//! Case A: red uncle            Case B: zig-zag            Case C: straight line
//!
//!       g(B)        g(R)          g(B)        g(B)           g(B)          p(B)
//!      /   \       /   \         /           /              /             /   \
//!    p(R)  u(R) → p(B) u(B)    p(R)    →   z(R)     →      p(R)     →    z(R) g(R)
//!    /            /               \        /              /
//!  z(R)         z(R)              z(R)   p(R)           z(R)
//!  continue at g                         then Case C      done
//! ```
use std::cmp::Ordering;

use log::trace;

use crate::compare::Comparator;
use crate::node::{Color, NodeId, Side, NIL};
use crate::RbTree;

/// Outcome of the insertion descent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
	/// A node with an equal key already exists.
	Occupied(NodeId),
	/// The key belongs in the empty `side` child of `parent`. A `NIL`
	/// parent means the tree is empty.
	Vacant {
		parent: NodeId,
		side: Side,
	},
}

impl<K, V, C> RbTree<K, V, C> {
	/// Finds where `key` lives, or where it would be attached.
	///
	/// Read only: nothing is allocated or relinked here.
	pub(crate) fn locate(&self, key: &K) -> Slot
	where
		C: Comparator<K>,
	{
		let mut parent = NIL;
		let mut side = Side::Left;
		let mut x = self.root;
		while !x.is_nil() {
			parent = x;
			match self.cmp.compare(key, self.nodes.key(x)) {
				Ordering::Less => {
					side = Side::Left;
					x = self.nodes.left(x);
				}
				Ordering::Greater => {
					side = Side::Right;
					x = self.nodes.right(x);
				}
				Ordering::Equal => return Slot::Occupied(x),
			}
		}
		Slot::Vacant {
			parent,
			side,
		}
	}

	/// Attaches a new red node at a vacant slot and rebalances.
	///
	/// The caller must have made sure the arena can take one more node
	/// (see [`NodeArena::try_reserve_one`](crate::node::NodeArena::try_reserve_one))
	/// if it wants allocation failure reported instead of aborting.
	pub(crate) fn attach(&mut self, parent: NodeId, side: Side, key: K, value: V) -> NodeId {
		let z = self.nodes.alloc(parent, key, value);
		if parent.is_nil() {
			self.root = z;
		} else {
			self.nodes.set_child(parent, side, z);
		}

		// A new minimum can only hang left of the old one.
		if self.leftmost.is_nil() || (parent == self.leftmost && side == Side::Left) {
			self.leftmost = z;
		}
		self.len += 1;

		if parent.is_nil() {
			self.nodes.set_color(z, Color::Black);
		} else {
			self.insert_fixup(z);
		}
		z
	}

	/// Restores the red-black rules after attaching the red node `z`.
	///
	/// Loop invariant: the only possible violation is `z` red with a red
	/// parent. A red parent is never the root, so the grandparent exists.
	fn insert_fixup(&mut self, mut z: NodeId) {
		while self.nodes.is_red(self.nodes.parent(z)) {
			let mut parent = self.nodes.parent(z);
			let grandparent = self.nodes.parent(parent);
			let side = self.nodes.side_of(parent);
			let uncle = self.nodes.child(grandparent, side.opposite());

			if self.nodes.is_red(uncle) {
				trace!("insert fixup: red uncle at node {}", z.index());
				self.nodes.set_color(parent, Color::Black);
				self.nodes.set_color(uncle, Color::Black);
				self.nodes.set_color(grandparent, Color::Red);
				z = grandparent;
				continue;
			}

			if z == self.nodes.child(parent, side.opposite()) {
				trace!("insert fixup: zig-zag at node {}", z.index());
				z = parent;
				self.rotate(z, side);
				parent = self.nodes.parent(z);
			}

			trace!("insert fixup: straight line at node {}", z.index());
			self.nodes.set_color(parent, Color::Black);
			self.nodes.set_color(grandparent, Color::Red);
			self.rotate(grandparent, side.opposite());
		}
		let root = self.root;
		self.nodes.set_color(root, Color::Black);
	}
}
