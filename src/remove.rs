//! Deletion path: splice a node out, then repair black heights.
//!
//! A node with two children is never unlinked itself. Its in-order
//! successor (which has no left child) donates its payload and is unlinked
//! in its place, so the structural removal always involves a node with at
//! most one child.
//!
//! Removing a black node leaves one path a black short. The fixup treats
//! the node that moved into the gap, `x`, as carrying an "extra black"
//! (the sentinel may carry it too) and either pushes it up or absorbs it:
//!
//! ```text
//! Case 1  sibling red                 recolor, rotate at parent   → Case 2/3/4
//! Case 2  sibling black, nephews black sibling red, x = parent    → loop
//! Case 3  near nephew red, far black  recolor, rotate at sibling  → Case 4
//! Case 4  far nephew red              recolor, rotate at parent   → done
//! ```
use log::trace;

use crate::node::{Color, NodeId};
use crate::RbTree;

/// Result of unlinking one entry.
pub(crate) struct Removed<K, V> {
	pub(crate) entry: (K, V),
	/// The node now holding the entry that followed the removed one.
	pub(crate) next: NodeId,
}

impl<K, V, C> RbTree<K, V, C> {
	/// Removes the entry stored at `z`, which must be a live node.
	pub(crate) fn remove_node(&mut self, z: NodeId) -> Removed<K, V> {
		debug_assert!(!z.is_nil(), "attempted to remove the sentinel");

		let two_children = !self.nodes.left(z).is_nil() && !self.nodes.right(z).is_nil();
		let (y, next) = if two_children {
			// The successor's payload moves into z, so z is where iteration resumes.
			let y = self.nodes.minimum(self.nodes.right(z));
			self.nodes.swap_entries(z, y);
			(y, z)
		} else {
			(z, self.nodes.successor(z))
		};

		if y == self.leftmost {
			self.leftmost = next;
		}

		let y_color = self.nodes.color(y);
		let x = if self.nodes.left(y).is_nil() {
			self.nodes.right(y)
		} else {
			self.nodes.left(y)
		};
		self.transplant(y, x);

		if y_color == Color::Black {
			self.remove_fixup(x);
		}
		self.nodes.reset_sentinel();

		self.len -= 1;
		Removed {
			entry: self.nodes.release(y),
			next,
		}
	}

	/// Puts `v` where `u` hangs, updating `v`'s parent link even when `v` is
	/// the sentinel. The fixup reads that link to find the gap.
	fn transplant(&mut self, u: NodeId, v: NodeId) {
		let parent = self.nodes.parent(u);
		if parent.is_nil() {
			self.root = v;
		} else if self.nodes.left(parent) == u {
			self.nodes.set_left(parent, v);
		} else {
			self.nodes.set_right(parent, v);
		}
		self.nodes.set_parent(v, parent);
	}

	/// Restores equal black heights after a black node was spliced out above
	/// `x`.
	///
	/// The sibling `w` always exists: before the removal the path through
	/// `x` held at least one more black node than it does now, so the other
	/// side has black height of at least one.
	fn remove_fixup(&mut self, mut x: NodeId) {
		while x != self.root && self.nodes.is_black(x) {
			let parent = self.nodes.parent(x);
			let side = self.nodes.side_of(x);
			let far = side.opposite();
			let mut w = self.nodes.child(parent, far);

			if self.nodes.is_red(w) {
				trace!("remove fixup: red sibling at node {}", w.index());
				self.nodes.set_color(w, Color::Black);
				self.nodes.set_color(parent, Color::Red);
				self.rotate(parent, side);
				w = self.nodes.child(parent, far);
			}

			let near_nephew = self.nodes.child(w, side);
			let far_nephew = self.nodes.child(w, far);
			if self.nodes.is_black(near_nephew) && self.nodes.is_black(far_nephew) {
				trace!("remove fixup: black nephews, moving up from node {}", x.index());
				self.nodes.set_color(w, Color::Red);
				x = parent;
				continue;
			}

			if self.nodes.is_black(far_nephew) {
				trace!("remove fixup: near nephew red at node {}", near_nephew.index());
				self.nodes.set_color(near_nephew, Color::Black);
				self.nodes.set_color(w, Color::Red);
				self.rotate(w, far);
				w = self.nodes.child(parent, far);
			}

			trace!("remove fixup: far nephew red under node {}", w.index());
			let parent_color = self.nodes.color(parent);
			self.nodes.set_color(w, parent_color);
			self.nodes.set_color(parent, Color::Black);
			let far_nephew = self.nodes.child(w, far);
			self.nodes.set_color(far_nephew, Color::Black);
			self.rotate(parent, side);
			x = self.root;
		}
		self.nodes.set_color(x, Color::Black);
	}
}
