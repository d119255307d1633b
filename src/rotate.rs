//! Rotation primitives, the only operations that rewire parent/child edges
//! outside of attaching and splicing single nodes.
//!
//! ```text
//!        x                        y
//!       / \     rotate_left      / \
//!      a   y    ───────────►    x   c
//!         / \   ◄───────────   / \
//!        b   c  rotate_right  a   b
//! ```
//!
//! Rotations preserve key order and never touch colors; the fixup that
//! calls them repaints afterwards.
use log::trace;

use crate::node::{NodeId, Side};
use crate::RbTree;

impl<K, V, C> RbTree<K, V, C> {
	/// Rotates the subtree at `x` so that `x` moves down towards `dir`.
	///
	/// `rotate(x, Side::Left)` is the classic `rotate_left` and promotes
	/// `x.right`; `rotate(x, Side::Right)` is `rotate_right` and promotes
	/// `x.left`. The promoted child must not be the sentinel.
	pub(crate) fn rotate(&mut self, x: NodeId, dir: Side) {
		let up = dir.opposite();
		let y = self.nodes.child(x, up);
		debug_assert!(!y.is_nil(), "rotation would promote the sentinel");
		trace!("rotate {:?} at node {}", dir, x.index());

		// y's inner subtree changes hands
		let inner = self.nodes.child(y, dir);
		self.nodes.set_child(x, up, inner);
		if !inner.is_nil() {
			self.nodes.set_parent(inner, x);
		}

		// y takes x's place under x's parent
		let parent = self.nodes.parent(x);
		self.nodes.set_parent(y, parent);
		if parent.is_nil() {
			self.root = y;
		} else if self.nodes.left(parent) == x {
			self.nodes.set_left(parent, y);
		} else {
			self.nodes.set_right(parent, y);
		}

		self.nodes.set_child(y, dir, x);
		self.nodes.set_parent(x, y);
	}
}
