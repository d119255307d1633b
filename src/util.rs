//! Test utilities for loading hand-shaped trees from JSON fixtures.
//!
//! Insertion decides the shape and colors of a tree, which makes some
//! removal cases awkward to reach through the public API. A fixture spells
//! the shape out directly:
//!
//! ```json
//! {
//!   "root": {
//!     "key": "0020", "value": 20, "color": "black",
//!     "left":  { "key": "0010", "value": 10, "color": "black" },
//!     "right": { "key": "0030", "value": 30, "color": "black" }
//!   }
//! }
//! ```
//!
//! The loader links the nodes exactly as written and does not validate
//! them, so fixtures that break the red-black rules can be used to exercise
//! [`assert_invariants`](crate::RbTree::assert_invariants) itself.
use std::path::Path;

use serde::Deserialize;

use crate::node::{Color, NodeArena, NodeId, Side, NIL};
use crate::RbTree;

/// Errors from reading a fixture.
#[derive(thiserror::Error, Debug)]
pub enum FixtureError {
	#[error("failed to read fixture: {0}")]
	Io(#[from] std::io::Error),
	#[error("malformed fixture: {0}")]
	Json(#[from] serde_json::Error),
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum FixtureColor {
	Red,
	Black,
}

impl From<FixtureColor> for Color {
	fn from(color: FixtureColor) -> Color {
		match color {
			FixtureColor::Red => Color::Red,
			FixtureColor::Black => Color::Black,
		}
	}
}

#[derive(Deserialize, Debug)]
struct FixtureNode {
	key: String,
	value: u64,
	color: FixtureColor,
	#[serde(default)]
	left: Option<Box<FixtureNode>>,
	#[serde(default)]
	right: Option<Box<FixtureNode>>,
}

#[derive(Deserialize, Debug)]
struct SampleTree {
	root: Option<FixtureNode>,
}

/// Links `root` and every node below it into `nodes`, returning the root id
/// and the number of nodes placed. Walks with an explicit stack, so deeply
/// nested fixtures do not grow the call stack.
fn place(nodes: &mut NodeArena<String, u64>, root: FixtureNode) -> (NodeId, usize) {
	let mut count = 0;
	let mut root_id = NIL;
	let mut pending: Vec<(NodeId, Side, FixtureNode)> = vec![(NIL, Side::Left, root)];
	while let Some((parent, side, node)) = pending.pop() {
		let id = nodes.alloc(parent, node.key, node.value);
		nodes.set_color(id, node.color.into());
		count += 1;
		if parent.is_nil() {
			root_id = id;
		} else {
			nodes.set_child(parent, side, id);
		}
		if let Some(right) = node.right {
			pending.push((id, Side::Right, *right));
		}
		if let Some(left) = node.left {
			pending.push((id, Side::Left, *left));
		}
	}
	(root_id, count)
}

/// Builds a tree from fixture JSON text.
pub fn sample_tree_from_str(json: &str) -> Result<RbTree<String, u64>, FixtureError> {
	let sample: SampleTree = serde_json::from_str(json)?;
	let mut tree = RbTree::new();
	if let Some(root) = sample.root {
		let (root, count) = place(&mut tree.nodes, root);
		tree.root = root;
		tree.leftmost = tree.nodes.minimum(tree.root);
		tree.len = count;
	}
	Ok(tree)
}

/// Builds a tree from the fixture file at `path`.
pub fn sample_tree<P: AsRef<Path>>(path: P) -> Result<RbTree<String, u64>, FixtureError> {
	let json = std::fs::read_to_string(path)?;
	sample_tree_from_str(&json)
}
