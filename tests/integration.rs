//! # Integration Tests for Redfern
//!
//! End-to-end tests that exercise the tree through its public API with
//! realistic workloads.

use std::collections::BTreeMap;

use rand::prelude::*;
use redfern::compare::{ByKey, Reverse};
use redfern::{Error, RbSet, RbTree};

// ===========================================================================
// Large Scale Operation Tests
// ===========================================================================

#[test]
fn large_scale_insert_and_lookup() {
	let mut tree: RbTree<i32, i32> = RbTree::new();

	for i in 0..10_000 {
		assert!(tree.insert(i, i * 10).1);
	}

	tree.assert_invariants();
	assert_eq!(tree.len(), 10_000);

	for i in 0..10_000 {
		assert_eq!(tree.get(&i), Some(&(i * 10)), "Failed to find key {}", i);
	}
}

#[test]
fn large_scale_insert_and_remove() {
	let mut tree: RbTree<i32, i32> = RbTree::new();

	for i in 0..10_000 {
		tree.insert(i, i);
	}
	tree.assert_invariants();

	for i in 0..10_000 {
		assert_eq!(tree.remove(&i), Some(i), "Failed to remove key {}", i);
	}

	tree.assert_invariants();
	assert!(tree.is_empty());
	assert!(tree.begin().is_end());
}

#[test]
fn large_scale_random_operations() {
	let mut tree: RbTree<i32, i32> = RbTree::new();
	let mut expected: BTreeMap<i32, i32> = BTreeMap::new();
	let mut rng = rand::rng();

	for _ in 0..10_000 {
		let key: i32 = rng.random_range(0..1000);
		match rng.random_range(0..3u8) {
			0 => {
				let inserted = tree.insert(key, key * 10).1;
				let was_absent = !expected.contains_key(&key);
				expected.entry(key).or_insert(key * 10);
				assert_eq!(inserted, was_absent);
			}
			1 => {
				assert_eq!(tree.remove(&key), expected.remove(&key));
			}
			_ => {
				assert_eq!(tree.get(&key), expected.get(&key));
			}
		}
	}

	tree.assert_invariants();
	assert_eq!(tree.len(), expected.len());
	assert!(tree.iter().eq(expected.iter()));
}

#[test]
fn random_order_insert_and_drain() {
	let mut keys: Vec<u32> = (0..5_000).collect();
	keys.shuffle(&mut rand::rng());

	let mut tree: RbSet<u32> = RbSet::new();
	for &k in &keys {
		tree.insert(k, ());
	}
	tree.assert_invariants();

	keys.shuffle(&mut rand::rng());
	for (i, k) in keys.iter().enumerate() {
		assert!(tree.remove(k).is_some());
		if i % 500 == 0 {
			tree.assert_invariants();
		}
	}
	assert!(tree.is_empty());
	tree.assert_invariants();
}

// ===========================================================================
// Handle Traversal Tests
// ===========================================================================

#[test]
fn handle_walk_matches_iterator() {
	let tree: RbTree<i32, i32> = (0..1000).map(|k| (k * 3, k)).collect();

	let mut walked = Vec::new();
	let mut h = tree.begin();
	while h != tree.end() {
		walked.push(tree.get_at(h).map(|(k, v)| (*k, *v)).unwrap());
		h = tree.next(h);
	}

	let iterated: Vec<_> = tree.iter().map(|(k, v)| (*k, *v)).collect();
	assert_eq!(walked, iterated);

	let mut backward = Vec::new();
	let mut h = tree.rbegin();
	while h != tree.rend() {
		backward.push(*tree.get_at(h).unwrap().0);
		h = tree.prev(h);
	}
	backward.reverse();
	let keys: Vec<_> = tree.keys().copied().collect();
	assert_eq!(backward, keys);
}

#[test]
fn remove_while_walking() {
	let mut tree: RbTree<i32, ()> = (0..2000).map(|k| (k, ())).collect();

	let mut h = tree.begin();
	while !h.is_end() {
		let key = *tree.get_at(h).unwrap().0;
		h = if key % 3 != 0 {
			tree.remove_at(h).unwrap().0
		} else {
			tree.next(h)
		};
	}

	tree.assert_invariants();
	let keys: Vec<_> = tree.keys().copied().collect();
	let expected: Vec<_> = (0..2000).filter(|k| k % 3 == 0).collect();
	assert_eq!(keys, expected);
}

#[test]
fn lower_bound_scan() {
	let tree: RbTree<u64, &str> = [(10, "a"), (20, "b"), (30, "c"), (40, "d")].into();

	let mut out = Vec::new();
	let mut h = tree.lower_bound(&15);
	let stop = tree.upper_bound(&30);
	while h != stop {
		out.push(*tree.get_at(h).unwrap().1);
		h = tree.next(h);
	}
	assert_eq!(out, ["b", "c"]);
}

// ===========================================================================
// Value Type Tests
// ===========================================================================

#[test]
fn string_keys_with_borrowed_lookup() {
	let mut tree: RbTree<String, Vec<u8>> = RbTree::new();
	for word in ["delta", "alpha", "charlie", "bravo"] {
		tree.insert(word.to_string(), word.as_bytes().to_vec());
	}

	assert_eq!(tree.get("charlie").map(Vec::len), Some(7));
	assert!(tree.contains_key("alpha"));
	assert!(!tree.contains_key("echo"));

	let range: Vec<_> = tree.range::<str, _>((std::ops::Bound::Included("b"), std::ops::Bound::Excluded("d"))).map(|(k, _)| k.as_str()).collect();
	assert_eq!(range, ["bravo", "charlie"]);
}

#[test]
fn values_are_dropped_exactly_once() {
	use std::rc::Rc;

	let marker = Rc::new(());
	{
		let mut tree: RbTree<i32, Rc<()>> = RbTree::new();
		for i in 0..100 {
			tree.insert(i, Rc::clone(&marker));
		}
		// Rejected duplicates drop their argument immediately.
		tree.insert(0, Rc::clone(&marker));
		assert_eq!(Rc::strong_count(&marker), 101);

		for i in 0..50 {
			tree.remove(&i);
		}
		assert_eq!(Rc::strong_count(&marker), 51);

		let mut iter = tree.clone().into_iter();
		iter.next();
		drop(iter);
		assert_eq!(Rc::strong_count(&marker), 51);
	}
	assert_eq!(Rc::strong_count(&marker), 1);
}

// ===========================================================================
// Custom Ordering Tests
// ===========================================================================

#[test]
fn reverse_ordering_end_to_end() {
	let mut tree = RbTree::with_comparator(Reverse);
	for i in 0..500 {
		tree.insert(i, i);
	}
	tree.assert_invariants();

	assert_eq!(tree.first_key_value(), Some((&499, &499)));
	assert_eq!(tree.pop_last(), Some((0, 0)));
	let top: Vec<_> = tree.range(..=495).map(|(k, _)| *k).collect();
	assert_eq!(top, [499, 498, 497, 496, 495]);
}

#[test]
fn projection_ordering() {
	#[derive(Debug)]
	struct Task {
		priority: u8,
		name: &'static str,
	}

	let mut queue = RbTree::with_comparator(ByKey(|t: &Task| t.priority));
	queue.insert(Task { priority: 3, name: "low" }, ());
	queue.insert(Task { priority: 1, name: "urgent" }, ());
	queue.insert(Task { priority: 2, name: "normal" }, ());
	// Same priority counts as the same key.
	assert!(!queue.insert(Task { priority: 1, name: "dup" }, ()).1);

	let names: Vec<_> = queue.keys().map(|t| t.name).collect();
	assert_eq!(names, ["urgent", "normal", "low"]);
	queue.assert_invariants();
}

// ===========================================================================
// Error Path Tests
// ===========================================================================

#[test]
fn error_paths_leave_tree_unchanged() {
	let mut tree: RbTree<i32, i32> = (0..10).map(|k| (k, k)).collect();
	let before = tree.dump();

	assert!(matches!(tree.remove_at(tree.end()), Err(Error::InvalidHandle)));
	assert!(matches!(tree.at(&42), Err(Error::KeyNotFound)));
	assert!(matches!(tree.try_reserve(usize::MAX), Err(Error::Alloc(_))));
	assert!(matches!(
		tree.remove_range(tree.search(&8), tree.search(&1)),
		Err(Error::InvalidHandle)
	));

	assert_eq!(tree.dump(), before);
	tree.assert_invariants();
}

#[test]
fn error_messages() {
	assert_eq!(Error::InvalidHandle.to_string(), "handle does not refer to a live entry");
	assert_eq!(Error::KeyNotFound.to_string(), "key not found");
}
