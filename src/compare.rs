//! Ordering policies consumed by the tree.
//!
//! The tree never calls `Ord` directly. Every key comparison goes through a
//! [`Comparator`], supplied when the tree is built and fixed for its whole
//! lifetime. Changing the ordering of keys already in a tree breaks the
//! search-tree property and leaves the tree in an unspecified (but memory
//! safe) state.

use std::cmp::Ordering;

/// A strict weak ordering over `K`.
///
/// Implementors provide `less`. `compare` is derived from it with two calls,
/// and may be overridden when a three-way comparison is cheaper.
pub trait Comparator<K: ?Sized> {
	/// Returns `true` if `a` is ordered strictly before `b`.
	fn less(&self, a: &K, b: &K) -> bool;

	/// Three-way comparison derived from [`less`](Self::less).
	#[inline]
	fn compare(&self, a: &K, b: &K) -> Ordering {
		if self.less(a, b) {
			Ordering::Less
		} else if self.less(b, a) {
			Ordering::Greater
		} else {
			Ordering::Equal
		}
	}
}

/// Orders keys by their `Ord` implementation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Natural;

impl<K: Ord + ?Sized> Comparator<K> for Natural {
	#[inline]
	fn less(&self, a: &K, b: &K) -> bool {
		a < b
	}

	#[inline]
	fn compare(&self, a: &K, b: &K) -> Ordering {
		a.cmp(b)
	}
}

/// Orders keys by the reverse of their `Ord` implementation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reverse;

impl<K: Ord + ?Sized> Comparator<K> for Reverse {
	#[inline]
	fn less(&self, a: &K, b: &K) -> bool {
		b < a
	}

	#[inline]
	fn compare(&self, a: &K, b: &K) -> Ordering {
		b.cmp(a)
	}
}

/// Wraps a `less`-style closure.
///
/// ```
/// use redfern::{compare::LessBy, RbTree};
///
/// let mut tree = RbTree::with_comparator(LessBy(|a: &i32, b: &i32| a.abs() < b.abs()));
/// tree.insert(-3, ());
/// tree.insert(1, ());
/// tree.insert(2, ());
///
/// let keys: Vec<_> = tree.keys().copied().collect();
/// assert_eq!(keys, [1, 2, -3]);
/// ```
#[derive(Clone, Copy)]
pub struct LessBy<F>(pub F);

impl<K: ?Sized, F> Comparator<K> for LessBy<F>
where
	F: Fn(&K, &K) -> bool,
{
	#[inline]
	fn less(&self, a: &K, b: &K) -> bool {
		(self.0)(a, b)
	}
}

/// Orders keys by an `Ord` field projected out of them.
///
/// This is the key-projection adapter: two keys whose projections are equal
/// are the same key as far as the tree is concerned.
///
/// ```
/// use redfern::{compare::ByKey, RbTree};
///
/// struct Account {
///     id: u32,
///     owner: &'static str,
/// }
///
/// let mut tree = RbTree::with_comparator(ByKey(|a: &Account| a.id));
/// tree.insert(Account { id: 7, owner: "b" }, ());
/// let (_, inserted) = tree.insert(Account { id: 7, owner: "c" }, ());
/// assert!(!inserted);
/// assert_eq!(tree.first_key_value().map(|(a, _)| a.owner), Some("b"));
/// ```
#[derive(Clone, Copy)]
pub struct ByKey<F>(pub F);

impl<K: ?Sized, P: Ord, F> Comparator<K> for ByKey<F>
where
	F: Fn(&K) -> P,
{
	#[inline]
	fn less(&self, a: &K, b: &K) -> bool {
		(self.0)(a) < (self.0)(b)
	}

	#[inline]
	fn compare(&self, a: &K, b: &K) -> Ordering {
		(self.0)(a).cmp(&(self.0)(b))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn natural_matches_ord() {
		assert!(Natural.less(&1, &2));
		assert!(!Natural.less(&2, &2));
		assert_eq!(Natural.compare("a", "b"), Ordering::Less);
	}

	#[test]
	fn reverse_flips_ord() {
		assert!(Reverse.less(&2, &1));
		assert_eq!(Reverse.compare(&1, &2), Ordering::Greater);
	}

	#[test]
	fn derived_compare_from_less() {
		let cmp = LessBy(|a: &u8, b: &u8| a < b);
		assert_eq!(cmp.compare(&1, &2), Ordering::Less);
		assert_eq!(cmp.compare(&2, &1), Ordering::Greater);
		assert_eq!(cmp.compare(&3, &3), Ordering::Equal);
	}

	#[test]
	fn projection_ignores_other_fields() {
		let cmp = ByKey(|p: &(u32, &str)| p.0);
		assert_eq!(cmp.compare(&(1, "x"), &(1, "y")), Ordering::Equal);
		assert!(cmp.less(&(0, "z"), &(1, "a")));
	}
}
