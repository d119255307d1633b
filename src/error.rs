//! # Error Types for the Red-Black Tree
//!
//! Most tree operations cannot fail: a duplicate key on insert is reported
//! through the returned `bool`, and a missing key on search or removal is
//! reported as `None` or as the [`end`](crate::RbTree::end) handle. The
//! errors here cover the few paths where the caller asked for a guarantee
//! the tree cannot give.
//!
//! ## Error Flow
//!
//! ```text
//! try_insert(key, value)
//!      │
//!      ▼
//! Descend to the insertion point (read only)
//!      │
//!      ▼
//! Reserve an arena slot ──────────► Err(Alloc) ───► tree unchanged
//!      │
//!      ▼ (Ok)
//! Link the node and run the insertion fixup
//!      │
//!      ▼
//! Ok((handle, inserted))
//! ```
//!
//! Allocation always happens before the first structural mutation, so an
//! `Err(Error::Alloc(_))` leaves the tree exactly as it was.

use std::collections::TryReserveError;

use thiserror::Error;

/// Errors returned by the fallible tree operations.
#[derive(Error, Debug)]
pub enum Error {
	/// The node arena could not grow to hold another node.
	///
	/// Returned by [`try_insert`](crate::RbTree::try_insert) and
	/// [`try_reserve`](crate::RbTree::try_reserve). The tree is left untouched.
	#[error("failed to allocate tree node: {0}")]
	Alloc(#[from] TryReserveError),

	/// A handle did not refer to a live entry.
	///
	/// This happens when the [`end`](crate::RbTree::end) handle, or a handle
	/// whose entry has since been removed, is passed to an operation that
	/// needs an entry.
	///
	/// # Note
	///
	/// A slot freed by a removal is recycled by the next insertion. A stale
	/// handle that lands on a recycled slot refers to the new entry and is
	/// not detected.
	#[error("handle does not refer to a live entry")]
	InvalidHandle,

	/// Checked element access found no entry for the key.
	#[error("key not found")]
	KeyNotFound,
}

/// A Result type alias using our custom Error type.
pub type Result<T> = std::result::Result<T, Error>;
