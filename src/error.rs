//! # Error Types for the Concurrent B+ Tree
//!
//! Almost nothing in this crate fails: absent keys are reported through
//! `Option`/`bool` returns, and latch-protocol violations are programming
//! errors that assert. The one genuine runtime error is iterator latch
//! contention.
//!
//! A scan holds a shared latch on its current leaf and hops to the next leaf
//! with a *non-blocking* shared acquire — blocking there while holding the
//! current leaf could stall behind a writer that in turn waits on the scan.
//! When the acquire fails the error is surfaced instead; the cursor keeps its
//! position, so the caller may simply call `next` again or abandon the scan.

use thiserror::Error;

/// Errors produced by B+ tree operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
	/// The iterator could not take a shared latch on the next leaf without
	/// blocking.
	///
	/// A writer is restructuring at the scan boundary. Recoverable: the
	/// iterator still holds its current leaf, so retrying `next` will attempt
	/// the hand-off again once the writer has drained.
	#[error("could not acquire a shared latch on the next leaf")]
	IteratorContention,
}

/// Result alias used by the iterator surface.
pub type Result<T> = std::result::Result<T, Error>;
