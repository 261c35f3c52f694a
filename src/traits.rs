//! Common traits for mergeable priority queues
//!
//! The surface is split in two tiers:
//!
//! - [`Heap`]: the basic min-queue contract (push, peek, pop, merge)
//! - [`DecreaseKeyHeap`]: handle-based operations (`decrease_key`, `delete`)
//!
//! The base [`Heap`] trait follows the shape of Rust's standard heap API,
//! except that these are min-heaps and store (priority, item) pairs so the
//! ordering key is separate from the payload. [`DecreaseKeyHeap`] adds the
//! operations that need a stable reference to an element already inside the
//! queue, as used by algorithms like Dijkstra's shortest path.

use std::fmt;

/// Error type for handle-based heap operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
    /// The new priority is not less than the current priority
    PriorityNotDecreased,
    /// The handle does not refer to a live element of this heap
    InvalidHandle,
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeapError::PriorityNotDecreased => {
                write!(f, "new priority is not less than current priority")
            }
            HeapError::InvalidHandle => {
                write!(f, "handle does not refer to a live element of this heap")
            }
        }
    }
}

impl std::error::Error for HeapError {}

/// A handle to an element in the heap
///
/// Opaque identifier for a specific element, returned by
/// [`DecreaseKeyHeap::push_with_handle`] and consumed by
/// [`DecreaseKeyHeap::decrease_key`] and [`DecreaseKeyHeap::delete`].
pub trait Handle: Clone + PartialEq + Eq {}

/// Base trait for min-heap priority queues
///
/// # Example
///
/// ```rust
/// use priority_forest::{ForestHeap, Heap};
///
/// let mut heap = ForestHeap::new();
/// heap.push(3, "three");
/// heap.push(1, "one");
/// heap.push(2, "two");
///
/// assert_eq!(heap.peek(), Some((&1, &"one")));
/// assert_eq!(heap.pop(), Some((1, "one")));
/// ```
pub trait Heap<T, P: Ord> {
    /// Creates a new empty heap
    fn new() -> Self;

    /// Returns true if the heap is empty
    fn is_empty(&self) -> bool;

    /// Returns the number of elements in the heap
    fn len(&self) -> usize;

    /// Inserts an element with the given priority
    ///
    /// # Time Complexity
    /// O(1) amortized.
    fn push(&mut self, priority: P, item: T);

    /// Returns the minimum priority and associated item without removing it
    ///
    /// Returns `None` on an empty heap.
    ///
    /// # Time Complexity
    /// O(1).
    fn peek(&self) -> Option<(&P, &T)>;

    /// Removes and returns the minimum priority and associated item
    ///
    /// Returns `None` on an empty heap; callers that treat popping an empty
    /// queue as a bug should assert on the `Option` rather than ignore it.
    ///
    /// # Time Complexity
    /// O(log n) amortized.
    fn pop(&mut self) -> Option<(P, T)>;

    /// Merges another heap into this one, consuming the other heap
    ///
    /// The other heap's elements are transferred wholesale; `other` is
    /// moved-from and cannot be used again. Handles issued by `other` are
    /// invalidated by the merge; handles issued by `self` remain valid.
    ///
    /// # Time Complexity
    /// O(1).
    fn merge(&mut self, other: Self);
}

/// Extended heap trait with handle-based element access
///
/// Extends [`Heap`] with the operations that require a stable reference to
/// an element: `push_with_handle` returns a handle, and `decrease_key` /
/// `delete` act on it.
///
/// # Example
///
/// ```rust
/// use priority_forest::{DecreaseKeyHeap, ForestHeap, Heap};
///
/// let mut heap = ForestHeap::new();
/// let handle = heap.push_with_handle(10, "item");
/// heap.decrease_key(&handle, 5).unwrap();
/// assert_eq!(heap.peek(), Some((&5, &"item")));
/// assert_eq!(heap.delete(&handle), Ok((5, "item")));
/// assert!(heap.is_empty());
/// ```
pub trait DecreaseKeyHeap<T, P: Ord>: Heap<T, P> {
    /// The handle type for this heap
    type Handle: Handle;

    /// Inserts an element with the given priority, returning a handle
    ///
    /// The handle can be used later with [`decrease_key`](Self::decrease_key)
    /// or [`delete`](Self::delete). It stays valid until the element is
    /// removed or its heap is consumed by a merge.
    ///
    /// # Time Complexity
    /// O(1) amortized.
    fn push_with_handle(&mut self, priority: P, item: T) -> Self::Handle;

    /// Decreases the priority of the element identified by the handle
    ///
    /// # Errors
    /// - [`HeapError::PriorityNotDecreased`] if `new_priority` is not
    ///   strictly less than the element's current priority.
    /// - [`HeapError::InvalidHandle`] if the handle is stale (element already
    ///   removed) or belongs to a different heap.
    ///
    /// # Time Complexity
    /// O(1) amortized.
    fn decrease_key(&mut self, handle: &Self::Handle, new_priority: P) -> Result<(), HeapError>;

    /// Removes the element identified by the handle, returning its pair
    ///
    /// # Errors
    /// [`HeapError::InvalidHandle`] if the handle is stale or belongs to a
    /// different heap.
    ///
    /// # Time Complexity
    /// O(log n) amortized.
    fn delete(&mut self, handle: &Self::Handle) -> Result<(P, T), HeapError>;
}
