//! Mergeable priority queue built as a forest of heap-ordered multi-way trees
//!
//! This crate provides a single priority queue, [`ForestHeap`], with the
//! classical Fibonacci-heap cost profile:
//!
//! - O(1) amortized `push`, `decrease_key`, and `merge`
//! - O(log n) amortized `pop` and `delete`
//!
//! The queue is a forest: roots live in a circular doubly linked list, each
//! tree is heap-ordered, and rebalancing is lazy. Extraction consolidates
//! equal-degree roots; `decrease_key` and `delete` detach subtrees with
//! cascading cuts driven by per-node mark bits.
//!
//! Elements are addressed through generational [`NodeHandle`]s, so a handle
//! whose element has already been removed is rejected instead of corrupting
//! the structure.
//!
//! # Example
//!
//! ```rust
//! use priority_forest::{DecreaseKeyHeap, ForestHeap, Heap};
//!
//! let mut heap = ForestHeap::new();
//! let handle = heap.push_with_handle(5, "item");
//! heap.push(3, "other");
//! heap.decrease_key(&handle, 1).unwrap();
//! assert_eq!(heap.peek(), Some((&1, &"item")));
//! ```

pub mod forest;
pub mod traits;

pub use forest::{ForestHeap, NodeHandle};
pub use traits::{DecreaseKeyHeap, Heap, HeapError};
