//! The priority forest: a Fibonacci-heap style mergeable queue
//!
//! The structure is a forest of heap-ordered multi-way trees. Roots are
//! linked in a circular doubly linked list and the queue keeps a pointer to
//! the minimum root. Insertion and merging just splice rings together;
//! extraction pays the deferred cost by consolidating equal-degree roots
//! until at most one tree of each degree remains, which keeps the maximum
//! degree at O(log n). Removing an element from the middle of a tree detaches
//! its subtree and walks up through marked ancestors (cascading cut), the
//! discipline that preserves the Fibonacci degree bound: a node of degree k
//! always has at least Fib(k + 2) descendants.
//!
//! Elements are addressed through [`NodeHandle`]s backed by a generational
//! slot map, so stale handles are rejected instead of dereferencing freed
//! nodes.

use crate::traits::{DecreaseKeyHeap, Handle, Heap, HeapError};
use slotmap::{new_key_type, SlotMap};
use smallvec::{smallvec, SmallVec};
use std::marker::PhantomData;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};

new_key_type! {
    struct HandleKey;
}

// Process-wide counter so handles can tell their heaps apart.
static NEXT_HEAP_ID: AtomicU64 = AtomicU64::new(0);

/// Handle to an element in a [`ForestHeap`]
///
/// Handles are generational: once the element is popped, deleted, or its
/// heap is consumed by a merge, the handle stops resolving and handle
/// operations return [`HeapError::InvalidHandle`]. A handle presented to a
/// heap other than the one that issued it is rejected the same way.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct NodeHandle {
    heap: u64,
    slot: HandleKey,
}

impl Handle for NodeHandle {}

struct Node<T, P> {
    item: T,
    priority: P,
    parent: Option<NonNull<Node<T, P>>>,
    child: Option<NonNull<Node<T, P>>>,
    left: NonNull<Node<T, P>>,
    right: NonNull<Node<T, P>>,
    degree: usize,
    marked: bool,
    slot: HandleKey,
}

/// Mergeable min-queue over a forest of heap-ordered trees
///
/// # Example
///
/// ```rust
/// use priority_forest::{DecreaseKeyHeap, ForestHeap, Heap};
///
/// let mut heap = ForestHeap::new();
/// let handle = heap.push_with_handle(5, "item");
/// heap.decrease_key(&handle, 1).unwrap();
/// assert_eq!(heap.peek(), Some((&1, &"item")));
/// ```
pub struct ForestHeap<T, P: Ord> {
    min: Option<NonNull<Node<T, P>>>,
    len: usize,
    id: u64,
    handles: SlotMap<HandleKey, NonNull<Node<T, P>>>,
    // The heap owns every node it allocated.
    _marker: PhantomData<Box<Node<T, P>>>,
}

impl<T, P: Ord> Drop for ForestHeap<T, P> {
    fn drop(&mut self) {
        while self.pop().is_some() {}
    }
}

impl<T, P: Ord> Heap<T, P> for ForestHeap<T, P> {
    fn new() -> Self {
        Self {
            min: None,
            len: 0,
            id: NEXT_HEAP_ID.fetch_add(1, Ordering::Relaxed),
            handles: SlotMap::with_key(),
            _marker: PhantomData,
        }
    }

    fn is_empty(&self) -> bool {
        self.min.is_none()
    }

    fn len(&self) -> usize {
        self.len
    }

    fn push(&mut self, priority: P, item: T) {
        self.push_with_handle(priority, item);
    }

    fn peek(&self) -> Option<(&P, &T)> {
        self.min.map(|min| unsafe {
            let node = min.as_ptr();
            (&(*node).priority, &(*node).item)
        })
    }

    fn pop(&mut self) -> Option<(P, T)> {
        let min = self.min?;

        unsafe {
            // Every child becomes a root; the child ring itself stays intact
            // and is merged into the root ring wholesale.
            if let Some(child) = (*min.as_ptr()).child {
                let mut cur = child;
                loop {
                    (*cur.as_ptr()).parent = None;
                    (*cur.as_ptr()).marked = false;
                    cur = (*cur.as_ptr()).right;
                    if cur == child {
                        break;
                    }
                }
            }
            let children = (*min.as_ptr()).child.take();
            let rest = Self::detach(min);

            match Self::merge_rings(rest, children) {
                None => self.min = None,
                // Degree table sizing inside reads self.len, which still
                // counts the node being removed.
                Some(head) => self.consolidate(head),
            }

            let slot = (*min.as_ptr()).slot;
            if self.handles.get(slot).copied() == Some(min) {
                self.handles.remove(slot);
            }

            let node = *Box::from_raw(min.as_ptr());
            self.len -= 1;
            Some((node.priority, node.item))
        }
    }

    fn merge(&mut self, mut other: Self) {
        unsafe {
            self.min = Self::merge_rings(self.min, other.min.take());
        }
        self.len += other.len;
        other.len = 0;
        // Other's handle registry dies with it, which is what invalidates
        // the handles it issued.
    }
}

impl<T, P: Ord> DecreaseKeyHeap<T, P> for ForestHeap<T, P> {
    type Handle = NodeHandle;

    fn push_with_handle(&mut self, priority: P, item: T) -> NodeHandle {
        let node = Box::into_raw(Box::new(Node {
            item,
            priority,
            parent: None,
            child: None,
            left: NonNull::dangling(),
            right: NonNull::dangling(),
            degree: 0,
            marked: false,
            slot: HandleKey::default(),
        }));
        let node = unsafe { NonNull::new_unchecked(node) };

        let slot = self.handles.insert(node);
        unsafe {
            (*node.as_ptr()).slot = slot;
            // Singleton ring.
            (*node.as_ptr()).left = node;
            (*node.as_ptr()).right = node;
            self.min = Self::merge_rings(self.min, Some(node));
        }
        self.len += 1;

        NodeHandle {
            heap: self.id,
            slot,
        }
    }

    fn decrease_key(&mut self, handle: &NodeHandle, new_priority: P) -> Result<(), HeapError> {
        let node = self.resolve(handle)?;
        unsafe {
            if new_priority >= (*node.as_ptr()).priority {
                return Err(HeapError::PriorityNotDecreased);
            }
            (*node.as_ptr()).priority = new_priority;

            match (*node.as_ptr()).parent {
                Some(parent) => {
                    // Cut only when heap order is actually violated.
                    if (*node.as_ptr()).priority < (*parent.as_ptr()).priority {
                        self.cut(node);
                    }
                }
                None => {
                    if let Some(min) = self.min {
                        if (*node.as_ptr()).priority < (*min.as_ptr()).priority {
                            self.min = Some(node);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn delete(&mut self, handle: &NodeHandle) -> Result<(P, T), HeapError> {
        let node = self.resolve(handle)?;
        unsafe {
            if (*node.as_ptr()).parent.is_some() {
                self.cut(node);
            }
            // Force the target to be extracted regardless of its priority.
            self.min = Some(node);
        }
        // A resolved handle guarantees the forest is non-empty.
        self.pop().ok_or(HeapError::InvalidHandle)
    }
}

impl<T, P: Ord> ForestHeap<T, P> {
    fn resolve(&self, handle: &NodeHandle) -> Result<NonNull<Node<T, P>>, HeapError> {
        if handle.heap != self.id {
            return Err(HeapError::InvalidHandle);
        }
        self.handles
            .get(handle.slot)
            .copied()
            .ok_or(HeapError::InvalidHandle)
    }

    /// Concatenates two circular rings with a four-pointer exchange and
    /// returns the head with the smaller priority. On exact equality the
    /// second ring's head wins; the tie-break is deterministic and callers
    /// rely on it. Never allocates and never touches `degree` or `marked`.
    unsafe fn merge_rings(
        a: Option<NonNull<Node<T, P>>>,
        b: Option<NonNull<Node<T, P>>>,
    ) -> Option<NonNull<Node<T, P>>> {
        let (a, b) = match (a, b) {
            (None, None) => return None,
            (Some(a), None) => return Some(a),
            (None, Some(b)) => return Some(b),
            (Some(a), Some(b)) => (a, b),
        };

        let a_tail = (*a.as_ptr()).left;
        let b_tail = (*b.as_ptr()).left;
        (*a_tail.as_ptr()).right = b;
        (*b.as_ptr()).left = a_tail;
        (*b_tail.as_ptr()).right = a;
        (*a.as_ptr()).left = b_tail;

        if (*b.as_ptr()).priority <= (*a.as_ptr()).priority {
            Some(b)
        } else {
            Some(a)
        }
    }

    /// Unlinks `node` from its ring, leaving it a singleton. Returns a
    /// surviving member of the old ring, or `None` if `node` was alone.
    unsafe fn detach(node: NonNull<Node<T, P>>) -> Option<NonNull<Node<T, P>>> {
        let left = (*node.as_ptr()).left;
        let right = (*node.as_ptr()).right;
        if left == node {
            return None;
        }
        (*left.as_ptr()).right = right;
        (*right.as_ptr()).left = left;
        (*node.as_ptr()).left = node;
        (*node.as_ptr()).right = node;
        Some(right)
    }

    /// Merges equal-degree roots until at most one tree of each degree
    /// remains, then rebuilds the root ring and the minimum pointer.
    /// `start` must be a member of the current root ring.
    fn consolidate(&mut self, start: NonNull<Node<T, P>>) {
        // A root of degree d has at least Fib(d + 2) >= phi^d descendants,
        // so floor(log2(len)) + 2 slots cover the common case; the table
        // grows on demand for the degrees above the log2 estimate.
        let max_degree = (usize::BITS - self.len.leading_zeros()) as usize + 1;
        let mut by_degree: SmallVec<[Option<NonNull<Node<T, P>>>; 32]> =
            smallvec![None; max_degree + 1];

        unsafe {
            // Snapshot the ring first: linking mutates it mid-walk.
            let mut roots: SmallVec<[NonNull<Node<T, P>>; 16]> = SmallVec::new();
            let mut cur = start;
            loop {
                roots.push(cur);
                cur = (*cur.as_ptr()).right;
                if cur == start {
                    break;
                }
            }

            for root in roots {
                let mut x = root;
                loop {
                    let d = (*x.as_ptr()).degree;
                    if d >= by_degree.len() {
                        by_degree.resize(d + 1, None);
                    }
                    match by_degree[d].take() {
                        None => {
                            by_degree[d] = Some(x);
                            break;
                        }
                        Some(mut y) => {
                            if (*y.as_ptr()).priority < (*x.as_ptr()).priority {
                                std::mem::swap(&mut x, &mut y);
                            }
                            Self::link(y, x);
                        }
                    }
                }
            }

            // Relink the survivors into a fresh root ring.
            self.min = None;
            for root in by_degree.into_iter().flatten() {
                (*root.as_ptr()).left = root;
                (*root.as_ptr()).right = root;
                self.min = Self::merge_rings(self.min, Some(root));
            }
        }
    }

    /// Makes `loser` a child of `winner`. Both must be roots and
    /// `winner.priority <= loser.priority`.
    unsafe fn link(loser: NonNull<Node<T, P>>, winner: NonNull<Node<T, P>>) {
        Self::detach(loser);
        (*loser.as_ptr()).parent = Some(winner);
        (*loser.as_ptr()).marked = false;

        let child = (*winner.as_ptr()).child;
        (*winner.as_ptr()).child = Self::merge_rings(child, Some(loser));
        (*winner.as_ptr()).degree += 1;
    }

    /// Detaches `node` from its parent, promotes it to the root ring, and
    /// walks upward: a marked ancestor has already lost one child since it
    /// last changed parents, so it is promoted too; an unmarked non-root
    /// ancestor is marked and the walk stops.
    unsafe fn cut(&mut self, node: NonNull<Node<T, P>>) {
        let mut node = node;
        loop {
            (*node.as_ptr()).marked = false;
            let parent = match (*node.as_ptr()).parent {
                Some(parent) => parent,
                None => return,
            };

            let survivor = Self::detach(node);
            if (*parent.as_ptr()).child == Some(node) {
                (*parent.as_ptr()).child = survivor;
            }
            (*parent.as_ptr()).degree -= 1;
            (*node.as_ptr()).parent = None;
            self.min = Self::merge_rings(self.min, Some(node));

            if (*parent.as_ptr()).parent.is_none() {
                return;
            }
            if !(*parent.as_ptr()).marked {
                (*parent.as_ptr()).marked = true;
                return;
            }
            node = parent;
        }
    }
}

#[cfg(test)]
impl<T, P: Ord> ForestHeap<T, P> {
    /// Walks the entire forest checking ring integrity, heap order, degree
    /// counts, mark discipline, the Fibonacci degree bound, and the size
    /// counter.
    fn assert_invariants(&self) {
        let Some(min) = self.min else {
            assert_eq!(self.len, 0, "empty forest must have len 0");
            return;
        };
        assert!(self.len > 0);

        unsafe {
            let mut total = 0usize;
            let mut cur = min;
            loop {
                assert!((*cur.as_ptr()).parent.is_none(), "root with a parent");
                assert!(!(*cur.as_ptr()).marked, "marked root");
                assert!(
                    (*min.as_ptr()).priority <= (*cur.as_ptr()).priority,
                    "min pointer is not the minimum root"
                );
                total += Self::check_subtree(cur);
                cur = (*cur.as_ptr()).right;
                if cur == min {
                    break;
                }
            }
            assert_eq!(total, self.len, "node count does not match len");
        }
    }

    unsafe fn check_subtree(node: NonNull<Node<T, P>>) -> usize {
        assert_eq!((*(*node.as_ptr()).left.as_ptr()).right, node);
        assert_eq!((*(*node.as_ptr()).right.as_ptr()).left, node);

        let degree = (*node.as_ptr()).degree;
        let mut size = 1usize;
        let mut children = 0usize;
        if let Some(head) = (*node.as_ptr()).child {
            let mut cur = head;
            loop {
                assert_eq!((*cur.as_ptr()).parent, Some(node), "child ring parent link");
                assert!(
                    (*node.as_ptr()).priority <= (*cur.as_ptr()).priority,
                    "heap order violated"
                );
                children += 1;
                size += Self::check_subtree(cur);
                cur = (*cur.as_ptr()).right;
                if cur == head {
                    break;
                }
            }
        }
        assert_eq!(children, degree, "degree does not match child count");
        assert!(size >= fibonacci(degree + 2), "Fibonacci bound violated");
        size
    }
}

#[cfg(test)]
fn fibonacci(n: usize) -> usize {
    let (mut a, mut b) = (0usize, 1usize);
    for _ in 0..n {
        let next = a + b;
        a = b;
        b = next;
    }
    a
}
