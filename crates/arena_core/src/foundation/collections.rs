//! Specialized collection types

use std::cmp::Ordering;

pub use slotmap::{new_key_type, Key, SlotMap};

/// Binary min-heap ordered by a caller-supplied three-way comparison
///
/// Unlike [`std::collections::BinaryHeap`] the ordering lives in the heap rather
/// than in an `Ord` impl, so float keys and tie-break rules can be expressed
/// with a plain closure. Elements that compare `Less` come out first.
pub struct MinHeap<T, F>
where
    F: Fn(&T, &T) -> Ordering,
{
    items: Vec<T>,
    compare: F,
}

impl<T, F> MinHeap<T, F>
where
    F: Fn(&T, &T) -> Ordering,
{
    /// Create an empty heap using `compare` as the ordering
    pub const fn new(compare: F) -> Self {
        Self {
            items: Vec::new(),
            compare,
        }
    }

    /// Create an empty heap with room for `capacity` elements
    pub fn with_capacity(capacity: usize, compare: F) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            compare,
        }
    }

    /// Insert an element in O(log n)
    pub fn push(&mut self, item: T) {
        self.items.push(item);
        self.sift_up(self.items.len() - 1);
    }

    /// Remove and return the smallest element, or `None` when empty
    pub fn pop(&mut self) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        let last = self.items.len() - 1;
        self.items.swap(0, last);
        let top = self.items.pop();
        if !self.items.is_empty() {
            self.sift_down(0);
        }
        top
    }

    /// Mutate the first element matching `predicate` in place and restore order
    ///
    /// Returns `false` when nothing matches. The lookup is a linear scan.
    pub fn adjust<P, M>(&mut self, predicate: P, mutate: M) -> bool
    where
        P: Fn(&T) -> bool,
        M: FnOnce(&mut T),
    {
        let Some(index) = self.items.iter().position(|item| predicate(item)) else {
            return false;
        };
        mutate(&mut self.items[index]);
        let index = self.sift_up(index);
        self.sift_down(index);
        true
    }

    /// Smallest element without removing it
    pub fn peek(&self) -> Option<&T> {
        self.items.first()
    }

    /// Number of queued elements
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing is queued
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop every element, keeping the allocation
    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn less(&self, a: usize, b: usize) -> bool {
        (self.compare)(&self.items[a], &self.items[b]) == Ordering::Less
    }

    fn sift_up(&mut self, mut index: usize) -> usize {
        while index > 0 {
            let parent = (index - 1) / 2;
            if !self.less(index, parent) {
                break;
            }
            self.items.swap(index, parent);
            index = parent;
        }
        index
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.items.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut smallest = index;

            if left < len && self.less(left, smallest) {
                smallest = left;
            }
            if right < len && self.less(right, smallest) {
                smallest = right;
            }
            if smallest == index {
                break;
            }
            self.items.swap(index, smallest);
            index = smallest;
        }
    }
}
