//! Order-preserving set algebra over plain sequences.
//!
//! Every operation treats its operands as multisets compared by value and
//! returns each distinct value once, in the order it was first seen. An absent
//! operand (`None`) behaves like an empty sequence, so none of these functions
//! can fail.
//!
//! ```
//! use set_ops::{difference, intersection, union};
//!
//! assert_eq!(intersection(Some([1, 2, 3, 4]), Some([3, 4, 5, 6])), vec![3, 4]);
//! assert_eq!(union(Some([1, 2, 3]), Some([3, 4, 5])), vec![1, 2, 3, 4, 5]);
//! assert_eq!(difference(Some([1, 2, 3, 4]), Some([2, 4, 6])), vec![1, 3]);
//! ```

use std::collections::HashSet;
use std::hash::Hash;

/// Insertion-ordered set: a `Vec` for order plus a `HashSet` for membership.
struct Ordered<T> {
    seen: HashSet<T>,
    items: Vec<T>,
}

impl<T: Eq + Hash + Clone> Ordered<T> {
    fn new() -> Self {
        Self {
            seen: HashSet::new(),
            items: Vec::new(),
        }
    }

    fn push(&mut self, item: T) {
        if self.seen.insert(item.clone()) {
            self.items.push(item);
        }
    }

    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }

    fn into_vec(self) -> Vec<T> {
        self.items
    }
}

/// Values present in both operands, ordered by first occurrence in `first`.
///
/// Returns an empty vector when either operand is absent.
pub fn intersection<T, A, B>(first: Option<A>, second: Option<B>) -> Vec<T>
where
    T: Eq + Hash + Clone,
    A: IntoIterator<Item = T>,
    B: IntoIterator<Item = T>,
{
    let (Some(first), Some(second)) = (first, second) else {
        return Vec::new();
    };

    let lookup: HashSet<T> = second.into_iter().collect();
    let mut result = Ordered::new();
    result.extend(first.into_iter().filter(|item| lookup.contains(item)));
    result.into_vec()
}

/// Every distinct value of `first` followed by the unseen values of `second`.
pub fn union<T, A, B>(first: Option<A>, second: Option<B>) -> Vec<T>
where
    T: Eq + Hash + Clone,
    A: IntoIterator<Item = T>,
    B: IntoIterator<Item = T>,
{
    let mut result = Ordered::new();
    if let Some(first) = first {
        result.extend(first);
    }
    if let Some(second) = second {
        result.extend(second);
    }
    result.into_vec()
}

/// Values of `first` that do not occur in `second`, ordered by first occurrence.
///
/// An absent `first` yields an empty vector; an absent `second` excludes
/// nothing, so the result is `first` with duplicates removed.
pub fn difference<T, A, B>(first: Option<A>, second: Option<B>) -> Vec<T>
where
    T: Eq + Hash + Clone,
    A: IntoIterator<Item = T>,
    B: IntoIterator<Item = T>,
{
    let Some(first) = first else {
        return Vec::new();
    };

    let exclude: HashSet<T> = second.map(|s| s.into_iter().collect()).unwrap_or_default();
    let mut result = Ordered::new();
    result.extend(first.into_iter().filter(|item| !exclude.contains(item)));
    result.into_vec()
}

/// [`union`] after dropping absent elements from both operands.
pub fn union_non_null<T, A, B>(first: Option<A>, second: Option<B>) -> Vec<T>
where
    T: Eq + Hash + Clone,
    A: IntoIterator<Item = Option<T>>,
    B: IntoIterator<Item = Option<T>>,
{
    union(
        first.map(|items| items.into_iter().flatten()),
        second.map(|items| items.into_iter().flatten()),
    )
}
