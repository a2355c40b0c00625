//! Frugal List - Size-adaptive persistent collection
//!
//! Holds zero, one or many items without allocating for the first two
//! cases. Every "mutation" returns a new list and leaves the original
//! untouched, so a clone taken before a callback runs is a stable snapshot.

use std::rc::Rc;

/// Immutable-on-mutation list with empty / single / shared-array states
#[derive(Debug)]
pub enum FrugalList<T> {
    /// No items (no allocation)
    Empty,
    /// Exactly one item (no allocation)
    Single(T),
    /// Two or more items, shared between snapshots
    Many(Rc<[T]>),
}

impl<T> FrugalList<T> {
    pub const fn new() -> Self {
        Self::Empty
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Single(_) => 1,
            Self::Many(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        match self {
            Self::Empty => None,
            Self::Single(item) => (index == 0).then_some(item),
            Self::Many(items) => items.get(index),
        }
    }

    pub fn iter(&self) -> FrugalIter<'_, T> {
        FrugalIter { list: self, index: 0 }
    }
}

impl<T: Clone> FrugalList<T> {
    /// New list with `item` appended
    pub fn with(&self, item: T) -> Self {
        match self {
            Self::Empty => Self::Single(item),
            Self::Single(first) => Self::Many(Rc::from(vec![first.clone(), item])),
            Self::Many(items) => {
                let mut next = Vec::with_capacity(items.len() + 1);
                next.extend(items.iter().cloned());
                next.push(item);
                Self::Many(Rc::from(next))
            }
        }
    }

    /// New list without the items matching `remove`
    pub fn without(&self, mut remove: impl FnMut(&T) -> bool) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::Single(item) => {
                if remove(item) {
                    Self::Empty
                } else {
                    Self::Single(item.clone())
                }
            }
            Self::Many(items) => {
                if !items.iter().any(&mut remove) {
                    return Self::Many(Rc::clone(items));
                }
                Self::from_vec(items.iter().filter(|&item| !remove(item)).cloned().collect())
            }
        }
    }

    /// Build the smallest representation for `items`
    pub fn from_vec(mut items: Vec<T>) -> Self {
        match items.len() {
            0 => Self::Empty,
            1 => items.pop().map_or(Self::Empty, Self::Single),
            _ => Self::Many(Rc::from(items)),
        }
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

impl<T: Clone> Clone for FrugalList<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::Single(item) => Self::Single(item.clone()),
            Self::Many(items) => Self::Many(Rc::clone(items)),
        }
    }
}

impl<T> Default for FrugalList<T> {
    fn default() -> Self {
        Self::Empty
    }
}

impl<T: Clone> FromIterator<T> for FrugalList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a FrugalList<T> {
    type Item = &'a T;
    type IntoIter = FrugalIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Borrowing iterator over a [`FrugalList`]
#[derive(Debug)]
pub struct FrugalIter<'a, T> {
    list: &'a FrugalList<T>,
    index: usize,
}

impl<'a, T> Iterator for FrugalIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.list.get(self.index)?;
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.list.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl<T> ExactSizeIterator for FrugalIter<'_, T> {}
