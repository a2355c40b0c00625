//! Node Annotations
//!
//! Arbitrary typed objects attached to a node. Annotations added with
//! [`AnnotationStore::add_cloneable`] get their own copy when the node is
//! cloned; everything else is shared by reference between the original and
//! the clone.

use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

use crate::frugal::FrugalList;

type CloneFn = fn(&dyn Any) -> Option<Rc<dyn Any>>;

#[derive(Clone)]
struct Annotation {
    value: Rc<dyn Any>,
    cloner: Option<CloneFn>,
}

impl Annotation {
    fn is<T: Any>(&self) -> bool {
        (*self.value).type_id() == TypeId::of::<T>()
    }

    fn copy_for_clone(&self) -> Self {
        let value = self
            .cloner
            .and_then(|clone| clone(&*self.value))
            .unwrap_or_else(|| Rc::clone(&self.value));
        Self { value, cloner: self.cloner }
    }
}

fn clone_typed<T: Any + Clone>(value: &dyn Any) -> Option<Rc<dyn Any>> {
    value
        .downcast_ref::<T>()
        .map(|v| Rc::new(v.clone()) as Rc<dyn Any>)
}

/// Per-node annotation storage (no allocation until the first annotation)
#[derive(Clone, Default)]
pub struct AnnotationStore {
    items: FrugalList<Annotation>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an annotation shared by reference with clones of the node
    pub fn add<T: Any>(&mut self, value: T) {
        self.items = self.items.with(Annotation {
            value: Rc::new(value),
            cloner: None,
        });
    }

    /// Attach an annotation that is duplicated when the node is cloned
    pub fn add_cloneable<T: Any + Clone>(&mut self, value: T) {
        self.items = self.items.with(Annotation {
            value: Rc::new(value),
            cloner: Some(clone_typed::<T>),
        });
    }

    /// First annotation of type `T`
    pub fn get<T: Any>(&self) -> Option<Rc<T>> {
        self.items
            .iter()
            .find(|a| a.is::<T>())
            .and_then(|a| Rc::clone(&a.value).downcast::<T>().ok())
    }

    /// Every annotation of type `T`, in insertion order
    pub fn get_all<T: Any>(&self) -> Vec<Rc<T>> {
        self.items
            .iter()
            .filter(|a| a.is::<T>())
            .filter_map(|a| Rc::clone(&a.value).downcast::<T>().ok())
            .collect()
    }

    pub fn has<T: Any>(&self) -> bool {
        self.items.iter().any(|a| a.is::<T>())
    }

    /// Remove every annotation of type `T`, returning how many were removed
    pub fn remove<T: Any>(&mut self) -> usize {
        let before = self.items.len();
        self.items = self.items.without(|a| a.is::<T>());
        before - self.items.len()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Annotations for a cloned node
    pub(crate) fn clone_for_copy(&self) -> Self {
        Self {
            items: self.items.iter().map(Annotation::copy_for_clone).collect(),
        }
    }
}

impl fmt::Debug for AnnotationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationStore")
            .field("len", &self.items.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug, Clone, PartialEq)]
    struct SourceLine(u32);

    #[derive(Debug)]
    struct Marker(Cell<u32>);

    #[test]
    fn test_typed_lookup() {
        let mut store = AnnotationStore::new();
        assert!(store.is_empty());

        store.add(SourceLine(12));
        store.add("label");

        assert_eq!(store.get::<SourceLine>().as_deref(), Some(&SourceLine(12)));
        assert_eq!(store.get::<&'static str>().as_deref(), Some(&"label"));
        assert!(store.get::<u64>().is_none());
    }

    #[test]
    fn test_remove_by_type() {
        let mut store = AnnotationStore::new();
        store.add(SourceLine(1));
        store.add(SourceLine(2));
        store.add(7u8);

        assert_eq!(store.get_all::<SourceLine>().len(), 2);
        assert_eq!(store.remove::<SourceLine>(), 2);
        assert_eq!(store.len(), 1);
        assert!(store.has::<u8>());
    }

    #[test]
    fn test_clone_copies_cloneable_and_shares_others() {
        let mut store = AnnotationStore::new();
        store.add_cloneable(SourceLine(3));
        store.add(Marker(Cell::new(0)));

        let copy = store.clone_for_copy();

        let original_line = store.get::<SourceLine>().unwrap();
        let copied_line = copy.get::<SourceLine>().unwrap();
        assert!(!Rc::ptr_eq(&original_line, &copied_line));
        assert_eq!(*copied_line, SourceLine(3));

        let original_marker = store.get::<Marker>().unwrap();
        let copied_marker = copy.get::<Marker>().unwrap();
        assert!(Rc::ptr_eq(&original_marker, &copied_marker));
        copied_marker.0.set(5);
        assert_eq!(original_marker.0.get(), 5);
    }
}
