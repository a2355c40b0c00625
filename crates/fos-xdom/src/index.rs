//! Element Indexes
//!
//! Keyed multimaps from a key derived from one attribute's value to the
//! connected elements carrying that key. The document keeps every registered
//! index current across attribute writes, insertions, removals and moves.
//!
//! An update first drops every key derived from the old value, then adds
//! every key derived from the new one. For token indexes the old and new
//! token sets may be disjoint, overlapping or nested; removing by the old
//! value in full is what keeps the result equal to a fresh rebuild.

use std::any::Any;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::document::Document;
use crate::error::{DomError, DomResult};
use crate::name::{IntoQualifiedName, QualifiedName};
use crate::token_list::TokenList;
use crate::value::DomValue;
use crate::NodeId;

/// Key derivation: attribute value to zero or more keys
type DeriveKeys<K> = Rc<dyn Fn(&str) -> Vec<K>>;

/// Index over one attribute name
pub struct ElementIndex<K> {
    attribute: QualifiedName,
    derive: DeriveKeys<K>,
    entries: HashMap<K, Vec<NodeId>>,
}

impl ElementIndex<String> {
    /// One key per element: the whole value; empty values are not indexed
    pub fn by_value(attribute: impl IntoQualifiedName) -> DomResult<Self> {
        Self::with_keys(attribute, |value: &str| {
            if value.is_empty() {
                Vec::new()
            } else {
                vec![value.to_string()]
            }
        })
    }

    /// One key per whitespace-separated token, duplicates collapsed
    pub fn by_tokens(attribute: impl IntoQualifiedName) -> DomResult<Self> {
        Self::with_keys(attribute, |value: &str| TokenList::parse(value).into_tokens())
    }

    /// The document's id map, fed by identifier values of any name
    pub(crate) fn identifiers() -> Self {
        Self {
            attribute: QualifiedName::local("id"),
            derive: Rc::new(|value: &str| {
                if value.is_empty() {
                    Vec::new()
                } else {
                    vec![value.to_string()]
                }
            }),
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone + 'static> ElementIndex<K> {
    /// Index with a custom key derivation; the derivation is also where a
    /// custom key comparison goes (e.g. case folding)
    pub fn with_keys(
        attribute: impl IntoQualifiedName,
        derive: impl Fn(&str) -> Vec<K> + 'static,
    ) -> DomResult<Self> {
        Ok(Self {
            attribute: attribute.into_qualified_name()?,
            derive: Rc::new(derive),
            entries: HashMap::new(),
        })
    }

    /// Watched attribute name
    pub fn attribute(&self) -> &QualifiedName {
        &self.attribute
    }

    /// Keys for `value`, each at most once
    pub fn derive_keys(&self, value: &str) -> Vec<K> {
        let mut keys: Vec<K> = Vec::new();
        for key in (self.derive)(value) {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    /// Snapshot of the elements under `key`, in indexing order
    pub fn elements<Q>(&self, key: &Q) -> Vec<NodeId>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).cloned().unwrap_or_default()
    }

    /// First element indexed under `key`
    pub fn first<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).and_then(|list| list.first().copied())
    }

    /// Whether any element is indexed under `key`
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Keys with at least one element
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    /// (key, elements) groupings
    pub fn groups(&self) -> impl Iterator<Item = (&K, &[NodeId])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key is indexed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove_keys(&mut self, element: NodeId, value: &str) {
        for key in self.derive_keys(value) {
            if let Some(list) = self.entries.get_mut(&key) {
                list.retain(|&e| e != element);
                if list.is_empty() {
                    self.entries.remove(&key);
                }
            }
        }
    }

    fn add_keys(&mut self, element: NodeId, value: &str) {
        for key in self.derive_keys(value) {
            let list = self.entries.entry(key).or_default();
            if !list.contains(&element) {
                list.push(element);
            }
        }
    }

    pub(crate) fn apply(&mut self, element: NodeId, old: Option<&str>, new: Option<&str>) {
        if let Some(old) = old {
            self.remove_keys(element, old);
        }
        if let Some(new) = new {
            self.add_keys(element, new);
        }
    }
}

impl<K> fmt::Debug for ElementIndex<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementIndex")
            .field("attribute", &self.attribute)
            .field("keys", &self.entries.len())
            .finish()
    }
}

/// Type-erased view the document uses to maintain registered indexes
pub(crate) trait IndexMaintainer {
    fn attribute(&self) -> &QualifiedName;
    fn update(&mut self, element: NodeId, old: Option<&str>, new: Option<&str>);
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<K: Eq + Hash + Clone + 'static> IndexMaintainer for ElementIndex<K> {
    fn attribute(&self) -> &QualifiedName {
        &self.attribute
    }

    fn update(&mut self, element: NodeId, old: Option<&str>, new: Option<&str>) {
        self.apply(element, old, new);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Typed handle to an index registered with a document
pub struct IndexHandle<K> {
    slot: usize,
    document: u32,
    _key: PhantomData<fn() -> K>,
}

impl<K> Clone for IndexHandle<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for IndexHandle<K> {}

impl<K> fmt::Debug for IndexHandle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexHandle")
            .field("slot", &self.slot)
            .field("document", &self.document)
            .finish()
    }
}

/// Attribute value as the indexes see it
#[derive(Debug, Clone)]
pub(crate) struct IndexedValue {
    pub text: String,
    pub is_id: bool,
}

impl IndexedValue {
    /// Canonical text and identifier flag of a value
    pub fn of(value: &dyn DomValue) -> Self {
        Self {
            text: value.text(),
            is_id: value.is_id(),
        }
    }
}

impl Document {
    /// Register `index`, filling it from the connected elements
    pub fn add_index<K: Eq + Hash + Clone + 'static>(
        &mut self,
        mut index: ElementIndex<K>,
    ) -> IndexHandle<K> {
        index.entries.clear();
        let root = self.root();
        for element in self.connected_elements(root) {
            if let Ok(Some(value)) = self.get_attribute(element, &index.attribute) {
                index.add_keys(element, &value);
            }
        }

        tracing::debug!(attribute = %index.attribute, keys = index.len(), "Index registered");

        let slot = self.indexes.len();
        self.indexes.push(Some(Box::new(index)));
        IndexHandle {
            slot,
            document: self.serial(),
            _key: PhantomData,
        }
    }

    /// Borrow a registered index
    pub fn index<K: Eq + Hash + Clone + 'static>(
        &self,
        handle: IndexHandle<K>,
    ) -> DomResult<&ElementIndex<K>> {
        if handle.document != self.serial() {
            return Err(DomError::WrongDocument);
        }
        self.indexes
            .get(handle.slot)
            .and_then(Option::as_ref)
            .and_then(|index| index.as_any().downcast_ref::<ElementIndex<K>>())
            .ok_or_else(|| DomError::not_found(format!("index {}", handle.slot)))
    }

    /// Unregister an index and hand it back
    pub fn remove_index<K: Eq + Hash + Clone + 'static>(
        &mut self,
        handle: IndexHandle<K>,
    ) -> DomResult<ElementIndex<K>> {
        if handle.document != self.serial() {
            return Err(DomError::WrongDocument);
        }
        let index = self
            .indexes
            .get_mut(handle.slot)
            .and_then(Option::take)
            .ok_or_else(|| DomError::not_found(format!("index {}", handle.slot)))?;
        let index = index
            .into_any()
            .downcast::<ElementIndex<K>>()
            .map_err(|_| DomError::not_found(format!("index {}", handle.slot)))?;
        Ok(*index)
    }

    /// Number of registered indexes
    pub fn index_count(&self) -> usize {
        self.indexes.iter().flatten().count()
    }

    /// Element carrying identifier `id`, through the id map
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.ids.first(id)
    }

    /// Apply one attribute change to every index watching `name`
    pub(crate) fn reindex(
        &mut self,
        element: NodeId,
        name: &QualifiedName,
        old: Option<&IndexedValue>,
        new: Option<&IndexedValue>,
    ) {
        let old_text = old.map(|v| v.text.as_str());
        let new_text = new.map(|v| v.text.as_str());
        for index in self.indexes.iter_mut().flatten() {
            if index.attribute() == name {
                index.update(element, old_text, new_text);
            }
        }

        let old_id = old.filter(|v| v.is_id).map(|v| v.text.as_str());
        let new_id = new.filter(|v| v.is_id).map(|v| v.text.as_str());
        if old_id.is_some() || new_id.is_some() {
            self.ids.apply(element, old_id, new_id);
        }
    }

    /// Index every element of the subtree rooted at `node`
    pub(crate) fn index_subtree(&mut self, node: NodeId) {
        for (element, attributes) in self.subtree_attributes(node) {
            for (name, value) in &attributes {
                self.reindex(element, name, None, Some(value));
            }
        }
    }

    /// Drop every element of the subtree rooted at `node` from the indexes
    pub(crate) fn unindex_subtree(&mut self, node: NodeId) {
        for (element, attributes) in self.subtree_attributes(node) {
            for (name, value) in &attributes {
                self.reindex(element, name, Some(value), None);
            }
        }
    }

    fn subtree_attributes(&self, node: NodeId) -> Vec<(NodeId, Vec<(QualifiedName, IndexedValue)>)> {
        self.connected_elements(node)
            .into_iter()
            .map(|element| (element, self.indexed_attributes(element)))
            .collect()
    }

    /// `node` (when an element) and its element descendants, document order
    fn connected_elements(&self, node: NodeId) -> Vec<NodeId> {
        std::iter::once(node)
            .chain(self.descendants(node))
            .filter(|&id| self.kind_of(id) == Some(crate::node::NodeKind::Element))
            .collect()
    }
}
