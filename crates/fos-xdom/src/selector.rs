//! Element Query
//!
//! Selector matching is supplied by the caller through [`Selector`]; the
//! document walks its tree and collects the matches into snapshot
//! collections.

use crate::document::Document;
use crate::node::NodeKind;
use crate::token_list::TokenList;
use crate::NodeId;

/// Compiled selector contract
pub trait Selector {
    /// Check if element matches
    fn matches(&self, doc: &Document, element: NodeId) -> bool;

    /// Matching elements under `node`, in document order
    fn select(&self, doc: &Document, node: NodeId) -> ElementCollection {
        ElementCollection::from_vec(
            doc.descendants(node)
                .filter(|&id| doc.kind_of(id) == Some(NodeKind::Element) && self.matches(doc, id))
                .collect(),
        )
    }
}

impl<F> Selector for F
where
    F: Fn(&Document, NodeId) -> bool,
{
    fn matches(&self, doc: &Document, element: NodeId) -> bool {
        self(doc, element)
    }
}

/// Element collection (snapshot, elements only)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementCollection {
    elements: Vec<NodeId>,
}

impl ElementCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(elements: Vec<NodeId>) -> Self {
        Self { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn item(&self, index: usize) -> Option<NodeId> {
        self.elements.get(index).copied()
    }

    pub fn first(&self) -> Option<NodeId> {
        self.elements.first().copied()
    }

    pub fn contains(&self, element: NodeId) -> bool {
        self.elements.contains(&element)
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.elements.iter().copied()
    }

    /// Member with identifier `name` (through the id map), else the first
    /// member whose `name` attribute equals `name`
    pub fn named_item(&self, doc: &Document, name: &str) -> Option<NodeId> {
        if let Some(element) = doc.element_by_id(name).filter(|&e| self.contains(e)) {
            return Some(element);
        }
        self.iter().find(|&e| {
            doc.get_attribute(e, "name")
                .ok()
                .flatten()
                .is_some_and(|v| v == name)
        })
    }

    pub fn into_vec(self) -> Vec<NodeId> {
        self.elements
    }
}

impl IntoIterator for ElementCollection {
    type Item = NodeId;
    type IntoIter = std::vec::IntoIter<NodeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl Document {
    /// All elements under `node` matching `selector`
    pub fn query_all<S: Selector + ?Sized>(&self, node: NodeId, selector: &S) -> ElementCollection {
        selector.select(self, node)
    }

    /// First element under `node` matching `selector`
    pub fn query_first<S: Selector + ?Sized>(&self, node: NodeId, selector: &S) -> Option<NodeId> {
        self.descendants(node)
            .find(|&id| self.kind_of(id) == Some(NodeKind::Element) && selector.matches(self, id))
    }

    /// Check if `element` matches `selector`
    pub fn matches<S: Selector + ?Sized>(&self, element: NodeId, selector: &S) -> bool {
        self.kind_of(element) == Some(NodeKind::Element) && selector.matches(self, element)
    }

    /// Closest inclusive ancestor matching `selector`
    pub fn closest<S: Selector + ?Sized>(&self, element: NodeId, selector: &S) -> Option<NodeId> {
        std::iter::once(element)
            .chain(self.ancestors(element))
            .find(|&id| self.matches(id, selector))
    }

    /// Elements under `node` with local name `local_name`; `*` matches all
    pub fn elements_by_tag_name(&self, node: NodeId, local_name: &str) -> ElementCollection {
        self.query_all(node, &|doc: &Document, id: NodeId| {
            local_name == "*" || doc.name(id).is_some_and(|n| n.local_name() == local_name)
        })
    }

    /// Elements under `node` carrying every class in `classes`
    pub fn elements_by_class_name(&self, node: NodeId, classes: &str) -> ElementCollection {
        let wanted = TokenList::parse(classes);
        if wanted.is_empty() {
            return ElementCollection::new();
        }
        self.query_all(node, &|doc: &Document, id: NodeId| {
            doc.class_list(id)
                .is_ok_and(|list| wanted.iter().all(|token| list.contains(token)))
        })
    }
}
