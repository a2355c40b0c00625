//! DOM Events
//!
//! Attribute change and child-list mutation events delivered to observers.

use crate::document::Document;
use crate::name::QualifiedName;
use crate::NodeId;

/// Attribute value change on an element
#[derive(Debug, Clone)]
pub struct AttributeEvent {
    pub element: NodeId,
    pub name: QualifiedName,
    /// Canonical value before the change; `None` when the attribute was added
    pub old_value: Option<String>,
}

impl AttributeEvent {
    /// Value read from the element now, not when the event was raised
    pub fn current_value(&self, doc: &Document) -> Option<String> {
        doc.get_attribute(self.element, &self.name).ok().flatten()
    }
}

/// Nodes added to or removed from a child list; never both
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildChange {
    Added(Vec<NodeId>),
    Removed(Vec<NodeId>),
}

/// Child-list change on a container
#[derive(Debug, Clone)]
pub struct MutationEvent {
    pub target: NodeId,
    pub change: ChildChange,
    /// Sibling context at the time of the change
    pub previous_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
}

impl MutationEvent {
    pub fn added_nodes(&self) -> &[NodeId] {
        match &self.change {
            ChildChange::Added(nodes) => nodes,
            ChildChange::Removed(_) => &[],
        }
    }

    pub fn removed_nodes(&self) -> &[NodeId] {
        match &self.change {
            ChildChange::Removed(nodes) => nodes,
            ChildChange::Added(_) => &[],
        }
    }

    pub fn is_addition(&self) -> bool {
        matches!(self.change, ChildChange::Added(_))
    }
}

/// DOM event
#[derive(Debug, Clone)]
pub enum DomEvent {
    Attribute(AttributeEvent),
    ChildNodes(MutationEvent),
}

impl DomEvent {
    /// Create attribute changed event
    pub fn attribute_changed(element: NodeId, name: QualifiedName, old_value: Option<String>) -> Self {
        Self::Attribute(AttributeEvent {
            element,
            name,
            old_value,
        })
    }

    /// Create nodes added event
    pub fn nodes_added(
        target: NodeId,
        nodes: Vec<NodeId>,
        previous_sibling: Option<NodeId>,
        next_sibling: Option<NodeId>,
    ) -> Self {
        Self::ChildNodes(MutationEvent {
            target,
            change: ChildChange::Added(nodes),
            previous_sibling,
            next_sibling,
        })
    }

    /// Create nodes removed event
    pub fn nodes_removed(
        target: NodeId,
        nodes: Vec<NodeId>,
        previous_sibling: Option<NodeId>,
        next_sibling: Option<NodeId>,
    ) -> Self {
        Self::ChildNodes(MutationEvent {
            target,
            change: ChildChange::Removed(nodes),
            previous_sibling,
            next_sibling,
        })
    }

    /// Node the event originates from: the element for attribute changes,
    /// the container for child-list changes
    pub fn origin(&self) -> NodeId {
        match self {
            Self::Attribute(e) => e.element,
            Self::ChildNodes(e) => e.target,
        }
    }

    pub fn as_attribute(&self) -> Option<&AttributeEvent> {
        match self {
            Self::Attribute(e) => Some(e),
            Self::ChildNodes(_) => None,
        }
    }

    pub fn as_mutation(&self) -> Option<&MutationEvent> {
        match self {
            Self::ChildNodes(e) => Some(e),
            Self::Attribute(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_event_sides() {
        let mut doc = Document::new();
        let parent = doc.create_element("ul").unwrap();
        let child = doc.create_element("li").unwrap();

        let added = DomEvent::nodes_added(parent, vec![child], None, None);
        let mutation = added.as_mutation().unwrap();
        assert_eq!(mutation.added_nodes(), &[child]);
        assert!(mutation.removed_nodes().is_empty());
        assert!(mutation.is_addition());
        assert_eq!(added.origin(), parent);
        assert!(added.as_attribute().is_none());
    }

    #[test]
    fn test_attribute_event_reads_live_value() {
        let mut doc = Document::new();
        let el = doc.create_element("p").unwrap();
        doc.set_attribute(el, "title", "first").unwrap();

        let name = QualifiedName::new("title").unwrap();
        let event = AttributeEvent {
            element: el,
            name,
            old_value: None,
        };
        assert_eq!(event.current_value(&doc).as_deref(), Some("first"));

        doc.set_attribute(el, "title", "second").unwrap();
        assert_eq!(event.current_value(&doc).as_deref(), Some("second"));
    }
}
