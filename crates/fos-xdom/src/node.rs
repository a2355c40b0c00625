//! DOM Node - Arena slot representation
//!
//! Nodes are addressed by [`NodeId`] handles into their document's arena.
//! Links to parent and siblings are handles too, so detaching, moving and
//! cloning only rewire handles. Kind-specific data lives in [`NodeData`];
//! only the variants that can have them carry attributes or children.

use crate::annotations::AnnotationStore;
use crate::name::QualifiedName;
use crate::provider::TypeTag;
use crate::value::DomValue;
use crate::NodeId;

/// Discriminant of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element,
    Attribute,
    Text,
    CDataSection,
    Comment,
    ProcessingInstruction,
    DocumentType,
    Entity,
    EntityReference,
    Notation,
    DocumentFragment,
}

impl NodeKind {
    /// Kinds that own a child list
    pub fn is_container(self) -> bool {
        matches!(self, Self::Document | Self::Element | Self::DocumentFragment)
    }

    /// Text-like kinds whose value is their character data
    pub fn is_character_data(self) -> bool {
        matches!(self, Self::Text | Self::CDataSection | Self::Comment)
    }

    /// Whether a node of kind `child` may sit in this kind's child list
    pub fn can_contain(self, child: NodeKind) -> bool {
        match self {
            Self::Document => matches!(
                child,
                Self::Element
                    | Self::DocumentType
                    | Self::Comment
                    | Self::ProcessingInstruction
                    | Self::Text
            ),
            Self::Element | Self::DocumentFragment => matches!(
                child,
                Self::Element
                    | Self::Text
                    | Self::CDataSection
                    | Self::Comment
                    | Self::ProcessingInstruction
                    | Self::EntityReference
            ),
            _ => false,
        }
    }

    /// Fixed pseudo-name for kinds without a schema-derived name
    pub fn fixed_name(self) -> Option<&'static str> {
        match self {
            Self::Document => Some("#document"),
            Self::Text => Some("#text"),
            Self::CDataSection => Some("#cdata-section"),
            Self::Comment => Some("#comment"),
            Self::DocumentFragment => Some("#document-fragment"),
            _ => None,
        }
    }
}

/// Element-specific data
#[derive(Debug)]
pub struct ElementData {
    pub name: QualifiedName,
    /// Attribute nodes in document order
    pub attributes: Vec<NodeId>,
    /// Native type resolved from the type providers at creation
    pub type_tag: Option<TypeTag>,
}

/// Attribute-specific data
#[derive(Debug)]
pub struct AttributeData {
    pub name: QualifiedName,
    pub value: Box<dyn DomValue>,
    /// Element currently owning this attribute
    pub owner: Option<NodeId>,
}

/// Node-specific data
#[derive(Debug)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Attribute(AttributeData),
    Text(String),
    CDataSection(String),
    Comment(String),
    ProcessingInstruction {
        target: String,
        data: String,
        type_tag: Option<TypeTag>,
    },
    DocumentType {
        name: String,
        public_id: Option<String>,
        system_id: Option<String>,
    },
    Entity {
        name: String,
        public_id: Option<String>,
        system_id: Option<String>,
        notation_name: Option<String>,
    },
    EntityReference {
        name: String,
    },
    Notation {
        name: String,
        public_id: Option<String>,
        system_id: Option<String>,
    },
    DocumentFragment,
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Document => NodeKind::Document,
            Self::Element(_) => NodeKind::Element,
            Self::Attribute(_) => NodeKind::Attribute,
            Self::Text(_) => NodeKind::Text,
            Self::CDataSection(_) => NodeKind::CDataSection,
            Self::Comment(_) => NodeKind::Comment,
            Self::ProcessingInstruction { .. } => NodeKind::ProcessingInstruction,
            Self::DocumentType { .. } => NodeKind::DocumentType,
            Self::Entity { .. } => NodeKind::Entity,
            Self::EntityReference { .. } => NodeKind::EntityReference,
            Self::Notation { .. } => NodeKind::Notation,
            Self::DocumentFragment => NodeKind::DocumentFragment,
        }
    }

    /// Copy of the data for kinds without attribute or child state
    ///
    /// Elements and attributes are cloned by the document because their
    /// attribute nodes and values need fresh arena slots.
    pub(crate) fn duplicate_leaf(&self) -> Option<Self> {
        Some(match self {
            Self::Document | Self::Element(_) | Self::Attribute(_) => return None,
            Self::Text(text) => Self::Text(text.clone()),
            Self::CDataSection(text) => Self::CDataSection(text.clone()),
            Self::Comment(text) => Self::Comment(text.clone()),
            Self::ProcessingInstruction { target, data, type_tag } => Self::ProcessingInstruction {
                target: target.clone(),
                data: data.clone(),
                type_tag: type_tag.clone(),
            },
            Self::DocumentType { name, public_id, system_id } => Self::DocumentType {
                name: name.clone(),
                public_id: public_id.clone(),
                system_id: system_id.clone(),
            },
            Self::Entity { name, public_id, system_id, notation_name } => Self::Entity {
                name: name.clone(),
                public_id: public_id.clone(),
                system_id: system_id.clone(),
                notation_name: notation_name.clone(),
            },
            Self::EntityReference { name } => Self::EntityReference { name: name.clone() },
            Self::Notation { name, public_id, system_id } => Self::Notation {
                name: name.clone(),
                public_id: public_id.clone(),
                system_id: system_id.clone(),
            },
            Self::DocumentFragment => Self::DocumentFragment,
        })
    }
}

/// DOM Node - arena slot
#[derive(Debug)]
pub struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) last_child: Option<NodeId>,
    pub(crate) prev_sibling: Option<NodeId>,
    pub(crate) next_sibling: Option<NodeId>,
    pub(crate) data: NodeData,
    pub(crate) annotations: AnnotationStore,
}

impl Node {
    pub(crate) fn new(data: NodeData) -> Self {
        Self {
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            data,
            annotations: AnnotationStore::new(),
        }
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    #[inline]
    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    pub fn last_child(&self) -> Option<NodeId> {
        self.last_child
    }

    pub fn previous_sibling(&self) -> Option<NodeId> {
        self.prev_sibling
    }

    pub fn next_sibling(&self) -> Option<NodeId> {
        self.next_sibling
    }

    pub fn annotations(&self) -> &AnnotationStore {
        &self.annotations
    }

    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub fn as_attribute(&self) -> Option<&AttributeData> {
        match &self.data {
            NodeData::Attribute(a) => Some(a),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn as_attribute_mut(&mut self) -> Option<&mut AttributeData> {
        match &mut self.data {
            NodeData::Attribute(a) => Some(a),
            _ => None,
        }
    }

    /// Character data of text, CDATA and comment nodes
    pub fn character_data(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(s) | NodeData::CDataSection(s) | NodeData::Comment(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_rules() {
        assert!(NodeKind::Element.can_contain(NodeKind::Text));
        assert!(NodeKind::DocumentFragment.can_contain(NodeKind::Element));
        assert!(NodeKind::Document.can_contain(NodeKind::DocumentType));
        assert!(!NodeKind::Document.can_contain(NodeKind::CDataSection));
        assert!(!NodeKind::Element.can_contain(NodeKind::Attribute));
        assert!(!NodeKind::Element.can_contain(NodeKind::Document));
        assert!(!NodeKind::Text.can_contain(NodeKind::Text));
    }

    #[test]
    fn test_fixed_names() {
        assert_eq!(NodeKind::Text.fixed_name(), Some("#text"));
        assert_eq!(NodeKind::Element.fixed_name(), None);
    }

    #[test]
    fn test_new_node_is_detached() {
        let node = Node::new(NodeData::Text("hi".into()));
        assert_eq!(node.kind(), NodeKind::Text);
        assert!(node.parent().is_none());
        assert!(node.next_sibling().is_none());
        assert_eq!(node.character_data(), Some("hi"));
        assert!(node.annotations().is_empty());
    }

    #[test]
    fn test_duplicate_leaf_skips_elements() {
        let pi = NodeData::ProcessingInstruction {
            target: "xml-stylesheet".into(),
            data: "href=a.css".into(),
            type_tag: None,
        };
        assert_eq!(pi.duplicate_leaf().map(|d| d.kind()), Some(NodeKind::ProcessingInstruction));
        assert!(NodeData::Document.duplicate_leaf().is_none());
    }
}
