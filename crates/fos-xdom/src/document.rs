//! Document - Node arena, factory and owner of indexes and observers
//!
//! A document owns every node created through it. Handles carry the serial
//! of the document that created them; using a handle with another document
//! fails with `WrongDocument` instead of aliasing an unrelated slot.

use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::annotations::AnnotationStore;
use crate::config::DomSettings;
use crate::error::{DomError, DomResult};
use crate::frugal::FrugalList;
use crate::index::{ElementIndex, IndexMaintainer};
use crate::name::{IntoQualifiedName, NameTable, QualifiedName, XML_NAMESPACE};
use crate::node::{AttributeData, ElementData, Node, NodeData, NodeKind};
use crate::observer::Registration;
use crate::provider::{CompositeTypeProvider, TypeProvider, TypeTag};
use crate::schema::{NodeDefinitions, WhitespaceMode};
use crate::value::{DomValue, ValueFactory};
use crate::NodeId;

static NEXT_DOCUMENT: AtomicU32 = AtomicU32::new(1);

/// Mutation counter; bumped by every structural or attribute change
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Generation(u64);

impl Generation {
    /// Initial generation (never mutated)
    pub const INITIAL: Self = Generation(0);

    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }
}

/// Markup document
pub struct Document {
    serial: u32,
    nodes: Vec<Node>,
    root: NodeId,
    names: NameTable,
    settings: DomSettings,
    definitions: Rc<NodeDefinitions>,
    types: CompositeTypeProvider,
    pub(crate) indexes: Vec<Option<Box<dyn IndexMaintainer>>>,
    pub(crate) ids: ElementIndex<String>,
    pub(crate) observers: FrugalList<Rc<Registration>>,
    pub(crate) next_observer: u64,
    generation: Generation,
}

impl Document {
    /// Empty document with default settings and no definitions
    pub fn new() -> Self {
        Self::configured(DomSettings::default(), NodeDefinitions::new())
    }

    /// Empty document with explicit settings
    pub fn with_settings(settings: DomSettings) -> Self {
        Self::configured(settings, NodeDefinitions::new())
    }

    /// Empty document using `definitions` for value and type lookup
    pub fn with_definitions(definitions: NodeDefinitions) -> Self {
        Self::configured(DomSettings::default(), definitions)
    }

    /// Document bound to `settings` and `definitions`; both are sealed
    pub fn configured(mut settings: DomSettings, mut definitions: NodeDefinitions) -> Self {
        settings.seal();
        definitions.seal();

        let serial = NEXT_DOCUMENT.fetch_add(1, Ordering::Relaxed);
        let definitions = Rc::new(definitions);
        let mut types = CompositeTypeProvider::new();
        types.push(Rc::clone(&definitions) as Rc<dyn TypeProvider>);

        tracing::debug!(serial, definitions = definitions.len(), "Creating document");

        Self {
            serial,
            nodes: vec![Node::new(NodeData::Document)],
            root: NodeId::new(serial, 0),
            names: NameTable::new(),
            settings,
            definitions,
            types,
            indexes: Vec::new(),
            ids: ElementIndex::identifiers(),
            observers: FrugalList::new(),
            next_observer: 0,
            generation: Generation::INITIAL,
        }
    }

    /// The document node
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Serial that ties node handles to this document
    pub fn serial(&self) -> u32 {
        self.serial
    }

    /// Document settings
    pub fn settings(&self) -> &DomSettings {
        &self.settings
    }

    /// Node definitions
    pub fn definitions(&self) -> &NodeDefinitions {
        &self.definitions
    }

    /// Current mutation generation
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Number of arena slots (every node ever created, attached or not)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document node has no children
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Append a provider consulted after the document's own definitions
    pub fn add_type_provider(&mut self, provider: Rc<dyn TypeProvider>) {
        self.types.push(provider);
    }

    /// Type providers consulted at node creation
    pub fn type_provider(&self) -> &CompositeTypeProvider {
        &self.types
    }

    // ------------------------------------------------------------------
    // Arena access
    // ------------------------------------------------------------------

    /// Borrow a node, validating that the handle belongs to this document
    pub fn node(&self, id: NodeId) -> DomResult<&Node> {
        if id.document_serial() != self.serial {
            return Err(DomError::WrongDocument);
        }
        self.nodes
            .get(id.slot())
            .ok_or_else(|| DomError::not_found(format!("node {:?}", id)))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        if id.document_serial() != self.serial {
            return Err(DomError::WrongDocument);
        }
        self.nodes
            .get_mut(id.slot())
            .ok_or_else(|| DomError::not_found(format!("node {:?}", id)))
    }

    /// Lenient lookup used by navigation; foreign handles read as absent
    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> Option<&Node> {
        if id.document_serial() != self.serial {
            return None;
        }
        self.nodes.get(id.slot())
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.document_serial() != self.serial {
            return None;
        }
        self.nodes.get_mut(id.slot())
    }

    /// Kind of a node
    pub fn kind(&self, id: NodeId) -> DomResult<NodeKind> {
        Ok(self.node(id)?.kind())
    }

    pub(crate) fn kind_of(&self, id: NodeId) -> Option<NodeKind> {
        self.get(id).map(Node::kind)
    }

    pub(crate) fn push_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId::new(self.serial, self.nodes.len() as u32);
        self.nodes.push(Node::new(data));
        id
    }

    pub(crate) fn touch(&mut self) {
        self.generation = self.generation.next();
    }

    pub(crate) fn element_data(&self, id: NodeId) -> DomResult<&ElementData> {
        self.node(id)?
            .as_element()
            .ok_or_else(|| DomError::InvalidArgument(format!("{:?} is not an element", id)))
    }

    pub(crate) fn attribute_data(&self, id: NodeId) -> DomResult<&AttributeData> {
        self.node(id)?
            .as_attribute()
            .ok_or_else(|| DomError::InvalidArgument(format!("{:?} is not an attribute", id)))
    }

    // ------------------------------------------------------------------
    // Node factory
    // ------------------------------------------------------------------

    /// Detached element named `name`
    pub fn create_element(&mut self, name: impl IntoQualifiedName) -> DomResult<NodeId> {
        let name = name.into_qualified_name()?;
        let name = self.names.intern_name(&name);
        let type_tag = self.types.element_type(&name);
        Ok(self.push_node(NodeData::Element(ElementData {
            name,
            attributes: Vec::new(),
            type_tag,
        })))
    }

    /// Detached attribute with the value type bound to `name`
    pub fn create_attribute(&mut self, name: impl IntoQualifiedName) -> DomResult<NodeId> {
        let name = name.into_qualified_name()?;
        let value = self.value_factory_for(&name).create();
        Ok(self.push_attribute(name, value, None))
    }

    /// Detached attribute holding an explicit value object
    pub fn create_attribute_with_value(
        &mut self,
        name: impl IntoQualifiedName,
        value: Box<dyn DomValue>,
    ) -> DomResult<NodeId> {
        let name = name.into_qualified_name()?;
        Ok(self.push_attribute(name, value, None))
    }

    pub(crate) fn push_attribute(
        &mut self,
        name: QualifiedName,
        mut value: Box<dyn DomValue>,
        owner: Option<NodeId>,
    ) -> NodeId {
        let name = self.names.intern_name(&name);
        let id = NodeId::new(self.serial, self.nodes.len() as u32);
        value.attached(id);
        self.nodes
            .push(Node::new(NodeData::Attribute(AttributeData { name, value, owner })));
        id
    }

    /// Detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeData::Text(text.to_string()))
    }

    /// Detached CDATA section
    pub fn create_cdata_section(&mut self, text: &str) -> NodeId {
        self.push_node(NodeData::CDataSection(text.to_string()))
    }

    /// Detached comment
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push_node(NodeData::Comment(text.to_string()))
    }

    /// Detached processing instruction
    pub fn create_processing_instruction(&mut self, target: &str, data: &str) -> DomResult<NodeId> {
        if target.trim().is_empty() {
            return Err(DomError::InvalidArgument(
                "processing instruction target must not be empty".into(),
            ));
        }
        let type_tag = self.types.processing_instruction_type(target);
        Ok(self.push_node(NodeData::ProcessingInstruction {
            target: target.to_string(),
            data: data.to_string(),
            type_tag,
        }))
    }

    /// Detached document type node
    pub fn create_document_type(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> DomResult<NodeId> {
        Self::require_name(name, "document type")?;
        Ok(self.push_node(NodeData::DocumentType {
            name: name.to_string(),
            public_id: public_id.map(str::to_string),
            system_id: system_id.map(str::to_string),
        }))
    }

    /// Detached entity declaration
    pub fn create_entity(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
        notation_name: Option<&str>,
    ) -> DomResult<NodeId> {
        Self::require_name(name, "entity")?;
        Ok(self.push_node(NodeData::Entity {
            name: name.to_string(),
            public_id: public_id.map(str::to_string),
            system_id: system_id.map(str::to_string),
            notation_name: notation_name.map(str::to_string),
        }))
    }

    /// Detached entity reference
    pub fn create_entity_reference(&mut self, name: &str) -> DomResult<NodeId> {
        Self::require_name(name, "entity reference")?;
        Ok(self.push_node(NodeData::EntityReference {
            name: name.to_string(),
        }))
    }

    /// Detached notation declaration
    pub fn create_notation(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> DomResult<NodeId> {
        Self::require_name(name, "notation")?;
        Ok(self.push_node(NodeData::Notation {
            name: name.to_string(),
            public_id: public_id.map(str::to_string),
            system_id: system_id.map(str::to_string),
        }))
    }

    /// Empty document fragment
    pub fn create_document_fragment(&mut self) -> NodeId {
        self.push_node(NodeData::DocumentFragment)
    }

    fn require_name(name: &str, what: &str) -> DomResult<()> {
        if name.trim().is_empty() {
            Err(DomError::InvalidArgument(format!("{} name must not be empty", what)))
        } else {
            Ok(())
        }
    }

    // ------------------------------------------------------------------
    // Names and types
    // ------------------------------------------------------------------

    /// Kind-dependent node name (`#text`, `prefix:local`, PI target, ...)
    pub fn node_name(&self, id: NodeId) -> DomResult<String> {
        let node = self.node(id)?;
        if let Some(fixed) = node.kind().fixed_name() {
            return Ok(fixed.to_string());
        }
        Ok(match &node.data {
            NodeData::Element(e) => e.name.display_name(),
            NodeData::Attribute(a) => a.name.display_name(),
            NodeData::ProcessingInstruction { target, .. } => target.clone(),
            NodeData::DocumentType { name, .. }
            | NodeData::Entity { name, .. }
            | NodeData::EntityReference { name }
            | NodeData::Notation { name, .. } => name.clone(),
            _ => String::new(),
        })
    }

    /// Qualified name of an element or attribute
    pub fn name(&self, id: NodeId) -> Option<&QualifiedName> {
        match &self.get(id)?.data {
            NodeData::Element(e) => Some(&e.name),
            NodeData::Attribute(a) => Some(&a.name),
            _ => None,
        }
    }

    /// Native type tag of an element or processing instruction
    pub fn element_type(&self, id: NodeId) -> Option<&TypeTag> {
        match &self.get(id)?.data {
            NodeData::Element(e) => e.type_tag.as_ref(),
            NodeData::ProcessingInstruction { type_tag, .. } => type_tag.as_ref(),
            _ => None,
        }
    }

    /// Value type for an attribute name: explicit binding, implicit
    /// identifier, then plain string
    pub fn value_factory_for(&self, name: &QualifiedName) -> ValueFactory {
        if let Some(definition) = self.definitions.attribute(name) {
            return definition.value_factory.clone();
        }
        if self.settings.implicit_ids()
            && (name.is("id", None) || name.is("id", Some(XML_NAMESPACE)))
        {
            return ValueFactory::id();
        }
        ValueFactory::string()
    }

    /// Whitespace handling for character data inside `element`
    pub fn whitespace_mode(&self, element: NodeId) -> WhitespaceMode {
        self.get(element)
            .and_then(Node::as_element)
            .and_then(|e| self.definitions.element(&e.name))
            .and_then(|d| d.whitespace)
            .unwrap_or_else(|| self.settings.whitespace())
    }

    // ------------------------------------------------------------------
    // Annotations
    // ------------------------------------------------------------------

    /// Annotations attached to a node
    pub fn annotations(&self, id: NodeId) -> DomResult<&AnnotationStore> {
        Ok(&self.node(id)?.annotations)
    }

    /// Mutable annotations of a node
    pub fn annotations_mut(&mut self, id: NodeId) -> DomResult<&mut AnnotationStore> {
        Ok(&mut self.node_mut(id)?.annotations)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("serial", &self.serial)
            .field("nodes", &self.nodes.len())
            .field("indexes", &self.indexes.iter().flatten().count())
            .field("observers", &self.observers.len())
            .field("generation", &self.generation)
            .finish()
    }
}
