//! Node Factory
//!
//! Creation interface for parsers and other tree builders. A `None` result
//! means the factory does not support that node kind here; callers decide
//! whether to skip the node or fail.

use crate::document::Document;
use crate::name::QualifiedName;
use crate::NodeId;

/// Creates nodes inside a document
pub trait NodeFactory {
    fn create_element(&self, doc: &mut Document, name: &QualifiedName) -> Option<NodeId>;

    fn create_attribute(&self, doc: &mut Document, name: &QualifiedName) -> Option<NodeId>;

    fn create_text(&self, doc: &mut Document, text: &str) -> Option<NodeId>;

    fn create_comment(&self, doc: &mut Document, text: &str) -> Option<NodeId>;

    fn create_cdata_section(&self, doc: &mut Document, text: &str) -> Option<NodeId>;

    fn create_processing_instruction(
        &self,
        doc: &mut Document,
        target: &str,
        data: &str,
    ) -> Option<NodeId>;

    fn create_document_type(
        &self,
        doc: &mut Document,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Option<NodeId>;

    fn create_entity_reference(&self, doc: &mut Document, name: &str) -> Option<NodeId>;

    /// Element from a `prefix:local` string
    fn create_element_named(&self, doc: &mut Document, name: &str) -> Option<NodeId> {
        let name = QualifiedName::parse(name, None).ok()?;
        self.create_element(doc, &name)
    }

    /// Attribute from a `prefix:local` string
    fn create_attribute_named(&self, doc: &mut Document, name: &str) -> Option<NodeId> {
        let name = QualifiedName::parse(name, None).ok()?;
        self.create_attribute(doc, &name)
    }
}

/// Supports nothing; every call yields `None`
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNodeFactory;

impl NodeFactory for NullNodeFactory {
    fn create_element(&self, _doc: &mut Document, _name: &QualifiedName) -> Option<NodeId> {
        None
    }

    fn create_attribute(&self, _doc: &mut Document, _name: &QualifiedName) -> Option<NodeId> {
        None
    }

    fn create_text(&self, _doc: &mut Document, _text: &str) -> Option<NodeId> {
        None
    }

    fn create_comment(&self, _doc: &mut Document, _text: &str) -> Option<NodeId> {
        None
    }

    fn create_cdata_section(&self, _doc: &mut Document, _text: &str) -> Option<NodeId> {
        None
    }

    fn create_processing_instruction(
        &self,
        _doc: &mut Document,
        _target: &str,
        _data: &str,
    ) -> Option<NodeId> {
        None
    }

    fn create_document_type(
        &self,
        _doc: &mut Document,
        _name: &str,
        _public_id: Option<&str>,
        _system_id: Option<&str>,
    ) -> Option<NodeId> {
        None
    }

    fn create_entity_reference(&self, _doc: &mut Document, _name: &str) -> Option<NodeId> {
        None
    }
}

/// Creates through the document's own factory methods
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentNodeFactory;

impl NodeFactory for DocumentNodeFactory {
    fn create_element(&self, doc: &mut Document, name: &QualifiedName) -> Option<NodeId> {
        doc.create_element(name).ok()
    }

    fn create_attribute(&self, doc: &mut Document, name: &QualifiedName) -> Option<NodeId> {
        doc.create_attribute(name).ok()
    }

    fn create_text(&self, doc: &mut Document, text: &str) -> Option<NodeId> {
        Some(doc.create_text(text))
    }

    fn create_comment(&self, doc: &mut Document, text: &str) -> Option<NodeId> {
        Some(doc.create_comment(text))
    }

    fn create_cdata_section(&self, doc: &mut Document, text: &str) -> Option<NodeId> {
        Some(doc.create_cdata_section(text))
    }

    fn create_processing_instruction(
        &self,
        doc: &mut Document,
        target: &str,
        data: &str,
    ) -> Option<NodeId> {
        doc.create_processing_instruction(target, data).ok()
    }

    fn create_document_type(
        &self,
        doc: &mut Document,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Option<NodeId> {
        doc.create_document_type(name, public_id, system_id).ok()
    }

    fn create_entity_reference(&self, doc: &mut Document, name: &str) -> Option<NodeId> {
        doc.create_entity_reference(name).ok()
    }
}
