//! Node Definitions
//!
//! Optional per-document schema: binds element names to a native type tag,
//! whitespace handling and emptiness flags, attribute names to a value
//! factory, and processing-instruction targets to a type tag. A sealed
//! definition set rejects every further change with `ReadOnly`.

use std::collections::HashMap;

use crate::error::{DomError, DomResult};
use crate::name::{IntoQualifiedName, QualifiedName};
use crate::provider::{TypeProvider, TypeTag};
use crate::value::ValueFactory;

/// How an element treats whitespace-only character data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhitespaceMode {
    /// Keep text exactly as written
    #[default]
    Preserve,
    /// Collapse runs of whitespace to a single space
    Normalize,
    /// Drop whitespace-only text nodes
    Trim,
}

impl WhitespaceMode {
    /// Apply the mode to a run of character data; `None` means drop it
    pub fn apply(self, text: &str) -> Option<String> {
        match self {
            Self::Preserve => Some(text.to_string()),
            Self::Normalize => {
                let mut out = String::with_capacity(text.len());
                let mut in_space = false;
                for c in text.chars() {
                    if c.is_whitespace() {
                        if !in_space {
                            out.push(' ');
                        }
                        in_space = true;
                    } else {
                        out.push(c);
                        in_space = false;
                    }
                }
                Some(out)
            }
            Self::Trim => {
                if text.trim().is_empty() {
                    None
                } else {
                    Some(text.to_string())
                }
            }
        }
    }
}

/// Schema entry for an element name
#[derive(Debug, Clone, Default)]
pub struct ElementDefinition {
    pub type_tag: Option<TypeTag>,
    pub whitespace: Option<WhitespaceMode>,
    /// Element never has content (e.g. `<br>`)
    pub is_empty: bool,
    /// Writers may emit `<x/>` when there is no content
    pub self_closing: bool,
}

impl ElementDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, tag: &str) -> Self {
        self.type_tag = Some(TypeTag::new(tag));
        self
    }

    pub fn with_whitespace(mut self, mode: WhitespaceMode) -> Self {
        self.whitespace = Some(mode);
        self
    }

    pub fn empty(mut self) -> Self {
        self.is_empty = true;
        self.self_closing = true;
        self
    }

    pub fn self_closing(mut self) -> Self {
        self.self_closing = true;
        self
    }
}

/// Schema entry for an attribute name
#[derive(Debug, Clone)]
pub struct AttributeDefinition {
    pub value_factory: ValueFactory,
}

/// Name-keyed schema bindings for one document
#[derive(Debug, Clone, Default)]
pub struct NodeDefinitions {
    elements: HashMap<QualifiedName, ElementDefinition>,
    attributes: HashMap<QualifiedName, AttributeDefinition>,
    processing_instructions: HashMap<String, TypeTag>,
    sealed: bool,
}

impl NodeDefinitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define_element(
        &mut self,
        name: impl IntoQualifiedName,
        definition: ElementDefinition,
    ) -> DomResult<()> {
        let name = name.into_qualified_name()?;
        self.check_writable()?;
        self.elements.insert(name, definition);
        Ok(())
    }

    pub fn define_attribute(
        &mut self,
        name: impl IntoQualifiedName,
        value_factory: ValueFactory,
    ) -> DomResult<()> {
        let name = name.into_qualified_name()?;
        self.check_writable()?;
        self.attributes.insert(name, AttributeDefinition { value_factory });
        Ok(())
    }

    pub fn define_processing_instruction(&mut self, target: &str, tag: &str) -> DomResult<()> {
        if target.trim().is_empty() {
            return Err(DomError::InvalidArgument("target must not be empty".into()));
        }
        self.check_writable()?;
        self.processing_instructions
            .insert(target.to_string(), TypeTag::new(tag));
        Ok(())
    }

    pub fn remove_element(&mut self, name: &QualifiedName) -> DomResult<Option<ElementDefinition>> {
        self.check_writable()?;
        Ok(self.elements.remove(name))
    }

    pub fn remove_attribute(
        &mut self,
        name: &QualifiedName,
    ) -> DomResult<Option<AttributeDefinition>> {
        self.check_writable()?;
        Ok(self.attributes.remove(name))
    }

    pub fn element(&self, name: &QualifiedName) -> Option<&ElementDefinition> {
        self.elements.get(name)
    }

    pub fn attribute(&self, name: &QualifiedName) -> Option<&AttributeDefinition> {
        self.attributes.get(name)
    }

    /// Make the set read-only; idempotent
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn len(&self) -> usize {
        self.elements.len() + self.attributes.len() + self.processing_instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_writable(&self) -> DomResult<()> {
        if self.sealed {
            Err(DomError::read_only("node definitions are sealed"))
        } else {
            Ok(())
        }
    }
}

impl TypeProvider for NodeDefinitions {
    fn element_type(&self, name: &QualifiedName) -> Option<TypeTag> {
        self.elements.get(name).and_then(|d| d.type_tag.clone())
    }

    fn element_name(&self, tag: &TypeTag) -> Option<QualifiedName> {
        self.elements
            .iter()
            .find(|(_, d)| d.type_tag.as_ref() == Some(tag))
            .map(|(name, _)| name.clone())
    }

    fn processing_instruction_type(&self, target: &str) -> Option<TypeTag> {
        self.processing_instructions.get(target).cloned()
    }

    fn processing_instruction_target(&self, tag: &TypeTag) -> Option<String> {
        self.processing_instructions
            .iter()
            .find(|(_, t)| *t == tag)
            .map(|(target, _)| target.clone())
    }
}
