//! fOS XDOM - Mutable markup document object model
//!
//! Arena-backed DOM for XML/HTML-like trees: node creation, tree mutation,
//! schema-typed attributes, attribute-value indexes kept consistent with
//! every mutation, scoped mutation observers, and writer sinks.
//!
//! # Example
//! ```rust
//! use fos_xdom::{Document, ElementIndex, ObservedEvents, ObserverScope};
//!
//! let mut doc = Document::new();
//! let classes = doc.add_index(ElementIndex::by_tokens("class").unwrap());
//!
//! let root = doc.create_element("html").unwrap();
//! doc.append_child(doc.root(), root).unwrap();
//! let item = doc.create_element("li").unwrap();
//! doc.set_attribute(item, "class", "menu active").unwrap();
//! doc.append_child(root, item).unwrap();
//!
//! let index = doc.index(classes).unwrap();
//! assert_eq!(index.elements(&"active".to_string()), vec![item]);
//!
//! let _observer = doc
//!     .observe(root, ObserverScope::SelfAndDescendants, ObservedEvents::Any, |_, event| {
//!         println!("{:?}", event);
//!         Ok(())
//!     })
//!     .unwrap();
//! ```

mod annotations;
mod attributes;
mod config;
mod document;
mod error;
mod events;
mod factory;
mod frugal;
mod index;
mod name;
mod node;
mod observer;
mod provider;
mod schema;
mod selector;
mod token_list;
mod tree;
mod value;
mod writer;

pub use annotations::AnnotationStore;
pub use config::DomSettings;
pub use document::{Document, Generation};
pub use error::{AggregateError, DomError, DomResult, ObserverError};
pub use events::{AttributeEvent, ChildChange, DomEvent, MutationEvent};
pub use factory::{DocumentNodeFactory, NodeFactory, NullNodeFactory};
pub use frugal::{FrugalIter, FrugalList};
pub use index::{ElementIndex, IndexHandle};
pub use name::{IntoQualifiedName, NameTable, QualifiedName, XML_NAMESPACE, XMLNS_NAMESPACE};
pub use node::{AttributeData, ElementData, Node, NodeData, NodeKind};
pub use observer::{compose, ObservedEvents, Observer, ObserverCallback, ObserverScope};
pub use provider::{CompositeTypeProvider, NullTypeProvider, TypeProvider, TypeTag};
pub use schema::{AttributeDefinition, ElementDefinition, NodeDefinitions, WhitespaceMode};
pub use selector::{ElementCollection, Selector};
pub use token_list::TokenList;
pub use tree::{Ancestors, Children, Descendants};
pub use value::{
    DomValue, FixedValue, IdValue, IntegerValue, StringValue, TokenListValue, ValueFactory,
};
pub use writer::{CompositeWriter, DomWriter, NullWriter, TextWriter, WriteState, WriteStateTracker};

/// Node handle: owning document serial plus arena slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    document: u32,
    slot: u32,
}

impl NodeId {
    pub(crate) const fn new(document: u32, slot: u32) -> Self {
        Self { document, slot }
    }

    /// Arena slot within the owning document
    #[inline]
    pub fn slot(self) -> usize {
        self.slot as usize
    }

    /// Serial of the owning document
    #[inline]
    pub fn document_serial(self) -> u32 {
        self.document
    }
}
