//! Type Providers
//!
//! Map element names and processing-instruction targets to native type
//! tags and back. Providers chain: the first one with an answer wins.

use std::fmt;
use std::rc::Rc;

use crate::name::QualifiedName;

/// Identifier of a native node type (e.g. `"html.anchor"`)
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TypeTag(Rc<str>);

impl TypeTag {
    pub fn new(tag: &str) -> Self {
        Self(Rc::from(tag))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({})", self.0)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name <-> native type resolution
pub trait TypeProvider {
    fn element_type(&self, name: &QualifiedName) -> Option<TypeTag>;

    fn element_name(&self, tag: &TypeTag) -> Option<QualifiedName>;

    fn processing_instruction_type(&self, target: &str) -> Option<TypeTag>;

    fn processing_instruction_target(&self, tag: &TypeTag) -> Option<String>;
}

/// Provider that never answers
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTypeProvider;

impl TypeProvider for NullTypeProvider {
    fn element_type(&self, _name: &QualifiedName) -> Option<TypeTag> {
        None
    }

    fn element_name(&self, _tag: &TypeTag) -> Option<QualifiedName> {
        None
    }

    fn processing_instruction_type(&self, _target: &str) -> Option<TypeTag> {
        None
    }

    fn processing_instruction_target(&self, _tag: &TypeTag) -> Option<String> {
        None
    }
}

/// Ordered chain of providers; first non-empty answer wins
#[derive(Clone, Default)]
pub struct CompositeTypeProvider {
    providers: Vec<Rc<dyn TypeProvider>>,
}

impl CompositeTypeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, provider: Rc<dyn TypeProvider>) {
        self.providers.push(provider);
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    fn first<T>(&self, ask: impl Fn(&dyn TypeProvider) -> Option<T>) -> Option<T> {
        self.providers.iter().find_map(|p| ask(p.as_ref()))
    }
}

impl TypeProvider for CompositeTypeProvider {
    fn element_type(&self, name: &QualifiedName) -> Option<TypeTag> {
        self.first(|p| p.element_type(name))
    }

    fn element_name(&self, tag: &TypeTag) -> Option<QualifiedName> {
        self.first(|p| p.element_name(tag))
    }

    fn processing_instruction_type(&self, target: &str) -> Option<TypeTag> {
        self.first(|p| p.processing_instruction_type(target))
    }

    fn processing_instruction_target(&self, tag: &TypeTag) -> Option<String> {
        self.first(|p| p.processing_instruction_target(tag))
    }
}

impl fmt::Debug for CompositeTypeProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeTypeProvider")
            .field("providers", &self.providers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        local: &'static str,
        tag: &'static str,
    }

    impl TypeProvider for Fixed {
        fn element_type(&self, name: &QualifiedName) -> Option<TypeTag> {
            (name.local_name() == self.local).then(|| TypeTag::new(self.tag))
        }

        fn element_name(&self, tag: &TypeTag) -> Option<QualifiedName> {
            (tag.as_str() == self.tag).then(|| QualifiedName::new(self.local).ok()).flatten()
        }

        fn processing_instruction_type(&self, _target: &str) -> Option<TypeTag> {
            None
        }

        fn processing_instruction_target(&self, _tag: &TypeTag) -> Option<String> {
            None
        }
    }

    #[test]
    fn test_first_answer_wins() {
        let mut chain = CompositeTypeProvider::new();
        chain.push(Rc::new(NullTypeProvider));
        chain.push(Rc::new(Fixed { local: "a", tag: "first" }));
        chain.push(Rc::new(Fixed { local: "a", tag: "second" }));

        let name = QualifiedName::new("a").unwrap();
        assert_eq!(chain.element_type(&name), Some(TypeTag::new("first")));
        assert_eq!(chain.element_name(&TypeTag::new("second")), Some(name));
    }

    #[test]
    fn test_empty_chain_answers_none() {
        let chain = CompositeTypeProvider::new();
        assert!(chain.is_empty());
        assert!(chain.processing_instruction_type("xml-stylesheet").is_none());
    }
}
