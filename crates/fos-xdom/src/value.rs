//! Attribute Values
//!
//! Every attribute holds a [`DomValue`]. The value converts raw input into
//! its own representation and exposes a canonical string; change detection
//! compares canonical strings. Which value type an attribute gets is decided
//! by the document's node definitions through a [`ValueFactory`].

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::error::{DomError, DomResult};
use crate::token_list::TokenList;
use crate::NodeId;

/// Typed attribute value
pub trait DomValue: fmt::Debug {
    /// Canonical string form
    fn text(&self) -> String;

    /// Convert and store raw input
    fn set_text(&mut self, raw: &str) -> DomResult<()>;

    /// Values that refuse every assignment
    fn is_read_only(&self) -> bool {
        false
    }

    /// Identifier values feed the document's id map
    fn is_id(&self) -> bool {
        false
    }

    /// Called when the value is bound to an attribute node
    fn attached(&mut self, _attribute: NodeId) {}

    fn clone_value(&self) -> Box<dyn DomValue>;

    fn as_any(&self) -> &dyn Any;
}

/// Plain string value (the default)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringValue(String);

impl StringValue {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

impl DomValue for StringValue {
    fn text(&self) -> String {
        self.0.clone()
    }

    fn set_text(&mut self, raw: &str) -> DomResult<()> {
        raw.clone_into(&mut self.0);
        Ok(())
    }

    fn clone_value(&self) -> Box<dyn DomValue> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Element identifier; surrounding whitespace is not significant
#[derive(Debug, Clone, Default)]
pub struct IdValue {
    id: String,
    attribute: Option<NodeId>,
}

impl IdValue {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Attribute node this value is bound to (relation only)
    pub fn attribute(&self) -> Option<NodeId> {
        self.attribute
    }
}

impl DomValue for IdValue {
    fn text(&self) -> String {
        self.id.clone()
    }

    fn set_text(&mut self, raw: &str) -> DomResult<()> {
        raw.trim().clone_into(&mut self.id);
        Ok(())
    }

    fn is_id(&self) -> bool {
        true
    }

    fn attached(&mut self, attribute: NodeId) {
        self.attribute = Some(attribute);
    }

    fn clone_value(&self) -> Box<dyn DomValue> {
        Box::new(Self {
            id: self.id.clone(),
            attribute: None,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Token set value; canonical form joins tokens with single spaces
#[derive(Debug, Clone, Default)]
pub struct TokenListValue(TokenList);

impl TokenListValue {
    pub fn tokens(&self) -> &TokenList {
        &self.0
    }
}

impl DomValue for TokenListValue {
    fn text(&self) -> String {
        self.0.value()
    }

    fn set_text(&mut self, raw: &str) -> DomResult<()> {
        self.0 = TokenList::parse(raw);
        Ok(())
    }

    fn clone_value(&self) -> Box<dyn DomValue> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Signed integer; the empty string clears it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegerValue(Option<i64>);

impl IntegerValue {
    pub fn get(&self) -> Option<i64> {
        self.0
    }
}

impl DomValue for IntegerValue {
    fn text(&self) -> String {
        self.0.map(|v| v.to_string()).unwrap_or_default()
    }

    fn set_text(&mut self, raw: &str) -> DomResult<()> {
        let raw = raw.trim();
        if raw.is_empty() {
            self.0 = None;
            return Ok(());
        }
        let parsed = raw.parse::<i64>().map_err(|e| DomError::InvalidValue {
            value: raw.to_string(),
            reason: e.to_string(),
        })?;
        self.0 = Some(parsed);
        Ok(())
    }

    fn clone_value(&self) -> Box<dyn DomValue> {
        Box::new(*self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Read-only value fixed at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedValue(String);

impl FixedValue {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

impl DomValue for FixedValue {
    fn text(&self) -> String {
        self.0.clone()
    }

    fn set_text(&mut self, _raw: &str) -> DomResult<()> {
        Err(DomError::read_only(format!("value {:?} cannot be assigned", self.0)))
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn clone_value(&self) -> Box<dyn DomValue> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Constructor for the value type bound to an attribute name
#[derive(Clone)]
pub struct ValueFactory {
    label: &'static str,
    create: Rc<dyn Fn() -> Box<dyn DomValue>>,
}

impl ValueFactory {
    pub fn new(label: &'static str, create: impl Fn() -> Box<dyn DomValue> + 'static) -> Self {
        Self {
            label,
            create: Rc::new(create),
        }
    }

    pub fn string() -> Self {
        Self::new("string", || Box::new(StringValue::default()))
    }

    pub fn id() -> Self {
        Self::new("id", || Box::new(IdValue::default()))
    }

    pub fn tokens() -> Self {
        Self::new("tokens", || Box::new(TokenListValue::default()))
    }

    pub fn integer() -> Self {
        Self::new("integer", || Box::new(IntegerValue::default()))
    }

    pub fn create(&self) -> Box<dyn DomValue> {
        (self.create)()
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl fmt::Debug for ValueFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueFactory").field(&self.label).finish()
    }
}
