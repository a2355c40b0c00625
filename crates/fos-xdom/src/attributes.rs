//! Element attributes
//!
//! Attributes are arena nodes owned by at most one element. Writing goes
//! through the attribute's [`DomValue`]: the raw input is converted on a
//! copy of the current value, and only a different canonical string is
//! installed, indexed and reported.

use crate::document::Document;
use crate::error::{DomError, DomResult};
use crate::events::DomEvent;
use crate::index::IndexedValue;
use crate::name::{IntoQualifiedName, QualifiedName};
use crate::node::Node;
use crate::token_list::TokenList;
use crate::value::DomValue;
use crate::NodeId;

const CLASS: &str = "class";

impl Document {
    /// Attribute nodes of `element`, in order
    pub fn attributes(&self, element: NodeId) -> DomResult<&[NodeId]> {
        Ok(&self.element_data(element)?.attributes)
    }

    /// Attribute node named `name`
    pub fn attribute_node(
        &self,
        element: NodeId,
        name: impl IntoQualifiedName,
    ) -> DomResult<Option<NodeId>> {
        let name = name.into_qualified_name()?;
        self.find_attribute(element, &name)
    }

    /// Canonical value of the attribute, if present
    pub fn get_attribute(
        &self,
        element: NodeId,
        name: impl IntoQualifiedName,
    ) -> DomResult<Option<String>> {
        let name = name.into_qualified_name()?;
        Ok(self
            .find_attribute(element, &name)?
            .and_then(|attr| self.get(attr))
            .and_then(Node::as_attribute)
            .map(|a| a.value.text()))
    }

    pub fn has_attribute(&self, element: NodeId, name: impl IntoQualifiedName) -> DomResult<bool> {
        let name = name.into_qualified_name()?;
        Ok(self.find_attribute(element, &name)?.is_some())
    }

    /// Typed value held by an attribute node
    pub fn attribute_value(&self, attribute: NodeId) -> DomResult<&dyn DomValue> {
        Ok(self.attribute_data(attribute)?.value.as_ref())
    }

    /// Element owning an attribute node
    pub fn owner_element(&self, attribute: NodeId) -> Option<NodeId> {
        self.get(attribute)?.as_attribute()?.owner
    }

    /// Set `name` on `element` from raw text
    ///
    /// Creates the attribute with the value type bound to `name` when it
    /// does not exist yet. Setting the current canonical value is a no-op.
    pub fn set_attribute(
        &mut self,
        element: NodeId,
        name: impl IntoQualifiedName,
        value: &str,
    ) -> DomResult<()> {
        let name = name.into_qualified_name()?;
        if let Some(attr) = self.find_attribute(element, &name)? {
            return self.set_attribute_value(attr, value);
        }

        let mut typed = self.value_factory_for(&name).create();
        typed.set_text(value)?;
        let new = IndexedValue::of(typed.as_ref());

        let attr = self.push_attribute(name.clone(), typed, Some(element));
        if let Some(data) = self.get_mut(element).and_then(Node::as_element_mut) {
            data.attributes.push(attr);
        }
        if self.is_connected(element) {
            self.reindex(element, &name, None, Some(&new));
        }
        self.finish_mutation(vec![DomEvent::attribute_changed(element, name, None)])
    }

    /// Assign raw text to an attribute node, owned or not
    pub fn set_attribute_value(&mut self, attribute: NodeId, value: &str) -> DomResult<()> {
        let data = self.attribute_data(attribute)?;
        if data.value.is_read_only() {
            return Err(DomError::read_only(format!(
                "attribute {} is read-only",
                data.name
            )));
        }

        let old = IndexedValue::of(data.value.as_ref());
        let mut typed = data.value.clone_value();
        typed.set_text(value)?;
        let new = IndexedValue::of(typed.as_ref());
        if old.text == new.text {
            return Ok(());
        }

        let name = data.name.clone();
        let owner = data.owner;
        typed.attached(attribute);
        if let Some(data) = self.get_mut(attribute).and_then(Node::as_attribute_mut) {
            data.value = typed;
        }

        match owner {
            Some(element) => {
                if self.is_connected(element) {
                    self.reindex(element, &name, Some(&old), Some(&new));
                }
                self.finish_mutation(vec![DomEvent::attribute_changed(
                    element,
                    name,
                    Some(old.text),
                )])
            }
            None => {
                self.touch();
                Ok(())
            }
        }
    }

    /// Remove `name` from `element`; returns whether it was present
    pub fn remove_attribute(&mut self, element: NodeId, name: impl IntoQualifiedName) -> DomResult<bool> {
        let name = name.into_qualified_name()?;
        let Some(attr) = self.find_attribute(element, &name)? else {
            return Ok(false);
        };

        let old = IndexedValue::of(self.attribute_data(attr)?.value.as_ref());
        if let Some(data) = self.get_mut(element).and_then(Node::as_element_mut) {
            data.attributes.retain(|&a| a != attr);
        }
        if let Some(data) = self.get_mut(attr).and_then(Node::as_attribute_mut) {
            data.owner = None;
        }
        if self.is_connected(element) {
            self.reindex(element, &name, Some(&old), None);
        }
        self.finish_mutation(vec![DomEvent::attribute_changed(element, name, Some(old.text))])?;
        Ok(true)
    }

    /// Add `name` when absent, remove it when present; `force` pins the
    /// outcome. Returns whether the attribute is present afterwards
    pub fn toggle_attribute(
        &mut self,
        element: NodeId,
        name: impl IntoQualifiedName,
        force: Option<bool>,
    ) -> DomResult<bool> {
        let name = name.into_qualified_name()?;
        let present = self.find_attribute(element, &name)?.is_some();
        match (present, force) {
            (true, Some(true)) => Ok(true),
            (true, _) => {
                self.remove_attribute(element, name)?;
                Ok(false)
            }
            (false, Some(false)) => Ok(false),
            (false, _) => {
                self.set_attribute(element, name, "")?;
                Ok(true)
            }
        }
    }

    /// Attach a detached attribute node, replacing any attribute with the
    /// same name; returns the replaced node
    pub fn set_attribute_node(&mut self, element: NodeId, attribute: NodeId) -> DomResult<Option<NodeId>> {
        self.element_data(element)?;
        let data = self.attribute_data(attribute)?;
        match data.owner {
            Some(owner) if owner == element => return Ok(None),
            Some(_) => return Err(DomError::InUse),
            None => {}
        }

        let name = data.name.clone();
        let new = IndexedValue::of(data.value.as_ref());
        let replaced = self.find_attribute(element, &name)?;
        let old = match replaced {
            Some(r) => Some(IndexedValue::of(self.attribute_data(r)?.value.as_ref())),
            None => None,
        };

        if let Some(data) = self.get_mut(element).and_then(Node::as_element_mut) {
            match replaced.and_then(|r| data.attributes.iter().position(|&a| a == r)) {
                Some(position) => data.attributes[position] = attribute,
                None => data.attributes.push(attribute),
            }
        }
        if let Some(r) = replaced {
            if let Some(data) = self.get_mut(r).and_then(Node::as_attribute_mut) {
                data.owner = None;
            }
        }
        if let Some(data) = self.get_mut(attribute).and_then(Node::as_attribute_mut) {
            data.owner = Some(element);
        }

        if self.is_connected(element) {
            self.reindex(element, &name, old.as_ref(), Some(&new));
        }

        let changed = old.as_ref().is_none_or(|o| o.text != new.text);
        let events = if changed {
            vec![DomEvent::attribute_changed(element, name, old.map(|o| o.text))]
        } else {
            Vec::new()
        };
        self.finish_mutation(events)?;
        Ok(replaced)
    }

    // ------------------------------------------------------------------
    // Class list
    // ------------------------------------------------------------------

    /// Parsed `class` attribute
    pub fn class_list(&self, element: NodeId) -> DomResult<TokenList> {
        Ok(TokenList::parse(
            &self.get_attribute(element, CLASS)?.unwrap_or_default(),
        ))
    }

    pub fn has_class(&self, element: NodeId, token: &str) -> DomResult<bool> {
        Ok(self.class_list(element)?.contains(token))
    }

    pub fn add_class(&mut self, element: NodeId, tokens: &[&str]) -> DomResult<()> {
        let mut list = self.class_list(element)?;
        if list.add(tokens) {
            self.set_attribute(element, CLASS, &list.value())?;
        }
        Ok(())
    }

    pub fn remove_class(&mut self, element: NodeId, tokens: &[&str]) -> DomResult<()> {
        let mut list = self.class_list(element)?;
        if list.remove(tokens) {
            self.set_attribute(element, CLASS, &list.value())?;
        }
        Ok(())
    }

    /// Returns whether the token is present afterwards
    pub fn toggle_class(&mut self, element: NodeId, token: &str, force: Option<bool>) -> DomResult<bool> {
        let mut list = self.class_list(element)?;
        let before = list.value();
        let present = list.toggle(token, force);
        let after = list.value();
        if after != before {
            self.set_attribute(element, CLASS, &after)?;
        }
        Ok(present)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn find_attribute(&self, element: NodeId, name: &QualifiedName) -> DomResult<Option<NodeId>> {
        let data = self.element_data(element)?;
        Ok(data.attributes.iter().copied().find(|&attr| {
            self.get(attr)
                .and_then(Node::as_attribute)
                .is_some_and(|a| a.name == *name)
        }))
    }

    /// Every attribute of `element` as the indexes see it
    pub(crate) fn indexed_attributes(&self, element: NodeId) -> Vec<(QualifiedName, IndexedValue)> {
        let Ok(data) = self.element_data(element) else {
            return Vec::new();
        };
        data.attributes
            .iter()
            .filter_map(|&attr| self.get(attr).and_then(Node::as_attribute))
            .map(|a| (a.name.clone(), IndexedValue::of(a.value.as_ref())))
            .collect()
    }
}
