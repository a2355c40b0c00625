//! Tree navigation and mutation
//!
//! Child lists are doubly linked through the arena. Every mutation
//! validates its arguments first, then rewires links and updates the
//! indexes, and only then dispatches the resulting events. A failing
//! observer therefore never leaves the tree or an index half-updated.

use crate::document::Document;
use crate::error::{DomError, DomResult};
use crate::events::DomEvent;
use crate::node::{Node, NodeData, NodeKind};
use crate::NodeId;

/// Children of a node, first to last
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.next_sibling(current);
        Some(current)
    }
}

/// Descendants of a node in document order, excluding the node itself
pub struct Descendants<'a> {
    doc: &'a Document,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.first_child(current).or_else(|| {
            let mut node = current;
            loop {
                if node == self.root {
                    return None;
                }
                if let Some(sibling) = self.doc.next_sibling(node) {
                    return Some(sibling);
                }
                node = self.doc.parent(node)?;
            }
        });
        Some(current)
    }
}

/// Ancestors of a node, parent first
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

impl Document {
    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Parent node, `None` when detached
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    /// First child
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.first_child
    }

    /// Last child
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.last_child
    }

    /// Next sibling
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.next_sibling
    }

    /// Previous sibling
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.prev_sibling
    }

    /// Iterate direct children in order
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.first_child(id),
        }
    }

    /// Iterate the subtree below `id` in document order, excluding `id`
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            root: id,
            next: self.first_child(id),
        }
    }

    /// Iterate ancestors from the parent upward
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// Child at `index`; walks the sibling links
    pub fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.children(parent).nth(index)
    }

    /// Number of direct children
    pub fn child_count(&self, parent: NodeId) -> usize {
        self.children(parent).count()
    }

    /// Whether the node has any child
    pub fn has_children(&self, id: NodeId) -> bool {
        self.first_child(id).is_some()
    }

    /// Position among the parent's children
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).position(|c| c == id)
    }

    /// Whether `ancestor` is a proper ancestor of `node`
    pub fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|a| a == ancestor)
    }

    /// Whether `other` is `node` or one of its descendants
    pub fn contains(&self, node: NodeId, other: NodeId) -> bool {
        node == other || self.is_ancestor_of(node, other)
    }

    /// Topmost ancestor, or the node itself when detached
    pub fn root_of(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// Whether the node hangs off the document node
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.get(id).is_some() && self.root_of(id) == self.root()
    }

    /// The single element child of the document node
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(self.root())
            .find(|&c| self.kind_of(c) == Some(NodeKind::Element))
    }

    /// The document type child of the document node
    pub fn doctype(&self) -> Option<NodeId> {
        self.children(self.root())
            .find(|&c| self.kind_of(c) == Some(NodeKind::DocumentType))
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Insert `node` at position `index` of `parent`'s child list
    pub fn insert_child(&mut self, parent: NodeId, index: usize, node: NodeId) -> DomResult<NodeId> {
        self.validate_insert(parent, node, None)?;
        // Positions count the list as it will be once `node` is detached
        let len = self.children(parent).filter(|&c| c != node).count();
        if index > len {
            return Err(DomError::IndexOutOfRange { index, len });
        }

        let reference = self.children(parent).filter(|&c| c != node).nth(index);
        let mut events = Vec::new();
        self.insert_resolved(parent, node, reference, &mut events);
        self.finish_mutation(events)?;
        Ok(node)
    }

    /// Insert `node` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, node: NodeId) -> DomResult<NodeId> {
        self.insert_before(parent, node, None)
    }

    /// Insert `node` before `reference`, or at the end when `reference` is `None`
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<NodeId> {
        self.validate_insert(parent, node, None)?;
        if let Some(reference) = reference {
            self.node(reference)?;
            if self.parent(reference) != Some(parent) {
                return Err(DomError::not_found("reference node is not a child of parent"));
            }
        }

        let mut events = Vec::new();
        self.insert_resolved(parent, node, reference, &mut events);
        self.finish_mutation(events)?;
        Ok(node)
    }

    /// Detach `node` from `parent`
    pub fn remove_child(&mut self, parent: NodeId, node: NodeId) -> DomResult<NodeId> {
        self.node(parent)?;
        self.node(node)?;
        if self.parent(node) != Some(parent) {
            return Err(DomError::not_found("node is not a child of parent"));
        }

        let mut events = Vec::new();
        self.detach(node, &mut events);
        self.finish_mutation(events)?;
        Ok(node)
    }

    /// Put `new` where `old` is; returns `old`, now detached
    pub fn replace_child(&mut self, parent: NodeId, new: NodeId, old: NodeId) -> DomResult<NodeId> {
        self.node(old)?;
        if self.parent(old) != Some(parent) {
            return Err(DomError::not_found("node to replace is not a child of parent"));
        }
        if new == old {
            return Ok(old);
        }
        self.validate_insert(parent, new, Some(old))?;

        let reference = self.next_sibling(old);
        let mut events = Vec::new();
        self.detach(old, &mut events);
        self.insert_resolved(parent, new, reference, &mut events);
        self.finish_mutation(events)?;
        Ok(old)
    }

    /// Detach `node` from whatever parent it has; no-op when detached
    pub fn remove(&mut self, node: NodeId) -> DomResult<()> {
        self.node(node)?;
        if self.parent(node).is_none() {
            return Ok(());
        }

        let mut events = Vec::new();
        self.detach(node, &mut events);
        self.finish_mutation(events)
    }

    /// Detach every child of `parent`; one removal event for the batch
    pub fn clear_children(&mut self, parent: NodeId) -> DomResult<Vec<NodeId>> {
        self.node(parent)?;
        let removed: Vec<NodeId> = self.children(parent).collect();
        if removed.is_empty() {
            return Ok(removed);
        }

        let connected = self.is_connected(parent);
        for &child in &removed {
            self.unlink(child);
            if connected {
                self.unindex_subtree(child);
            }
        }

        let events = vec![DomEvent::nodes_removed(parent, removed.clone(), None, None)];
        self.finish_mutation(events)?;
        Ok(removed)
    }

    /// Copy `node` (and its subtree when `deep`); the copy is detached
    pub fn clone_node(&mut self, node: NodeId, deep: bool) -> DomResult<NodeId> {
        let copy = self.copy_node(node)?;
        if deep {
            let mut pending = vec![(node, copy)];
            while let Some((source, target)) = pending.pop() {
                let children: Vec<NodeId> = self.children(source).collect();
                for child in children {
                    let child_copy = self.copy_node(child)?;
                    self.link_before(target, child_copy, None);
                    pending.push((child, child_copy));
                }
            }
        }
        Ok(copy)
    }

    /// Concatenated text and CDATA of the subtree, or the node's own value
    pub fn text_content(&self, node: NodeId) -> DomResult<String> {
        let kind = self.kind(node)?;
        if kind.is_container() {
            let mut text = String::new();
            for id in self.descendants(node) {
                if let Some(Node {
                    data: NodeData::Text(s) | NodeData::CDataSection(s),
                    ..
                }) = self.get(id)
                {
                    text.push_str(s);
                }
            }
            return Ok(text);
        }
        Ok(self.node_value(node)?.unwrap_or_default())
    }

    /// Replace the children of a container with one text node, or set the
    /// value of any other node
    pub fn set_text_content(&mut self, node: NodeId, text: &str) -> DomResult<()> {
        let kind = self.kind(node)?;
        if !kind.is_container() {
            return self.set_node_value(node, text);
        }
        if kind == NodeKind::Document {
            return Err(DomError::NotSupported(
                "text content of the document node".into(),
            ));
        }

        let removed: Vec<NodeId> = self.children(node).collect();
        let connected = self.is_connected(node);
        for &child in &removed {
            self.unlink(child);
            if connected {
                self.unindex_subtree(child);
            }
        }

        let mut events = Vec::new();
        if !removed.is_empty() {
            events.push(DomEvent::nodes_removed(node, removed, None, None));
        }
        if !text.is_empty() {
            let child = self.create_text(text);
            self.link_before(node, child, None);
            events.push(DomEvent::nodes_added(node, vec![child], None, None));
        }
        self.finish_mutation(events)
    }

    /// Character data, instruction data or attribute value
    pub fn node_value(&self, node: NodeId) -> DomResult<Option<String>> {
        Ok(match &self.node(node)?.data {
            NodeData::Text(s) | NodeData::CDataSection(s) | NodeData::Comment(s) => Some(s.clone()),
            NodeData::ProcessingInstruction { data, .. } => Some(data.clone()),
            NodeData::Attribute(a) => Some(a.value.text()),
            _ => None,
        })
    }

    /// Set the value of a character data, instruction or attribute node;
    /// ignored for other kinds
    pub fn set_node_value(&mut self, node: NodeId, value: &str) -> DomResult<()> {
        if self.kind(node)? == NodeKind::Attribute {
            return self.set_attribute_value(node, value);
        }
        match &mut self.node_mut(node)?.data {
            NodeData::Text(s) | NodeData::CDataSection(s) | NodeData::Comment(s) => {
                value.clone_into(s);
            }
            NodeData::ProcessingInstruction { data, .. } => {
                value.clone_into(data);
            }
            _ => return Ok(()),
        }
        self.touch();
        Ok(())
    }

    /// Merge adjacent text nodes and drop empty ones throughout the subtree
    pub fn normalize(&mut self, node: NodeId) -> DomResult<()> {
        self.node(node)?;
        let containers: Vec<NodeId> = std::iter::once(node)
            .chain(self.descendants(node))
            .filter(|&id| self.kind_of(id).is_some_and(NodeKind::is_container))
            .collect();

        let mut events = Vec::new();
        for container in containers {
            let children: Vec<NodeId> = self.children(container).collect();
            let mut run_head: Option<NodeId> = None;

            for child in children {
                if self.parent(child) != Some(container) {
                    continue;
                }
                let text = match self.get(child).map(|n| &n.data) {
                    Some(NodeData::Text(s)) => s.clone(),
                    _ => {
                        run_head = None;
                        continue;
                    }
                };

                let merge_into = match run_head {
                    Some(head) if !text.is_empty() => {
                        if let Some(NodeData::Text(s)) = self.get_mut(head).map(|n| &mut n.data) {
                            s.push_str(&text);
                        }
                        Some(head)
                    }
                    _ => None,
                };

                if text.is_empty() || merge_into.is_some() {
                    self.detach(child, &mut events);
                } else {
                    run_head = Some(child);
                }
            }
        }

        if events.is_empty() {
            return Ok(());
        }
        self.finish_mutation(events)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Reject insertions that would break the tree shape
    fn validate_insert(&self, parent: NodeId, node: NodeId, replacing: Option<NodeId>) -> DomResult<()> {
        let parent_kind = self.kind(parent)?;
        let kind = self.kind(node)?;

        if !parent_kind.is_container() {
            return Err(DomError::hierarchy(format!("{:?} cannot have children", parent_kind)));
        }
        if self.contains(node, parent) {
            return Err(DomError::hierarchy("insertion would create a cycle"));
        }

        let incoming: Vec<NodeKind> = if kind == NodeKind::DocumentFragment {
            self.children(node).filter_map(|c| self.kind_of(c)).collect()
        } else {
            vec![kind]
        };
        if let Some(bad) = incoming.iter().find(|&&k| !parent_kind.can_contain(k)) {
            return Err(DomError::hierarchy(format!(
                "{:?} cannot contain {:?}",
                parent_kind, bad
            )));
        }

        if parent_kind == NodeKind::Document {
            for unique in [NodeKind::Element, NodeKind::DocumentType] {
                let existing = self
                    .children(parent)
                    .filter(|&c| c != node && Some(c) != replacing)
                    .filter(|&c| self.kind_of(c) == Some(unique))
                    .count();
                let added = incoming.iter().filter(|&&k| k == unique).count();
                if existing + added > 1 {
                    return Err(DomError::hierarchy(format!(
                        "document already has a {:?} child",
                        unique
                    )));
                }
            }
        }
        Ok(())
    }

    /// Move a validated node (or a fragment's children) before `reference`
    fn insert_resolved(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
        events: &mut Vec<DomEvent>,
    ) {
        let reference = if reference == Some(node) {
            self.next_sibling(node)
        } else {
            reference
        };

        let nodes: Vec<NodeId> = if self.kind_of(node) == Some(NodeKind::DocumentFragment) {
            let moved: Vec<NodeId> = self.children(node).collect();
            if moved.is_empty() {
                return;
            }
            for &child in &moved {
                self.unlink(child);
            }
            events.push(DomEvent::nodes_removed(node, moved.clone(), None, None));
            moved
        } else {
            self.detach(node, events);
            vec![node]
        };

        let previous = match reference {
            Some(r) => self.previous_sibling(r),
            None => self.last_child(parent),
        };
        for &child in &nodes {
            self.link_before(parent, child, reference);
        }
        if self.is_connected(parent) {
            for &child in &nodes {
                self.index_subtree(child);
            }
        }
        events.push(DomEvent::nodes_added(parent, nodes, previous, reference));
    }

    /// Unlink `node` from its parent, if any, dropping it from the indexes
    /// when it was connected
    pub(crate) fn detach(&mut self, node: NodeId, events: &mut Vec<DomEvent>) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        let connected = self.is_connected(parent);
        let previous = self.previous_sibling(node);
        let next = self.next_sibling(node);

        self.unlink(node);
        if connected {
            self.unindex_subtree(node);
        }
        events.push(DomEvent::nodes_removed(parent, vec![node], previous, next));
    }

    fn link_before(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>) {
        let previous = match reference {
            Some(r) => self.previous_sibling(r),
            None => self.last_child(parent),
        };

        self.update_node(node, |n| {
            n.parent = Some(parent);
            n.prev_sibling = previous;
            n.next_sibling = reference;
        });
        match previous {
            Some(p) => self.update_node(p, |n| n.next_sibling = Some(node)),
            None => self.update_node(parent, |n| n.first_child = Some(node)),
        }
        match reference {
            Some(r) => self.update_node(r, |n| n.prev_sibling = Some(node)),
            None => self.update_node(parent, |n| n.last_child = Some(node)),
        }
    }

    fn unlink(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        let previous = self.previous_sibling(node);
        let next = self.next_sibling(node);

        match previous {
            Some(p) => self.update_node(p, |n| n.next_sibling = next),
            None => self.update_node(parent, |n| n.first_child = next),
        }
        match next {
            Some(s) => self.update_node(s, |n| n.prev_sibling = previous),
            None => self.update_node(parent, |n| n.last_child = previous),
        }
        self.update_node(node, |n| {
            n.parent = None;
            n.prev_sibling = None;
            n.next_sibling = None;
        });
    }

    fn update_node(&mut self, id: NodeId, update: impl FnOnce(&mut Node)) {
        if let Some(node) = self.get_mut(id) {
            update(node);
        }
    }

    /// Copy one node's own data, attributes and annotations
    fn copy_node(&mut self, node: NodeId) -> DomResult<NodeId> {
        let source = self.node(node)?;
        let annotations = source.annotations.clone_for_copy();

        let copy = match &source.data {
            NodeData::Document => {
                return Err(DomError::NotSupported("cloning the document node".into()));
            }
            NodeData::Element(element) => {
                let name = element.name.clone();
                let type_tag = element.type_tag.clone();
                let attributes: Vec<NodeId> = element.attributes.clone();

                let copy = self.push_node(NodeData::Element(crate::node::ElementData {
                    name,
                    attributes: Vec::with_capacity(attributes.len()),
                    type_tag,
                }));
                for attribute in attributes {
                    let attribute_copy = self.copy_attribute(attribute, Some(copy))?;
                    if let Some(element) = self.get_mut(copy).and_then(Node::as_element_mut) {
                        element.attributes.push(attribute_copy);
                    }
                }
                copy
            }
            NodeData::Attribute(_) => self.copy_attribute(node, None)?,
            other => {
                let data = other
                    .duplicate_leaf()
                    .ok_or_else(|| DomError::NotSupported(format!("cloning {:?}", other.kind())))?;
                self.push_node(data)
            }
        };

        self.update_node(copy, |n| n.annotations = annotations);
        Ok(copy)
    }

    fn copy_attribute(&mut self, attribute: NodeId, owner: Option<NodeId>) -> DomResult<NodeId> {
        let source = self.node(attribute)?;
        let annotations = source.annotations.clone_for_copy();
        let data = self.attribute_data(attribute)?;
        let name = data.name.clone();
        let value = data.value.clone_value();

        let copy = self.push_attribute(name, value, owner);
        self.update_node(copy, |n| n.annotations = annotations);
        Ok(copy)
    }

    /// Bump the generation and dispatch the collected events
    pub(crate) fn finish_mutation(&mut self, events: Vec<DomEvent>) -> DomResult<()> {
        self.touch();
        if self.settings().trace_mutations() {
            tracing::trace!(events = events.len(), generation = self.generation().value(), "Tree mutated");
        }
        self.dispatch_all(events)
    }
}
