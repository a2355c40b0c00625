//! Writer sinks
//!
//! A [`DomWriter`] receives the ordered call sequence produced by walking a
//! tree in document order. Format-specific writers live outside this crate;
//! here are the state tracking they share and three generic sinks.

use crate::document::Document;
use crate::error::{DomError, DomResult};
use crate::name::QualifiedName;
use crate::node::NodeData;
use crate::NodeId;

/// Position of a writer in the call sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteState {
    #[default]
    Start,
    /// Top level, outside the root element
    Prolog,
    /// Inside a start tag; attributes may follow
    Element,
    /// Between `start_attribute` and `end_attribute`
    Attribute,
    /// Inside element content
    Content,
    /// After `end_document`; every further call fails
    Closed,
}

/// Sink for a document-order call sequence
pub trait DomWriter {
    fn write_state(&self) -> WriteState;

    fn start_document(&mut self) -> DomResult<()>;
    fn start_element(&mut self, name: &QualifiedName) -> DomResult<()>;
    fn start_attribute(&mut self, name: &QualifiedName) -> DomResult<()>;
    fn value(&mut self, text: &str) -> DomResult<()>;
    fn end_attribute(&mut self) -> DomResult<()>;
    fn text(&mut self, text: &str) -> DomResult<()>;
    fn cdata_section(&mut self, text: &str) -> DomResult<()>;
    fn comment(&mut self, text: &str) -> DomResult<()>;
    fn processing_instruction(&mut self, target: &str, data: &str) -> DomResult<()>;
    fn document_type(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> DomResult<()>;
    fn entity_reference(&mut self, name: &str) -> DomResult<()>;
    fn end_element(&mut self) -> DomResult<()>;
    fn end_document(&mut self) -> DomResult<()>;
}

/// Validates a call sequence and tracks the resulting [`WriteState`]
#[derive(Debug, Clone, Default)]
pub struct WriteStateTracker {
    state: WriteState,
    depth: usize,
    in_document: bool,
    root_written: bool,
}

impl WriteStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WriteState {
        self.state
    }

    /// Open element count
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn start_document(&mut self) -> DomResult<()> {
        self.check_open()?;
        if self.state != WriteState::Start {
            return Err(Self::invalid("start_document after output has begun"));
        }
        self.in_document = true;
        self.state = WriteState::Prolog;
        Ok(())
    }

    pub fn start_element(&mut self) -> DomResult<()> {
        self.check_not_in_attribute()?;
        if self.depth == 0 {
            if self.in_document && self.root_written {
                return Err(Self::invalid("document already has a root element"));
            }
            self.root_written = true;
        }
        self.depth += 1;
        self.state = WriteState::Element;
        Ok(())
    }

    pub fn start_attribute(&mut self) -> DomResult<()> {
        self.check_open()?;
        if self.state != WriteState::Element {
            return Err(Self::invalid("attributes must directly follow start_element"));
        }
        self.state = WriteState::Attribute;
        Ok(())
    }

    pub fn value(&mut self) -> DomResult<()> {
        self.check_open()?;
        if self.state != WriteState::Attribute {
            return Err(Self::invalid("value outside an attribute"));
        }
        Ok(())
    }

    pub fn end_attribute(&mut self) -> DomResult<()> {
        self.check_open()?;
        if self.state != WriteState::Attribute {
            return Err(Self::invalid("end_attribute without start_attribute"));
        }
        self.state = WriteState::Element;
        Ok(())
    }

    /// Text, CDATA, comments, instructions and entity references
    pub fn content(&mut self) -> DomResult<()> {
        self.check_not_in_attribute()?;
        self.settle();
        Ok(())
    }

    pub fn document_type(&mut self) -> DomResult<()> {
        self.check_not_in_attribute()?;
        if self.depth > 0 || self.root_written {
            return Err(Self::invalid("document type must precede the root element"));
        }
        self.state = WriteState::Prolog;
        Ok(())
    }

    pub fn end_element(&mut self) -> DomResult<()> {
        self.check_not_in_attribute()?;
        if self.depth == 0 {
            return Err(Self::invalid("end_element without an open element"));
        }
        self.depth -= 1;
        self.settle();
        Ok(())
    }

    pub fn end_document(&mut self) -> DomResult<()> {
        self.check_not_in_attribute()?;
        if self.depth > 0 {
            return Err(Self::invalid("end_document with open elements"));
        }
        self.state = WriteState::Closed;
        Ok(())
    }

    fn settle(&mut self) {
        self.state = if self.depth > 0 {
            WriteState::Content
        } else {
            WriteState::Prolog
        };
    }

    fn check_open(&self) -> DomResult<()> {
        if self.state == WriteState::Closed {
            Err(Self::invalid("writer is closed"))
        } else {
            Ok(())
        }
    }

    fn check_not_in_attribute(&self) -> DomResult<()> {
        self.check_open()?;
        if self.state == WriteState::Attribute {
            Err(Self::invalid("attribute not ended"))
        } else {
            Ok(())
        }
    }

    fn invalid(message: &str) -> DomError {
        DomError::InvalidOperation(message.to_string())
    }
}

/// Discards every call
#[derive(Debug, Clone, Copy, Default)]
pub struct NullWriter;

impl DomWriter for NullWriter {
    fn write_state(&self) -> WriteState {
        WriteState::Start
    }

    fn start_document(&mut self) -> DomResult<()> {
        Ok(())
    }

    fn start_element(&mut self, _name: &QualifiedName) -> DomResult<()> {
        Ok(())
    }

    fn start_attribute(&mut self, _name: &QualifiedName) -> DomResult<()> {
        Ok(())
    }

    fn value(&mut self, _text: &str) -> DomResult<()> {
        Ok(())
    }

    fn end_attribute(&mut self) -> DomResult<()> {
        Ok(())
    }

    fn text(&mut self, _text: &str) -> DomResult<()> {
        Ok(())
    }

    fn cdata_section(&mut self, _text: &str) -> DomResult<()> {
        Ok(())
    }

    fn comment(&mut self, _text: &str) -> DomResult<()> {
        Ok(())
    }

    fn processing_instruction(&mut self, _target: &str, _data: &str) -> DomResult<()> {
        Ok(())
    }

    fn document_type(
        &mut self,
        _name: &str,
        _public_id: Option<&str>,
        _system_id: Option<&str>,
    ) -> DomResult<()> {
        Ok(())
    }

    fn entity_reference(&mut self, _name: &str) -> DomResult<()> {
        Ok(())
    }

    fn end_element(&mut self) -> DomResult<()> {
        Ok(())
    }

    fn end_document(&mut self) -> DomResult<()> {
        Ok(())
    }
}

/// Plain-text projection: keeps text and CDATA, drops markup
#[derive(Debug, Clone, Default)]
pub struct TextWriter {
    tracker: WriteStateTracker,
    buffer: String,
}

impl TextWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn into_string(self) -> String {
        self.buffer
    }
}

impl DomWriter for TextWriter {
    fn write_state(&self) -> WriteState {
        self.tracker.state()
    }

    fn start_document(&mut self) -> DomResult<()> {
        self.tracker.start_document()
    }

    fn start_element(&mut self, _name: &QualifiedName) -> DomResult<()> {
        self.tracker.start_element()
    }

    fn start_attribute(&mut self, _name: &QualifiedName) -> DomResult<()> {
        self.tracker.start_attribute()
    }

    fn value(&mut self, _text: &str) -> DomResult<()> {
        self.tracker.value()
    }

    fn end_attribute(&mut self) -> DomResult<()> {
        self.tracker.end_attribute()
    }

    fn text(&mut self, text: &str) -> DomResult<()> {
        self.tracker.content()?;
        self.buffer.push_str(text);
        Ok(())
    }

    fn cdata_section(&mut self, text: &str) -> DomResult<()> {
        self.tracker.content()?;
        self.buffer.push_str(text);
        Ok(())
    }

    fn comment(&mut self, _text: &str) -> DomResult<()> {
        self.tracker.content()
    }

    fn processing_instruction(&mut self, _target: &str, _data: &str) -> DomResult<()> {
        self.tracker.content()
    }

    fn document_type(
        &mut self,
        _name: &str,
        _public_id: Option<&str>,
        _system_id: Option<&str>,
    ) -> DomResult<()> {
        self.tracker.document_type()
    }

    fn entity_reference(&mut self, _name: &str) -> DomResult<()> {
        self.tracker.content()
    }

    fn end_element(&mut self) -> DomResult<()> {
        self.tracker.end_element()
    }

    fn end_document(&mut self) -> DomResult<()> {
        self.tracker.end_document()
    }
}

/// Fans every call out to each inner writer in order
///
/// The sequence is validated once, before any inner writer sees the call.
/// Every inner writer receives the call; the first inner failure is
/// returned.
#[derive(Default)]
pub struct CompositeWriter {
    tracker: WriteStateTracker,
    writers: Vec<Box<dyn DomWriter>>,
}

impl CompositeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, writer: Box<dyn DomWriter>) {
        self.writers.push(writer);
    }

    pub fn len(&self) -> usize {
        self.writers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writers.is_empty()
    }

    pub fn into_writers(self) -> Vec<Box<dyn DomWriter>> {
        self.writers
    }

    fn fan_out(&mut self, mut call: impl FnMut(&mut dyn DomWriter) -> DomResult<()>) -> DomResult<()> {
        let mut first_error = None;
        for writer in &mut self.writers {
            if let Err(err) = call(writer.as_mut()) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl std::fmt::Debug for CompositeWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeWriter")
            .field("state", &self.tracker.state())
            .field("writers", &self.writers.len())
            .finish()
    }
}

impl DomWriter for CompositeWriter {
    fn write_state(&self) -> WriteState {
        self.tracker.state()
    }

    fn start_document(&mut self) -> DomResult<()> {
        self.tracker.start_document()?;
        self.fan_out(|w| w.start_document())
    }

    fn start_element(&mut self, name: &QualifiedName) -> DomResult<()> {
        self.tracker.start_element()?;
        self.fan_out(|w| w.start_element(name))
    }

    fn start_attribute(&mut self, name: &QualifiedName) -> DomResult<()> {
        self.tracker.start_attribute()?;
        self.fan_out(|w| w.start_attribute(name))
    }

    fn value(&mut self, text: &str) -> DomResult<()> {
        self.tracker.value()?;
        self.fan_out(|w| w.value(text))
    }

    fn end_attribute(&mut self) -> DomResult<()> {
        self.tracker.end_attribute()?;
        self.fan_out(|w| w.end_attribute())
    }

    fn text(&mut self, text: &str) -> DomResult<()> {
        self.tracker.content()?;
        self.fan_out(|w| w.text(text))
    }

    fn cdata_section(&mut self, text: &str) -> DomResult<()> {
        self.tracker.content()?;
        self.fan_out(|w| w.cdata_section(text))
    }

    fn comment(&mut self, text: &str) -> DomResult<()> {
        self.tracker.content()?;
        self.fan_out(|w| w.comment(text))
    }

    fn processing_instruction(&mut self, target: &str, data: &str) -> DomResult<()> {
        self.tracker.content()?;
        self.fan_out(|w| w.processing_instruction(target, data))
    }

    fn document_type(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> DomResult<()> {
        self.tracker.document_type()?;
        self.fan_out(|w| w.document_type(name, public_id, system_id))
    }

    fn entity_reference(&mut self, name: &str) -> DomResult<()> {
        self.tracker.content()?;
        self.fan_out(|w| w.entity_reference(name))
    }

    fn end_element(&mut self) -> DomResult<()> {
        self.tracker.end_element()?;
        self.fan_out(|w| w.end_element())
    }

    fn end_document(&mut self) -> DomResult<()> {
        self.tracker.end_document()?;
        self.fan_out(|w| w.end_document())
    }
}

enum Step {
    Enter(NodeId),
    Exit(NodeId),
}

impl Document {
    /// Drive `writer` over the whole document
    pub fn write_to(&self, writer: &mut dyn DomWriter) -> DomResult<()> {
        self.write_node(self.root(), writer)
    }

    /// Drive `writer` over `node` and its subtree in document order
    pub fn write_node(&self, node: NodeId, writer: &mut dyn DomWriter) -> DomResult<()> {
        self.node(node)?;
        let mut steps = vec![Step::Enter(node)];

        while let Some(step) = steps.pop() {
            let id = match step {
                Step::Exit(id) => {
                    match self.node(id)?.data() {
                        NodeData::Document => writer.end_document()?,
                        NodeData::Element(_) => writer.end_element()?,
                        _ => {}
                    }
                    continue;
                }
                Step::Enter(id) => id,
            };

            match self.node(id)?.data() {
                NodeData::Document => writer.start_document()?,
                NodeData::Element(element) => {
                    writer.start_element(&element.name)?;
                    for &attr in &element.attributes {
                        let data = self.attribute_data(attr)?;
                        writer.start_attribute(&data.name)?;
                        writer.value(&data.value.text())?;
                        writer.end_attribute()?;
                    }
                }
                NodeData::Attribute(data) => {
                    writer.start_attribute(&data.name)?;
                    writer.value(&data.value.text())?;
                    writer.end_attribute()?;
                }
                NodeData::Text(text) => {
                    let mode = match self.parent(id) {
                        Some(parent) => self.whitespace_mode(parent),
                        None => self.settings().whitespace(),
                    };
                    if let Some(text) = mode.apply(text) {
                        writer.text(&text)?;
                    }
                }
                NodeData::CDataSection(text) => writer.cdata_section(text)?,
                NodeData::Comment(text) => writer.comment(text)?,
                NodeData::ProcessingInstruction { target, data, .. } => {
                    writer.processing_instruction(target, data)?
                }
                NodeData::DocumentType {
                    name,
                    public_id,
                    system_id,
                } => writer.document_type(name, public_id.as_deref(), system_id.as_deref())?,
                NodeData::EntityReference { name } => writer.entity_reference(name)?,
                NodeData::Entity { .. } | NodeData::Notation { .. } => {}
                NodeData::DocumentFragment => {}
            }

            steps.push(Step::Exit(id));
            let children: Vec<NodeId> = self.children(id).collect();
            steps.extend(children.into_iter().rev().map(Step::Enter));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ElementDefinition, NodeDefinitions, WhitespaceMode};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records calls as strings
    #[derive(Default)]
    struct Recorder {
        tracker: WriteStateTracker,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Recorder {
        fn push(&self, entry: String) -> DomResult<()> {
            self.log.borrow_mut().push(entry);
            Ok(())
        }
    }

    impl DomWriter for Recorder {
        fn write_state(&self) -> WriteState {
            self.tracker.state()
        }
        fn start_document(&mut self) -> DomResult<()> {
            self.tracker.start_document()?;
            self.push("doc".into())
        }
        fn start_element(&mut self, name: &QualifiedName) -> DomResult<()> {
            self.tracker.start_element()?;
            self.push(format!("<{}", name))
        }
        fn start_attribute(&mut self, name: &QualifiedName) -> DomResult<()> {
            self.tracker.start_attribute()?;
            self.push(format!("@{}", name))
        }
        fn value(&mut self, text: &str) -> DomResult<()> {
            self.tracker.value()?;
            self.push(format!("={}", text))
        }
        fn end_attribute(&mut self) -> DomResult<()> {
            self.tracker.end_attribute()
        }
        fn text(&mut self, text: &str) -> DomResult<()> {
            self.tracker.content()?;
            self.push(format!("'{}'", text))
        }
        fn cdata_section(&mut self, text: &str) -> DomResult<()> {
            self.tracker.content()?;
            self.push(format!("cdata:{}", text))
        }
        fn comment(&mut self, text: &str) -> DomResult<()> {
            self.tracker.content()?;
            self.push(format!("#{}", text))
        }
        fn processing_instruction(&mut self, target: &str, _data: &str) -> DomResult<()> {
            self.tracker.content()?;
            self.push(format!("?{}", target))
        }
        fn document_type(&mut self, name: &str, _: Option<&str>, _: Option<&str>) -> DomResult<()> {
            self.tracker.document_type()?;
            self.push(format!("!{}", name))
        }
        fn entity_reference(&mut self, name: &str) -> DomResult<()> {
            self.tracker.content()?;
            self.push(format!("&{}", name))
        }
        fn end_element(&mut self) -> DomResult<()> {
            self.tracker.end_element()?;
            self.push(">".into())
        }
        fn end_document(&mut self) -> DomResult<()> {
            self.tracker.end_document()?;
            self.push("end".into())
        }
    }

    fn sample() -> Document {
        let mut doc = Document::new();
        let root = doc.root();
        let doctype = doc.create_document_type("html", None, None).unwrap();
        doc.append_child(root, doctype).unwrap();
        let html = doc.create_element("html").unwrap();
        doc.append_child(root, html).unwrap();
        doc.set_attribute(html, "lang", "en").unwrap();
        let text = doc.create_text("hi");
        doc.append_child(html, text).unwrap();
        let cdata = doc.create_cdata_section(" there");
        doc.append_child(html, cdata).unwrap();
        let comment = doc.create_comment("c");
        doc.append_child(html, comment).unwrap();
        doc
    }

    #[test]
    fn test_document_order_calls() {
        let doc = sample();
        let mut recorder = Recorder::default();
        let log = Rc::clone(&recorder.log);
        doc.write_to(&mut recorder).unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["doc", "!html", "<html", "@lang", "=en", "'hi'", "cdata: there", "#c", ">", "end"]
        );
        assert_eq!(recorder.write_state(), WriteState::Closed);
    }

    #[test]
    fn test_text_writer_projection() {
        let doc = sample();
        let mut writer = TextWriter::new();
        doc.write_to(&mut writer).unwrap();
        assert_eq!(writer.as_str(), "hi there");
    }

    #[test]
    fn test_closed_writer_rejects_calls() {
        let mut writer = TextWriter::new();
        writer.start_document().unwrap();
        writer.end_document().unwrap();
        assert!(matches!(writer.text("late"), Err(DomError::InvalidOperation(_))));
        assert!(writer.start_document().is_err());
    }

    #[test]
    fn test_tracker_states() {
        let mut tracker = WriteStateTracker::new();
        tracker.start_document().unwrap();
        assert_eq!(tracker.state(), WriteState::Prolog);
        tracker.start_element().unwrap();
        assert_eq!(tracker.state(), WriteState::Element);
        tracker.start_attribute().unwrap();
        assert!(tracker.content().is_err());
        tracker.value().unwrap();
        tracker.end_attribute().unwrap();
        tracker.content().unwrap();
        assert_eq!(tracker.state(), WriteState::Content);
        assert!(tracker.start_attribute().is_err());
        assert!(tracker.end_document().is_err());
        tracker.end_element().unwrap();
        assert_eq!(tracker.state(), WriteState::Prolog);
        assert!(tracker.start_element().is_err());
        assert!(tracker.document_type().is_err());
        tracker.end_document().unwrap();
        assert_eq!(tracker.state(), WriteState::Closed);
    }

    #[test]
    fn test_composite_fans_out() {
        let doc = sample();
        let first = Recorder::default();
        let second = Recorder::default();
        let (a, b) = (Rc::clone(&first.log), Rc::clone(&second.log));

        let mut composite = CompositeWriter::new();
        composite.push(Box::new(first));
        composite.push(Box::new(second));
        composite.push(Box::new(NullWriter));
        doc.write_to(&mut composite).unwrap();

        assert_eq!(composite.len(), 3);
        assert_eq!(*a.borrow(), *b.borrow());
        assert_eq!(composite.write_state(), WriteState::Closed);
    }

    #[test]
    fn test_whitespace_trim_drops_blank_text() {
        let mut defs = NodeDefinitions::new();
        defs.define_element("table", ElementDefinition::new().with_whitespace(WhitespaceMode::Trim))
            .unwrap();
        let mut doc = Document::with_definitions(defs);
        let table = doc.create_element("table").unwrap();
        let blank = doc.create_text("\n  ");
        let cell = doc.create_text("x");
        doc.append_child(table, blank).unwrap();
        doc.append_child(table, cell).unwrap();

        let mut writer = TextWriter::new();
        doc.write_node(table, &mut writer).unwrap();
        assert_eq!(writer.into_string(), "x");
    }
}
