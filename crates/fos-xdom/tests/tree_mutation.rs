//! Tree mutation tests for fos-xdom
//!
//! Structural invariants, cycle prevention and the event sequence of moves.

use std::cell::RefCell;
use std::rc::Rc;

use fos_xdom::{
    ChildChange, Document, DomError, DomEvent, ElementIndex, NodeId, ObservedEvents, ObserverScope,
};

/// html > body > (section > (a, b), aside)
fn page() -> (Document, [NodeId; 5]) {
    let mut doc = Document::new();
    let root = doc.root();
    let html = doc.create_element("html").unwrap();
    let body = doc.create_element("body").unwrap();
    let section = doc.create_element("section").unwrap();
    let aside = doc.create_element("aside").unwrap();
    let a = doc.create_element("p").unwrap();
    let b = doc.create_element("p").unwrap();

    doc.append_child(root, html).unwrap();
    doc.append_child(html, body).unwrap();
    doc.append_child(body, section).unwrap();
    doc.append_child(body, aside).unwrap();
    doc.append_child(section, a).unwrap();
    doc.append_child(section, b).unwrap();
    (doc, [body, section, aside, a, b])
}

fn record_all(doc: &mut Document) -> Rc<RefCell<Vec<DomEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    let root = doc.root();
    doc.observe(root, ObserverScope::SelfAndDescendants, ObservedEvents::ChildNodes, move |_, e| {
        sink.borrow_mut().push(e.clone());
        Ok(())
    })
    .unwrap();
    events
}

fn snapshot(doc: &Document, node: NodeId) -> Vec<(NodeId, Option<NodeId>)> {
    std::iter::once(node)
        .chain(doc.descendants(node))
        .map(|id| (id, doc.parent(id)))
        .collect()
}

#[test]
fn test_cycle_prevention_leaves_trees_unchanged() {
    let (mut doc, [body, section, _, a, _]) = page();
    let before = snapshot(&doc, doc.root());
    let events = record_all(&mut doc);

    // Direct and transitive self-insertion
    for (parent, node) in [(section, section), (a, section), (a, body), (section, body)] {
        let err = doc.append_child(parent, node).unwrap_err();
        assert!(matches!(err, DomError::HierarchyRequest(_)), "{:?}", err);
    }
    assert!(doc.insert_child(a, 0, body).is_err());
    assert!(doc.replace_child(section, body, a).is_err());

    assert_eq!(snapshot(&doc, doc.root()), before);
    assert!(events.borrow().is_empty());
}

#[test]
fn test_detached_subtree_cycle() {
    let mut doc = Document::new();
    let outer = doc.create_element("div").unwrap();
    let inner = doc.create_element("div").unwrap();
    doc.append_child(outer, inner).unwrap();

    assert!(doc.append_child(inner, outer).is_err());
    assert_eq!(doc.parent(inner), Some(outer));
    assert!(doc.parent(outer).is_none());
}

#[test]
fn test_detach_reattach_events() {
    let (mut doc, [_, section, aside, a, b]) = page();
    let events = record_all(&mut doc);

    doc.remove_child(section, a).unwrap();
    assert!(doc.parent(a).is_none());
    assert!(doc.next_sibling(a).is_none());
    assert!(doc.previous_sibling(b).is_none());

    doc.append_child(aside, a).unwrap();
    assert_eq!(doc.parent(a), Some(aside));
    assert_eq!(doc.first_child(aside), Some(a));

    let events = events.borrow();
    assert_eq!(events.len(), 2);
    let removed = events[0].as_mutation().unwrap();
    assert_eq!(removed.target, section);
    assert_eq!(removed.change, ChildChange::Removed(vec![a]));
    assert_eq!(removed.next_sibling, Some(b));

    let added = events[1].as_mutation().unwrap();
    assert_eq!(added.target, aside);
    assert_eq!(added.change, ChildChange::Added(vec![a]));
}

#[test]
fn test_move_is_remove_then_add() {
    let (mut doc, [_, section, aside, a, b]) = page();
    let events = record_all(&mut doc);

    // Attached node moved directly: still two events, never a "move"
    doc.insert_before(aside, b, None).unwrap();

    let events = events.borrow();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].origin(), section);
    assert!(!events[0].as_mutation().unwrap().is_addition());
    assert_eq!(events[1].origin(), aside);
    assert!(events[1].as_mutation().unwrap().is_addition());
    assert_eq!(doc.last_child(section), Some(a));
}

#[test]
fn test_added_event_sibling_context() {
    let (mut doc, [_, section, _, a, b]) = page();
    let events = record_all(&mut doc);
    let middle = doc.create_element("hr").unwrap();
    doc.insert_child(section, 1, middle).unwrap();

    let events = events.borrow();
    let added = events[0].as_mutation().unwrap();
    assert_eq!(added.previous_sibling, Some(a));
    assert_eq!(added.next_sibling, Some(b));
    assert!(added.removed_nodes().is_empty());
}

#[test]
fn test_fragment_insert_events() {
    let (mut doc, [_, section, _, _, _]) = page();
    let fragment = doc.create_document_fragment();
    let x = doc.create_element("li").unwrap();
    let y = doc.create_element("li").unwrap();
    doc.append_child(fragment, x).unwrap();
    doc.append_child(fragment, y).unwrap();

    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    doc.observe(fragment, ObserverScope::SelfOnly, ObservedEvents::ChildNodes, move |_, e| {
        sink.borrow_mut().push(e.clone());
        Ok(())
    })
    .unwrap();
    let parent_events = record_all(&mut doc);

    doc.append_child(section, fragment).unwrap();

    assert_eq!(events.borrow().len(), 1);
    assert_eq!(events.borrow()[0].as_mutation().unwrap().removed_nodes(), &[x, y]);
    let parent_events = parent_events.borrow();
    assert_eq!(parent_events.len(), 1);
    assert_eq!(parent_events[0].as_mutation().unwrap().added_nodes(), &[x, y]);
}

#[test]
fn test_moved_subtree_reindexed() {
    let (mut doc, [body, section, aside, a, _]) = page();
    let handle = doc.add_index(ElementIndex::by_value("role").unwrap());
    doc.set_attribute(a, "role", "note").unwrap();

    doc.remove_child(body, section).unwrap();
    assert!(doc.index(handle).unwrap().elements("note").is_empty());

    doc.append_child(aside, section).unwrap();
    assert_eq!(doc.index(handle).unwrap().elements("note"), vec![a]);
}

#[test]
fn test_foreign_nodes_rejected() {
    let (mut doc, [body, ..]) = page();
    let mut other = Document::new();
    let stranger = other.create_element("div").unwrap();

    assert!(matches!(doc.append_child(body, stranger), Err(DomError::WrongDocument)));
    assert!(matches!(other.append_child(stranger, body), Err(DomError::WrongDocument)));
}

#[test]
fn test_clear_children_single_event() {
    let (mut doc, [_, section, _, a, b]) = page();
    let events = record_all(&mut doc);
    let removed = doc.clear_children(section).unwrap();

    assert_eq!(removed, vec![a, b]);
    assert_eq!(events.borrow().len(), 1);
    assert!(!doc.has_children(section));
    assert!(doc.clear_children(section).unwrap().is_empty());
    assert_eq!(events.borrow().len(), 1);
}

#[test]
fn test_generation_advances() {
    let (mut doc, [_, section, _, a, _]) = page();
    let before = doc.generation();
    doc.remove_child(section, a).unwrap();
    assert!(doc.generation() > before);
}
