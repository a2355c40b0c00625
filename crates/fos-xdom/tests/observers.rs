//! Observer tests for fos-xdom
//!
//! Scope filtering, composed callback failures and disposal during dispatch.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use fos_xdom::{
    compose, Document, DomError, DomEvent, NodeId, ObservedEvents, Observer, ObserverCallback,
    ObserverError, ObserverScope,
};

#[derive(Debug)]
struct Refused(&'static str);

impl fmt::Display for Refused {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "refused: {}", self.0)
    }
}

impl std::error::Error for Refused {}

/// root > parent > (target > child, sibling)
fn family() -> (Document, NodeId, NodeId, NodeId, NodeId) {
    let mut doc = Document::new();
    let root = doc.root();
    let parent = doc.create_element("div").unwrap();
    let target = doc.create_element("div").unwrap();
    let sibling = doc.create_element("div").unwrap();
    let child = doc.create_element("span").unwrap();
    doc.append_child(root, parent).unwrap();
    doc.append_child(parent, target).unwrap();
    doc.append_child(parent, sibling).unwrap();
    doc.append_child(target, child).unwrap();
    (doc, parent, target, sibling, child)
}

fn origins(doc: &mut Document, target: NodeId, scope: ObserverScope) -> (Observer, Rc<RefCell<Vec<NodeId>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let observer = doc
        .observe(target, scope, ObservedEvents::Any, move |_, event| {
            sink.borrow_mut().push(event.origin());
            Ok(())
        })
        .unwrap();
    (observer, seen)
}

#[test]
fn test_descendant_scope_excludes_relatives() {
    let (mut doc, parent, target, sibling, child) = family();
    let (_observer, seen) = origins(&mut doc, target, ObserverScope::SelfAndDescendants);

    doc.set_attribute(parent, "title", "p").unwrap();
    doc.set_attribute(sibling, "title", "s").unwrap();
    let extra = doc.create_element("b").unwrap();
    doc.append_child(sibling, extra).unwrap();
    assert!(seen.borrow().is_empty(), "parent and sibling events must not be delivered");

    doc.set_attribute(target, "title", "t").unwrap();
    doc.set_attribute(child, "title", "c").unwrap();
    let grandchild = doc.create_text("x");
    doc.append_child(child, grandchild).unwrap();

    assert_eq!(*seen.borrow(), vec![target, child, child]);
}

#[test]
fn test_self_scope() {
    let (mut doc, _, target, _, child) = family();
    let (_observer, seen) = origins(&mut doc, target, ObserverScope::SelfOnly);

    doc.set_attribute(child, "title", "c").unwrap();
    doc.set_attribute(target, "title", "t").unwrap();
    assert_eq!(*seen.borrow(), vec![target]);
}

#[test]
fn test_ancestor_scope() {
    let (mut doc, parent, target, sibling, child) = family();
    let (_observer, seen) = origins(&mut doc, target, ObserverScope::SelfAndAncestors);

    doc.set_attribute(child, "title", "c").unwrap();
    doc.set_attribute(sibling, "title", "s").unwrap();
    doc.set_attribute(parent, "title", "p").unwrap();
    let root = doc.root();
    let comment = doc.create_comment("note");
    doc.append_child(root, comment).unwrap();

    assert_eq!(*seen.borrow(), vec![parent, root]);
}

#[test]
fn test_attribute_filter() {
    let (mut doc, _, target, _, _) = family();
    let hits = Rc::new(Cell::new(0));
    let counter = Rc::clone(&hits);
    doc.observe(target, ObserverScope::SelfOnly, ObservedEvents::attribute("lang").unwrap(), move |_, _| {
        counter.set(counter.get() + 1);
        Ok(())
    })
    .unwrap();

    doc.set_attribute(target, "title", "ignored").unwrap();
    doc.set_attribute(target, "lang", "en").unwrap();
    doc.remove_attribute(target, "lang").unwrap();
    let text = doc.create_text("ignored");
    doc.append_child(target, text).unwrap();

    assert_eq!(hits.get(), 2);
}

#[test]
fn test_composed_failure_runs_every_component() {
    let (mut doc, _, target, _, _) = family();
    let first = Rc::new(Cell::new(0));
    let third = Rc::new(Cell::new(0));

    let first_count = Rc::clone(&first);
    let first_cb: ObserverCallback = Rc::new(move |_: &mut Document, _: &DomEvent| -> Result<(), ObserverError> {
        first_count.set(first_count.get() + 1);
        Ok(())
    });
    let failing_cb: ObserverCallback = Rc::new(|_: &mut Document, _: &DomEvent| -> Result<(), ObserverError> {
        Err(Box::new(Refused("second")) as ObserverError)
    });
    let third_count = Rc::clone(&third);
    let third_cb: ObserverCallback = Rc::new(move |_: &mut Document, _: &DomEvent| -> Result<(), ObserverError> {
        third_count.set(third_count.get() + 1);
        Ok(())
    });

    doc.observe_with(
        target,
        ObserverScope::SelfOnly,
        ObservedEvents::Any,
        compose([first_cb, failing_cb, third_cb]),
    )
    .unwrap();

    let err = doc.set_attribute(target, "title", "x").unwrap_err();
    assert_eq!(first.get(), 1);
    assert_eq!(third.get(), 1);
    match err {
        DomError::Observers(aggregate) => {
            assert_eq!(aggregate.len(), 1, "exactly one failure expected");
            assert_eq!(aggregate.errors()[0].to_string(), "refused: second");
        }
        other => panic!("expected observer failure, got {:?}", other),
    }

    // The mutation itself was applied
    assert_eq!(doc.get_attribute(target, "title").unwrap().as_deref(), Some("x"));
}

#[test]
fn test_failures_across_observers_aggregate() {
    let (mut doc, parent, target, _, _) = family();
    let late = Rc::new(Cell::new(false));
    doc.observe(target, ObserverScope::SelfOnly, ObservedEvents::Any, |_, _| {
        Err(Box::new(Refused("target")) as ObserverError)
    })
    .unwrap();
    doc.observe(parent, ObserverScope::SelfAndDescendants, ObservedEvents::Any, |_, _| {
        Err(Box::new(Refused("parent")) as ObserverError)
    })
    .unwrap();
    let flag = Rc::clone(&late);
    doc.observe(target, ObserverScope::SelfOnly, ObservedEvents::Any, move |_, _| {
        flag.set(true);
        Ok(())
    })
    .unwrap();

    let err = doc.set_attribute(target, "title", "x").unwrap_err();
    assert!(late.get(), "a failing observer must not stop later ones");
    match err {
        DomError::Observers(aggregate) => assert_eq!(aggregate.len(), 2),
        other => panic!("expected observer failure, got {:?}", other),
    }
}

#[test]
fn test_dispose_mid_dispatch() {
    let (mut doc, _, target, _, _) = family();
    let victim: Rc<RefCell<Option<Observer>>> = Rc::new(RefCell::new(None));
    let victim_calls = Rc::new(Cell::new(0));
    let disposer_calls = Rc::new(Cell::new(0));

    // Registered first, so it runs before the victim for each event
    let handle = Rc::clone(&victim);
    let calls = Rc::clone(&disposer_calls);
    doc.observe(target, ObserverScope::SelfOnly, ObservedEvents::Any, move |_, _| {
        calls.set(calls.get() + 1);
        if calls.get() == 2 {
            if let Some(observer) = handle.borrow().as_ref() {
                observer.dispose();
            }
        }
        Ok(())
    })
    .unwrap();

    let calls = Rc::clone(&victim_calls);
    let observer = doc
        .observe(target, ObserverScope::SelfOnly, ObservedEvents::Any, move |_, _| {
            calls.set(calls.get() + 1);
            Ok(())
        })
        .unwrap();
    *victim.borrow_mut() = Some(observer.clone());

    doc.set_attribute(target, "title", "1").unwrap();
    assert_eq!(victim_calls.get(), 1);

    // Disposed during event 2 before its own delivery started
    doc.set_attribute(target, "title", "2").unwrap();
    assert_eq!(victim_calls.get(), 1, "in-flight delivery must be suppressed");
    assert!(!observer.is_active());

    doc.set_attribute(target, "title", "3").unwrap();
    assert_eq!(victim_calls.get(), 1, "no delivery after disposal");
    assert_eq!(disposer_calls.get(), 3);
    assert_eq!(doc.observer_count(), 1);
}

#[test]
fn test_dispose_within_batch() {
    let (mut doc, parent, target, sibling, _) = family();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let own: Rc<RefCell<Option<Observer>>> = Rc::new(RefCell::new(None));

    let sink = Rc::clone(&seen);
    let handle = Rc::clone(&own);
    let observer = doc
        .observe(parent, ObserverScope::SelfOnly, ObservedEvents::ChildNodes, move |_, event| {
            sink.borrow_mut().push(event.as_mutation().map(|m| m.is_addition()));
            if let Some(observer) = handle.borrow().as_ref() {
                observer.dispose();
            }
            Ok(())
        })
        .unwrap();
    *own.borrow_mut() = Some(observer);

    // Replacing raises a removal then an addition on the same parent
    let fresh = doc.create_element("p").unwrap();
    doc.replace_child(parent, fresh, sibling).unwrap();
    assert_eq!(*seen.borrow(), vec![Some(false)]);

    doc.remove_child(parent, target).unwrap();
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn test_reentrant_mutation_from_callback() {
    let (mut doc, _, target, _, child) = family();
    doc.observe(target, ObserverScope::SelfOnly, ObservedEvents::attribute("title").unwrap(), move |doc, _| {
        doc.set_attribute(child, "data-synced", "yes")?;
        Ok(())
    })
    .unwrap();

    doc.set_attribute(target, "title", "t").unwrap();
    assert_eq!(doc.get_attribute(child, "data-synced").unwrap().as_deref(), Some("yes"));
}

#[test]
fn test_observe_foreign_target() {
    let mut doc = Document::new();
    let mut other = Document::new();
    let stranger = other.create_element("div").unwrap();
    let result = doc.observe(stranger, ObserverScope::SelfOnly, ObservedEvents::Any, |_, _| Ok(()));
    assert!(matches!(result, Err(DomError::WrongDocument)));
}
