//! DOM Observers
//!
//! Scoped observer registrations and synchronous event dispatch.
//!
//! Dispatch walks a snapshot of the registration list, so callbacks may
//! register, dispose or mutate the document while it runs. A registration's
//! active flag is checked right before its callback is invoked; disposing an
//! observer mid-dispatch suppresses any delivery that has not started yet.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::document::Document;
use crate::error::{AggregateError, DomResult, ObserverError};
use crate::events::DomEvent;
use crate::name::{IntoQualifiedName, QualifiedName};
use crate::NodeId;

/// Observer callback; may mutate the document reentrantly
pub type ObserverCallback = Rc<dyn Fn(&mut Document, &DomEvent) -> Result<(), ObserverError>>;

/// Which nodes around the target an observer hears about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverScope {
    /// Events originating on the target only
    SelfOnly,
    /// Events on the target or anything below it
    SelfAndDescendants,
    /// Events on the target or any of its ancestors
    SelfAndAncestors,
}

/// Event filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedEvents {
    Any,
    ChildNodes,
    AnyAttribute,
    Attribute(QualifiedName),
}

impl ObservedEvents {
    /// Filter for one attribute name
    pub fn attribute(name: impl IntoQualifiedName) -> DomResult<Self> {
        Ok(Self::Attribute(name.into_qualified_name()?))
    }

    fn accepts(&self, event: &DomEvent) -> bool {
        match (self, event) {
            (Self::Any, _) => true,
            (Self::ChildNodes, DomEvent::ChildNodes(_)) => true,
            (Self::AnyAttribute, DomEvent::Attribute(_)) => true,
            (Self::Attribute(name), DomEvent::Attribute(e)) => e.name == *name,
            _ => false,
        }
    }
}

pub(crate) struct Registration {
    id: u64,
    target: NodeId,
    scope: ObserverScope,
    events: ObservedEvents,
    callback: ObserverCallback,
    active: Rc<Cell<bool>>,
}

impl Registration {
    fn is_active(&self) -> bool {
        self.active.get()
    }

    fn applies_to(&self, doc: &Document, event: &DomEvent) -> bool {
        if !self.events.accepts(event) {
            return false;
        }
        let origin = event.origin();
        if origin == self.target {
            return true;
        }
        match self.scope {
            ObserverScope::SelfOnly => false,
            ObserverScope::SelfAndDescendants => doc.is_ancestor_of(self.target, origin),
            ObserverScope::SelfAndAncestors => doc.is_ancestor_of(origin, self.target),
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("scope", &self.scope)
            .field("events", &self.events)
            .field("active", &self.active.get())
            .finish()
    }
}

/// Handle to a registration; dropping it does not unregister
#[derive(Debug, Clone)]
pub struct Observer {
    id: u64,
    active: Rc<Cell<bool>>,
}

impl Observer {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Stop delivery; idempotent and safe inside a callback
    pub fn dispose(&self) {
        if self.active.replace(false) {
            tracing::trace!(observer = self.id, "Observer disposed");
        }
    }
}

/// Combine callbacks into one; every component runs even when an earlier
/// one fails, and all failures come back as a single [`AggregateError`]
pub fn compose(callbacks: impl IntoIterator<Item = ObserverCallback>) -> ObserverCallback {
    let callbacks: Vec<ObserverCallback> = callbacks.into_iter().collect();
    Rc::new(move |doc: &mut Document, event: &DomEvent| {
        let mut failures = AggregateError::new();
        for callback in &callbacks {
            if let Err(err) = callback(doc, event) {
                failures.push(err);
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(Box::new(failures) as ObserverError)
        }
    })
}

impl Document {
    /// Register `callback` for events around `target`
    pub fn observe<F>(
        &mut self,
        target: NodeId,
        scope: ObserverScope,
        events: ObservedEvents,
        callback: F,
    ) -> DomResult<Observer>
    where
        F: Fn(&mut Document, &DomEvent) -> Result<(), ObserverError> + 'static,
    {
        self.observe_with(target, scope, events, Rc::new(callback))
    }

    /// Register a shared callback, e.g. the result of [`compose`]
    pub fn observe_with(
        &mut self,
        target: NodeId,
        scope: ObserverScope,
        events: ObservedEvents,
        callback: ObserverCallback,
    ) -> DomResult<Observer> {
        self.node(target)?;

        let id = self.next_observer;
        self.next_observer += 1;
        let active = Rc::new(Cell::new(true));

        let registration = Rc::new(Registration {
            id,
            target,
            scope,
            events,
            callback,
            active: Rc::clone(&active),
        });
        self.observers = self.observers.with(registration);

        tracing::trace!(observer = id, ?target, ?scope, "Observer registered");
        Ok(Observer { id, active })
    }

    /// Number of registrations that are still active
    pub fn observer_count(&self) -> usize {
        self.observers.iter().filter(|r| r.is_active()).count()
    }

    /// Deliver `event` to every applicable active registration, collecting
    /// callback failures into `failures`
    pub(crate) fn dispatch(&mut self, event: &DomEvent, failures: &mut AggregateError) {
        if self.observers.is_empty() {
            return;
        }

        let snapshot = self.observers.clone();
        if self.settings().trace_mutations() {
            tracing::trace!(origin = ?event.origin(), observers = snapshot.len(), "Dispatching event");
        }

        for registration in snapshot.iter() {
            if !registration.is_active() || !registration.applies_to(self, event) {
                continue;
            }
            if let Err(err) = (registration.callback)(self, event) {
                tracing::warn!(observer = registration.id, error = %err, "Observer callback failed");
                failures.push(err);
            }
        }

        if self.observers.iter().any(|r| !r.is_active()) {
            self.observers = self.observers.without(|r| !r.is_active());
        }
    }

    /// Dispatch a batch of events raised by one mutation
    pub(crate) fn dispatch_all(&mut self, events: Vec<DomEvent>) -> DomResult<()> {
        let mut failures = AggregateError::new();
        for event in &events {
            self.dispatch(event, &mut failures);
        }
        failures.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomError;
    use std::cell::RefCell;

    fn counter() -> (Rc<Cell<usize>>, impl Fn(&mut Document, &DomEvent) -> Result<(), ObserverError>) {
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        (count, move |_: &mut Document, _: &DomEvent| {
            seen.set(seen.get() + 1);
            Ok(())
        })
    }

    #[test]
    fn test_self_scope_ignores_descendants() {
        let mut doc = Document::new();
        let list = doc.create_element("ul").unwrap();
        let item = doc.create_element("li").unwrap();
        doc.append_child(list, item).unwrap();

        let (count, callback) = counter();
        doc.observe(list, ObserverScope::SelfOnly, ObservedEvents::AnyAttribute, callback)
            .unwrap();

        doc.set_attribute(item, "title", "x").unwrap();
        assert_eq!(count.get(), 0);
        doc.set_attribute(list, "title", "x").unwrap();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_ancestor_scope() {
        let mut doc = Document::new();
        let outer = doc.create_element("div").unwrap();
        let inner = doc.create_element("span").unwrap();
        doc.append_child(outer, inner).unwrap();

        let (count, callback) = counter();
        doc.observe(inner, ObserverScope::SelfAndAncestors, ObservedEvents::Any, callback)
            .unwrap();

        doc.set_attribute(outer, "lang", "en").unwrap();
        assert_eq!(count.get(), 1);

        let text = doc.create_text("hi");
        doc.append_child(inner, text).unwrap();
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_specific_attribute_filter() {
        let mut doc = Document::new();
        let el = doc.create_element("input").unwrap();

        let names = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&names);
        doc.observe(
            el,
            ObserverScope::SelfOnly,
            ObservedEvents::attribute("value").unwrap(),
            move |_, event| {
                if let Some(e) = event.as_attribute() {
                    seen.borrow_mut().push(e.name.local_name().to_string());
                }
                Ok(())
            },
        )
        .unwrap();

        doc.set_attribute(el, "type", "text").unwrap();
        doc.set_attribute(el, "value", "42").unwrap();
        assert_eq!(*names.borrow(), vec!["value".to_string()]);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut doc = Document::new();
        let el = doc.create_element("p").unwrap();
        let (count, callback) = counter();
        let observer = doc
            .observe(el, ObserverScope::SelfOnly, ObservedEvents::Any, callback)
            .unwrap();

        observer.dispose();
        observer.dispose();
        assert!(!observer.is_active());
        assert_eq!(doc.observer_count(), 0);

        doc.set_attribute(el, "title", "x").unwrap();
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_failure_surfaces_after_mutation() {
        let mut doc = Document::new();
        let el = doc.create_element("p").unwrap();
        doc.observe(el, ObserverScope::SelfOnly, ObservedEvents::Any, |_, _| {
            Err("rejected".into())
        })
        .unwrap();

        let err = doc.set_attribute(el, "title", "kept").unwrap_err();
        assert!(matches!(err, DomError::Observers(ref agg) if agg.len() == 1));
        assert_eq!(doc.get_attribute(el, "title").unwrap().as_deref(), Some("kept"));
    }

    #[test]
    fn test_compose_runs_every_callback() {
        let (first, a) = counter();
        let (third, c) = counter();
        let failing: ObserverCallback = Rc::new(|_: &mut Document, _: &DomEvent| -> Result<(), ObserverError> {
            Err("second".into())
        });
        let first_cb: ObserverCallback = Rc::new(a);
        let third_cb: ObserverCallback = Rc::new(c);
        let combined = compose(vec![first_cb, failing, third_cb]);

        let mut doc = Document::new();
        let root = doc.root();
        let event = DomEvent::nodes_added(root, Vec::new(), None, None);
        let err = combined(&mut doc, &event).unwrap_err();

        let aggregate = err.downcast::<AggregateError>().unwrap();
        assert_eq!(aggregate.len(), 1);
        assert_eq!(first.get(), 1);
        assert_eq!(third.get(), 1);
    }

    #[test]
    fn test_observe_rejects_foreign_target() {
        let mut other = Document::new();
        let foreign = other.create_element("p").unwrap();
        let mut doc = Document::new();
        let (_, callback) = counter();
        assert!(matches!(
            doc.observe(foreign, ObserverScope::SelfOnly, ObservedEvents::Any, callback),
            Err(DomError::WrongDocument)
        ));
    }
}
