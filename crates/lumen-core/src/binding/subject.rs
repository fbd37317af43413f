//! Synchronous observer list with disposable subscriptions

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

type Callback<E> = Rc<dyn Fn(&E)>;

struct Observer<E: ?Sized> {
    id: u64,
    callback: Callback<E>,
}

/// Registry side of a subscription, so a [`Subscription`] can remove itself
/// without knowing the event type.
trait Registry {
    fn remove(&self, id: u64);
}

struct SubjectInner<E: ?Sized> {
    observers: RefCell<Vec<Observer<E>>>,
    next_id: Cell<u64>,
}

impl<E: ?Sized> Registry for SubjectInner<E> {
    fn remove(&self, id: u64) {
        self.observers.borrow_mut().retain(|o| o.id != id);
    }
}

/// Ordered list of observers notified synchronously on [`Subject::publish`].
///
/// Publishing snapshots the observer list before invoking anything, so an
/// observer may subscribe, dispose or publish again without disturbing the
/// iteration in progress.
pub struct Subject<E: ?Sized + 'static> {
    inner: Rc<SubjectInner<E>>,
}

impl<E: ?Sized + 'static> Default for Subject<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ?Sized + 'static> Clone for Subject<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: ?Sized + 'static> Subject<E> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SubjectInner {
                observers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Register an observer. It stays registered until the returned handle is
    /// disposed or [`Subject::clear`] runs.
    pub fn subscribe(&self, callback: impl Fn(&E) + 'static) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.observers.borrow_mut().push(Observer {
            id,
            callback: Rc::new(callback),
        });

        let weak: Weak<SubjectInner<E>> = Rc::downgrade(&self.inner);
        let registry: Weak<dyn Registry> = weak;
        Subscription {
            registry: Some(registry),
            id,
        }
    }

    pub fn publish(&self, event: &E) {
        let snapshot: Vec<Callback<E>> = self
            .inner
            .observers
            .borrow()
            .iter()
            .map(|o| Rc::clone(&o.callback))
            .collect();

        for callback in snapshot {
            callback(event);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.borrow().len()
    }

    /// Drop every observer. Outstanding handles become inert.
    pub fn clear(&self) {
        self.inner.observers.borrow_mut().clear();
    }
}

/// Handle returned by `subscribe`.
///
/// Dropping the handle leaves the observer registered; call
/// [`Subscription::dispose`] to stop further notifications.
pub struct Subscription {
    registry: Option<Weak<dyn Registry>>,
    id: u64,
}

impl Subscription {
    /// A handle that refers to nothing.
    pub fn empty() -> Self {
        Self {
            registry: None,
            id: 0,
        }
    }

    /// Stop future notifications. Notifications already delivered are not
    /// affected. Calling this on a handle whose source is gone is a no-op.
    pub fn dispose(mut self) {
        if let Some(registry) = self.registry.take().and_then(|weak| weak.upgrade()) {
            registry.remove(self.id);
        }
    }
}

impl core::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("live", &self.registry.as_ref().is_some_and(|w| w.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publishes_in_subscription_order() {
        let subject: Subject<u32> = Subject::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let first = Rc::clone(&log);
        let _a = subject.subscribe(move |v| first.borrow_mut().push(("a", *v)));
        let second = Rc::clone(&log);
        let _b = subject.subscribe(move |v| second.borrow_mut().push(("b", *v)));

        subject.publish(&7);
        assert_eq!(*log.borrow(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn dispose_stops_future_notifications() {
        let subject: Subject<u32> = Subject::new();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let handle = subject.subscribe(move |_| c.set(c.get() + 1));

        subject.publish(&1);
        handle.dispose();
        subject.publish(&2);

        assert_eq!(count.get(), 1);
        assert_eq!(subject.observer_count(), 0);
    }

    #[test]
    fn observer_may_subscribe_during_publish() {
        let subject: Subject<u32> = Subject::new();
        let hits = Rc::new(Cell::new(0));

        let inner_subject = subject.clone();
        let inner_hits = Rc::clone(&hits);
        let _outer = subject.subscribe(move |_| {
            let h = Rc::clone(&inner_hits);
            let _ = inner_subject.subscribe(move |_| h.set(h.get() + 1));
        });

        // the observer added mid-publish is not part of this round
        subject.publish(&1);
        assert_eq!(hits.get(), 0);
        assert_eq!(subject.observer_count(), 2);
    }

    #[test]
    fn dispose_after_subject_dropped_is_noop() {
        let subject: Subject<u32> = Subject::new();
        let handle = subject.subscribe(|_| {});
        drop(subject);
        handle.dispose();
    }
}
