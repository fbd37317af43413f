//! Observable value cells
//!
//! A [`ReactiveProperty`] always holds exactly one current value. Every call
//! to [`ReactiveProperty::set`] publishes a [`PropertyChanged`] to all current
//! observers before returning. Two observer lists are kept: *links* are
//! installed by the owning element or object (invalidation, forwarding into
//! the aggregated change channel) and live as long as the property; *external*
//! observers are everything else and can be released in bulk.

use alloc::rc::Rc;
use core::any::Any;
use core::cell::RefCell;

use super::subject::{Subject, Subscription};

/// `(name, new, old)` change notification.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChanged<T> {
    pub name: &'static str,
    pub value: T,
    pub old_value: T,
}

/// Type-erased view of a change, as carried on an object's aggregated channel.
pub trait PropertyChange {
    fn name(&self) -> &'static str;
    fn value_any(&self) -> &dyn Any;
    fn old_value_any(&self) -> &dyn Any;
}

impl<T: 'static> PropertyChange for PropertyChanged<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn value_any(&self) -> &dyn Any {
        &self.value
    }

    fn old_value_any(&self) -> &dyn Any {
        &self.old_value
    }
}

impl dyn PropertyChange + '_ {
    /// Downcast the new value.
    pub fn value<T: 'static>(&self) -> Option<&T> {
        self.value_any().downcast_ref::<T>()
    }

    /// Downcast the previous value.
    pub fn old_value<T: 'static>(&self) -> Option<&T> {
        self.old_value_any().downcast_ref::<T>()
    }
}

struct PropertyCell<T: 'static> {
    name: &'static str,
    value: RefCell<T>,
    links: Subject<PropertyChanged<T>>,
    observers: Subject<PropertyChanged<T>>,
}

/// Shared handle to an observable value. Clones refer to the same cell.
pub struct ReactiveProperty<T: 'static> {
    cell: Rc<PropertyCell<T>>,
}

impl<T: 'static> Clone for ReactiveProperty<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T: Clone + 'static> ReactiveProperty<T> {
    pub fn new(name: &'static str, initial: T) -> Self {
        Self {
            cell: Rc::new(PropertyCell {
                name,
                value: RefCell::new(initial),
                links: Subject::new(),
                observers: Subject::new(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.cell.name
    }

    /// Current value. No side effects.
    pub fn get(&self) -> T {
        self.cell.value.borrow().clone()
    }

    /// Borrow the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.cell.value.borrow())
    }

    /// Store `value` and publish the change to links, then to external
    /// observers, each in subscription order.
    ///
    /// The value is stored before anyone is notified, so observers that read
    /// the property back see the new value.
    pub fn set(&self, value: T) {
        let old_value = self.cell.value.replace(value.clone());
        let change = PropertyChanged {
            name: self.cell.name,
            value,
            old_value,
        };
        self.cell.links.publish(&change);
        self.cell.observers.publish(&change);
    }

    /// Like `set`, but silent when the value is unchanged.
    pub fn set_if_changed(&self, value: T) -> bool
    where
        T: PartialEq,
    {
        if *self.cell.value.borrow() == value {
            return false;
        }
        self.set(value);
        true
    }

    /// Observe future changes.
    pub fn subscribe(&self, observer: impl Fn(&PropertyChanged<T>) + 'static) -> Subscription {
        self.cell.observers.subscribe(observer)
    }

    /// Observe future changes and receive the current value right away as a
    /// change whose old and new values are equal.
    pub fn subscribe_with_current(
        &self,
        observer: impl Fn(&PropertyChanged<T>) + 'static,
    ) -> Subscription {
        let current = self.get();
        observer(&PropertyChanged {
            name: self.cell.name,
            value: current.clone(),
            old_value: current,
        });
        self.cell.observers.subscribe(observer)
    }

    /// Make this property follow `source`, mapping each value through `map`.
    /// The current source value is applied immediately.
    pub fn bind_from<S: Clone + 'static>(
        &self,
        source: &ReactiveProperty<S>,
        map: impl Fn(&S) -> T + 'static,
    ) -> Subscription {
        self.set(source.with(&map));
        let target = self.clone();
        source.subscribe(move |change| target.set(map(&change.value)))
    }

    /// Number of external observers.
    pub fn observer_count(&self) -> usize {
        self.cell.observers.observer_count()
    }

    /// Release every external observer. Links installed by the owner remain.
    pub fn unsubscribe_external(&self) {
        self.cell.observers.clear();
    }

    /// Whether both handles refer to the same cell.
    pub fn ptr_eq(&self, other: &ReactiveProperty<T>) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    /// Install an owner link. Links survive [`Self::unsubscribe_external`].
    pub(crate) fn link(&self, observer: impl Fn(&PropertyChanged<T>) + 'static) {
        // links live as long as the cell, the handle is not needed
        let _ = self.cell.links.subscribe(observer);
    }
}

impl<T: Clone + core::fmt::Debug + 'static> core::fmt::Debug for ReactiveProperty<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ReactiveProperty")
            .field("name", &self.cell.name)
            .field("value", &*self.cell.value.borrow())
            .finish()
    }
}

/// Object-safe handle used by the property bag to release external observers
/// without knowing the value type.
pub(crate) trait ErasedProperty {
    fn as_any(&self) -> &dyn Any;
    fn unsubscribe_external(&self);
}

impl<T: Clone + 'static> ErasedProperty for ReactiveProperty<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn unsubscribe_external(&self) {
        ReactiveProperty::unsubscribe_external(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use core::cell::Cell;

    #[test]
    fn two_subscribers_see_the_same_change_once() {
        let property = ReactiveProperty::new("count", 1i32);
        let seen_a = Rc::new(RefCell::new(Vec::new()));
        let seen_b = Rc::new(RefCell::new(Vec::new()));

        let a = Rc::clone(&seen_a);
        let _sa = property.subscribe(move |c| a.borrow_mut().push(c.clone()));
        let b = Rc::clone(&seen_b);
        let _sb = property.subscribe(move |c| b.borrow_mut().push(c.clone()));

        property.set(5);

        let expected = PropertyChanged {
            name: "count",
            value: 5,
            old_value: 1,
        };
        assert_eq!(*seen_a.borrow(), vec![expected.clone()]);
        assert_eq!(*seen_b.borrow(), vec![expected]);
    }

    #[test]
    fn value_is_stored_before_observers_run() {
        let property = ReactiveProperty::new("text", 0u8);
        let observed = Rc::new(Cell::new(0u8));

        let reader = property.clone();
        let o = Rc::clone(&observed);
        let _s = property.subscribe(move |_| o.set(reader.get()));

        property.set(9);
        assert_eq!(observed.get(), 9);
    }

    #[test]
    fn reentrant_set_from_observer() {
        let property = ReactiveProperty::new("clamped", 0i32);
        let writer = property.clone();
        let _s = property.subscribe(move |c| {
            if c.value > 10 {
                writer.set(10);
            }
        });

        property.set(42);
        assert_eq!(property.get(), 10);
    }

    #[test]
    fn unsubscribe_external_keeps_links() {
        let property = ReactiveProperty::new("width", 0.0f32);
        let linked = Rc::new(Cell::new(0));
        let external = Rc::new(Cell::new(0));

        let l = Rc::clone(&linked);
        property.link(move |_| l.set(l.get() + 1));
        let e = Rc::clone(&external);
        let _s = property.subscribe(move |_| e.set(e.get() + 1));

        property.unsubscribe_external();
        property.set(3.0);

        assert_eq!(linked.get(), 1);
        assert_eq!(external.get(), 0);
    }

    #[test]
    fn bind_from_follows_the_source() {
        let source = ReactiveProperty::new("celsius", 20i32);
        let target = ReactiveProperty::new("label", alloc::string::String::new());

        let binding = target.bind_from(&source, |c| alloc::format!("{c} C"));
        assert_eq!(target.get(), "20 C");

        source.set(21);
        assert_eq!(target.get(), "21 C");

        binding.dispose();
        source.set(22);
        assert_eq!(target.get(), "21 C");
    }

    #[test]
    fn subscribe_with_current_replays() {
        let property = ReactiveProperty::new("flag", true);
        let calls = Rc::new(Cell::new(0));
        let c = Rc::clone(&calls);
        let _s = property.subscribe_with_current(move |_| c.set(c.get() + 1));
        assert_eq!(calls.get(), 1);
        property.set(false);
        assert_eq!(calls.get(), 2);
    }
}
