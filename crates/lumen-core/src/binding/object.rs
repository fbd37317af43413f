//! Named bag of reactive properties with one aggregated change channel

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use core::cell::RefCell;

use super::property::{ErasedProperty, PropertyChange, ReactiveProperty};
use super::subject::{Subject, Subscription};
use crate::error::{PropertyError, PropertyResult};

/// Properties of a single entity, looked up by name.
///
/// The first request for a name creates the property and links it into
/// [`ObservableObject::changes`]; later requests return the same instance.
/// A name stays bound to the value type it was created with.
#[derive(Default)]
pub struct ObservableObject {
    properties: RefCell<BTreeMap<&'static str, Rc<dyn ErasedProperty>>>,
    changes: Subject<dyn PropertyChange>,
}

impl ObservableObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the property called `name`, creating it with `initial` on first use.
    ///
    /// `initial` is ignored when the property already exists.
    pub fn property<T: Clone + 'static>(
        &self,
        name: &'static str,
        initial: T,
    ) -> PropertyResult<ReactiveProperty<T>> {
        if let Some(existing) = self.get_property::<T>(name)? {
            return Ok(existing);
        }
        let property = ReactiveProperty::new(name, initial);
        self.register(&property);
        Ok(property)
    }

    /// Look up an existing property without creating it.
    pub fn get_property<T: Clone + 'static>(
        &self,
        name: &'static str,
    ) -> PropertyResult<Option<ReactiveProperty<T>>> {
        let properties = self.properties.borrow();
        let Some(entry) = properties.get(name) else {
            return Ok(None);
        };
        entry
            .as_any()
            .downcast_ref::<ReactiveProperty<T>>()
            .cloned()
            .map(Some)
            .ok_or(PropertyError::TypeMismatch { name })
    }

    /// Register a property created elsewhere under its own name.
    ///
    /// Adopting the same instance twice is accepted; adopting a different
    /// instance under a taken name is not.
    pub fn adopt<T: Clone + 'static>(&self, property: &ReactiveProperty<T>) -> PropertyResult<()> {
        let name = property.name();
        match self.get_property::<T>(name)? {
            Some(existing) if existing.ptr_eq(property) => Ok(()),
            Some(_) => Err(PropertyError::Duplicate { name }),
            None => {
                self.register(property);
                Ok(())
            }
        }
    }

    /// Set `name` to `value`, creating the property if needed.
    pub fn set<T: Clone + 'static>(&self, name: &'static str, value: T) -> PropertyResult<()> {
        match self.get_property::<T>(name)? {
            Some(property) => property.set(value),
            None => {
                self.property(name, value)?;
            }
        }
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.borrow().contains_key(name)
    }

    /// Observe every property change of this object.
    pub fn subscribe(
        &self,
        observer: impl Fn(&(dyn PropertyChange + 'static)) + 'static,
    ) -> Subscription {
        self.changes.subscribe(observer)
    }

    /// The aggregated change channel.
    pub fn changes(&self) -> &Subject<dyn PropertyChange> {
        &self.changes
    }

    /// Release all externally added observers of every property and of the
    /// aggregated channel. Forwarding links and owner links stay intact.
    pub fn unsubscribe_property_subscribers(&self) {
        for property in self.properties.borrow().values() {
            property.unsubscribe_external();
        }
        self.changes.clear();
    }

    fn register<T: Clone + 'static>(&self, property: &ReactiveProperty<T>) {
        let channel = self.changes.clone();
        property.link(move |change| channel.publish(change));
        self.properties
            .borrow_mut()
            .insert(property.name(), Rc::new(property.clone()));
    }
}
